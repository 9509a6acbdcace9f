use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stepwise_graph::{Invocation, TargetGraph, TargetId, Value};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::runner::RunnerDef;

/// A complete scheme file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemeDef {
  /// Directory holding artifacts and lock markers. Relative paths are taken
  /// from the working directory of the process.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub state_dir: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub main_target: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub runner: Option<RunnerDef>,
  #[serde(default)]
  pub targets: Vec<TargetDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDef {
  pub target: String,
  #[serde(flatten)]
  pub producer: ProducerDef,
}

/// How a target is produced: `{"call": {...}}` or `{"copy": <value>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerDef {
  Call(CallDef),
  Copy(ValueDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDef {
  pub operation: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub args: Vec<ValueDef>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub kwargs: BTreeMap<String, ValueDef>,
}

/// An argument value.
///
/// `{"target": "id"}` references a target and `{"map": {...}}` is a map of
/// values. Arrays are lists. Any other JSON, including objects with other
/// keys, is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueDef {
  Target(TargetRefDef),
  Map(MapDef),
  List(Vec<ValueDef>),
  Literal(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetRefDef {
  pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapDef {
  pub map: BTreeMap<String, ValueDef>,
}

impl SchemeDef {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let scheme: SchemeDef = text.parse()?;
    debug!(path = %path.display(), targets = scheme.targets.len(), "scheme loaded");
    Ok(scheme)
  }

  /// Declare every target, in file order, into a new graph.
  pub fn to_graph(&self) -> Result<TargetGraph, ConfigError> {
    let mut graph = TargetGraph::new();
    for def in &self.targets {
      graph.declare(def.target.as_str(), Invocation::from(&def.producer))?;
    }
    if let Some(main) = &self.main_target {
      graph.set_main_target(main.as_str());
    }
    info!(
      targets = graph.len(),
      main_target = ?self.main_target,
      "target graph built"
    );
    Ok(graph)
  }

  pub fn runner(&self) -> RunnerDef {
    self.runner.clone().unwrap_or_default()
  }
}

impl FromStr for SchemeDef {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(serde_json::from_str(s)?)
  }
}

impl From<&ProducerDef> for Invocation {
  fn from(def: &ProducerDef) -> Self {
    match def {
      ProducerDef::Call(call) => Invocation::Call {
        operation: call.operation.clone(),
        args: call.args.iter().map(Value::from).collect(),
        kwargs: call
          .kwargs
          .iter()
          .map(|(k, v)| (k.clone(), Value::from(v)))
          .collect(),
      },
      ProducerDef::Copy(value) => Invocation::copy_of(Value::from(value)),
    }
  }
}

impl From<&ValueDef> for Value {
  fn from(def: &ValueDef) -> Self {
    match def {
      ValueDef::Target(r) => Value::Target(TargetId::from(r.target.as_str())),
      ValueDef::Map(m) => Value::Map(
        m.map
          .iter()
          .map(|(k, v)| (k.clone(), Value::from(v)))
          .collect(),
      ),
      ValueDef::List(items) => Value::List(items.iter().map(Value::from).collect()),
      ValueDef::Literal(v) => Value::Literal(v.clone()),
    }
  }
}
