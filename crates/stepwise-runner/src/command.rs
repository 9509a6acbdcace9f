//! External-command runner.
//!
//! For an invocation `step(a, [b, 3], mode="fast")` producing target `out`:
//!
//! ```text
//! step <path of a> <path of b> 3 --mode=fast --output=<path of out>
//! ```
//!
//! - target references become artifact paths, string literals are passed as
//!   they are, other literals as JSON text,
//! - list arguments are flattened into consecutive arguments, maps are passed
//!   as one JSON argument,
//! - named arguments become `--key=value`; `_depend` is dropped (it only
//!   orders the build),
//! - targets whose id starts with `_` get no `--output`; instead the
//!   program's stdout is saved as the artifact.
//!
//! `copy` invocations copy the referenced artifact, or write the literal.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use stepwise_graph::{Invocation, TargetId, Value};
use stepwise_state::StateStore;
use tracing::{debug, info, warn};

use crate::{Runner, RunnerError};

const OUTPUT_KWARG: &str = "output";
const DEPEND_KWARG: &str = "_depend";

/// Runs each target's operation as an external program.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
  working_dir: Option<PathBuf>,
}

/// A call resolved against the state store.
#[derive(Debug, PartialEq)]
struct PreparedCommand {
  program: String,
  args: Vec<String>,
  /// Save stdout here instead of passing `--output`.
  capture_to: Option<PathBuf>,
  /// The invocation carried its own `output` argument, which was replaced.
  output_replaced: bool,
}

impl CommandRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Run programs from `dir` instead of the current directory.
  pub fn with_working_dir(dir: impl Into<PathBuf>) -> Self {
    Self {
      working_dir: Some(dir.into()),
    }
  }

  /// Artifact paths as the spawned program must see them. With a working
  /// directory set, relative paths are anchored at our own current directory.
  fn paths<'a>(&self, store: &'a dyn StateStore) -> ArtifactPaths<'a> {
    let base = match &self.working_dir {
      Some(_) => match std::env::current_dir() {
        Ok(dir) => Some(dir),
        Err(e) => {
          warn!(error = %e, "cannot resolve current directory");
          None
        }
      },
      None => None,
    };
    ArtifactPaths { store, base }
  }

  fn prepare(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    operation: &str,
    args: &[Value],
    kwargs: &BTreeMap<String, Value>,
  ) -> PreparedCommand {
    let paths = self.paths(store);
    let mut argv = Vec::new();
    for arg in args {
      push_flattened(&paths, arg, &mut argv);
    }

    let pass_output = !target.as_str().starts_with('_');
    let mut output_replaced = false;

    for (key, value) in kwargs {
      if key == DEPEND_KWARG {
        continue;
      }
      if key == OUTPUT_KWARG && pass_output {
        output_replaced = true;
        continue;
      }
      argv.push(format!("--{}={}", key, json_to_arg(to_json(&paths, value))));
    }

    let artifact = paths.of(target);
    let capture_to = if pass_output {
      argv.push(format!("--{}={}", OUTPUT_KWARG, artifact.display()));
      None
    } else {
      Some(artifact)
    };

    PreparedCommand {
      program: operation.to_string(),
      args: argv,
      capture_to,
      output_replaced,
    }
  }

  fn run(&self, target: &TargetId, prepared: PreparedCommand) -> Result<bool, RunnerError> {
    let mut command = Command::new(&prepared.program);
    command.args(&prepared.args).stdin(Stdio::null());
    if let Some(dir) = &self.working_dir {
      command.current_dir(dir);
    }

    debug!(target = %target, program = %prepared.program, args = ?prepared.args, "spawning");

    let spawn_err = |source: std::io::Error| RunnerError::Spawn {
      program: prepared.program.clone(),
      source,
    };

    let status = match &prepared.capture_to {
      Some(path) => {
        let output = command
          .stderr(Stdio::inherit())
          .output()
          .map_err(spawn_err)?;
        if output.status.success() {
          fs::write(path, &output.stdout).map_err(|source| RunnerError::Io {
            path: path.clone(),
            source,
          })?;
        }
        output.status
      }
      None => command.status().map_err(spawn_err)?,
    };

    if status.success() {
      info!(target = %target, program = %prepared.program, "command succeeded");
      Ok(true)
    } else {
      warn!(target = %target, program = %prepared.program, status = %status, "command failed");
      Ok(false)
    }
  }

  fn copy(store: &dyn StateStore, target: &TargetId, value: &Value) -> Result<(), RunnerError> {
    let dest = store.artifact_path(target);
    let io_err = |path: &Path| {
      let path = path.to_path_buf();
      move |source: std::io::Error| RunnerError::Io { path, source }
    };

    match value {
      Value::Target(source) => {
        let from = store.artifact_path(source);
        fs::copy(&from, &dest).map_err(io_err(&from))?;
      }
      other => {
        let paths = ArtifactPaths { store, base: None };
        let text = json_to_arg(to_json(&paths, other));
        fs::write(&dest, text).map_err(io_err(&dest))?;
      }
    }
    Ok(())
  }
}

impl Runner for CommandRunner {
  fn compute(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> Result<bool, RunnerError> {
    info!(target = %target, invocation = %invocation, "building target");

    match invocation {
      Invocation::Call {
        operation,
        args,
        kwargs,
      } => {
        let prepared = self.prepare(store, target, operation, args, kwargs);
        if prepared.output_replaced {
          warn!(target = %target, "invocation argument 'output' replaced by the artifact path");
        }
        self.run(target, prepared)
      }
      Invocation::CopyOf { value } => {
        Self::copy(store, target, value)?;
        Ok(true)
      }
    }
  }

  fn describe(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> String {
    match invocation {
      Invocation::Call {
        operation,
        args,
        kwargs,
      } => {
        let prepared = self.prepare(store, target, operation, args, kwargs);
        let mut text = std::iter::once(prepared.program.as_str())
          .chain(prepared.args.iter().map(String::as_str))
          .map(quote_for_display)
          .collect::<Vec<_>>()
          .join(" ");
        if let Some(path) = &prepared.capture_to {
          text.push_str(&format!("\nOUTPUT SAVED TO: {}", path.display()));
        }
        if prepared.output_replaced {
          text.push_str("\nWARNING: Argument 'output' is replaced from its original value!");
        }
        text
      }
      Invocation::CopyOf {
        value: Value::Target(source),
      } => format!(
        "copy {} -> {}",
        store.artifact_path(source).display(),
        store.artifact_path(target).display()
      ),
      Invocation::CopyOf { value } => format!(
        "write {} -> {}",
        value,
        store.artifact_path(target).display()
      ),
    }
  }
}

struct ArtifactPaths<'a> {
  store: &'a dyn StateStore,
  base: Option<PathBuf>,
}

impl ArtifactPaths<'_> {
  fn of(&self, target: &TargetId) -> PathBuf {
    let path = self.store.artifact_path(target);
    match &self.base {
      Some(base) if path.is_relative() => base.join(path),
      _ => path,
    }
  }
}

/// The value as JSON, with target references replaced by artifact paths.
fn to_json(paths: &ArtifactPaths<'_>, value: &Value) -> serde_json::Value {
  match value {
    Value::Target(id) => serde_json::Value::String(paths.of(id).display().to_string()),
    Value::Literal(v) => v.clone(),
    Value::List(items) => items.iter().map(|v| to_json(paths, v)).collect(),
    Value::Map(entries) => entries
      .iter()
      .map(|(k, v)| (k.clone(), to_json(paths, v)))
      .collect::<serde_json::Map<_, _>>()
      .into(),
  }
}

fn json_to_arg(value: serde_json::Value) -> String {
  match value {
    serde_json::Value::String(s) => s,
    other => other.to_string(),
  }
}

fn push_flattened(paths: &ArtifactPaths<'_>, value: &Value, argv: &mut Vec<String>) {
  match value {
    Value::List(items) => {
      for item in items {
        push_flattened(paths, item, argv);
      }
    }
    other => argv.push(json_to_arg(to_json(paths, other))),
  }
}

fn quote_for_display(arg: &str) -> String {
  if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
    format!("{:?}", arg)
  } else {
    arg.to_string()
  }
}
