use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stepwise_runner::{CommandRunner, LogRunner, Runner};

/// Which runner builds the targets of a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunnerDef {
  /// Log each build and report success without producing anything.
  Log,
  /// Run each operation as an external program.
  Command {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    working_dir: Option<PathBuf>,
  },
}

impl Default for RunnerDef {
  fn default() -> Self {
    RunnerDef::Command { working_dir: None }
  }
}

impl RunnerDef {
  pub fn build(&self) -> Box<dyn Runner> {
    match self {
      RunnerDef::Log => Box::new(LogRunner),
      RunnerDef::Command {
        working_dir: Some(dir),
      } => Box::new(CommandRunner::with_working_dir(dir.clone())),
      RunnerDef::Command { working_dir: None } => Box::new(CommandRunner::new()),
    }
  }
}
