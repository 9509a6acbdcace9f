//! Runner errors.

use std::path::PathBuf;

/// Errors raised by a runner while computing a target.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  /// The operation's program could not be started.
  #[error("failed to spawn '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// Reading an input or writing the artifact failed.
  #[error("io error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Free-form failure from a custom runner.
  #[error("{0}")]
  Other(String),
}
