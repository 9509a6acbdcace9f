use std::path::PathBuf;

use stepwise_graph::GraphError;

/// Errors loading a scheme.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read scheme {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid scheme: {0}")]
  Parse(#[from] serde_json::Error),

  #[error(transparent)]
  Graph(#[from] GraphError),
}
