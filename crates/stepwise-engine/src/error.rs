//! Error types for the engine.

use stepwise_graph::{GraphError, TargetId};
use stepwise_state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  State(#[from] StateError),

  /// The resolver walked back into a target it was already descending
  /// through. `path` starts and ends with the same target.
  #[error("dependency cycle: {}", join_path(.path))]
  Cycle { path: Vec<TargetId> },
}

fn join_path(path: &[TargetId]) -> String {
  path
    .iter()
    .map(TargetId::as_str)
    .collect::<Vec<_>>()
    .join(" -> ")
}
