use thiserror::Error;

use crate::target::TargetId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
  #[error("target {0} has multiple specifications")]
  DuplicateTarget(TargetId),

  #[error("target not found: {0}")]
  UnknownTarget(TargetId),

  /// An empty identifier would name the state directory itself.
  #[error("empty target identifier in declaration of '{0}'")]
  EmptyTarget(TargetId),
}
