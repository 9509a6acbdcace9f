//! Stepwise State
//!
//! This crate derives the build status of targets from the filesystem. The
//! state directory is the only persisted state in stepwise and the only
//! coordination medium between cooperating processes:
//!
//! - `<state_dir>/<encoded id>` is the target's output artifact,
//! - `<state_dir>/<encoded id>.locked` marks a target as being built and holds
//!   the builder's process id (diagnostic only).
//!
//! Every query goes to disk. Nothing is cached, because another process may
//! lock, build or clean a target at any moment.

mod fs;

pub use fs::FsStateStore;

use std::fmt;
use std::path::PathBuf;

use stepwise_graph::TargetId;

/// Error type for state store operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
  #[error("io error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Build status of a declared target. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
  /// Some process holds the lock marker.
  Locked,
  /// Artifact present and no lock marker.
  Done,
  /// Neither artifact nor lock marker.
  Pending,
}

impl fmt::Display for TargetStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TargetStatus::Locked => f.write_str("locked"),
      TargetStatus::Done => f.write_str("done"),
      TargetStatus::Pending => f.write_str("pending"),
    }
  }
}

/// Target state storage trait.
///
/// Implementations answer from their backing medium at call time. Unlock and
/// artifact removal are idempotent: clearing something already clear is not
/// an error.
pub trait StateStore {
  /// Where the target's output artifact lives. Runners write here.
  fn artifact_path(&self, target: &TargetId) -> PathBuf;

  fn has_artifact(&self, target: &TargetId) -> bool;

  fn is_locked(&self, target: &TargetId) -> bool;

  /// Artifact present and not locked. A stale artifact under a lock is never
  /// reported done.
  fn is_done(&self, target: &TargetId) -> bool {
    !self.is_locked(target) && self.has_artifact(target)
  }

  fn status(&self, target: &TargetId) -> TargetStatus {
    if self.is_locked(target) {
      TargetStatus::Locked
    } else if self.has_artifact(target) {
      TargetStatus::Done
    } else {
      TargetStatus::Pending
    }
  }

  /// Try to take the lock. `Ok(true)` if this call created the marker,
  /// `Ok(false)` if it already existed.
  fn lock(&self, target: &TargetId) -> Result<bool, StateError>;

  fn unlock(&self, target: &TargetId) -> Result<(), StateError>;

  fn remove_artifact(&self, target: &TargetId) -> Result<(), StateError>;
}
