//! Stepwise Runner
//!
//! A [`Runner`] performs the computation behind one target. The engine hands
//! it the target, its [`Invocation`] and the state store (for artifact paths);
//! the runner is responsible for writing the target's artifact.
//!
//! Runners are plain values chosen by the caller. Two are provided:
//! - [`LogRunner`] logs what it would build and reports success,
//! - [`CommandRunner`] runs the operation as an external program.

mod command;
mod error;
mod log;

pub use command::CommandRunner;
pub use error::RunnerError;
pub use log::LogRunner;

use stepwise_graph::{Invocation, TargetId};
use stepwise_state::StateStore;

/// Runner trait.
pub trait Runner {
  /// Build `target`.
  ///
  /// `Ok(true)` on success, `Ok(false)` when the computation ran but failed.
  /// An `Err` means the runner itself broke. In both failure cases the
  /// engine discards whatever artifact was written.
  fn compute(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> Result<bool, RunnerError>;

  /// Human-readable account of what `compute` would do. Must not compute or
  /// touch any state.
  fn describe(&self, store: &dyn StateStore, target: &TargetId, invocation: &Invocation)
  -> String;
}

impl<R: Runner + ?Sized> Runner for Box<R> {
  fn compute(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> Result<bool, RunnerError> {
    (**self).compute(store, target, invocation)
  }

  fn describe(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> String {
    (**self).describe(store, target, invocation)
  }
}

impl<R: Runner + ?Sized> Runner for &R {
  fn compute(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> Result<bool, RunnerError> {
    (**self).compute(store, target, invocation)
  }

  fn describe(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> String {
    (**self).describe(store, target, invocation)
  }
}
