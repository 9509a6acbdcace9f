//! Locked execution of a single target.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use stepwise_graph::{TargetGraph, TargetId};
use stepwise_runner::Runner;
use stepwise_state::StateStore;
use tracing::{error, info, instrument, warn};

use crate::error::EngineError;
use crate::outcome::BuildOutcome;

/// Builds one target under its lock.
pub struct Executor<'a, R: ?Sized> {
  graph: &'a TargetGraph,
  store: &'a dyn StateStore,
  runner: &'a R,
}

/// Releases the lock on drop, on every path out of [`Executor::build`].
struct LockGuard<'a> {
  store: &'a dyn StateStore,
  target: &'a TargetId,
}

impl Drop for LockGuard<'_> {
  fn drop(&mut self) {
    if let Err(e) = self.store.unlock(self.target) {
      error!(target = %self.target, error = %e, "failed to release lock");
    }
  }
}

impl<'a, R: Runner + ?Sized> Executor<'a, R> {
  pub fn new(graph: &'a TargetGraph, store: &'a dyn StateStore, runner: &'a R) -> Self {
    Self {
      graph,
      store,
      runner,
    }
  }

  /// Build `target` even if its artifact already exists.
  ///
  /// Unknown and locked targets are rejected without touching any state.
  /// Otherwise the target is locked for the duration of the runner call; on
  /// failure the artifact is removed, and the lock is released last whatever
  /// happened. `Err` is returned only when the lock itself cannot be taken.
  #[instrument(name = "build", skip(self, target), fields(target = %target))]
  pub fn build(&self, target: &TargetId) -> Result<BuildOutcome, EngineError> {
    let Ok(invocation) = self.graph.invocation_of(target.as_str()) else {
      return Ok(BuildOutcome::UnknownTarget);
    };

    if self.store.is_locked(target) || !self.store.lock(target)? {
      info!("target locked by another process");
      return Ok(BuildOutcome::AlreadyLocked);
    }
    let _guard = LockGuard {
      store: self.store,
      target,
    };

    info!(invocation = %invocation, "computing target");

    let result = catch_unwind(AssertUnwindSafe(|| {
      self.runner.compute(self.store, target, invocation)
    }));

    let outcome = match result {
      Ok(Ok(true)) => {
        info!("target successful");
        BuildOutcome::Success
      }
      Ok(Ok(false)) => {
        warn!("target failed");
        BuildOutcome::LogicalFailure
      }
      Ok(Err(e)) => {
        error!(error = %e, "target failed with exception");
        BuildOutcome::ExceptionFailure
      }
      Err(panic) => {
        error!(panic = %panic_message(&*panic), "target failed with exception");
        BuildOutcome::ExceptionFailure
      }
    };

    if outcome != BuildOutcome::Success
      && let Err(e) = self.store.remove_artifact(target)
    {
      error!(error = %e, "failed to remove artifact of failed target");
    }

    Ok(outcome)
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(s) = panic.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else {
    "runner panicked".to_string()
  }
}
