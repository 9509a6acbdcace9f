use stepwise_graph::{Invocation, TargetId};
use stepwise_state::StateStore;
use tracing::info;

use crate::{Runner, RunnerError};

/// Runner that only reports what it is asked to build.
///
/// It writes no artifact, so targets it "builds" stay pending. Useful for
/// walking a scheme and for exercising the lock protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRunner;

impl Runner for LogRunner {
  fn compute(
    &self,
    _store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> Result<bool, RunnerError> {
    info!(target = %target, invocation = %invocation, "building target");
    Ok(true)
  }

  fn describe(
    &self,
    _store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> String {
    format!("Build {} as {}", target, invocation)
  }
}
