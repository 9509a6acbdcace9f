//! Result codes reported to the user.

use std::fmt;

/// Result of one build attempt by the [`Executor`](crate::Executor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
  /// The runner succeeded; the artifact stays in place.
  Success,
  /// The runner reported failure; the artifact was removed.
  LogicalFailure,
  /// The runner returned an error or panicked; the artifact was removed.
  ExceptionFailure,
  /// Another process holds the lock. Nothing was touched.
  AlreadyLocked,
  /// The target has no declaration. Nothing was touched.
  UnknownTarget,
}

/// Result of a driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
  StepOk,
  StepFailed,
  StepFailedWithException,
  TargetNotFound,
  TargetLocked,
  /// The goal is already built.
  TargetReady,
  /// Nothing can be built right now: the remaining work is locked by other
  /// processes or depends on inputs that are not declared and not present.
  NoStepsAvailable,
}

impl StepOutcome {
  pub fn message(&self) -> &'static str {
    match self {
      StepOutcome::StepOk => "Step successful",
      StepOutcome::StepFailed => "Step run failed",
      StepOutcome::StepFailedWithException => "Step run failed with exception",
      StepOutcome::TargetNotFound => "Target not found",
      StepOutcome::TargetLocked => "Target locked",
      StepOutcome::TargetReady => "Target ready, nothing to be done",
      StepOutcome::NoStepsAvailable => "No steps available",
    }
  }

  /// Whether the operation counts as successful for exit-status purposes.
  pub fn is_success(&self) -> bool {
    matches!(self, StepOutcome::StepOk | StepOutcome::TargetReady)
  }
}

impl From<BuildOutcome> for StepOutcome {
  fn from(outcome: BuildOutcome) -> Self {
    match outcome {
      BuildOutcome::Success => StepOutcome::StepOk,
      BuildOutcome::LogicalFailure => StepOutcome::StepFailed,
      BuildOutcome::ExceptionFailure => StepOutcome::StepFailedWithException,
      BuildOutcome::AlreadyLocked => StepOutcome::TargetLocked,
      BuildOutcome::UnknownTarget => StepOutcome::TargetNotFound,
    }
  }
}

impl fmt::Display for StepOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.message())
  }
}
