//! User-facing build operations.

use stepwise_graph::{TargetGraph, TargetId};
use stepwise_runner::Runner;
use stepwise_state::StateStore;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::executor::Executor;
use crate::outcome::StepOutcome;
use crate::resolver::Resolver;

/// What a build of one target would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
  pub target: TargetId,
  /// The runner's description of the computation.
  pub description: String,
  /// The target is currently locked by some process.
  pub locked: bool,
}

/// Dry-run answer of [`Driver::view_compute`] and [`Driver::view_step_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
  NotFound,
  /// The goal is already built.
  Ready,
  /// The goal itself is locked.
  Locked,
  NoStepsAvailable,
  Next(BuildPlan),
}

/// Result of [`Driver::step_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
  /// The target that was built, if a build was attempted.
  pub built: Option<TargetId>,
  pub outcome: StepOutcome,
}

/// Result of [`Driver::run_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
  /// Number of successful steps.
  pub steps: usize,
  /// The outcome that ended the run.
  pub outcome: StepOutcome,
}

/// Drives a target graph toward goals using one runner.
pub struct Driver<'a, R> {
  graph: &'a TargetGraph,
  store: &'a dyn StateStore,
  runner: R,
}

impl<'a, R: Runner> Driver<'a, R> {
  pub fn new(graph: &'a TargetGraph, store: &'a dyn StateStore, runner: R) -> Self {
    Self {
      graph,
      store,
      runner,
    }
  }

  pub fn graph(&self) -> &TargetGraph {
    self.graph
  }

  pub fn store(&self) -> &dyn StateStore {
    self.store
  }

  pub fn resolver(&self) -> Resolver<'_> {
    Resolver::new(self.graph, self.store)
  }

  pub fn executor(&self) -> Executor<'_, R> {
    Executor::new(self.graph, self.store, &self.runner)
  }

  /// Build `target` itself, regardless of whether its dependencies or the
  /// target are already built.
  pub fn compute(&self, target: &TargetId) -> Result<StepOutcome, EngineError> {
    Ok(self.executor().build(target)?.into())
  }

  pub fn view_compute(&self, target: &TargetId) -> Preview {
    match self.plan(target) {
      Some(plan) => Preview::Next(plan),
      None => Preview::NotFound,
    }
  }

  /// Perform the single next build toward `goal`.
  pub fn step_to(&self, goal: &TargetId) -> Result<StepReport, EngineError> {
    let report = |outcome| StepReport {
      built: None,
      outcome,
    };

    if !self.graph.exists(goal.as_str()) {
      return Ok(report(StepOutcome::TargetNotFound));
    }
    if self.store.is_done(goal) {
      return Ok(report(StepOutcome::TargetReady));
    }
    if self.store.is_locked(goal) {
      return Ok(report(StepOutcome::TargetLocked));
    }

    let Some(next) = self.resolver().find_next_step(goal)? else {
      return Ok(report(StepOutcome::NoStepsAvailable));
    };

    let outcome = self.compute(&next)?;
    Ok(StepReport {
      built: Some(next),
      outcome,
    })
  }

  pub fn view_step_to(&self, goal: &TargetId) -> Result<Preview, EngineError> {
    if !self.graph.exists(goal.as_str()) {
      return Ok(Preview::NotFound);
    }
    if self.store.is_done(goal) {
      return Ok(Preview::Ready);
    }
    if self.store.is_locked(goal) {
      return Ok(Preview::Locked);
    }

    let preview = match self.resolver().find_next_step(goal)? {
      Some(next) => self
        .plan(&next)
        .map_or(Preview::NoStepsAvailable, Preview::Next),
      None => Preview::NoStepsAvailable,
    };
    Ok(preview)
  }

  /// Step toward `goal` until it is built or no further progress is
  /// possible in this process.
  pub fn run_to(&self, goal: &TargetId) -> Result<RunSummary, EngineError> {
    let mut steps = 0;
    loop {
      let report = self.step_to(goal)?;
      if report.outcome != StepOutcome::StepOk {
        return Ok(RunSummary {
          steps,
          outcome: report.outcome,
        });
      }
      steps += 1;

      // A runner may report success without producing the artifact; the
      // same step would then be picked forever.
      if let Some(built) = &report.built
        && !self.store.is_done(built)
      {
        warn!(target = %built, "runner reported success but produced no artifact");
        return Ok(RunSummary {
          steps,
          outcome: StepOutcome::NoStepsAvailable,
        });
      }
      info!(goal = %goal, steps, "step completed");
    }
  }

  fn plan(&self, target: &TargetId) -> Option<BuildPlan> {
    let invocation = self.graph.invocation_of(target.as_str()).ok()?;
    Some(BuildPlan {
      target: target.clone(),
      description: self.runner.describe(self.store, target, invocation),
      locked: self.store.is_locked(target),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  use stepwise_graph::{GraphBuilder, Invocation, call};
  use stepwise_runner::{LogRunner, RunnerError};
  use stepwise_state::FsStateStore;

  /// Writes the target's name into its artifact.
  struct TouchRunner;

  impl Runner for TouchRunner {
    fn compute(
      &self,
      store: &dyn StateStore,
      target: &TargetId,
      _invocation: &Invocation,
    ) -> Result<bool, RunnerError> {
      fs::write(store.artifact_path(target), target.as_str()).map_err(|source| {
        RunnerError::Io {
          path: store.artifact_path(target),
          source,
        }
      })?;
      Ok(true)
    }

    fn describe(&self, _: &dyn StateStore, target: &TargetId, inv: &Invocation) -> String {
      format!("touch {} via {}", target, inv)
    }
  }

  fn id(name: &str) -> TargetId {
    TargetId::from(name)
  }

  fn chain() -> TargetGraph {
    let scheme = GraphBuilder::new();
    scheme.target("A").set(call("a")).unwrap();
    scheme.target("B").set(call("b").arg(scheme.target("A"))).unwrap();
    scheme.target("C").set(call("c").arg(scheme.target("B"))).unwrap();
    scheme.build()
  }

  fn store() -> (FsStateStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    (FsStateStore::new(dir.path()), dir)
  }

  #[test]
  fn test_step_to_builds_leaf_first() {
    let graph = chain();
    let (store, _dir) = store();
    let driver = Driver::new(&graph, &store, TouchRunner);

    let report = driver.step_to(&id("C")).unwrap();
    assert_eq!(report.built, Some(id("A")));
    assert_eq!(report.outcome, StepOutcome::StepOk);
    assert!(store.is_done(&id("A")));
  }

  #[test]
  fn test_step_to_distinguishes_ready_from_blocked() {
    let graph = chain();
    let (store, _dir) = store();
    let driver = Driver::new(&graph, &store, TouchRunner);

    store.lock(&id("A")).unwrap();
    assert_eq!(
      driver.step_to(&id("C")).unwrap().outcome,
      StepOutcome::NoStepsAvailable
    );
    store.unlock(&id("A")).unwrap();

    for name in ["A", "B", "C"] {
      fs::write(store.artifact_path(&id(name)), "x").unwrap();
    }
    assert_eq!(
      driver.step_to(&id("C")).unwrap().outcome,
      StepOutcome::TargetReady
    );
  }

  #[test]
  fn test_step_to_unknown_and_locked_goal() {
    let graph = chain();
    let (store, _dir) = store();
    let driver = Driver::new(&graph, &store, TouchRunner);

    assert_eq!(
      driver.step_to(&id("Z")).unwrap().outcome,
      StepOutcome::TargetNotFound
    );

    store.lock(&id("C")).unwrap();
    assert_eq!(
      driver.step_to(&id("C")).unwrap().outcome,
      StepOutcome::TargetLocked
    );
  }

  #[test]
  fn test_run_to_completes_chain() {
    let graph = chain();
    let (store, _dir) = store();
    let driver = Driver::new(&graph, &store, TouchRunner);

    let summary = driver.run_to(&id("C")).unwrap();
    assert_eq!(
      summary,
      RunSummary {
        steps: 3,
        outcome: StepOutcome::TargetReady
      }
    );
  }

  #[test]
  fn test_run_to_stops_when_runner_produces_nothing() {
    let graph = chain();
    let (store, _dir) = store();
    let driver = Driver::new(&graph, &store, LogRunner);

    let summary = driver.run_to(&id("C")).unwrap();
    assert_eq!(summary.steps, 1);
    assert_eq!(summary.outcome, StepOutcome::NoStepsAvailable);
    assert!(!store.is_locked(&id("A")));
  }

  #[test]
  fn test_compute_ignores_dependency_state() {
    let graph = chain();
    let (store, _dir) = store();
    let driver = Driver::new(&graph, &store, TouchRunner);

    assert_eq!(driver.compute(&id("C")).unwrap(), StepOutcome::StepOk);
    assert!(store.is_done(&id("C")));
    assert!(!store.is_done(&id("A")));
    assert_eq!(driver.compute(&id("nope")).unwrap(), StepOutcome::TargetNotFound);
  }

  #[test]
  fn test_views_do_not_touch_state() {
    let graph = chain();
    let (store, _dir) = store();
    let driver = Driver::new(&graph, &store, TouchRunner);

    let preview = driver.view_step_to(&id("C")).unwrap();
    assert_eq!(
      preview,
      Preview::Next(BuildPlan {
        target: id("A"),
        description: "touch A via a()".to_string(),
        locked: false,
      })
    );
    assert!(!store.has_artifact(&id("A")));

    store.lock(&id("B")).unwrap();
    match driver.view_compute(&id("B")) {
      Preview::Next(plan) => assert!(plan.locked),
      other => panic!("unexpected preview {other:?}"),
    }
    assert_eq!(driver.view_compute(&id("Z")), Preview::NotFound);
    assert_eq!(driver.view_step_to(&id("B")).unwrap(), Preview::Locked);
  }
}
