//! Integration tests for the build protocol across cooperating drivers that
//! share one state directory.

use std::fs;

use stepwise_engine::{Driver, Preview, StepOutcome, export_makefile};
use stepwise_graph::{GraphBuilder, Invocation, TargetGraph, TargetId, Value, call};
use stepwise_runner::{Runner, RunnerError};
use stepwise_state::{FsStateStore, StateStore};

/// Writes `operation(<dependency artifacts>)` into the artifact, so the
/// content records the order targets were built in.
struct ConcatRunner;

impl Runner for ConcatRunner {
  fn compute(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    invocation: &Invocation,
  ) -> Result<bool, RunnerError> {
    let mut inputs = Vec::new();
    for dep in invocation.dependencies() {
      let path = store.artifact_path(&dep);
      let text = fs::read_to_string(&path).map_err(|source| RunnerError::Io { path, source })?;
      inputs.push(text);
    }
    let path = store.artifact_path(target);
    let content = format!("{}({})", invocation.operation(), inputs.join(","));
    fs::write(&path, content).map_err(|source| RunnerError::Io { path, source })?;
    Ok(true)
  }

  fn describe(&self, _: &dyn StateStore, target: &TargetId, invocation: &Invocation) -> String {
    format!("{} = {}", target, invocation)
  }
}

/// Panics after writing a partial artifact.
struct CrashingRunner;

impl Runner for CrashingRunner {
  fn compute(
    &self,
    store: &dyn StateStore,
    target: &TargetId,
    _invocation: &Invocation,
  ) -> Result<bool, RunnerError> {
    fs::write(store.artifact_path(target), "partial").expect("failed to write artifact");
    panic!("crashed while building {target}");
  }

  fn describe(&self, _: &dyn StateStore, _: &TargetId, _: &Invocation) -> String {
    String::new()
  }
}

fn id(name: &str) -> TargetId {
  TargetId::from(name)
}

/// `top` needs `l` and `r`, which both need `base`.
fn diamond() -> TargetGraph {
  let scheme = GraphBuilder::new();
  scheme.target("base").set(call("base")).unwrap();
  scheme.target("l").set(call("l").arg(scheme.target("base"))).unwrap();
  scheme.target("r").set(call("r").arg(scheme.target("base"))).unwrap();
  scheme
    .target("top")
    .set(call("top").arg(scheme.target("l")).arg(scheme.target("r")))
    .unwrap();
  scheme.main(scheme.target("top"));
  scheme.build()
}

#[test]
fn test_two_processes_share_work() {
  let graph = diamond();
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let first_store = FsStateStore::new(dir.path());
  let second_store = FsStateStore::new(dir.path());
  let first = Driver::new(&graph, &first_store, ConcatRunner);
  let second = Driver::new(&graph, &second_store, ConcatRunner);

  let report = first.step_to(&id("top")).unwrap();
  assert_eq!(report.built, Some(id("base")));

  // The second process is in the middle of building `l`.
  assert!(second_store.lock(&id("l")).unwrap());

  let report = first.step_to(&id("top")).unwrap();
  assert_eq!(report.built, Some(id("r")));
  assert_eq!(
    first.step_to(&id("top")).unwrap().outcome,
    StepOutcome::NoStepsAvailable
  );
  assert_eq!(first.compute(&id("l")).unwrap(), StepOutcome::TargetLocked);

  second_store.unlock(&id("l")).unwrap();
  assert_eq!(second.compute(&id("l")).unwrap(), StepOutcome::StepOk);

  let summary = first.run_to(&id("top")).unwrap();
  assert_eq!(summary.steps, 1);
  assert_eq!(summary.outcome, StepOutcome::TargetReady);

  let top = fs::read_to_string(first_store.artifact_path(&id("top"))).unwrap();
  assert_eq!(top, "top(l(base()),r(base()))");
  assert_eq!(
    second.step_to(&id("top")).unwrap().outcome,
    StepOutcome::TargetReady
  );
}

#[test]
fn test_crash_releases_lock_and_discards_artifact() {
  let graph = diamond();
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let store = FsStateStore::new(dir.path());
  let driver = Driver::new(&graph, &store, CrashingRunner);

  let summary = driver.run_to(&id("top")).unwrap();
  assert_eq!(summary.steps, 0);
  assert_eq!(summary.outcome, StepOutcome::StepFailedWithException);

  let base = id("base");
  assert!(!store.is_locked(&base));
  assert!(!store.has_artifact(&base));

  // A later process picks the same step up again.
  let retry = Driver::new(&graph, &store, ConcatRunner);
  assert_eq!(retry.step_to(&id("top")).unwrap().built, Some(base));
}

#[test]
fn test_undeclared_input_gates_the_build() {
  let mut graph = TargetGraph::new();
  graph
    .declare("clean", call("clean").arg(Value::target("raw.csv")).build())
    .unwrap();
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let store = FsStateStore::new(dir.path());
  let driver = Driver::new(&graph, &store, ConcatRunner);

  assert_eq!(
    driver.view_step_to(&id("clean")).unwrap(),
    Preview::NoStepsAvailable
  );
  assert_eq!(
    driver.run_to(&id("clean")).unwrap().outcome,
    StepOutcome::NoStepsAvailable
  );

  fs::write(store.artifact_path(&id("raw.csv")), "rows").unwrap();
  let summary = driver.run_to(&id("clean")).unwrap();
  assert_eq!(summary.outcome, StepOutcome::TargetReady);
  assert_eq!(
    fs::read_to_string(store.artifact_path(&id("clean"))).unwrap(),
    "clean(rows)"
  );
}

#[test]
fn test_makefile_rules_mirror_graph() {
  let graph = diamond();
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let store = FsStateStore::new(dir.path());

  let text = export_makefile(&graph, &store, "stepwise compute");
  let path = |name: &str| store.artifact_path(&id(name)).display().to_string();

  assert!(text.starts_with(&format!(".PHONY: all\nall: {}\n", path("top"))));

  for target in graph.targets() {
    let prerequisites: Vec<String> = graph
      .dependencies_of(target.as_str())
      .iter()
      .map(|dep| path(dep.as_str()))
      .collect();
    let head = if prerequisites.is_empty() {
      format!("{}:", path(target.as_str()))
    } else {
      format!("{}: {}", path(target.as_str()), prerequisites.join(" "))
    };
    let rule = format!("{}\n\tstepwise compute \"{}\"\n", head, target);
    assert!(text.contains(&rule), "missing rule:\n{rule}\nin:\n{text}");
  }
}
