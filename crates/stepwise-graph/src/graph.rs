use std::collections::HashMap;

use tracing::debug;

use crate::error::GraphError;
use crate::invocation::Invocation;
use crate::target::TargetId;

#[derive(Debug, Clone)]
struct Entry {
  invocation: Invocation,
  dependencies: Vec<TargetId>,
}

/// Declared targets, their invocations and derived dependencies.
#[derive(Debug, Clone, Default)]
pub struct TargetGraph {
  /// Declaration order.
  order: Vec<TargetId>,
  entries: HashMap<TargetId, Entry>,
  main_target: Option<TargetId>,
}

impl TargetGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register the invocation producing `target`.
  ///
  /// A target can be declared only once, and neither it nor any target its
  /// invocation references may have an empty identifier. On failure the
  /// graph is left untouched.
  pub fn declare(
    &mut self,
    target: impl Into<TargetId>,
    invocation: impl Into<Invocation>,
  ) -> Result<(), GraphError> {
    let target = target.into();
    if self.entries.contains_key(&target) {
      return Err(GraphError::DuplicateTarget(target));
    }

    let invocation = invocation.into();
    let dependencies = invocation.dependencies();
    if target.as_str().is_empty() || dependencies.iter().any(|d| d.as_str().is_empty()) {
      return Err(GraphError::EmptyTarget(target));
    }
    debug!(
      target = %target,
      invocation = %invocation,
      dependencies = dependencies.len(),
      "target declared"
    );

    self.order.push(target.clone());
    self.entries.insert(
      target,
      Entry {
        invocation,
        dependencies,
      },
    );
    Ok(())
  }

  /// Dependencies of a target in declared order. Empty for leaves and for
  /// undeclared targets.
  pub fn dependencies_of(&self, target: &str) -> &[TargetId] {
    self
      .entries
      .get(target)
      .map(|e| e.dependencies.as_slice())
      .unwrap_or(&[])
  }

  pub fn invocation_of(&self, target: &str) -> Result<&Invocation, GraphError> {
    self
      .entries
      .get(target)
      .map(|e| &e.invocation)
      .ok_or_else(|| GraphError::UnknownTarget(TargetId::from(target)))
  }

  pub fn exists(&self, target: &str) -> bool {
    self.entries.contains_key(target)
  }

  /// All declared targets, in declaration order.
  pub fn targets(&self) -> &[TargetId] {
    &self.order
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Designate the overall build goal. The target need not be declared yet.
  pub fn set_main_target(&mut self, target: impl Into<TargetId>) {
    self.main_target = Some(target.into());
  }

  pub fn main_target(&self) -> Option<&TargetId> {
    self.main_target.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::invocation::call;
  use crate::value::Value;

  #[test]
  fn test_duplicate_declaration_fails_and_keeps_graph() {
    let mut graph = TargetGraph::new();
    graph.declare("a", call("first").build()).unwrap();

    let err = graph.declare("a", call("second").build()).unwrap_err();
    assert_eq!(err, GraphError::DuplicateTarget(TargetId::from("a")));

    assert_eq!(graph.len(), 1);
    assert_eq!(graph.invocation_of("a").unwrap().operation(), "first");
  }

  #[test]
  fn test_unknown_target() {
    let graph = TargetGraph::new();
    assert!(!graph.exists("missing"));
    assert!(graph.dependencies_of("missing").is_empty());
    assert_eq!(
      graph.invocation_of("missing").unwrap_err(),
      GraphError::UnknownTarget(TargetId::from("missing"))
    );
  }

  #[test]
  fn test_declaration_order_preserved() {
    let mut graph = TargetGraph::new();
    for name in ["z", "a", "m"] {
      graph.declare(name, Invocation::copy_of(1)).unwrap();
    }
    let names: Vec<&str> = graph.targets().iter().map(|t| t.as_str()).collect();
    assert_eq!(names, vec!["z", "a", "m"]);
  }

  #[test]
  fn test_dependencies_stored_at_declaration() {
    let mut graph = TargetGraph::new();
    graph
      .declare(
        "c",
        call("join")
          .arg(Value::target("a"))
          .arg(Value::target("b"))
          .build(),
      )
      .unwrap();
    assert_eq!(
      graph.dependencies_of("c"),
      &[TargetId::from("a"), TargetId::from("b")]
    );
  }

  #[test]
  fn test_empty_identifier_rejected() {
    let mut graph = TargetGraph::new();

    let err = graph.declare("", call("f").build()).unwrap_err();
    assert_eq!(err, GraphError::EmptyTarget(TargetId::from("")));

    let err = graph
      .declare("b", call("g").arg(Value::target("")).build())
      .unwrap_err();
    assert_eq!(err, GraphError::EmptyTarget(TargetId::from("b")));

    assert!(graph.is_empty());
    assert!(!graph.exists(""));
  }
}
