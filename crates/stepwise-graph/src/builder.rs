//! Authoring API for target graphs.
//!
//! ```
//! use stepwise_graph::{GraphBuilder, call};
//!
//! let scheme = GraphBuilder::new();
//! scheme.target("result").at(0).set(call("seed").arg("name"))?;
//! for i in 1..4 {
//!   scheme
//!     .target("result")
//!     .at(i)
//!     .set(call("step").arg(scheme.target("result").at(i - 1)).arg(i))?;
//! }
//! scheme.target("upload").set(call("upload").arg(scheme.target("result").at(3)))?;
//! scheme.main(scheme.target("upload"));
//!
//! let graph = scheme.build();
//! assert_eq!(graph.len(), 5);
//! assert_eq!(graph.dependencies_of("result[2]")[0].as_str(), "result[1]");
//! # Ok::<(), stepwise_graph::GraphError>(())
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::error::GraphError;
use crate::graph::TargetGraph;
use crate::invocation::Invocation;
use crate::target::TargetId;
use crate::value::Value;

/// Collects declarations into a [`TargetGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
  graph: RefCell<TargetGraph>,
}

impl GraphBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// A handle on the target `name`. Handles are cheap; they only carry the
  /// identifier and can be used both as arguments and to declare.
  pub fn target(&self, name: impl Into<TargetId>) -> TargetRef<'_> {
    TargetRef {
      builder: self,
      id: name.into(),
    }
  }

  pub fn main(&self, target: TargetRef<'_>) {
    self.graph.borrow_mut().set_main_target(target.id);
  }

  pub fn build(self) -> TargetGraph {
    self.graph.into_inner()
  }
}

/// A target identifier bound to the builder that will declare it.
#[derive(Clone)]
pub struct TargetRef<'a> {
  builder: &'a GraphBuilder,
  id: TargetId,
}

impl<'a> TargetRef<'a> {
  /// Indexed sub-target, rendered `name[index]`.
  pub fn at(&self, index: impl fmt::Display) -> TargetRef<'a> {
    TargetRef {
      builder: self.builder,
      id: self.id.indexed(index),
    }
  }

  pub fn id(&self) -> &TargetId {
    &self.id
  }

  /// This target as an argument value.
  pub fn value(&self) -> Value {
    Value::Target(self.id.clone())
  }

  /// Declare how this target is produced. Plain values are wrapped as
  /// [`Invocation::CopyOf`].
  pub fn set(self, producer: impl Into<Invocation>) -> Result<(), GraphError> {
    self
      .builder
      .graph
      .borrow_mut()
      .declare(self.id, producer.into())
  }
}

impl fmt::Debug for TargetRef<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("TargetRef").field(&self.id).finish()
  }
}

impl From<TargetRef<'_>> for Value {
  fn from(target: TargetRef<'_>) -> Self {
    Value::Target(target.id)
  }
}

impl From<&TargetRef<'_>> for Value {
  fn from(target: &TargetRef<'_>) -> Self {
    target.value()
  }
}

impl From<TargetRef<'_>> for Invocation {
  fn from(target: TargetRef<'_>) -> Self {
    Invocation::from(target.id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::invocation::call;

  #[test]
  fn test_set_value_wraps_as_copy() {
    let scheme = GraphBuilder::new();
    scheme.target("x").set(Value::from(5)).unwrap();
    scheme.target("alias").set(scheme.target("x")).unwrap();
    let graph = scheme.build();

    assert_eq!(graph.invocation_of("x").unwrap(), &Invocation::copy_of(5));
    assert_eq!(graph.invocation_of("alias").unwrap().operation(), "copy");
    assert_eq!(graph.dependencies_of("alias"), &[TargetId::from("x")]);
  }

  #[test]
  fn test_duplicate_via_builder() {
    let scheme = GraphBuilder::new();
    scheme.target("d").at(1).set(call("a")).unwrap();
    let err = scheme.target("d").at(1).set(call("b")).unwrap_err();
    assert_eq!(err, GraphError::DuplicateTarget(TargetId::from("d[1]")));
  }

  #[test]
  fn test_main_target() {
    let scheme = GraphBuilder::new();
    scheme.target("goal").set(call("make")).unwrap();
    scheme.main(scheme.target("goal"));
    let graph = scheme.build();
    assert_eq!(graph.main_target(), Some(&TargetId::from("goal")));
  }
}
