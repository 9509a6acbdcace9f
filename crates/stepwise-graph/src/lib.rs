//! Stepwise Graph
//!
//! This crate provides the target graph for stepwise. A target is a named
//! artifact produced by exactly one [`Invocation`]; the graph maps every
//! declared target to its invocation and to the targets that invocation
//! references (its dependencies).
//!
//! Graphs are assembled once, either through [`TargetGraph::declare`] or the
//! [`GraphBuilder`] authoring API, and are read-only afterwards. Build state
//! (locked / done / pending) is never stored here; it lives on disk and is
//! owned by `stepwise-state`.

mod builder;
mod error;
mod graph;
mod invocation;
mod target;
mod value;

pub use builder::{GraphBuilder, TargetRef};
pub use error::GraphError;
pub use graph::TargetGraph;
pub use invocation::{CallBuilder, Invocation, call};
pub use target::TargetId;
pub use value::Value;
