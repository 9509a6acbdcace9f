//! Stepwise Config
//!
//! This crate contains the serializable scheme types for stepwise. A scheme
//! is a JSON file declaring targets, the operations that produce them, the
//! state directory and the runner to use:
//!
//! ```json
//! {
//!   "state_dir": "./datafiles",
//!   "main_target": "report",
//!   "runner": { "kind": "command", "working_dir": "." },
//!   "targets": [
//!     { "target": "raw", "call": { "operation": "fetch", "args": ["http://x"] } },
//!     { "target": "report", "call": { "operation": "summarise", "args": [{ "target": "raw" }] } },
//!     { "target": "alias", "copy": { "target": "report" } }
//!   ]
//! }
//! ```
//!
//! [`SchemeDef::to_graph`] resolves a scheme into a
//! [`TargetGraph`](stepwise_graph::TargetGraph).

mod error;
mod runner;
mod scheme;

pub use error::ConfigError;
pub use runner::RunnerDef;
pub use scheme::{CallDef, MapDef, ProducerDef, SchemeDef, TargetDef, TargetRefDef, ValueDef};
