//! Stepwise Engine
//!
//! This crate drives a [`TargetGraph`](stepwise_graph::TargetGraph) toward a
//! goal, one target at a time:
//!
//! - [`Resolver`] finds the single next target that can be built right now,
//! - [`Executor`] locks a target, hands it to a
//!   [`Runner`](stepwise_runner::Runner) and always releases the lock,
//! - [`Driver`] ties the two together behind the user-facing operations
//!   (`compute`, `step_to`, their dry-run views and `run_to`),
//! - [`report`] and [`makefile`] render the graph for inspection and for
//!   parallel builds with `make -j`.
//!
//! There is no in-process concurrency. Parallelism comes from running several
//! processes against the same state directory; they coordinate only through
//! lock markers.

mod driver;
mod error;
mod executor;
pub mod makefile;
mod outcome;
pub mod report;
mod resolver;

pub use driver::{BuildPlan, Driver, Preview, RunSummary, StepReport};
pub use error::EngineError;
pub use executor::Executor;
pub use makefile::export_makefile;
pub use outcome::{BuildOutcome, StepOutcome};
pub use resolver::Resolver;
