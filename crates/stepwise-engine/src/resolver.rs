//! Next-step resolution.

use stepwise_graph::{TargetGraph, TargetId};
use stepwise_state::StateStore;
use tracing::{debug, instrument};

use crate::error::EngineError;

/// Finds the next buildable target on the way to a goal.
///
/// The search is depth-first over dependencies in declared order and returns
/// the first target whose dependencies are all done. A locked target is never
/// descended into: whatever lies under it is being handled by whoever holds
/// the lock, and it keeps its dependents blocked until it is released.
pub struct Resolver<'a> {
  graph: &'a TargetGraph,
  store: &'a dyn StateStore,
}

impl<'a> Resolver<'a> {
  pub fn new(graph: &'a TargetGraph, store: &'a dyn StateStore) -> Self {
    Self { graph, store }
  }

  /// The next target to build toward `goal`, or `None` when nothing can be
  /// built right now. `goal` itself is returned once all its dependencies are
  /// done, whether or not it has been built before.
  #[instrument(name = "find_next_step", skip(self, goal), fields(goal = %goal))]
  pub fn find_next_step(&self, goal: &TargetId) -> Result<Option<TargetId>, EngineError> {
    let mut path = Vec::new();
    let next = self.descend(goal, &mut path)?;
    debug!(next = ?next.as_ref().map(TargetId::as_str), "resolved");
    Ok(next)
  }

  fn descend(
    &self,
    target: &TargetId,
    path: &mut Vec<TargetId>,
  ) -> Result<Option<TargetId>, EngineError> {
    if self.store.is_locked(target) {
      return Ok(None);
    }

    // Undeclared: an external input, nothing to build.
    if !self.graph.exists(target.as_str()) {
      return Ok(None);
    }

    if let Some(start) = path.iter().position(|t| t == target) {
      let mut cycle = path[start..].to_vec();
      cycle.push(target.clone());
      return Err(EngineError::Cycle { path: cycle });
    }

    path.push(target.clone());
    let mut all_done = true;

    for dep in self.graph.dependencies_of(target.as_str()) {
      if self.store.is_locked(dep) {
        all_done = false;
      } else if !self.store.is_done(dep) {
        if let Some(next) = self.descend(dep, path)? {
          return Ok(Some(next));
        }
        all_done = false;
      }
    }

    path.pop();
    Ok(all_done.then(|| target.clone()))
  }
}
