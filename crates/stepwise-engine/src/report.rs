//! Read-only views of a graph and its build state.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use stepwise_graph::{GraphError, TargetGraph, TargetId};
use stepwise_state::{StateStore, TargetStatus};

/// One line of a dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
  pub depth: usize,
  pub target: TargetId,
  /// Undeclared targets are external inputs; they still have a status.
  pub declared: bool,
  pub status: TargetStatus,
  /// Whether the target's own dependencies are listed below it.
  pub expanded: bool,
}

/// Dependency tree of a target, in depth-first declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
  pub nodes: Vec<TreeNode>,
  with_status: bool,
}

/// Full dependency tree of `root`. A target reached again along the path it
/// was reached through is listed but not expanded.
pub fn dependency_tree(
  graph: &TargetGraph,
  store: &dyn StateStore,
  root: &TargetId,
) -> DependencyTree {
  let mut nodes = Vec::new();
  let mut path = Vec::new();
  walk_full(graph, store, root, 0, &mut path, &mut nodes);
  DependencyTree {
    nodes,
    with_status: false,
  }
}

fn walk_full(
  graph: &TargetGraph,
  store: &dyn StateStore,
  target: &TargetId,
  depth: usize,
  path: &mut Vec<TargetId>,
  nodes: &mut Vec<TreeNode>,
) {
  let declared = graph.exists(target.as_str());
  let expanded = declared && !path.contains(target);
  nodes.push(TreeNode {
    depth,
    target: target.clone(),
    declared,
    status: store.status(target),
    expanded,
  });

  if expanded {
    path.push(target.clone());
    for dep in graph.dependencies_of(target.as_str()) {
      walk_full(graph, store, dep, depth + 1, path, nodes);
    }
    path.pop();
  }
}

/// Abridged tree with build status: each target appears once, at its first
/// occurrence.
pub fn dependency_status_tree(
  graph: &TargetGraph,
  store: &dyn StateStore,
  root: &TargetId,
) -> DependencyTree {
  let mut nodes = Vec::new();
  let mut seen = HashSet::new();
  walk_once(graph, store, root, 0, &mut seen, &mut nodes);
  DependencyTree {
    nodes,
    with_status: true,
  }
}

fn walk_once(
  graph: &TargetGraph,
  store: &dyn StateStore,
  target: &TargetId,
  depth: usize,
  seen: &mut HashSet<TargetId>,
  nodes: &mut Vec<TreeNode>,
) {
  if !seen.insert(target.clone()) {
    return;
  }

  let declared = graph.exists(target.as_str());
  nodes.push(TreeNode {
    depth,
    target: target.clone(),
    declared,
    status: store.status(target),
    expanded: declared,
  });

  for dep in graph.dependencies_of(target.as_str()) {
    walk_once(graph, store, dep, depth + 1, seen, nodes);
  }
}

fn status_label(status: TargetStatus) -> &'static str {
  match status {
    TargetStatus::Locked => "LOCKED",
    TargetStatus::Done => "DONE  ",
    TargetStatus::Pending => "      ",
  }
}

impl fmt::Display for DependencyTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for node in &self.nodes {
      let indent = " ".repeat(node.depth);
      if self.with_status {
        writeln!(f, "{}\t{}{}", status_label(node.status), indent, node.target)?;
      } else {
        writeln!(f, "{}{}", indent, node.target)?;
      }
      if !node.declared {
        writeln!(f, "{} ??", indent)?;
      }
    }
    Ok(())
  }
}

/// Status of every declared target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatReport {
  pub rows: Vec<(TargetId, TargetStatus)>,
}

impl StatReport {
  pub fn count(&self, status: TargetStatus) -> usize {
    self.rows.iter().filter(|(_, s)| *s == status).count()
  }

  pub fn total(&self) -> usize {
    self.rows.len()
  }
}

pub fn stat(graph: &TargetGraph, store: &dyn StateStore) -> StatReport {
  StatReport {
    rows: graph
      .targets()
      .iter()
      .map(|t| (t.clone(), store.status(t)))
      .collect(),
  }
}

impl fmt::Display for StatReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (target, status) in &self.rows {
      writeln!(f, "{}\t{}", status_label(*status), target)?;
    }
    writeln!(f, "----------------")?;
    writeln!(f, "Not done: {}", self.count(TargetStatus::Pending))?;
    writeln!(f, "Locked:   {}", self.count(TargetStatus::Locked))?;
    writeln!(f, "Done:     {}", self.count(TargetStatus::Done))?;
    writeln!(f, "Total targets: {}", self.total())
  }
}

/// Artifact path of a declared target.
pub fn target_file(
  graph: &TargetGraph,
  store: &dyn StateStore,
  target: &TargetId,
) -> Result<PathBuf, GraphError> {
  if !graph.exists(target.as_str()) {
    return Err(GraphError::UnknownTarget(target.clone()));
  }
  Ok(store.artifact_path(target))
}
