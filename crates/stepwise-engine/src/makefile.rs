//! Makefile export.
//!
//! Every declared target becomes a rule whose recipe calls back into
//! stepwise to build just that target. Running the result with `make -j N`
//! gives N concurrent builders, each using the normal lock protocol.
//!
//! ```text
//! .PHONY: all
//! all: state/report
//!
//! state/raw:
//! 	stepwise compute "raw"
//!
//! state/report: state/raw
//! 	stepwise compute "report"
//! ```

use std::path::Path;

use stepwise_graph::{TargetGraph, TargetId};
use stepwise_state::StateStore;

/// Render `graph` as a Makefile. `command` is the recipe prefix; the quoted
/// target identifier is appended to it.
pub fn export_makefile(graph: &TargetGraph, store: &dyn StateStore, command: &str) -> String {
  let path_of = |t: &TargetId| escape_path(&store.artifact_path(t));
  let mut out = String::new();

  if let Some(main) = graph.main_target() {
    out.push_str(&format!(".PHONY: all\nall: {}\n\n", path_of(main)));
  }

  for target in graph.targets() {
    let rule = std::iter::once(format!("{}:", path_of(target)))
      .chain(graph.dependencies_of(target.as_str()).iter().map(path_of))
      .collect::<Vec<_>>()
      .join(" ");
    out.push_str(&format!(
      "{}\n\t{} \"{}\"\n\n",
      rule,
      command,
      escape_id(target.as_str())
    ));
  }

  out
}

/// Escape a file name for use as a make target or prerequisite.
fn escape_path(path: &Path) -> String {
  let raw = path.display().to_string();
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '$' => out.push_str("$$"),
      ' ' | '%' | '#' | ':' => {
        out.push('\\');
        out.push(c);
      }
      _ => out.push(c),
    }
  }
  out
}

/// Escape a target identifier for a double-quoted shell word inside a recipe.
/// `$` is also doubled so make passes it through to the shell.
fn escape_id(id: &str) -> String {
  let mut out = String::with_capacity(id.len());
  for c in id.chars() {
    match c {
      '"' | '\\' | '`' => {
        out.push('\\');
        out.push(c);
      }
      '$' => out.push_str("\\$$"),
      _ => out.push(c),
    }
  }
  out
}
