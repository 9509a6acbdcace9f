use std::borrow::Borrow;
use std::fmt;

/// Identifier of a producible artifact.
///
/// Identifiers are opaque strings: two targets are the same target iff their
/// string forms are equal. The builder renders indexed targets as
/// `name[index]`, but nothing downstream parses that shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(String);

impl TargetId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Append an index suffix, e.g. `result` + `3` -> `result[3]`.
  pub fn indexed(&self, index: impl fmt::Display) -> Self {
    Self(format!("{}[{}]", self.0, index))
  }
}

impl fmt::Display for TargetId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TargetId {
  fn from(id: &str) -> Self {
    Self(id.to_string())
  }
}

impl From<String> for TargetId {
  fn from(id: String) -> Self {
    Self(id)
  }
}

impl From<&TargetId> for TargetId {
  fn from(id: &TargetId) -> Self {
    id.clone()
  }
}

impl AsRef<str> for TargetId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl Borrow<str> for TargetId {
  fn borrow(&self) -> &str {
    &self.0
  }
}
