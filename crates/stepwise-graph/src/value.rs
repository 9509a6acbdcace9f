use std::collections::BTreeMap;
use std::fmt;

use crate::target::TargetId;

/// An argument to an invocation.
///
/// Target references anywhere inside a value, including inside nested lists
/// and maps, are dependencies of the invocation that carries it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  /// Reference to another target's artifact.
  Target(TargetId),
  /// Plain data passed through to the runner.
  Literal(serde_json::Value),
  List(Vec<Value>),
  Map(BTreeMap<String, Value>),
}

impl Value {
  pub fn target(id: impl Into<TargetId>) -> Self {
    Value::Target(id.into())
  }

  pub fn literal(value: impl Into<serde_json::Value>) -> Self {
    Value::Literal(value.into())
  }

  /// Push every target referenced by this value onto `out`, depth-first.
  pub fn collect_targets(&self, out: &mut Vec<TargetId>) {
    match self {
      Value::Target(id) => out.push(id.clone()),
      Value::Literal(_) => {}
      Value::List(items) => {
        for item in items {
          item.collect_targets(out);
        }
      }
      Value::Map(entries) => {
        for item in entries.values() {
          item.collect_targets(out);
        }
      }
    }
  }

  pub fn as_target(&self) -> Option<&TargetId> {
    match self {
      Value::Target(id) => Some(id),
      _ => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Target(id) => write!(f, "{}", id),
      Value::Literal(value) => write!(f, "{}", value),
      Value::List(items) => {
        f.write_str("[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            f.write_str(",")?;
          }
          write!(f, "{}", item)?;
        }
        f.write_str("]")
      }
      Value::Map(entries) => {
        f.write_str("{")?;
        for (i, (key, item)) in entries.iter().enumerate() {
          if i > 0 {
            f.write_str(",")?;
          }
          write!(f, "{}={}", key, item)?;
        }
        f.write_str("}")
      }
    }
  }
}

impl From<TargetId> for Value {
  fn from(id: TargetId) -> Self {
    Value::Target(id)
  }
}

impl From<&TargetId> for Value {
  fn from(id: &TargetId) -> Self {
    Value::Target(id.clone())
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Literal(serde_json::Value::from(s))
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Literal(serde_json::Value::from(s))
  }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self {
    Value::Literal(serde_json::Value::from(n))
  }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self {
    Value::Literal(serde_json::Value::from(n))
  }
}

impl From<u64> for Value {
  fn from(n: u64) -> Self {
    Value::Literal(serde_json::Value::from(n))
  }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self {
    Value::Literal(serde_json::Value::from(n))
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Literal(serde_json::Value::from(b))
  }
}

impl From<serde_json::Value> for Value {
  fn from(value: serde_json::Value) -> Self {
    Value::Literal(value)
  }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(items: Vec<T>) -> Self {
    Value::List(items.into_iter().map(Into::into).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_collect_targets_descends_into_lists_and_maps() {
    let value = Value::List(vec![
      Value::target("a"),
      Value::List(vec![Value::target("b"), Value::literal(3)]),
      Value::Map(BTreeMap::from([("k".to_string(), Value::target("c"))])),
    ]);

    let mut out = Vec::new();
    value.collect_targets(&mut out);

    assert_eq!(
      out,
      vec![TargetId::from("a"), TargetId::from("b"), TargetId::from("c")]
    );
  }

  #[test]
  fn test_display_quotes_strings_but_not_targets() {
    let value = Value::List(vec![Value::target("data[1]"), Value::from("raw"), Value::from(2)]);
    assert_eq!(value.to_string(), r#"[data[1],"raw",2]"#);
  }
}
