use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::target::TargetId;
use crate::value::Value;

/// How a target is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
  /// Run a named operation with positional and named arguments.
  Call {
    operation: String,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
  },
  /// The target is a copy of a plain value (or of another target).
  CopyOf { value: Value },
}

impl Invocation {
  pub fn copy_of(value: impl Into<Value>) -> Self {
    Invocation::CopyOf {
      value: value.into(),
    }
  }

  /// Name of the operation; `copy` for [`Invocation::CopyOf`].
  pub fn operation(&self) -> &str {
    match self {
      Invocation::Call { operation, .. } => operation,
      Invocation::CopyOf { .. } => "copy",
    }
  }

  /// Targets referenced by the arguments, positional first, then named
  /// arguments in key order. Each target appears once, at its first mention.
  pub fn dependencies(&self) -> Vec<TargetId> {
    let mut found = Vec::new();
    match self {
      Invocation::Call { args, kwargs, .. } => {
        for arg in args {
          arg.collect_targets(&mut found);
        }
        for arg in kwargs.values() {
          arg.collect_targets(&mut found);
        }
      }
      Invocation::CopyOf { value } => value.collect_targets(&mut found),
    }

    let mut seen = HashSet::new();
    found.retain(|id| seen.insert(id.clone()));
    found
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Invocation::Call {
        operation,
        args,
        kwargs,
      } => {
        write!(f, "{}(", operation)?;
        let mut first = true;
        for arg in args {
          if !first {
            f.write_str(",")?;
          }
          first = false;
          write!(f, "{}", arg)?;
        }
        for (key, arg) in kwargs {
          if !first {
            f.write_str(",")?;
          }
          first = false;
          write!(f, "{}={}", key, arg)?;
        }
        f.write_str(")")
      }
      Invocation::CopyOf { value } => write!(f, "copy({})", value),
    }
  }
}

impl From<Value> for Invocation {
  fn from(value: Value) -> Self {
    Invocation::CopyOf { value }
  }
}

impl From<TargetId> for Invocation {
  fn from(id: TargetId) -> Self {
    Invocation::CopyOf {
      value: Value::Target(id),
    }
  }
}

/// Start building a [`Invocation::Call`] of `operation`.
pub fn call(operation: impl Into<String>) -> CallBuilder {
  CallBuilder {
    operation: operation.into(),
    args: Vec::new(),
    kwargs: BTreeMap::new(),
  }
}

/// Incremental construction of a call invocation.
#[derive(Debug, Clone)]
pub struct CallBuilder {
  operation: String,
  args: Vec<Value>,
  kwargs: BTreeMap<String, Value>,
}

impl CallBuilder {
  pub fn arg(mut self, value: impl Into<Value>) -> Self {
    self.args.push(value.into());
    self
  }

  pub fn args<I, V>(mut self, values: I) -> Self
  where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
  {
    self.args.extend(values.into_iter().map(Into::into));
    self
  }

  pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.kwargs.insert(key.into(), value.into());
    self
  }

  pub fn build(self) -> Invocation {
    Invocation::Call {
      operation: self.operation,
      args: self.args,
      kwargs: self.kwargs,
    }
  }
}

impl From<CallBuilder> for Invocation {
  fn from(builder: CallBuilder) -> Self {
    builder.build()
  }
}
