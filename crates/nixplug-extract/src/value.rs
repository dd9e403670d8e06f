use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// A statically evaluated value.
///
/// Arrays and objects coming from array/object literals are *shape only*:
/// their contents are not interpreted. The only populated objects come from
/// shallow copies of a call's object-literal argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  List(Vec<Value>),
  Object(IndexMap<String, Value>),
}

impl Value {
  #[must_use]
  pub const fn empty_list() -> Self {
    Self::List(Vec::new())
  }

  #[must_use]
  pub fn empty_object() -> Self {
    Self::Object(IndexMap::new())
  }

  /// Build a numeric value from a JavaScript number, keeping integral values
  /// as integers.
  #[must_use]
  #[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range is checked before the cast"
  )]
  pub fn from_number(n: f64) -> Self {
    if n.is_finite()
      && n.fract() == 0.0
      && n >= i64::MIN as f64
      && n <= i64::MAX as f64
    {
      Self::Int(n as i64)
    } else {
      Self::Float(n)
    }
  }

  #[must_use]
  pub const fn is_null(&self) -> bool {
    matches!(self, Self::Null)
  }

  #[must_use]
  pub const fn is_primitive(&self) -> bool {
    !matches!(self, Self::List(_) | Self::Object(_))
  }

  #[must_use]
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }

  #[must_use]
  pub const fn as_int(&self) -> Option<i64> {
    match self {
      Self::Int(i) => Some(*i),
      _ => None,
    }
  }

  /// Name of the runtime shape, used in log lines and error messages.
  #[must_use]
  pub const fn kind_name(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Bool(_) => "boolean",
      Self::Int(_) => "integer",
      Self::Float(_) => "float",
      Self::Str(_) => "string",
      Self::List(_) => "array",
      Self::Object(_) => "object",
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("null"),
      Self::Bool(b) => write!(f, "{b}"),
      Self::Int(i) => write!(f, "{i}"),
      Self::Float(x) => write!(f, "{x}"),
      Self::Str(s) => write!(f, "{s:?}"),
      Self::List(items) => {
        f.write_str("[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{item}")?;
        }
        f.write_str("]")
      },
      Self::Object(map) => {
        f.write_str("{")?;
        for (i, (k, v)) in map.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_number_keeps_integers() {
    assert_eq!(Value::from_number(3.0), Value::Int(3));
    assert_eq!(Value::from_number(-2.0), Value::Int(-2));
    assert_eq!(Value::from_number(0.5), Value::Float(0.5));
    assert_eq!(Value::from_number(1e300), Value::Float(1e300));
  }

  #[test]
  fn test_untagged_serialization() {
    let mut map = IndexMap::new();
    map.insert("a".to_string(), Value::Int(1));
    map.insert("b".to_string(), Value::empty_list());
    let json = serde_json::to_string(&Value::Object(map)).unwrap_or_default();
    assert_eq!(json, r#"{"a":1,"b":[]}"#);
  }
}
