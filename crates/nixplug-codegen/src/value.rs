use std::collections::BTreeMap;

use nixplug_extract::Value;

/// A Nix value tree, built once and rendered by [`crate::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum NixValue {
  Str(String),
  Int(i64),
  Float(f64),
  Bool(bool),
  Null,
  List(Vec<NixValue>),
  /// Keys are kept sorted; rendering hoists `enable` to the front.
  AttrSet(BTreeMap<String, NixValue>),
  /// Pre-rendered Nix, written verbatim. Continuation lines are re-indented
  /// to the position the fragment is rendered at.
  Raw(String),
  /// `function argument`, e.g. `mkOption { ... }`.
  Apply {
    function: String,
    argument: Box<NixValue>,
  },
}

impl NixValue {
  #[must_use]
  pub const fn attrs() -> Self {
    Self::AttrSet(BTreeMap::new())
  }

  #[must_use]
  pub fn raw(text: impl Into<String>) -> Self {
    Self::Raw(text.into())
  }

  #[must_use]
  pub fn apply(function: impl Into<String>, argument: Self) -> Self {
    Self::Apply {
      function: function.into(),
      argument: Box::new(argument),
    }
  }

  /// Insert `value` under `key` when `self` is an attribute set.
  pub fn insert(&mut self, key: impl Into<String>, value: Self) {
    if let Self::AttrSet(map) = self {
      map.insert(key.into(), value);
    }
  }

  /// Whether the value has to be parenthesized as a list element or
  /// function argument.
  #[must_use]
  pub const fn needs_parens(&self) -> bool {
    match self {
      Self::Int(n) => *n < 0,
      Self::Float(f) => f.is_sign_negative(),
      Self::Apply { .. } => true,
      _ => false,
    }
  }
}

impl From<&Value> for NixValue {
  fn from(value: &Value) -> Self {
    match value {
      Value::Null => Self::Null,
      Value::Bool(b) => Self::Bool(*b),
      Value::Int(n) => Self::Int(*n),
      Value::Float(f) => Self::Float(*f),
      Value::Str(s) => Self::Str(s.clone()),
      Value::List(items) => Self::List(items.iter().map(Self::from).collect()),
      Value::Object(entries) => {
        Self::AttrSet(
          entries
            .iter()
            .map(|(key, value)| (key.clone(), Self::from(value)))
            .collect(),
        )
      },
    }
  }
}

impl From<&str> for NixValue {
  fn from(text: &str) -> Self {
    Self::Str(text.to_string())
  }
}

impl From<bool> for NixValue {
  fn from(b: bool) -> Self {
    Self::Bool(b)
  }
}
