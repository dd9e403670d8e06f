use std::fmt;

use serde::{Serialize, Serializer};

/// Declared setting category, as written in the `type` property of a
/// setting descriptor (`type: OptionType.SELECT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingCategory {
  String,
  Number,
  BigInt,
  Boolean,
  Select,
  Slider,
  Component,
  Custom,
}

impl SettingCategory {
  /// Category for a member name of the category enumeration.
  #[must_use]
  pub fn from_name(name: &str) -> Option<Self> {
    let category = match name {
      "STRING" => Self::String,
      "NUMBER" => Self::Number,
      "BIGINT" => Self::BigInt,
      "BOOLEAN" => Self::Boolean,
      "SELECT" => Self::Select,
      "SLIDER" => Self::Slider,
      "COMPONENT" => Self::Component,
      "CUSTOM" => Self::Custom,
      _ => return None,
    };
    Some(category)
  }

  /// Category for the numeric value the enumeration assigns it.
  #[must_use]
  pub const fn from_code(code: i64) -> Option<Self> {
    let category = match code {
      0 => Self::String,
      1 => Self::Number,
      2 => Self::BigInt,
      3 => Self::Boolean,
      4 => Self::Select,
      5 => Self::Slider,
      6 => Self::Component,
      7 => Self::Custom,
      _ => return None,
    };
    Some(category)
  }

  /// Component and custom settings hold opaque, UI-rendered values.
  #[must_use]
  pub const fn is_structured(self) -> bool {
    matches!(self, Self::Component | Self::Custom)
  }
}

/// Final type assigned to a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
  Bool,
  Str,
  NullOrStr,
  Int,
  NullOrInt,
  Float,
  NullOrFloat,
  Enum,
  ListOfStr,
  ListOfAttrs,
  Attrs,
}

impl TypeTag {
  #[must_use]
  pub const fn is_nullable(self) -> bool {
    matches!(self, Self::NullOrStr | Self::NullOrInt | Self::NullOrFloat)
  }

  #[must_use]
  pub const fn is_list(self) -> bool {
    matches!(self, Self::ListOfStr | Self::ListOfAttrs)
  }

  #[must_use]
  pub const fn is_integer(self) -> bool {
    matches!(self, Self::Int | Self::NullOrInt)
  }

  #[must_use]
  pub const fn is_float(self) -> bool {
    matches!(self, Self::Float | Self::NullOrFloat)
  }

  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Bool => "bool",
      Self::Str => "str",
      Self::NullOrStr => "nullOr str",
      Self::Int => "int",
      Self::NullOrInt => "nullOr int",
      Self::Float => "float",
      Self::NullOrFloat => "nullOr float",
      Self::Enum => "enum",
      Self::ListOfStr => "listOf str",
      Self::ListOfAttrs => "listOf attrs",
      Self::Attrs => "attrs",
    }
  }
}

impl fmt::Display for TypeTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for TypeTag {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_category_codes_match_names() {
    for (code, name) in [
      "STRING",
      "NUMBER",
      "BIGINT",
      "BOOLEAN",
      "SELECT",
      "SLIDER",
      "COMPONENT",
      "CUSTOM",
    ]
    .into_iter()
    .enumerate()
    {
      let code = i64::try_from(code).expect("small index");
      assert_eq!(SettingCategory::from_code(code), SettingCategory::from_name(name));
    }
    assert_eq!(SettingCategory::from_code(8), None);
    assert!(SettingCategory::Custom.is_structured());
    assert!(!SettingCategory::Select.is_structured());
  }

  #[test]
  fn test_type_tag_display() {
    assert_eq!(TypeTag::NullOrStr.to_string(), "nullOr str");
    assert!(TypeTag::NullOrFloat.is_nullable());
    assert!(!TypeTag::Attrs.is_nullable());
  }
}
