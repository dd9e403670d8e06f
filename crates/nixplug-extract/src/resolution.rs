//! Consistency between a setting's final type and its default.
//!
//! Runs once after inference. The steps are applied in a fixed order and
//! later steps see what earlier ones produced.
use crate::{
  evidence::{DefaultSyntax, SettingEvidence},
  inference::InferenceState,
  types::TypeTag,
  value::Value,
};

/// Settled type and default of one setting.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
  pub type_tag:    TypeTag,
  pub default:     Option<Value>,
  /// Present exactly when `type_tag` is [`TypeTag::Enum`]; never empty.
  pub enum_values: Option<Vec<Value>>,
}

/// Settle the default for the inferred type.
#[must_use]
pub fn resolve(evidence: &SettingEvidence, state: InferenceState) -> Resolved {
  let mut type_tag = state.type_tag.unwrap_or(TypeTag::Str);
  let mut default = state.default;
  let literal_default_missing = !evidence.default.is_value();

  // Enums borrow a default from their options. A boolean only takes an
  // option flagged as the default; otherwise it falls through to `false`.
  if default.is_none() {
    match type_tag {
      TypeTag::Enum => default = evidence.options.preferred_default().cloned(),
      TypeTag::Bool => default.clone_from(&evidence.options.default),
      _ => {},
    }
  }

  // A string without a default is nullable, unless the default names
  // structured data.
  if type_tag == TypeTag::Str && default.is_none() {
    if evidence.identifier_is_structured() {
      type_tag = TypeTag::Attrs;
      default = Some(Value::empty_object());
    } else {
      type_tag = TypeTag::NullOrStr;
      default = Some(Value::Null);
    }
  }

  // Checked against the literal default, not the working one.
  if type_tag.is_nullable() && literal_default_missing {
    default = Some(Value::Null);
  }

  if type_tag == TypeTag::Bool && default.is_none() {
    default = Some(Value::Bool(false));
  }

  if type_tag == TypeTag::Attrs && default.is_none() {
    default = if evidence.only_structural_properties {
      Some(Value::empty_object())
    } else {
      match evidence.shape.syntax {
        DefaultSyntax::Getter => Some(Value::Null),
        _ => Some(Value::empty_object()),
      }
    };
  }

  // Undo the nullable-string fallback when the default turned out to be
  // structured after all.
  if type_tag == TypeTag::NullOrStr
    && default.as_ref().is_some_and(Value::is_null)
    && evidence.identifier_is_structured()
  {
    type_tag = TypeTag::Attrs;
    default = Some(Value::empty_object());
  }

  if type_tag.is_list() && default.is_none() {
    default = Some(Value::empty_list());
  }

  let enum_values = if type_tag == TypeTag::Enum {
    state.enum_values.filter(|values| !values.is_empty())
  } else {
    None
  };
  // An enum with nothing to enumerate is a plain string.
  if type_tag == TypeTag::Enum && enum_values.is_none() {
    type_tag = if default.is_some() { TypeTag::Str } else { TypeTag::NullOrStr };
    default = default.or(Some(Value::Null));
  }

  Resolved {
    type_tag,
    default,
    enum_values,
  }
}
