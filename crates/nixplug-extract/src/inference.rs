//! The four-stage type inference pipeline.
//!
//! Each stage is a pure function from the previous [`InferenceState`] to the
//! next. Stage order decides which type wins for ambiguous settings: a
//! structured setting is first coerced to `attrs` and only afterwards
//! refined into a list type, and the opaque-identifier fallback sees the
//! result of both. [`STAGES`] is the single place that order is written down.
use log::trace;

use crate::{
  evidence::{DefaultSyntax, SettingEvidence},
  options::OptionList,
  types::{SettingCategory, TypeTag},
  value::Value,
};

/// State threaded through the stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceState {
  pub type_tag: Option<TypeTag>,
  pub enum_values: Option<Vec<Value>>,
  /// Working default. Starts as the evaluated default, stages may replace it.
  pub default: Option<Value>,
  pub has_string_array: bool,
  pub has_identifier_string_array: bool,
  pub is_component_or_custom: bool,
}

impl InferenceState {
  /// Starting state: nothing inferred, the evaluated default as working
  /// default.
  #[must_use]
  pub fn seed(evidence: &SettingEvidence) -> Self {
    Self {
      default: evidence.default_value().cloned(),
      ..Self::default()
    }
  }
}

/// One pipeline stage.
pub type Stage = fn(&SettingEvidence, InferenceState) -> InferenceState;

/// The pipeline, in order.
pub const STAGES: [(&str, Stage); 4] = [
  ("initial", initial),
  ("structured coercion", structured_coercion),
  ("array refinement", array_refinement),
  ("final fallback", final_fallback),
];

/// Run every stage of [`STAGES`].
#[must_use]
pub fn infer(evidence: &SettingEvidence) -> InferenceState {
  run(evidence, &STAGES)
}

/// Run an explicit list of stages from the seed state.
#[must_use]
pub fn run(evidence: &SettingEvidence, stages: &[(&str, Stage)]) -> InferenceState {
  stages
    .iter()
    .fold(InferenceState::seed(evidence), |state, (name, stage)| {
      let before = state.type_tag;
      let next = stage(evidence, state);
      if next.type_tag != before {
        trace!(
          "nixplug-extract: {name}: {} -> {}",
          before.map_or("none", TypeTag::as_str),
          next.type_tag.map_or("none", TypeTag::as_str)
        );
      }
      next
    })
}

/// Stage 1: baseline type from the declared category, else the default's
/// shape, else the presence of options. Also records structural flags.
#[must_use]
pub fn initial(evidence: &SettingEvidence, mut state: InferenceState) -> InferenceState {
  state.has_string_array = evidence.has_string_array();
  state.has_identifier_string_array = evidence.has_identifier_string_array();
  state.is_component_or_custom = evidence.is_component_or_custom();

  let (type_tag, enum_values) = match evidence.category {
    Some(category) => from_category(category, evidence, state.default.as_ref()),
    None => {
      state
        .default
        .as_ref()
        .map(|default| from_default(default, evidence))
        .map_or_else(|| from_options(&evidence.options), |tag| (Some(tag), None))
    },
  };

  state.type_tag = type_tag;
  state.enum_values = enum_values;
  state
}

fn from_category(
  category: SettingCategory,
  evidence: &SettingEvidence,
  default: Option<&Value>,
) -> (Option<TypeTag>, Option<Vec<Value>>) {
  let has_default = default.is_some_and(|v| !v.is_null());
  let tag = match category {
    SettingCategory::Boolean => TypeTag::Bool,
    SettingCategory::String => TypeTag::Str,
    SettingCategory::Number => {
      match default {
        Some(Value::Float(_)) => TypeTag::Float,
        _ if has_default => TypeTag::Int,
        _ => TypeTag::NullOrInt,
      }
    },
    SettingCategory::BigInt => TypeTag::Int,
    SettingCategory::Slider => {
      if has_default {
        TypeTag::Float
      } else {
        TypeTag::NullOrFloat
      }
    },
    SettingCategory::Select => return from_options(&evidence.options),
    // Provisional: scalar defaults keep their type, everything else is left
    // for the structured coercion stage.
    SettingCategory::Component | SettingCategory::Custom => {
      return match default {
        Some(Value::Bool(_)) => (Some(TypeTag::Bool), None),
        Some(Value::Int(_)) => (Some(TypeTag::Int), None),
        Some(Value::Float(_)) => (Some(TypeTag::Float), None),
        _ => (None, None),
      };
    },
  };
  (Some(tag), None)
}

fn from_default(default: &Value, evidence: &SettingEvidence) -> TypeTag {
  match default {
    Value::Bool(_) => TypeTag::Bool,
    Value::Int(_) => TypeTag::Int,
    Value::Float(_) => TypeTag::Float,
    Value::Str(_) => TypeTag::Str,
    Value::Null => TypeTag::NullOrStr,
    Value::List(_) if evidence.shape.is_object_array() => TypeTag::ListOfAttrs,
    Value::List(_) => TypeTag::ListOfStr,
    Value::Object(_) => TypeTag::Attrs,
  }
}

/// Options alone make an enum, except `{true, false}` which is a boolean.
fn from_options(options: &OptionList) -> (Option<TypeTag>, Option<Vec<Value>>) {
  if options.is_empty() {
    (None, None)
  } else if options.is_boolean_pair() {
    (Some(TypeTag::Bool), None)
  } else {
    (Some(TypeTag::Enum), Some(options.values.clone()))
  }
}

/// Stage 2: coerce structured (component/custom) settings to `attrs` unless
/// the default is provably a plain string.
#[must_use]
pub fn structured_coercion(
  evidence: &SettingEvidence,
  mut state: InferenceState,
) -> InferenceState {
  let shape = &evidence.shape;

  if shape.is_identifier() && shape.is_object_array() {
    state.type_tag = Some(TypeTag::Attrs);
    return state;
  }

  if !state.is_component_or_custom {
    return state;
  }

  match shape.syntax {
    DefaultSyntax::Getter => {
      state.type_tag = Some(TypeTag::NullOrStr);
      state.default = Some(Value::Null);
    },
    DefaultSyntax::StringLiteral => state.type_tag = Some(TypeTag::Str),
    _ if matches!(state.type_tag, None | Some(TypeTag::Str)) => {
      if !matches!(state.default, Some(Value::Str(_))) {
        state.type_tag = Some(TypeTag::Attrs);
      }
    },
    _ => {},
  }
  state
}

/// Stage 3: downgrade to list types when the default is provably an array.
#[must_use]
pub fn array_refinement(
  evidence: &SettingEvidence,
  mut state: InferenceState,
) -> InferenceState {
  if !matches!(
    state.type_tag,
    None | Some(TypeTag::Str | TypeTag::NullOrStr | TypeTag::Attrs)
  ) {
    return state;
  }

  let shape = &evidence.shape;
  if shape.is_object_array() && !shape.is_unresolved_identifier() {
    state.type_tag = Some(TypeTag::ListOfAttrs);
  } else if state.has_string_array
    || state.has_identifier_string_array
    || (state.is_component_or_custom && shape.is_string_array())
  {
    state.type_tag = Some(TypeTag::ListOfStr);
  } else if shape.is_typed_empty_array() && evidence.is_custom() {
    state.type_tag = Some(TypeTag::ListOfAttrs);
  }
  state
}

/// Stage 4: a custom setting whose default names something we cannot see
/// becomes `attrs` rather than a guessed scalar.
#[must_use]
pub fn final_fallback(evidence: &SettingEvidence, mut state: InferenceState) -> InferenceState {
  if !matches!(state.type_tag, Some(TypeTag::Attrs | TypeTag::ListOfAttrs))
    && evidence.shape.is_unresolved_identifier()
    && evidence.is_custom()
  {
    state.type_tag = Some(TypeTag::Attrs);
    state.default = None;
  }
  state
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    error::Extracted,
    evidence::{ArrayShape, DefaultShape},
  };

  fn evidence(category: Option<SettingCategory>, default: Option<Value>) -> SettingEvidence {
    SettingEvidence::new(category, default.into())
  }

  #[test]
  fn test_category_table() {
    let cases = [
      (SettingCategory::Boolean, Some(Value::Bool(true)), Some(TypeTag::Bool)),
      (SettingCategory::String, None, Some(TypeTag::Str)),
      (SettingCategory::Number, Some(Value::Int(3)), Some(TypeTag::Int)),
      (SettingCategory::Number, Some(Value::Float(0.5)), Some(TypeTag::Float)),
      (SettingCategory::Number, None, Some(TypeTag::NullOrInt)),
      (SettingCategory::BigInt, Some(Value::Str("9".into())), Some(TypeTag::Int)),
      (SettingCategory::Slider, Some(Value::Int(1)), Some(TypeTag::Float)),
      (SettingCategory::Slider, None, Some(TypeTag::NullOrFloat)),
      (SettingCategory::Select, None, None),
      (SettingCategory::Component, None, None),
    ];
    for (category, default, expected) in cases {
      let state = initial(
        &evidence(Some(category), default.clone()),
        InferenceState::seed(&evidence(Some(category), default)),
      );
      assert_eq!(state.type_tag, expected, "{category:?}");
    }
  }

  #[test]
  fn test_untagged_boolean_pair_is_bool() {
    let mut e = evidence(None, None);
    e.options = OptionList {
      values: vec![Value::Bool(true), Value::Bool(false)],
      labels: vec![None, None],
      default: None,
    };
    let state = infer(&e);
    assert_eq!(state.type_tag, Some(TypeTag::Bool));
    assert_eq!(state.enum_values, None);
  }

  #[test]
  fn test_untagged_options_infer_enum() {
    let mut e = evidence(None, None);
    e.options = OptionList {
      values: vec![Value::Str("a".into()), Value::Str("b".into())],
      labels: vec![None, None],
      default: None,
    };
    let state = infer(&e);
    assert_eq!(state.type_tag, Some(TypeTag::Enum));
    assert_eq!(state.enum_values.map(|v| v.len()), Some(2));
  }

  #[test]
  fn test_structured_without_default_is_attrs() {
    let state = infer(&evidence(Some(SettingCategory::Component), None));
    assert_eq!(state.type_tag, Some(TypeTag::Attrs));
  }

  #[test]
  fn test_structured_string_literal_wins() {
    let mut e = evidence(Some(SettingCategory::Custom), Some(Value::Str("x".into())));
    e.shape.syntax = DefaultSyntax::StringLiteral;
    assert_eq!(infer(&e).type_tag, Some(TypeTag::Str));
  }

  #[test]
  fn test_structured_getter_is_nullable_string() {
    let mut e = SettingEvidence::new(Some(SettingCategory::Component), Extracted::Absent);
    e.shape.syntax = DefaultSyntax::Getter;
    let state = infer(&e);
    assert_eq!(state.type_tag, Some(TypeTag::NullOrStr));
    assert_eq!(state.default, Some(Value::Null));
  }

  #[test]
  fn test_structured_string_array_needs_refinement_after_coercion() {
    // Coercion alone leaves a structured string array as attrs; the list
    // type only appears once refinement runs after it.
    let mut e = evidence(Some(SettingCategory::Custom), Some(Value::empty_list()));
    e.shape = DefaultShape {
      syntax: DefaultSyntax::Array,
      array: Some(ArrayShape::Strings),
      ..DefaultShape::default()
    };
    let coerced = run(&e, &STAGES[..2]);
    assert_eq!(coerced.type_tag, Some(TypeTag::Attrs));
    assert_eq!(infer(&e).type_tag, Some(TypeTag::ListOfStr));
  }

  #[test]
  fn test_identifier_object_array_overrides_string() {
    let mut e = evidence(Some(SettingCategory::String), Some(Value::empty_list()));
    e.shape = DefaultShape {
      syntax: DefaultSyntax::Identifier,
      array: Some(ArrayShape::Objects),
      via_identifier: true,
      resolved: true,
      typed_array: false,
    };
    let after_initial = run(&e, &STAGES[..1]);
    assert_eq!(after_initial.type_tag, Some(TypeTag::Str));
    let after_coercion = run(&e, &STAGES[..2]);
    assert_eq!(after_coercion.type_tag, Some(TypeTag::Attrs));
    assert_eq!(infer(&e).type_tag, Some(TypeTag::ListOfAttrs));
  }

  #[test]
  fn test_typed_empty_array_on_custom_is_list_of_attrs() {
    let mut e = evidence(Some(SettingCategory::Custom), Some(Value::empty_list()));
    e.shape = DefaultShape {
      syntax: DefaultSyntax::Array,
      array: Some(ArrayShape::Empty),
      typed_array: true,
      ..DefaultShape::default()
    };
    assert_eq!(infer(&e).type_tag, Some(TypeTag::ListOfAttrs));

    e.category = Some(SettingCategory::Component);
    assert_eq!(infer(&e).type_tag, Some(TypeTag::Attrs));
  }

  #[test]
  fn test_unresolved_identifier_on_custom_falls_back_to_attrs() {
    let mut e = SettingEvidence::new(Some(SettingCategory::Custom), Extracted::Absent);
    e.shape.syntax = DefaultSyntax::Identifier;
    e.shape.resolved = false;
    let refined = run(&e, &STAGES[..3]);
    assert_eq!(refined.type_tag, Some(TypeTag::Attrs));
    assert_eq!(infer(&e).type_tag, Some(TypeTag::Attrs));

    // A string-typed custom setting pointing at something opaque is still
    // pulled to attrs by the last stage.
    let mut e = SettingEvidence::new(Some(SettingCategory::Custom), Extracted::Absent);
    e.shape.syntax = DefaultSyntax::Identifier;
    let state = final_fallback(&e, InferenceState {
      type_tag: Some(TypeTag::Str),
      ..InferenceState::default()
    });
    assert_eq!(state.type_tag, Some(TypeTag::Attrs));
  }

  #[test]
  fn test_stage_order_is_fixed() {
    let names: Vec<_> = STAGES.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, [
      "initial",
      "structured coercion",
      "array refinement",
      "final fallback"
    ]);
  }
}
