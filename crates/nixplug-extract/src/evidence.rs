//! Raw per-setting evidence gathered before type inference.
use oxc_ast::ast::{ArrayExpression, ArrayExpressionElement, Expression, ObjectExpression};
use oxc_span::GetSpan;

use crate::{
  default_value::extract_default,
  error::{Extracted, ExtractionError},
  navigator::{EntryKind, find_property, properties, unwrap_expression},
  options::{OptionList, extract_options},
  property::{category, type_node},
  resolver::Resolver,
  symbols::{Declaration, declared_type},
  types::SettingCategory,
  value::Value,
};

/// Properties a structured setting may carry without saying anything about
/// its value.
const STRUCTURAL_PROPERTIES: &[&str] = &[
  "type",
  "component",
  "description",
  "name",
  "restartNeeded",
  "hidden",
  "placeholder",
];

/// Element shape of an array literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayShape {
  Empty,
  Strings,
  Objects,
  Mixed,
}

impl ArrayShape {
  #[must_use]
  pub fn of(array: &ArrayExpression<'_>) -> Self {
    if array.elements.is_empty() {
      return Self::Empty;
    }
    let all = |pred: fn(&Expression<'_>) -> bool| {
      array.elements.iter().all(|element| {
        match element {
          ArrayExpressionElement::SpreadElement(_) | ArrayExpressionElement::Elision(_) => false,
          other => other.as_expression().is_some_and(|e| pred(unwrap_expression(e))),
        }
      })
    };
    if all(|e| {
      matches!(e, Expression::StringLiteral(_))
        || matches!(e, Expression::TemplateLiteral(t) if t.expressions.is_empty())
    }) {
      Self::Strings
    } else if all(|e| matches!(e, Expression::ObjectExpression(_))) {
      Self::Objects
    } else {
      Self::Mixed
    }
  }
}

/// What the `default` property syntactically is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultSyntax {
  #[default]
  Missing,
  /// `get default() { ... }`
  Getter,
  /// A string literal or substitution-free template written in place.
  StringLiteral,
  /// Any other primitive literal.
  Literal,
  Array,
  Object,
  Identifier,
  Call,
  Member,
  Other,
}

/// Structural facts about the `default` property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultShape {
  pub syntax:         DefaultSyntax,
  /// Element shape of the array the default is, resolves to, or is returned
  /// by a zero-argument helper.
  pub array:          Option<ArrayShape>,
  /// The array was reached through an identifier.
  pub via_identifier: bool,
  /// For identifiers: a declaration was found.
  pub resolved:       bool,
  /// The array carries a non-string element type (annotation, cast, or a
  /// helper returning an empty or object-only array).
  pub typed_array:    bool,
}

impl DefaultShape {
  #[must_use]
  pub fn is_string_array(&self) -> bool {
    match self.array {
      Some(ArrayShape::Strings) => true,
      Some(ArrayShape::Empty) => !self.typed_array,
      _ => false,
    }
  }

  #[must_use]
  pub fn is_object_array(&self) -> bool {
    self.array == Some(ArrayShape::Objects)
  }

  #[must_use]
  pub fn is_typed_empty_array(&self) -> bool {
    self.array == Some(ArrayShape::Empty) && self.typed_array
  }

  #[must_use]
  pub fn is_identifier(&self) -> bool {
    self.syntax == DefaultSyntax::Identifier
  }

  #[must_use]
  pub fn is_unresolved_identifier(&self) -> bool {
    self.is_identifier() && !self.resolved
  }
}

/// Everything inference needs to know about one setting descriptor.
#[derive(Debug, Clone)]
pub struct SettingEvidence {
  pub category: Option<SettingCategory>,
  /// TypeScript-level type of the default (a cast, or the declared type of
  /// the constant it names).
  pub ts_type: Option<String>,
  pub options: OptionList,
  pub default: Extracted<Value>,
  pub shape: DefaultShape,
  /// The descriptor has nothing beyond [`STRUCTURAL_PROPERTIES`].
  pub only_structural_properties: bool,
}

impl SettingEvidence {
  /// Evidence with only a category and an evaluated default, the way most
  /// hand-written fixtures look.
  #[must_use]
  pub fn new(category: Option<SettingCategory>, default: Extracted<Value>) -> Self {
    Self {
      category,
      ts_type: None,
      options: OptionList::default(),
      default,
      shape: DefaultShape::default(),
      only_structural_properties: false,
    }
  }

  #[must_use]
  pub fn default_value(&self) -> Option<&Value> {
    self.default.as_value()
  }

  #[must_use]
  pub fn has_string_array(&self) -> bool {
    self.shape.is_string_array() && !self.shape.via_identifier
  }

  #[must_use]
  pub fn has_identifier_string_array(&self) -> bool {
    self.shape.is_string_array() && self.shape.via_identifier
  }

  #[must_use]
  pub fn is_component_or_custom(&self) -> bool {
    self.category.is_some_and(SettingCategory::is_structured)
  }

  #[must_use]
  pub fn is_custom(&self) -> bool {
    self.category == Some(SettingCategory::Custom)
  }

  /// The default names a constant holding object literals, or an opaque
  /// value on a custom setting.
  #[must_use]
  pub fn identifier_is_structured(&self) -> bool {
    self.shape.is_identifier() && (self.shape.is_object_array() || self.is_custom())
  }
}

/// Gather evidence from a setting descriptor. Failures are returned beside
/// the evidence; each one degrades only the part it concerns.
#[must_use]
pub fn collect<'a>(
  resolver: &Resolver<'_, 'a>,
  object: &'a ObjectExpression<'a>,
) -> (SettingEvidence, Vec<ExtractionError>) {
  let mut errors = Vec::new();

  let category = match type_node(object).map(|node| category(resolver, node)) {
    Some(Extracted::Value(category)) => Some(category),
    Some(Extracted::Failed(e)) => {
      errors.push(e);
      None
    },
    Some(Extracted::Absent) | None => None,
  };

  let options = match extract_options(resolver, object) {
    Extracted::Value(options) => options,
    Extracted::Failed(e) => {
      errors.push(e);
      OptionList::default()
    },
    Extracted::Absent => OptionList::default(),
  };

  let default = extract_default(resolver, object);
  if let Some(e) = default.error() {
    errors.push(e.clone());
  }

  let (shape, ts_type) = inspect_default(resolver, object);
  let only_structural_properties =
    properties(object).all(|entry| STRUCTURAL_PROPERTIES.contains(&entry.name));

  let evidence = SettingEvidence {
    category,
    ts_type,
    options,
    default,
    shape,
    only_structural_properties,
  };
  (evidence, errors)
}

/// Classify the `default` property without evaluating it.
fn inspect_default<'a>(
  resolver: &Resolver<'_, 'a>,
  object: &'a ObjectExpression<'a>,
) -> (DefaultShape, Option<String>) {
  let mut shape = DefaultShape::default();
  let Some(entry) = find_property(object, "default") else {
    return (shape, None);
  };
  if entry.kind != EntryKind::Value {
    shape.syntax = DefaultSyntax::Getter;
    return (shape, None);
  }

  let mut ts_type = cast_type(resolver, entry.value);
  match unwrap_expression(entry.value) {
    Expression::StringLiteral(_) => shape.syntax = DefaultSyntax::StringLiteral,
    Expression::TemplateLiteral(template) => {
      shape.syntax = if template.expressions.is_empty() {
        DefaultSyntax::StringLiteral
      } else {
        DefaultSyntax::Other
      };
    },
    Expression::NumericLiteral(_)
    | Expression::BooleanLiteral(_)
    | Expression::NullLiteral(_)
    | Expression::BigIntLiteral(_)
    | Expression::UnaryExpression(_) => shape.syntax = DefaultSyntax::Literal,
    Expression::ArrayExpression(array) => {
      shape.syntax = DefaultSyntax::Array;
      shape.array = Some(ArrayShape::of(array));
      shape.typed_array = ts_type.as_deref().is_some_and(is_non_string_array_type);
    },
    Expression::ObjectExpression(_) => shape.syntax = DefaultSyntax::Object,
    Expression::Identifier(id) if id.name.as_str() == "undefined" => {
      shape.syntax = DefaultSyntax::Literal;
    },
    Expression::Identifier(id) => {
      shape.syntax = DefaultSyntax::Identifier;
      let name = id.name.as_str();
      if let Some(symbol) = resolver.declaration(name) {
        shape.resolved = true;
        let source = resolver.at(symbol.file).source();
        if ts_type.is_none() {
          ts_type = declared_type(source, &symbol.declaration).map(str::to_string);
        }
        if ts_type.is_none()
          && let Declaration::Variable { init: Some(init), .. } = symbol.declaration
        {
          ts_type = cast_type(&resolver.at(symbol.file), init);
        }
      }
      if let Some(located) = resolver.resolve_identifier(name) {
        if let Expression::ArrayExpression(array) = unwrap_expression(located.expr) {
          shape.array = Some(ArrayShape::of(array));
          shape.via_identifier = true;
          shape.typed_array = ts_type.as_deref().is_some_and(is_non_string_array_type);
        }
      }
    },
    Expression::CallExpression(call) => {
      shape.syntax = DefaultSyntax::Call;
      if let Some((scoped, function)) = resolver.resolve_function(&call.callee)
        && function.param_count() == 0
        && let Some(returned) = function.returned_expression()
        && let Expression::ArrayExpression(array) = unwrap_expression(returned)
      {
        let array_shape = ArrayShape::of(array);
        shape.array = Some(array_shape);
        shape.typed_array = matches!(array_shape, ArrayShape::Empty | ArrayShape::Objects)
          || cast_type(&scoped, returned)
            .as_deref()
            .is_some_and(is_non_string_array_type);
      }
    },
    Expression::StaticMemberExpression(_) => shape.syntax = DefaultSyntax::Member,
    _ => shape.syntax = DefaultSyntax::Other,
  }

  (shape, ts_type)
}

/// Type text of an outermost `x as T` / `x satisfies T` cast.
fn cast_type(resolver: &Resolver<'_, '_>, expr: &Expression<'_>) -> Option<String> {
  let span = match expr {
    Expression::TSAsExpression(cast) => cast.type_annotation.span(),
    Expression::TSSatisfiesExpression(cast) => cast.type_annotation.span(),
    Expression::ParenthesizedExpression(inner) => return cast_type(resolver, &inner.expression),
    _ => return None,
  };
  let text = resolver.text(span).trim();
  (!text.is_empty() && text != "const").then(|| text.to_string())
}

/// Element type of `T[]`, `Array<T>` or `ReadonlyArray<T>`.
#[must_use]
pub fn array_element_type(ts_type: &str) -> Option<&str> {
  let ts_type = ts_type.trim();
  if let Some(element) = ts_type.strip_suffix("[]") {
    return Some(element.trim().trim_start_matches('(').trim_end_matches(')'));
  }
  ["Array<", "ReadonlyArray<"]
    .iter()
    .find_map(|prefix| ts_type.strip_prefix(prefix))
    .and_then(|rest| rest.strip_suffix('>'))
    .map(str::trim)
}

fn is_non_string_array_type(ts_type: &str) -> bool {
  array_element_type(ts_type).is_some_and(|element| element != "string")
}
