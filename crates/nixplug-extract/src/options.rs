//! Option lists for enumerated settings.
//!
//! Recognized shapes, tried in order, first match wins:
//!
//! 1. an array literal of `{ value, label?, default? }` entries or bare
//!    literals;
//! 2. a copy-construction call over an array (`Array.from([...])`,
//!    `new Set(LIST)`);
//! 3. `keys(...)`/`values(...)` listings of an object literal or enum,
//!    optionally passed through `.map(...)`, and mapped array literals.
use oxc_ast::ast::{ArrayExpression, CallExpression, Expression, ObjectExpression};
use oxc_span::GetSpan;
use serde::Serialize;

use crate::{
  error::{ErrorKind, Extracted, ExtractionError},
  navigator::{EntryKind, find_property, first_argument, properties, unwrap_expression},
  project::FileId,
  property::{bool_property, string_property},
  resolver::{FunctionLike, MAX_RESOLUTION_DEPTH, Resolver},
  value::Value,
};

/// Literal option values with their labels, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionList {
  pub values:  Vec<Value>,
  /// One entry per value.
  pub labels:  Vec<Option<String>>,
  /// Value of the option flagged `default: true`, if any.
  pub default: Option<Value>,
}

impl OptionList {
  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Exactly the two values `true` and `false`.
  #[must_use]
  pub fn is_boolean_pair(&self) -> bool {
    self.values.len() == 2
      && self.values.contains(&Value::Bool(true))
      && self.values.contains(&Value::Bool(false))
  }

  #[must_use]
  pub fn has_labels(&self) -> bool {
    self.labels.iter().any(Option::is_some)
  }

  /// The flagged default option, else the first one.
  #[must_use]
  pub fn preferred_default(&self) -> Option<&Value> {
    self.default.as_ref().or_else(|| self.values.first())
  }

  fn push(&mut self, value: Value, label: Option<String>) {
    self.values.push(value);
    self.labels.push(label);
  }
}

type Strategy = for<'p, 'a> fn(
  &Resolver<'p, 'a>,
  &'a Expression<'a>,
) -> Option<Extracted<OptionList>>;

const STRATEGIES: [(&str, Strategy); 3] = [
  ("array literal", array_literal),
  ("copy construction", copy_construction),
  ("key/value listing", key_value_listing),
];

/// Extract the `options` of a setting descriptor.
///
/// A missing `options` property is [`Extracted::Absent`]. A present one
/// whose shape is not recognized fails with [`ErrorKind::UnsupportedPattern`].
#[must_use]
pub fn extract_options<'a>(
  resolver: &Resolver<'_, 'a>,
  object: &'a ObjectExpression<'a>,
) -> Extracted<OptionList> {
  let Some(entry) = find_property(object, "options") else {
    return Extracted::Absent;
  };
  if entry.kind != EntryKind::Value {
    return Extracted::Failed(ExtractionError::new(
      ErrorKind::CannotEvaluate,
      "options are computed at runtime",
      entry.property.span,
    ));
  }
  options_from(resolver, entry.value, 0)
}

fn options_from<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
  depth: usize,
) -> Extracted<OptionList> {
  let expr = unwrap_expression(expr);

  if depth < MAX_RESOLUTION_DEPTH
    && matches!(
      expr,
      Expression::Identifier(_) | Expression::StaticMemberExpression(_)
    )
    && let Some(located) = resolver.resolve_reference(expr)
    && !std::ptr::eq(located.expr, expr)
  {
    return options_from(&resolver.at(located.file), located.expr, depth + 1);
  }

  for (name, strategy) in STRATEGIES {
    if let Some(found) = strategy(resolver, expr) {
      log::trace!("nixplug-extract: options matched as {name}");
      return found;
    }
  }

  Extracted::Failed(ExtractionError::new(
    ErrorKind::UnsupportedPattern,
    format!("unrecognized option list `{}`", resolver.text(expr.span())),
    expr.span(),
  ))
}

fn array_literal<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
) -> Option<Extracted<OptionList>> {
  match unwrap_expression(expr) {
    Expression::ArrayExpression(array) => Some(from_array(resolver, array)),
    _ => None,
  }
}

/// Partial success is fine: options that fail to evaluate are dropped,
/// unless none evaluate at all.
fn from_array<'a>(
  resolver: &Resolver<'_, 'a>,
  array: &'a ArrayExpression<'a>,
) -> Extracted<OptionList> {
  let mut list = OptionList::default();
  let mut first_error = None;

  for element in &array.elements {
    let Some(element) = element.as_expression() else {
      continue;
    };
    match option_entry(resolver, element) {
      Ok((value, label, is_default)) => {
        if is_default && list.default.is_none() {
          list.default = Some(value.clone());
        }
        list.push(value, label);
      },
      Err(e) => {
        log::debug!("nixplug-extract: dropping option: {e}");
        first_error.get_or_insert(e);
      },
    }
  }

  if list.is_empty()
    && let Some(error) = first_error
  {
    return Extracted::Failed(error);
  }
  Extracted::Value(list)
}

fn option_entry<'a>(
  resolver: &Resolver<'_, 'a>,
  element: &'a Expression<'a>,
) -> Result<(Value, Option<String>, bool), ExtractionError> {
  let Expression::ObjectExpression(object) = unwrap_expression(element) else {
    return primitive(resolver, element).map(|value| (value, None, false));
  };

  let value = find_property(object, "value").ok_or_else(|| {
    ExtractionError::new(
      ErrorKind::MissingProperty,
      "option has no `value`",
      object.span,
    )
  })?;
  let value = primitive(resolver, value.value)?;
  let label = string_property(resolver, object, "label").value();
  let is_default = bool_property(resolver, object, "default").value() == Some(true);
  Ok((value, label, is_default))
}

fn primitive<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
) -> Result<Value, ExtractionError> {
  match resolver.literal(expr) {
    Extracted::Value(value) if value.is_primitive() => Ok(value),
    Extracted::Failed(e) => Err(e),
    _ => {
      Err(ExtractionError::new(
        ErrorKind::CannotEvaluate,
        format!("option value `{}` is not a literal", resolver.text(expr.span())),
        expr.span(),
      ))
    },
  }
}

fn copy_construction<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
) -> Option<Extracted<OptionList>> {
  let argument = match unwrap_expression(expr) {
    Expression::CallExpression(call) => first_argument(call)?,
    Expression::NewExpression(new) => new.arguments.first()?.as_expression()?,
    _ => return None,
  };
  let array = array_argument(resolver, argument)?;
  Some(from_array(&resolver.at(array.0), array.1))
}

fn array_argument<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
) -> Option<(FileId, &'a ArrayExpression<'a>)> {
  match unwrap_expression(expr) {
    Expression::ArrayExpression(array) => Some((resolver.file(), array)),
    Expression::Identifier(id) => {
      let located = resolver.resolve_identifier(id.name.as_str())?;
      match unwrap_expression(located.expr) {
        Expression::ArrayExpression(array) => Some((located.file, array)),
        _ => None,
      }
    },
    _ => None,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
  Keys,
  Values,
}

fn key_value_listing<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
) -> Option<Extracted<OptionList>> {
  let Expression::CallExpression(call) = unwrap_expression(expr) else {
    return None;
  };
  let Expression::StaticMemberExpression(callee) = unwrap_expression(&call.callee) else {
    return None;
  };

  match callee.property.name.as_str() {
    "keys" => Some(Extracted::Value(listing(resolver, call, Listing::Keys)?)),
    "values" => Some(Extracted::Value(listing(resolver, call, Listing::Values)?)),
    "map" => {
      let mapper = first_argument(call);
      if let Expression::CallExpression(inner) = unwrap_expression(&callee.object)
        && let Expression::StaticMemberExpression(inner_callee) =
          unwrap_expression(&inner.callee)
      {
        let kind = match inner_callee.property.name.as_str() {
          // `keys(E).map(k => ({ value: E[k] }))` lists the values.
          "keys" if mapper.is_some_and(looks_up_element) => Listing::Values,
          "keys" => Listing::Keys,
          "values" => Listing::Values,
          _ => return None,
        };
        return Some(Extracted::Value(listing(resolver, inner, kind)?));
      }
      let (file, array) = array_argument(resolver, &callee.object)?;
      Some(from_array(&resolver.at(file), array))
    },
    _ => None,
  }
}

fn listing<'a>(
  resolver: &Resolver<'_, 'a>,
  call: &'a CallExpression<'a>,
  kind: Listing,
) -> Option<OptionList> {
  let entries = named_entries(resolver, first_argument(call)?)?;
  let mut list = OptionList::default();
  for (name, value) in entries {
    match kind {
      Listing::Keys => list.push(Value::Str(name), None),
      Listing::Values => list.push(value, Some(name)),
    }
  }
  Some(list)
}

/// `(name, value)` pairs of an enum or object literal.
fn named_entries<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
) -> Option<Vec<(String, Value)>> {
  let expr = unwrap_expression(expr);
  if let Expression::Identifier(id) = expr
    && let Some(members) = resolver.enum_members(id.name.as_str())
  {
    return Some(
      members
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect(),
    );
  }

  let (scoped, object) = match expr {
    Expression::ObjectExpression(object) => (*resolver, &**object),
    _ => {
      let located = resolver.resolve_reference(expr)?;
      match unwrap_expression(located.expr) {
        Expression::ObjectExpression(object) => (resolver.at(located.file), &**object),
        _ => return None,
      }
    },
  };

  Some(
    properties(object)
      .filter(|entry| entry.kind == EntryKind::Value)
      .filter_map(|entry| {
        let value = scoped.literal(entry.value).value()?;
        Some((entry.name.to_string(), value))
      })
      .collect(),
  )
}

/// Does a `.map` callback index back into the listed object (`E[k]`)?
fn looks_up_element(mapper: &Expression<'_>) -> bool {
  let returned = match unwrap_expression(mapper) {
    Expression::ArrowFunctionExpression(arrow) => FunctionLike::Arrow(arrow).returned_expression(),
    Expression::FunctionExpression(func) => FunctionLike::Function(func).returned_expression(),
    _ => None,
  };
  let Some(returned) = returned else {
    return false;
  };

  match unwrap_expression(returned) {
    Expression::ComputedMemberExpression(_) => true,
    Expression::ObjectExpression(object) => {
      find_property(object, "value").is_some_and(|entry| {
        matches!(
          unwrap_expression(entry.value),
          Expression::ComputedMemberExpression(_)
        )
      })
    },
    _ => false,
  }
}
