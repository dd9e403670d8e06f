//! Static evaluation of a setting's `default` property.
use indexmap::IndexMap;
use oxc_ast::ast::{CallExpression, Expression, ObjectExpression};
use oxc_span::GetSpan;

use crate::{
  error::{ErrorKind, Extracted, ExtractionError},
  navigator::{EntryKind, find_property, first_argument, properties, unwrap_expression},
  resolver::{MAX_RESOLUTION_DEPTH, Resolver},
  value::Value,
};

/// Evaluate the `default` entry of a setting descriptor.
///
/// A missing entry is [`Extracted::Absent`]; a getter or anything that needs
/// runtime data is [`Extracted::Failed`] with [`ErrorKind::CannotEvaluate`].
#[must_use]
pub fn extract_default<'a>(
  resolver: &Resolver<'_, 'a>,
  object: &'a ObjectExpression<'a>,
) -> Extracted<Value> {
  let Some(entry) = find_property(object, "default") else {
    return Extracted::Absent;
  };

  match entry.kind {
    EntryKind::Value => evaluate(resolver, entry.value),
    EntryKind::Getter => {
      Extracted::Failed(ExtractionError::new(
        ErrorKind::CannotEvaluate,
        "default is a getter",
        entry.property.span,
      ))
    },
    EntryKind::Setter | EntryKind::Method => {
      Extracted::Failed(ExtractionError::new(
        ErrorKind::CannotEvaluate,
        "default is a method",
        entry.property.span,
      ))
    },
  }
}

/// Evaluate a default expression by its syntactic shape.
#[must_use]
pub fn evaluate<'a>(resolver: &Resolver<'_, 'a>, expr: &'a Expression<'a>) -> Extracted<Value> {
  evaluate_at_depth(resolver, expr, 0)
}

fn evaluate_at_depth<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
  depth: usize,
) -> Extracted<Value> {
  if depth > MAX_RESOLUTION_DEPTH {
    return Extracted::Failed(ExtractionError::new(
      ErrorKind::UnresolvableSymbol,
      "resolution depth exceeded",
      expr.span(),
    ));
  }

  match unwrap_expression(expr) {
    Expression::ArrayExpression(_) => Extracted::Value(Value::empty_list()),
    Expression::ObjectExpression(_) => Extracted::Value(Value::empty_object()),
    Expression::Identifier(id) if id.name.as_str() != "undefined" => {
      let name = id.name.as_str();
      match resolver.resolve_identifier(name) {
        Some(located) => {
          evaluate_at_depth(&resolver.at(located.file), located.expr, depth + 1)
        },
        None => {
          let message = if resolver.project().symbols().is_external_import(resolver.file(), name)
          {
            format!("`{name}` is imported from a module outside the plugin")
          } else {
            format!("no declaration found for `{name}`")
          };
          Extracted::Failed(ExtractionError::new(
            ErrorKind::UnresolvableSymbol,
            message,
            id.span,
          ))
        },
      }
    },
    Expression::CallExpression(call) => evaluate_call(resolver, call, depth),
    Expression::StaticMemberExpression(member) => resolver.resolve_member(member),
    other => resolver.literal(other),
  }
}

fn evaluate_call<'a>(
  resolver: &Resolver<'_, 'a>,
  call: &'a CallExpression<'a>,
  depth: usize,
) -> Extracted<Value> {
  if let Some(argument) = first_argument(call)
    && let Expression::ObjectExpression(object) = unwrap_expression(argument)
  {
    return Extracted::Value(shallow_copy(resolver, object));
  }

  let Some((scoped, function)) = resolver.resolve_function(&call.callee) else {
    return Extracted::Failed(ExtractionError::new(
      ErrorKind::CannotEvaluate,
      format!("cannot evaluate call `{}`", resolver.text(call.span)),
      call.span,
    ));
  };

  let Some(returned) = function.returned_expression() else {
    return Extracted::Failed(ExtractionError::new(
      ErrorKind::CannotEvaluate,
      "called function has no statically visible return value",
      call.span,
    ));
  };

  // Only the outer shape of what the helper returns is trusted.
  match unwrap_expression(returned) {
    Expression::ArrayExpression(_) => Extracted::Value(Value::empty_list()),
    Expression::ObjectExpression(_) => Extracted::Value(Value::empty_object()),
    Expression::CallExpression(_) => {
      Extracted::Failed(ExtractionError::new(
        ErrorKind::CannotEvaluate,
        "called function returns another call",
        returned.span(),
      ))
    },
    other => evaluate_at_depth(&scoped, other, depth + 1),
  }
}

/// Primitive-valued properties of `object`; nested arrays and objects become
/// empty placeholders and anything else is dropped.
fn shallow_copy<'a>(resolver: &Resolver<'_, 'a>, object: &'a ObjectExpression<'a>) -> Value {
  let mut out = IndexMap::new();
  for entry in properties(object) {
    if entry.kind != EntryKind::Value {
      continue;
    }
    let value = match unwrap_expression(entry.value) {
      Expression::ArrayExpression(_) => Value::empty_list(),
      Expression::ObjectExpression(_) => Value::empty_object(),
      other => {
        match resolver.literal(other) {
          Extracted::Value(value) if value.is_primitive() => value,
          _ => continue,
        }
      },
    };
    out.insert(entry.name.to_string(), value);
  }
  Value::Object(out)
}
