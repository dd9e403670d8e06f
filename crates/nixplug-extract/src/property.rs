//! Typed reads of named properties on a setting descriptor.
use oxc_ast::ast::{Expression, ObjectExpression};
use oxc_span::GetSpan;

use crate::{
  error::{ErrorKind, Extracted, ExtractionError},
  navigator::{EntryKind, PropertyEntry, find_property, unwrap_expression},
  resolver::Resolver,
  types::SettingCategory,
  value::Value,
};

fn entry_value<'a>(
  object: &'a ObjectExpression<'a>,
  name: &str,
) -> Result<Option<PropertyEntry<'a>>, ExtractionError> {
  let Some(entry) = find_property(object, name) else {
    return Ok(None);
  };
  if entry.kind == EntryKind::Value {
    Ok(Some(entry))
  } else {
    Err(ExtractionError::new(
      ErrorKind::CannotEvaluate,
      format!("`{name}` is computed at runtime"),
      entry.property.span,
    ))
  }
}

/// A string property: string literals, substitution-free templates, or
/// constants resolving to one.
#[must_use]
pub fn string_property<'a>(
  resolver: &Resolver<'_, 'a>,
  object: &'a ObjectExpression<'a>,
  name: &str,
) -> Extracted<String> {
  let entry = match entry_value(object, name) {
    Ok(Some(entry)) => entry,
    Ok(None) => return Extracted::Absent,
    Err(e) => return Extracted::Failed(e),
  };
  resolver.literal(entry.value).and_then(|value| {
    match value {
      Value::Str(text) => Extracted::Value(text),
      other => {
        Extracted::Failed(ExtractionError::new(
          ErrorKind::InvalidNodeType,
          format!("`{name}` is a {}, expected a string", other.kind_name()),
          entry.value.span(),
        ))
      },
    }
  })
}

/// A boolean property. Only the `true`/`false` keywords (or constants
/// holding them) count.
#[must_use]
pub fn bool_property<'a>(
  resolver: &Resolver<'_, 'a>,
  object: &'a ObjectExpression<'a>,
  name: &str,
) -> Extracted<bool> {
  let entry = match entry_value(object, name) {
    Ok(Some(entry)) => entry,
    Ok(None) => return Extracted::Absent,
    Err(e) => return Extracted::Failed(e),
  };
  resolver.literal(entry.value).and_then(|value| {
    match value {
      Value::Bool(b) => Extracted::Value(b),
      other => {
        Extracted::Failed(ExtractionError::new(
          ErrorKind::InvalidNodeType,
          format!("`{name}` is a {}, expected a boolean", other.kind_name()),
          entry.value.span(),
        ))
      },
    }
  })
}

/// The raw expression of the `type` property.
#[must_use]
pub fn type_node<'a>(object: &'a ObjectExpression<'a>) -> Option<&'a Expression<'a>> {
  find_property(object, "type")
    .filter(|entry| entry.kind == EntryKind::Value)
    .map(|entry| entry.value)
}

/// Read the declared category from a `type` expression.
///
/// `OptionType.SELECT` is recognized by member name without resolving the
/// base; anything else must evaluate to a category code or name.
#[must_use]
pub fn category<'a>(
  resolver: &Resolver<'_, 'a>,
  expr: &'a Expression<'a>,
) -> Extracted<SettingCategory> {
  if let Expression::StaticMemberExpression(member) = unwrap_expression(expr)
    && let Some(category) = SettingCategory::from_name(member.property.name.as_str())
  {
    return Extracted::Value(category);
  }

  resolver.literal(expr).and_then(|value| {
    let category = match &value {
      Value::Int(code) => SettingCategory::from_code(*code),
      Value::Str(name) => SettingCategory::from_name(name),
      _ => None,
    };
    category.map_or_else(
      || {
        Extracted::Failed(ExtractionError::new(
          ErrorKind::TypeInferenceFailed,
          format!("`{value}` is not a setting category"),
          expr.span(),
        ))
      },
      Extracted::Value,
    )
  })
}

#[cfg(test)]
mod tests {
  use oxc_allocator::Allocator;

  use super::*;
  use crate::{Project, navigator::as_object, test_support::first_init};

  #[test]
  fn test_reads_typed_properties() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [(
      "index.ts",
      "const s = { description: `Shown ${\"x\"}`, name: \"Name\", hidden: true, \
       restartNeeded: 1, type: OptionType.SLIDER };",
    )])
    .expect("parse");
    let resolver = Resolver::new(&project, 0);
    let object = first_init(project.entry().program)
      .and_then(as_object)
      .expect("object");

    assert!(string_property(&resolver, object, "description").error().is_some());
    assert_eq!(
      string_property(&resolver, object, "name"),
      Extracted::Value("Name".to_string())
    );
    assert_eq!(bool_property(&resolver, object, "hidden"), Extracted::Value(true));
    assert_eq!(
      bool_property(&resolver, object, "restartNeeded")
        .error()
        .map(|e| e.kind),
      Some(ErrorKind::InvalidNodeType)
    );
    assert!(bool_property(&resolver, object, "missing").is_absent());

    let node = type_node(object).expect("type present");
    assert_eq!(
      category(&resolver, node),
      Extracted::Value(SettingCategory::Slider)
    );
  }

  #[test]
  fn test_category_from_numeric_code() {
    let allocator = Allocator::default();
    let project =
      Project::from_sources(&allocator, [("index.ts", "const s = { type: 3 };")])
        .expect("parse");
    let resolver = Resolver::new(&project, 0);
    let object = first_init(project.entry().program)
      .and_then(as_object)
      .expect("object");
    let node = type_node(object).expect("type present");
    assert_eq!(
      category(&resolver, node),
      Extracted::Value(SettingCategory::Boolean)
    );
  }
}
