//! Settings tree construction.
use indexmap::IndexMap;
use log::debug;
use oxc_ast::ast::{Expression, ObjectExpression};
use oxc_span::GetSpan;
use serde::Serialize;

use crate::{
  error::{ErrorKind, Extracted, ExtractionError},
  evidence,
  inference::infer,
  navigator::{EntryKind, as_object, has_property, properties, unwrap_expression},
  property::{bool_property, string_property},
  resolution::resolve,
  resolver::{MAX_RESOLUTION_DEPTH, Resolver},
  types::TypeTag,
  value::Value,
};

/// One leaf setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Setting {
  pub name:           String,
  #[serde(rename = "type")]
  pub type_tag:       TypeTag,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description:    Option<String>,
  /// `None` when no default could be settled; the option is then rendered
  /// without one.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default:        Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub enum_values:    Option<Vec<Value>>,
  /// Aligned with `enum_values`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub enum_labels:    Option<Vec<Option<String>>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub example:        Option<String>,
  pub hidden:         bool,
  pub restart_needed: bool,
}

impl Setting {
  /// Enum values paired with their labels, for integer enumerations where at
  /// least one label is known.
  #[must_use]
  pub fn integer_labels(&self) -> Option<Vec<(i64, &str)>> {
    let values = self.enum_values.as_ref()?;
    let labels = self.enum_labels.as_ref()?;
    let pairs: Vec<_> = values
      .iter()
      .zip(labels)
      .filter_map(|(value, label)| Some((value.as_int()?, label.as_deref()?)))
      .collect();
    let all_integers = values.iter().all(|v| v.as_int().is_some());
    (all_integers && !pairs.is_empty()).then_some(pairs)
  }
}

/// A named collection of settings and nested groups, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingGroup {
  pub name:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub children:    IndexMap<String, SettingNode>,
}

impl SettingGroup {
  #[must_use]
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.children.is_empty()
  }

  /// Number of leaf settings, recursively.
  #[must_use]
  pub fn setting_count(&self) -> usize {
    self
      .children
      .values()
      .map(|child| {
        match child {
          SettingNode::Setting(_) => 1,
          SettingNode::Group(group) => group.setting_count(),
        }
      })
      .sum()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettingNode {
  Setting(Setting),
  Group(SettingGroup),
}

/// Builds a [`SettingGroup`] from the object literal passed to the settings
/// definition call. Failures are collected per setting, tagged with the
/// dotted path of the setting they belong to.
pub struct TreeBuilder<'r, 'p, 'a> {
  resolver: &'r Resolver<'p, 'a>,
  errors:   Vec<ExtractionError>,
}

impl<'r, 'p, 'a> TreeBuilder<'r, 'p, 'a> {
  #[must_use]
  pub const fn new(resolver: &'r Resolver<'p, 'a>) -> Self {
    Self {
      resolver,
      errors: Vec::new(),
    }
  }

  /// Build the group for `object` and return it with every error collected
  /// on the way.
  #[must_use]
  pub fn build(
    mut self,
    name: &str,
    object: &'a ObjectExpression<'a>,
  ) -> (SettingGroup, Vec<ExtractionError>) {
    let mut group = SettingGroup::new(name);
    let resolver = *self.resolver;
    self.fill(resolver, &mut group, object, "", 0);
    (group, self.errors)
  }

  fn record(&mut self, error: ExtractionError, path: &str) {
    debug!("nixplug-extract: {path}: {error}");
    self.errors.push(error.with_context(path));
  }

  fn fill(
    &mut self,
    resolver: Resolver<'p, 'a>,
    group: &mut SettingGroup,
    object: &'a ObjectExpression<'a>,
    prefix: &str,
    depth: usize,
  ) {
    for entry in properties(object) {
      let path = if prefix.is_empty() {
        entry.name.to_string()
      } else {
        format!("{prefix}.{}", entry.name)
      };

      if entry.kind != EntryKind::Value {
        self.record(
          ExtractionError::new(
            ErrorKind::InvalidNodeType,
            "setting is not a plain property",
            entry.property.span,
          ),
          &path,
        );
        continue;
      }

      let Some((scoped, descriptor)) = resolve_descriptor(resolver, entry.value) else {
        self.record(
          ExtractionError::new(
            ErrorKind::InvalidNodeType,
            "setting is not an object literal",
            entry.value.span(),
          ),
          &path,
        );
        continue;
      };

      match bool_property(&scoped, descriptor, "hidden") {
        Extracted::Value(true) => {
          debug!("nixplug-extract: {path}: hidden, skipped");
          continue;
        },
        Extracted::Failed(e) => self.record(e, &path),
        Extracted::Value(false) | Extracted::Absent => {},
      }

      let node = if is_group(descriptor) {
        if depth >= MAX_RESOLUTION_DEPTH {
          self.record(
            ExtractionError::new(
              ErrorKind::UnsupportedPattern,
              "settings nested too deeply",
              descriptor.span,
            ),
            &path,
          );
          continue;
        }
        let mut child = SettingGroup::new(entry.name);
        self.fill(scoped, &mut child, descriptor, &path, depth + 1);
        SettingNode::Group(child)
      } else {
        SettingNode::Setting(self.leaf(&scoped, entry.name, descriptor, &path))
      };

      group.children.insert(entry.name.to_string(), node);
    }
  }

  fn leaf(
    &mut self,
    resolver: &Resolver<'p, 'a>,
    name: &str,
    object: &'a ObjectExpression<'a>,
    path: &str,
  ) -> Setting {
    let (evidence, errors) = evidence::collect(resolver, object);
    for error in errors {
      self.record(error, path);
    }

    let state = infer(&evidence);
    let resolved = resolve(&evidence, state);

    let description = match string_property(resolver, object, "description") {
      Extracted::Value(text) => Some(text),
      Extracted::Absent => string_property(resolver, object, "name").value(),
      Extracted::Failed(e) => {
        self.record(e, path);
        None
      },
    };
    let example = match string_property(resolver, object, "placeholder") {
      Extracted::Value(text) => Some(text),
      Extracted::Absent => None,
      Extracted::Failed(e) => {
        self.record(e, path);
        None
      },
    };
    let restart_needed = match bool_property(resolver, object, "restartNeeded") {
      Extracted::Value(flag) => flag,
      Extracted::Absent => false,
      Extracted::Failed(e) => {
        self.record(e, path);
        false
      },
    };

    let enum_labels = resolved
      .enum_values
      .as_ref()
      .filter(|_| evidence.options.has_labels())
      .map(|_| evidence.options.labels.clone());

    Setting {
      name: name.to_string(),
      type_tag: resolved.type_tag,
      description,
      default: resolved.default,
      enum_values: resolved.enum_values,
      enum_labels,
      example,
      hidden: false,
      restart_needed,
    }
  }
}

/// The descriptor literal of an entry: written in place, or a constant
/// defined elsewhere.
fn resolve_descriptor<'p, 'a>(
  resolver: Resolver<'p, 'a>,
  value: &'a Expression<'a>,
) -> Option<(Resolver<'p, 'a>, &'a ObjectExpression<'a>)> {
  if let Some(object) = as_object(value) {
    return Some((resolver, object));
  }
  if let Expression::Identifier(_) = unwrap_expression(value) {
    let located = resolver.resolve_reference(value)?;
    return as_object(located.expr).map(|object| (resolver.at(located.file), object));
  }
  None
}

/// A descriptor is a leaf if it declares a `type` or `description`; else it
/// is a group when any of its properties holds an object literal.
fn is_group(object: &ObjectExpression<'_>) -> bool {
  if has_property(object, "type") || has_property(object, "description") {
    return false;
  }
  properties(object).any(|entry| {
    entry.kind == EntryKind::Value
      && matches!(unwrap_expression(entry.value), Expression::ObjectExpression(_))
  })
}

/// Convenience wrapper around [`TreeBuilder`].
#[must_use]
pub fn build_settings<'a>(
  resolver: &Resolver<'_, 'a>,
  name: &str,
  object: &'a ObjectExpression<'a>,
) -> (SettingGroup, Vec<ExtractionError>) {
  TreeBuilder::new(resolver).build(name, object)
}

#[cfg(test)]
mod tests {
  use oxc_allocator::Allocator;

  use super::*;
  use crate::{Project, test_support::first_init};

  fn build(source: &str) -> (SettingGroup, Vec<ExtractionError>) {
    let allocator = Allocator::default();
    let project =
      Project::from_sources(&allocator, [("index.ts", source)]).expect("parse");
    let resolver = Resolver::new(&project, 0);
    let object = first_init(project.entry().program)
      .and_then(as_object)
      .expect("settings literal");
    build_settings(&resolver, "Test", object)
  }

  fn leaf<'g>(group: &'g SettingGroup, name: &str) -> &'g Setting {
    match group.children.get(name) {
      Some(SettingNode::Setting(setting)) => setting,
      other => unreachable!("expected setting `{name}`, got {other:?}"),
    }
  }

  #[test]
  fn test_hidden_settings_are_dropped() {
    let (group, errors) = build(
      "const s = { shown: { type: 3, description: \"a\" }, secret: { type: 0, hidden: true } };",
    );
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(group.children.keys().collect::<Vec<_>>(), ["shown"]);
  }

  #[test]
  fn test_nested_groups_and_descriptor_constants() {
    let (group, _) = build(
      "const s = { appearance: { colors: { type: 0, default: \"red\" }, size: SIZE } };\n\
       const SIZE = { type: 1, default: 12 };",
    );
    let Some(SettingNode::Group(appearance)) = group.children.get("appearance") else {
      unreachable!("appearance should be a group");
    };
    assert_eq!(leaf(appearance, "colors").type_tag, TypeTag::Str);
    assert_eq!(leaf(appearance, "size").default, Some(Value::Int(12)));
    assert_eq!(group.setting_count(), 2);
  }

  #[test]
  fn test_errors_carry_setting_path_and_do_not_stop_siblings() {
    let (group, errors) = build(
      "const s = { broken: { type: 0, default: `x${y}` }, fine: { type: 3, default: true } };",
    );
    assert_eq!(group.children.len(), 2);
    assert_eq!(leaf(&group, "fine").default, Some(Value::Bool(true)));
    assert_eq!(leaf(&group, "broken").type_tag, TypeTag::NullOrStr);
    let error = errors.first().expect("one error");
    assert_eq!(error.context.as_deref(), Some("broken"));
    assert_eq!(error.kind, ErrorKind::CannotEvaluate);
  }

  #[test]
  fn test_metadata_properties() {
    let (group, _) = build(
      "const s = { mode: { type: 4, description: \"Mode\", placeholder: \"e.g. fast\", restartNeeded: true, \
       options: [{ label: \"Slow\", value: 0 }, { label: \"Fast\", value: 1 }] } };",
    );
    let mode = leaf(&group, "mode");
    assert_eq!(mode.description.as_deref(), Some("Mode"));
    assert_eq!(mode.example.as_deref(), Some("e.g. fast"));
    assert!(mode.restart_needed);
    assert_eq!(mode.type_tag, TypeTag::Enum);
    assert_eq!(mode.default, Some(Value::Int(0)));
    assert_eq!(mode.integer_labels(), Some(vec![(0, "Slow"), (1, "Fast")]));
  }
}
