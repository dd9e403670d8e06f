//! Plugin-level extraction: metadata from the plugin definition call plus
//! the settings tree.
use std::path::{Path, PathBuf};

use log::debug;
use oxc_ast::ast::{CallExpression, Expression, ObjectExpression};
use oxc_span::Span;
use serde::Serialize;

use crate::{
  error::{ErrorKind, Extracted, ExtractionError},
  navigator::{
    PLUGIN_DEFINITION,
    SETTINGS_DEFINITION,
    as_object,
    callee_name,
    find_calls,
    find_property,
    first_argument,
    unwrap_expression,
  },
  project::Project,
  property::string_property,
  resolver::Resolver,
  settings::{SettingGroup, build_settings},
};

/// Everything extracted from one plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginSchema {
  pub name:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Entry file the schema was extracted from.
  pub source:      PathBuf,
  pub settings:    SettingGroup,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub errors:      Vec<ExtractionError>,
}

/// Extract the schema of the plugin whose entry file is `project`'s entry.
#[must_use]
pub fn extract_plugin(project: &Project<'_>) -> PluginSchema {
  let entry = project.entry();
  let resolver = Resolver::new(project, 0);
  let mut errors = Vec::new();

  let plugin = find_calls(entry.program, PLUGIN_DEFINITION)
    .into_iter()
    .find_map(first_argument)
    .and_then(as_object);

  let fallback_name = fallback_name(&entry.path);
  let (name, description) = match plugin {
    Some(object) => metadata(&resolver, object, &fallback_name, &mut errors),
    None => {
      errors.push(ExtractionError::new(
        ErrorKind::MissingProperty,
        format!("no `{PLUGIN_DEFINITION}` call found"),
        Span::default(),
      ));
      (fallback_name, None)
    },
  };

  let settings = plugin
    .and_then(|object| settings_from_plugin(&resolver, object))
    .or_else(|| {
      find_calls(entry.program, SETTINGS_DEFINITION)
        .into_iter()
        .find_map(|call| settings_argument(&resolver, call))
    });

  let mut group = match settings {
    Some((scoped, object)) => {
      let (group, setting_errors) = build_settings(&scoped, &name, object);
      errors.extend(setting_errors);
      group
    },
    None => {
      debug!("nixplug-extract: {name}: no settings");
      SettingGroup::new(&name)
    },
  };
  group.description.clone_from(&description);

  for error in &errors {
    match &error.context {
      Some(path) => debug!("nixplug-extract: {name}.{path}: {error}"),
      None => debug!("nixplug-extract: {name}: {error}"),
    }
  }

  PluginSchema {
    name,
    description,
    source: entry.path.clone(),
    settings: group,
    errors,
  }
}

fn metadata<'a>(
  resolver: &Resolver<'_, 'a>,
  object: &'a ObjectExpression<'a>,
  fallback_name: &str,
  errors: &mut Vec<ExtractionError>,
) -> (String, Option<String>) {
  let name = match string_property(resolver, object, "name") {
    Extracted::Value(name) if !name.trim().is_empty() => name,
    Extracted::Failed(e) => {
      errors.push(e.with_context("name"));
      fallback_name.to_string()
    },
    _ => {
      errors.push(ExtractionError::new(
        ErrorKind::MissingProperty,
        "plugin has no name",
        object.span,
      ));
      fallback_name.to_string()
    },
  };

  let description = match string_property(resolver, object, "description") {
    Extracted::Value(text) => Some(text),
    Extracted::Absent => None,
    Extracted::Failed(e) => {
      errors.push(e.with_context("description"));
      None
    },
  };

  (name, description)
}

/// The `settings` entry of the plugin literal, followed to the settings
/// definition call it names.
fn settings_from_plugin<'p, 'a>(
  resolver: &Resolver<'p, 'a>,
  plugin: &'a ObjectExpression<'a>,
) -> Option<(Resolver<'p, 'a>, &'a ObjectExpression<'a>)> {
  let entry = find_property(plugin, "settings")?;
  let (scoped, expr) = match unwrap_expression(entry.value) {
    Expression::Identifier(_) => {
      let located = resolver.resolve_reference(entry.value)?;
      (resolver.at(located.file), located.expr)
    },
    other => (*resolver, other),
  };
  let call = settings_call(expr)?;
  settings_argument(&scoped, call)
}

/// `definePluginSettings({...})`, possibly followed by chained calls such as
/// `.withPrivateSettings<T>()`.
fn settings_call<'a>(expr: &'a Expression<'a>) -> Option<&'a CallExpression<'a>> {
  let Expression::CallExpression(call) = unwrap_expression(expr) else {
    return None;
  };
  match unwrap_expression(&call.callee) {
    Expression::Identifier(_) if callee_name(call) == Some(SETTINGS_DEFINITION) => Some(call),
    Expression::StaticMemberExpression(member) => settings_call(&member.object),
    _ => None,
  }
}

fn settings_argument<'p, 'a>(
  resolver: &Resolver<'p, 'a>,
  call: &'a CallExpression<'a>,
) -> Option<(Resolver<'p, 'a>, &'a ObjectExpression<'a>)> {
  let argument = first_argument(call)?;
  if let Some(object) = as_object(argument) {
    return Some((*resolver, object));
  }
  let located = resolver.resolve_reference(argument)?;
  as_object(located.expr).map(|object| (resolver.at(located.file), object))
}

/// Directory name for `index.*` entries, else the file stem.
fn fallback_name(path: &Path) -> String {
  let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("plugin");
  if stem == "index" {
    path
      .parent()
      .and_then(|dir| dir.file_name())
      .and_then(|s| s.to_str())
      .unwrap_or(stem)
      .to_string()
  } else {
    stem.to_string()
  }
}

#[cfg(test)]
mod tests {
  use oxc_allocator::Allocator;

  use super::*;
  use crate::settings::SettingNode;

  #[test]
  fn test_settings_through_identifier_and_chain() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [(
      "plugins/betterThing/index.ts",
      "const settings = definePluginSettings({ enabled: { type: 3, default: true } })\n\
         .withPrivateSettings<{ cache: string }>();\n\
       export default definePlugin({ name: \"BetterThing\", description: \"Does things\", settings });",
    )])
    .expect("parse");
    let schema = extract_plugin(&project);
    assert_eq!(schema.name, "BetterThing");
    assert_eq!(schema.description.as_deref(), Some("Does things"));
    assert_eq!(schema.settings.description.as_deref(), Some("Does things"));
    assert!(matches!(
      schema.settings.children.get("enabled"),
      Some(SettingNode::Setting(_))
    ));
    assert!(schema.errors.is_empty(), "{:?}", schema.errors);
  }

  #[test]
  fn test_missing_name_falls_back_to_directory() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [(
      "plugins/quiet/index.ts",
      "export default definePlugin({ description: \"x\" });",
    )])
    .expect("parse");
    let schema = extract_plugin(&project);
    assert_eq!(schema.name, "quiet");
    assert_eq!(
      schema.errors.first().map(|e| e.kind),
      Some(ErrorKind::MissingProperty)
    );
    assert!(schema.settings.is_empty());
  }

  #[test]
  fn test_settings_imported_from_sibling_module() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [
      (
        "plugins/split/index.ts",
        "import { settings } from \"./settings\";\nexport default definePlugin({ name: \"Split\", settings });",
      ),
      (
        "plugins/split/settings.ts",
        "export const settings = definePluginSettings({ volume: { type: 5, default: 0.5 } });",
      ),
    ])
    .expect("parse");
    let schema = extract_plugin(&project);
    assert_eq!(schema.settings.setting_count(), 1);
  }

  #[test]
  fn test_bare_settings_call_without_plugin_property() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [(
      "plugins/loose.ts",
      "const settings = definePluginSettings({ a: { type: 0 } });\nexport default definePlugin({ name: \"Loose\" });",
    )])
    .expect("parse");
    let schema = extract_plugin(&project);
    assert_eq!(schema.settings.setting_count(), 1);
  }
}
