//! Generation of the module files holding plugin option declarations.
use std::cmp::Ordering;

use log::debug;
use nixplug_extract::{PluginSchema, Setting, SettingGroup, SettingNode, TypeTag, Value};

use crate::{
  escape::multiline_block,
  ident::sanitize_identifier,
  render::{render, render_inline},
  value::NixValue,
};

/// Comment lines opening every generated file.
pub const HEADER: &str = "# This file is generated by nixplug from plugin sources.\n\
                          # Do not edit it by hand; rerun `nixplug generate` instead.\n";

/// Function header and helper bindings preceding the option set.
const PRELUDE: &str = "{ lib, ... }:\n\
                       let\n  inherit (lib) types mkEnableOption mkOption;\n\
                       in\n";

pub const RESTART_SUFFIX: &str = " (restart required)";

/// Which of the output files a module is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCategory {
  /// Plugins present in both variants.
  Shared,
  VariantA,
  VariantB,
}

/// Settings shared by every module of one run.
#[derive(Debug, Clone)]
pub struct ModuleOptions {
  /// Display name of the first variant.
  pub variant_a: String,
  /// Display name of the second variant.
  pub variant_b: String,
  /// Extra comment line placed after [`HEADER`].
  pub header:    Option<String>,
}

impl ModuleOptions {
  #[must_use]
  pub fn new(variant_a: impl Into<String>, variant_b: impl Into<String>) -> Self {
    Self {
      variant_a: variant_a.into(),
      variant_b: variant_b.into(),
      header:    None,
    }
  }

  /// Suffix appended to enable-toggle descriptions in a module for
  /// `category`.
  #[must_use]
  pub fn category_suffix(&self, category: OutputCategory) -> String {
    match category {
      OutputCategory::Shared => {
        format!(" (Shared between {} and {})", self.variant_a, self.variant_b)
      },
      OutputCategory::VariantA => format!(" ({} only)", self.variant_a),
      OutputCategory::VariantB => format!(" ({} only)", self.variant_b),
    }
  }
}

/// Render a complete module file declaring options for `plugins`.
///
/// Each plugin becomes one attribute keyed by its sanitized name. With a
/// `category`, enable toggles carry the matching suffix.
#[must_use]
pub fn generate_module(
  plugins: &[&PluginSchema],
  category: Option<OutputCategory>,
  options: &ModuleOptions,
) -> String {
  let suffix = category
    .map(|category| options.category_suffix(category))
    .unwrap_or_default();

  let mut body = NixValue::attrs();
  for plugin in plugins {
    body.insert(sanitize_identifier(&plugin.name), plugin_options(plugin, &suffix));
  }
  debug!(
    "nixplug-codegen: rendered {} plugins{}",
    plugins.len(),
    suffix
  );

  let mut out = String::from(HEADER);
  if let Some(line) = &options.header {
    for line in line.lines() {
      out.push_str("# ");
      out.push_str(line);
      out.push('\n');
    }
  }
  out.push_str(PRELUDE);
  out.push_str(&render(&body));
  out.push('\n');
  out
}

/// Options of one plugin. A plugin without an explicit `enable` setting gets
/// a synthesized toggle described by the plugin description.
#[must_use]
pub fn plugin_options(plugin: &PluginSchema, suffix: &str) -> NixValue {
  let mut options = group_options(&plugin.settings, suffix);
  if !plugin.settings.children.contains_key("enable") {
    let description = plugin
      .settings
      .description
      .as_deref()
      .unwrap_or(&plugin.name);
    options.insert(
      "enable",
      NixValue::apply("mkEnableOption", NixValue::Str(format!("{description}{suffix}"))),
    );
  }
  options
}

/// `suffix` only applies to the group's own `enable` setting.
fn group_options(group: &SettingGroup, suffix: &str) -> NixValue {
  let mut options = NixValue::attrs();
  for (name, child) in &group.children {
    let value = match child {
      SettingNode::Setting(setting) => setting_option(setting, suffix),
      SettingNode::Group(nested) => group_options(nested, ""),
    };
    options.insert(name.clone(), value);
  }
  options
}

/// Option declaration for one setting: `mkEnableOption` for settings named
/// `enable`, `mkOption { ... }` otherwise.
#[must_use]
pub fn setting_option(setting: &Setting, suffix: &str) -> NixValue {
  if setting.name == "enable" {
    let description = setting.description.as_deref().unwrap_or(&setting.name);
    return NixValue::apply(
      "mkEnableOption",
      NixValue::Str(format!("{description}{suffix}")),
    );
  }

  let mut option = NixValue::attrs();
  option.insert("type", NixValue::raw(type_expression(setting)));
  if let Some(default) = default_value(setting) {
    option.insert("default", default);
  }
  if let Some(text) = description_text(setting) {
    option.insert("description", NixValue::raw(multiline_block(&text)));
  }
  if let Some(example) = &setting.example
    && setting.description.as_ref() != Some(example)
  {
    option.insert("example", NixValue::Str(example.clone()));
  }
  NixValue::apply("mkOption", option)
}

/// The `types.*` expression for a setting. A `null` default on a type that
/// does not admit it wraps the type in `types.nullOr`.
#[must_use]
pub fn type_expression(setting: &Setting) -> String {
  let base = match setting.type_tag {
    TypeTag::Enum => enum_type(setting.enum_values.as_deref().unwrap_or_default()),
    tag => {
      tag
        .as_str()
        .split(' ')
        .map(|part| format!("types.{part}"))
        .collect::<Vec<_>>()
        .join(" ")
    },
  };

  let null_default = setting.default.as_ref().is_some_and(Value::is_null);
  if null_default && !setting.type_tag.is_nullable() {
    if base.contains(' ') {
      format!("types.nullOr ({base})")
    } else {
      format!("types.nullOr {base}")
    }
  } else {
    base
  }
}

#[allow(clippy::cast_precision_loss, reason = "only used for ordering")]
fn numeric(value: &NixValue) -> f64 {
  match value {
    NixValue::Int(n) => *n as f64,
    NixValue::Float(f) => *f,
    _ => 0.0,
  }
}

fn compare_numbers(a: &NixValue, b: &NixValue) -> Ordering {
  match (a, b) {
    (NixValue::Int(a), NixValue::Int(b)) => a.cmp(b),
    _ => numeric(a).total_cmp(&numeric(b)),
  }
}

/// `types.enum [ ... ]` over the distinct values, sorted numerically when
/// every value is a number and by rendered text otherwise.
fn enum_type(values: &[Value]) -> String {
  let mut items: Vec<NixValue> = values.iter().map(NixValue::from).collect();
  if items
    .iter()
    .all(|item| matches!(item, NixValue::Int(_) | NixValue::Float(_)))
  {
    items.sort_by(compare_numbers);
  } else {
    items.sort_by_cached_key(render_inline);
  }
  items.dedup();
  format!("types.enum {}", render_inline(&NixValue::List(items)))
}

fn is_integer_text(text: &str) -> bool {
  let digits = text.strip_prefix('-').unwrap_or(text);
  !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// The default as it must be written for the option's type: integers under
/// a float type get a decimal point, integer text under an integer type is
/// written as a number.
fn default_value(setting: &Setting) -> Option<NixValue> {
  let value = match setting.default.as_ref()? {
    Value::Int(n) if setting.type_tag.is_float() => NixValue::raw(format!("{n}.0")),
    Value::Str(text) if setting.type_tag.is_integer() && is_integer_text(text) => {
      NixValue::raw(text.clone())
    },
    other => NixValue::from(other),
  };
  Some(value)
}

/// Description with the restart note and, for labelled integer
/// enumerations, a value legend.
fn description_text(setting: &Setting) -> Option<String> {
  let mut text = setting.description.clone().unwrap_or_default();
  if setting.restart_needed {
    text.push_str(RESTART_SUFFIX);
  }
  if let Some(labels) = setting.integer_labels() {
    text.push_str("\n\nValues:");
    for (value, label) in labels {
      text.push_str(&format!("\n- {value}: {label}"));
    }
  }
  let text = text.trim();
  (!text.is_empty()).then(|| text.to_string())
}
