#![allow(clippy::expect_used, reason = "Fine in tests")]

use nixplug_codegen::{
  ModuleOptions,
  OutputCategory,
  generate_module,
  module_options,
  validate_nix,
};
use nixplug_extract::{PluginSchema, Project, extract_plugin};
use oxc_allocator::Allocator;

fn schema(path: &str, source: &str) -> PluginSchema {
  let allocator = Allocator::default();
  let project = Project::from_sources(&allocator, [(path, source)]).expect("parse");
  extract_plugin(&project)
}

fn foo_plugin() -> PluginSchema {
  schema(
    "plugins/foo/index.ts",
    r#"
const settings = definePluginSettings({
  flag: { type: OptionType.BOOLEAN, default: true },
  prefix: { type: OptionType.STRING },
  mode: { type: OptionType.SELECT, options: [{ value: "a" }, { value: "b" }] },
  picker: { type: OptionType.COMPONENT, component: Picker },
  greeting: { type: OptionType.STRING, description: "Uses ${name} and ''quotes''", default: "$HOME" },
});
export default definePlugin({ name: "Foo", description: "Foo", settings });
"#,
  )
}

#[test]
fn test_shared_module_declares_plugin_options() {
  let plugin = foo_plugin();
  let text = generate_module(
    &[&plugin],
    Some(OutputCategory::Shared),
    &ModuleOptions::new("A", "B"),
  );

  validate_nix(&text).expect("generated module parses");
  assert_eq!(module_options(&text).expect("module shape"), ["foo"]);

  assert!(text.contains("enable = mkEnableOption \"Foo (Shared between A and B)\";"));
  assert!(text.contains("flag = mkOption {\n      default = true;\n      type = types.bool;\n    };"));
  assert!(text.contains("prefix = mkOption {\n      default = null;\n      type = types.nullOr types.str;\n    };"));
  assert!(text.contains("default = \"a\";"));
  assert!(text.contains("type = types.enum [ \"a\" \"b\" ];"));
  assert!(text.contains("picker = mkOption {\n      default = { };\n      type = types.attrs;\n    };"));
  assert!(text.contains("default = \"$HOME\";"));
  assert!(text.contains("Uses ''${name} and '''quotes'''"));
}

#[test]
fn test_variant_modules_carry_their_suffix() {
  let plugin = foo_plugin();
  let options = ModuleOptions::new("Vencord", "Equicord");
  let a = generate_module(&[&plugin], Some(OutputCategory::VariantA), &options);
  let b = generate_module(&[&plugin], Some(OutputCategory::VariantB), &options);
  assert!(a.contains("\"Foo (Vencord only)\""));
  assert!(b.contains("\"Foo (Equicord only)\""));
}

#[test]
fn test_explicit_enable_is_not_synthesized() {
  let plugin = schema(
    "plugins/toggle.ts",
    r#"
const settings = definePluginSettings({
  enable: { type: OptionType.BOOLEAN, description: "Turn it on" },
});
export default definePlugin({ name: "Toggle", description: "Unused", settings });
"#,
  );
  let text = generate_module(
    &[&plugin],
    Some(OutputCategory::VariantB),
    &ModuleOptions::new("A", "B"),
  );
  validate_nix(&text).expect("generated module parses");
  assert!(text.contains("enable = mkEnableOption \"Turn it on (B only)\";"));
  assert!(!text.contains("Unused"));
}

#[test]
fn test_header_and_empty_module() {
  let mut options = ModuleOptions::new("A", "B");
  options.header = Some("Source revision: abc123".to_string());
  let text = generate_module(&[], None, &options);
  validate_nix(&text).expect("generated module parses");
  assert!(text.starts_with("# This file is generated by nixplug"));
  assert!(text.contains("# Source revision: abc123\n{ lib, ... }:\n"));
  assert!(text.ends_with("in\n{ }\n"));
  assert!(module_options(&text).expect("module shape").is_empty());
}

#[test]
fn test_generation_is_byte_stable() {
  let options = ModuleOptions::new("A", "B");
  let first = generate_module(&[&foo_plugin()], Some(OutputCategory::Shared), &options);
  let second = generate_module(&[&foo_plugin()], Some(OutputCategory::Shared), &options);
  assert_eq!(first, second);
}
