#![allow(clippy::expect_used, reason = "Fine in tests")]

use std::{fs, path::Path};

use nixplug::{
  config::{Config, Variant},
  error::NixplugError,
  runner,
};
use nixplug_codegen::module_options;
use serde_json::Value;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, text: &str) {
  let path = root.join(relative);
  fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
  fs::write(path, text).expect("write source");
}

fn plugin(name: &str, settings: &str) -> String {
  format!(
    "import {{ definePluginSettings }} from \"@api/Settings\";\n\
     import {{ OptionType }} from \"@utils/types\";\n\
     const settings = definePluginSettings({{ {settings} }});\n\
     export default definePlugin({{ name: \"{name}\", description: \"{name} plugin\", settings }});\n"
  )
}

/// Two source roots: `betterFolders` in both, `onlyA` and `onlyB` in one each.
fn fixture() -> (TempDir, Config) {
  let dir = tempfile::tempdir().expect("tempdir");
  let a = dir.path().join("vencord");
  let b = dir.path().join("equicord");

  write(
    &a,
    "src/plugins/betterFolders/index.tsx",
    &plugin(
      "BetterFolders",
      "sidebar: { type: OptionType.BOOLEAN, default: true }",
    ),
  );
  write(
    &a,
    "src/plugins/onlyA.ts",
    &plugin(
      "OnlyA",
      "prefix: { type: OptionType.STRING, default: \"!\" },\n\
       greeting: { type: OptionType.STRING, default: `hi ${user}` }",
    ),
  );
  // Not UTF-8, so the entry cannot be read.
  let broken = a.join("src/plugins/broken/index.ts");
  fs::create_dir_all(broken.parent().expect("parent")).expect("create dirs");
  fs::write(broken, [0xff, 0xfe, 0x00]).expect("write source");

  write(
    &b,
    "src/plugins/betterFolders/index.tsx",
    &plugin("BetterFolders", "other: { type: OptionType.NUMBER, default: 2 }"),
  );
  write(
    &b,
    "src/equicordplugins/onlyB/index.ts",
    &plugin(
      "OnlyB",
      "mode: { type: OptionType.SELECT, options: [{ value: \"x\", default: true }, { value: \"y\" }] }",
    ),
  );

  let mut config = Config::default();
  config.variant_a.source = Some(a);
  config.variant_b.source = Some(b);
  config.output_dir = dir.path().join("out");
  (dir, config)
}

#[test]
fn test_generate_writes_three_modules() {
  let (dir, config) = fixture();
  let json = dir.path().join("out/schema.json");

  let summary = runner::generate(&config, Some(&json)).expect("generate");
  assert_eq!(summary.shared, 1);
  assert_eq!(summary.variant_a, 1);
  assert_eq!(summary.variant_b, 1);
  assert_eq!(summary.failed, 1);
  assert!(summary.degraded_settings >= 1);

  let shared = fs::read_to_string(config.shared_path()).expect("shared.nix");
  assert_eq!(module_options(&shared).expect("shape"), ["betterFolders"]);
  assert!(shared.contains("(Shared between Vencord and Equicord)"));
  // The first variant's schema wins for shared plugins.
  assert!(shared.contains("sidebar = mkOption"));
  assert!(!shared.contains("other = mkOption"));

  let only_a = fs::read_to_string(config.output_path(Variant::A)).expect("vencord.nix");
  assert_eq!(module_options(&only_a).expect("shape"), ["onlyA"]);
  assert!(only_a.contains("(Vencord only)"));
  assert!(only_a.contains("default = \"!\";"));

  let only_b = fs::read_to_string(config.output_path(Variant::B)).expect("equicord.nix");
  assert_eq!(module_options(&only_b).expect("shape"), ["onlyB"]);
  assert!(only_b.contains("default = \"x\";"));
  assert!(only_b.contains("type = types.enum [ \"x\" \"y\" ];"));

  let dump: Value =
    serde_json::from_str(&fs::read_to_string(json).expect("json")).expect("valid json");
  assert_eq!(dump["variant_a_label"], "Vencord");
  assert_eq!(dump["shared"]["betterFolders"]["name"], "BetterFolders");
  assert!(dump["variant_b"]["onlyB"]["settings"].is_object());
}

#[test]
fn test_generate_is_deterministic() {
  let (_dir, config) = fixture();

  runner::generate(&config, None).expect("first run");
  let first: Vec<String> = runner::output_paths(&config)
    .iter()
    .map(|path| fs::read_to_string(path).expect("read"))
    .collect();

  runner::generate(&config, None).expect("second run");
  let second: Vec<String> = runner::output_paths(&config)
    .iter()
    .map(|path| fs::read_to_string(path).expect("read"))
    .collect();

  assert_eq!(first, second);
}

#[test]
fn test_single_variant_puts_everything_in_its_module() {
  let (_dir, mut config) = fixture();
  config.variant_b.source = None;

  let summary = runner::generate(&config, None).expect("generate");
  assert_eq!(summary.shared, 0);
  assert_eq!(summary.variant_a, 2);
  assert_eq!(summary.variant_b, 0);

  let only_a = fs::read_to_string(config.output_path(Variant::A)).expect("vencord.nix");
  assert_eq!(
    module_options(&only_a).expect("shape"),
    ["betterFolders", "onlyA"]
  );
  let only_b = fs::read_to_string(config.output_path(Variant::B)).expect("equicord.nix");
  assert!(module_options(&only_b).expect("shape").is_empty());
}

#[test]
fn test_duplicate_identifiers_abort_the_run() {
  let (_dir, config) = fixture();
  let a = config.variant_a.source.clone().expect("source");
  write(
    &a,
    "src/userplugins/better-folders.ts",
    &plugin("betterFolders", "x: { type: OptionType.BOOLEAN }"),
  );

  let err = runner::generate(&config, None).expect_err("duplicate");
  assert!(matches!(err, NixplugError::DuplicatePlugin { .. }));
}

#[test]
fn test_missing_sources_are_a_config_error() {
  let mut config = Config::default();
  config.output_dir = tempfile::tempdir().expect("tempdir").path().join("out");
  let err = runner::generate(&config, None).expect_err("no sources");
  assert!(matches!(err, NixplugError::Config(_)));
}
