use std::{
  collections::BTreeMap,
  fmt,
  fs,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use log::info;
use nixplug_extract::LoadOptions;
use serde::{Deserialize, Serialize};

use crate::error::NixplugError;

/// One of the two client variants a run compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
  A,
  B,
}

impl Variant {
  pub const ALL: [Self; 2] = [Self::A, Self::B];

  #[must_use]
  pub const fn default_label(self) -> &'static str {
    match self {
      Self::A => "Vencord",
      Self::B => "Equicord",
    }
  }

  #[must_use]
  pub const fn default_output_file(self) -> &'static str {
    match self {
      Self::A => "vencord.nix",
      Self::B => "equicord.nix",
    }
  }
}

impl fmt::Display for Variant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::A => f.write_str("variant_a"),
      Self::B => f.write_str("variant_b"),
    }
  }
}

/// Where one variant's sources live and where its module is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
  /// Display name used in generated descriptions.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,

  /// Root of the variant's source checkout.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<PathBuf>,

  /// File name of the module holding plugins only this variant has.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output_file: Option<PathBuf>,
}

impl VariantConfig {
  fn merge(&mut self, other: Self) {
    if other.label.is_some() {
      self.label = other.label;
    }
    if other.source.is_some() {
      self.source = other.source;
    }
    if other.output_file.is_some() {
      self.output_file = other.output_file;
    }
  }
}

fn default_plugin_dirs() -> Vec<PathBuf> {
  ["src/plugins", "src/equicordplugins", "src/userplugins"]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

fn default_output_dir() -> PathBuf {
  PathBuf::from("generated")
}

fn default_shared_file() -> PathBuf {
  PathBuf::from("shared.nix")
}

const fn default_max_import_depth() -> usize {
  3
}

fn default_path_aliases() -> BTreeMap<String, PathBuf> {
  [
    ("@api", "src/api"),
    ("@components", "src/components"),
    ("@utils", "src/utils"),
    ("@webpack", "src/webpack"),
    ("@plugins", "src/plugins"),
    ("@equicordplugins", "src/equicordplugins"),
  ]
  .into_iter()
  .map(|(prefix, dir)| (prefix.to_string(), PathBuf::from(dir)))
  .collect()
}

/// Configuration options for nixplug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub variant_a: VariantConfig,

  #[serde(default)]
  pub variant_b: VariantConfig,

  /// Directories, relative to a variant's source root, holding plugins
  #[serde(default = "default_plugin_dirs")]
  pub plugin_dirs: Vec<PathBuf>,

  /// Plugin names to skip
  #[serde(default)]
  pub exclude: Vec<String>,

  /// Directory the generated modules are written to
  #[serde(default = "default_output_dir")]
  pub output_dir: PathBuf,

  /// File name of the module holding plugins both variants have
  #[serde(default = "default_shared_file")]
  pub shared_file: PathBuf,

  /// Number of threads to use for parallel extraction
  #[serde(default)]
  pub jobs: Option<usize>,

  /// How many import hops away from a plugin entry are still parsed
  #[serde(default = "default_max_import_depth")]
  pub max_import_depth: usize,

  /// Import prefixes mapped to directories relative to a variant's source
  /// root, e.g. `"@utils" = "src/utils"`
  #[serde(default = "default_path_aliases")]
  pub path_aliases: BTreeMap<String, PathBuf>,

  /// Extra comment line for the header of generated files
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub header: Option<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      variant_a:        VariantConfig::default(),
      variant_b:        VariantConfig::default(),
      plugin_dirs:      default_plugin_dirs(),
      exclude:          Vec::new(),
      output_dir:       default_output_dir(),
      shared_file:      default_shared_file(),
      jobs:             None,
      max_import_depth: default_max_import_depth(),
      path_aliases:     default_path_aliases(),
      header:           None,
    }
  }
}

/// Default configuration template in TOML, with every field explained.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# nixplug configuration file

# Directory the generated modules are written to
output_dir = "generated"

# Module holding plugins that both variants ship
shared_file = "shared.nix"

# Plugin directories, relative to each variant's source root
plugin_dirs = ["src/plugins", "src/equicordplugins", "src/userplugins"]

# Plugin names to skip
# exclude = ["_example"]

# Number of threads to use for extraction (defaults to number of CPU cores)
# jobs = 4

# How many import hops away from a plugin entry file are still parsed
max_import_depth = 3

# Extra comment line added to the header of generated files
# header = "Generated from Vencord and Equicord main branches"

[variant_a]
label = "Vencord"
source = "vendor/Vencord"
output_file = "vencord.nix"

[variant_b]
label = "Equicord"
source = "vendor/Equicord"
output_file = "equicord.nix"

# Import prefixes resolved relative to each variant's source root
[path_aliases]
"@api" = "src/api"
"@components" = "src/components"
"@utils" = "src/utils"
"@webpack" = "src/webpack"
"@plugins" = "src/plugins"
"@equicordplugins" = "src/equicordplugins"
"#;

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, NixplugError>
where
  T::Err: fmt::Display,
{
  value.parse().map_err(|e| {
    NixplugError::Config(format!(
      "Invalid value '{value}' for configuration key '{key}': {e}"
    ))
  })
}

impl Config {
  /// Load configuration from a file (TOML or JSON).
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  #[allow(
    clippy::option_if_let_else,
    reason = "Clearer with explicit match on extension"
  )]
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NixplugError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
      NixplugError::Config(format!(
        "Failed to read config file: {}: {e}",
        path.display()
      ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) => {
        match ext.to_lowercase().as_str() {
          "json" => {
            serde_json::from_str(&content).map_err(|e| {
              NixplugError::Config(format!(
                "Failed to parse JSON config from {}: {e}",
                path.display()
              ))
            })
          },
          "toml" => {
            toml::from_str(&content).map_err(|e| {
              NixplugError::Config(format!(
                "Failed to parse TOML config from {}: {e}",
                path.display()
              ))
            })
          },
          _ => {
            Err(NixplugError::Config(format!(
              "Unsupported config file format: {}",
              path.display()
            )))
          },
        }
      },
      None => {
        Err(NixplugError::Config(format!(
          "Config file has no extension: {}",
          path.display()
        )))
      },
    }
  }

  /// Load and merge `config_files` in order (or a discovered config file when
  /// none are given), then apply `KEY=VALUE` overrides.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded or an override is invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, NixplugError> {
    let mut config = if let Some((first, rest)) = config_files.split_first() {
      let mut merged = Self::from_file(first)?;
      for path in rest {
        merged.merge(Self::from_file(path)?);
      }
      if config_files.len() > 1 {
        info!("Loaded and merged {} config files", config_files.len());
      }
      merged
    } else if let Some(discovered) = Self::find_config_file() {
      info!("Using discovered config file: {}", discovered.display());
      Self::from_file(&discovered)?
    } else {
      Self::default()
    };

    config.apply_overrides(config_overrides)?;
    Ok(config)
  }

  /// Search the working directory for a config file.
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let current_dir = std::env::current_dir().ok()?;
        [
          "nixplug.toml",
          "nixplug.json",
          ".nixplug.toml",
          ".nixplug.json",
          ".config/nixplug.toml",
          ".config/nixplug.json",
        ]
        .iter()
        .map(|name| current_dir.join(name))
        .find(|path| path.exists())
      })
      .clone()
  }

  /// Merge another config into this one, with the other config's values taking
  /// precedence.
  ///
  /// [`Option`] fields are replaced only by [`Some`], lists are appended,
  /// `path_aliases` entries are merged key by key and plain fields are
  /// replaced.
  pub fn merge(&mut self, other: Self) {
    self.variant_a.merge(other.variant_a);
    self.variant_b.merge(other.variant_b);
    for dir in other.plugin_dirs {
      if !self.plugin_dirs.contains(&dir) {
        self.plugin_dirs.push(dir);
      }
    }
    self.exclude.extend(other.exclude);
    self.output_dir = other.output_dir;
    self.shared_file = other.shared_file;
    if other.jobs.is_some() {
      self.jobs = other.jobs;
    }
    self.max_import_depth = other.max_import_depth;
    self.path_aliases.extend(other.path_aliases);
    if other.header.is_some() {
      self.header = other.header;
    }
  }

  /// Apply configuration overrides from KEY=VALUE strings.
  ///
  /// # Errors
  ///
  /// Returns an error if an override is not in KEY=VALUE format, the key is
  /// not recognized, or the value cannot be parsed.
  pub fn apply_overrides(&mut self, overrides: &[String]) -> Result<(), NixplugError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        NixplugError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;
      self.apply_override(key.trim(), value.trim())?;
    }
    Ok(())
  }

  fn apply_override(&mut self, key: &str, value: &str) -> Result<(), NixplugError> {
    if let Some(prefix) = key.strip_prefix("path_aliases.") {
      self.path_aliases.insert(prefix.to_string(), PathBuf::from(value));
      return Ok(());
    }

    match key {
      "output_dir" => self.output_dir = PathBuf::from(value),
      "shared_file" => self.shared_file = PathBuf::from(value),
      "jobs" => {
        self.jobs = if value.is_empty() {
          None
        } else {
          Some(parse_value(key, value)?)
        };
      },
      "max_import_depth" => self.max_import_depth = parse_value(key, value)?,
      "header" => self.header = (!value.is_empty()).then(|| value.to_string()),
      "plugin_dirs" => self.plugin_dirs.push(PathBuf::from(value)),
      "exclude" => self.exclude.push(value.to_string()),
      _ => {
        let Some((variant, field)) = key.split_once('.') else {
          return Err(unknown_key(key));
        };
        let variant = match variant {
          "variant_a" => &mut self.variant_a,
          "variant_b" => &mut self.variant_b,
          _ => return Err(unknown_key(key)),
        };
        match field {
          "label" => variant.label = Some(value.to_string()),
          "source" => variant.source = Some(PathBuf::from(value)),
          "output_file" => variant.output_file = Some(PathBuf::from(value)),
          _ => return Err(unknown_key(key)),
        }
      },
    }
    Ok(())
  }

  #[must_use]
  pub const fn variant(&self, variant: Variant) -> &VariantConfig {
    match variant {
      Variant::A => &self.variant_a,
      Variant::B => &self.variant_b,
    }
  }

  #[must_use]
  pub fn label(&self, variant: Variant) -> &str {
    self
      .variant(variant)
      .label
      .as_deref()
      .unwrap_or_else(|| variant.default_label())
  }

  /// Path the variant-only module is written to.
  #[must_use]
  pub fn output_path(&self, variant: Variant) -> PathBuf {
    let file = self
      .variant(variant)
      .output_file
      .clone()
      .unwrap_or_else(|| PathBuf::from(variant.default_output_file()));
    self.output_dir.join(file)
  }

  #[must_use]
  pub fn shared_path(&self) -> PathBuf {
    self.output_dir.join(&self.shared_file)
  }

  /// Extraction options for plugins under `source_root`.
  #[must_use]
  pub fn load_options(&self, source_root: &Path) -> LoadOptions {
    LoadOptions {
      max_import_depth: self.max_import_depth,
      path_aliases:     self
        .path_aliases
        .iter()
        .map(|(prefix, dir)| (prefix.clone(), source_root.join(dir)))
        .collect(),
    }
  }

  /// Check that at least one variant has a source root and that every
  /// configured root is a directory.
  ///
  /// # Errors
  ///
  /// Returns an error describing the first problem found.
  pub fn validate(&self) -> Result<(), NixplugError> {
    let mut any = false;
    for variant in Variant::ALL {
      let Some(source) = &self.variant(variant).source else {
        continue;
      };
      if !source.is_dir() {
        return Err(NixplugError::Config(format!(
          "Source root for {} ({variant}) is not a directory: {}",
          self.label(variant),
          source.display()
        )));
      }
      any = true;
    }
    if any {
      Ok(())
    } else {
      Err(NixplugError::Config(
        "No source root configured. Set variant_a.source and/or \
         variant_b.source."
          .to_string(),
      ))
    }
  }

  /// Generate a default configuration file with commented explanations
  ///
  /// # Errors
  ///
  /// Returns an error if the format is unsupported or the file cannot be
  /// written.
  pub fn generate_default_config(format: &str, path: &Path) -> Result<(), NixplugError> {
    let content = match format {
      "toml" => DEFAULT_TOML_TEMPLATE.to_string(),
      "json" => {
        let mut config = Self::default();
        config.variant_a.source = Some(PathBuf::from("vendor/Vencord"));
        config.variant_b.source = Some(PathBuf::from("vendor/Equicord"));
        serde_json::to_string_pretty(&config)?
      },
      other => {
        return Err(NixplugError::Config(format!(
          "Unsupported config format: {other}"
        )));
      },
    };

    fs::write(path, content).map_err(|e| {
      NixplugError::Config(format!(
        "Failed to write default config to {}: {e}",
        path.display()
      ))
    })?;

    info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

fn unknown_key(key: &str) -> NixplugError {
  NixplugError::Config(format!("Unknown configuration key: '{key}'"))
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]

  use super::*;

  #[test]
  fn test_default_template_parses() {
    let config: Config = toml::from_str(DEFAULT_TOML_TEMPLATE).expect("template parses");
    assert_eq!(config.label(Variant::A), "Vencord");
    assert_eq!(
      config.output_path(Variant::B),
      PathBuf::from("generated/equicord.nix")
    );
    assert_eq!(config.path_aliases.len(), 6);
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let config: Config =
      toml::from_str("[variant_b]\nsource = \"eq\"\n").expect("parses");
    assert_eq!(config.label(Variant::B), "Equicord");
    assert_eq!(config.variant_b.source, Some(PathBuf::from("eq")));
    assert_eq!(config.max_import_depth, 3);
    assert_eq!(config.plugin_dirs, default_plugin_dirs());
  }

  #[test]
  fn test_merge_rules() {
    let mut base = Config::default();
    base.variant_a.label = Some("Base".into());
    base.jobs = Some(2);
    base.exclude = vec!["a".into()];

    let mut other = Config::default();
    other.variant_a.source = Some(PathBuf::from("src-a"));
    other.exclude = vec!["b".into()];
    other.output_dir = PathBuf::from("out");

    base.merge(other);
    assert_eq!(base.variant_a.label.as_deref(), Some("Base"));
    assert_eq!(base.variant_a.source, Some(PathBuf::from("src-a")));
    assert_eq!(base.jobs, Some(2));
    assert_eq!(base.exclude, ["a", "b"]);
    assert_eq!(base.output_dir, PathBuf::from("out"));
    assert_eq!(base.plugin_dirs, default_plugin_dirs());
  }

  #[test]
  fn test_apply_overrides() {
    let mut config = Config::default();
    config
      .apply_overrides(&[
        "jobs=8".to_string(),
        "variant_b.label=Fork".to_string(),
        "path_aliases.@shared=src/shared".to_string(),
        "header = Pinned revision".to_string(),
      ])
      .expect("valid overrides");
    assert_eq!(config.jobs, Some(8));
    assert_eq!(config.label(Variant::B), "Fork");
    assert_eq!(
      config.path_aliases.get("@shared"),
      Some(&PathBuf::from("src/shared"))
    );
    assert_eq!(config.header.as_deref(), Some("Pinned revision"));
  }

  #[test]
  fn test_apply_overrides_errors() {
    let mut config = Config::default();
    let err = config
      .apply_overrides(&["no_equals_sign".to_string()])
      .expect_err("bad format");
    assert!(err.to_string().contains("Expected KEY=VALUE"));

    let err = config
      .apply_overrides(&["variant_c.label=x".to_string()])
      .expect_err("unknown key");
    assert!(err.to_string().contains("Unknown configuration key"));

    let err = config
      .apply_overrides(&["max_import_depth=deep".to_string()])
      .expect_err("bad number");
    assert!(err.to_string().contains("max_import_depth"));
  }

  #[test]
  fn test_load_options_resolve_aliases_against_root() {
    let config = Config::default();
    let options = config.load_options(Path::new("/checkout"));
    assert!(
      options
        .path_aliases
        .contains(&("@utils".to_string(), PathBuf::from("/checkout/src/utils")))
    );
  }

  #[test]
  fn test_validate_requires_a_source() {
    let config = Config::default();
    assert!(config.validate().is_err());

    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config::default();
    config.variant_a.source = Some(dir.path().to_path_buf());
    assert!(config.validate().is_ok());
  }
}
