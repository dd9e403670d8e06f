//! The `generate` pipeline: discover, extract in parallel, categorize and
//! write modules.
use std::{
  fs,
  path::{Path, PathBuf},
};

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use nixplug_codegen::{ModuleOptions, OutputCategory, generate_module, module_options};
use nixplug_extract::{LoadOptions, PluginSchema, Project, extract_plugin};
use oxc_allocator::Allocator;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
  categorize::{Categorized, PluginMap, categorize, index_plugins},
  config::{Config, Variant},
  discovery::{PluginEntry, discover_plugins},
  error::NixplugError,
};

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
  pub shared:            usize,
  pub variant_a:         usize,
  pub variant_b:         usize,
  /// Plugins whose entry file could not be loaded.
  pub failed:            usize,
  /// Settings-level extraction errors across all plugins.
  pub degraded_settings: usize,
}

/// Extract one plugin entry.
///
/// # Errors
///
/// Returns an error if the entry file cannot be read or parsed.
pub fn extract_entry(
  entry: &Path,
  options: &LoadOptions,
) -> Result<PluginSchema, nixplug_extract::ProjectError> {
  let allocator = Allocator::default();
  let project = Project::load(&allocator, entry, options)?;
  Ok(extract_plugin(&project))
}

fn progress_bar(len: usize, label: &str) -> ProgressBar {
  let bar = ProgressBar::new(len as u64);
  match ProgressStyle::with_template("{msg:>10} [{bar:40.cyan/blue}] {pos}/{len}") {
    Ok(style) => bar.set_style(style.progress_chars("=> ")),
    Err(e) => debug!("Falling back to default progress style: {e}"),
  }
  bar.set_message(label.to_string());
  bar
}

/// Extract every entry in parallel on the current rayon pool. Entries that
/// fail to load are logged and counted, not fatal.
pub fn extract_all(
  entries: &[PluginEntry],
  options: &LoadOptions,
  label: &str,
) -> (Vec<PluginSchema>, usize) {
  let bar = progress_bar(entries.len(), label);
  let results: Vec<_> = entries
    .par_iter()
    .progress_with(bar.clone())
    .map(|entry| {
      extract_entry(&entry.path, options).map_err(|e| {
        warn!("Skipping plugin `{}`: {e}", entry.name);
      })
    })
    .collect();
  bar.finish_and_clear();

  let failed = results.iter().filter(|r| r.is_err()).count();
  let schemas = results.into_iter().filter_map(Result::ok).collect();
  (schemas, failed)
}

fn write_module(
  path: &Path,
  plugins: &PluginMap,
  category: OutputCategory,
  options: &ModuleOptions,
) -> Result<(), NixplugError> {
  let plugins: Vec<&PluginSchema> = plugins.values().collect();
  let text = generate_module(&plugins, Some(category), options);

  let declared = module_options(&text).map_err(|source| {
    NixplugError::InvalidModule {
      path: path.to_path_buf(),
      source,
    }
  })?;
  if declared.len() != plugins.len() {
    return Err(NixplugError::Config(format!(
      "{} declares {} plugins, expected {}",
      path.display(),
      declared.len(),
      plugins.len()
    )));
  }

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, text)?;
  info!("Wrote {} plugins to {}", plugins.len(), path.display());
  Ok(())
}

/// JSON dump of a run, keyed by category and plugin identifier.
#[derive(Serialize)]
struct Dump<'c> {
  variant_a_label: &'c str,
  variant_b_label: &'c str,
  #[serde(flatten)]
  plugins:         &'c Categorized,
}

fn log_errors(plugins: &PluginMap) -> usize {
  plugins
    .values()
    .map(|plugin| {
      for error in &plugin.errors {
        let path = error.context.as_deref().unwrap_or("<plugin>");
        warn!("{}.{path}: {error}", plugin.name);
      }
      plugin.errors.len()
    })
    .sum()
}

/// Write the three modules (and the JSON dump when `json` is set).
///
/// # Errors
///
/// Returns an error if a generated module fails to re-parse or a file
/// cannot be written.
pub fn write_outputs(
  config: &Config,
  categorized: &Categorized,
  json: Option<&Path>,
) -> Result<(), NixplugError> {
  let mut options = ModuleOptions::new(config.label(Variant::A), config.label(Variant::B));
  options.header.clone_from(&config.header);

  write_module(
    &config.shared_path(),
    &categorized.shared,
    OutputCategory::Shared,
    &options,
  )?;
  write_module(
    &config.output_path(Variant::A),
    &categorized.variant_a,
    OutputCategory::VariantA,
    &options,
  )?;
  write_module(
    &config.output_path(Variant::B),
    &categorized.variant_b,
    OutputCategory::VariantB,
    &options,
  )?;

  if let Some(path) = json {
    let dump = Dump {
      variant_a_label: config.label(Variant::A),
      variant_b_label: config.label(Variant::B),
      plugins:         categorized,
    };
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(&dump)?)?;
    info!("Wrote JSON schema to {}", path.display());
  }

  Ok(())
}

/// Run the whole pipeline for `config`.
///
/// # Errors
///
/// Returns an error if discovery fails, a variant has duplicate plugin
/// identifiers, or an output cannot be generated or written.
pub fn generate(config: &Config, json: Option<&Path>) -> Result<Summary, NixplugError> {
  config.validate()?;

  let mut summary = Summary::default();
  let mut maps = Vec::with_capacity(2);
  for variant in Variant::ALL {
    let label = config.label(variant);
    let Some(source) = &config.variant(variant).source else {
      info!("No source root for {label}, treating it as empty");
      maps.push(PluginMap::new());
      continue;
    };

    let entries = discover_plugins(source, &config.plugin_dirs, &config.exclude)?;
    info!("Found {} plugins for {label} in {}", entries.len(), source.display());

    let (schemas, failed) = extract_all(&entries, &config.load_options(source), label);
    summary.failed += failed;
    maps.push(index_plugins(label, schemas)?);
  }

  let variant_b = maps.pop().unwrap_or_default();
  let variant_a = maps.pop().unwrap_or_default();
  let categorized = categorize(variant_a, variant_b);

  summary.shared = categorized.shared.len();
  summary.variant_a = categorized.variant_a.len();
  summary.variant_b = categorized.variant_b.len();
  summary.degraded_settings = log_errors(&categorized.shared)
    + log_errors(&categorized.variant_a)
    + log_errors(&categorized.variant_b);

  write_outputs(config, &categorized, json)?;
  Ok(summary)
}

/// Paths written by [`generate`] for `config`.
#[must_use]
pub fn output_paths(config: &Config) -> [PathBuf; 3] {
  [
    config.shared_path(),
    config.output_path(Variant::A),
    config.output_path(Variant::B),
  ]
}
