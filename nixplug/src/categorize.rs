//! Partitioning extracted plugins into shared and variant-only sets.
use std::collections::BTreeMap;

use nixplug_codegen::sanitize_identifier;
use nixplug_extract::PluginSchema;
use serde::Serialize;

use crate::error::NixplugError;

/// Plugins keyed by sanitized identifier.
pub type PluginMap = BTreeMap<String, PluginSchema>;

/// Result of comparing the plugin sets of both variants.
#[derive(Debug, Default, Serialize)]
pub struct Categorized {
  /// Present in both variants; the first variant's schema is kept.
  pub shared:    PluginMap,
  pub variant_a: PluginMap,
  pub variant_b: PluginMap,
}

impl Categorized {
  #[must_use]
  pub fn plugin_count(&self) -> usize {
    self.shared.len() + self.variant_a.len() + self.variant_b.len()
  }
}

/// Key `plugins` by sanitized name.
///
/// # Errors
///
/// Returns [`NixplugError::DuplicatePlugin`] if two plugins share an
/// identifier.
pub fn index_plugins(
  variant: &str,
  plugins: Vec<PluginSchema>,
) -> Result<PluginMap, NixplugError> {
  let mut map = PluginMap::new();
  for plugin in plugins {
    let id = sanitize_identifier(&plugin.name);
    if let Some(existing) = map.get(&id) {
      return Err(NixplugError::DuplicatePlugin {
        variant: variant.to_string(),
        id,
        first: existing.source.clone(),
        second: plugin.source,
      });
    }
    map.insert(id, plugin);
  }
  Ok(map)
}

/// Split the plugins of both variants into shared, A-only and B-only sets.
#[must_use]
pub fn categorize(a: PluginMap, mut b: PluginMap) -> Categorized {
  let mut categorized = Categorized::default();
  for (id, plugin) in a {
    if b.remove(&id).is_some() {
      categorized.shared.insert(id, plugin);
    } else {
      categorized.variant_a.insert(id, plugin);
    }
  }
  categorized.variant_b = b;
  categorized
}
