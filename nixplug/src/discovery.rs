//! Locating plugin entry files under a variant's source root.
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::NixplugError;

/// Entry file names that make a directory a plugin, in priority order.
const INDEX_FILES: &[&str] = &["index.ts", "index.tsx", "index.js", "index.jsx"];

/// Extensions of single-file plugins.
const PLUGIN_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// A plugin entry file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
  /// Directory name or file stem.
  pub name: String,
  pub path: PathBuf,
}

fn is_skipped(name: &str, exclude: &[String]) -> bool {
  name.starts_with('_') || name.starts_with('.') || exclude.iter().any(|e| e == name)
}

fn entry_for(path: &Path, is_dir: bool) -> Option<PluginEntry> {
  if is_dir {
    let name = path.file_name()?.to_str()?;
    let index = INDEX_FILES
      .iter()
      .map(|file| path.join(file))
      .find(|candidate| candidate.is_file())?;
    return Some(PluginEntry {
      name: name.to_string(),
      path: index,
    });
  }

  let extension = path.extension()?.to_str()?;
  if !PLUGIN_EXTENSIONS.contains(&extension) {
    return None;
  }
  let stem = path.file_stem()?.to_str()?;
  // Declaration files are not plugins.
  if stem.ends_with(".d") {
    return None;
  }
  Some(PluginEntry {
    name: stem.to_string(),
    path: path.to_path_buf(),
  })
}

/// Find the plugins of one source root.
///
/// Every child directory of each plugin directory that has an `index.*`
/// file is a plugin, as is every direct `.ts`/`.tsx` file. Names starting
/// with `_` or `.` and names listed in `exclude` are skipped. Plugin
/// directories that do not exist are ignored. Results are sorted by path.
///
/// # Errors
///
/// Returns [`NixplugError::Discovery`] if an existing plugin directory cannot
/// be read.
pub fn discover_plugins(
  source_root: &Path,
  plugin_dirs: &[PathBuf],
  exclude: &[String],
) -> Result<Vec<PluginEntry>, NixplugError> {
  let mut entries = Vec::new();

  for plugin_dir in plugin_dirs {
    let dir = source_root.join(plugin_dir);
    if !dir.is_dir() {
      debug!("Skipping missing plugin directory: {}", dir.display());
      continue;
    }

    let walker = WalkDir::new(&dir).min_depth(1).max_depth(1).follow_links(true);
    for result in walker {
      let dent = match result {
        Ok(dent) => dent,
        Err(e) if e.depth() == 0 => {
          return Err(NixplugError::Discovery {
            path:   dir.clone(),
            source: e,
          });
        },
        Err(e) => {
          warn!("Skipping unreadable directory entry: {e}");
          continue;
        },
      };

      let Some(file_name) = dent.file_name().to_str() else {
        continue;
      };
      if is_skipped(file_name, exclude) {
        debug!("Skipping excluded plugin: {}", dent.path().display());
        continue;
      }

      match entry_for(dent.path(), dent.file_type().is_dir()) {
        Some(entry) if is_skipped(&entry.name, exclude) => {},
        Some(entry) => entries.push(entry),
        None => debug!("Not a plugin: {}", dent.path().display()),
      }
    }
  }

  entries.sort_by(|a, b| a.path.cmp(&b.path));
  Ok(entries)
}
