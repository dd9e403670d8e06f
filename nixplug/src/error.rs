use std::{io, path::PathBuf};

use nixplug_codegen::CodegenError;
use thiserror::Error;

/// Top-level error type for the nixplug crate.
#[derive(Debug, Error)]
pub enum NixplugError {
  #[error("Configuration error: {0}")]
  Config(String),

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("Serde error: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("TOML error: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("Failed to read plugin directory `{}`: {source}", path.display())]
  Discovery {
    path:   PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// Two plugins of one variant sanitize to the same attribute name.
  #[error(
    "Duplicate plugin `{id}` in {variant}: `{}` and `{}`",
    first.display(),
    second.display()
  )]
  DuplicatePlugin {
    variant: String,
    id:      String,
    first:   PathBuf,
    second:  PathBuf,
  },

  #[error("Invalid generated module `{}`: {source}", path.display())]
  InvalidModule {
    path:   PathBuf,
    #[source]
    source: CodegenError,
  },

  #[error("Thread pool error: {0}")]
  ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
