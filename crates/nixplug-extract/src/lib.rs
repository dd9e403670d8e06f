//! Static extraction of plugin settings schemas.
//!
//! Plugin sources are parsed, never executed. For every setting declared
//! through the settings definition call the crate infers a type and a
//! default from syntax alone, and reports anything that would need runtime
//! data as a per-setting [`ExtractionError`] instead of guessing.
//!
//! The usual entry point is [`Project::load`] followed by
//! [`extract_plugin`].
pub mod default_value;
pub mod error;
pub mod evidence;
pub mod inference;
pub mod known_enums;
pub mod navigator;
pub mod options;
pub mod plugin;
pub mod project;
pub mod property;
pub mod resolution;
pub mod resolver;
pub mod settings;
pub mod symbols;
pub mod types;
pub mod value;

pub use error::{ErrorKind, Extracted, ExtractionError, ProjectError};
pub use plugin::{PluginSchema, extract_plugin};
pub use project::{LoadOptions, Project};
pub use settings::{Setting, SettingGroup, SettingNode};
pub use types::{SettingCategory, TypeTag};
pub use value::Value;
