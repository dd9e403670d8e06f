//! Nix code generation for extracted plugin settings.
//!
//! Settings trees from [`nixplug_extract`] are turned into a [`NixValue`]
//! tree and rendered deterministically: sorted keys, fixed indentation and
//! string escaping that reads back as the original text. Generated modules
//! can be re-parsed with [`validate_nix`] before they are written.
pub mod error;
pub mod escape;
pub mod ident;
pub mod module;
pub mod render;
pub mod validate;
pub mod value;

pub use error::CodegenError;
pub use ident::sanitize_identifier;
pub use module::{ModuleOptions, OutputCategory, generate_module};
pub use render::render;
pub use validate::{module_options, validate_nix};
pub use value::NixValue;
