use thiserror::Error;

/// Errors raised while checking generated Nix.
#[derive(Debug, Error)]
pub enum CodegenError {
  /// `rnix` reported parse errors for the generated text.
  #[error("generated Nix does not parse: {}", errors.join("; "))]
  InvalidOutput { errors: Vec<String> },

  /// The text parses but is not shaped like a generated module.
  #[error("generated Nix is not a module: {message}")]
  UnexpectedShape { message: String },
}
