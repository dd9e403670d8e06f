use std::{fmt, path::PathBuf};

use oxc_span::Span;
use serde::Serialize;
use thiserror::Error;

/// Errors that abort loading a plugin source tree.
///
/// These are structural failures of the compilation-unit bootstrap. Anything
/// that goes wrong *inside* a setting is an [`ExtractionError`] instead and is
/// carried as data.
#[derive(Debug, Error)]
pub enum ProjectError {
  /// A source file could not be read from disk.
  #[error("failed to read source file `{path}`: {source}")]
  ReadFile {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The file extension is not one the parser understands.
  #[error("unsupported source file type `{path}`")]
  UnsupportedFile { path: PathBuf },

  /// The parser gave up on the entry file.
  #[error("failed to parse `{path}`: {message}")]
  Parse { path: PathBuf, message: String },
}

/// Classification of a per-setting extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// An expected property is absent.
  MissingProperty,
  /// The expression depends on runtime state (getters, interpolated
  /// templates, unsupported call shapes).
  CannotEvaluate,
  /// An identifier or property access has no discoverable declaration and is
  /// not part of the known-enum table.
  UnresolvableSymbol,
  /// No type could be assigned.
  TypeInferenceFailed,
  /// The option-list shape is not one we recognize.
  UnsupportedPattern,
  /// A node of the wrong syntactic category was passed to an extractor.
  InvalidNodeType,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::MissingProperty => "missing property",
      Self::CannotEvaluate => "cannot evaluate",
      Self::UnresolvableSymbol => "unresolvable symbol",
      Self::TypeInferenceFailed => "type inference failed",
      Self::UnsupportedPattern => "unsupported pattern",
      Self::InvalidNodeType => "invalid node type",
    };
    f.write_str(name)
  }
}

/// A failure attached to exactly one setting or option.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct ExtractionError {
  pub kind:    ErrorKind,
  pub message: String,
  /// Byte range of the offending node in its source file.
  #[serde(serialize_with = "serialize_span")]
  pub span:    Span,
  /// Dotted setting path, filled in by the tree builder.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<String>,
}

impl ExtractionError {
  pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
    Self {
      kind,
      message: message.into(),
      span,
      context: None,
    }
  }

  #[must_use]
  pub fn with_context(mut self, context: impl Into<String>) -> Self {
    self.context = Some(context.into());
    self
  }
}

fn serialize_span<S: serde::Serializer>(
  span: &Span,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  use serde::ser::SerializeTuple;

  let mut tuple = serializer.serialize_tuple(2)?;
  tuple.serialize_element(&span.start)?;
  tuple.serialize_element(&span.end)?;
  tuple.end()
}

/// Outcome of extracting one value from the syntax tree.
///
/// Absence is a valid answer (a setting without a `default`), distinct from a
/// failure that should be reported but must not abort sibling settings.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<T> {
  Value(T),
  Absent,
  Failed(ExtractionError),
}

impl<T> Extracted<T> {
  pub const fn is_value(&self) -> bool {
    matches!(self, Self::Value(_))
  }

  pub const fn is_absent(&self) -> bool {
    matches!(self, Self::Absent)
  }

  pub const fn as_value(&self) -> Option<&T> {
    match self {
      Self::Value(v) => Some(v),
      _ => None,
    }
  }

  pub fn value(self) -> Option<T> {
    match self {
      Self::Value(v) => Some(v),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&ExtractionError> {
    match self {
      Self::Failed(e) => Some(e),
      _ => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extracted<U> {
    match self {
      Self::Value(v) => Extracted::Value(f(v)),
      Self::Absent => Extracted::Absent,
      Self::Failed(e) => Extracted::Failed(e),
    }
  }

  /// Chain another extraction on a present value.
  pub fn and_then<U>(self, f: impl FnOnce(T) -> Extracted<U>) -> Extracted<U> {
    match self {
      Self::Value(v) => f(v),
      Self::Absent => Extracted::Absent,
      Self::Failed(e) => Extracted::Failed(e),
    }
  }
}

impl<T> From<Option<T>> for Extracted<T> {
  fn from(value: Option<T>) -> Self {
    value.map_or(Self::Absent, Self::Value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display_includes_kind() {
    let err = ExtractionError::new(
      ErrorKind::CannotEvaluate,
      "template literal has substitutions",
      Span::new(3, 9),
    );
    assert_eq!(
      err.to_string(),
      "cannot evaluate: template literal has substitutions"
    );
  }

  #[test]
  fn test_extracted_and_then_short_circuits() {
    let failed: Extracted<i32> = Extracted::Failed(ExtractionError::new(
      ErrorKind::MissingProperty,
      "x",
      Span::default(),
    ));
    let chained = failed.and_then(|v| Extracted::Value(v + 1));
    assert!(chained.error().is_some());

    let absent: Extracted<i32> = None.into();
    assert!(absent.and_then(|v| Extracted::Value(v + 1)).is_absent());

    assert_eq!(
      Extracted::Value(1).and_then(|v| Extracted::Value(v + 1)),
      Extracted::Value(2)
    );
  }
}
