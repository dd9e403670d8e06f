//! Re-parsing generated output with `rnix`.
use rnix::ast::{self, HasEntry};
use rowan::ast::AstNode;

use crate::error::CodegenError;

fn parse(text: &str) -> Result<rnix::Root, CodegenError> {
  let parse = rnix::Root::parse(text);
  let errors = parse.errors();
  if errors.is_empty() {
    Ok(parse.tree())
  } else {
    Err(CodegenError::InvalidOutput {
      errors: errors.iter().map(ToString::to_string).collect(),
    })
  }
}

/// Check that `text` parses as Nix.
///
/// # Errors
///
/// Returns [`CodegenError::InvalidOutput`] with every parse error `rnix`
/// reports.
pub fn validate_nix(text: &str) -> Result<(), CodegenError> {
  parse(text).map(|_| ())
}

fn unexpected(message: &str) -> CodegenError {
  CodegenError::UnexpectedShape {
    message: message.to_string(),
  }
}

/// Names of the top-level options declared by a generated module, i.e. the
/// keys of the attribute set returned by its function body.
///
/// # Errors
///
/// Returns an error if `text` does not parse, or is not a function whose
/// body (optionally behind a `let`) is an attribute set.
pub fn module_options(text: &str) -> Result<Vec<String>, CodegenError> {
  let root = parse(text)?;
  let Some(ast::Expr::Lambda(lambda)) = root.expr() else {
    return Err(unexpected("expected a function"));
  };
  let body = match lambda.body() {
    Some(ast::Expr::LetIn(let_in)) => let_in.body(),
    other => other,
  };
  let Some(ast::Expr::AttrSet(set)) = body else {
    return Err(unexpected("expected an attribute set body"));
  };

  Ok(
    set
      .attrpath_values()
      .filter_map(|binding| binding.attrpath()?.attrs().next())
      .filter_map(attr_name)
      .collect(),
  )
}

fn attr_name(attr: ast::Attr) -> Option<String> {
  match attr {
    ast::Attr::Ident(ident) => Some(ident.syntax().text().to_string()),
    ast::Attr::Str(string) => {
      let parts = string.normalized_parts();
      match parts.as_slice() {
        [ast::InterpolPart::Literal(text)] => Some(text.clone()),
        _ => None,
      }
    },
    ast::Attr::Dynamic(_) => None,
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, clippy::unreachable, reason = "Fine in tests")]

  use super::*;

  #[test]
  fn test_invalid_nix_is_reported() {
    let Err(CodegenError::InvalidOutput { errors }) = validate_nix("{ a = ; }") else {
      unreachable!("expected a parse error");
    };
    assert!(!errors.is_empty());
  }

  #[test]
  fn test_module_options() {
    let text = "{ lib, ... }:\nlet\n  inherit (lib) types;\nin\n{\n  a = 1;\n  \"b c\" = { };\n}\n";
    assert_eq!(
      module_options(text).expect("valid module"),
      ["a".to_string(), "b c".to_string()]
    );
    assert!(matches!(
      module_options("{ a = 1; }"),
      Err(CodegenError::UnexpectedShape { .. })
    ));
  }
}
