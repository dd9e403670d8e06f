//! Rendering of [`NixValue`] trees to text.
//!
//! Output is deterministic: attribute sets are sorted (with `enable` first),
//! lists put one element per line, and indentation is two spaces per level.
use crate::{
  escape::{multiline_block, quote},
  ident::attribute_name,
  value::NixValue,
};

const INDENT: &str = "  ";

/// Render `value` as Nix, starting at column zero.
#[must_use]
pub fn render(value: &NixValue) -> String {
  let mut out = String::new();
  write_value(&mut out, value, 0);
  out
}

/// Render `value` on a single line. Lists and attribute sets are written
/// inline; used for type expressions such as `types.enum [ "a" "b" ]`.
#[must_use]
pub fn render_inline(value: &NixValue) -> String {
  match value {
    NixValue::List(items) if !items.is_empty() => {
      let items: Vec<String> = items.iter().map(inline_element).collect();
      format!("[ {} ]", items.join(" "))
    },
    NixValue::AttrSet(map) if !map.is_empty() => {
      let entries: Vec<String> = ordered_entries(map)
        .map(|(key, value)| format!("{} = {};", attribute_name(key), render_inline(value)))
        .collect();
      format!("{{ {} }}", entries.join(" "))
    },
    NixValue::Apply { function, argument } => {
      format!("{function} {}", inline_element(argument))
    },
    other => render(other),
  }
}

fn inline_element(value: &NixValue) -> String {
  if value.needs_parens() {
    format!("({})", render_inline(value))
  } else {
    render_inline(value)
  }
}

/// Format a float so it always reads back as a float.
///
/// Rust's `Display` gives the shortest text that round-trips; integral
/// values get a `.0` suffix. Non-finite values have no Nix literal and
/// render as `null`.
#[must_use]
pub fn format_float(f: f64) -> String {
  if !f.is_finite() {
    return "null".to_string();
  }
  let text = f.to_string();
  if text.contains(['.', 'e', 'E']) {
    text
  } else {
    format!("{text}.0")
  }
}

/// Entries of an attribute set in output order: `enable` first, then the
/// remaining keys in lexicographic order.
pub fn ordered_entries<'v, I, V>(map: I) -> impl Iterator<Item = (&'v String, V)>
where
  I: IntoIterator<Item = (&'v String, V)>,
  V: 'v,
{
  let (enable, rest): (Vec<_>, Vec<_>) =
    map.into_iter().partition(|(key, _)| key.as_str() == "enable");
  enable.into_iter().chain(rest)
}

fn pad(out: &mut String, indent: usize) {
  for _ in 0..indent {
    out.push_str(INDENT);
  }
}

/// Write a pre-rendered fragment, shifting every line after the first to
/// `indent`. Empty lines stay empty.
fn write_fragment(out: &mut String, text: &str, indent: usize) {
  let mut lines = text.split('\n');
  if let Some(first) = lines.next() {
    out.push_str(first);
  }
  for line in lines {
    out.push('\n');
    if !line.is_empty() {
      pad(out, indent);
      out.push_str(line);
    }
  }
}

fn write_value(out: &mut String, value: &NixValue, indent: usize) {
  match value {
    NixValue::Str(text) if text.contains('\n') => {
      write_fragment(out, &multiline_block(text), indent);
    },
    NixValue::Str(text) => out.push_str(&quote(text)),
    NixValue::Int(n) => out.push_str(&n.to_string()),
    NixValue::Float(f) => out.push_str(&format_float(*f)),
    NixValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
    NixValue::Null => out.push_str("null"),
    NixValue::List(items) if items.is_empty() => out.push_str("[ ]"),
    NixValue::List(items) => {
      out.push_str("[\n");
      for item in items {
        pad(out, indent + 1);
        write_element(out, item, indent + 1);
        out.push('\n');
      }
      pad(out, indent);
      out.push(']');
    },
    NixValue::AttrSet(map) if map.is_empty() => out.push_str("{ }"),
    NixValue::AttrSet(map) => {
      out.push_str("{\n");
      for (key, value) in ordered_entries(map) {
        pad(out, indent + 1);
        out.push_str(&attribute_name(key));
        out.push_str(" = ");
        write_value(out, value, indent + 1);
        out.push_str(";\n");
      }
      pad(out, indent);
      out.push('}');
    },
    NixValue::Raw(text) => write_fragment(out, text, indent),
    NixValue::Apply { function, argument } => {
      out.push_str(function);
      out.push(' ');
      write_element(out, argument, indent);
    },
  }
}

fn write_element(out: &mut String, value: &NixValue, indent: usize) {
  if value.needs_parens() {
    out.push('(');
    write_value(out, value, indent);
    out.push(')');
  } else {
    write_value(out, value, indent);
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unreachable, reason = "Fine in tests")]

  use std::collections::BTreeMap;

  use rnix::ast::{self, HasEntry};

  use super::*;

  fn attrs(entries: &[(&str, NixValue)]) -> NixValue {
    NixValue::AttrSet(
      entries
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect::<BTreeMap<_, _>>(),
    )
  }

  /// Render `text` two attribute sets deep and read the string back with
  /// `rnix`.
  fn nested_read_back(text: &str) -> String {
    let value = attrs(&[("outer", attrs(&[("inner", NixValue::Str(text.into()))]))]);
    let rendered = render(&value);
    let parse = rnix::Root::parse(&rendered);
    assert!(parse.errors().is_empty(), "{rendered}: {:?}", parse.errors());

    let mut expr = parse.tree().expr();
    for _ in 0..2 {
      let Some(ast::Expr::AttrSet(set)) = expr else {
        unreachable!("`{rendered}` is not nested attribute sets");
      };
      expr = set.attrpath_values().next().and_then(|binding| binding.value());
    }
    let Some(ast::Expr::Str(string)) = expr else {
      unreachable!("`{rendered}` does not end in a string");
    };
    string
      .normalized_parts()
      .into_iter()
      .map(|part| {
        match part {
          ast::InterpolPart::Literal(text) => text,
          ast::InterpolPart::Interpolation(_) => {
            unreachable!("unexpected interpolation in `{rendered}`")
          },
        }
      })
      .collect()
  }

  #[test]
  fn test_nested_strings_read_back_exactly() {
    for text in [
      "a\nb",
      "a\nb\n",
      "  a\n  b\n",
      "  code\n    block",
      "Values:\n- 0: Off\n- 1: On",
      "costs $5\nand ''quotes''",
      "x\n\n",
      "\n",
    ] {
      assert_eq!(nested_read_back(text), text, "{text:?}");
    }
  }

  #[test]
  fn test_scalars() {
    assert_eq!(render(&NixValue::Int(-3)), "-3");
    assert_eq!(render(&NixValue::Float(2.0)), "2.0");
    assert_eq!(render(&NixValue::Float(0.25)), "0.25");
    assert_eq!(render(&NixValue::Bool(false)), "false");
    assert_eq!(render(&NixValue::Null), "null");
    assert_eq!(render(&NixValue::Str("a\"b".into())), r#""a\"b""#);
    assert_eq!(format_float(f64::NAN), "null");
  }

  #[test]
  fn test_empty_collections() {
    assert_eq!(render(&NixValue::List(Vec::new())), "[ ]");
    assert_eq!(render(&NixValue::attrs()), "{ }");
  }

  #[test]
  fn test_enable_sorts_first() {
    let value = attrs(&[
      ("zeta", NixValue::Int(1)),
      ("alpha", NixValue::Int(2)),
      ("enable", NixValue::Bool(true)),
    ]);
    assert_eq!(
      render(&value),
      "{\n  enable = true;\n  alpha = 2;\n  zeta = 1;\n}"
    );
  }

  #[test]
  fn test_lists_parenthesize_negative_numbers() {
    let value = NixValue::List(vec![
      NixValue::Int(1),
      NixValue::Int(-1),
      NixValue::Float(-0.5),
    ]);
    assert_eq!(render(&value), "[\n  1\n  (-1)\n  (-0.5)\n]");
    assert_eq!(render_inline(&value), "[ 1 (-1) (-0.5) ]");
  }

  #[test]
  fn test_quoted_keys() {
    let value = attrs(&[("with", NixValue::Null), ("a b", NixValue::Null)]);
    assert_eq!(render(&value), "{\n  \"a b\" = null;\n  \"with\" = null;\n}");
  }

  #[test]
  fn test_nested_multiline_string_is_reindented() {
    let value = attrs(&[(
      "inner",
      attrs(&[("description", NixValue::Str("one\ntwo".into()))]),
    )]);
    assert_eq!(
      render(&value),
      "{\n  inner = {\n    description = ''\n      one\n      two'';\n  };\n}"
    );
  }

  #[test]
  fn test_apply() {
    let option = NixValue::apply(
      "mkOption",
      attrs(&[("type", NixValue::raw("types.bool"))]),
    );
    assert_eq!(render(&option), "mkOption {\n  type = types.bool;\n}");
    let nested = NixValue::apply("f", NixValue::apply("g", NixValue::Int(1)));
    assert_eq!(render(&nested), "f (g 1)");
  }
}
