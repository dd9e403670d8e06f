//! Nix identifiers: sanitizing plugin names into attribute names, and
//! deciding when an attribute name has to be quoted.
use std::sync::LazyLock;

use log::error;
use regex::Regex;

use crate::escape::quote;

/// Words that cannot be used as bare attribute names.
const KEYWORDS: &[&str] = &[
  "assert", "else", "if", "in", "inherit", "let", "or", "rec", "then", "with",
];

fn compile(pattern: &str) -> Option<Regex> {
  Regex::new(pattern)
    .inspect_err(|e| error!("nixplug-codegen: failed to compile `{pattern}`: {e}"))
    .ok()
}

/// A trailing `(...)` annotation such as `(restart required)`.
static PARENTHETICAL_SUFFIX: LazyLock<Option<Regex>> =
  LazyLock::new(|| compile(r"\s*\([^()]*\)\s*$"));

static INVALID_CHARS: LazyLock<Option<Regex>> =
  LazyLock::new(|| compile(r"[^A-Za-z0-9_'-]"));

static REPEATED_UNDERSCORES: LazyLock<Option<Regex>> =
  LazyLock::new(|| compile(r"_{2,}"));

fn replace(pattern: &LazyLock<Option<Regex>>, text: &str, with: &str) -> String {
  match pattern.as_ref() {
    Some(regex) => regex.replace_all(text, with).into_owned(),
    None => text.to_string(),
  }
}

/// Whether `name` can be written as a bare Nix attribute name.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  let Some(first) = chars.next() else {
    return false;
  };
  (first.is_ascii_alphabetic() || first == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '\'' | '-'))
    && !KEYWORDS.contains(&name)
}

/// `name` as an attribute name: bare when possible, quoted otherwise.
#[must_use]
pub fn attribute_name(name: &str) -> String {
  if is_identifier(name) {
    name.to_string()
  } else {
    quote(name)
  }
}

/// Split `segment` into words at case boundaries: `fooBar` → `foo`, `Bar`;
/// `HTMLParser` → `HTML`, `Parser`. Digits stay with the preceding word.
fn words(segment: &str) -> Vec<&str> {
  let chars: Vec<(usize, char)> = segment.char_indices().collect();
  let mut words = Vec::new();
  let mut start = 0;

  for i in 1..chars.len() {
    let (at, c) = chars[i];
    let prev = chars[i - 1].1;
    let next = chars.get(i + 1).map(|&(_, c)| c);
    let lower_to_upper = !prev.is_ascii_uppercase() && c.is_ascii_uppercase();
    let acronym_end = prev.is_ascii_uppercase()
      && c.is_ascii_uppercase()
      && next.is_some_and(|n| n.is_ascii_lowercase());
    if lower_to_upper || acronym_end {
      words.push(&segment[start..at]);
      start = at;
    }
  }
  if start < segment.len() {
    words.push(&segment[start..]);
  }
  words
}

fn capitalize(word: &str) -> String {
  let lower = word.to_ascii_lowercase();
  let mut chars = lower.chars();
  chars.next().map_or_else(String::new, |c| {
    c.to_ascii_uppercase().to_string() + chars.as_str()
  })
}

fn lower_camel_case(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for word in text.split(['_', '-']).flat_map(words) {
    if out.is_empty() {
      out.push_str(&word.to_ascii_lowercase());
    } else {
      out.push_str(&capitalize(word));
    }
  }
  out
}

/// Turn a plugin name into a Nix attribute name.
///
/// Strips a trailing parenthetical, maps characters outside
/// `[A-Za-z0-9_'-]` to underscores, collapses and trims underscores, and
/// converts the result to lower camel case. A leading underscore on the
/// input survives, and a result that would not start with a letter or an
/// underscore is prefixed with one.
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
  let stripped = replace(&PARENTHETICAL_SUFFIX, name, "");
  let replaced = replace(&INVALID_CHARS, &stripped, "_");
  let collapsed = replace(&REPEATED_UNDERSCORES, &replaced, "_");
  let mut ident = lower_camel_case(collapsed.trim_matches('_'));

  if name.starts_with('_') && !ident.starts_with('_') {
    ident.insert(0, '_');
  }
  if !ident.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
    ident.insert(0, '_');
  }
  ident
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sanitize_camel_cases_plugin_names() {
    assert_eq!(sanitize_identifier("BetterFolders"), "betterFolders");
    assert_eq!(sanitize_identifier("showHiddenChannels"), "showHiddenChannels");
    assert_eq!(sanitize_identifier("USRBG"), "usrbg");
    assert_eq!(sanitize_identifier("HTMLParser"), "htmlParser");
    assert_eq!(sanitize_identifier("Fake Nitro"), "fakeNitro");
    assert_eq!(sanitize_identifier("message-logger"), "messageLogger");
  }

  #[test]
  fn test_sanitize_strips_parenthetical_and_symbols() {
    assert_eq!(sanitize_identifier("Quick CSS (restart required)"), "quickCss");
    assert_eq!(sanitize_identifier("no!!pe"), "noPe");
    assert_eq!(sanitize_identifier("a__b"), "aB");
  }

  #[test]
  fn test_sanitize_leading_characters() {
    assert_eq!(sanitize_identifier("_private"), "_private");
    assert_eq!(sanitize_identifier("__double"), "_double");
    assert_eq!(sanitize_identifier("24hTime"), "_24hTime");
    assert_eq!(sanitize_identifier("!bang"), "bang");
    assert_eq!(sanitize_identifier("***"), "_");
  }

  #[test]
  fn test_sanitized_names_are_identifiers() {
    for name in ["BetterFolders", "24hTime", "***", "_x", "Ünïcode"] {
      let ident = sanitize_identifier(name);
      assert!(
        ident.starts_with('_') || is_identifier(&ident),
        "{name} -> {ident}"
      );
    }
  }

  #[test]
  fn test_attribute_names() {
    assert_eq!(attribute_name("enable"), "enable");
    assert_eq!(attribute_name("kebab-case'"), "kebab-case'");
    assert_eq!(attribute_name("with"), "\"with\"");
    assert_eq!(attribute_name("has space"), "\"has space\"");
    assert_eq!(attribute_name("1st"), "\"1st\"");
    assert_eq!(attribute_name(""), "\"\"");
  }
}
