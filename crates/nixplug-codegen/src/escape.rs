//! Escaping for Nix string literals.
//!
//! Nix has two string forms: `"double quoted"` and `''indented''`. Each has
//! its own escape rules, and text rendered through the functions here reads
//! back as exactly the original text.

/// Escape `text` for a double-quoted string.
///
/// Only `\`, `"` and the interpolation opener `${` need escaping. `${` is
/// treated as one unit so a lone `$` or `{` is left alone.
#[must_use]
pub fn escape_string(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut chars = text.chars().peekable();
  while let Some(c) = chars.next() {
    match c {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '$' if chars.next_if_eq(&'{').is_some() => out.push_str("\\${"),
      other => out.push(other),
    }
  }
  out
}

/// `text` as a double-quoted Nix string.
#[must_use]
pub fn quote(text: &str) -> String {
  format!("\"{}\"", escape_string(text))
}

/// Escape `text` for the body of an indented string.
///
/// Pairs of single quotes become `'''` and every `$` becomes `''$`. A `$`
/// right after a lone quote would merge with it into `'''`, so it is written
/// as the interpolation `${"$"}` instead.
#[must_use]
pub fn escape_block(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut chars = text.chars().peekable();
  let mut after_lone_quote = false;

  while let Some(c) = chars.next() {
    match c {
      '\'' => {
        let mut run = 1;
        while chars.next_if_eq(&'\'').is_some() {
          run += 1;
        }
        for _ in 0..run / 2 {
          out.push_str("'''");
        }
        if run % 2 == 1 {
          out.push('\'');
          after_lone_quote = true;
          continue;
        }
      },
      '$' if after_lone_quote => out.push_str("${\"$\"}"),
      '$' => out.push_str("''$"),
      other => out.push(other),
    }
    after_lone_quote = false;
  }

  out
}

/// Whether `text` ends in an odd run of single quotes, which would merge
/// with a closing `''` delimiter.
fn ends_with_lone_quote(text: &str) -> bool {
  let run = text.chars().rev().take_while(|&c| c == '\'').count();
  run % 2 == 1
}

/// `text` as an indented string on a single line: `''text''`.
///
/// A trailing lone quote gets one space appended so it does not merge with
/// the closing delimiter.
#[must_use]
pub fn block_string(text: &str) -> String {
  let mut escaped = escape_block(text);
  if ends_with_lone_quote(text) {
    escaped.push(' ');
  }
  format!("''{escaped}''")
}

/// `text` as an indented string laid out over several lines:
///
/// ```text
/// ''
///   first line
///   second line''
/// ```
///
/// The layout is relative to column zero; the renderer shifts continuation
/// lines to wherever the string ends up. Empty lines carry no indentation.
/// The closing delimiter gets a line of its own only when `text` ends in a
/// newline.
///
/// Nix strips the indentation all lines share, so the first space of a line
/// is written as the escape `''\ `, which does not count as indentation. A
/// trailing lone quote is written as `''\'` so it stays apart from the
/// closing delimiter.
#[must_use]
pub fn multiline_block(text: &str) -> String {
  let (body, trailing_newline) = match text.strip_suffix('\n') {
    Some(body) => (body, true),
    None => (text, false),
  };

  let mut escaped = escape_block(body);
  if !trailing_newline && ends_with_lone_quote(body) {
    escaped.pop();
    escaped.push_str(r"''\'");
  }

  let mut out = String::from("''\n");
  for (i, line) in escaped.split('\n').enumerate() {
    if i > 0 {
      out.push('\n');
    }
    if line.is_empty() {
      continue;
    }
    out.push_str("  ");
    match line.strip_prefix(' ') {
      Some(rest) => {
        out.push_str(r"''\ ");
        out.push_str(rest);
      },
      None => out.push_str(line),
    }
  }
  if trailing_newline {
    out.push('\n');
  }
  out.push_str("''");
  out
}
