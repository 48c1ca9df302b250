//! Work-item references in commit messages
//!
//! ```text
//! reference = "#" number | "issue-" number
//! number    = 1*DIGIT          ; never followed by another digit
//! ```
//!
//! `issue-` only counts when not glued to a preceding letter or digit, so
//! `reissue-4` is not a reference. A parenthesised reference (`(#12)`) is
//! removed together with its parentheses when stripped.

use winnow::ascii::digit1;
use winnow::combinator::{alt, preceded};
use winnow::prelude::*;

/// A reference found in text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
  pub number: u64,
  /// Byte range of the token, including enclosing parentheses if present
  pub start: usize,
  pub end: usize,
}

fn reference(input: &mut &str) -> winnow::Result<u64> {
  preceded(alt(("#", "issue-")), digit1.parse_to()).parse_next(input)
}

/// All references in `text`, in order of appearance
pub fn find_references(text: &str) -> Vec<Reference> {
  let mut found = Vec::new();
  let mut at = 0;

  while at < text.len() {
    let rest = &text[at..];
    let candidate = rest.starts_with('#') || (rest.starts_with("issue-") && !preceded_by_alphanumeric(text, at));
    if candidate {
      let mut input = rest;
      if let Ok(number) = reference.parse_next(&mut input) {
        let end = text.len() - input.len();
        let (start, end) = widen_to_parentheses(text, at, end);
        found.push(Reference { number, start, end });
        at = end;
        continue;
      }
    }
    at += rest.chars().next().map(char::len_utf8).unwrap_or(1);
  }

  found
}

fn preceded_by_alphanumeric(text: &str, at: usize) -> bool {
  text[..at].chars().next_back().is_some_and(|c| c.is_alphanumeric())
}

fn widen_to_parentheses(text: &str, start: usize, end: usize) -> (usize, usize) {
  if text[..start].ends_with('(') && text[end..].starts_with(')') {
    (start - 1, end + 1)
  } else {
    (start, end)
  }
}

/// True when `text` references `number` as a whole token
pub fn mentions(text: &str, number: u64) -> bool {
  find_references(text).iter().any(|r| r.number == number)
}

/// True when `text` references any work item
pub fn has_references(text: &str) -> bool {
  !find_references(text).is_empty()
}

/// Remove every reference to `number`, then collapse runs of whitespace
pub fn strip_reference(text: &str, number: u64) -> String {
  let mut out = String::with_capacity(text.len());
  let mut cursor = 0;
  for r in find_references(text).into_iter().filter(|r| r.number == number) {
    out.push_str(&text[cursor..r.start]);
    out.push(' ');
    cursor = r.end;
  }
  out.push_str(&text[cursor..]);
  out.split_whitespace().collect::<Vec<_>>().join(" ")
}
