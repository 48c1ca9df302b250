//! Insertion into the cumulative changelog document
//!
//! Level-two headings split the document into sections:
//!
//! ```text
//! heading    = "## [" label "]" [ " - " date ]
//! label      = "Unreleased" (any case) | version
//! ```
//!
//! A new entry goes right after the `[Unreleased]` block, else right before the
//! first released version, else at the end. Everything else is kept verbatim.

use crate::core::error::ValidationError;
use crate::release::version::ReleaseVersion;
use winnow::combinator::delimited;
use winnow::prelude::*;
use winnow::token::take_till;

/// A level-two heading of the changelog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
  Unreleased,
  Version(ReleaseVersion),
  /// `## ` heading that is neither of the above
  Other,
}

fn bracketed<'a>(input: &mut &'a str) -> winnow::Result<&'a str> {
  delimited("## [", take_till(0.., ']'), ']').parse_next(input)
}

/// Classify a line; None when it is not a level-two heading
pub fn parse_heading(line: &str) -> Option<Heading> {
  if !line.starts_with("## ") {
    return None;
  }
  let mut input = line;
  let Ok(label) = bracketed(&mut input) else {
    return Some(Heading::Other);
  };
  let label = label.trim();
  if label.eq_ignore_ascii_case("unreleased") {
    return Some(Heading::Unreleased);
  }
  Some(
    ReleaseVersion::parse(label)
      .map(Heading::Version)
      .unwrap_or(Heading::Other),
  )
}

/// Byte offset and heading of every level-two heading line
fn headings(document: &str) -> Vec<(usize, Heading)> {
  let mut offset = 0;
  let mut found = Vec::new();
  for line in document.split_inclusive('\n') {
    if let Some(heading) = parse_heading(line.trim_end_matches(['\n', '\r'])) {
      found.push((offset, heading));
    }
    offset += line.len();
  }
  found
}

/// Versions that already have a section
pub fn released_versions(document: &str) -> Vec<ReleaseVersion> {
  headings(document)
    .into_iter()
    .filter_map(|(_, h)| match h {
      Heading::Version(v) => Some(v),
      _ => None,
    })
    .collect()
}

/// Byte offset where the entry for a new version belongs
fn insertion_point(document: &str) -> usize {
  let found = headings(document);

  if let Some(idx) = found.iter().position(|(_, h)| *h == Heading::Unreleased) {
    return found
      .get(idx + 1)
      .map(|(offset, _)| *offset)
      .unwrap_or(document.len());
  }

  found
    .iter()
    .find(|(_, h)| matches!(h, Heading::Version(_)))
    .map(|(offset, _)| *offset)
    .unwrap_or(document.len())
}

/// Drop trailing blank lines; trailing spaces on the last text line are kept
fn without_trailing_blank_lines(text: &str) -> &str {
  let mut rest = text.trim_end_matches(['\n', '\r']);
  while let Some(idx) = rest.rfind('\n') {
    if !rest[idx + 1..].trim().is_empty() {
      break;
    }
    rest = rest[..idx].trim_end_matches(['\n', '\r']);
  }
  if rest.trim().is_empty() { "" } else { rest }
}

/// Insert `entry` for `version`, leaving exactly one blank line on either side
pub fn insert_entry(document: &str, entry: &str, version: &ReleaseVersion) -> Result<String, ValidationError> {
  if released_versions(document).contains(version) {
    return Err(ValidationError::ChangelogVersionExists {
      version: version.to_string(),
    });
  }

  let at = insertion_point(document);
  let before = without_trailing_blank_lines(&document[..at]);
  let after = document[at..].trim_start_matches(['\n', '\r', ' ', '\t']);
  let entry = entry.trim();

  let mut out = String::with_capacity(document.len() + entry.len() + 4);
  if !before.is_empty() {
    out.push_str(before);
    out.push_str("\n\n");
  }
  out.push_str(entry);
  out.push('\n');
  if !after.is_empty() {
    out.push('\n');
    out.push_str(after);
  }
  Ok(out)
}

/// The section for `version`, heading included, without trailing blank lines
pub fn extract_section(document: &str, version: &ReleaseVersion) -> Option<String> {
  let found = headings(document);
  let idx = found.iter().position(|(_, h)| *h == Heading::Version(*version))?;
  let start = found[idx].0;
  let end = found.get(idx + 1).map(|(offset, _)| *offset).unwrap_or(document.len());
  Some(document[start..end].trim_end().to_string())
}
