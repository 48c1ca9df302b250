//! Where the changelog entry comes from
//!
//! Priority, first match wins: inline text, file, editor session, hybrid generation.
//! An editor session that leaves nothing but comments falls through to generation.

use super::ChangelogEntry;
use super::document::{self, Heading};
use crate::core::error::{ReleaseResult, ValidationError};
use crate::release::version::ReleaseVersion;
use crate::ui::TextEditor;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Operator choices from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRequest {
  pub text: Option<String>,
  pub file: Option<PathBuf>,
  pub edit: bool,
}

/// Resolved content source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
  Inline(String),
  File(PathBuf),
  Editor,
  Generated,
}

impl ContentSource {
  pub fn describe(&self) -> String {
    match self {
      ContentSource::Inline(_) => "inline text".to_string(),
      ContentSource::File(path) => format!("file {}", path.display()),
      ContentSource::Editor => "editor".to_string(),
      ContentSource::Generated => "generated from work items and commits".to_string(),
    }
  }
}

impl SourceRequest {
  /// Pick the source and validate it before anything is generated
  ///
  /// Relative file paths are resolved against `root`.
  pub fn resolve(&self, root: &Path) -> Result<ContentSource, ValidationError> {
    if let Some(text) = &self.text {
      return Ok(ContentSource::Inline(text.clone()));
    }
    if let Some(file) = &self.file {
      let path = if file.is_absolute() { file.clone() } else { root.join(file) };
      if !path.is_file() {
        return Err(ValidationError::ChangelogSource {
          path: file.clone(),
          reason: "file does not exist".to_string(),
        });
      }
      return Ok(ContentSource::File(path));
    }
    if self.edit {
      return Ok(ContentSource::Editor);
    }
    Ok(ContentSource::Generated)
  }
}

/// Read operator-supplied content; None means fall through to generation
pub fn manual_content(
  source: &ContentSource,
  editor: &dyn TextEditor,
  version: &ReleaseVersion,
  date: NaiveDate,
) -> ReleaseResult<Option<String>> {
  match source {
    ContentSource::Inline(text) => Ok(Some(text.clone())),
    ContentSource::File(path) => {
      let content = std::fs::read_to_string(path).map_err(|e| ValidationError::ChangelogSource {
        path: path.clone(),
        reason: e.to_string(),
      })?;
      Ok(Some(content))
    }
    ContentSource::Editor => {
      let edited = editor.edit(&editor_template(version, date))?;
      let content = strip_comment_lines(&edited);
      if content.trim().is_empty() {
        println!("   ℹ️  Editor content empty, generating the changelog instead");
        Ok(None)
      } else {
        Ok(Some(content))
      }
    }
    ContentSource::Generated => Ok(None),
  }
}

/// Scratch file shown in the editor
pub fn editor_template(version: &ReleaseVersion, date: NaiveDate) -> String {
  format!(
    "<!-- Changelog entry for {version}. Lines that are only an HTML comment are removed. -->\n\
     <!-- Sections: ### Added, ### Fixed, ### Documentation, ### Security, ### Breaking Changes, ### Changed -->\n\
     <!-- Leave the file empty to generate the entry from work items and commits. -->\n\
     <!-- The heading '{heading}' is added when missing. -->\n",
    version = version,
    heading = ChangelogEntry::heading(version, date),
  )
}

/// Drop whole-line `<!-- ... -->` comments
pub fn strip_comment_lines(text: &str) -> String {
  let kept: Vec<&str> = text
    .lines()
    .filter(|line| {
      let trimmed = line.trim();
      !(trimmed.starts_with("<!--") && trimmed.ends_with("-->"))
    })
    .collect();
  kept.join("\n").trim().to_string()
}

/// Prefix the version heading unless the content already starts with one.
/// A heading the content brings along must name `version`.
pub fn with_heading(content: &str, version: &ReleaseVersion, date: NaiveDate) -> Result<String, ValidationError> {
  let content = content.trim();
  if !content.starts_with("## [") {
    return Ok(format!("{}\n\n{}\n", ChangelogEntry::heading(version, date), content));
  }

  let first = content.lines().next().unwrap_or_default();
  match document::parse_heading(first) {
    Some(Heading::Version(found)) if found == *version => Ok(format!("{}\n", content)),
    _ => Err(ValidationError::ChangelogHeadingMismatch {
      expected: version.to_string(),
      found: first.trim().to_string(),
    }),
  }
}
