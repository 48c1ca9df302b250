//! Changelog generation and insertion
//!
//! An entry is a version heading followed by category sections in a fixed order:
//!
//! ```text
//! ## [1.4.0] - 2025-03-02
//!
//! ### Fixed
//!
//! - **Fix login bug** (#100)
//!   - fix(auth): resolve login bug
//!
//! ### Changed
//!
//! - chore: update deps
//! ```
//!
//! - `refs`: work-item reference grammar (`#N`, `issue-N`)
//! - `commit`: conventional commit classification
//! - `hybrid`: entry assembled from closed work items and commit history
//! - `document`: insertion into the cumulative changelog
//! - `source`: inline / file / editor / generated content priority
//! - `lint`: structural validation of an entry

pub mod commit;
pub mod document;
pub mod hybrid;
pub mod lint;
pub mod refs;
pub mod source;

pub use document::insert_entry;
pub use hybrid::generate;
pub use source::{ContentSource, SourceRequest};

use crate::release::version::ReleaseVersion;
use chrono::NaiveDate;

/// Changelog categories, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
  Added,
  Fixed,
  Documentation,
  Security,
  BreakingChanges,
  Changed,
}

impl Category {
  pub const ALL: [Category; 6] = [
    Category::Added,
    Category::Fixed,
    Category::Documentation,
    Category::Security,
    Category::BreakingChanges,
    Category::Changed,
  ];

  /// Work-item label feeding each labeled category
  pub const LABELED: [(&'static str, Category); 5] = [
    ("enhancement", Category::Added),
    ("bug", Category::Fixed),
    ("documentation", Category::Documentation),
    ("security", Category::Security),
    ("breaking", Category::BreakingChanges),
  ];

  pub fn heading(&self) -> &'static str {
    match self {
      Category::Added => "Added",
      Category::Fixed => "Fixed",
      Category::Documentation => "Documentation",
      Category::Security => "Security",
      Category::BreakingChanges => "Breaking Changes",
      Category::Changed => "Changed",
    }
  }

  pub fn from_heading(heading: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.heading() == heading)
  }
}

/// Top-level bullet with optional indented sub-bullets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bullet {
  pub text: String,
  pub children: Vec<String>,
}

impl Bullet {
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      children: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
  pub category: Category,
  pub bullets: Vec<Bullet>,
}

/// One version section of the changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
  pub version: ReleaseVersion,
  pub date: NaiveDate,
  /// Non-empty sections in [`Category::ALL`] order
  pub sections: Vec<Section>,
}

impl ChangelogEntry {
  pub fn heading(version: &ReleaseVersion, date: NaiveDate) -> String {
    format!("## [{}] - {}", version, date.format("%Y-%m-%d"))
  }

  pub fn section(&self, category: Category) -> Option<&Section> {
    self.sections.iter().find(|s| s.category == category)
  }

  /// Markdown text, ending with a single newline
  pub fn render(&self) -> String {
    let mut out = Self::heading(&self.version, self.date);
    out.push('\n');
    for section in &self.sections {
      out.push_str(&format!("\n### {}\n\n", section.category.heading()));
      for bullet in &section.bullets {
        out.push_str(&format!("- {}\n", bullet.text));
        for child in &bullet.children {
          out.push_str(&format!("  - {}\n", child));
        }
      }
    }
    out
  }
}
