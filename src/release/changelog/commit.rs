//! Conventional commit headers
//!
//! Format: `<type>(<scope>)!: <description>`
//!
//! Used to tell feature/fix work apart from maintenance, and to recognise the
//! release chores this tool (or an operator) commits when bumping versions.

use winnow::ascii::{alphanumeric1, space0};
use winnow::combinator::{opt, preceded, terminated};
use winnow::prelude::*;
use winnow::token::{rest, take_till};

/// A parsed conventional commit header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
  /// Commit type (feat, fix, chore, docs, etc.)
  pub commit_type: CommitType,
  /// Optional scope (e.g., "auth", "release")
  pub scope: Option<String>,
  /// `!` after type/scope
  pub breaking: bool,
  pub description: String,
}

/// Conventional commit types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
  Feat,
  Fix,
  Docs,
  Style,
  Refactor,
  Perf,
  Test,
  Build,
  Ci,
  Chore,
  Revert,
  /// Other/unknown type
  Other,
}

impl CommitType {
  fn from_word(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "feat" | "feature" => Self::Feat,
      "fix" | "bugfix" => Self::Fix,
      "docs" | "doc" => Self::Docs,
      "style" => Self::Style,
      "refactor" => Self::Refactor,
      "perf" => Self::Perf,
      "test" | "tests" => Self::Test,
      "build" => Self::Build,
      "ci" => Self::Ci,
      "chore" => Self::Chore,
      "revert" => Self::Revert,
      _ => Self::Other,
    }
  }

  /// Feature or fix work, the commits that justify a release
  pub fn is_user_facing(&self) -> bool {
    matches!(self, Self::Feat | Self::Fix)
  }
}

impl ConventionalCommit {
  /// Parse the first line of a commit message
  ///
  /// Returns None when the header is not conventional; plenty of commits aren't.
  pub fn parse(message: &str) -> Option<Self> {
    let header = message.lines().next().unwrap_or("");

    let mut parser = (
      alphanumeric1::<_, ()>.map(CommitType::from_word),
      opt(preceded('(', terminated(take_till(1.., ')'), ')'))),
      opt('!'),
      ':',
      space0,
      rest,
    );

    let (commit_type, scope, bang, _, _, description) = parser.parse(header).ok()?;

    Some(Self {
      commit_type,
      scope: scope.map(|s: &str| s.trim().to_string()),
      breaking: bang.is_some(),
      description: description.trim().to_string(),
    })
  }

  pub fn is_user_facing(&self) -> bool {
    self.commit_type.is_user_facing()
  }
}

/// Release or version-bump chore, e.g. `chore(release): v1.2.0` or `bump version to 1.2.0`
pub fn is_release_chore(subject: &str) -> bool {
  let lowered = subject.trim().to_lowercase();
  if lowered.starts_with("bump version") {
    return true;
  }
  match ConventionalCommit::parse(&lowered) {
    Some(commit) if commit.commit_type == CommitType::Chore => {
      commit.scope.as_deref() == Some("release")
        || commit.description.starts_with("release")
        || commit.description.starts_with("bump version")
    }
    _ => false,
  }
}
