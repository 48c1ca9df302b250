//! Version-control collaborator
//!
//! The release engines only see the [`Vcs`] trait. [`SystemGit`] is the production
//! backend; tests substitute an in-memory double.

pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::ReleaseResult;
use std::path::PathBuf;

/// A commit as read from history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
  pub sha: String,
  pub subject: String,
  pub body: String,
  pub parent_count: usize,
}

impl CommitRecord {
  /// Merge commits have several parents; squash-merge tooling sometimes only leaves the subject
  pub fn is_merge(&self) -> bool {
    self.parent_count > 1 || self.subject.starts_with("Merge ")
  }

  /// Produced by `git revert`; mentions the reverted subject verbatim
  pub fn is_revert(&self) -> bool {
    self.subject.starts_with("Revert \"")
  }

  /// Subject and body joined as git stores them
  pub fn message(&self) -> String {
    if self.body.trim().is_empty() {
      self.subject.clone()
    } else {
      format!("{}\n\n{}", self.subject, self.body.trim_end())
    }
  }

  pub fn short_sha(&self) -> &str {
    &self.sha[..self.sha.len().min(8)]
  }
}

/// Local branch position relative to its remote counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingStatus {
  pub ahead: usize,
  pub behind: usize,
}

/// Operations the release engines need from version control
pub trait Vcs {
  fn current_branch(&self) -> ReleaseResult<String>;

  /// Paths with staged, unstaged or untracked changes
  fn uncommitted_paths(&self) -> ReleaseResult<Vec<String>>;

  fn is_tracked(&self, path: &str) -> ReleaseResult<bool>;

  /// Matched by an ignore rule (`.gitignore`, `info/exclude`, ...)
  fn is_ignored(&self, path: &str) -> ReleaseResult<bool>;

  fn fetch(&self, remote: &str) -> ReleaseResult<()>;

  /// Compare `branch` with `remote/branch`
  fn tracking_status(&self, branch: &str, remote: &str) -> ReleaseResult<TrackingStatus>;

  /// Tag present locally or on the remote
  fn tag_exists(&self, tag: &str, remote: &str) -> ReleaseResult<bool>;

  /// Local tags starting with `prefix`
  fn list_tags(&self, prefix: &str) -> ReleaseResult<Vec<String>>;

  /// Commits reachable from HEAD, newest first
  ///
  /// With `since`, only commits after that ref; otherwise the most recent `window` commits.
  fn commits_since(&self, since: Option<&str>, window: usize) -> ReleaseResult<Vec<CommitRecord>>;

  /// Newest commit on `branch` whose message mentions any of `patterns`
  ///
  /// A missing branch is not an error: it simply contains nothing.
  fn find_commit_on_branch(&self, branch: &str, patterns: &[String]) -> ReleaseResult<Option<CommitRecord>>;

  fn local_branch_exists(&self, branch: &str) -> ReleaseResult<bool>;

  fn remote_branch_exists(&self, branch: &str, remote: &str) -> ReleaseResult<bool>;

  fn create_and_checkout_branch(&self, branch: &str) -> ReleaseResult<()>;

  fn checkout_branch(&self, branch: &str) -> ReleaseResult<()>;

  /// Fast-forward only
  fn pull(&self, remote: &str, branch: &str) -> ReleaseResult<()>;

  fn delete_local_branch(&self, branch: &str) -> ReleaseResult<()>;

  fn delete_remote_branch(&self, branch: &str, remote: &str) -> ReleaseResult<()>;

  /// Push and set upstream
  fn push_branch(&self, branch: &str, remote: &str) -> ReleaseResult<()>;

  /// Stage and commit exactly `paths`; returns the new commit SHA
  fn commit_paths(&self, paths: &[PathBuf], message: &str) -> ReleaseResult<String>;

  /// New commit undoing `commit`; merges are reverted against their first parent
  fn revert_commit(&self, commit: &CommitRecord) -> ReleaseResult<()>;

  /// Discard working-tree changes to tracked `paths`
  fn restore_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()>;
}

/// True when `text` contains `pattern` not immediately followed by a digit
///
/// Keeps `v1.2.1` from matching inside `v1.2.10`.
pub fn mentions_exact(text: &str, pattern: &str) -> bool {
  if pattern.is_empty() {
    return false;
  }
  text.match_indices(pattern).any(|(at, _)| {
    !text[at + pattern.len()..]
      .chars()
      .next()
      .is_some_and(|c| c.is_ascii_digit())
  })
}
