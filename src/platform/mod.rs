//! Hosted repository platform (work items and pull requests)
//!
//! The engines only rely on the narrow [`Platform`] interface: list, find, create and
//! close. [`GhCli`] implements it with the GitHub CLI.

pub mod gh;

pub use gh::GhCli;

use crate::core::error::ReleaseResult;
use chrono::NaiveDate;
use serde::Serialize;

/// A tracked work item (issue)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
  pub number: u64,
  pub title: String,
  pub labels: Vec<String>,
}

impl WorkItem {
  pub fn has_label(&self, name: &str) -> bool {
    self.labels.iter().any(|l| l.eq_ignore_ascii_case(name))
  }
}

/// Which closed work items feed the changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItemFilter {
  Milestone(String),
  ClosedSince(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
  Open,
  Closed,
  Merged,
}

/// State filter for pull request lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestQuery {
  Open,
  Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
  pub number: u64,
  pub title: String,
  pub head: String,
  pub base: String,
  pub state: PullRequestState,
  pub url: String,
}

/// Everything needed to open a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
  pub title: String,
  pub body: String,
  pub head: String,
  pub base: String,
  pub labels: Vec<String>,
}

/// Operations the release engines need from the hosted platform
pub trait Platform {
  fn list_closed_work_items(&self, filter: &WorkItemFilter) -> ReleaseResult<Vec<WorkItem>>;

  fn count_open_work_items(&self, milestone: &str) -> ReleaseResult<usize>;

  /// Most recent pull request from `head` (optionally into `base`)
  fn find_pull_request(
    &self,
    head: &str,
    base: Option<&str>,
    query: PullRequestQuery,
  ) -> ReleaseResult<Option<PullRequest>>;

  fn create_pull_request(&self, request: &NewPullRequest) -> ReleaseResult<PullRequest>;

  /// Close with an explanatory comment, optionally deleting the source branch
  fn close_pull_request(&self, number: u64, comment: &str, delete_branch: bool) -> ReleaseResult<()>;
}
