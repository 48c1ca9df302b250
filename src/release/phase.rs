//! Phase detection
//!
//! Where a release sits is inferred from repository and platform state, checked in
//! a fixed precedence (first match wins):
//!
//! 1. release tag exists (locally or on the remote) -> `TaggedAndReleased`
//! 2. release commit on the integration branch       -> `MergedToIntegrationBranch`
//! 3. pull request from the release branch (any state) -> `PullRequestOpen`
//! 4. release branch exists locally or remotely       -> `BranchCreated`
//! 5. otherwise                                        -> `NotStarted`
//!
//! Detection only reads, so repeated calls without a state change agree.

use crate::core::config::ReleaseSettings;
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::vcs::CommitRecord;
use crate::platform::PullRequestQuery;
use crate::release::version::ReleaseVersion;
use serde::Serialize;
use std::fmt;

/// How far a release has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleasePhase {
  NotStarted,
  BranchCreated,
  PullRequestOpen,
  MergedToIntegrationBranch,
  TaggedAndReleased,
}

impl ReleasePhase {
  /// Phase number shown to operators (0 = not started)
  pub fn number(&self) -> u8 {
    match self {
      ReleasePhase::NotStarted => 0,
      ReleasePhase::BranchCreated => 1,
      ReleasePhase::PullRequestOpen => 2,
      ReleasePhase::MergedToIntegrationBranch => 3,
      ReleasePhase::TaggedAndReleased => 4,
    }
  }

  pub fn description(&self) -> &'static str {
    match self {
      ReleasePhase::NotStarted => "not started",
      ReleasePhase::BranchCreated => "release branch created",
      ReleasePhase::PullRequestOpen => "pull request opened",
      ReleasePhase::MergedToIntegrationBranch => "merged to integration branch",
      ReleasePhase::TaggedAndReleased => "tagged and released",
    }
  }
}

impl fmt::Display for ReleasePhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "phase {} ({})", self.number(), self.description())
  }
}

/// Text identifying the release commit: the release commit subject, or the
/// release branch name as it appears in merge commits
pub fn version_patterns(settings: &ReleaseSettings, version: &ReleaseVersion) -> Vec<String> {
  vec![
    settings.release_commit_subject(version),
    settings.release_branch(version),
  ]
}

/// Release commit on the integration branch, remote-tracking ref first
pub fn find_release_commit(ctx: &ReleaseContext, version: &ReleaseVersion) -> ReleaseResult<Option<CommitRecord>> {
  let settings = ctx.settings();
  let patterns = version_patterns(settings, version);
  let remote_ref = format!("{}/{}", settings.remote, settings.integration_branch);

  if let Some(commit) = ctx.vcs.find_commit_on_branch(&remote_ref, &patterns)? {
    return Ok(Some(commit));
  }
  ctx.vcs.find_commit_on_branch(&settings.integration_branch, &patterns)
}

/// Detect the phase of `version`
pub fn detect(ctx: &ReleaseContext, version: &ReleaseVersion) -> ReleaseResult<ReleasePhase> {
  let settings = ctx.settings();
  let tag = settings.tag_name(version);
  let branch = settings.release_branch(version);

  let phase = if ctx.vcs.tag_exists(&tag, &settings.remote)? {
    ReleasePhase::TaggedAndReleased
  } else if find_release_commit(ctx, version)?.is_some() {
    ReleasePhase::MergedToIntegrationBranch
  } else if ctx
    .platform
    .find_pull_request(&branch, None, PullRequestQuery::Any)?
    .is_some()
  {
    ReleasePhase::PullRequestOpen
  } else if ctx.vcs.local_branch_exists(&branch)? || ctx.vcs.remote_branch_exists(&branch, &settings.remote)? {
    ReleasePhase::BranchCreated
  } else {
    ReleasePhase::NotStarted
  };

  tracing::debug!(version = %version, %phase, "detected release phase");
  Ok(phase)
}
