//! Phase-aware rollback
//!
//! Each phase has exactly one compensation:
//!
//! | Phase | Action |
//! |-------|--------|
//! | 1 branch created | delete the local and remote release branch |
//! | 2 pull request open | close the pull request and delete its branch (else phase 1) |
//! | 3 merged | revert the release commit on the integration branch and push; close a pending promotion pull request |
//! | 4 tagged | nothing; tags and published releases are never deleted |
//!
//! Every destructive step asks first. Declining skips that step. Absent branches are
//! skipped as well, so rollback can be re-run until it reports nothing left to do.

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult, ValidationError};
use crate::platform::PullRequestQuery;
use crate::release::phase::{self, ReleasePhase};
use crate::release::version::{ReleaseVersion, VersionBump};
use serde::Serialize;

/// What a rollback run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackSummary {
  pub executed: Vec<String>,
  pub skipped: Vec<String>,
}

impl RollbackSummary {
  fn print(&self) {
    println!("\n📋 Rollback summary");
    if self.executed.is_empty() && self.skipped.is_empty() {
      println!("   Nothing to do");
    }
    for action in &self.executed {
      println!("   ✅ {}", action);
    }
    for action in &self.skipped {
      println!("   ⏭️  {}", action);
    }
  }
}

/// Runs one compensation step behind a confirmation
struct Steps<'a> {
  ctx: &'a ReleaseContext,
  summary: RollbackSummary,
}

impl<'a> Steps<'a> {
  /// True when the action ran; preview mode and a declined prompt skip it
  fn act<F>(&mut self, action: String, f: F) -> ReleaseResult<bool>
  where
    F: FnOnce() -> ReleaseResult<()>,
  {
    if self.ctx.mode.preview {
      println!("   Would {}", action);
      self.summary.skipped.push(format!("{} (dry-run)", action));
      return Ok(false);
    }
    if !self.ctx.confirm(&format!("{}?", capitalize(&action)))? {
      println!("   ⏭️  Skipped: {}", action);
      tracing::warn!(action = %action, "compensation declined");
      self.summary.skipped.push(format!("{} (declined)", action));
      return Ok(false);
    }
    f()?;
    println!("   ✅ {}", capitalize(&action));
    tracing::info!(action = %action, "compensation executed");
    self.summary.executed.push(action);
    Ok(true)
  }

  fn absent(&mut self, what: String) {
    println!("   ℹ️  {} not found, nothing to delete", capitalize(&what));
    self.summary.skipped.push(format!("{} already absent", what));
  }
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Resolve which phase to roll back, asking when an override disagrees with the repository
pub fn resolve_phase(
  ctx: &ReleaseContext,
  version: &ReleaseVersion,
  requested: Option<ReleasePhase>,
) -> ReleaseResult<ReleasePhase> {
  let detected = phase::detect(ctx, version)?;
  println!("🔍 Detected {} for {}", detected, ctx.settings().tag_name(version));

  match requested {
    Some(requested) if requested != detected => {
      println!(
        "   ⚠️  Requested {} but the repository is at {}",
        requested, detected
      );
      if !ctx.confirm(&format!("Roll back as {} anyway?", requested))? {
        return Err(
          ValidationError::Declined {
            what: format!("requested {} does not match detected {}", requested, detected),
          }
          .into(),
        );
      }
      Ok(requested)
    }
    Some(requested) => Ok(requested),
    None => Ok(detected),
  }
}

/// Roll back `version` from its detected (or overridden) phase
pub fn rollback(
  ctx: &ReleaseContext,
  version: &ReleaseVersion,
  requested: Option<ReleasePhase>,
) -> ReleaseResult<RollbackSummary> {
  ctx.vcs.fetch(&ctx.settings().remote)?;
  let phase = resolve_phase(ctx, version, requested)?;

  let mut steps = Steps {
    ctx,
    summary: RollbackSummary::default(),
  };

  match phase {
    ReleasePhase::NotStarted => {
      return Err(
        ValidationError::NothingToRollBack {
          version: version.to_string(),
        }
        .into(),
      );
    }
    ReleasePhase::BranchCreated => roll_back_branch(&mut steps, version)?,
    ReleasePhase::PullRequestOpen => roll_back_pull_request(&mut steps, version)?,
    ReleasePhase::MergedToIntegrationBranch => roll_back_merge(&mut steps, version)?,
    ReleasePhase::TaggedAndReleased => return Err(forward_fix(ctx, version)),
  }

  steps.summary.print();
  Ok(steps.summary)
}

/// Phase 1: the release branch, locally then on the remote
fn roll_back_branch(steps: &mut Steps<'_>, version: &ReleaseVersion) -> ReleaseResult<()> {
  roll_back_local_branch(steps, version)?;

  let ctx = steps.ctx;
  let settings = ctx.settings();
  let branch = settings.release_branch(version);
  if ctx.vcs.remote_branch_exists(&branch, &settings.remote)? {
    steps.act(format!("delete remote branch {}/{}", settings.remote, branch), || {
      ctx.vcs.delete_remote_branch(&branch, &settings.remote)
    })?;
  } else {
    steps.absent(format!("remote branch {}/{}", settings.remote, branch));
  }
  Ok(())
}

fn roll_back_local_branch(steps: &mut Steps<'_>, version: &ReleaseVersion) -> ReleaseResult<()> {
  let ctx = steps.ctx;
  let settings = ctx.settings();
  let branch = settings.release_branch(version);

  if !ctx.vcs.local_branch_exists(&branch)? {
    steps.absent(format!("local branch {}", branch));
    return Ok(());
  }

  steps.act(format!("delete local branch {}", branch), || {
    // git refuses to delete the checked-out branch
    if ctx.vcs.current_branch()? == branch {
      ctx.vcs.checkout_branch(&settings.integration_branch)?;
    }
    ctx.vcs.delete_local_branch(&branch)
  })?;
  Ok(())
}

/// Phase 2: close the pull request, which also removes its branch
fn roll_back_pull_request(steps: &mut Steps<'_>, version: &ReleaseVersion) -> ReleaseResult<()> {
  let ctx = steps.ctx;
  let settings = ctx.settings();
  let branch = settings.release_branch(version);

  let Some(pr) = ctx.platform.find_pull_request(&branch, None, PullRequestQuery::Open)? else {
    println!("   ℹ️  No open pull request from {}, rolling back the branch", branch);
    return roll_back_branch(steps, version);
  };

  let comment = format!(
    "Release {} was rolled back with release-rail; closing without merging.",
    settings.tag_name(version)
  );
  steps.act(
    format!("close pull request #{} and delete {}", pr.number, branch),
    || ctx.platform.close_pull_request(pr.number, &comment, true),
  )?;

  roll_back_local_branch(steps, version)
}

/// Phase 3: revert the release commit on the integration branch
fn roll_back_merge(steps: &mut Steps<'_>, version: &ReleaseVersion) -> ReleaseResult<()> {
  let ctx = steps.ctx;
  let settings = ctx.settings();
  let tag = settings.tag_name(version);

  let Some(commit) = phase::find_release_commit(ctx, version)? else {
    return Err(ReleaseError::ManualIntervention {
      reason: format!(
        "the release commit for {} was not found on {}",
        tag, settings.integration_branch
      ),
      guidance: vec![
        format!(
          "Find it with `git log --oneline {}/{} --grep '{}'`",
          settings.remote, settings.integration_branch, tag
        ),
        "Then revert it by hand with `git revert <sha>` (add `-m 1` for a merge commit) and push.".to_string(),
      ],
    });
  };
  println!("   Found release commit {} {}", commit.short_sha(), commit.subject);

  let reverted = steps.act(
    format!("revert {} on {}", commit.short_sha(), settings.integration_branch),
    || {
      ctx.vcs.checkout_branch(&settings.integration_branch)?;
      ctx.vcs.pull(&settings.remote, &settings.integration_branch)?;
      ctx.vcs.revert_commit(&commit)
    },
  )?;

  if reverted || ctx.mode.preview {
    steps.act(
      format!("push {} to {}", settings.integration_branch, settings.remote),
      || ctx.vcs.push_branch(&settings.integration_branch, &settings.remote),
    )?;
  }

  // A promotion already opened toward the final branch would ship the release anyway
  if let Some(pr) = ctx.platform.find_pull_request(
    &settings.integration_branch,
    Some(&settings.final_branch),
    PullRequestQuery::Open,
  )? {
    let comment = format!(
      "Release {} was reverted on {} with release-rail; closing this promotion.",
      tag, settings.integration_branch
    );
    steps.act(
      format!("close pull request #{} into {}", pr.number, settings.final_branch),
      || ctx.platform.close_pull_request(pr.number, &comment, false),
    )?;
  }
  Ok(())
}

/// Phase 4 refuses: published tags stay, the fix goes forward
fn forward_fix(ctx: &ReleaseContext, version: &ReleaseVersion) -> ReleaseError {
  let settings = ctx.settings();
  let tag = settings.tag_name(version);
  let next = VersionBump::Patch.apply(version);
  tracing::warn!(tag = %tag, "refusing to roll back a tagged release");

  ReleaseError::ManualIntervention {
    reason: format!(
      "{} is tagged and released; tags and published releases are never deleted",
      tag
    ),
    guidance: vec![
      format!("Fix forward: land the fix on {} and run `release-rail prepare {}`.", settings.integration_branch, next),
      format!(
        "Or revert the offending change on {} and cut a new version from the revert.",
        settings.final_branch
      ),
    ],
  }
}
