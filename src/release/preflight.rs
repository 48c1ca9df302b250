//! Preflight validation
//!
//! Checks run in order and the first failure aborts; nothing has been mutated yet.
//! Two checks only warn and ask the operator: no feature/fix commits since the last
//! tag, and open work items left in the milestone.

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseResult, ValidationError};
use crate::core::vcs::CommitRecord;
use crate::release::changelog::commit::ConventionalCommit;
use crate::release::version::{self, Comparison, ReleaseVersion};

/// Facts established by a successful preflight
#[derive(Debug, Clone)]
pub struct PreflightReport {
  pub current: ReleaseVersion,
  pub target: ReleaseVersion,
  pub last_tag: Option<String>,
  /// Commits since `last_tag`, newest first
  pub commits: Vec<CommitRecord>,
}

/// Run every check for releasing `requested`
pub fn run(ctx: &ReleaseContext, requested: &str, milestone: Option<&str>) -> ReleaseResult<PreflightReport> {
  println!("🔍 Preflight checks for {}", ctx.project.name);

  check_tools(ctx)?;
  check_clean_tree(ctx)?;
  check_branch(ctx)?;
  let (current, target) = check_version(ctx, requested)?;
  let (last_tag, commits) = check_history(ctx)?;
  if let Some(milestone) = milestone {
    check_milestone(ctx, milestone)?;
  }

  println!("   ✅ Preflight passed: {} -> {}", current, target);
  Ok(PreflightReport {
    current,
    target,
    last_tag,
    commits,
  })
}

/// Programs this run shells out to
fn required_tools(ctx: &ReleaseContext) -> Vec<(String, &'static str)> {
  let mut tools = vec![
    ("git".to_string(), "version control"),
    ("gh".to_string(), "pull requests and work items"),
  ];
  match &ctx.config.container {
    Some(container) => tools.push((container.engine.clone(), "isolated lock regeneration")),
    None => {
      if let Some(program) = ctx.project.kind.lock_regenerate().first() {
        tools.push((program.to_string(), "lock regeneration"));
      }
    }
  }
  tools
}

fn check_tools(ctx: &ReleaseContext) -> ReleaseResult<()> {
  for (tool, purpose) in required_tools(ctx) {
    if !ctx.probe.is_available(&tool) {
      return Err(
        ValidationError::MissingTool {
          tool,
          purpose: purpose.to_string(),
        }
        .into(),
      );
    }
  }
  println!("   ✅ Required tools available");
  Ok(())
}

fn check_clean_tree(ctx: &ReleaseContext) -> ReleaseResult<()> {
  let paths = ctx.vcs.uncommitted_paths()?;
  if !paths.is_empty() {
    return Err(ValidationError::DirtyWorkingTree { paths }.into());
  }
  println!("   ✅ Working tree clean");
  Ok(())
}

fn check_branch(ctx: &ReleaseContext) -> ReleaseResult<()> {
  let settings = ctx.settings();
  let branch = ctx.vcs.current_branch()?;
  if branch != settings.integration_branch {
    return Err(
      ValidationError::WrongBranch {
        expected: settings.integration_branch.clone(),
        actual: branch,
      }
      .into(),
    );
  }

  ctx.vcs.fetch(&settings.remote)?;
  let status = ctx.vcs.tracking_status(&branch, &settings.remote)?;
  let remote = settings.remote.clone();
  match (status.ahead, status.behind) {
    (0, 0) => {}
    (ahead, behind) if ahead > 0 && behind > 0 => {
      return Err(
        ValidationError::BranchDiverged {
          branch,
          remote,
          ahead,
          behind,
        }
        .into(),
      );
    }
    (ahead, 0) => return Err(ValidationError::BranchAhead { branch, remote, count: ahead }.into()),
    (_, behind) => return Err(ValidationError::BranchBehind { branch, remote, count: behind }.into()),
  }

  println!("   ✅ On {} and in sync with {}", branch, settings.remote);
  Ok(())
}

/// Format, ordering, increment rule and tag uniqueness
pub fn check_version(ctx: &ReleaseContext, requested: &str) -> ReleaseResult<(ReleaseVersion, ReleaseVersion)> {
  if !version::validate_format(requested) {
    return Err(
      ValidationError::InvalidVersionFormat {
        input: requested.to_string(),
      }
      .into(),
    );
  }
  let target = ReleaseVersion::parse(requested)?;
  let current = ctx.project.current_version(&ctx.root)?;

  if version::compare(&target, &current) == Comparison::NotGreater {
    return Err(
      ValidationError::VersionNotGreater {
        requested: target.to_string(),
        current: current.to_string(),
      }
      .into(),
    );
  }
  version::validate_increment(&target, &current)?;

  let tag = ctx.settings().tag_name(&target);
  if ctx.vcs.tag_exists(&tag, &ctx.settings().remote)? {
    return Err(ValidationError::TagExists { tag }.into());
  }

  println!("   ✅ Version {} -> {} is a valid increment", current, target);
  Ok((current, target))
}

/// Highest plain `X.Y.Z` release tag carrying the configured prefix
pub fn latest_release_tag(tags: &[String], prefix: &str) -> Option<String> {
  tags
    .iter()
    .filter_map(|tag| {
      let parsed = semver::Version::parse(tag.strip_prefix(prefix)?).ok()?;
      parsed.pre.is_empty().then_some((parsed, tag))
    })
    .max_by(|a, b| a.0.cmp(&b.0))
    .map(|(_, tag)| tag.clone())
}

/// Last release tag and the commits made since
pub fn history(ctx: &ReleaseContext) -> ReleaseResult<(Option<String>, Vec<CommitRecord>)> {
  let prefix = &ctx.settings().tag_prefix;
  let last_tag = latest_release_tag(&ctx.vcs.list_tags(prefix)?, prefix);
  let commits = ctx
    .vcs
    .commits_since(last_tag.as_deref(), ctx.config.changelog.history_window)?;
  tracing::debug!(last_tag = ?last_tag, commits = commits.len(), "read release history");
  Ok((last_tag, commits))
}

fn check_history(ctx: &ReleaseContext) -> ReleaseResult<(Option<String>, Vec<CommitRecord>)> {
  let (last_tag, commits) = history(ctx)?;

  if let Some(tag) = &last_tag
    && commits.is_empty()
  {
    return Err(ValidationError::NoCommitsSinceTag { tag: tag.clone() }.into());
  }

  let user_facing = commits
    .iter()
    .filter(|c| !c.is_merge())
    .filter_map(|c| ConventionalCommit::parse(&c.subject))
    .any(|c| c.is_user_facing());

  if !user_facing {
    let since = last_tag.as_deref().unwrap_or("the start of history");
    println!("   ⚠️  No feat/fix commits since {}", since);
    if !ctx.confirm("Release anyway?")? {
      return Err(
        ValidationError::Declined {
          what: "no feature or fix commits to release".to_string(),
        }
        .into(),
      );
    }
  }

  println!("   ✅ {} commit(s) to release", commits.len());
  Ok((last_tag, commits))
}

fn check_milestone(ctx: &ReleaseContext, milestone: &str) -> ReleaseResult<()> {
  let open = ctx.platform.count_open_work_items(milestone)?;
  if open > 0 {
    println!("   ⚠️  Milestone '{}' still has {} open work item(s)", milestone, open);
    if !ctx.confirm("Release with open work items?")? {
      return Err(
        ValidationError::Declined {
          what: format!("milestone '{}' has open work items", milestone),
        }
        .into(),
      );
    }
  } else {
    println!("   ✅ Milestone '{}' has no open work items", milestone);
  }
  Ok(())
}
