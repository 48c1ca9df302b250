//! Forward path: prepare a release
//!
//! preflight -> version file -> lock artifact -> changelog -> branch -> commit -> push
//! -> pull request. Each step runs only if the previous one succeeded; a failure is
//! wrapped as a [`MutationStep`] error and the [`CleanupGuard`] undoes what was done.

use crate::core::context::ReleaseContext;
use crate::core::error::{MutationStep, ReleaseError, ReleaseResult, ResultExt, Tool, ToolError, ValidationError};
use crate::core::vcs::CommitRecord;
use crate::platform::{NewPullRequest, PullRequest, WorkItemFilter};
use crate::release::changelog::source::{self, ContentSource, SourceRequest};
use crate::release::changelog::{self, document, lint};
use crate::release::cleanup::{CleanupGuard, Compensation};
use crate::release::preflight::{self, PreflightReport};
use crate::release::version::ReleaseVersion;
use chrono::Duration;
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};

/// Header written when the project has no changelog yet
const NEW_CHANGELOG: &str = "# Changelog\n\nAll notable changes to this project are documented in this file.\n\n## [Unreleased]\n";

/// Result of a prepare run
#[derive(Debug, Clone)]
pub struct PrepareOutcome {
  pub version: ReleaseVersion,
  pub branch: String,
  /// None in preview mode
  pub pull_request: Option<PullRequest>,
}

/// Changelog entry text for `version`, from the operator or generated
pub fn compose_entry(
  ctx: &ReleaseContext,
  version: &ReleaseVersion,
  content: &ContentSource,
  milestone: Option<&str>,
  commits: &[CommitRecord],
) -> ReleaseResult<String> {
  if let Some(manual) = source::manual_content(content, ctx.editor.as_ref(), version, ctx.today)? {
    return Ok(source::with_heading(&manual, version, ctx.today)?);
  }

  let filter = match milestone {
    Some(m) => WorkItemFilter::Milestone(m.to_string()),
    None => WorkItemFilter::ClosedSince(ctx.today - Duration::days(i64::from(ctx.config.changelog.lookback_days))),
  };
  let items = ctx
    .platform
    .list_closed_work_items(&filter)
    .context("Could not fetch closed work items for the changelog")?;

  let entry = changelog::generate(
    version,
    ctx.today,
    &items,
    commits,
    ctx.config.changelog.max_commits_per_item,
  );
  Ok(entry.render())
}

/// Release commit message: structured subject, files in the body
pub fn commit_message(ctx: &ReleaseContext, version: &ReleaseVersion, files: &[PathBuf]) -> String {
  let listed: Vec<String> = files.iter().map(|f| format!("- {}", f.display())).collect();
  format!(
    "{}\n\nRelease {} of {}.\n\nFiles:\n{}\n",
    ctx.settings().release_commit_subject(version),
    ctx.settings().tag_name(version),
    ctx.project.name,
    listed.join("\n")
  )
}

fn pull_request_body(ctx: &ReleaseContext, version: &ReleaseVersion, entry: &str) -> String {
  format!(
    "{}\n\n---\n\nOpened by release-rail for {}. Merge into `{}`; the release is tagged from `{}`.\n",
    entry.trim_end(),
    ctx.settings().tag_name(version),
    ctx.settings().integration_branch,
    ctx.settings().final_branch
  )
}

fn read_changelog(ctx: &ReleaseContext) -> ReleaseResult<String> {
  let path = ctx.root.join(ctx.changelog_path());
  if path.exists() {
    Ok(fs::read_to_string(&path)?)
  } else {
    Ok(NEW_CHANGELOG.to_string())
  }
}

fn print_diff(name: &str, before: &str, after: &str) {
  let diff = TextDiff::from_lines(before, after);
  print!(
    "{}",
    diff
      .unified_diff()
      .context_radius(3)
      .header(&format!("a/{}", name), &format!("b/{}", name))
  );
}

/// Prepare `requested` for release
pub fn prepare(
  ctx: &ReleaseContext,
  requested: &str,
  milestone: Option<&str>,
  request: &SourceRequest,
) -> ReleaseResult<PrepareOutcome> {
  // Operator changes present before this run must survive a failed run
  let pre_dirty = ctx.vcs.uncommitted_paths()?;
  let content = request.resolve(&ctx.root)?;

  let report = preflight::run(ctx, requested, milestone)?;
  let version = report.target;
  let branch = ctx.settings().release_branch(&version);
  ensure_changelog_free(ctx, &version)?;

  // Composed up front so operator content is checked before anything changes
  println!("   📝 Changelog from {}", content.describe());
  let entry = compose_entry(ctx, &version, &content, milestone, &report.commits)?;

  if ctx.mode.preview {
    preview(ctx, &report, &entry)?;
    return Ok(PrepareOutcome {
      version,
      branch,
      pull_request: None,
    });
  }

  let version_file = ctx.project.version_path();
  let lock_file = ctx.project.lock_path();
  let changelog_file = ctx.changelog_path().to_path_buf();
  let release_files = vec![version_file.clone(), lock_file.clone(), changelog_file.clone()];

  let mut guard = CleanupGuard::new(ctx.vcs.as_ref(), &ctx.root, release_files.clone(), pre_dirty);
  guard.mark_mutation_started()?;

  println!("\n📦 Preparing {} {}", ctx.project.name, ctx.settings().tag_name(&version));

  ctx
    .project
    .write_version(&ctx.root, &version)
    .during(MutationStep::UpdateVersion)?;
  println!("   ✅ {} -> {}", version_file.display(), version);

  println!("   🔒 Regenerating {} in {}", lock_file.display(), ctx.sandbox.describe());
  ctx
    .sandbox
    .run(&ctx.project.path, ctx.project.kind.lock_regenerate())
    .during(MutationStep::RegenerateLock)?;
  ctx
    .sandbox
    .run(&ctx.project.path, ctx.project.kind.lock_verify())
    .during(MutationStep::RegenerateLock)?;
  println!("   ✅ {} regenerated and verified", lock_file.display());

  let entry = write_changelog(ctx, &version, &entry).during(MutationStep::WriteChangelog)?;
  println!("   ✅ {} updated", changelog_file.display());
  if ctx.mode.verbose {
    println!("\n{}", entry);
  }

  let prior_branch = ctx.vcs.current_branch().during(MutationStep::CreateBranch)?;
  ctx
    .vcs
    .create_and_checkout_branch(&branch)
    .during(MutationStep::CreateBranch)?;
  let owned = guard.owned_files();
  guard.register(Compensation::RestoreFiles(owned));
  guard.register(Compensation::CheckoutBranch(prior_branch));
  guard.register(Compensation::DeleteLocalBranch(branch.clone()));
  println!("   ✅ Created branch {}", branch);

  // Lock artifacts are optional for some ecosystems, and libraries often ignore them
  let mut commit_files = Vec::new();
  for file in release_files {
    let ignored = ctx.vcs.is_ignored(&file.to_string_lossy()).during(MutationStep::Commit)?;
    if ctx.root.join(&file).exists() && !ignored {
      commit_files.push(file);
    }
  }
  let message = commit_message(ctx, &version, &commit_files);
  if ctx.mode.verbose {
    println!("\n{}", message);
  }
  let sha = ctx
    .vcs
    .commit_paths(&commit_files, &message)
    .during(MutationStep::Commit)?;
  println!("   ✅ Committed {}", &sha[..sha.len().min(8)]);

  let remote = ctx.settings().remote.clone();
  ctx.vcs.push_branch(&branch, &remote).during(MutationStep::Push)?;
  guard.register(Compensation::DeleteRemoteBranch {
    branch: branch.clone(),
    remote: remote.clone(),
  });
  println!("   ✅ Pushed {}/{}", remote, branch);

  let pull_request = ctx
    .platform
    .create_pull_request(&NewPullRequest {
      title: ctx.settings().release_commit_subject(&version),
      body: pull_request_body(ctx, &version, &entry),
      head: branch.clone(),
      base: ctx.settings().integration_branch.clone(),
      labels: vec![ctx.settings().automation_label.clone()],
    })
    .during(MutationStep::OpenPullRequest)?;
  println!("   ✅ Opened pull request #{}: {}", pull_request.number, pull_request.url);

  guard.disarm();
  tracing::info!(version = %version, branch = %branch, pr = pull_request.number, "release prepared");

  Ok(PrepareOutcome {
    version,
    branch,
    pull_request: Some(pull_request),
  })
}

/// Validate, insert and lint the changelog entry; returns the entry as written
fn write_changelog(ctx: &ReleaseContext, version: &ReleaseVersion, entry: &str) -> ReleaseResult<String> {
  lint::validate_entry(entry)?;

  let before = read_changelog(ctx)?;
  let after = document::insert_entry(&before, entry, version)?;
  fs::write(ctx.root.join(ctx.changelog_path()), &after)?;

  if let Some(command) = &ctx.config.changelog.lint_command {
    let argv: Vec<&str> = command.iter().map(String::as_str).collect();
    ctx.sandbox.run(Path::new("."), &argv).map_err(|e| match e {
      ReleaseError::Tool(failed) => ToolError::new(Tool::Lint, failed.command, failed.stderr).into(),
      other => other,
    })?;
    println!("   ✅ {} passed", command.join(" "));
  }

  // The lint command may have reformatted the section
  let written = read_changelog(ctx)?;
  Ok(document::extract_section(&written, version).unwrap_or_else(|| entry.to_string()))
}

/// Show what prepare would do; reads only
fn preview(ctx: &ReleaseContext, report: &PreflightReport, entry: &str) -> ReleaseResult<()> {
  let version = report.target;
  let branch = ctx.settings().release_branch(&version);
  println!("\n🔍 Dry-run: preparing {}", ctx.settings().tag_name(&version));

  let (before, after) = ctx.project.render_version_update(&ctx.root, &version)?;
  print_diff(&ctx.project.version_path().display().to_string(), &before, &after);

  println!(
    "   Would regenerate {} with `{}` in {}",
    ctx.project.lock_path().display(),
    ctx.project.kind.lock_regenerate().join(" "),
    ctx.sandbox.describe()
  );

  if let Err(problems) = lint::validate_entry(entry) {
    println!("   ⚠️  {}", problems);
  }
  let before = read_changelog(ctx)?;
  let after = document::insert_entry(&before, entry, &version).map_err(ReleaseError::from)?;
  print_diff(&ctx.changelog_path().display().to_string(), &before, &after);

  println!("   Would create branch {}", branch);
  println!("   Would commit: {}", ctx.settings().release_commit_subject(&version));
  println!("   Would push {} to {}", branch, ctx.settings().remote);
  println!(
    "   Would open a pull request into {} labeled '{}'",
    ctx.settings().integration_branch,
    ctx.settings().automation_label
  );
  Ok(())
}

/// Reject a version that the changelog already covers
fn ensure_changelog_free(ctx: &ReleaseContext, version: &ReleaseVersion) -> ReleaseResult<()> {
  let document = read_changelog(ctx)?;
  if document::released_versions(&document).contains(version) {
    return Err(
      ValidationError::ChangelogVersionExists {
        version: version.to_string(),
      }
      .into(),
    );
  }
  Ok(())
}
