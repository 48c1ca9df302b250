//! Rollback command implementation

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::phase::ReleasePhase;
use crate::release::rollback;
use crate::release::version::ReleaseVersion;

/// Parse a `--phase` override: name or number 1-4
pub fn parse_phase(s: &str) -> Result<ReleasePhase, String> {
  match s.trim().to_lowercase().as_str() {
    "1" | "branch-created" | "branch" => Ok(ReleasePhase::BranchCreated),
    "2" | "pull-request-open" | "pr" => Ok(ReleasePhase::PullRequestOpen),
    "3" | "merged" => Ok(ReleasePhase::MergedToIntegrationBranch),
    "4" | "tagged" => Ok(ReleasePhase::TaggedAndReleased),
    other => Err(format!(
      "unknown phase '{}' (expected branch-created, pull-request-open, merged or tagged)",
      other
    )),
  }
}

/// Run the rollback command
pub fn run_rollback(ctx: &ReleaseContext, version: &str, phase: Option<ReleasePhase>) -> ReleaseResult<()> {
  let version = ReleaseVersion::parse(version)?;
  let summary = rollback::rollback(ctx, &version, phase)?;

  if ctx.mode.preview {
    println!("\n🔍 Dry-run mode (no changes applied)");
  } else if summary.executed.is_empty() {
    println!("\nℹ️  Nothing was changed");
  } else {
    println!("\n✅ Rolled back {}", ctx.settings().tag_name(&version));
  }
  Ok(())
}
