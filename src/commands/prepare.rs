//! Prepare command implementation

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::changelog::SourceRequest;
use crate::release::orchestrator;

/// Run the prepare command
pub fn run_prepare(
  ctx: &ReleaseContext,
  version: Option<String>,
  milestone: Option<String>,
  source: SourceRequest,
) -> ReleaseResult<()> {
  let requested = match version {
    Some(v) => v,
    None => choose_version(ctx)?,
  };

  let outcome = orchestrator::prepare(ctx, &requested, milestone.as_deref(), &source)?;
  let tag = ctx.settings().tag_name(&outcome.version);

  match outcome.pull_request {
    Some(pr) => {
      println!("\n🎉 {} is ready for review", tag);
      println!("   {}", pr.url);
      println!();
      println!("💡 Next steps:");
      println!("   Merge the pull request into {}", ctx.settings().integration_branch);
      println!("   Undo with `release-rail rollback {}`", outcome.version);
    }
    None => {
      println!("\n🔍 Dry-run complete for {} (no changes applied)", tag);
    }
  }
  Ok(())
}

/// Offer the three legal next versions plus a custom one
pub fn choose_version(ctx: &ReleaseContext) -> ReleaseResult<String> {
  let current = ctx.project.current_version(&ctx.root)?;
  let candidates = current.legal_next();

  let mut options: Vec<String> = candidates
    .iter()
    .map(|(bump, next)| format!("{} ({})", next, bump.name()))
    .collect();
  options.push("custom".to_string());

  println!("📦 {} is at {}", ctx.project.name, current);
  let choice = ctx.prompter.select("Release version", &options)?;
  match candidates.get(choice) {
    Some((_, next)) => Ok(next.to_string()),
    None => Ok(ctx.prompter.input("Version (X.Y.Z)")?.trim().to_string()),
  }
}
