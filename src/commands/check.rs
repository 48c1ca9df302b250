//! Check command implementation (preflight only)

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::preflight;

/// Run the check command
pub fn run_check(ctx: &ReleaseContext, version: &str, milestone: Option<String>) -> ReleaseResult<()> {
  let report = preflight::run(ctx, version, milestone.as_deref())?;

  println!();
  println!("✅ Ready to prepare {}", ctx.settings().tag_name(&report.target));
  match &report.last_tag {
    Some(tag) => println!("   {} commit(s) since {}", report.commits.len(), tag),
    None => println!("   {} commit(s), no previous release tag", report.commits.len()),
  }
  Ok(())
}
