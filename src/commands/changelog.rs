//! Changelog command implementation
//!
//! Prints the generated entry without touching the repository.

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::changelog::ContentSource;
use crate::release::changelog::lint;
use crate::release::orchestrator;
use crate::release::preflight;
use crate::release::version::ReleaseVersion;

/// Run the changelog command
pub fn run_changelog(ctx: &ReleaseContext, version: &str, milestone: Option<String>) -> ReleaseResult<()> {
  let version = ReleaseVersion::parse(version)?;
  let (last_tag, commits) = preflight::history(ctx)?;
  tracing::debug!(last_tag = ?last_tag, "previewing changelog");

  let entry = orchestrator::compose_entry(ctx, &version, &ContentSource::Generated, milestone.as_deref(), &commits)?;
  print!("{}", entry);

  for problem in lint::check_entry(&entry) {
    eprintln!("⚠️  {}", problem);
  }
  Ok(())
}
