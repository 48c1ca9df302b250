//! Phase command implementation

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::phase::{self, ReleasePhase};
use crate::release::version::ReleaseVersion;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PhaseReport {
  version: String,
  tag: String,
  phase: ReleasePhase,
  number: u8,
  description: &'static str,
}

/// Run the phase command
pub fn run_phase(ctx: &ReleaseContext, version: &str, json: bool) -> ReleaseResult<()> {
  let version = ReleaseVersion::parse(version)?;
  ctx.vcs.fetch(&ctx.settings().remote)?;
  let detected = phase::detect(ctx, &version)?;

  let report = PhaseReport {
    version: version.to_string(),
    tag: ctx.settings().tag_name(&version),
    phase: detected,
    number: detected.number(),
    description: detected.description(),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    println!("📍 {}: {}", report.tag, detected);
  }
  Ok(())
}
