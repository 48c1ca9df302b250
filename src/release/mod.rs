//! Release lifecycle
//!
//! A release moves through four observable phases: release branch, pull request,
//! merge into the integration branch, tag. Nothing about the phase is stored; it is
//! recomputed from repository and platform state each time.
//!
//! # Forward path
//!
//! [`preflight`] validates, then [`orchestrator`] mutates step by step with a
//! [`cleanup::CleanupGuard`] ready to undo whatever was done when a step fails.
//!
//! # Recovery path
//!
//! [`phase`] detects the phase and [`rollback`] applies the one compensation valid
//! for it. Tagged releases are never undone; the fix goes forward as a new version.

pub mod changelog;
pub mod cleanup;
pub mod orchestrator;
pub mod phase;
pub mod preflight;
pub mod project;
pub mod rollback;
pub mod version;
