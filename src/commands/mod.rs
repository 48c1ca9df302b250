//! CLI commands for release-rail
//!
//! ## Forward path
//! - **prepare**: preflight, then version bump, lock, changelog, branch, commit, push, pull request
//! - **check**: preflight only
//! - **changelog**: print the entry prepare would insert
//!
//! ## Recovery path
//! - **phase**: detect how far a release has progressed
//! - **rollback**: apply the compensation for the detected phase
//!
//! All commands accept `&ReleaseContext`, built once in main.rs.

pub mod changelog;
pub mod check;
pub mod phase;
pub mod prepare;
pub mod rollback;

pub use changelog::run_changelog;
pub use check::run_check;
pub use phase::run_phase;
pub use prepare::run_prepare;
pub use rollback::run_rollback;
