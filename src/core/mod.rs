//! Core building blocks shared by every command
//!
//! - **config**: release-rail.toml parsing and validation
//! - **context**: run context built once per invocation
//! - **error**: error types with contextual help messages and exit codes
//! - **sandbox**: isolated command execution (container or host)
//! - **vcs**: git operations abstraction (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod sandbox;
pub mod vcs;
