//! Integration tests for release-rail
//!
//! Each test builds a throwaway repository with a bare `origin` and runs the real
//! binary against it. `gh` and `cargo` are replaced by recording stubs.

#![cfg(unix)]

mod helpers;
mod test_check;
mod test_prepare;
mod test_rollback;
