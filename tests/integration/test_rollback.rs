//! Recovery path: rollback by phase

use crate::helpers::{TestRepo, git, stderr};
use anyhow::Result;

#[test]
fn test_rollback_after_prepare_removes_branches() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.run_ok(&["prepare", "1.3.0", "--yes"])?;

  let out = repo.run_ok(&["rollback", "1.3.0", "--yes"])?;
  assert!(out.contains("Rolled back v1.3.0"), "stdout: {}", out);

  assert_eq!(repo.current_branch()?, "development");
  assert!(!repo.local_branch_exists("release/v1.3.0")?);
  assert!(!repo.origin_branch_exists("release/v1.3.0")?);
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.0\""));

  let phase = repo.run_ok(&["phase", "1.3.0", "--json"])?;
  assert!(phase.contains("\"not-started\""));
  Ok(())
}

#[test]
fn test_rollback_dry_run_keeps_branches() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.run_ok(&["prepare", "1.3.0", "--yes"])?;

  let out = repo.run_ok(&["rollback", "1.3.0", "--yes", "--dry-run"])?;
  assert!(out.contains("Would"), "stdout: {}", out);
  assert!(repo.local_branch_exists("release/v1.3.0")?);
  assert!(repo.origin_branch_exists("release/v1.3.0")?);
  Ok(())
}

#[test]
fn test_rollback_closes_open_pull_request() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.run_ok(&["prepare", "1.3.0", "--yes"])?;
  repo.set_pull_requests(
    r#"[{"number": 42, "title": "chore(release): v1.3.0", "headRefName": "release/v1.3.0",
      "baseRefName": "development", "state": "OPEN", "url": "https://github.com/acme/widget/pull/42"}]"#,
  )?;

  let phase = repo.run_ok(&["phase", "1.3.0", "--json"])?;
  assert!(phase.contains("\"pull-request-open\""), "phase: {}", phase);

  repo.run_ok(&["rollback", "1.3.0", "--yes"])?;
  let gh = repo.gh_log();
  assert!(gh.contains("pr close 42"), "gh log: {}", gh);
  assert!(gh.contains("--delete-branch"));
  assert_eq!(repo.current_branch()?, "development");
  assert!(!repo.local_branch_exists("release/v1.3.0")?);
  Ok(())
}

#[test]
fn test_rollback_of_unstarted_release_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = repo.run(&["rollback", "1.3.0", "--yes"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("nothing to roll back"));
  Ok(())
}

#[test]
fn test_rollback_reverts_merged_release_commit() -> Result<()> {
  let repo = TestRepo::new()?;
  let manifest = repo.read_file("Cargo.toml")?.replace("1.2.0", "1.3.0");
  std::fs::write(repo.path.join("Cargo.toml"), manifest)?;
  repo.commit("chore(release): v1.3.0")?;
  git(&repo.path, &["push", "--quiet", "origin", "development"])?;

  repo.run_ok(&["rollback", "1.3.0", "--yes"])?;

  let subject = repo.git_stdout(&["log", "-1", "--format=%s"])?;
  assert!(subject.starts_with("Revert \"chore(release): v1.3.0\""), "subject: {}", subject);
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.0\""));

  // The revert reached the remote integration branch
  let remote_head = git(&repo.origin, &["log", "-1", "--format=%s", "development"])?;
  assert!(String::from_utf8_lossy(&remote_head.stdout).starts_with("Revert "));
  Ok(())
}

#[test]
fn test_rollback_refuses_tagged_release() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = repo.run(&["rollback", "1.2.0", "--yes"])?;
  assert_eq!(output.status.code(), Some(1));

  let err = stderr(&output);
  assert!(err.contains("never deleted"), "stderr: {}", err);
  assert!(err.contains("release-rail prepare 1.2.1"));
  assert!(!repo.git_stdout(&["tag", "--list", "v1.2.0"])?.is_empty());
  Ok(())
}
