//! Preflight through the check command

use crate::helpers::{TestRepo, git, stderr};
use anyhow::Result;

#[test]
fn test_check_passes_on_clean_synced_branch() -> Result<()> {
  let repo = TestRepo::new()?;
  let out = repo.run_ok(&["check", "1.3.0"])?;
  assert!(out.contains("Ready to prepare v1.3.0"), "stdout: {}", out);
  assert!(out.contains("2 commit(s) since v1.2.0"));
  Ok(())
}

#[test]
fn test_check_rejects_skipped_version() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = repo.run(&["check", "1.4.0"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("1.3.0"), "stderr: {}", stderr(&output));
  Ok(())
}

#[test]
fn test_check_rejects_bad_format() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = repo.run(&["check", "1.3"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("Invalid version format"));
  Ok(())
}

#[test]
fn test_check_rejects_dirty_tree() -> Result<()> {
  let repo = TestRepo::new()?;
  std::fs::write(repo.path.join("README.md"), "# widget\n\nlocal edit\n")?;

  let output = repo.run(&["check", "1.3.0"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("uncommitted"));
  Ok(())
}

#[test]
fn test_check_rejects_unpushed_commits() -> Result<()> {
  let repo = TestRepo::new()?;
  std::fs::write(repo.path.join("NOTES.md"), "notes\n")?;
  repo.commit("docs: notes")?;

  let output = repo.run(&["check", "1.3.0"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("ahead"), "stderr: {}", stderr(&output));
  Ok(())
}

#[test]
fn test_check_rejects_wrong_branch() -> Result<()> {
  let repo = TestRepo::new()?;
  git(&repo.path, &["checkout", "--quiet", "-b", "feature/x"])?;

  let output = repo.run(&["check", "1.3.0"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("feature/x"));
  Ok(())
}
