//! Forward path: prepare end to end

use crate::helpers::{TestRepo, stderr, stdout};
use anyhow::Result;

#[test]
fn test_prepare_opens_release_pull_request() -> Result<()> {
  let repo = TestRepo::new()?;

  let out = repo.run_ok(&["prepare", "1.3.0", "--yes"])?;
  assert!(out.contains("Opened pull request #42"), "stdout: {}", out);

  assert_eq!(repo.current_branch()?, "release/v1.3.0");
  assert!(repo.origin_branch_exists("release/v1.3.0")?);
  assert_eq!(repo.git_stdout(&["log", "-1", "--format=%s"])?, "chore(release): v1.3.0");
  assert!(repo.git_stdout(&["status", "--porcelain"])?.is_empty());

  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.3.0\""));
  let changelog = repo.read_file("CHANGELOG.md")?;
  assert!(changelog.contains("## [1.3.0] - "));
  assert!(changelog.contains("- fix: handle empty input"));
  // New entry sits between Unreleased and the previous release
  let unreleased = changelog.find("## [Unreleased]").unwrap();
  let new = changelog.find("## [1.3.0]").unwrap();
  let old = changelog.find("## [1.2.0]").unwrap();
  assert!(unreleased < new && new < old);

  let gh = repo.gh_log();
  assert!(gh.contains("pr create"));
  assert!(gh.contains("--label automated-release"));
  assert!(gh.contains("--base development"));

  let cargo = repo.cargo_log();
  assert!(cargo.contains("update --workspace"));
  assert!(cargo.contains("metadata --locked"));
  Ok(())
}

#[test]
fn test_prepare_with_manual_changelog_text() -> Result<()> {
  let repo = TestRepo::new()?;

  repo.run_ok(&[
    "prepare",
    "1.3.0",
    "--yes",
    "--changelog-text",
    "### Fixed\n\n- Empty input no longer panics",
  ])?;

  let changelog = repo.read_file("CHANGELOG.md")?;
  assert!(changelog.contains("## [1.3.0] - "));
  assert!(changelog.contains("- Empty input no longer panics"));
  assert!(!changelog.contains("- fix: handle empty input"));
  Ok(())
}

#[test]
fn test_dry_run_changes_nothing() -> Result<()> {
  let repo = TestRepo::new()?;

  let out = repo.run_ok(&["prepare", "1.3.0", "--yes", "--dry-run"])?;
  assert!(out.contains("Would create branch release/v1.3.0"), "stdout: {}", out);
  assert!(out.contains("+version = \"1.3.0\""));

  assert_eq!(repo.current_branch()?, "development");
  assert!(!repo.local_branch_exists("release/v1.3.0")?);
  assert!(!repo.origin_branch_exists("release/v1.3.0")?);
  assert!(repo.git_stdout(&["status", "--porcelain"])?.is_empty());
  assert!(!repo.gh_log().contains("pr create"));
  assert!(!repo.cargo_log().contains("update"));
  Ok(())
}

#[test]
fn test_lock_failure_restores_release_files() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fail_cargo("update")?;

  let output = repo.run(&["prepare", "1.3.0", "--yes"])?;
  assert_eq!(output.status.code(), Some(2), "stdout: {}", stdout(&output));
  assert!(stderr(&output).contains("regenerate lock"), "stderr: {}", stderr(&output));

  assert_eq!(repo.current_branch()?, "development");
  assert!(!repo.local_branch_exists("release/v1.3.0")?);
  assert!(repo.git_stdout(&["status", "--porcelain"])?.is_empty());
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.0\""));
  Ok(())
}

#[test]
fn test_prepare_refuses_existing_changelog_section() -> Result<()> {
  let repo = TestRepo::new()?;
  let changelog = repo.read_file("CHANGELOG.md")?.replace(
    "## [1.2.0]",
    "## [1.3.0] - 2025-02-15\n\n### Fixed\n\n- Early notes\n\n## [1.2.0]",
  );
  std::fs::write(repo.path.join("CHANGELOG.md"), changelog)?;
  repo.commit_and_push("docs: draft notes")?;

  let output = repo.run(&["prepare", "1.3.0", "--yes"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("already contains a section for 1.3.0"));
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.0\""));
  Ok(())
}

#[test]
fn test_prepare_rejects_heading_for_another_version() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = repo.run(&[
    "prepare",
    "1.3.0",
    "--yes",
    "--changelog-text",
    "## [9.9.9] - 2025-03-02\n\n### Fixed\n\n- Wrong release",
  ])?;
  assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
  assert!(stderr(&output).contains("[9.9.9]"), "stderr: {}", stderr(&output));

  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.0\""));
  assert!(!repo.read_file("CHANGELOG.md")?.contains("9.9.9"));
  assert!(repo.git_stdout(&["status", "--porcelain"])?.is_empty());
  assert!(!repo.cargo_log().contains("update"));
  Ok(())
}

#[test]
fn test_prepare_with_ignored_lock() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.ignore_lock()?;

  repo.run_ok(&["prepare", "1.3.0", "--yes"])?;

  assert_eq!(repo.current_branch()?, "release/v1.3.0");
  assert!(repo.origin_branch_exists("release/v1.3.0")?);
  let files = repo.head_files()?;
  assert!(files.contains(&"Cargo.toml".to_string()), "files: {:?}", files);
  assert!(files.contains(&"CHANGELOG.md".to_string()), "files: {:?}", files);
  assert!(!files.contains(&"Cargo.lock".to_string()), "files: {:?}", files);
  assert!(repo.path.join("Cargo.lock").exists());
  Ok(())
}

#[test]
fn test_lock_failure_keeps_ignored_lock() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.ignore_lock()?;
  let lock_before = repo.read_file("Cargo.lock")?;
  repo.fail_cargo("update")?;

  let output = repo.run(&["prepare", "1.3.0", "--yes"])?;
  assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));

  assert_eq!(repo.read_file("Cargo.lock")?, lock_before);
  assert_eq!(repo.current_branch()?, "development");
  assert!(repo.git_stdout(&["status", "--porcelain"])?.is_empty());
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.0\""));
  Ok(())
}

#[test]
fn test_prepare_without_lock() -> Result<()> {
  let repo = TestRepo::new()?;
  crate::helpers::git(&repo.path, &["rm", "--quiet", "Cargo.lock"])?;
  repo.commit_and_push("chore: drop Cargo.lock")?;

  repo.run_ok(&["prepare", "1.3.0", "--yes"])?;

  let files = repo.head_files()?;
  assert_eq!(files, vec!["CHANGELOG.md".to_string(), "Cargo.toml".to_string()]);
  assert!(!repo.path.join("Cargo.lock").exists());
  Ok(())
}
