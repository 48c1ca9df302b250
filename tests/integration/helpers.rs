//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const CARGO_TOML: &str = r#"[package]
name = "widget"
version = "1.2.0"
edition = "2024"
"#;

const CARGO_LOCK: &str = r#"# This file is automatically @generated by Cargo.
# It is not intended for manual editing.
version = 4

[[package]]
name = "widget"
version = "1.2.0"
"#;

const CHANGELOG: &str = r#"# Changelog

## [Unreleased]

## [1.2.0] - 2025-02-01

### Added

- **Initial widget** (#1)
"#;

/// Records every call; `gh pr create` answers with a pull request URL
const GH_STUB: &str = r#"#!/bin/sh
here=$(dirname "$0")
echo "$*" >> "$here/gh.log"
case "$1 $2" in
  "--version "*) echo "gh version 2.60.0 (stub)" ;;
  "issue list") echo "[]" ;;
  "pr list") if [ -f "$here/prs.json" ]; then cat "$here/prs.json"; else echo "[]"; fi ;;
  "pr create") echo "https://github.com/acme/widget/pull/42" ;;
esac
exit 0
"#;

/// Records every call; fails the subcommand named in cargo.fail
const CARGO_STUB: &str = r#"#!/bin/sh
here=$(dirname "$0")
echo "$*" >> "$here/cargo.log"
if [ -f "$here/cargo.fail" ] && [ "$1" = "$(cat "$here/cargo.fail")" ]; then
  echo "error: failed to update lock file (stub)" >&2
  exit 101
fi
if [ "$1" = "--version" ]; then
  echo "cargo 1.91.0 (stub)"
fi
exit 0
"#;

/// A Cargo project on `development` with a bare `origin`, released once as v1.2.0,
/// plus stub `gh` and `cargo` programs ahead of the real ones on PATH
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
  pub origin: PathBuf,
  pub stubs: PathBuf,
}

impl TestRepo {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("work");
    let origin = root.path().join("origin.git");
    let stubs = root.path().join("bin");

    git(root.path(), &["init", "--quiet", "--bare", "--initial-branch=development", "origin.git"])?;
    git(root.path(), &["init", "--quiet", "--initial-branch=development", "work"])?;
    for (key, value) in [
      ("user.name", "Test User"),
      ("user.email", "test@example.com"),
      ("commit.gpgsign", "false"),
      ("tag.gpgsign", "false"),
    ] {
      git(&path, &["config", key, value])?;
    }

    std::fs::write(path.join("Cargo.toml"), CARGO_TOML)?;
    std::fs::write(path.join("Cargo.lock"), CARGO_LOCK)?;
    std::fs::write(path.join("CHANGELOG.md"), CHANGELOG)?;
    std::fs::write(path.join("README.md"), "# widget\n")?;

    let repo = Self {
      _root: root,
      path,
      origin,
      stubs,
    };
    repo.commit("feat: initial widget")?;
    git(&repo.path, &["tag", "v1.2.0"])?;

    std::fs::write(repo.path.join("README.md"), "# widget\n\nGizmos included.\n")?;
    repo.commit("feat: add gizmo (#12)")?;
    std::fs::write(repo.path.join("README.md"), "# widget\n\nGizmos included.\nEmpty input is fine.\n")?;
    repo.commit("fix: handle empty input")?;

    let origin = repo.origin.to_string_lossy().to_string();
    git(&repo.path, &["remote", "add", "origin", &origin])?;
    git(&repo.path, &["push", "--quiet", "-u", "origin", "development"])?;
    git(&repo.path, &["push", "--quiet", "origin", "--tags"])?;

    std::fs::create_dir_all(&repo.stubs)?;
    write_script(&repo.stubs.join("gh"), GH_STUB)?;
    write_script(&repo.stubs.join("cargo"), CARGO_STUB)?;

    Ok(repo)
  }

  /// Stage everything and commit
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "--quiet", "-m", message])?;
    self.git_stdout(&["rev-parse", "HEAD"])
  }

  /// Commit and push to `development`, keeping the branch level with origin
  pub fn commit_and_push(&self, message: &str) -> Result<()> {
    self.commit(message)?;
    git(&self.path, &["push", "--quiet", "origin", "development"])?;
    Ok(())
  }

  /// Stop tracking Cargo.lock and ignore it, leaving the file on disk
  pub fn ignore_lock(&self) -> Result<()> {
    std::fs::write(self.path.join(".gitignore"), "Cargo.lock\n")?;
    git(&self.path, &["rm", "--quiet", "--cached", "Cargo.lock"])?;
    self.commit_and_push("chore: stop tracking Cargo.lock")
  }

  /// Files changed by the commit at HEAD
  pub fn head_files(&self) -> Result<Vec<String>> {
    let listed = self.git_stdout(&["show", "--name-only", "--format=", "HEAD"])?;
    Ok(listed.lines().map(str::to_string).collect())
  }

  /// Run release-rail in the work tree; failures are returned, not raised
  pub fn run(&self, args: &[&str]) -> Result<Output> {
    let path = format!(
      "{}:{}",
      self.stubs.display(),
      std::env::var("PATH").unwrap_or_default()
    );
    Command::new(env!("CARGO_BIN_EXE_release-rail"))
      .current_dir(&self.path)
      .args(args)
      .env("PATH", path)
      .env_remove("RELEASE_RAIL_LOG")
      .stdin(Stdio::null())
      .output()
      .context("Failed to run release-rail")
  }

  /// Run release-rail and require success
  pub fn run_ok(&self, args: &[&str]) -> Result<String> {
    let output = self.run(args)?;
    if !output.status.success() {
      anyhow::bail!(
        "release-rail {} failed\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
      );
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  pub fn git_stdout(&self, args: &[&str]) -> Result<String> {
    let output = git(&self.path, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn current_branch(&self) -> Result<String> {
    self.git_stdout(&["rev-parse", "--abbrev-ref", "HEAD"])
  }

  pub fn local_branch_exists(&self, branch: &str) -> Result<bool> {
    Ok(!self.git_stdout(&["branch", "--list", branch])?.is_empty())
  }

  pub fn origin_branch_exists(&self, branch: &str) -> Result<bool> {
    let output = git(&self.origin, &["branch", "--list", branch])?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Calls recorded by the `gh` stub
  pub fn gh_log(&self) -> String {
    std::fs::read_to_string(self.stubs.join("gh.log")).unwrap_or_default()
  }

  /// Calls recorded by the `cargo` stub
  pub fn cargo_log(&self) -> String {
    std::fs::read_to_string(self.stubs.join("cargo.log")).unwrap_or_default()
  }

  /// Make the `cargo` stub fail for `subcommand`
  pub fn fail_cargo(&self, subcommand: &str) -> Result<()> {
    std::fs::write(self.stubs.join("cargo.fail"), subcommand)?;
    Ok(())
  }

  /// JSON returned by `gh pr list`
  pub fn set_pull_requests(&self, json: &str) -> Result<()> {
    std::fs::write(self.stubs.join("prs.json"), json)?;
    Ok(())
  }
}

fn write_script(path: &Path, content: &str) -> Result<()> {
  std::fs::write(path, content)?;
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
  Ok(())
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
