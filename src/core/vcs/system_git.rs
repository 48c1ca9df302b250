//! System git backend
//!
//! Every operation is one `git` subprocess with an isolated environment. Output
//! parsing lives in `system_git_ops` so it can be tested without a repository.

use super::system_git_ops::{LOG_FORMAT, parse_left_right, parse_log_records, parse_porcelain};
use super::{CommitRecord, TrackingStatus, Vcs, mentions_exact};
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, Tool, ToolError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Environment variables passed through to git
const PASSTHROUGH_ENV: &[&str] = &["PATH", "HOME", "XDG_CONFIG_HOME", "SSH_AUTH_SOCK", "GIT_SSH_COMMAND"];

/// Git backend using the system `git` binary
pub struct SystemGit {
  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the repository containing `path`
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::with_help(
          format!("{} is not inside a git repository", path.display()),
          "Run release-rail from the repository you want to release.",
        ));
      }
      return Err(ToolError::new(Tool::Git, "git rev-parse --show-toplevel", stderr).into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(Self {
      work_tree: PathBuf::from(stdout.trim()),
    })
  }

  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Create a git command with isolated environment
  ///
  /// - Sets working directory to the work tree
  /// - Clears environment variables except [`PASSTHROUGH_ENV`]
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(&self.work_tree);

    cmd.env_clear();
    for key in PASSTHROUGH_ENV {
      if let Ok(value) = std::env::var(key) {
        cmd.env(key, value);
      }
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }

  fn output(&self, args: &[&str]) -> ReleaseResult<Output> {
    tracing::debug!(command = %format!("git {}", args.join(" ")), "running git");
    self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))
  }

  /// Run git and return stdout, or a tool error carrying stderr
  fn run(&self, args: &[&str]) -> ReleaseResult<String> {
    let output = self.output(args)?;
    if !output.status.success() {
      return Err(
        ToolError::new(
          Tool::Git,
          format!("git {}", args.join(" ")),
          String::from_utf8_lossy(&output.stderr),
        )
        .into(),
      );
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  /// Run git and report only whether it succeeded
  fn succeeds(&self, args: &[&str]) -> ReleaseResult<bool> {
    Ok(self.output(args)?.status.success())
  }

  fn ref_exists(&self, reference: &str) -> ReleaseResult<bool> {
    self.succeeds(&["rev-parse", "--verify", "--quiet", reference])
  }

  fn head_sha(&self) -> ReleaseResult<String> {
    Ok(self.run(&["rev-parse", "HEAD"])?.trim().to_string())
  }
}

fn path_args(paths: &[PathBuf]) -> Vec<String> {
  paths.iter().map(|p| p.to_string_lossy().to_string()).collect()
}

impl Vcs for SystemGit {
  fn current_branch(&self) -> ReleaseResult<String> {
    let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(branch.trim().to_string())
  }

  fn uncommitted_paths(&self) -> ReleaseResult<Vec<String>> {
    let status = self.run(&["status", "--porcelain=v1", "--untracked-files=all"])?;
    Ok(parse_porcelain(&status))
  }

  fn is_tracked(&self, path: &str) -> ReleaseResult<bool> {
    self.succeeds(&["ls-files", "--error-unmatch", "--", path])
  }

  fn is_ignored(&self, path: &str) -> ReleaseResult<bool> {
    self.succeeds(&["check-ignore", "--quiet", "--", path])
  }

  fn fetch(&self, remote: &str) -> ReleaseResult<()> {
    self.run(&["fetch", "--quiet", "--tags", remote])?;
    Ok(())
  }

  fn tracking_status(&self, branch: &str, remote: &str) -> ReleaseResult<TrackingStatus> {
    let range = format!("{}...{}/{}", branch, remote, branch);
    let counts = self.run(&["rev-list", "--left-right", "--count", &range])?;
    parse_left_right(&counts).ok_or_else(|| ReleaseError::message(format!("Unexpected rev-list output: {}", counts)))
  }

  fn tag_exists(&self, tag: &str, remote: &str) -> ReleaseResult<bool> {
    if self.ref_exists(&format!("refs/tags/{}", tag))? {
      return Ok(true);
    }
    let remote_tags = self.run(&["ls-remote", "--tags", remote, &format!("refs/tags/{}", tag)])?;
    Ok(!remote_tags.trim().is_empty())
  }

  fn list_tags(&self, prefix: &str) -> ReleaseResult<Vec<String>> {
    let tags = self.run(&["tag", "--list", &format!("{}*", prefix)])?;
    Ok(tags.lines().map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect())
  }

  fn commits_since(&self, since: Option<&str>, window: usize) -> ReleaseResult<Vec<CommitRecord>> {
    let format = format!("--format={}", LOG_FORMAT);
    let log = match since {
      Some(since) => self.run(&["log", &format, &format!("{}..HEAD", since)])?,
      None => self.run(&["log", &format, &format!("--max-count={}", window), "HEAD"])?,
    };
    Ok(parse_log_records(&log))
  }

  fn find_commit_on_branch(&self, branch: &str, patterns: &[String]) -> ReleaseResult<Option<CommitRecord>> {
    if patterns.is_empty() || !self.ref_exists(branch)? {
      return Ok(None);
    }

    let format = format!("--format={}", LOG_FORMAT);
    let mut args = vec!["log".to_string(), format, "--fixed-strings".to_string()];
    args.extend(patterns.iter().map(|p| format!("--grep={}", p)));
    args.push(branch.to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let log = self.run(&args)?;
    Ok(
      parse_log_records(&log)
        .into_iter()
        .find(|commit| !commit.is_revert() && patterns.iter().any(|p| mentions_exact(&commit.message(), p))),
    )
  }

  fn local_branch_exists(&self, branch: &str) -> ReleaseResult<bool> {
    self.ref_exists(&format!("refs/heads/{}", branch))
  }

  fn remote_branch_exists(&self, branch: &str, remote: &str) -> ReleaseResult<bool> {
    let heads = self.run(&["ls-remote", "--heads", remote, &format!("refs/heads/{}", branch)])?;
    Ok(!heads.trim().is_empty())
  }

  fn create_and_checkout_branch(&self, branch: &str) -> ReleaseResult<()> {
    self.run(&["checkout", "-b", branch])?;
    Ok(())
  }

  fn checkout_branch(&self, branch: &str) -> ReleaseResult<()> {
    self.run(&["checkout", branch])?;
    Ok(())
  }

  fn pull(&self, remote: &str, branch: &str) -> ReleaseResult<()> {
    self.run(&["pull", "--ff-only", remote, branch])?;
    Ok(())
  }

  fn delete_local_branch(&self, branch: &str) -> ReleaseResult<()> {
    self.run(&["branch", "-D", branch])?;
    Ok(())
  }

  fn delete_remote_branch(&self, branch: &str, remote: &str) -> ReleaseResult<()> {
    self.run(&["push", remote, "--delete", branch])?;
    Ok(())
  }

  fn push_branch(&self, branch: &str, remote: &str) -> ReleaseResult<()> {
    self.run(&["push", "-u", remote, branch])?;
    Ok(())
  }

  fn commit_paths(&self, paths: &[PathBuf], message: &str) -> ReleaseResult<String> {
    let paths = path_args(paths);

    let mut add = vec!["add", "--"];
    add.extend(paths.iter().map(String::as_str));
    self.run(&add)?;

    let mut commit = vec!["commit", "--quiet", "-m", message, "--"];
    commit.extend(paths.iter().map(String::as_str));
    self.run(&commit)?;

    self.head_sha()
  }

  fn revert_commit(&self, commit: &CommitRecord) -> ReleaseResult<()> {
    if commit.parent_count > 1 {
      self.run(&["revert", "--no-edit", "-m", "1", &commit.sha])?;
    } else {
      self.run(&["revert", "--no-edit", &commit.sha])?;
    }
    Ok(())
  }

  fn restore_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    if paths.is_empty() {
      return Ok(());
    }
    let paths = path_args(paths);
    let mut args = vec!["checkout", "HEAD", "--"];
    args.extend(paths.iter().map(String::as_str));
    self.run(&args)?;
    Ok(())
  }
}
