//! Isolated execution environment for lock regeneration and lint
//!
//! With a `[container]` section, commands run through `<engine> compose exec -T <service>`.
//! Without one, they run directly in the project directory.

use crate::core::config::ContainerSettings;
use crate::core::error::{ReleaseResult, ResultExt, Tool, ToolError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs commands for the release in a controlled environment
pub trait Sandbox {
  /// Human-readable description for progress output
  fn describe(&self) -> String;

  /// Run `argv` with `dir` (relative to the repository root) as working directory
  fn run(&self, dir: &Path, argv: &[&str]) -> ReleaseResult<String>;
}

/// `docker compose exec` (or podman) against a running service
pub struct ContainerSandbox {
  root: PathBuf,
  engine: String,
  service: String,
}

impl ContainerSandbox {
  pub fn new(root: &Path, settings: &ContainerSettings) -> Self {
    Self {
      root: root.to_path_buf(),
      engine: settings.engine.clone(),
      service: settings.service.clone(),
    }
  }

  /// Full command line handed to the container engine
  fn command_line(&self, dir: &Path, argv: &[&str]) -> Vec<String> {
    let mut line = vec![
      self.engine.clone(),
      "compose".to_string(),
      "exec".to_string(),
      "-T".to_string(),
      self.service.clone(),
    ];
    if is_root(dir) {
      line.extend(argv.iter().map(|a| a.to_string()));
    } else {
      // The container's working directory is the repository root
      line.extend([
        "sh".to_string(),
        "-c".to_string(),
        format!("cd '{}' && exec \"$@\"", dir.display()),
        "sh".to_string(),
      ]);
      line.extend(argv.iter().map(|a| a.to_string()));
    }
    line
  }
}

impl Sandbox for ContainerSandbox {
  fn describe(&self) -> String {
    format!("{} compose service '{}'", self.engine, self.service)
  }

  fn run(&self, dir: &Path, argv: &[&str]) -> ReleaseResult<String> {
    let line = self.command_line(dir, argv);
    run_command(Tool::Container, &self.root, &line)
  }
}

/// Runs on the host
pub struct LocalSandbox {
  root: PathBuf,
}

impl LocalSandbox {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
    }
  }
}

impl Sandbox for LocalSandbox {
  fn describe(&self) -> String {
    "local shell".to_string()
  }

  fn run(&self, dir: &Path, argv: &[&str]) -> ReleaseResult<String> {
    let line: Vec<String> = argv.iter().map(|a| a.to_string()).collect();
    run_command(Tool::Local, &self.root.join(dir), &line)
  }
}

fn is_root(dir: &Path) -> bool {
  dir.as_os_str().is_empty() || dir == Path::new(".")
}

fn run_command(tool: Tool, cwd: &Path, line: &[String]) -> ReleaseResult<String> {
  let rendered = line.join(" ");
  let Some((program, args)) = line.split_first() else {
    return Err(ToolError::new(tool, rendered, "empty command").into());
  };

  tracing::debug!(command = %rendered, cwd = %cwd.display(), "running sandboxed command");
  let output = Command::new(program)
    .args(args)
    .current_dir(cwd)
    .output()
    .with_context(|| format!("Failed to execute {}", rendered))?;

  if !output.status.success() {
    let mut stderr = String::from_utf8_lossy(&output.stderr).to_string();
    if stderr.trim().is_empty() {
      stderr = String::from_utf8_lossy(&output.stdout).to_string();
    }
    return Err(ToolError::new(tool, rendered, stderr).into());
  }
  Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Dependency availability
pub trait ToolProbe {
  fn is_available(&self, program: &str) -> bool;
}

/// Probes with `<program> --version`
pub struct SystemProbe;

impl ToolProbe for SystemProbe {
  fn is_available(&self, program: &str) -> bool {
    Command::new(program)
      .arg("--version")
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .status()
      .map(|s| s.success())
      .unwrap_or(false)
  }
}
