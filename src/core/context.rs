//! Release context - build once, pass everywhere
//!
//! # Design
//!
//! `ReleaseContext` carries everything a release operation needs: repository root,
//! configuration, the selected project, run mode flags and the external
//! collaborators. It is built once in main.rs and passed by reference, so there is
//! no process-wide state and tests can swap every collaborator.
//!
//! ```text
//! main.rs:
//!   ReleaseContext::build() -> &ReleaseContext
//!   |
//!   v
//! commands/prepare.rs, rollback.rs, etc:
//!   fn run(ctx: &ReleaseContext, ...)
//! ```

use crate::core::config::{RailConfig, ReleaseSettings};
use crate::core::error::ReleaseResult;
use crate::core::sandbox::{ContainerSandbox, LocalSandbox, Sandbox, SystemProbe, ToolProbe};
use crate::core::vcs::{SystemGit, Vcs};
use crate::platform::{GhCli, Platform};
use crate::release::project::Project;
use crate::ui::{AutoPrompter, Prompter, SystemEditor, TerminalPrompter, TextEditor};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Mode flags for one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
  /// Report what would happen; mutate nothing
  pub preview: bool,
  /// Show generated content and commit messages
  pub verbose: bool,
  /// Accept every confirmation without asking
  pub auto_confirm: bool,
}

pub struct ReleaseContext {
  /// Repository root (absolute path)
  pub root: PathBuf,
  pub config: RailConfig,
  pub project: Project,
  pub mode: RunMode,
  /// Date stamped on changelog entries
  pub today: NaiveDate,
  pub vcs: Box<dyn Vcs>,
  pub platform: Box<dyn Platform>,
  pub sandbox: Box<dyn Sandbox>,
  pub prompter: Box<dyn Prompter>,
  pub editor: Box<dyn TextEditor>,
  pub probe: Box<dyn ToolProbe>,
}

impl ReleaseContext {
  /// Build the production context for the repository containing `cwd`
  pub fn build(cwd: &Path, project: Option<&str>, mode: RunMode) -> ReleaseResult<Self> {
    let git = SystemGit::open(cwd)?;
    let root = git.work_tree().to_path_buf();
    let config = RailConfig::load(&root)?;
    let project = config.resolve_project(&root, project)?;

    let sandbox: Box<dyn Sandbox> = match &config.container {
      Some(container) => Box::new(ContainerSandbox::new(&root, container)),
      None => Box::new(LocalSandbox::new(&root)),
    };
    let prompter: Box<dyn Prompter> = if mode.auto_confirm {
      Box::new(AutoPrompter)
    } else {
      Box::new(TerminalPrompter)
    };

    tracing::debug!(
      root = %root.display(),
      project = %project.name,
      kind = ?project.kind,
      preview = mode.preview,
      "built release context"
    );

    Ok(Self {
      platform: Box::new(GhCli::new(&root, project.repo.clone())),
      vcs: Box::new(git),
      sandbox,
      prompter,
      editor: Box::new(SystemEditor),
      probe: Box::new(SystemProbe),
      today: chrono::Local::now().date_naive(),
      root,
      config,
      project,
      mode,
    })
  }

  pub fn settings(&self) -> &ReleaseSettings {
    &self.config.release
  }

  /// Ask the operator; preview mode never blocks and answers yes
  pub fn confirm(&self, question: &str) -> ReleaseResult<bool> {
    if self.mode.preview {
      return Ok(true);
    }
    self.prompter.confirm(question)
  }

  /// Changelog path relative to the root
  pub fn changelog_path(&self) -> &Path {
    &self.config.release.changelog
  }
}
