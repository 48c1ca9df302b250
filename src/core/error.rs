//! Error types for release-rail with contextual messages and exit codes
//!
//! Errors fall into four families:
//!
//! - **Validation**: preflight, version format/increment, milestone checks. Raised before
//!   anything is mutated, so no compensation is needed.
//! - **Tool**: a collaborator call (`git`, `gh`, container engine, editor, lint) failed.
//!   Carries a diagnostic recipe: what to inspect and which command to re-run by hand.
//! - **Mutation**: a forward-path step failed. Wraps the underlying error and triggers
//!   the scoped compensation in [`crate::release::cleanup`].
//! - **ManualIntervention**: the rollback engine refuses to act and prints guidance.
//!
//! Every error renders a help line through [`print_error`].

use crate::release::version::IncrementError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for release-rail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, refused rollback)
  User = 1,
  /// System error (git, gh, container, I/O, failed mutation)
  System = 2,
  /// Validation failure (preflight, version rules)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-rail
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration errors
  Config(ConfigError),

  /// Validation errors (abort before mutation)
  Validation(ValidationError),

  /// External collaborator failures
  Tool(ToolError),

  /// A forward-path step failed after mutation began
  Mutation {
    step: MutationStep,
    source: Box<ReleaseError>,
  },

  /// Rollback cannot proceed automatically
  ManualIntervention { reason: String, guidance: Vec<String> },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Wrap an error as the failure of a forward-path step
  pub fn mutation(step: MutationStep, source: ReleaseError) -> Self {
    ReleaseError::Mutation {
      step,
      source: Box::new(source),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Validation(_) => ExitCode::Validation,
      ReleaseError::Tool(_) => ExitCode::System,
      ReleaseError::Mutation { .. } => ExitCode::System,
      ReleaseError::ManualIntervention { .. } => ExitCode::User,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Validation(e) => e.help_message(),
      ReleaseError::Tool(e) => Some(e.help_message()),
      ReleaseError::Mutation { step, source } => source.help_message().or_else(|| Some(step.help_message())),
      ReleaseError::ManualIntervention { guidance, .. } => {
        if guidance.is_empty() {
          None
        } else {
          Some(guidance.join("\n   "))
        }
      }
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Validation(e) => write!(f, "{}", e),
      ReleaseError::Tool(e) => write!(f, "{}", e),
      ReleaseError::Mutation { step, source } => write!(f, "Release step '{}' failed: {}", step, source),
      ReleaseError::ManualIntervention { reason, .. } => write!(f, "Manual intervention required: {}", reason),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      ReleaseError::Mutation { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<ValidationError> for ReleaseError {
  fn from(err: ValidationError) -> Self {
    ReleaseError::Validation(err)
  }
}

impl From<ToolError> for ReleaseError {
  fn from(err: ToolError) -> Self {
    ReleaseError::Tool(err)
  }
}

impl From<IncrementError> for ReleaseError {
  fn from(err: IncrementError) -> Self {
    ReleaseError::Validation(ValidationError::Increment(err))
  }
}

impl From<toml_edit::TomlError> for ReleaseError {
  fn from(err: toml_edit::TomlError) -> Self {
    ReleaseError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ReleaseError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ReleaseError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but is invalid
  Invalid { path: PathBuf, reason: String },

  /// Requested project is not configured
  ProjectNotFound { name: String, available: Vec<String> },

  /// Several projects configured and none selected
  ProjectRequired { available: Vec<String> },

  /// No config and no recognizable manifest at the root
  NoManifest { root: PathBuf },

  /// Version file missing or unreadable
  VersionFile { path: PathBuf, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { path, .. } => Some(format!("Fix {} and re-run.", path.display())),
      ConfigError::ProjectNotFound { available, .. } | ConfigError::ProjectRequired { available } => Some(format!(
        "Pass one of the configured projects with --project: {}",
        available.join(", ")
      )),
      ConfigError::NoManifest { .. } => Some(
        "Add a [[projects]] entry to release-rail.toml, or run from a directory with Cargo.toml, package.json or pyproject.toml."
          .to_string(),
      ),
      ConfigError::VersionFile { path, .. } => Some(format!(
        "Make sure {} exists and carries a plain X.Y.Z version field.",
        path.display()
      )),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => write!(f, "Invalid configuration in {}: {}", path.display(), reason),
      ConfigError::ProjectNotFound { name, .. } => write!(f, "Project '{}' not found in configuration", name),
      ConfigError::ProjectRequired { .. } => write!(f, "Several projects are configured; choose one"),
      ConfigError::NoManifest { root } => write!(f, "No project manifest found in {}", root.display()),
      ConfigError::VersionFile { path, reason } => {
        write!(f, "Cannot read version from {}: {}", path.display(), reason)
      }
    }
  }
}

/// Validation errors, raised before any mutation
#[derive(Debug)]
pub enum ValidationError {
  /// Not of the form X.Y.Z
  InvalidVersionFormat { input: String },

  /// Requested version does not exceed the current one
  VersionNotGreater { requested: String, current: String },

  /// Requested version is greater but not a canonical bump
  Increment(IncrementError),

  /// Uncommitted local changes
  DirtyWorkingTree { paths: Vec<String> },

  /// Not on the branch releases are cut from
  WrongBranch { expected: String, actual: String },

  /// Local branch has commits the remote lacks
  BranchAhead { branch: String, remote: String, count: usize },

  /// Remote branch has commits the local branch lacks
  BranchBehind { branch: String, remote: String, count: usize },

  /// Both sides have unique commits
  BranchDiverged {
    branch: String,
    remote: String,
    ahead: usize,
    behind: usize,
  },

  /// A release tag for the requested version already exists
  TagExists { tag: String },

  /// No commits since the last release tag
  NoCommitsSinceTag { tag: String },

  /// Required command-line tool missing
  MissingTool { tool: String, purpose: String },

  /// Rollback requested but nothing has been started
  NothingToRollBack { version: String },

  /// Operator declined a confirmable warning
  Declined { what: String },

  /// No version given and prompting is not possible
  VersionRequired,

  /// Custom changelog content source is unusable
  ChangelogSource { path: PathBuf, reason: String },

  /// Changelog already has a section for this version
  ChangelogVersionExists { version: String },

  /// Operator content carries its own heading for another version
  ChangelogHeadingMismatch { expected: String, found: String },

  /// Generated entry failed structural validation
  ChangelogStructure { problems: Vec<String> },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::InvalidVersionFormat { .. } => {
        Some("Versions are three non-negative integers separated by dots, e.g. 1.4.0".to_string())
      }
      ValidationError::VersionNotGreater { current, .. } => Some(format!(
        "Pick a version greater than {}. Run `release-rail prepare` without a version to choose interactively.",
        current
      )),
      ValidationError::Increment(e) => Some(format!(
        "Use one of {} or run `release-rail prepare` without a version to choose interactively.",
        e.options.join(", ")
      )),
      ValidationError::DirtyWorkingTree { .. } => {
        Some("Commit or stash your changes (`git stash -u`) before preparing a release.".to_string())
      }
      ValidationError::WrongBranch { expected, .. } => Some(format!("Switch with `git checkout {}`.", expected)),
      ValidationError::BranchAhead { branch, remote, .. } => {
        Some(format!("Push your commits first: `git push {} {}`.", remote, branch))
      }
      ValidationError::BranchBehind { branch, remote, .. } => {
        Some(format!("Update first: `git pull --ff-only {} {}`.", remote, branch))
      }
      ValidationError::BranchDiverged { branch, remote, .. } => Some(format!(
        "Reconcile the branches (`git pull --rebase {} {}`) and push before releasing.",
        remote, branch
      )),
      ValidationError::TagExists { tag } => Some(format!(
        "{} is already released. Choose the next version, or inspect with `git show {}`.",
        tag, tag
      )),
      ValidationError::NoCommitsSinceTag { tag } => {
        Some(format!("Nothing to release since {}. Merge changes first.", tag))
      }
      ValidationError::MissingTool { tool, .. } => Some(format!("Install `{}` and make sure it is on PATH.", tool)),
      ValidationError::NothingToRollBack { .. } => Some(
        "No branch, pull request, merge or tag was found for this version. Check the version number, or pass --phase to force a phase."
          .to_string(),
      ),
      ValidationError::Declined { .. } => None,
      ValidationError::VersionRequired => {
        Some("Pass the version explicitly when running with --yes or without a terminal.".to_string())
      }
      ValidationError::ChangelogSource { .. } => {
        Some("Check the --changelog-file path, or use --changelog-text / --edit instead.".to_string())
      }
      ValidationError::ChangelogVersionExists { version } => Some(format!(
        "Remove the existing [{}] section from the changelog, or release a different version.",
        version
      )),
      ValidationError::ChangelogHeadingMismatch { expected, .. } => Some(format!(
        "Change the heading to `## [{}]`, or drop it and let release-rail add one.",
        expected
      )),
      ValidationError::ChangelogStructure { .. } => Some(
        "Fix the changelog content: headings are `### Category`, bullets start with `- `, sub-bullets with two spaces."
          .to_string(),
      ),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::InvalidVersionFormat { input } => write!(f, "Invalid version format: '{}'", input),
      ValidationError::VersionNotGreater { requested, current } => {
        write!(f, "Version {} is not greater than current version {}", requested, current)
      }
      ValidationError::Increment(e) => write!(f, "{}", e),
      ValidationError::DirtyWorkingTree { paths } => {
        write!(f, "Working tree has uncommitted changes:\n  {}", paths.join("\n  "))
      }
      ValidationError::WrongBranch { expected, actual } => {
        write!(f, "Releases start from '{}', but the current branch is '{}'", expected, actual)
      }
      ValidationError::BranchAhead { branch, remote, count } => {
        write!(f, "Branch '{}' is {} commit(s) ahead of {}/{}", branch, count, remote, branch)
      }
      ValidationError::BranchBehind { branch, remote, count } => {
        write!(f, "Branch '{}' is {} commit(s) behind {}/{}", branch, count, remote, branch)
      }
      ValidationError::BranchDiverged {
        branch,
        remote,
        ahead,
        behind,
      } => write!(
        f,
        "Branch '{}' has diverged from {}/{} ({} ahead, {} behind)",
        branch, remote, branch, ahead, behind
      ),
      ValidationError::TagExists { tag } => write!(f, "Release tag '{}' already exists", tag),
      ValidationError::NoCommitsSinceTag { tag } => write!(f, "No commits since last release tag '{}'", tag),
      ValidationError::MissingTool { tool, purpose } => {
        write!(f, "Required tool '{}' is not available ({})", tool, purpose)
      }
      ValidationError::NothingToRollBack { version } => {
        write!(f, "Release {} has not been started; nothing to roll back", version)
      }
      ValidationError::Declined { what } => write!(f, "Aborted: {}", what),
      ValidationError::VersionRequired => write!(f, "A target version is required in non-interactive mode"),
      ValidationError::ChangelogSource { path, reason } => {
        write!(f, "Cannot use changelog file {}: {}", path.display(), reason)
      }
      ValidationError::ChangelogVersionExists { version } => {
        write!(f, "Changelog already contains a section for {}", version)
      }
      ValidationError::ChangelogHeadingMismatch { expected, found } => {
        write!(f, "Changelog content is headed '{}' but the release is {}", found, expected)
      }
      ValidationError::ChangelogStructure { problems } => {
        write!(f, "Changelog entry is malformed:\n  {}", problems.join("\n  "))
      }
    }
  }
}

/// External collaborator that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
  Git,
  Gh,
  Container,
  /// Command run directly on the host
  Local,
  Editor,
  Lint,
}

impl Tool {
  pub fn name(&self) -> &'static str {
    match self {
      Tool::Git => "git",
      Tool::Gh => "gh",
      Tool::Container => "container",
      Tool::Local => "local",
      Tool::Editor => "editor",
      Tool::Lint => "lint",
    }
  }
}

/// A collaborator command failed
#[derive(Debug)]
pub struct ToolError {
  pub tool: Tool,
  pub command: String,
  pub stderr: String,
}

impl ToolError {
  pub fn new(tool: Tool, command: impl Into<String>, stderr: impl Into<String>) -> Self {
    Self {
      tool,
      command: command.into(),
      stderr: stderr.into(),
    }
  }

  /// Diagnostic recipe: what to inspect and what to re-run by hand
  pub fn help_message(&self) -> String {
    let stderr = self.stderr.to_lowercase();
    match self.tool {
      Tool::Git if stderr.contains("non-fast-forward") || stderr.contains("fetch first") => {
        "The remote has commits you don't have. Run `git pull --ff-only` and retry.".to_string()
      }
      Tool::Git if stderr.contains("permission denied") || stderr.contains("403") => {
        "Check your SSH key or token permissions for the remote, then retry.".to_string()
      }
      Tool::Git => format!(
        "Inspect the repository with `git status` and `git log --oneline -5`, then re-run `{}` manually.",
        self.command
      ),
      Tool::Gh => format!(
        "Check authentication with `gh auth status`, then re-run `{}` manually.",
        self.command
      ),
      Tool::Container => format!(
        "Check the development container is running (`docker compose ps`), then re-run `{}` manually.",
        self.command
      ),
      Tool::Local => format!("Re-run `{}` in the project directory to see the full output.", self.command),
      Tool::Editor => "Set $EDITOR to a working editor, or pass --changelog-text / --changelog-file.".to_string(),
      Tool::Lint => format!("Run `{}` to see every finding, then fix the changelog.", self.command),
    }
  }
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} command failed: {}", self.tool.name(), self.command)?;
    let stderr = self.stderr.trim();
    if !stderr.is_empty() {
      write!(f, "\n{}", stderr)?;
    }
    Ok(())
  }
}

/// Forward-path steps that mutate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStep {
  UpdateVersion,
  RegenerateLock,
  WriteChangelog,
  CreateBranch,
  Commit,
  Push,
  OpenPullRequest,
}

impl MutationStep {
  fn help_message(&self) -> String {
    match self {
      MutationStep::UpdateVersion => "Check the version file is writable and well-formed.".to_string(),
      MutationStep::RegenerateLock => "Regenerate the lock file by hand inside the container to see the full output.".to_string(),
      MutationStep::WriteChangelog => "Check the changelog path is writable.".to_string(),
      MutationStep::CreateBranch => "A branch with the release name may already exist: `git branch -a`.".to_string(),
      MutationStep::Commit => "Inspect staged changes with `git status`.".to_string(),
      MutationStep::Push => "Check remote access with `git ls-remote`.".to_string(),
      MutationStep::OpenPullRequest => "Check `gh auth status` and open the pull request by hand.".to_string(),
    }
  }
}

impl fmt::Display for MutationStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      MutationStep::UpdateVersion => "update version",
      MutationStep::RegenerateLock => "regenerate lock",
      MutationStep::WriteChangelog => "write changelog",
      MutationStep::CreateBranch => "create branch",
      MutationStep::Commit => "commit",
      MutationStep::Push => "push",
      MutationStep::OpenPullRequest => "open pull request",
    };
    write!(f, "{}", name)
  }
}

/// Result type alias for release-rail
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;

  /// Tag a failure as the given forward-path step
  fn during(self, step: MutationStep) -> ReleaseResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }

  fn during(self, step: MutationStep) -> ReleaseResult<T> {
    self.map_err(|e| ReleaseError::mutation(step, e.into()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
