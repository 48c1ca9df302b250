//! Release configuration (release-rail.toml)
//!
//! Every field has a default, so a repository without a config file still works:
//! the single project is detected from the manifest at the root.

use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::project::{Project, ProjectKind};
use crate::release::version::ReleaseVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for release-rail
/// Searched in order: release-rail.toml, .release-rail.toml, .config/release-rail.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RailConfig {
  #[serde(default)]
  pub release: ReleaseSettings,
  #[serde(default)]
  pub changelog: ChangelogSettings,
  #[serde(default)]
  pub container: Option<ContainerSettings>,
  #[serde(default)]
  pub projects: Vec<ProjectConfig>,
}

/// Branch, tag and label conventions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSettings {
  /// Branch releases are cut from and merged back into (default: "development")
  #[serde(default = "default_integration_branch")]
  pub integration_branch: String,

  /// Branch that receives finished releases (default: "main")
  #[serde(default = "default_final_branch")]
  pub final_branch: String,

  #[serde(default = "default_remote")]
  pub remote: String,

  #[serde(default = "default_tag_prefix")]
  pub tag_prefix: String,

  #[serde(default = "default_branch_prefix")]
  pub branch_prefix: String,

  /// Label marking pull requests opened by this tool
  #[serde(default = "default_automation_label")]
  pub automation_label: String,

  /// Cumulative changelog, relative to the repository root
  #[serde(default = "default_changelog_path")]
  pub changelog: PathBuf,
}

fn default_integration_branch() -> String {
  "development".to_string()
}

fn default_final_branch() -> String {
  "main".to_string()
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_tag_prefix() -> String {
  "v".to_string()
}

fn default_branch_prefix() -> String {
  "release/".to_string()
}

fn default_automation_label() -> String {
  "automated-release".to_string()
}

fn default_changelog_path() -> PathBuf {
  PathBuf::from("CHANGELOG.md")
}

impl Default for ReleaseSettings {
  fn default() -> Self {
    Self {
      integration_branch: default_integration_branch(),
      final_branch: default_final_branch(),
      remote: default_remote(),
      tag_prefix: default_tag_prefix(),
      branch_prefix: default_branch_prefix(),
      automation_label: default_automation_label(),
      changelog: default_changelog_path(),
    }
  }
}

impl ReleaseSettings {
  /// Release tag, e.g. `v1.4.0`
  pub fn tag_name(&self, version: &ReleaseVersion) -> String {
    format!("{}{}", self.tag_prefix, version)
  }

  /// Release branch, e.g. `release/v1.4.0`
  pub fn release_branch(&self, version: &ReleaseVersion) -> String {
    format!("{}{}", self.branch_prefix, self.tag_name(version))
  }

  /// Subject line of the release commit, e.g. `chore(release): v1.4.0`
  pub fn release_commit_subject(&self, version: &ReleaseVersion) -> String {
    format!("chore(release): {}", self.tag_name(version))
  }

  fn validate(&self) -> Result<(), String> {
    for (field, value) in [
      ("integration_branch", &self.integration_branch),
      ("final_branch", &self.final_branch),
      ("remote", &self.remote),
    ] {
      if value.trim().is_empty() {
        return Err(format!("[release].{} must not be empty", field));
      }
    }
    if self.integration_branch == self.final_branch {
      return Err("[release].integration_branch and final_branch must differ".to_string());
    }
    Ok(())
  }
}

/// Changelog generation knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogSettings {
  /// Closed work items considered when no milestone is given
  #[serde(default = "default_lookback_days")]
  pub lookback_days: u32,

  /// Commits read when no release tag exists yet
  #[serde(default = "default_history_window")]
  pub history_window: usize,

  /// Sub-bullets emitted under a single work item
  #[serde(default = "default_max_commits_per_item")]
  pub max_commits_per_item: usize,

  /// Optional external lint run after insertion, e.g. ["markdownlint-cli2", "CHANGELOG.md"]
  #[serde(default)]
  pub lint_command: Option<Vec<String>>,
}

fn default_lookback_days() -> u32 {
  30
}

fn default_history_window() -> usize {
  50
}

fn default_max_commits_per_item() -> usize {
  10
}

impl Default for ChangelogSettings {
  fn default() -> Self {
    Self {
      lookback_days: default_lookback_days(),
      history_window: default_history_window(),
      max_commits_per_item: default_max_commits_per_item(),
      lint_command: None,
    }
  }
}

impl ChangelogSettings {
  fn validate(&self) -> Result<(), String> {
    if self.lookback_days == 0 {
      return Err("[changelog].lookback_days must be greater than 0".to_string());
    }
    if self.max_commits_per_item == 0 {
      return Err("[changelog].max_commits_per_item must be greater than 0".to_string());
    }
    if self.history_window == 0 {
      return Err("[changelog].history_window must be greater than 0".to_string());
    }
    if let Some(cmd) = &self.lint_command
      && cmd.is_empty()
    {
      return Err("[changelog].lint_command must not be empty".to_string());
    }
    Ok(())
  }
}

/// Isolated execution environment (docker compose service)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSettings {
  #[serde(default = "default_engine")]
  pub engine: String,
  pub service: String,
}

fn default_engine() -> String {
  "docker".to_string()
}

/// One release unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
  pub name: String,
  pub kind: ProjectKind,
  #[serde(default = "default_project_path")]
  pub path: PathBuf,
  #[serde(default)]
  pub repo: Option<String>,
}

fn default_project_path() -> PathBuf {
  PathBuf::from(".")
}

impl RailConfig {
  /// Find config file in search order
  pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    let candidates = [
      root.join("release-rail.toml"),
      root.join(".release-rail.toml"),
      root.join(".config").join("release-rail.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, falling back to defaults when no file exists
  pub fn load(root: &Path) -> ReleaseResult<Self> {
    let Some(config_path) = Self::find_config_path(root) else {
      tracing::debug!(root = %root.display(), "no release-rail.toml, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).map_err(|reason| {
      ReleaseError::Config(ConfigError::Invalid {
        path: config_path.clone(),
        reason,
      })
    })?;

    tracing::debug!(path = %config_path.display(), projects = config.projects.len(), "loaded config");
    Ok(config)
  }

  /// Parse and validate config content
  pub fn parse(content: &str) -> Result<Self, String> {
    let config: RailConfig = toml_edit::de::from_str(content).map_err(|e| e.to_string())?;
    config.release.validate()?;
    config.changelog.validate()?;

    let mut seen = HashSet::new();
    for project in &config.projects {
      if !seen.insert(project.name.as_str()) {
        return Err(format!("duplicate project name '{}'", project.name));
      }
    }

    Ok(config)
  }

  fn project_names(&self) -> Vec<String> {
    self.projects.iter().map(|p| p.name.clone()).collect()
  }

  /// Resolve the project to release
  ///
  /// With no configured projects, the root manifest decides the kind.
  pub fn resolve_project(&self, root: &Path, name: Option<&str>) -> ReleaseResult<Project> {
    let chosen = match (name, self.projects.as_slice()) {
      (_, []) => {
        let kind = ProjectKind::detect(root).ok_or_else(|| ConfigError::NoManifest {
          root: root.to_path_buf(),
        })?;
        let dir_name = root
          .file_name()
          .map(|n| n.to_string_lossy().to_string())
          .unwrap_or_else(|| "project".to_string());
        return Ok(Project {
          name: name.map(str::to_string).unwrap_or(dir_name),
          kind,
          path: PathBuf::from("."),
          repo: None,
        });
      }
      (Some(name), projects) => projects
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ConfigError::ProjectNotFound {
          name: name.to_string(),
          available: self.project_names(),
        })?,
      (None, [only]) => only,
      (None, _) => {
        return Err(
          ConfigError::ProjectRequired {
            available: self.project_names(),
          }
          .into(),
        );
      }
    };

    Ok(Project {
      name: chosen.name.clone(),
      kind: chosen.kind,
      path: chosen.path.clone(),
      repo: chosen.repo.clone(),
    })
  }
}
