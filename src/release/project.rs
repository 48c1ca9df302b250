//! Project manifests: where the version lives and how the lock artifact is rebuilt
//!
//! The set of supported ecosystems is closed, so every per-kind question is an
//! exhaustive `match` rather than a lookup table.

use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::release::version::ReleaseVersion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Supported project ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
  /// Rust crate or workspace (Cargo.toml + Cargo.lock)
  Cargo,
  /// Node package (package.json + package-lock.json)
  Npm,
  /// Python project managed by uv (pyproject.toml + uv.lock)
  Python,
}

impl ProjectKind {
  /// Manifest holding the persisted version string
  pub fn version_file(&self) -> &'static str {
    match self {
      ProjectKind::Cargo => "Cargo.toml",
      ProjectKind::Npm => "package.json",
      ProjectKind::Python => "pyproject.toml",
    }
  }

  /// Dependency lock artifact
  pub fn lock_file(&self) -> &'static str {
    match self {
      ProjectKind::Cargo => "Cargo.lock",
      ProjectKind::Npm => "package-lock.json",
      ProjectKind::Python => "uv.lock",
    }
  }

  /// Command that rewrites the lock artifact after the version change
  pub fn lock_regenerate(&self) -> &'static [&'static str] {
    match self {
      ProjectKind::Cargo => &["cargo", "update", "--workspace"],
      ProjectKind::Npm => &["npm", "install", "--package-lock-only", "--ignore-scripts"],
      ProjectKind::Python => &["uv", "lock"],
    }
  }

  /// Command that fails when the lock artifact is stale
  pub fn lock_verify(&self) -> &'static [&'static str] {
    match self {
      ProjectKind::Cargo => &["cargo", "metadata", "--locked", "--format-version", "1", "--no-deps"],
      ProjectKind::Npm => &["npm", "ci", "--dry-run", "--ignore-scripts"],
      ProjectKind::Python => &["uv", "lock", "--check"],
    }
  }

  /// Detect the ecosystem from the manifests present in `dir`
  pub fn detect(dir: &Path) -> Option<Self> {
    [ProjectKind::Cargo, ProjectKind::Npm, ProjectKind::Python]
      .into_iter()
      .find(|kind| dir.join(kind.version_file()).is_file())
  }

  /// Extract the version string from manifest content
  pub fn read_version(&self, content: &str) -> Result<String, String> {
    match self {
      ProjectKind::Cargo => {
        let doc: toml_edit::DocumentMut = content.parse().map_err(|e| format!("invalid TOML: {}", e))?;
        let package_version = doc.get("package").and_then(|p| p.get("version"));
        let inherited = package_version
          .and_then(|v| v.get("workspace"))
          .and_then(|w| w.as_bool())
          .unwrap_or(false);
        let version = match package_version.and_then(|v| v.as_str()) {
          Some(v) if !inherited => Some(v),
          _ => doc
            .get("workspace")
            .and_then(|w| w.get("package"))
            .and_then(|p| p.get("version"))
            .and_then(|v| v.as_str()),
        };
        version
          .map(str::to_string)
          .ok_or_else(|| "no [package].version or [workspace.package].version".to_string())
      }
      ProjectKind::Npm => {
        let json: serde_json::Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;
        json
          .get("version")
          .and_then(|v| v.as_str())
          .map(str::to_string)
          .ok_or_else(|| "no top-level \"version\" field".to_string())
      }
      ProjectKind::Python => {
        let doc: toml_edit::DocumentMut = content.parse().map_err(|e| format!("invalid TOML: {}", e))?;
        doc
          .get("project")
          .and_then(|p| p.get("version"))
          .or_else(|| {
            doc
              .get("tool")
              .and_then(|t| t.get("poetry"))
              .and_then(|p| p.get("version"))
          })
          .and_then(|v| v.as_str())
          .map(str::to_string)
          .ok_or_else(|| "no [project].version".to_string())
      }
    }
  }

  /// Return manifest content with the version replaced, formatting preserved
  pub fn write_version(&self, content: &str, version: &ReleaseVersion) -> Result<String, String> {
    let version = version.to_string();
    match self {
      ProjectKind::Cargo => {
        let mut doc: toml_edit::DocumentMut = content.parse().map_err(|e| format!("invalid TOML: {}", e))?;
        let package_owns_version = doc
          .get("package")
          .and_then(|p| p.get("version"))
          .map(|v| v.is_str())
          .unwrap_or(false);
        if package_owns_version {
          doc["package"]["version"] = toml_edit::value(version);
        } else if doc
          .get("workspace")
          .and_then(|w| w.get("package"))
          .and_then(|p| p.get("version"))
          .is_some()
        {
          doc["workspace"]["package"]["version"] = toml_edit::value(version);
        } else {
          return Err("no [package].version or [workspace.package].version".to_string());
        }
        Ok(doc.to_string())
      }
      ProjectKind::Npm => {
        let mut json: serde_json::Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;
        let object = json
          .as_object_mut()
          .ok_or_else(|| "package.json is not an object".to_string())?;
        if !object.contains_key("version") {
          return Err("no top-level \"version\" field".to_string());
        }
        object.insert("version".to_string(), serde_json::Value::String(version));
        let mut rendered = serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?;
        rendered.push('\n');
        Ok(rendered)
      }
      ProjectKind::Python => {
        let mut doc: toml_edit::DocumentMut = content.parse().map_err(|e| format!("invalid TOML: {}", e))?;
        if doc.get("project").and_then(|p| p.get("version")).is_some() {
          doc["project"]["version"] = toml_edit::value(version);
        } else if doc
          .get("tool")
          .and_then(|t| t.get("poetry"))
          .and_then(|p| p.get("version"))
          .is_some()
        {
          doc["tool"]["poetry"]["version"] = toml_edit::value(version);
        } else {
          return Err("no [project].version".to_string());
        }
        Ok(doc.to_string())
      }
    }
  }
}

/// A resolved project: one release unit in the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
  pub name: String,
  pub kind: ProjectKind,
  /// Project directory, relative to the repository root
  pub path: PathBuf,
  /// `owner/name` passed to the platform, when not inferred from the remote
  pub repo: Option<String>,
}

impl Project {
  fn relative(&self, file: &str) -> PathBuf {
    if self.path.as_os_str().is_empty() || self.path == Path::new(".") {
      PathBuf::from(file)
    } else {
      self.path.join(file)
    }
  }

  /// Version file, relative to the repository root
  pub fn version_path(&self) -> PathBuf {
    self.relative(self.kind.version_file())
  }

  /// Lock artifact, relative to the repository root
  pub fn lock_path(&self) -> PathBuf {
    self.relative(self.kind.lock_file())
  }

  /// Read the persisted version
  pub fn current_version(&self, root: &Path) -> ReleaseResult<ReleaseVersion> {
    let path = root.join(self.version_path());
    let content = fs::read_to_string(&path).map_err(|e| {
      ReleaseError::Config(ConfigError::VersionFile {
        path: path.clone(),
        reason: e.to_string(),
      })
    })?;
    let raw = self
      .kind
      .read_version(&content)
      .map_err(|reason| ReleaseError::Config(ConfigError::VersionFile { path: path.clone(), reason }))?;
    ReleaseVersion::parse(&raw).map_err(|_| {
      ReleaseError::Config(ConfigError::VersionFile {
        path,
        reason: format!("'{}' is not a plain X.Y.Z version", raw),
      })
    })
  }

  /// Current and updated version-file content
  pub fn render_version_update(&self, root: &Path, version: &ReleaseVersion) -> ReleaseResult<(String, String)> {
    let path = root.join(self.version_path());
    let before = fs::read_to_string(&path)?;
    let after = self
      .kind
      .write_version(&before, version)
      .map_err(|reason| ReleaseError::Config(ConfigError::VersionFile { path, reason }))?;
    Ok((before, after))
  }

  /// Persist the new version string
  pub fn write_version(&self, root: &Path, version: &ReleaseVersion) -> ReleaseResult<()> {
    let (_, after) = self.render_version_update(root, version)?;
    fs::write(root.join(self.version_path()), after)?;
    Ok(())
  }
}
