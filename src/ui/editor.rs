//! Interactive changelog authoring in the operator's editor

use crate::core::error::{ReleaseResult, ResultExt, Tool, ToolError};
use std::io::Write;
use std::process::Command;

pub trait TextEditor {
  /// Open `template` for editing and return what was saved
  fn edit(&self, template: &str) -> ReleaseResult<String>;
}

/// `$VISUAL`, then `$EDITOR`, then `vi`, on a scratch file
pub struct SystemEditor;

impl SystemEditor {
  fn command() -> String {
    std::env::var("VISUAL")
      .ok()
      .filter(|v| !v.trim().is_empty())
      .or_else(|| std::env::var("EDITOR").ok().filter(|v| !v.trim().is_empty()))
      .unwrap_or_else(|| "vi".to_string())
  }
}

impl TextEditor for SystemEditor {
  fn edit(&self, template: &str) -> ReleaseResult<String> {
    let mut scratch = tempfile::Builder::new()
      .prefix("release-rail-changelog-")
      .suffix(".md")
      .tempfile()
      .context("Failed to create scratch file for the editor")?;
    scratch.write_all(template.as_bytes())?;
    scratch.flush()?;

    // Editors like `code --wait` carry their own arguments
    let editor = Self::command();
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    let rendered = format!("{} {}", editor, scratch.path().display());

    tracing::debug!(command = %rendered, "launching editor");
    let status = Command::new(program)
      .args(parts)
      .arg(scratch.path())
      .status()
      .with_context(|| format!("Failed to launch editor '{}'", editor))?;

    if !status.success() {
      return Err(ToolError::new(Tool::Editor, rendered, format!("editor exited with {}", status)).into());
    }

    Ok(std::fs::read_to_string(scratch.path())?)
  }
}
