//! Structural checks for a changelog entry before it is committed

use super::Category;
use super::document::{Heading, parse_heading};
use crate::core::error::ValidationError;
use chrono::NaiveDate;

/// Problems found in `entry`, one message per offending line
pub fn check_entry(entry: &str) -> Vec<String> {
  let mut problems = Vec::new();
  let mut lines = entry.lines().enumerate().peekable();

  match lines.next() {
    Some((_, first)) => {
      if let Some(problem) = check_version_heading(first) {
        problems.push(format!("line 1: {}", problem));
      }
    }
    None => {
      problems.push("entry is empty".to_string());
      return problems;
    }
  }

  let mut last_category: Option<Category> = None;
  let mut previous_blank = false;
  let mut previous_was_bullet = false;

  for (idx, line) in lines {
    let n = idx + 1;

    if line != line.trim_end() {
      problems.push(format!("line {}: trailing whitespace", n));
    }

    if line.trim().is_empty() {
      if previous_blank {
        problems.push(format!("line {}: consecutive blank lines", n));
      }
      previous_blank = true;
      continue;
    }
    previous_blank = false;

    if let Some(name) = line.strip_prefix("### ") {
      match Category::from_heading(name.trim()) {
        None => problems.push(format!("line {}: unknown category '{}'", n, name.trim())),
        Some(category) if last_category.is_some_and(|last| category <= last) => {
          problems.push(format!("line {}: category '{}' is out of order or repeated", n, name.trim()))
        }
        Some(category) => last_category = Some(category),
      }
      previous_was_bullet = false;
    } else if line.starts_with("## ") || line.starts_with("# ") {
      problems.push(format!("line {}: entry must contain a single version heading", n));
    } else if line.starts_with("- ") {
      if last_category.is_none() {
        problems.push(format!("line {}: bullet before any category heading", n));
      }
      previous_was_bullet = true;
    } else if line.starts_with("  - ") {
      if !previous_was_bullet {
        problems.push(format!("line {}: sub-bullet without a parent bullet", n));
      }
    } else if line.starts_with(['*', '+']) || line.trim_start().starts_with("- ") {
      problems.push(format!(
        "line {}: bullets use '- ', sub-bullets exactly two spaces then '- '",
        n
      ));
    } else {
      previous_was_bullet = false;
    }
  }

  problems
}

fn check_version_heading(line: &str) -> Option<&'static str> {
  if parse_heading(line).is_some_and(|h| matches!(h, Heading::Version(_))) {
    let date_ok = line
      .split_once("] - ")
      .is_some_and(|(_, date)| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").is_ok());
    if date_ok {
      return None;
    }
    return Some("version heading must end with ' - YYYY-MM-DD'");
  }
  Some("entry must start with '## [X.Y.Z] - YYYY-MM-DD'")
}

/// Reject malformed entries
pub fn validate_entry(entry: &str) -> Result<(), ValidationError> {
  let problems = check_entry(entry);
  if problems.is_empty() {
    Ok(())
  } else {
    Err(ValidationError::ChangelogStructure { problems })
  }
}
