//! Operator confirmations and choices
//!
//! Engines never read stdin directly; they ask a [`Prompter`]. Auto-confirm mode and
//! tests swap the implementation.

use crate::core::error::{ReleaseResult, ResultExt, ValidationError};
use std::io::{BufRead, Write};

pub trait Prompter {
  /// Yes/no question; `false` means the operator declined
  fn confirm(&self, question: &str) -> ReleaseResult<bool>;

  /// Pick one of `options`; returns its index
  fn select(&self, question: &str, options: &[String]) -> ReleaseResult<usize>;

  /// Free-form answer
  fn input(&self, question: &str) -> ReleaseResult<String>;
}

/// Reads answers from stdin
pub struct TerminalPrompter;

impl TerminalPrompter {
  fn read_line(&self) -> ReleaseResult<Option<String>> {
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    let read = std::io::stdin()
      .lock()
      .read_line(&mut line)
      .context("Failed to read input")?;
    if read == 0 {
      return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
  }
}

impl Prompter for TerminalPrompter {
  fn confirm(&self, question: &str) -> ReleaseResult<bool> {
    print!("   {} [y/N] ", question);
    let answer = self.read_line()?.unwrap_or_default().to_lowercase();
    Ok(answer == "y" || answer == "yes")
  }

  fn select(&self, question: &str, options: &[String]) -> ReleaseResult<usize> {
    println!("   {}", question);
    for (i, option) in options.iter().enumerate() {
      println!("     {}) {}", i + 1, option);
    }
    loop {
      print!("   Choice [1-{}]: ", options.len());
      let Some(answer) = self.read_line()? else {
        return Err(ValidationError::VersionRequired.into());
      };
      match answer.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
        _ => println!("   ⚠️  Enter a number between 1 and {}", options.len()),
      }
    }
  }

  fn input(&self, question: &str) -> ReleaseResult<String> {
    print!("   {}: ", question);
    self.read_line()?.ok_or_else(|| ValidationError::VersionRequired.into())
  }
}

/// `--yes`: every confirmation is accepted, choices must come from arguments
pub struct AutoPrompter;

impl Prompter for AutoPrompter {
  fn confirm(&self, question: &str) -> ReleaseResult<bool> {
    println!("   {} [auto-confirmed]", question);
    Ok(true)
  }

  fn select(&self, _question: &str, _options: &[String]) -> ReleaseResult<usize> {
    Err(ValidationError::VersionRequired.into())
  }

  fn input(&self, _question: &str) -> ReleaseResult<String> {
    Err(ValidationError::VersionRequired.into())
  }
}
