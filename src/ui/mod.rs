//! Operator interaction: confirmations, choices and the changelog editor

pub mod editor;
pub mod prompt;

pub use editor::{SystemEditor, TextEditor};
pub use prompt::{AutoPrompter, Prompter, TerminalPrompter};
