mod commands;
mod core;
mod platform;
mod release;
mod ui;

#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use core::context::{ReleaseContext, RunMode};
use core::error::{ReleaseError, print_error};
use release::changelog::SourceRequest;
use release::phase::ReleasePhase;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Drive a release through branch, pull request, merge and tag, and roll it back safely
#[derive(Parser)]
#[command(name = "release-rail")]
#[command(version, about, long_about = None)]
// Positional versions use the id `target`; `version` belongs to --version
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Project to release (from release-rail.toml `[[projects]]`)
  #[arg(long, global = true)]
  project: Option<String>,
  /// Show what would happen without making changes
  #[arg(long, global = true)]
  dry_run: bool,
  /// Print generated changelog entries, commit messages and debug logs
  #[arg(short, long, global = true)]
  verbose: bool,
  /// Accept every confirmation (versions must then be given explicitly)
  #[arg(short, long, global = true)]
  yes: bool,
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Forward path
  // ============================================================================
  /// Bump the version, write the changelog and open the release pull request
  Prepare {
    /// Target version (X.Y.Z); chosen interactively when omitted
    #[arg(id = "target", value_name = "VERSION")]
    version: Option<String>,
    /// Milestone whose closed work items feed the changelog
    #[arg(long)]
    milestone: Option<String>,
    /// Use this text as the changelog entry
    #[arg(long, conflicts_with_all = ["changelog_file", "edit"])]
    changelog_text: Option<String>,
    /// Read the changelog entry from a file
    #[arg(long, conflicts_with = "edit")]
    changelog_file: Option<PathBuf>,
    /// Write the changelog entry in $EDITOR
    #[arg(long)]
    edit: bool,
  },

  /// Run the preflight checks only
  Check {
    /// Target version (X.Y.Z)
    #[arg(id = "target", value_name = "VERSION")]
    version: String,
    /// Milestone that should have no open work items
    #[arg(long)]
    milestone: Option<String>,
  },

  /// Print the changelog entry that would be generated
  Changelog {
    /// Target version (X.Y.Z)
    #[arg(id = "target", value_name = "VERSION")]
    version: String,
    /// Milestone whose closed work items feed the changelog
    #[arg(long)]
    milestone: Option<String>,
  },

  // ============================================================================
  // Recovery path
  // ============================================================================
  /// Show how far a release has progressed
  Phase {
    /// Release version (X.Y.Z)
    #[arg(id = "target", value_name = "VERSION")]
    version: String,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Undo a release according to its phase
  Rollback {
    /// Release version (X.Y.Z)
    #[arg(id = "target", value_name = "VERSION")]
    version: String,
    /// Override the detected phase: branch-created, pull-request-open, merged, tagged
    #[arg(long, value_parser = commands::rollback::parse_phase)]
    phase: Option<ReleasePhase>,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Diagnostics go to stderr; RELEASE_RAIL_LOG overrides the level
fn init_tracing(verbose: bool) {
  let default = if verbose { "release_rail=debug" } else { "release_rail=warn" };
  let filter = EnvFilter::try_from_env("RELEASE_RAIL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let cwd = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(e.into()),
  };

  let mode = RunMode {
    preview: cli.dry_run,
    verbose: cli.verbose,
    auto_confirm: cli.yes,
  };

  // Built once; every command borrows it
  let ctx = match ReleaseContext::build(&cwd, cli.project.as_deref(), mode) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Prepare {
      version,
      milestone,
      changelog_text,
      changelog_file,
      edit,
    } => commands::run_prepare(
      &ctx,
      version,
      milestone,
      SourceRequest {
        text: changelog_text,
        file: changelog_file,
        edit,
      },
    ),
    Commands::Check { version, milestone } => commands::run_check(&ctx, &version, milestone),
    Commands::Changelog { version, milestone } => commands::run_changelog(&ctx, &version, milestone),
    Commands::Phase { version, json } => commands::run_phase(&ctx, &version, json),
    Commands::Rollback { version, phase } => commands::run_rollback(&ctx, &version, phase),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
