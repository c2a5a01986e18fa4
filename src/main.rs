mod commands;
mod core;
mod logging;
mod plugins;
mod release;
mod utils;

use clap::{Parser, Subcommand};
use core::config::ConfigFormat;
use core::error::{ReleaseError, print_error};
use std::path::PathBuf;

/// Conventional-commit releases driven by a declarative plugin chain
#[derive(Parser)]
#[command(name = "semrel")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Path to the release config (default: .releaserc, .releaserc.json, .releaserc.toml, release.toml)
  #[arg(long, global = true, value_name = "PATH")]
  config: Option<PathBuf>,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Releasing
  // ============================================================================
  /// Analyze commits and publish the next release
  Release {
    /// Generate notes but skip every step with side effects
    #[arg(short, long)]
    dry_run: bool,
    /// Publish even when not running in a CI environment
    #[arg(long)]
    no_ci: bool,
    /// Release this branch instead of the checked-out one
    #[arg(long)]
    branch: Option<String>,
    /// Output the run result in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Preview the next release without side effects
  Plan {
    /// Plan for this branch instead of the checked-out one
    #[arg(long)]
    branch: Option<String>,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Setup & Inspection
  // ============================================================================
  /// Write a starter .releaserc.json
  Init {
    /// Overwrite an existing config
    #[arg(short, long)]
    force: bool,
  },

  /// Show the effective, validated configuration
  Config {
    /// Render as JSON
    #[arg(long, conflicts_with = "toml")]
    json: bool,
    /// Render as TOML
    #[arg(long)]
    toml: bool,
  },

  /// List the built-in plugins
  Plugins {
    /// Output the list in JSON format
    #[arg(long)]
    json: bool,
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

fn main() {
  let cli = Cli::parse();
  logging::init(cli.verbose);

  let config_path = cli.config.as_deref();

  let result = match cli.command {
    // Releasing
    Commands::Release {
      dry_run,
      no_ci,
      branch,
      json,
    } => commands::run_release(config_path, dry_run, no_ci, branch, json),
    Commands::Plan { branch, json } => commands::run_plan(config_path, branch, json),

    // Setup & Inspection
    Commands::Init { force } => commands::run_init(force),
    Commands::Config { json, toml } => {
      let format = match (json, toml) {
        (true, _) => Some(ConfigFormat::Json),
        (_, true) => Some(ConfigFormat::Toml),
        _ => None,
      };
      commands::run_config(config_path, format)
    }
    Commands::Plugins { json } => commands::run_plugins(json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
