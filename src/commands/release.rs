//! `semrel release` and `semrel plan`
//!
//! Both load and validate the config, open the repository and hand off to
//! the release engine. `plan` is a release run pinned to dry-run mode.

use crate::core::config::ReleaseConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::plugins::PluginRegistry;
use crate::release::{ReleaseEngine, RunOptions, RunOutcome};
use serde::Serialize;
use std::env;
use std::path::Path;

/// Machine-readable run result for `--json`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary<'a> {
  status: &'static str,
  branch: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  release: Option<&'a ReleaseContext>,
}

impl<'a> RunSummary<'a> {
  fn from_outcome(outcome: &'a RunOutcome) -> Self {
    match outcome {
      RunOutcome::NotReleaseBranch { branch } => Self {
        status: "not-release-branch",
        branch,
        release: None,
      },
      RunOutcome::NoRelease(ctx) => Self {
        status: "no-release",
        branch: &ctx.branch.name,
        release: Some(&**ctx),
      },
      RunOutcome::DryRun(ctx) => Self {
        status: "dry-run",
        branch: &ctx.branch.name,
        release: Some(&**ctx),
      },
      RunOutcome::Released(ctx) => Self {
        status: "released",
        branch: &ctx.branch.name,
        release: Some(&**ctx),
      },
    }
  }
}

/// Run the release command
pub fn run_release(
  config_path: Option<&Path>,
  dry_run: bool,
  no_ci: bool,
  branch: Option<String>,
  json: bool,
) -> ReleaseResult<()> {
  let mut options = RunOptions::from_env();
  options.dry_run = dry_run;
  options.no_ci = no_ci;
  options.branch = branch;
  execute(config_path, options, json)
}

/// Run the plan command: what the next release would be, without side effects
pub fn run_plan(config_path: Option<&Path>, branch: Option<String>, json: bool) -> ReleaseResult<()> {
  let mut options = RunOptions::from_env();
  options.dry_run = true;
  options.branch = branch;
  execute(config_path, options, json)
}

fn execute(config_path: Option<&Path>, options: RunOptions, json: bool) -> ReleaseResult<()> {
  let cwd = env::current_dir()?;
  let registry = PluginRegistry::with_builtin_plugins();
  let (config, path) = ReleaseConfig::load_validated(&cwd, config_path, &registry)?;
  let repo = SystemGit::open(&cwd)?;
  let engine = ReleaseEngine::new(&config, &registry, &repo)?;

  if !json {
    println!(
      "🔧 Loaded {} ({})",
      path.display(),
      engine.chain().identifiers().join(", ")
    );
  }

  let outcome = engine.run(options)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&RunSummary::from_outcome(&outcome))?);
  } else {
    print_outcome(&outcome);
  }

  Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
  match outcome {
    RunOutcome::NotReleaseBranch { branch } => {
      println!("⏭️  Branch '{}' is not configured for releases", branch);
    }
    RunOutcome::NoRelease(ctx) => {
      let since = ctx
        .last_release
        .as_ref()
        .map(|l| l.git_tag.as_str())
        .unwrap_or("the first commit");
      println!(
        "✅ Nothing to release: {} commit(s) since {}, none of them trigger a release",
        ctx.commits.len(),
        since
      );
    }
    RunOutcome::DryRun(ctx) => {
      if let Some(next) = &ctx.next_release {
        println!(
          "🔍 Dry run: the next release would be {} ({} release)",
          next.git_tag, next.release_type
        );
        if !next.notes.is_empty() {
          println!();
          println!("{}", next.notes.trim_end());
        }
      }
    }
    RunOutcome::Released(ctx) => {
      if let Some(next) = &ctx.next_release {
        println!("🎉 Released {} on branch {}", next.git_tag, ctx.branch.name);
      }
      for published in &ctx.releases {
        match &published.url {
          Some(url) => println!("   {} ({}): {}", published.name, published.plugin, url),
          None => println!("   {} ({})", published.name, published.plugin),
        }
      }
    }
  }
}
