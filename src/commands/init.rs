//! `semrel init`: write a starter `.releaserc.json`

use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::vcs::{Repository, SystemGit};
use std::env;
use std::path::Path;

/// File written by `init`
pub const STARTER_FILE: &str = ".releaserc.json";

/// Run the init command
pub fn run_init(force: bool) -> ReleaseResult<()> {
  let cwd = env::current_dir()?;

  if let Some(existing) = ReleaseConfig::find_config_path(&cwd)
    && !force
  {
    return Err(ReleaseError::with_help(
      format!("A release config already exists at {}", existing.display()),
      "Pass --force to overwrite it.",
    ));
  }

  let repository_url = origin_url(&cwd);
  if repository_url.is_none() {
    tracing::warn!("no 'origin' remote found, leaving repositoryUrl unset");
  }

  let config = ReleaseConfig::starter(repository_url);
  let path = cwd.join(STARTER_FILE);
  config.save(&path)?;

  println!("✅ Created {}", path.display());
  println!();
  println!("Next steps:");
  println!("  1. Review the branches and plugins in {}", STARTER_FILE);
  println!("  2. Preview the next release: semrel plan");
  println!("  3. Release from CI: semrel release");
  Ok(())
}

fn origin_url(cwd: &Path) -> Option<String> {
  let repo = SystemGit::open(cwd).ok()?;
  repo.remote_url("origin").ok().flatten()
}
