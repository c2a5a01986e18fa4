//! Release commit for generated assets
//!
//! Stages the files matching `assets`, commits them with the rendered
//! `message` template and pushes the commit to the release branch. Nothing
//! happens when no asset exists or the staged assets are unchanged.

use super::{Plugin, StepContext, reject_unknown_options, string_list_option, string_option};
use crate::core::config::PluginOptions;
use crate::core::error::{ConfigError, PluginError, ReleaseError, ReleaseResult};
use crate::core::vcs::Signature;
use crate::release::step::LifecycleStep;
use std::path::{Path, PathBuf};

const NAME: &str = "git";
const DEFAULT_ASSETS: [&str; 1] = ["CHANGELOG.md"];
const DEFAULT_MESSAGE: &str = "chore(release): ${nextRelease.version} [skip ci]\n\n${nextRelease.notes}";
const DEFAULT_AUTHOR_NAME: &str = "semrel-bot";
const DEFAULT_AUTHOR_EMAIL: &str = "semrel-bot@users.noreply.github.com";

/// Commits release assets back to the repository
pub struct GitAssets {
  assets: Vec<glob::Pattern>,
  message: String,
}

impl GitAssets {
  pub fn from_options(options: &PluginOptions) -> Result<Self, ConfigError> {
    reject_unknown_options(NAME, options, &["assets", "message"])?;

    let raw_assets = string_list_option(NAME, options, "assets")?
      .unwrap_or_else(|| DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect());

    let assets = raw_assets
      .iter()
      .map(|pattern| {
        let invalid = |reason: String| ConfigError::InvalidOption {
          plugin: NAME.to_string(),
          option: "assets".to_string(),
          reason,
        };
        if pattern.trim().is_empty() {
          return Err(invalid("asset pattern is empty".to_string()));
        }
        if pattern.starts_with('!') {
          return Err(invalid(format!("negated pattern '{}' is not supported", pattern)));
        }
        if Path::new(pattern).is_absolute() || pattern.split('/').any(|c| c == "..") {
          return Err(invalid(format!("'{}' points outside the repository", pattern)));
        }
        glob::Pattern::new(pattern).map_err(|e| invalid(format!("'{}': {}", pattern, e)))
      })
      .collect::<Result<Vec<_>, _>>()?;

    let message = string_option(NAME, options, "message")?.unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
    if message.trim().is_empty() {
      return Err(ConfigError::InvalidOption {
        plugin: NAME.to_string(),
        option: "message".to_string(),
        reason: "must not be empty".to_string(),
      });
    }

    Ok(Self { assets, message })
  }

  /// Existing files matching the asset patterns, relative to `root`
  fn matching_files(&self, root: &Path) -> ReleaseResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in &self.assets {
      let full = root.join(pattern.as_str());
      let entries = glob::glob(&full.to_string_lossy())
        .map_err(|e| ReleaseError::message(format!("Invalid asset pattern '{}': {}", pattern.as_str(), e)))?;

      for entry in entries {
        let path = entry.map_err(|e| ReleaseError::message(format!("Failed to read asset: {}", e)))?;
        if !path.is_file() {
          continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        if !files.contains(&relative) {
          files.push(relative);
        }
      }
    }

    Ok(files)
  }

  fn author(ctx: &StepContext<'_>) -> Signature {
    Signature {
      name: ctx
        .release
        .env_var("GIT_AUTHOR_NAME")
        .unwrap_or(DEFAULT_AUTHOR_NAME)
        .to_string(),
      email: ctx
        .release
        .env_var("GIT_AUTHOR_EMAIL")
        .unwrap_or(DEFAULT_AUTHOR_EMAIL)
        .to_string(),
    }
  }
}

impl Plugin for GitAssets {
  fn steps(&self) -> &[LifecycleStep] {
    &[LifecycleStep::VerifyConditions, LifecycleStep::PublishGitAssets]
  }

  fn verify_conditions(&self, ctx: &StepContext<'_>) -> ReleaseResult<()> {
    if ctx.release.branch.name == "HEAD" {
      return Err(ReleaseError::Plugin(
        PluginError::new(NAME, ctx.step.as_str(), "cannot push release assets from a detached HEAD")
          .with_help("Check out the release branch or pass --branch"),
      ));
    }
    Ok(())
  }

  fn publish_git_assets(&self, ctx: &StepContext<'_>) -> ReleaseResult<()> {
    let root = ctx.repo.root();
    let files = self.matching_files(root)?;
    if files.is_empty() {
      tracing::info!("no release assets found, skipping release commit");
      return Ok(());
    }

    ctx.repo.stage(&files)?;
    if !ctx.repo.has_staged_changes()? {
      tracing::info!(assets = files.len(), "release assets unchanged, skipping release commit");
      return Ok(());
    }

    let message = ctx.release.render_template(&self.message);
    let sha = ctx.repo.commit(&message, &Self::author(ctx))?;
    tracing::info!(commit = %sha, assets = files.len(), "created release commit");

    let refspec = format!("HEAD:refs/heads/{}", ctx.release.branch.name);
    ctx.repo.push(&ctx.release.repository_url, &refspec)?;
    println!("📦 Pushed release commit {} to {}", &sha[..sha.len().min(7)], ctx.release.branch.name);

    Ok(())
  }
}
