//! Changelog file maintenance
//!
//! Prepends the release notes to `changelogFile` (default `CHANGELOG.md`),
//! keeping `changelogTitle` as the first line when configured.

use super::{Plugin, StepContext, reject_unknown_options, string_option};
use crate::core::config::PluginOptions;
use crate::core::error::{ConfigError, PluginError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::step::LifecycleStep;
use std::fs;
use std::path::{Path, PathBuf};

const NAME: &str = "changelog";
const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Keeps a changelog file in the repository up to date
pub struct ChangelogFile {
  file: PathBuf,
  title: Option<String>,
}

impl ChangelogFile {
  pub fn from_options(options: &PluginOptions) -> Result<Self, ConfigError> {
    reject_unknown_options(NAME, options, &["changelogFile", "changelogTitle"])?;

    let file = string_option(NAME, options, "changelogFile")?.unwrap_or_else(|| DEFAULT_CHANGELOG_FILE.to_string());
    if file.trim().is_empty() {
      return Err(ConfigError::InvalidOption {
        plugin: NAME.to_string(),
        option: "changelogFile".to_string(),
        reason: "must not be empty".to_string(),
      });
    }

    let title = string_option(NAME, options, "changelogTitle")?.filter(|t| !t.trim().is_empty());

    Ok(Self {
      file: PathBuf::from(file),
      title,
    })
  }

  fn path_in(&self, root: &Path) -> PathBuf {
    root.join(&self.file)
  }

  /// New file content with `notes` placed on top of `current`
  fn prepend(&self, current: &str, notes: &str) -> String {
    let current = current.trim();
    let rest = match &self.title {
      Some(title) if current.starts_with(title.as_str()) => current[title.len()..].trim(),
      _ => current,
    };

    let mut content = String::new();
    if let Some(title) = &self.title {
      content.push_str(title);
      content.push_str("\n\n");
    }
    content.push_str(notes.trim());
    content.push('\n');
    if !rest.is_empty() {
      content.push('\n');
      content.push_str(rest);
      content.push('\n');
    }
    content
  }
}

impl Plugin for ChangelogFile {
  fn steps(&self) -> &[LifecycleStep] {
    &[LifecycleStep::VerifyConditions, LifecycleStep::UpdateChangelog]
  }

  fn verify_conditions(&self, ctx: &StepContext<'_>) -> ReleaseResult<()> {
    let path = self.path_in(ctx.repo.root());
    if path.is_dir() {
      return Err(ReleaseError::Plugin(
        PluginError::new(NAME, ctx.step.as_str(), format!("{} is a directory", path.display()))
          .with_help("Point changelogFile at a file, e.g. \"CHANGELOG.md\""),
      ));
    }
    Ok(())
  }

  fn update_changelog(&self, ctx: &StepContext<'_>) -> ReleaseResult<()> {
    let notes = ctx.release.notes();
    if notes.trim().is_empty() {
      tracing::debug!(file = %self.file.display(), "no release notes, changelog left untouched");
      return Ok(());
    }

    let path = self.path_in(ctx.repo.root());
    let current = if path.exists() {
      fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?
    } else {
      String::new()
    };

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, self.prepend(&current, notes)).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(file = %self.file.display(), "updated changelog");
    Ok(())
  }
}
