//! GitHub Actions step outputs
//!
//! Appends `new-release-published`, `new-release-version` and
//! `new-release-git-tag` to the file named by `GITHUB_OUTPUT` once the next
//! release is known. Outside of Actions the values are only logged. Runs
//! without a release never reach generate-notes, so nothing is exported for
//! them.

use super::{Plugin, StepContext, reject_unknown_options};
use crate::core::config::PluginOptions;
use crate::core::context::NextRelease;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::step::LifecycleStep;
use std::fs::OpenOptions;
use std::io::Write;

const NAME: &str = "export-data";

/// Exports the next release as step outputs
pub struct ExportData;

impl ExportData {
  pub fn from_options(options: &PluginOptions) -> Result<Self, ConfigError> {
    reject_unknown_options(NAME, options, &[])?;
    Ok(Self)
  }

  fn outputs(next: &NextRelease) -> [(&'static str, String); 3] {
    [
      ("new-release-published", "true".to_string()),
      ("new-release-version", next.version.to_string()),
      ("new-release-git-tag", next.git_tag.clone()),
    ]
  }
}

impl Plugin for ExportData {
  fn steps(&self) -> &[LifecycleStep] {
    &[LifecycleStep::GenerateNotes]
  }

  fn generate_notes(&self, ctx: &StepContext<'_>) -> ReleaseResult<Option<String>> {
    let next = ctx
      .release
      .next_release
      .as_ref()
      .ok_or_else(|| ReleaseError::message("No next release to export"))?;
    let outputs = Self::outputs(next);

    let Some(path) = ctx.release.env_var("GITHUB_OUTPUT") else {
      for (key, value) in &outputs {
        tracing::info!(key = *key, value = %value, "GITHUB_OUTPUT not set, skipping export");
      }
      return Ok(None);
    };

    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(path)
      .with_context(|| format!("Failed to open GITHUB_OUTPUT file {}", path))?;

    for (key, value) in &outputs {
      writeln!(file, "{}={}", key, value).with_context(|| format!("Failed to write to {}", path))?;
    }

    tracing::debug!(path = %path, "exported release data");
    Ok(None)
  }
}
