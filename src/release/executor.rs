//! Plugin chain execution
//!
//! For a lifecycle step, every plugin that declares the step is called in
//! config order. Results are folded into the [`ReleaseContext`] as they
//! arrive, so a plugin sees what earlier plugins produced in the same step:
//!
//! - `analyze-commits`: the strongest release type wins
//! - `generate-notes`: fragments are joined with a blank line
//! - `publish-release`: every published release is collected
//! - everything else: no value, the first failure aborts
//!
//! A failing plugin aborts the step; the error names the plugin. Nothing is
//! rolled back.

use crate::core::config::ReleaseConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::core::vcs::Repository;
use crate::plugins::{Plugin, PluginRegistry, StepContext};
use crate::release::step::LifecycleStep;

/// A configured plugin instance
struct ChainEntry {
  identifier: String,
  plugin: Box<dyn Plugin>,
}

/// The instantiated plugin chain of a config
pub struct PluginChain {
  entries: Vec<ChainEntry>,
}

impl PluginChain {
  /// Instantiate every plugin of `config`, in order
  pub fn from_config(config: &ReleaseConfig, registry: &PluginRegistry) -> Result<Self, ConfigError> {
    let entries = config
      .plugins
      .iter()
      .enumerate()
      .map(|(index, spec)| {
        if !registry.contains(&spec.identifier) {
          return Err(ConfigError::UnknownPlugin {
            identifier: spec.identifier.clone(),
            index,
          });
        }
        Ok(ChainEntry {
          identifier: spec.identifier.clone(),
          plugin: registry.instantiate(spec)?,
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self { entries })
  }

  /// Plugin identifiers, in execution order
  pub fn identifiers(&self) -> Vec<&str> {
    self.entries.iter().map(|e| e.identifier.as_str()).collect()
  }

  /// Identifiers of the plugins that handle `step`
  pub fn implementing(&self, step: LifecycleStep) -> Vec<&str> {
    self
      .entries
      .iter()
      .filter(|e| e.plugin.implements(step))
      .map(|e| e.identifier.as_str())
      .collect()
  }

  /// Run one lifecycle step across the chain
  pub fn run_step(
    &self,
    step: LifecycleStep,
    release: &mut ReleaseContext,
    repo: &dyn Repository,
  ) -> ReleaseResult<()> {
    if step == LifecycleStep::Fail {
      return Err(ReleaseError::message("The fail step only runs through run_fail"));
    }

    if release.dry_run && step.has_side_effects() {
      return Err(ReleaseError::message(format!("Step {} cannot run in dry-run mode", step)));
    }

    if step == LifecycleStep::GenerateNotes && release.next_release.is_none() {
      return Err(ReleaseError::message("Release notes need a computed next release"));
    }

    if step == LifecycleStep::AnalyzeCommits {
      release.release_type = None;
    }

    for entry in self.entries.iter().filter(|e| e.plugin.implements(step)) {
      tracing::debug!(plugin = %entry.identifier, step = %step, "running plugin");
      self
        .call(entry, step, release, repo)
        .map_err(|e| e.in_plugin(&entry.identifier, step.as_str()))?;
    }

    Ok(())
  }

  /// Call a single plugin and fold its result into `release`
  fn call(
    &self,
    entry: &ChainEntry,
    step: LifecycleStep,
    release: &mut ReleaseContext,
    repo: &dyn Repository,
  ) -> ReleaseResult<()> {
    let ctx = StepContext {
      release,
      repo,
      step,
    };
    let plugin = entry.plugin.as_ref();

    match step {
      LifecycleStep::VerifyConditions => plugin.verify_conditions(&ctx),
      LifecycleStep::UpdateChangelog => plugin.update_changelog(&ctx),
      LifecycleStep::PublishGitAssets => plugin.publish_git_assets(&ctx),
      LifecycleStep::Success => plugin.success(&ctx),
      LifecycleStep::AnalyzeCommits => {
        let result = plugin.analyze_commits(&ctx)?;
        if let Some(release_type) = result {
          tracing::debug!(plugin = %entry.identifier, release = %release_type, "plugin requested release");
        }
        release.release_type = release.release_type.max(result);
        Ok(())
      }
      LifecycleStep::GenerateNotes => {
        let fragment = plugin.generate_notes(&ctx)?;
        if let Some(fragment) = fragment.filter(|f| !f.trim().is_empty())
          && let Some(next) = release.next_release.as_mut()
        {
          let fragment = fragment.trim_end();
          if !next.notes.is_empty() {
            next.notes.push_str("\n\n");
          }
          next.notes.push_str(fragment);
        }
        Ok(())
      }
      LifecycleStep::PublishRelease => {
        if let Some(mut published) = plugin.publish_release(&ctx)? {
          published.plugin = entry.identifier.clone();
          release.releases.push(published);
        }
        Ok(())
      }
      LifecycleStep::Fail => Ok(()),
    }
  }

  /// Tell every `fail` handler about `error`
  ///
  /// Failures of the handlers themselves are logged and otherwise ignored.
  pub fn run_fail(&self, release: &ReleaseContext, repo: &dyn Repository, error: &ReleaseError) {
    let ctx = StepContext {
      release,
      repo,
      step: LifecycleStep::Fail,
    };

    for entry in self.entries.iter().filter(|e| e.plugin.implements(LifecycleStep::Fail)) {
      if let Err(fail_error) = entry.plugin.fail(&ctx, error) {
        tracing::warn!(plugin = %entry.identifier, error = %fail_error, "fail handler failed");
      }
    }
  }
}
