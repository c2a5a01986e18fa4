//! Release plugins and the plugin registry
//!
//! Every plugin implements the [`Plugin`] trait. A plugin declares the
//! lifecycle steps it handles through [`Plugin::steps`]; the executor only
//! calls handlers for declared steps, so every handler has a no-op default.
//!
//! # Built-in Plugins
//!
//! - **commit-analyzer**: derives the release type from conventional commits
//! - **release-notes-generator**: renders markdown release notes
//! - **changelog**: prepends the notes to a changelog file
//! - **git**: commits release assets and pushes them
//! - **github**: creates a GitHub release
//! - **export-data**: exports release data as GitHub Actions outputs
//!
//! Plugins are created by [`PluginRegistry::instantiate`] from a
//! [`PluginSpec`]; the factory validates the options, so a bad option is a
//! [`ConfigError`] before anything runs.

mod changelog;
mod commit_analyzer;
pub mod conventional;
mod export_data;
mod git;
mod github;
mod release_notes;

use crate::core::config::{PluginOptions, PluginSpec};
use crate::core::context::{PublishedRelease, ReleaseContext};
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::core::vcs::Repository;
use crate::release::step::LifecycleStep;
use crate::release::version::ReleaseType;
use serde::Serialize;
use serde_json::Value;

/// What a plugin handler gets to see
pub struct StepContext<'a> {
  /// Release data accumulated so far
  pub release: &'a ReleaseContext,
  /// Repository the release happens in
  pub repo: &'a dyn Repository,
  /// Step being executed
  pub step: LifecycleStep,
}

/// A release plugin
///
/// # Example
///
/// ```rust,ignore
/// struct Announce;
///
/// impl Plugin for Announce {
///   fn steps(&self) -> &[LifecycleStep] {
///     &[LifecycleStep::Success]
///   }
///
///   fn success(&self, ctx: &StepContext<'_>) -> ReleaseResult<()> {
///     println!("released {}", ctx.release.next_release.as_ref().unwrap().version);
///     Ok(())
///   }
/// }
/// ```
pub trait Plugin {
  /// Lifecycle steps this plugin handles
  fn steps(&self) -> &[LifecycleStep];

  /// Whether this plugin handles `step`
  fn implements(&self, step: LifecycleStep) -> bool {
    self.steps().contains(&step)
  }

  /// Check preconditions (credentials, files, remotes)
  fn verify_conditions(&self, _ctx: &StepContext<'_>) -> ReleaseResult<()> {
    Ok(())
  }

  /// Report the release type the commits call for, if any
  fn analyze_commits(&self, _ctx: &StepContext<'_>) -> ReleaseResult<Option<ReleaseType>> {
    Ok(None)
  }

  /// Produce a fragment of the release notes
  fn generate_notes(&self, _ctx: &StepContext<'_>) -> ReleaseResult<Option<String>> {
    Ok(None)
  }

  /// Write release notes into tracked files
  fn update_changelog(&self, _ctx: &StepContext<'_>) -> ReleaseResult<()> {
    Ok(())
  }

  /// Commit and push release assets
  fn publish_git_assets(&self, _ctx: &StepContext<'_>) -> ReleaseResult<()> {
    Ok(())
  }

  /// Publish the release somewhere
  fn publish_release(&self, _ctx: &StepContext<'_>) -> ReleaseResult<Option<PublishedRelease>> {
    Ok(None)
  }

  /// Notify about a completed release
  fn success(&self, _ctx: &StepContext<'_>) -> ReleaseResult<()> {
    Ok(())
  }

  /// Notify about a failed release
  fn fail(&self, _ctx: &StepContext<'_>, _error: &ReleaseError) -> ReleaseResult<()> {
    Ok(())
  }
}

/// Builds a plugin from its options
pub type PluginFactory = Box<dyn Fn(&PluginOptions) -> Result<Box<dyn Plugin>, ConfigError>>;

/// A registered plugin implementation
struct Registration {
  identifier: String,
  alias: Option<String>,
  description: String,
  factory: PluginFactory,
}

/// Listing entry for `semrel plugins`
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
  pub identifier: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub alias: Option<String>,
  pub description: String,
  pub steps: Vec<LifecycleStep>,
}

/// Maps plugin identifiers to implementations
pub struct PluginRegistry {
  registrations: Vec<Registration>,
}

impl PluginRegistry {
  /// Create an empty registry
  pub fn new() -> Self {
    Self {
      registrations: Vec::new(),
    }
  }

  /// Create a registry with all built-in plugins
  pub fn with_builtin_plugins() -> Self {
    let mut registry = Self::new();

    registry.register_builtin(
      "@semantic-release/commit-analyzer",
      "commit-analyzer",
      "Determine the release type from conventional commits",
      |options| Ok(Box::new(commit_analyzer::CommitAnalyzer::from_options(options)?)),
    );
    registry.register_builtin(
      "semantic-release-export-data",
      "export-data",
      "Export release data as GitHub Actions step outputs",
      |options| Ok(Box::new(export_data::ExportData::from_options(options)?)),
    );
    registry.register_builtin(
      "@semantic-release/release-notes-generator",
      "release-notes-generator",
      "Generate markdown release notes from conventional commits",
      |options| Ok(Box::new(release_notes::ReleaseNotes::from_options(options)?)),
    );
    registry.register_builtin(
      "@semantic-release/changelog",
      "changelog",
      "Prepend release notes to a changelog file",
      |options| Ok(Box::new(changelog::ChangelogFile::from_options(options)?)),
    );
    registry.register_builtin(
      "@semantic-release/github",
      "github",
      "Create a GitHub release",
      |options| Ok(Box::new(github::GithubRelease::from_options(options)?)),
    );
    registry.register_builtin(
      "@semantic-release/git",
      "git",
      "Commit release assets and push them to the release branch",
      |options| Ok(Box::new(git::GitAssets::from_options(options)?)),
    );

    registry
  }

  fn register_builtin<F>(&mut self, identifier: &str, alias: &str, description: &str, factory: F)
  where
    F: Fn(&PluginOptions) -> Result<Box<dyn Plugin>, ConfigError> + 'static,
  {
    self.registrations.push(Registration {
      identifier: identifier.to_string(),
      alias: Some(alias.to_string()),
      description: description.to_string(),
      factory: Box::new(factory),
    });
  }

  /// Register a plugin under `identifier`, replacing any previous registration
  #[cfg(test)]
  pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F)
  where
    F: Fn(&PluginOptions) -> Result<Box<dyn Plugin>, ConfigError> + 'static,
  {
    let identifier = identifier.into();
    self.registrations.retain(|r| r.identifier != identifier);
    self.registrations.push(Registration {
      identifier,
      alias: None,
      description: String::new(),
      factory: Box::new(factory),
    });
  }

  fn resolve(&self, identifier: &str) -> Option<&Registration> {
    self
      .registrations
      .iter()
      .find(|r| r.identifier == identifier || r.alias.as_deref() == Some(identifier))
  }

  /// Whether `identifier` names a registered plugin (full name or alias)
  pub fn contains(&self, identifier: &str) -> bool {
    self.resolve(identifier).is_some()
  }

  /// Validate a plugin entry's options without keeping the plugin
  pub fn check_options(&self, spec: &PluginSpec) -> Result<(), ConfigError> {
    self.instantiate(spec).map(|_| ())
  }

  /// Build the plugin a config entry refers to
  pub fn instantiate(&self, spec: &PluginSpec) -> Result<Box<dyn Plugin>, ConfigError> {
    let registration = self.resolve(&spec.identifier).ok_or_else(|| ConfigError::UnknownPlugin {
      identifier: spec.identifier.clone(),
      index: 0,
    })?;
    (registration.factory)(&spec.options_or_empty()).map_err(|err| match err {
      // Report the identifier the config used, not the plugin's own short name
      ConfigError::InvalidOption { option, reason, .. } => ConfigError::InvalidOption {
        plugin: spec.identifier.clone(),
        option,
        reason,
      },
      other => other,
    })
  }

  /// Describe every registered plugin, in registration order
  pub fn list(&self) -> Vec<PluginInfo> {
    let empty = PluginOptions::new();
    self
      .registrations
      .iter()
      .map(|r| PluginInfo {
        identifier: r.identifier.clone(),
        alias: r.alias.clone(),
        description: r.description.clone(),
        steps: (r.factory)(&empty).map(|p| p.steps().to_vec()).unwrap_or_default(),
      })
      .collect()
  }
}

impl Default for PluginRegistry {
  fn default() -> Self {
    Self::new()
  }
}

/// Reject options a plugin does not know
pub(crate) fn reject_unknown_options(plugin: &str, options: &PluginOptions, known: &[&str]) -> Result<(), ConfigError> {
  match options.keys().find(|key| !known.contains(&key.as_str())) {
    Some(key) => Err(ConfigError::InvalidOption {
      plugin: plugin.to_string(),
      option: key.clone(),
      reason: format!("unknown option (expected one of: {})", known.join(", ")),
    }),
    None => Ok(()),
  }
}

/// Read an optional string option
pub(crate) fn string_option(plugin: &str, options: &PluginOptions, key: &str) -> Result<Option<String>, ConfigError> {
  match options.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s.clone())),
    Some(other) => Err(invalid_type(plugin, key, "a string", other)),
  }
}

/// Read an optional boolean option
pub(crate) fn bool_option(plugin: &str, options: &PluginOptions, key: &str) -> Result<Option<bool>, ConfigError> {
  match options.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Bool(b)) => Ok(Some(*b)),
    Some(other) => Err(invalid_type(plugin, key, "a boolean", other)),
  }
}

/// Read an optional option that is a string or a list of strings
pub(crate) fn string_list_option(
  plugin: &str,
  options: &PluginOptions,
  key: &str,
) -> Result<Option<Vec<String>>, ConfigError> {
  match options.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
    Some(Value::Array(items)) => items
      .iter()
      .map(|item| match item {
        Value::String(s) => Ok(s.clone()),
        other => Err(invalid_type(plugin, key, "a list of strings", other)),
      })
      .collect::<Result<Vec<_>, _>>()
      .map(Some),
    Some(other) => Err(invalid_type(plugin, key, "a string or a list of strings", other)),
  }
}

fn invalid_type(plugin: &str, key: &str, expected: &str, found: &Value) -> ConfigError {
  ConfigError::InvalidOption {
    plugin: plugin.to_string(),
    option: key.to_string(),
    reason: format!("expected {}, found {}", expected, found),
  }
}
