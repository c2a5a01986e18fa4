//! Release configuration loading and validation
//!
//! The configuration is a single declarative object:
//!
//! ```json
//! {
//!   "branches": ["main"],
//!   "repositoryUrl": "git@github.com:owner/repo.git",
//!   "plugins": [
//!     "@semantic-release/commit-analyzer",
//!     "@semantic-release/release-notes-generator",
//!     ["@semantic-release/git", { "assets": ["CHANGELOG.md"] }]
//!   ]
//! }
//! ```
//!
//! Searched in order: .releaserc, .releaserc.json (JSON), .releaserc.toml,
//! release.toml (TOML). The TOML form uses the same keys:
//!
//! ```toml
//! branches = ["main"]
//! plugins = ["commit-analyzer", ["git", { assets = ["CHANGELOG.md"] }]]
//! ```
//!
//! Loading never touches anything but the config file itself.

use crate::core::error::{ConfigError, ReleaseResult, ResultExt};
use crate::plugins::PluginRegistry;
use crate::release::version::TagFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Free-form options object attached to a plugin entry
pub type PluginOptions = serde_json::Map<String, serde_json::Value>;

/// Config file names, in search order
pub const CONFIG_FILE_NAMES: [&str; 4] = [".releaserc", ".releaserc.json", ".releaserc.toml", "release.toml"];

const DEFAULT_TAG_FORMAT: &str = "v${version}";

/// Serialization format of a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
  Json,
  Toml,
}

impl ConfigFormat {
  /// Pick the format from a file extension (`.toml` is TOML, everything else JSON)
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|e| e.to_str()) {
      Some("toml") => ConfigFormat::Toml,
      _ => ConfigFormat::Json,
    }
  }
}

/// The release configuration, read once per run and never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReleaseConfig {
  /// Branches a release may be cut from
  #[serde(default)]
  pub branches: Vec<BranchSpec>,

  /// Remote to push tags and release commits to (default: `origin`'s URL)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repository_url: Option<String>,

  /// Plugin chain; declaration order is execution order within each step
  #[serde(default = "default_plugins")]
  pub plugins: Vec<PluginSpec>,

  /// Git tag template, must contain `${version}` once
  #[serde(default = "default_tag_format", skip_serializing_if = "is_default_tag_format")]
  pub tag_format: String,

  /// Stop after release notes are generated
  #[serde(default, skip_serializing_if = "is_false")]
  pub dry_run: bool,

  /// Only publish from a CI environment
  #[serde(default = "default_true", skip_serializing_if = "is_true")]
  pub ci: bool,
}

fn default_plugins() -> Vec<PluginSpec> {
  vec![
    PluginSpec::new("@semantic-release/commit-analyzer"),
    PluginSpec::new("@semantic-release/release-notes-generator"),
    PluginSpec::new("@semantic-release/github"),
  ]
}

fn default_tag_format() -> String {
  DEFAULT_TAG_FORMAT.to_string()
}

fn is_default_tag_format(format: &str) -> bool {
  format == DEFAULT_TAG_FORMAT
}

fn default_true() -> bool {
  true
}

fn is_true(value: &bool) -> bool {
  *value
}

fn is_false(value: &bool) -> bool {
  !*value
}

/// A release branch: a bare glob pattern or an object with a distribution channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BranchSpec {
  Name(String),
  Detailed {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
  },
}

impl BranchSpec {
  /// Pattern the branch name is matched against
  pub fn pattern(&self) -> &str {
    match self {
      BranchSpec::Name(name) => name,
      BranchSpec::Detailed { name, .. } => name,
    }
  }

  /// Distribution channel for releases cut from this branch
  pub fn channel(&self) -> Option<&str> {
    match self {
      BranchSpec::Name(_) => None,
      BranchSpec::Detailed { channel, .. } => channel.as_deref(),
    }
  }

  /// Check whether a concrete branch name matches this spec
  pub fn matches(&self, branch: &str) -> bool {
    let pattern = self.pattern();
    if pattern == branch {
      return true;
    }
    glob::Pattern::new(pattern)
      .map(|p| p.matches_with(branch, glob_options()))
      .unwrap_or(false)
  }
}

fn glob_options() -> glob::MatchOptions {
  glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
  }
}

/// One entry of the plugin chain
///
/// Serialized either as a bare identifier (`"@semantic-release/github"`) or as
/// an `[identifier, options]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PluginEntry", into = "PluginEntry")]
pub struct PluginSpec {
  pub identifier: String,
  pub options: Option<PluginOptions>,
}

impl PluginSpec {
  /// Plugin entry without options
  pub fn new(identifier: impl Into<String>) -> Self {
    Self {
      identifier: identifier.into(),
      options: None,
    }
  }

  /// Plugin entry with an options object
  pub fn with_options(identifier: impl Into<String>, options: PluginOptions) -> Self {
    Self {
      identifier: identifier.into(),
      options: Some(options),
    }
  }

  /// Options, or an empty map when none were given
  pub fn options_or_empty(&self) -> PluginOptions {
    self.options.clone().unwrap_or_default()
  }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PluginEntry {
  Bare(String),
  Configured(String, PluginOptions),
}

impl From<PluginEntry> for PluginSpec {
  fn from(entry: PluginEntry) -> Self {
    match entry {
      PluginEntry::Bare(identifier) => PluginSpec::new(identifier),
      PluginEntry::Configured(identifier, options) => PluginSpec::with_options(identifier, options),
    }
  }
}

impl From<PluginSpec> for PluginEntry {
  fn from(spec: PluginSpec) -> Self {
    match spec.options {
      None => PluginEntry::Bare(spec.identifier),
      Some(options) => PluginEntry::Configured(spec.identifier, options),
    }
  }
}

impl ReleaseConfig {
  /// Find config file in search order: .releaserc, .releaserc.json, .releaserc.toml, release.toml
  pub fn find_config_path(cwd: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)).find(|p| p.is_file())
  }

  /// Load the config file, either the explicit path or the first one found in `cwd`
  ///
  /// Returns the parsed (not yet validated) config and the path it came from.
  pub fn load(cwd: &Path, explicit: Option<&Path>) -> ReleaseResult<(Self, PathBuf)> {
    let config_path = match explicit {
      Some(path) if path.is_absolute() => path.to_path_buf(),
      Some(path) => cwd.join(path),
      None => Self::find_config_path(cwd).ok_or_else(|| ConfigError::NotFound { cwd: cwd.to_path_buf() })?,
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content, ConfigFormat::from_path(&config_path), &config_path)?;

    tracing::debug!(path = %config_path.display(), plugins = config.plugins.len(), "loaded release config");
    Ok((config, config_path))
  }

  /// Load and validate in one go
  pub fn load_validated(
    cwd: &Path,
    explicit: Option<&Path>,
    registry: &PluginRegistry,
  ) -> ReleaseResult<(Self, PathBuf)> {
    let (config, path) = Self::load(cwd, explicit)?;
    config.validate(registry)?;
    Ok((config, path))
  }

  /// Parse raw config text
  pub fn parse(content: &str, format: ConfigFormat, path: &Path) -> Result<Self, ConfigError> {
    let parsed = match format {
      ConfigFormat::Json => serde_json::from_str::<Self>(content).map_err(|e| e.to_string()),
      ConfigFormat::Toml => toml_edit::de::from_str::<Self>(content).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| ConfigError::Parse {
      path: path.to_path_buf(),
      message,
    })
  }

  /// Validate the config against the known plugins
  ///
  /// Checks, in order: branches, repository URL, tag format, then every plugin
  /// entry (identifier first, then its options). The first problem wins.
  pub fn validate(&self, registry: &PluginRegistry) -> Result<(), ConfigError> {
    if self.branches.is_empty() {
      return Err(ConfigError::EmptyBranches);
    }

    for branch in &self.branches {
      let pattern = branch.pattern();
      if pattern.trim().is_empty() {
        return Err(ConfigError::InvalidBranch {
          pattern: pattern.to_string(),
          reason: "branch name is empty".to_string(),
        });
      }
      if let Err(err) = glob::Pattern::new(pattern) {
        return Err(ConfigError::InvalidBranch {
          pattern: pattern.to_string(),
          reason: err.to_string(),
        });
      }
    }

    if let Some(url) = &self.repository_url
      && !crate::utils::is_valid_remote_url(url)
    {
      return Err(ConfigError::InvalidRepositoryUrl { url: url.clone() });
    }

    TagFormat::parse(&self.tag_format)?;

    for (index, spec) in self.plugins.iter().enumerate() {
      if !registry.contains(&spec.identifier) {
        return Err(ConfigError::UnknownPlugin {
          identifier: spec.identifier.clone(),
          index,
        });
      }
      registry.check_options(spec)?;
    }

    Ok(())
  }

  /// Find the first configured branch matching `branch`
  pub fn match_branch(&self, branch: &str) -> Option<&BranchSpec> {
    self.branches.iter().find(|b| b.matches(branch))
  }

  /// Render the config in the given format
  pub fn render(&self, format: ConfigFormat) -> ReleaseResult<String> {
    match format {
      ConfigFormat::Json => Ok(serde_json::to_string_pretty(self)?),
      ConfigFormat::Toml => Ok(toml_edit::ser::to_string_pretty(self)?),
    }
  }

  /// Write the config to `path` in the format its extension implies
  pub fn save(&self, path: &Path) -> ReleaseResult<()> {
    let mut content = self.render(ConfigFormat::from_path(path))?;
    if !content.ends_with('\n') {
      content.push('\n');
    }
    fs::write(path, content).with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
  }

  /// The configuration shipped by `semrel init`
  pub fn starter(repository_url: Option<String>) -> Self {
    let mut git_options = PluginOptions::new();
    git_options.insert("assets".to_string(), serde_json::json!(["CHANGELOG.md"]));

    Self {
      branches: vec![BranchSpec::Name("main".to_string())],
      repository_url,
      plugins: vec![
        PluginSpec::new("@semantic-release/commit-analyzer"),
        PluginSpec::new("semantic-release-export-data"),
        PluginSpec::new("@semantic-release/release-notes-generator"),
        PluginSpec::new("@semantic-release/changelog"),
        PluginSpec::new("@semantic-release/github"),
        PluginSpec::with_options("@semantic-release/git", git_options),
      ],
      tag_format: default_tag_format(),
      dry_run: false,
      ci: true,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE_JSON: &str = r#"{
    "branches": ["main"],
    "repositoryUrl": "git@github.com:telekom/gateway-kong-image.git",
    "plugins": [
      "@semantic-release/commit-analyzer",
      "semantic-release-export-data",
      "@semantic-release/release-notes-generator",
      "@semantic-release/changelog",
      "@semantic-release/github",
      ["@semantic-release/git", { "assets": ["CHANGELOG.md"] }]
    ]
  }"#;

  fn parse_json(content: &str) -> Result<ReleaseConfig, ConfigError> {
    ReleaseConfig::parse(content, ConfigFormat::Json, Path::new(".releaserc.json"))
  }

  #[test]
  fn test_parse_sample_config() {
    let config = parse_json(SAMPLE_JSON).unwrap();

    assert_eq!(config.branches, vec![BranchSpec::Name("main".to_string())]);
    assert_eq!(
      config.repository_url.as_deref(),
      Some("git@github.com:telekom/gateway-kong-image.git")
    );
    assert_eq!(config.plugins.len(), 6);
    assert_eq!(config.plugins[0].identifier, "@semantic-release/commit-analyzer");
    assert!(config.plugins[0].options.is_none());

    let git = &config.plugins[5];
    assert_eq!(git.identifier, "@semantic-release/git");
    assert_eq!(git.options.as_ref().unwrap()["assets"], serde_json::json!(["CHANGELOG.md"]));

    assert_eq!(config.tag_format, "v${version}");
    assert!(config.ci);
    assert!(!config.dry_run);
  }

  #[test]
  fn test_validate_sample_config() {
    let config = parse_json(SAMPLE_JSON).unwrap();
    let registry = PluginRegistry::with_builtin_plugins();
    assert!(config.validate(&registry).is_ok());
  }

  #[test]
  fn test_json_round_trip_preserves_order() {
    let config = parse_json(SAMPLE_JSON).unwrap();
    let rendered = config.render(ConfigFormat::Json).unwrap();
    let reparsed = parse_json(&rendered).unwrap();

    assert_eq!(reparsed, config);
    let ids: Vec<_> = reparsed.plugins.iter().map(|p| p.identifier.as_str()).collect();
    assert_eq!(
      ids,
      vec![
        "@semantic-release/commit-analyzer",
        "semantic-release-export-data",
        "@semantic-release/release-notes-generator",
        "@semantic-release/changelog",
        "@semantic-release/github",
        "@semantic-release/git",
      ]
    );
  }

  #[test]
  fn test_toml_round_trip() {
    let config = parse_json(SAMPLE_JSON).unwrap();
    let rendered = config.render(ConfigFormat::Toml).unwrap();
    let reparsed = ReleaseConfig::parse(&rendered, ConfigFormat::Toml, Path::new("release.toml")).unwrap();
    assert_eq!(reparsed, config);
  }

  #[test]
  fn test_parse_toml_config() {
    let content = r#"
branches = ["main", { name = "beta", channel = "beta" }]
repositoryUrl = "https://github.com/owner/repo.git"
plugins = ["commit-analyzer", ["git", { assets = ["CHANGELOG.md", "dist/*.tar.gz"] }]]
tagFormat = "release-${version}"
"#;
    let config = ReleaseConfig::parse(content, ConfigFormat::Toml, Path::new("release.toml")).unwrap();

    assert_eq!(config.branches.len(), 2);
    assert_eq!(config.branches[1].channel(), Some("beta"));
    assert_eq!(config.plugins[1].identifier, "git");
    assert_eq!(config.tag_format, "release-${version}");
  }

  #[test]
  fn test_empty_branches_rejected() {
    let config = parse_json(r#"{ "branches": [], "plugins": [] }"#).unwrap();
    let err = config.validate(&PluginRegistry::with_builtin_plugins()).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyBranches));
    assert_eq!(err.field(), "branches");
  }

  #[test]
  fn test_missing_branches_rejected() {
    let config = parse_json(r#"{ "plugins": [] }"#).unwrap();
    let err = config.validate(&PluginRegistry::with_builtin_plugins()).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyBranches));
  }

  #[test]
  fn test_unknown_plugin_rejected() {
    let config = parse_json(r#"{ "branches": ["main"], "plugins": ["commit-analyzer", "@acme/unknown"] }"#).unwrap();
    let err = config.validate(&PluginRegistry::with_builtin_plugins()).unwrap_err();
    match err {
      ConfigError::UnknownPlugin { identifier, index } => {
        assert_eq!(identifier, "@acme/unknown");
        assert_eq!(index, 1);
      }
      other => panic!("expected unknown plugin, got {:?}", other),
    }
  }

  #[test]
  fn test_malformed_repository_url_rejected() {
    let config = parse_json(r#"{ "branches": ["main"], "repositoryUrl": "not a url", "plugins": [] }"#).unwrap();
    let err = config.validate(&PluginRegistry::with_builtin_plugins()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRepositoryUrl { .. }));
    assert_eq!(err.field(), "repositoryUrl");
  }

  #[test]
  fn test_bad_tag_format_rejected() {
    let config = parse_json(r#"{ "branches": ["main"], "tagFormat": "release", "plugins": [] }"#).unwrap();
    let err = config.validate(&PluginRegistry::with_builtin_plugins()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTagFormat { .. }));
  }

  #[test]
  fn test_invalid_plugin_options_rejected() {
    let config = parse_json(r#"{ "branches": ["main"], "plugins": [["@semantic-release/git", { "assets": 42 }]] }"#)
      .unwrap();
    let err = config.validate(&PluginRegistry::with_builtin_plugins()).unwrap_err();
    match err {
      ConfigError::InvalidOption { plugin, .. } => assert_eq!(plugin, "@semantic-release/git"),
      other => panic!("expected invalid option, got {:?}", other),
    }
  }

  #[test]
  fn test_unknown_top_level_field_rejected() {
    let err = parse_json(r#"{ "branches": ["main"], "brnaches": ["dev"] }"#).unwrap_err();
    assert!(err.to_string().contains("brnaches"));
  }

  #[test]
  fn test_default_plugins_when_omitted() {
    let config = parse_json(r#"{ "branches": ["main"] }"#).unwrap();
    let ids: Vec<_> = config.plugins.iter().map(|p| p.identifier.as_str()).collect();
    assert_eq!(
      ids,
      vec![
        "@semantic-release/commit-analyzer",
        "@semantic-release/release-notes-generator",
        "@semantic-release/github",
      ]
    );
  }

  #[test]
  fn test_branch_matching() {
    let config = parse_json(r#"{ "branches": ["main", "release/*", { "name": "next", "channel": "next" }] }"#).unwrap();

    assert_eq!(config.match_branch("main").map(|b| b.pattern()), Some("main"));
    assert_eq!(config.match_branch("release/1.x").map(|b| b.pattern()), Some("release/*"));
    assert!(config.match_branch("release/1.x/hotfix").is_none());
    assert_eq!(config.match_branch("next").and_then(|b| b.channel()), Some("next"));
    assert!(config.match_branch("feature/foo").is_none());
  }

  #[test]
  fn test_starter_config_is_valid() {
    let config = ReleaseConfig::starter(Some("git@github.com:owner/repo.git".to_string()));
    assert!(config.validate(&PluginRegistry::with_builtin_plugins()).is_ok());
  }
}
