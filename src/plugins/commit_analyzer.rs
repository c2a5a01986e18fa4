//! Release type from conventional commits
//!
//! Custom `releaseRules` are checked first. When several rules match a commit
//! the strongest of their release types applies; when every matching rule says
//! `"release": false` the commit calls for no release. Commits no custom rule
//! matches fall back to the default rules:
//!
//! | Commit | Release |
//! |---|---|
//! | breaking change (`!` or `BREAKING CHANGE:`) | major |
//! | `feat` | minor |
//! | `fix`, `perf`, `revert` | patch |
//!
//! The strongest release type over all commits wins.

use super::conventional::ConventionalCommit;
use super::{Plugin, StepContext, reject_unknown_options};
use crate::core::config::PluginOptions;
use crate::core::error::{ConfigError, ReleaseResult};
use crate::release::step::LifecycleStep;
use crate::release::version::ReleaseType;
use serde_json::Value;

const NAME: &str = "commit-analyzer";

/// A single `releaseRules` entry
#[derive(Debug, Clone)]
struct ReleaseRule {
  commit_type: Option<String>,
  scope: Option<glob::Pattern>,
  breaking: Option<bool>,
  /// `None` suppresses a release for matching commits
  release: Option<ReleaseType>,
}

impl ReleaseRule {
  fn parse(index: usize, value: &Value) -> Result<Self, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidOption {
      plugin: NAME.to_string(),
      option: format!("releaseRules[{}]", index),
      reason,
    };

    let Value::Object(map) = value else {
      return Err(invalid(format!("expected an object, found {}", value)));
    };

    let mut rule = ReleaseRule {
      commit_type: None,
      scope: None,
      breaking: None,
      release: None,
    };
    let mut has_release = false;

    for (key, value) in map {
      match (key.as_str(), value) {
        ("type", Value::String(t)) => rule.commit_type = Some(t.to_ascii_lowercase()),
        ("scope", Value::String(s)) => {
          rule.scope = Some(glob::Pattern::new(s).map_err(|e| invalid(format!("invalid scope pattern: {}", e)))?)
        }
        ("breaking", Value::Bool(b)) => rule.breaking = Some(*b),
        ("release", Value::Bool(false)) => has_release = true,
        ("release", Value::String(r)) => {
          rule.release =
            Some(ReleaseType::from_name(r).ok_or_else(|| invalid(format!("unknown release type '{}'", r)))?);
          has_release = true;
        }
        (key, value) => return Err(invalid(format!("unsupported field '{}': {}", key, value))),
      }
    }

    if !has_release {
      return Err(invalid("missing 'release'".to_string()));
    }

    Ok(rule)
  }

  fn matches(&self, commit: &ConventionalCommit) -> bool {
    if let Some(commit_type) = &self.commit_type
      && commit_type != &commit.commit_type
    {
      return false;
    }

    if let Some(scope) = &self.scope {
      match &commit.scope {
        Some(s) if scope.matches(s) => {}
        _ => return false,
      }
    }

    if let Some(breaking) = self.breaking
      && breaking != commit.is_breaking()
    {
      return false;
    }

    true
  }
}

/// Determines the release type from the commits since the last release
pub struct CommitAnalyzer {
  rules: Vec<ReleaseRule>,
}

impl CommitAnalyzer {
  pub fn from_options(options: &PluginOptions) -> Result<Self, ConfigError> {
    reject_unknown_options(NAME, options, &["releaseRules", "preset"])?;

    if let Some(preset) = options.get("preset")
      && preset.as_str() != Some("angular")
      && preset.as_str() != Some("conventionalcommits")
    {
      return Err(ConfigError::InvalidOption {
        plugin: NAME.to_string(),
        option: "preset".to_string(),
        reason: format!("unsupported preset {}", preset),
      });
    }

    let rules = match options.get("releaseRules") {
      None | Some(Value::Null) => Vec::new(),
      Some(Value::Array(items)) => items
        .iter()
        .enumerate()
        .map(|(i, item)| ReleaseRule::parse(i, item))
        .collect::<Result<Vec<_>, _>>()?,
      Some(other) => {
        return Err(ConfigError::InvalidOption {
          plugin: NAME.to_string(),
          option: "releaseRules".to_string(),
          reason: format!("expected a list of rules, found {}", other),
        });
      }
    };

    Ok(Self { rules })
  }

  /// Release type a single commit calls for
  fn classify(&self, commit: &ConventionalCommit) -> Option<ReleaseType> {
    let mut matching = self.rules.iter().filter(|r| r.matches(commit)).peekable();
    if matching.peek().is_some() {
      return matching.filter_map(|rule| rule.release).max();
    }

    if commit.is_breaking() {
      return Some(ReleaseType::Major);
    }

    match commit.commit_type.as_str() {
      "feat" => Some(ReleaseType::Minor),
      "fix" | "perf" | "revert" => Some(ReleaseType::Patch),
      _ => None,
    }
  }

  /// Strongest release type over a list of commit messages
  fn analyze<'m>(&self, messages: impl IntoIterator<Item = &'m str>) -> Option<ReleaseType> {
    messages
      .into_iter()
      .filter_map(ConventionalCommit::parse)
      .filter_map(|commit| {
        let release = self.classify(&commit);
        tracing::trace!(commit = %commit.description, release = ?release, "analyzed commit");
        release
      })
      .max()
  }
}

impl Plugin for CommitAnalyzer {
  fn steps(&self) -> &[LifecycleStep] {
    &[LifecycleStep::AnalyzeCommits]
  }

  fn analyze_commits(&self, ctx: &StepContext<'_>) -> ReleaseResult<Option<ReleaseType>> {
    let release = self.analyze(ctx.release.commits.iter().map(|c| c.message.as_str()));
    tracing::debug!(
      commits = ctx.release.commits.len(),
      release = release.map(|r| r.as_str()).unwrap_or("none"),
      "commit analysis finished"
    );
    Ok(release)
  }
}
