//! Release context - built once per run, threaded through every step
//!
//! # Design
//!
//! The engine owns a single [`ReleaseContext`]. Each lifecycle step hands
//! plugins a read-only view of it and folds their results back in before the
//! next plugin runs:
//!
//! ```text
//! engine:   branch, lastRelease, commits
//!   |
//!   v
//! analyze-commits  -> release_type
//! (engine)         -> nextRelease { version, gitTag, gitHead }
//! generate-notes   -> nextRelease.notes
//! publish-release  -> releases[]
//! ```

use crate::core::vcs::CommitInfo;
use crate::release::version::ReleaseType;
use semver::Version;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Branch the run releases from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRef {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub channel: Option<String>,
}

/// The most recent release reachable from HEAD
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRelease {
  pub version: Version,
  pub git_tag: String,
  pub git_head: String,
}

/// The release being produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRelease {
  #[serde(rename = "type")]
  pub release_type: ReleaseType,
  pub version: Version,
  pub git_tag: String,
  pub git_head: String,
  pub notes: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub channel: Option<String>,
}

/// A release published by a plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedRelease {
  pub plugin: String,
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
}

/// Accumulated data for one release run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseContext {
  /// Working tree root
  pub cwd: PathBuf,

  /// Remote tags and release commits are pushed to
  pub repository_url: String,

  /// Branch being released
  pub branch: BranchRef,

  /// No side effects beyond note generation
  pub dry_run: bool,

  /// Environment snapshot taken at startup
  #[serde(skip)]
  pub env: BTreeMap<String, String>,

  pub last_release: Option<LastRelease>,

  /// Commits since the last release, oldest first
  pub commits: Vec<CommitInfo>,

  /// Strongest bump reported by analyze-commits
  pub release_type: Option<ReleaseType>,

  pub next_release: Option<NextRelease>,

  pub releases: Vec<PublishedRelease>,
}

impl ReleaseContext {
  pub fn new(cwd: PathBuf, repository_url: String, branch: BranchRef, env: BTreeMap<String, String>) -> Self {
    Self {
      cwd,
      repository_url,
      branch,
      dry_run: false,
      env,
      last_release: None,
      commits: Vec::new(),
      release_type: None,
      next_release: None,
      releases: Vec::new(),
    }
  }

  /// Read an environment variable from the snapshot, ignoring empty values
  pub fn env_var(&self, name: &str) -> Option<&str> {
    self.env.get(name).map(String::as_str).filter(|v| !v.is_empty())
  }

  /// Notes accumulated so far (empty before generate-notes)
  pub fn notes(&self) -> &str {
    self.next_release.as_ref().map(|n| n.notes.as_str()).unwrap_or("")
  }

  /// Expand `${...}` placeholders used in plugin templates
  ///
  /// Known keys: `nextRelease.version`, `nextRelease.gitTag`,
  /// `nextRelease.notes`, `nextRelease.type`, `lastRelease.version`,
  /// `lastRelease.gitTag`, `branch.name`. Unknown placeholders are kept as-is.
  pub fn render_template(&self, template: &str) -> String {
    let mut values: Vec<(&str, String)> = vec![("branch.name", self.branch.name.clone())];

    if let Some(next) = &self.next_release {
      values.push(("nextRelease.version", next.version.to_string()));
      values.push(("nextRelease.gitTag", next.git_tag.clone()));
      values.push(("nextRelease.notes", next.notes.clone()));
      values.push(("nextRelease.type", next.release_type.to_string()));
    }

    let (last_version, last_tag) = match &self.last_release {
      Some(last) => (last.version.to_string(), last.git_tag.clone()),
      None => (String::new(), String::new()),
    };
    values.push(("lastRelease.version", last_version));
    values.push(("lastRelease.gitTag", last_tag));

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
      rendered.push_str(&rest[..start]);
      let after = &rest[start + 2..];
      match after.find('}') {
        Some(end) => {
          let key = &after[..end];
          match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => rendered.push_str(value),
            None => {
              rendered.push_str("${");
              rendered.push_str(key);
              rendered.push('}');
            }
          }
          rest = &after[end + 1..];
        }
        None => {
          rendered.push_str(&rest[start..]);
          rest = "";
        }
      }
    }
    rendered.push_str(rest);
    rendered
  }
}
