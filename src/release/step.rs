//! Lifecycle steps of a release run

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named phase of the release pipeline that plugins may implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStep {
  /// Check credentials and options before anything happens
  VerifyConditions,
  /// Decide the release type from the commits
  AnalyzeCommits,
  /// Produce release notes
  GenerateNotes,
  /// Write the changelog file
  UpdateChangelog,
  /// Commit and push release assets
  PublishGitAssets,
  /// Publish the release to a remote service
  PublishRelease,
  /// Notify after a successful release
  Success,
  /// Notify after a failed release
  Fail,
}

impl LifecycleStep {
  /// The steps a release run executes, in order
  pub const PIPELINE: [LifecycleStep; 7] = [
    LifecycleStep::VerifyConditions,
    LifecycleStep::AnalyzeCommits,
    LifecycleStep::GenerateNotes,
    LifecycleStep::UpdateChangelog,
    LifecycleStep::PublishGitAssets,
    LifecycleStep::PublishRelease,
    LifecycleStep::Success,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      LifecycleStep::VerifyConditions => "verify-conditions",
      LifecycleStep::AnalyzeCommits => "analyze-commits",
      LifecycleStep::GenerateNotes => "generate-notes",
      LifecycleStep::UpdateChangelog => "update-changelog",
      LifecycleStep::PublishGitAssets => "publish-git-assets",
      LifecycleStep::PublishRelease => "publish-release",
      LifecycleStep::Success => "success",
      LifecycleStep::Fail => "fail",
    }
  }

  /// Steps that change files, the repository or a remote service
  pub fn has_side_effects(&self) -> bool {
    matches!(
      self,
      LifecycleStep::UpdateChangelog | LifecycleStep::PublishGitAssets | LifecycleStep::PublishRelease
    )
  }
}

impl fmt::Display for LifecycleStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
