//! Version control access for the release engine and plugins
//!
//! Everything that reads or mutates the repository goes through the
//! [`Repository`] trait. [`SystemGit`] implements it on top of the `git`
//! binary; tests substitute an in-memory recorder.

pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::ReleaseResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Information about a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
  pub sha: String,
  pub author: String,
  pub author_email: String,
  pub message: String,
  pub timestamp: i64,
}

impl CommitInfo {
  /// Get the first line of the commit message
  pub fn summary(&self) -> &str {
    self.message.lines().next().unwrap_or("")
  }

  /// Abbreviated SHA for display
  pub fn short_sha(&self) -> &str {
    &self.sha[..self.sha.len().min(7)]
  }
}

/// Identity used for commits made by the release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
  pub name: String,
  pub email: String,
}

/// Repository operations needed by a release run
///
/// Read operations may be called at any point. Mutating operations
/// (`stage`, `commit`, `create_tag`, `push`) are only issued once commit
/// analysis has decided a release is due.
pub trait Repository {
  /// Working tree root
  fn root(&self) -> &Path;

  /// Currently checked-out branch (`HEAD` when detached)
  fn current_branch(&self) -> ReleaseResult<String>;

  /// SHA of HEAD
  fn head_commit(&self) -> ReleaseResult<String>;

  /// URL of a named remote, if configured
  fn remote_url(&self, name: &str) -> ReleaseResult<Option<String>>;

  /// Tags reachable from HEAD
  fn merged_tags(&self) -> ReleaseResult<Vec<String>>;

  /// Commit a tag points to, or `None` if the tag does not exist
  fn resolve_tag(&self, tag: &str) -> ReleaseResult<Option<String>>;

  /// Commits after `since` up to HEAD, oldest first (all of history when `None`)
  fn commits_since(&self, since: Option<&str>) -> ReleaseResult<Vec<CommitInfo>>;

  /// Stage paths relative to the working tree root
  fn stage(&self, paths: &[PathBuf]) -> ReleaseResult<()>;

  /// Whether the index differs from HEAD
  fn has_staged_changes(&self) -> ReleaseResult<bool>;

  /// Commit the index
  fn commit(&self, message: &str, author: &Signature) -> ReleaseResult<String>;

  /// Create a lightweight tag at `sha`
  fn create_tag(&self, tag: &str, sha: &str) -> ReleaseResult<()>;

  /// Push a refspec to a remote URL
  fn push(&self, remote: &str, refspec: &str) -> ReleaseResult<()>;
}
