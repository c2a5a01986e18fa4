//! Repository operations for SystemGit (history walking, tags, commits, pushes)

use super::system_git::SystemGit;
use super::{CommitInfo, Repository, Signature};
use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use std::path::{Path, PathBuf};

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

impl Repository for SystemGit {
  fn root(&self) -> &Path {
    &self.work_tree
  }

  fn current_branch(&self) -> ReleaseResult<String> {
    self.branch_name()
  }

  fn head_commit(&self) -> ReleaseResult<String> {
    self.head_sha()
  }

  fn remote_url(&self, name: &str) -> ReleaseResult<Option<String>> {
    let output = self
      .git_cmd()
      .args(["remote", "get-url", name])
      .output()
      .context("Failed to read remote URL")?;

    if !output.status.success() {
      return Ok(None);
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!url.is_empty()).then_some(url))
  }

  fn merged_tags(&self) -> ReleaseResult<Vec<String>> {
    // Unborn HEAD has no tags to speak of
    if self.head_sha().is_err() {
      return Ok(Vec::new());
    }

    let output = self.run(&["tag", "--merged", "HEAD"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect(),
    )
  }

  fn resolve_tag(&self, tag: &str) -> ReleaseResult<Option<String>> {
    let spec = format!("refs/tags/{}^{{commit}}", tag);
    let output = self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &spec])
      .output()
      .context("Failed to resolve tag")?;

    if !output.status.success() {
      return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
  }

  /// Uses `git log --reverse` with unit/record separators so multi-line
  /// messages survive parsing.
  fn commits_since(&self, since: Option<&str>) -> ReleaseResult<Vec<CommitInfo>> {
    let format = "--format=%H%x1f%an%x1f%ae%x1f%ct%x1f%B%x1e";
    let range = match since {
      Some(sha) => format!("{}..HEAD", sha),
      None => "HEAD".to_string(),
    };

    if since.is_none() && self.head_sha().is_err() {
      return Ok(Vec::new());
    }

    let output = self.run(&["log", "--reverse", format, &range])?;
    Ok(parse_log_output(&String::from_utf8_lossy(&output.stdout)))
  }

  fn stage(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    if paths.is_empty() {
      return Ok(());
    }

    let mut args = vec!["add".to_string(), "--force".to_string(), "--ignore-errors".to_string(), "--".to_string()];
    args.extend(paths.iter().map(|p| crate::utils::path_to_git_format(p)));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    self.run(&args)?;
    Ok(())
  }

  fn has_staged_changes(&self) -> ReleaseResult<bool> {
    let output = self
      .git_cmd()
      .args(["diff", "--cached", "--quiet"])
      .output()
      .context("Failed to inspect the index")?;

    // Exit code 1 means "differences found"
    match output.status.code() {
      Some(0) => Ok(false),
      Some(1) => Ok(true),
      _ => Err(ReleaseError::Git(GitError::CommandFailed {
        command: "git diff --cached --quiet".to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      })),
    }
  }

  fn commit(&self, message: &str, author: &Signature) -> ReleaseResult<String> {
    let name = format!("user.name={}", author.name);
    let email = format!("user.email={}", author.email);
    self.run(&[
      "-c",
      &name,
      "-c",
      &email,
      "-c",
      "commit.gpgSign=false",
      "commit",
      "--no-verify",
      "-m",
      message,
    ])?;
    self.head_sha()
  }

  fn create_tag(&self, tag: &str, sha: &str) -> ReleaseResult<()> {
    if self.resolve_tag(tag)?.is_some() {
      return Err(ReleaseError::Git(GitError::TagExists { tag: tag.to_string() }));
    }
    self.run(&["tag", tag, sha])?;
    Ok(())
  }

  fn push(&self, remote: &str, refspec: &str) -> ReleaseResult<()> {
    let output = self
      .git_cmd()
      .args(["push", remote, refspec])
      .output()
      .context("Failed to run git push")?;

    if !output.status.success() {
      return Err(ReleaseError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        refspec: refspec.to_string(),
        reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }

    Ok(())
  }
}

/// Parse `git log` output produced with the separator format above
fn parse_log_output(stdout: &str) -> Vec<CommitInfo> {
  stdout
    .split(RECORD_SEP)
    .filter_map(|record| {
      let record = record.trim_start_matches('\n');
      if record.trim().is_empty() {
        return None;
      }

      let mut fields = record.splitn(5, FIELD_SEP);
      let sha = fields.next()?.trim().to_string();
      let author = fields.next()?.to_string();
      let author_email = fields.next()?.to_string();
      let timestamp = fields.next()?.trim().parse().unwrap_or(0);
      let message = fields.next().unwrap_or("").trim_end().to_string();

      Some(CommitInfo {
        sha,
        author,
        author_email,
        message,
        timestamp,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_log_output() {
    let raw = format!(
      "{sha1}\u{1f}Alice\u{1f}alice@example.com\u{1f}1699999999\u{1f}feat: add thing\n\nBody line\n\u{1e}\n\
       {sha2}\u{1f}Bob\u{1f}bob@example.com\u{1f}1700000000\u{1f}fix: repair\n\u{1e}\n",
      sha1 = "a".repeat(40),
      sha2 = "b".repeat(40),
    );

    let commits = parse_log_output(&raw);
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].sha, "a".repeat(40));
    assert_eq!(commits[0].author, "Alice");
    assert_eq!(commits[0].message, "feat: add thing\n\nBody line");
    assert_eq!(commits[0].timestamp, 1699999999);
    assert_eq!(commits[1].summary(), "fix: repair");
    assert_eq!(commits[1].short_sha(), "bbbbbbb");
  }

  #[test]
  fn test_parse_empty_log() {
    assert!(parse_log_output("").is_empty());
    assert!(parse_log_output("\n").is_empty());
  }
}
