//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Plugin chain used by most tests: everything except the GitHub plugin
pub const LOCAL_PLUGINS: &str = r#"[
    "@semantic-release/commit-analyzer",
    "@semantic-release/release-notes-generator",
    "@semantic-release/changelog",
    ["@semantic-release/git", { "assets": ["CHANGELOG.md"] }]
  ]"#;

/// A git repository with a bare remote it releases to
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
  pub remote: PathBuf,
}

impl TestRepo {
  /// Create a repo on `main` with a bare `origin` remote and one commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("work");
    let remote = root.path().join("remote.git");
    std::fs::create_dir_all(&path)?;

    git(root.path(), &["init", "--bare", "--initial-branch=main", "remote.git"])?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["remote", "add", "origin", &remote.to_string_lossy()])?;

    std::fs::write(path.join("README.md"), "# test\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "chore: initial commit"])?;

    Ok(Self {
      _root: root,
      path,
      remote,
    })
  }

  /// Write a JSON config releasing `main` to the bare remote
  pub fn write_config(&self, plugins: &str) -> Result<()> {
    let config = format!(
      r#"{{
  "branches": ["main"],
  "repositoryUrl": "{}",
  "plugins": {}
}}
"#,
      self.remote.to_string_lossy(),
      plugins
    );
    std::fs::write(self.path.join(".releaserc.json"), config)?;
    git(&self.path, &["add", ".releaserc.json"])?;
    git(&self.path, &["commit", "-m", "chore: add release config"])?;
    Ok(())
  }

  /// Write a file and commit it
  pub fn commit_file(&self, file: &str, content: &str, message: &str) -> Result<String> {
    std::fs::write(self.path.join(file), content)?;
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Tags in the local repository
  pub fn local_tags(&self) -> Result<Vec<String>> {
    lines(git(&self.path, &["tag", "--list"])?)
  }

  /// Tags that made it to the remote
  pub fn remote_tags(&self) -> Result<Vec<String>> {
    lines(git(&self.remote, &["tag", "--list"])?)
  }

  /// Subject of the newest commit on the remote's `main`
  pub fn remote_head_subject(&self) -> Result<String> {
    let output = git(&self.remote, &["log", "-1", "--format=%s", "main"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

fn lines(output: Output) -> Result<Vec<String>> {
  Ok(
    String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(String::from)
      .filter(|l| !l.is_empty())
      .collect(),
  )
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the semrel binary without judging its exit status
///
/// CI detection and GitHub Actions variables from the host are stripped so
/// runs behave the same locally and in CI; `env` is applied on top.
pub fn semrel(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_semrel"));
  cmd.current_dir(cwd).args(args);

  for var in [
    "CI",
    "GITHUB_REF_NAME",
    "GITHUB_REF_TYPE",
    "GITHUB_OUTPUT",
    "GH_TOKEN",
    "GITHUB_TOKEN",
    "RUST_LOG",
  ] {
    cmd.env_remove(var);
  }
  for (key, value) in env {
    cmd.env(key, value);
  }

  cmd.output().context("Failed to run semrel")
}

/// Run semrel and fail unless it exits successfully
pub fn run_semrel(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let output = semrel(cwd, args, env)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "semrel command failed: semrel {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Environment of a CI run
pub const CI: &[(&str, &str)] = &[("CI", "true")];
