//! Tests for `semrel release` and `semrel plan`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_chore_only_history_releases_nothing() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;
  repo.commit_file("notes.txt", "x\n", "docs: explain things")?;

  let output = run_semrel(&repo.path, &["release"], CI)?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Nothing to release"), "stdout: {}", stdout);
  assert!(repo.local_tags()?.is_empty());
  assert!(repo.remote_tags()?.is_empty());
  assert!(!repo.file_exists("CHANGELOG.md"));

  Ok(())
}

#[test]
fn test_github_output_only_written_for_releases() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(r#"["commit-analyzer", "release-notes-generator", "export-data"]"#)?;
  repo.commit_file("notes.txt", "x\n", "docs: explain things")?;

  let outputs = tempfile::TempDir::new()?;
  let github_output = outputs.path().join("github_output");
  let github_output_str = github_output.to_string_lossy().to_string();
  let env = [("CI", "true"), ("GITHUB_OUTPUT", github_output_str.as_str())];

  run_semrel(&repo.path, &["release"], &env)?;
  assert!(!github_output.exists());

  repo.commit_file("lib.txt", "x\n", "fix: handle empty input")?;
  run_semrel(&repo.path, &["release"], &env)?;
  assert_eq!(
    std::fs::read_to_string(&github_output)?,
    "new-release-published=true\nnew-release-version=1.0.0\nnew-release-git-tag=v1.0.0\n"
  );

  Ok(())
}

#[test]
fn test_first_release() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;
  repo.commit_file("lib.txt", "login\n", "feat(auth): add login")?;

  let output = run_semrel(&repo.path, &["release"], CI)?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Released v1.0.0"), "stdout: {}", stdout);

  assert_eq!(repo.local_tags()?, vec!["v1.0.0"]);
  assert_eq!(repo.remote_tags()?, vec!["v1.0.0"]);
  assert_eq!(repo.remote_head_subject()?, "chore(release): 1.0.0 [skip ci]");

  let changelog = repo.read_file("CHANGELOG.md")?;
  assert!(changelog.contains("### Features"));
  assert!(changelog.contains("**auth:** add login"));

  Ok(())
}

#[test]
fn test_patch_after_previous_release() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;
  repo.commit_file("lib.txt", "login\n", "feat: add login")?;
  run_semrel(&repo.path, &["release"], CI)?;

  repo.commit_file("lib.txt", "login fixed\n", "fix: handle empty password")?;
  run_semrel(&repo.path, &["release"], CI)?;

  let mut tags = repo.remote_tags()?;
  tags.sort();
  assert_eq!(tags, vec!["v1.0.0", "v1.0.1"]);

  let changelog = repo.read_file("CHANGELOG.md")?;
  let newer = changelog.find("handle empty password").unwrap();
  let older = changelog.find("add login").unwrap();
  assert!(newer < older, "newest notes go on top:\n{}", changelog);

  Ok(())
}

#[test]
fn test_outside_ci_is_dry_run() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;
  repo.commit_file("lib.txt", "login\n", "feat: add login")?;

  let output = run_semrel(&repo.path, &["release"], &[])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Dry run"), "stdout: {}", stdout);
  assert!(stdout.contains("v1.0.0"));
  assert!(repo.local_tags()?.is_empty());
  assert!(!repo.file_exists("CHANGELOG.md"));

  Ok(())
}

#[test]
fn test_no_ci_flag_publishes_locally() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;
  repo.commit_file("lib.txt", "login\n", "feat: add login")?;

  run_semrel(&repo.path, &["release", "--no-ci"], &[])?;

  assert_eq!(repo.remote_tags()?, vec!["v1.0.0"]);
  Ok(())
}

#[test]
fn test_plan_json_has_no_side_effects() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;
  repo.commit_file("lib.txt", "a\n", "fix: first fix")?;

  let output = run_semrel(&repo.path, &["plan", "--json"], CI)?;
  let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(summary["status"], "dry-run");
  assert_eq!(summary["branch"], "main");
  assert_eq!(summary["release"]["nextRelease"]["gitTag"], "v1.0.0");
  assert_eq!(summary["release"]["nextRelease"]["type"], "patch");
  assert!(
    summary["release"]["nextRelease"]["notes"]
      .as_str()
      .unwrap()
      .contains("first fix")
  );

  assert!(repo.local_tags()?.is_empty());
  assert!(!repo.file_exists("CHANGELOG.md"));
  Ok(())
}

#[test]
fn test_other_branch_is_not_released() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;
  git(&repo.path, &["checkout", "-b", "feature/login"])?;
  repo.commit_file("lib.txt", "login\n", "feat: add login")?;

  let output = run_semrel(&repo.path, &["release", "--json"], CI)?;
  let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(summary["status"], "not-release-branch");
  assert_eq!(summary["branch"], "feature/login");
  assert!(repo.local_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_existing_tag_fails_with_system_exit_code() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;

  // v1.0.0 exists but is not reachable from main, so it is not the last release
  git(&repo.path, &["checkout", "-b", "side"])?;
  repo.commit_file("side.txt", "x\n", "chore: side work")?;
  git(&repo.path, &["tag", "v1.0.0"])?;
  git(&repo.path, &["checkout", "main"])?;
  repo.commit_file("lib.txt", "login\n", "feat: add login")?;

  let output = semrel(&repo.path, &["release"], CI)?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr);
  assert!(stderr.contains("v1.0.0"));
  assert!(!repo.file_exists("CHANGELOG.md"));
  assert!(repo.remote_tags()?.is_empty());
  Ok(())
}
