//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config() -> Result<()> {
  let repo = TestRepo::new()?;

  run_semrel(&repo.path, &["init"], &[])?;

  assert!(repo.file_exists(".releaserc.json"));
  let config: serde_json::Value = serde_json::from_str(&repo.read_file(".releaserc.json")?)?;
  assert_eq!(config["branches"], serde_json::json!(["main"]));
  assert_eq!(config["repositoryUrl"], repo.remote.to_string_lossy().as_ref());
  assert_eq!(config["plugins"][0], "@semantic-release/commit-analyzer");

  // The starter config must pass validation as written
  run_semrel(&repo.path, &["config"], &[])?;
  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;
  let before = repo.read_file(".releaserc.json")?;

  let output = semrel(&repo.path, &["init"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));
  assert_eq!(repo.read_file(".releaserc.json")?, before);

  run_semrel(&repo.path, &["init", "--force"], &[])?;
  assert_ne!(repo.read_file(".releaserc.json")?, before);
  Ok(())
}

#[test]
fn test_init_without_git() -> Result<()> {
  let temp = tempfile::TempDir::new()?;

  run_semrel(temp.path(), &["init"], &[])?;

  let config: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(temp.path().join(".releaserc.json"))?)?;
  assert!(config.get("repositoryUrl").is_none());
  Ok(())
}
