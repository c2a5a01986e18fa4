//! Tests for config loading, `semrel config` and `semrel plugins`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_unknown_plugin_is_user_error() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(r#"["@semantic-release/commit-analyzer", "semantic-release-slack-bot"]"#)?;
  repo.commit_file("lib.txt", "x\n", "feat: something")?;

  let output = semrel(&repo.path, &["release"], CI)?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
  assert!(stderr.contains("plugins[1]"));
  assert!(stderr.contains("semantic-release-slack-bot"));
  assert!(stderr.contains("semrel plugins"));
  assert!(repo.local_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_missing_config_is_user_error() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = semrel(&repo.path, &["release"], CI)?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("No release configuration found"));
  assert!(stderr.contains("semrel init"));
  Ok(())
}

#[test]
fn test_invalid_plugin_option_is_user_error() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(r#"[["@semantic-release/changelog", { "changelogFile": 42 }]]"#)?;

  let output = semrel(&repo.path, &["config"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
  assert!(stderr.contains("field: plugins.@semantic-release/changelog.changelogFile"));
  Ok(())
}

#[test]
fn test_config_renders_toml() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(LOCAL_PLUGINS)?;

  let output = run_semrel(&repo.path, &["config", "--toml"], &[])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  let parsed: toml_edit::DocumentMut = stdout.parse()?;
  assert_eq!(parsed["branches"][0].as_str(), Some("main"), "stdout: {}", stdout);
  assert!(stdout.contains("@semantic-release/git"));
  Ok(())
}

#[test]
fn test_explicit_toml_config() -> Result<()> {
  let repo = TestRepo::new()?;
  std::fs::write(
    repo.path.join("ci-release.toml"),
    format!(
      r#"branches = ["main"]
repositoryUrl = "{}"
tagFormat = "release-${{version}}"
plugins = ["@semantic-release/commit-analyzer", "@semantic-release/release-notes-generator"]
"#,
      repo.remote.to_string_lossy()
    ),
  )?;
  repo.commit_file("lib.txt", "x\n", "feat: something")?;

  let output = run_semrel(&repo.path, &["plan", "--json", "--config", "ci-release.toml"], CI)?;
  let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(summary["release"]["nextRelease"]["gitTag"], "release-1.0.0");
  Ok(())
}

#[test]
fn test_plugins_json_lists_builtins() -> Result<()> {
  let temp = tempfile::TempDir::new()?;

  let output = run_semrel(temp.path(), &["plugins", "--json"], &[])?;
  let plugins: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout)?;

  let identifiers: Vec<&str> = plugins.iter().filter_map(|p| p["identifier"].as_str()).collect();
  for expected in [
    "@semantic-release/commit-analyzer",
    "@semantic-release/release-notes-generator",
    "@semantic-release/changelog",
    "@semantic-release/git",
    "@semantic-release/github",
    "semantic-release-export-data",
  ] {
    assert!(identifiers.contains(&expected), "missing {}", expected);
  }
  Ok(())
}
