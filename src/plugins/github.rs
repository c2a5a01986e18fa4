//! GitHub releases
//!
//! Creates a release for the new tag through the REST API
//! (`POST /repos/{owner}/{repo}/releases`). The token is read from `GH_TOKEN`
//! or `GITHUB_TOKEN`. GitHub Enterprise works by setting `githubUrl` (and
//! `githubApiUrl` when the API is not served under `/api/v3`).

use super::{Plugin, StepContext, bool_option, reject_unknown_options, string_option};
use crate::core::config::PluginOptions;
use crate::core::context::{PublishedRelease, ReleaseContext};
use crate::core::error::{ConfigError, PluginError, PublishError, ReleaseError, ReleaseResult};
use crate::release::step::LifecycleStep;
use crate::utils::RemoteUrl;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const NAME: &str = "github";
const DEFAULT_GITHUB_URL: &str = "https://github.com";
const DEFAULT_API_URL: &str = "https://api.github.com";
const TOKEN_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Publishes a GitHub release for the new tag
pub struct GithubRelease {
  github_url: url::Url,
  api_url: String,
  draft: bool,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
  html_url: Option<String>,
}

impl GithubRelease {
  pub fn from_options(options: &PluginOptions) -> Result<Self, ConfigError> {
    reject_unknown_options(NAME, options, &["githubUrl", "githubApiUrl", "draftRelease"])?;

    let raw_url = string_option(NAME, options, "githubUrl")?.unwrap_or_else(|| DEFAULT_GITHUB_URL.to_string());
    let github_url = parse_http_url("githubUrl", &raw_url)?;

    let api_url = match string_option(NAME, options, "githubApiUrl")? {
      Some(api) => parse_http_url("githubApiUrl", &api)?.as_str().trim_end_matches('/').to_string(),
      None if github_url.host_str() == Some("github.com") => DEFAULT_API_URL.to_string(),
      None => format!("{}/api/v3", github_url.as_str().trim_end_matches('/')),
    };

    Ok(Self {
      github_url,
      api_url,
      draft: bool_option(NAME, options, "draftRelease")?.unwrap_or(false),
    })
  }

  fn token<'a>(&self, release: &'a ReleaseContext) -> Option<&'a str> {
    TOKEN_VARS.iter().find_map(|var| release.env_var(var))
  }

  /// `(owner, repo)` of the repository URL, which must live on `githubUrl`
  fn repo_slug(&self, repository_url: &str) -> Result<(String, String), String> {
    let remote =
      RemoteUrl::parse(repository_url).ok_or_else(|| format!("'{}' is not a git remote URL", repository_url))?;

    let expected_host = self.github_url.host_str().unwrap_or_default();
    match remote.host() {
      Some(host) if host.eq_ignore_ascii_case(expected_host) => {}
      Some(host) => {
        return Err(format!(
          "repository host '{}' does not match githubUrl '{}'",
          host, self.github_url
        ));
      }
      None => return Err(format!("'{}' is not hosted on {}", repository_url, self.github_url)),
    }

    remote
      .owner_and_repo()
      .ok_or_else(|| format!("cannot find owner/repo in '{}'", repository_url))
  }

  fn releases_endpoint(&self, owner: &str, repo: &str) -> String {
    format!("{}/repos/{}/{}/releases", self.api_url, owner, repo)
  }

  fn payload(&self, release: &ReleaseContext) -> ReleaseResult<Value> {
    let next = release
      .next_release
      .as_ref()
      .ok_or_else(|| ReleaseError::message("No next release to publish"))?;

    Ok(json!({
      "tag_name": next.git_tag,
      "target_commitish": release.branch.name,
      "name": next.git_tag,
      "body": next.notes,
      "draft": self.draft,
      "prerelease": false,
    }))
  }

  fn fail_verify(&self, ctx: &StepContext<'_>, message: impl Into<String>, help: &str) -> ReleaseError {
    ReleaseError::Plugin(PluginError::new(NAME, ctx.step.as_str(), message).with_help(help))
  }
}

fn parse_http_url(option: &str, raw: &str) -> Result<url::Url, ConfigError> {
  let invalid = |reason: String| ConfigError::InvalidOption {
    plugin: NAME.to_string(),
    option: option.to_string(),
    reason,
  };
  let parsed = url::Url::parse(raw).map_err(|e| invalid(format!("'{}': {}", raw, e)))?;
  if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
    return Err(invalid(format!("'{}' is not an http(s) URL", raw)));
  }
  Ok(parsed)
}

impl Plugin for GithubRelease {
  fn steps(&self) -> &[LifecycleStep] {
    &[LifecycleStep::VerifyConditions, LifecycleStep::PublishRelease]
  }

  fn verify_conditions(&self, ctx: &StepContext<'_>) -> ReleaseResult<()> {
    if self.token(ctx.release).is_none() {
      return Err(self.fail_verify(
        ctx,
        "no GitHub token found",
        "Set GH_TOKEN or GITHUB_TOKEN to a token that can create releases",
      ));
    }

    self
      .repo_slug(&ctx.release.repository_url)
      .map_err(|reason| self.fail_verify(ctx, reason, "Set repositoryUrl to the GitHub repository, or set githubUrl"))?;

    Ok(())
  }

  fn publish_release(&self, ctx: &StepContext<'_>) -> ReleaseResult<Option<PublishedRelease>> {
    let token = self.token(ctx.release).ok_or_else(|| {
      self.fail_verify(ctx, "no GitHub token found", "Set GH_TOKEN or GITHUB_TOKEN")
    })?;
    let (owner, repo) = self
      .repo_slug(&ctx.release.repository_url)
      .map_err(|reason| self.fail_verify(ctx, reason, "Set repositoryUrl to the GitHub repository"))?;

    let endpoint = self.releases_endpoint(&owner, &repo);
    let payload = self.payload(ctx.release)?;
    let publish_error = |status: Option<u16>, message: String| PublishError {
      plugin: NAME.to_string(),
      target: endpoint.clone(),
      status,
      message,
    };

    let client = reqwest::blocking::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!("semrel/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| publish_error(None, e.to_string()))?;

    tracing::debug!(endpoint = %endpoint, "creating GitHub release");
    let response = client
      .post(&endpoint)
      .header(AUTHORIZATION, format!("Bearer {}", token))
      .header(ACCEPT, "application/vnd.github+json")
      .json(&payload)
      .send()
      .map_err(|e| publish_error(None, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().unwrap_or_default();
      return Err(publish_error(Some(status.as_u16()), body.trim().to_string()).into());
    }

    let created: ReleaseResponse = response
      .json()
      .map_err(|e| publish_error(Some(status.as_u16()), format!("invalid response: {}", e)))?;

    if let Some(url) = &created.html_url {
      println!("🚀 Published GitHub release: {}", url);
    }

    Ok(Some(PublishedRelease {
      plugin: NAME.to_string(),
      name: "GitHub release".to_string(),
      url: created.html_url,
    }))
  }
}
