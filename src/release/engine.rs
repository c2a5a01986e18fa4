//! The release run
//!
//! ```text
//! resolve branch ─► last release ─► commits since
//!   │
//!   ▼
//! verify-conditions ─► analyze-commits ──(no release)──► stop
//!   │
//!   ▼
//! next version/tag ─► generate-notes ──(dry run)──► stop
//!   │
//!   ▼
//! update-changelog ─► publish-git-assets ─► tag + push ─► publish-release ─► success
//! ```
//!
//! Nothing is written before analyze-commits has asked for a release. When a
//! step fails after that point the `fail` handlers are told, then the error is
//! returned as-is. Steps that already ran are not undone.

use crate::core::config::ReleaseConfig;
use crate::core::context::{BranchRef, LastRelease, NextRelease, ReleaseContext};
use crate::core::error::{ConfigError, GitError, ReleaseError, ReleaseResult};
use crate::core::vcs::{CommitInfo, Repository};
use crate::plugins::PluginRegistry;
use crate::release::executor::PluginChain;
use crate::release::step::LifecycleStep;
use crate::release::version::{TagFormat, next_version};
use std::collections::BTreeMap;

/// Commit message markers that exclude a commit from analysis
const SKIP_MARKERS: [&str; 2] = ["[skip release]", "[release skip]"];

/// Per-invocation switches
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  /// Stop after release notes are generated
  pub dry_run: bool,
  /// Publish even when not running in CI
  pub no_ci: bool,
  /// Branch to release instead of the checked-out one
  pub branch: Option<String>,
  /// Environment snapshot plugins read from
  pub env: BTreeMap<String, String>,
}

impl RunOptions {
  /// Options with the current process environment
  pub fn from_env() -> Self {
    Self {
      env: std::env::vars().collect(),
      ..Self::default()
    }
  }
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
  /// The branch is not configured for releases
  NotReleaseBranch { branch: String },
  /// Commit analysis found nothing to release
  NoRelease(Box<ReleaseContext>),
  /// Dry run: notes were generated, nothing was published
  DryRun(Box<ReleaseContext>),
  /// The release was published
  Released(Box<ReleaseContext>),
}

enum Stage {
  NoRelease,
  DryRun,
  Released,
}

/// Drives a release run over a plugin chain
pub struct ReleaseEngine<'a> {
  config: &'a ReleaseConfig,
  chain: PluginChain,
  repo: &'a dyn Repository,
}

impl<'a> ReleaseEngine<'a> {
  /// Build the engine, instantiating every configured plugin
  pub fn new(config: &'a ReleaseConfig, registry: &PluginRegistry, repo: &'a dyn Repository) -> ReleaseResult<Self> {
    config.validate(registry)?;
    let chain = PluginChain::from_config(config, registry)?;

    for step in LifecycleStep::PIPELINE {
      tracing::debug!(step = %step, plugins = ?chain.implementing(step), "step plan");
    }

    Ok(Self { config, chain, repo })
  }

  pub fn chain(&self) -> &PluginChain {
    &self.chain
  }

  /// Run the release
  pub fn run(&self, options: RunOptions) -> ReleaseResult<RunOutcome> {
    let branch = self.resolve_branch(&options)?;
    let Some(branch_spec) = self.config.match_branch(&branch) else {
      tracing::info!(branch = %branch, "not a release branch");
      return Ok(RunOutcome::NotReleaseBranch { branch });
    };

    let repository_url = match &self.config.repository_url {
      Some(url) => url.clone(),
      None => self.repo.remote_url("origin")?.ok_or_else(|| ConfigError::MissingField {
        field: "repositoryUrl".to_string(),
      })?,
    };

    let mut dry_run = options.dry_run || self.config.dry_run;
    if !dry_run && self.config.ci && !options.no_ci && !options.env.contains_key("CI") {
      tracing::warn!("not running in a CI environment, switching to dry-run mode (use --no-ci to publish)");
      dry_run = true;
    }

    let mut release = ReleaseContext::new(
      self.repo.root().to_path_buf(),
      repository_url,
      BranchRef {
        name: branch,
        channel: branch_spec.channel().map(str::to_string),
      },
      options.env,
    );
    release.dry_run = dry_run;

    let tag_format = TagFormat::parse(&self.config.tag_format)?;
    release.last_release = self.find_last_release(&tag_format)?;
    release.commits = self.collect_commits(release.last_release.as_ref())?;

    tracing::info!(
      branch = %release.branch.name,
      last_release = release.last_release.as_ref().map(|l| l.git_tag.as_str()).unwrap_or("none"),
      commits = release.commits.len(),
      dry_run,
      "starting release run"
    );

    match self.pipeline(&mut release, &tag_format) {
      Ok(Stage::NoRelease) => Ok(RunOutcome::NoRelease(Box::new(release))),
      Ok(Stage::DryRun) => Ok(RunOutcome::DryRun(Box::new(release))),
      Ok(Stage::Released) => Ok(RunOutcome::Released(Box::new(release))),
      Err(error) => {
        if !release.dry_run {
          self.chain.run_fail(&release, self.repo, &error);
        }
        Err(error)
      }
    }
  }

  fn pipeline(&self, release: &mut ReleaseContext, tag_format: &TagFormat) -> ReleaseResult<Stage> {
    self.step(LifecycleStep::VerifyConditions, release)?;
    self.step(LifecycleStep::AnalyzeCommits, release)?;

    let Some(release_type) = release.release_type else {
      tracing::info!("no release-relevant commits, nothing to release");
      return Ok(Stage::NoRelease);
    };

    let version = next_version(release.last_release.as_ref().map(|l| &l.version), release_type)?;
    let git_tag = tag_format.render(&version);
    if self.repo.resolve_tag(&git_tag)?.is_some() {
      return Err(GitError::TagExists { tag: git_tag }.into());
    }

    release.next_release = Some(NextRelease {
      release_type,
      version,
      git_tag,
      git_head: self.repo.head_commit()?,
      notes: String::new(),
      channel: release.branch.channel.clone(),
    });

    self.step(LifecycleStep::GenerateNotes, release)?;

    if release.dry_run {
      return Ok(Stage::DryRun);
    }

    self.step(LifecycleStep::UpdateChangelog, release)?;
    self.step(LifecycleStep::PublishGitAssets, release)?;

    // publish-git-assets may have committed
    let head = self.repo.head_commit()?;
    let git_tag = match release.next_release.as_mut() {
      Some(next) => {
        next.git_head = head.clone();
        next.git_tag.clone()
      }
      None => return Err(ReleaseError::message("Next release vanished during the run")),
    };

    self.repo.create_tag(&git_tag, &head)?;
    self
      .repo
      .push(&release.repository_url, &format!("refs/tags/{}", git_tag))?;
    tracing::info!(tag = %git_tag, commit = %head, "created and pushed release tag");

    self.step(LifecycleStep::PublishRelease, release)?;
    self.step(LifecycleStep::Success, release)?;

    Ok(Stage::Released)
  }

  fn step(&self, step: LifecycleStep, release: &mut ReleaseContext) -> ReleaseResult<()> {
    let _span = tracing::debug_span!("step", step = %step).entered();
    self.chain.run_step(step, release, self.repo)
  }

  /// Branch from the CLI, then CI, then git
  fn resolve_branch(&self, options: &RunOptions) -> ReleaseResult<String> {
    if let Some(branch) = options.branch.as_ref().filter(|b| !b.is_empty()) {
      return Ok(branch.clone());
    }

    let is_tag_ref = options.env.get("GITHUB_REF_TYPE").is_some_and(|t| t == "tag");
    if !is_tag_ref
      && let Some(branch) = options.env.get("GITHUB_REF_NAME").filter(|b| !b.is_empty())
    {
      return Ok(branch.clone());
    }

    self.repo.current_branch()
  }

  /// Highest-versioned tag reachable from HEAD that follows the tag format
  fn find_last_release(&self, tag_format: &TagFormat) -> ReleaseResult<Option<LastRelease>> {
    let latest = self
      .repo
      .merged_tags()?
      .into_iter()
      .filter_map(|tag| tag_format.version_of(&tag).map(|v| (v, tag)))
      .filter(|(v, _)| v.pre.is_empty())
      .max_by(|(a, _), (b, _)| a.cmp(b));

    let Some((version, git_tag)) = latest else {
      return Ok(None);
    };

    let git_head = self
      .repo
      .resolve_tag(&git_tag)?
      .ok_or_else(|| ReleaseError::message(format!("Tag {} could not be resolved", git_tag)))?;

    Ok(Some(LastRelease {
      version,
      git_tag,
      git_head,
    }))
  }

  fn collect_commits(&self, last: Option<&LastRelease>) -> ReleaseResult<Vec<CommitInfo>> {
    let commits = self.repo.commits_since(last.map(|l| l.git_head.as_str()))?;
    let (skipped, kept): (Vec<CommitInfo>, Vec<CommitInfo>) = commits
      .into_iter()
      .partition(|c| SKIP_MARKERS.iter().any(|m| c.message.contains(m)));

    for commit in &skipped {
      tracing::debug!(commit = %commit.short_sha(), summary = commit.summary(), "commit marked to skip release");
    }
    Ok(kept)
  }
}
