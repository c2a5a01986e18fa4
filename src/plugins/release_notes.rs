//! Markdown release notes from conventional commits
//!
//! Output follows the angular changelog layout:
//!
//! ```markdown
//! # [1.1.0](https://github.com/owner/repo/compare/v1.0.0...v1.1.0) (2024-05-01)
//!
//! ### Features
//!
//! * **api:** add pagination ([1a2b3c4](https://github.com/owner/repo/commit/1a2b3c4...))
//! ```
//!
//! Patch releases use a `##` header. Links are only emitted when a web URL
//! can be derived from the repository URL.

use super::conventional::ConventionalCommit;
use super::{Plugin, StepContext, bool_option, reject_unknown_options};
use crate::core::config::PluginOptions;
use crate::core::context::ReleaseContext;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::core::vcs::CommitInfo;
use crate::release::step::LifecycleStep;
use crate::release::version::ReleaseType;
use crate::utils::RemoteUrl;
use chrono::NaiveDate;

const NAME: &str = "release-notes-generator";

/// Sections in rendering order
const SECTIONS: [(&str, &str); 4] = [
  ("feat", "Features"),
  ("fix", "Bug Fixes"),
  ("perf", "Performance Improvements"),
  ("revert", "Reverts"),
];

/// Renders release notes for the next release
pub struct ReleaseNotes {
  link_compare: bool,
  link_references: bool,
}

impl ReleaseNotes {
  pub fn from_options(options: &PluginOptions) -> Result<Self, ConfigError> {
    reject_unknown_options(NAME, options, &["linkCompare", "linkReferences", "preset"])?;
    Ok(Self {
      link_compare: bool_option(NAME, options, "linkCompare")?.unwrap_or(true),
      link_references: bool_option(NAME, options, "linkReferences")?.unwrap_or(true),
    })
  }

  /// Render notes for `release` dated `date`
  fn render(&self, release: &ReleaseContext, date: NaiveDate) -> ReleaseResult<String> {
    let next = release
      .next_release
      .as_ref()
      .ok_or_else(|| ReleaseError::message("No next release to generate notes for"))?;

    let web_url = RemoteUrl::parse(&release.repository_url).and_then(|r| r.web_url());
    let mut out = String::new();

    // Header
    let level = if next.release_type == ReleaseType::Patch { "##" } else { "#" };
    let title = match (&web_url, &release.last_release) {
      (Some(url), Some(last)) if self.link_compare => {
        format!("[{}]({}/compare/{}...{})", next.version, url, last.git_tag, next.git_tag)
      }
      _ => next.version.to_string(),
    };
    out.push_str(&format!("{} {} ({})\n", level, title, date.format("%Y-%m-%d")));

    let parsed: Vec<(&CommitInfo, ConventionalCommit)> = release
      .commits
      .iter()
      .filter_map(|c| ConventionalCommit::from_commit(c).map(|p| (c, p)))
      .collect();

    for (commit_type, heading) in SECTIONS {
      let entries: Vec<String> = parsed
        .iter()
        .filter(|(_, p)| p.commit_type == commit_type)
        .map(|(commit, p)| self.entry(commit, p, web_url.as_deref()))
        .collect();

      if entries.is_empty() {
        continue;
      }

      out.push_str(&format!("\n\n### {}\n\n", heading));
      out.push_str(&entries.join("\n"));
    }

    let breaking: Vec<String> = parsed
      .iter()
      .filter(|(_, p)| p.is_breaking())
      .map(|(_, p)| {
        let note = match p.breaking_change.as_deref() {
          Some(note) if !note.is_empty() => note,
          _ => p.description.as_str(),
        };
        format!("* {}{}", scope_prefix(p), note)
      })
      .collect();

    if !breaking.is_empty() {
      out.push_str("\n\n### BREAKING CHANGES\n\n");
      out.push_str(&breaking.join("\n"));
    }

    out.push('\n');
    Ok(out)
  }

  fn entry(&self, commit: &CommitInfo, parsed: &ConventionalCommit, web_url: Option<&str>) -> String {
    let mut line = format!("* {}{}", scope_prefix(parsed), parsed.description);

    match web_url {
      Some(url) if self.link_references => {
        line.push_str(&format!(" ([{}]({}/commit/{}))", commit.short_sha(), url, commit.sha));
        let refs: Vec<String> = parsed
          .references()
          .iter()
          .map(|r| format!("[#{}]({}/issues/{})", r, url, r))
          .collect();
        if !refs.is_empty() {
          line.push_str(&format!(", closes {}", refs.join(" ")));
        }
      }
      _ => line.push_str(&format!(" ({})", commit.short_sha())),
    }

    line
  }
}

fn scope_prefix(commit: &ConventionalCommit) -> String {
  commit
    .scope
    .as_ref()
    .map(|s| format!("**{}:** ", s))
    .unwrap_or_default()
}

impl Plugin for ReleaseNotes {
  fn steps(&self) -> &[LifecycleStep] {
    &[LifecycleStep::GenerateNotes]
  }

  fn generate_notes(&self, ctx: &StepContext<'_>) -> ReleaseResult<Option<String>> {
    let notes = self.render(ctx.release, chrono::Utc::now().date_naive())?;
    Ok(Some(notes))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::vcs::testing::RecordingRepo;
  use crate::plugins::testing::release_context;
  use serde_json::json;
  use std::path::Path;

  fn notes(options: serde_json::Value, repo: &RecordingRepo) -> String {
    let plugin = ReleaseNotes::from_options(options.as_object().unwrap()).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    plugin.render(&release_context(repo), date).unwrap()
  }

  #[test]
  fn test_minor_release_notes() {
    let repo = RecordingRepo::new(
      Path::new("/repo"),
      &[
        "feat(api): add pagination",
        "chore: bump deps",
        "fix: handle empty body\n\nCloses: #12",
      ],
    );

    let sha1 = format!("{:040x}", 1);
    let sha3 = format!("{:040x}", 3);
    let expected = format!(
      "# [1.1.0](https://github.com/owner/repo/compare/v1.0.0...v1.1.0) (2024-05-01)\n\
       \n\n### Features\n\n\
       * **api:** add pagination ([{short1}](https://github.com/owner/repo/commit/{sha1}))\
       \n\n### Bug Fixes\n\n\
       * handle empty body ([{short3}](https://github.com/owner/repo/commit/{sha3})), closes [#12](https://github.com/owner/repo/issues/12)\n",
      short1 = &sha1[..7],
      short3 = &sha3[..7],
      sha1 = sha1,
      sha3 = sha3,
    );

    assert_eq!(notes(json!({}), &repo), expected);
  }

  #[test]
  fn test_breaking_changes_section() {
    let repo = RecordingRepo::new(
      Path::new("/repo"),
      &["feat(core)!: drop v1 API", "fix: x\n\nBREAKING CHANGE: config keys renamed"],
    );

    let out = notes(json!({ "linkReferences": false }), &repo);
    assert!(out.contains("### BREAKING CHANGES\n\n* **core:** drop v1 API\n* config keys renamed\n"));
    assert!(out.contains("* **core:** drop v1 API (0000000)"));
  }

  #[test]
  fn test_patch_header_without_compare_link() {
    let repo = RecordingRepo::new(Path::new("/repo"), &["fix: typo"]);
    let mut ctx = release_context(&repo);
    ctx.release_type = Some(ReleaseType::Patch);
    if let Some(next) = ctx.next_release.as_mut() {
      next.release_type = ReleaseType::Patch;
    }

    let plugin = ReleaseNotes::from_options(json!({ "linkCompare": false }).as_object().unwrap()).unwrap();
    let out = plugin.render(&ctx, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap();
    assert!(out.starts_with("## 1.1.0 (2024-05-01)\n"));
  }

  #[test]
  fn test_local_remote_has_no_links() {
    let repo = RecordingRepo::new(Path::new("/repo"), &["feat: local"]);
    let mut ctx = release_context(&repo);
    ctx.repository_url = "/srv/git/repo.git".to_string();

    let plugin = ReleaseNotes::from_options(&PluginOptions::new()).unwrap();
    let out = plugin.render(&ctx, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap();
    assert!(out.starts_with("# 1.1.0 (2024-05-01)\n"));
    assert!(out.contains("* local (0000000)"));
  }

  #[test]
  fn test_rejects_bad_options() {
    assert!(ReleaseNotes::from_options(json!({ "linkCompare": "yes" }).as_object().unwrap()).is_err());
  }
}
