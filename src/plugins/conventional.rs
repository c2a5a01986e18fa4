//! Conventional commit parsing
//!
//! Format: `<type>(<scope>)!: <description>` followed by an optional body and
//! footers. Uses winnow for the header (not regex). Messages that do not
//! follow the format parse to `None`; they are simply not release-relevant.

use crate::core::vcs::CommitInfo;

/// A parsed conventional commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
  /// Commit type, lowercased (feat, fix, chore, ...)
  pub commit_type: String,
  /// Optional scope (e.g., "auth", "api", "core")
  pub scope: Option<String>,
  /// Short description
  pub description: String,
  /// Full commit body (optional)
  pub body: Option<String>,
  /// Breaking change note; empty when only flagged with `!`
  pub breaking_change: Option<String>,
  /// Other footers (e.g., "Closes: #123")
  pub footers: Vec<(String, String)>,
}

impl ConventionalCommit {
  /// Check if this commit is a breaking change
  pub fn is_breaking(&self) -> bool {
    self.breaking_change.is_some()
  }

  /// Parse a conventional commit from a git commit message
  pub fn parse(message: &str) -> Option<Self> {
    use winnow::ascii::space0;
    use winnow::combinator::{opt, preceded, terminated};
    use winnow::prelude::*;
    use winnow::token::{take_till, take_while};

    let message = message.trim_start();
    let (first_line, rest) = message.split_once('\n').unwrap_or((message, ""));

    // type(scope)!: description
    let mut parser = (
      take_while::<_, _, ()>(1.., |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
      opt(preceded('(', terminated(take_till(1.., ')'), ')'))),
      opt('!'),
      ':',
      space0,
      take_till(0.., ['\n', '\r']),
    );

    let Ok((commit_type, scope, breaking_indicator, _, _, description)) = parser.parse(first_line.trim_end()) else {
      return None;
    };

    let description: &str = description;
    if description.trim().is_empty() {
      return None;
    }

    let mut body_lines = Vec::new();
    let mut breaking_change = None;
    let mut footers = Vec::new();

    let mut in_body = true;
    let mut seen_empty_line = false;

    for line in rest.lines() {
      let trimmed = line.trim();

      if trimmed.is_empty() {
        seen_empty_line = true;
        if in_body && !body_lines.is_empty() {
          body_lines.push("");
        }
        continue;
      }

      // Footers only start after a blank line
      if seen_empty_line && let Some((key, value)) = trimmed.split_once(':') {
        let key_trimmed = key.trim();
        let value_trimmed = value.trim();

        if key_trimmed.eq_ignore_ascii_case("BREAKING CHANGE") || key_trimmed.eq_ignore_ascii_case("BREAKING-CHANGE") {
          breaking_change = Some(value_trimmed.to_string());
          in_body = false;
          continue;
        } else if !key_trimmed.is_empty()
          && key_trimmed.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
          footers.push((key_trimmed.to_string(), value_trimmed.to_string()));
          in_body = false;
          continue;
        }
      }

      if in_body {
        body_lines.push(line);
        seen_empty_line = false;
      } else if let Some(note) = breaking_change.as_mut()
        && footers.is_empty()
      {
        // Continuation of a multi-line BREAKING CHANGE footer
        if !note.is_empty() {
          note.push('\n');
        }
        note.push_str(trimmed);
      }
    }

    while body_lines.last() == Some(&"") {
      body_lines.pop();
    }

    if breaking_change.is_none() && breaking_indicator.is_some() {
      breaking_change = Some(String::new());
    }

    let body = if body_lines.is_empty() {
      None
    } else {
      Some(body_lines.join("\n"))
    };

    Some(Self {
      commit_type: commit_type.to_ascii_lowercase(),
      scope: scope.map(|s: &str| s.trim().to_string()),
      description: description.trim().to_string(),
      body,
      breaking_change,
      footers,
    })
  }

  /// Parse the message of a git commit
  pub fn from_commit(commit: &CommitInfo) -> Option<Self> {
    Self::parse(&commit.message)
  }

  /// Issue references from footers such as `Closes: #12`
  pub fn references(&self) -> Vec<String> {
    self
      .footers
      .iter()
      .filter(|(key, _)| {
        ["closes", "close", "fixes", "fix", "resolves", "refs"]
          .iter()
          .any(|k| key.eq_ignore_ascii_case(k))
      })
      .flat_map(|(_, value)| {
        value
          .split([',', ' '])
          .map(str::trim)
          .filter(|r| r.starts_with('#') && r.len() > 1)
          .map(|r| r.trim_start_matches('#').to_string())
          .collect::<Vec<_>>()
      })
      .collect()
  }
}
