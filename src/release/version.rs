//! Version bumps and release tag naming

use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version bump type based on conventional commits
///
/// Ordered so that `max()` over several analyses picks the strongest bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
  /// Patch version bump (bug fixes)
  Patch,
  /// Minor version bump (new features)
  Minor,
  /// Major version bump (breaking changes)
  Major,
}

impl ReleaseType {
  /// Apply bump to a semver version
  ///
  /// Fails when the bumped component is already `u64::MAX`.
  pub fn apply(&self, version: &Version) -> ReleaseResult<Version> {
    let bumped = match self {
      ReleaseType::Major => version.major.checked_add(1).map(|major| Version::new(major, 0, 0)),
      ReleaseType::Minor => version
        .minor
        .checked_add(1)
        .map(|minor| Version::new(version.major, minor, 0)),
      ReleaseType::Patch => version
        .patch
        .checked_add(1)
        .map(|patch| Version::new(version.major, version.minor, patch)),
    };

    bumped.ok_or_else(|| ReleaseError::message(format!("Cannot apply a {} bump to {}: version overflows", self, version)))
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ReleaseType::Major => "major",
      ReleaseType::Minor => "minor",
      ReleaseType::Patch => "patch",
    }
  }

  /// Parse `major` / `minor` / `patch`
  pub fn from_name(name: &str) -> Option<Self> {
    match name.to_ascii_lowercase().as_str() {
      "major" => Some(ReleaseType::Major),
      "minor" => Some(ReleaseType::Minor),
      "patch" => Some(ReleaseType::Patch),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Version of the very first release
pub fn first_release_version() -> Version {
  Version::new(1, 0, 0)
}

/// Next version after `last`, or the first-release version when there is none
pub fn next_version(last: Option<&Version>, release_type: ReleaseType) -> ReleaseResult<Version> {
  match last {
    Some(version) => release_type.apply(version),
    None => Ok(first_release_version()),
  }
}

const VERSION_PLACEHOLDER: &str = "${version}";

/// A `tagFormat` template such as `v${version}`
#[derive(Debug, Clone)]
pub struct TagFormat {
  template: String,
  matcher: Regex,
}

impl TagFormat {
  /// Validate and compile a tag template
  pub fn parse(template: &str) -> Result<Self, ConfigError> {
    let invalid = || ConfigError::InvalidTagFormat {
      format: template.to_string(),
    };

    if template.matches(VERSION_PLACEHOLDER).count() != 1 {
      return Err(invalid());
    }

    let (prefix, suffix) = template.split_once(VERSION_PLACEHOLDER).ok_or_else(invalid)?;
    if prefix.chars().chain(suffix.chars()).any(|c| c.is_whitespace() || c == '~' || c == '^' || c == ':') {
      return Err(invalid());
    }

    let pattern = format!("^{}(?P<version>.+){}$", regex::escape(prefix), regex::escape(suffix));
    let matcher = Regex::new(&pattern).map_err(|_| invalid())?;

    Ok(Self {
      template: template.to_string(),
      matcher,
    })
  }

  /// Tag name for a version
  pub fn render(&self, version: &Version) -> String {
    self.template.replace(VERSION_PLACEHOLDER, &version.to_string())
  }

  /// Extract the version from a tag name, if the tag follows this format
  pub fn version_of(&self, tag: &str) -> Option<Version> {
    let captures = self.matcher.captures(tag)?;
    Version::parse(captures.name("version")?.as_str()).ok()
  }
}
