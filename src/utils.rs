//! Git remote URL helpers
//!
//! `repositoryUrl` may be any locator git accepts for a push. Plugins that talk
//! to a forge need the host and `owner/repo` path out of it, and the release
//! notes want a browsable web URL for compare and commit links.

use std::path::Path;

/// A classified git remote locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteUrl {
  /// `git@host:owner/repo.git` or `ssh://[user@]host[:port]/owner/repo.git`
  Ssh { host: String, path: String },
  /// `https://host/owner/repo.git` (also `http://`, `git+https://`)
  Http { url: url::Url },
  /// Local path or `file://` URL
  Local { path: String },
}

impl RemoteUrl {
  /// Classify a remote locator, returning `None` when git would not accept it
  pub fn parse(raw: &str) -> Option<Self> {
    let raw = raw.trim();
    if raw.is_empty() {
      return None;
    }

    if let Some(rest) = raw.strip_prefix("file://") {
      return (!rest.is_empty()).then(|| RemoteUrl::Local { path: rest.to_string() });
    }

    if raw.starts_with("ssh://") || raw.starts_with("git+ssh://") {
      let parsed = url::Url::parse(raw.trim_start_matches("git+")).ok()?;
      let host = parsed.host_str()?.to_string();
      let path = parsed.path().trim_start_matches('/').to_string();
      return (!path.is_empty()).then_some(RemoteUrl::Ssh { host, path });
    }

    if raw.starts_with("https://") || raw.starts_with("http://") || raw.starts_with("git+https://") {
      let parsed = url::Url::parse(raw.trim_start_matches("git+")).ok()?;
      parsed.host_str()?;
      return Some(RemoteUrl::Http { url: parsed });
    }

    if is_local_path(raw) {
      return Some(RemoteUrl::Local { path: raw.to_string() });
    }

    // scp-like syntax: [user@]host:path
    if let Some((user_host, path)) = raw.split_once(':') {
      let host = user_host.rsplit('@').next().unwrap_or(user_host);
      if !host.is_empty() && !path.is_empty() && !host.contains('/') && !path.starts_with('/') {
        return Some(RemoteUrl::Ssh {
          host: host.to_string(),
          path: path.to_string(),
        });
      }
    }

    None
  }

  /// Host name, if the remote is not local
  pub fn host(&self) -> Option<&str> {
    match self {
      RemoteUrl::Ssh { host, .. } => Some(host),
      RemoteUrl::Http { url } => url.host_str(),
      RemoteUrl::Local { .. } => None,
    }
  }

  /// `owner/repo` path without the `.git` suffix
  pub fn repo_path(&self) -> Option<String> {
    let path = match self {
      RemoteUrl::Ssh { path, .. } => path.as_str(),
      RemoteUrl::Http { url } => url.path(),
      RemoteUrl::Local { .. } => return None,
    };
    let trimmed = path.trim_matches('/').trim_end_matches(".git");
    (!trimmed.is_empty()).then(|| trimmed.to_string())
  }

  /// Browsable `https://host/owner/repo` URL, if one can be derived
  pub fn web_url(&self) -> Option<String> {
    let host = self.host()?;
    let path = self.repo_path()?;
    Some(format!("https://{}/{}", host, path))
  }

  /// `(owner, repo)` split of the repository path
  pub fn owner_and_repo(&self) -> Option<(String, String)> {
    let path = self.repo_path()?;
    let (owner, repo) = path.rsplit_once('/')?;
    if owner.is_empty() || repo.is_empty() {
      return None;
    }
    Some((owner.to_string(), repo.to_string()))
  }
}

/// Check if a URL looks like a valid git remote URL
pub fn is_valid_remote_url(url: &str) -> bool {
  RemoteUrl::parse(url).is_some()
}

/// Check if a path is a local filesystem path (not a remote URL)
///
/// Absolute Unix and Windows paths and `./`/`../` relative paths count as local.
/// Bare names (`repo`) do not, since git would treat them as a remote name.
pub fn is_local_path(path: &str) -> bool {
  if path.starts_with("./") || path.starts_with("../") {
    return true;
  }

  // Windows drive letter (C:\ or C:/); must come before the scp-like check
  let bytes = path.as_bytes();
  if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') {
    return true;
  }

  if path.starts_with("\\\\") {
    return true;
  }

  if path.starts_with('/') && !path.contains("://") {
    return true;
  }

  Path::new(path).is_absolute() && !path.contains("://")
}

/// Convert a path to Git format (always forward slashes)
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_scp_like_ssh_url() {
    let remote = RemoteUrl::parse("git@github.com:telekom/gateway-kong-image.git").unwrap();
    assert_eq!(remote.host(), Some("github.com"));
    assert_eq!(remote.repo_path().as_deref(), Some("telekom/gateway-kong-image"));
    assert_eq!(
      remote.web_url().as_deref(),
      Some("https://github.com/telekom/gateway-kong-image")
    );
    assert_eq!(
      remote.owner_and_repo(),
      Some(("telekom".to_string(), "gateway-kong-image".to_string()))
    );
  }

  #[test]
  fn test_https_url() {
    let remote = RemoteUrl::parse("https://github.com/owner/repo.git").unwrap();
    assert_eq!(remote.host(), Some("github.com"));
    assert_eq!(remote.web_url().as_deref(), Some("https://github.com/owner/repo"));
  }

  #[test]
  fn test_ssh_scheme_url() {
    let remote = RemoteUrl::parse("ssh://git@gitlab.example.com:2222/group/sub/project.git").unwrap();
    assert_eq!(remote.host(), Some("gitlab.example.com"));
    assert_eq!(remote.repo_path().as_deref(), Some("group/sub/project"));
    assert_eq!(
      remote.owner_and_repo(),
      Some(("group/sub".to_string(), "project".to_string()))
    );
  }

  #[test]
  fn test_local_paths() {
    assert!(matches!(RemoteUrl::parse("/srv/git/repo.git"), Some(RemoteUrl::Local { .. })));
    assert!(matches!(RemoteUrl::parse("../origin.git"), Some(RemoteUrl::Local { .. })));
    assert!(matches!(RemoteUrl::parse("file:///srv/git/repo.git"), Some(RemoteUrl::Local { .. })));
    assert_eq!(RemoteUrl::parse("/srv/git/repo.git").unwrap().web_url(), None);
  }

  #[test]
  fn test_invalid_urls() {
    assert!(!is_valid_remote_url(""));
    assert!(!is_valid_remote_url("repo"));
    assert!(!is_valid_remote_url("not a url"));
    assert!(!is_valid_remote_url("https://"));
    assert!(!is_valid_remote_url("file://"));
  }

  #[test]
  fn test_is_local_path() {
    assert!(is_local_path("/home/user/repo"));
    assert!(is_local_path("./repo"));
    assert!(is_local_path("C:/Users/test/repo"));
    assert!(!is_local_path("git@github.com:user/repo.git"));
    assert!(!is_local_path("https://github.com/user/repo.git"));
    assert!(!is_local_path("my-crate"));
  }
}
