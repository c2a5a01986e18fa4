//! Error types for semrel with contextual messages and exit codes
//!
//! Every failure a release run can hit is funnelled into [`ReleaseError`]. The
//! categories mirror where the failure happened:
//!
//! - [`ConfigError`]: the configuration was rejected before anything ran
//! - [`PluginError`]: a named plugin failed while handling a lifecycle step
//! - [`PublishError`]: a remote call failed while publishing
//! - [`GitError`]: a git subprocess failed
//!
//! Each category can carry a help message that is printed under the error.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for semrel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, network, I/O)
  System = 2,
  /// A plugin aborted the run
  Plugin = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for semrel
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration errors
  Config(ConfigError),

  /// A plugin step handler failed
  Plugin(PluginError),

  /// Remote publishing failed
  Publish(PublishError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Attribute this error to the plugin that raised it.
  ///
  /// `plugin` is the identifier as written in the config and replaces
  /// whatever name the plugin used internally. Publish errors keep their
  /// category; everything else becomes a [`PluginError`] for `plugin` at `step`.
  pub fn in_plugin(self, plugin: &str, step: &str) -> Self {
    match self {
      ReleaseError::Plugin(mut e) => {
        e.plugin = plugin.to_string();
        e.step = step.to_string();
        ReleaseError::Plugin(e)
      }
      ReleaseError::Publish(mut e) => {
        e.plugin = plugin.to_string();
        ReleaseError::Publish(e)
      }
      other => {
        let help = other.help_message();
        ReleaseError::Plugin(PluginError {
          plugin: plugin.to_string(),
          step: step.to_string(),
          message: other.to_string(),
          help,
        })
      }
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Plugin(_) => ExitCode::Plugin,
      ReleaseError::Publish(_) => ExitCode::System,
      ReleaseError::Git(_) => ExitCode::System,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Plugin(e) => e.help.clone(),
      ReleaseError::Publish(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Plugin(e) => write!(f, "{}", e),
      ReleaseError::Publish(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<GitError> for ReleaseError {
  fn from(err: GitError) -> Self {
    ReleaseError::Git(err)
  }
}

impl From<PublishError> for ReleaseError {
  fn from(err: PublishError) -> Self {
    ReleaseError::Publish(err)
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for ReleaseError {
  fn from(err: toml_edit::ser::Error) -> Self {
    ReleaseError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ReleaseError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ReleaseError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<semver::Error> for ReleaseError {
  fn from(err: semver::Error) -> Self {
    ReleaseError::message(format!("Invalid version: {}", err))
  }
}

/// Configuration-related errors
///
/// Every variant names the field that was rejected.
#[derive(Debug)]
pub enum ConfigError {
  /// No configuration file found
  NotFound { cwd: PathBuf },

  /// File could not be parsed
  Parse { path: PathBuf, message: String },

  /// Missing required field
  MissingField { field: String },

  /// `branches` is empty
  EmptyBranches,

  /// A branch pattern is not a valid glob
  InvalidBranch { pattern: String, reason: String },

  /// `repositoryUrl` is not a git remote locator
  InvalidRepositoryUrl { url: String },

  /// `tagFormat` does not contain `${version}` exactly once
  InvalidTagFormat { format: String },

  /// A plugin identifier does not resolve to a known plugin
  UnknownPlugin { identifier: String, index: usize },

  /// A plugin rejected its options
  InvalidOption { plugin: String, option: String, reason: String },
}

impl ConfigError {
  /// Name of the configuration field this error is about
  pub fn field(&self) -> String {
    match self {
      ConfigError::NotFound { .. } | ConfigError::Parse { .. } => "<file>".to_string(),
      ConfigError::MissingField { field } => field.clone(),
      ConfigError::EmptyBranches | ConfigError::InvalidBranch { .. } => "branches".to_string(),
      ConfigError::InvalidRepositoryUrl { .. } => "repositoryUrl".to_string(),
      ConfigError::InvalidTagFormat { .. } => "tagFormat".to_string(),
      ConfigError::UnknownPlugin { index, .. } => format!("plugins[{}]", index),
      ConfigError::InvalidOption { plugin, option, .. } => format!("plugins.{}.{}", plugin, option),
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `semrel init` to create a configuration file.".to_string()),
      ConfigError::EmptyBranches => Some("Add at least one release branch, e.g. \"branches\": [\"main\"]".to_string()),
      ConfigError::UnknownPlugin { .. } => Some("Run `semrel plugins` to list the available plugins.".to_string()),
      ConfigError::InvalidRepositoryUrl { .. } => Some(
        "Use an SSH (git@host:owner/repo.git), HTTPS (https://host/owner/repo.git) or local path remote.".to_string(),
      ),
      ConfigError::InvalidTagFormat { .. } => Some("The default tag format is \"v${version}\".".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { cwd } => {
        write!(
          f,
          "No release configuration found.\nSearched .releaserc, .releaserc.json, .releaserc.toml, release.toml in {}",
          cwd.display()
        )
      }
      ConfigError::Parse { path, message } => {
        write!(f, "Failed to parse config {}: {}", path.display(), message)
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
      ConfigError::EmptyBranches => write!(f, "Invalid config field 'branches': at least one branch is required"),
      ConfigError::InvalidBranch { pattern, reason } => {
        write!(f, "Invalid config field 'branches': pattern '{}' is invalid: {}", pattern, reason)
      }
      ConfigError::InvalidRepositoryUrl { url } => {
        write!(f, "Invalid config field 'repositoryUrl': '{}' is not a git remote URL", url)
      }
      ConfigError::InvalidTagFormat { format } => {
        write!(
          f,
          "Invalid config field 'tagFormat': '{}' must contain ${{version}} exactly once",
          format
        )
      }
      ConfigError::UnknownPlugin { identifier, index } => {
        write!(
          f,
          "Invalid config field 'plugins[{}]': unknown plugin '{}'",
          index, identifier
        )
      }
      ConfigError::InvalidOption { plugin, option, reason } => {
        write!(f, "Invalid option '{}' for plugin '{}': {}", option, plugin, reason)
      }
    }
  }
}

/// Failure inside a plugin's step handler
#[derive(Debug)]
pub struct PluginError {
  /// Identifier of the failing plugin
  pub plugin: String,
  /// Lifecycle step that was running
  pub step: String,
  /// What went wrong
  pub message: String,
  /// Optional remedy
  pub help: Option<String>,
}

impl PluginError {
  pub fn new(plugin: impl Into<String>, step: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      plugin: plugin.into(),
      step: step.into(),
      message: message.into(),
      help: None,
    }
  }

  pub fn with_help(mut self, help: impl Into<String>) -> Self {
    self.help = Some(help.into());
    self
  }
}

impl fmt::Display for PluginError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Plugin '{}' failed during {}: {}", self.plugin, self.step, self.message)
  }
}

/// Remote call failure while publishing
#[derive(Debug)]
pub struct PublishError {
  /// Identifier of the publishing plugin (set by the executor)
  pub plugin: String,
  /// Endpoint that was called
  pub target: String,
  /// HTTP status, when the remote answered
  pub status: Option<u16>,
  /// Response body or transport error
  pub message: String,
}

impl PublishError {
  fn help_message(&self) -> Option<String> {
    match self.status {
      Some(401) => Some("The token was rejected. Check GH_TOKEN / GITHUB_TOKEN.".to_string()),
      Some(403) | Some(404) => {
        Some("Check that the token has write access to the repository's releases.".to_string())
      }
      Some(422) => Some("A release for this tag may already exist.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let who = if self.plugin.is_empty() { "publish" } else { &self.plugin };
    match self.status {
      Some(status) => write!(f, "{}: {} returned HTTP {}: {}", who, self.target, status, self.message),
      None => write!(f, "{}: request to {} failed: {}", who, self.target, self.message),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// The release tag is already taken
  TagExists { tag: String },

  /// Push failed
  PushFailed {
    remote: String,
    refspec: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") || reason.contains("rejected") {
          Some("The remote branch has commits you don't have. Re-run the release from an up-to-date checkout.".to_string())
        } else if reason.contains("Permission denied") || reason.contains("403") {
          Some("Check that the CI credentials can push to the repository.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run semrel inside a git checkout (looked at {})",
        path.display()
      )),
      GitError::TagExists { tag } => Some(format!(
        "Tag '{}' was created outside of semrel. Delete it or fix the commit history.",
        tag
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::TagExists { tag } => {
        write!(f, "Release tag already exists: {}", tag)
      }
      GitError::PushFailed { remote, refspec, reason } => {
        write!(f, "Push of {} to {} failed: {}", refspec, remote, reason)
      }
    }
  }
}

/// Result type alias for semrel
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let ReleaseError::Config(e) = error {
    eprintln!("   field: {}\n", e.field());
  }

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
