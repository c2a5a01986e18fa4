//! `semrel config`: show the effective, validated configuration

use crate::core::config::{ConfigFormat, ReleaseConfig};
use crate::core::error::ReleaseResult;
use crate::plugins::PluginRegistry;
use std::env;
use std::path::Path;

/// Print the loaded config, re-rendered with defaults filled in
///
/// Without a format flag the config is printed in the format of the file it
/// came from.
pub fn run_config(config_path: Option<&Path>, format: Option<ConfigFormat>) -> ReleaseResult<()> {
  let cwd = env::current_dir()?;
  let registry = PluginRegistry::with_builtin_plugins();
  let (config, path) = ReleaseConfig::load_validated(&cwd, config_path, &registry)?;

  let format = format.unwrap_or_else(|| ConfigFormat::from_path(&path));
  tracing::info!(path = %path.display(), "rendering effective config");

  let rendered = config.render(format)?;
  println!("{}", rendered.trim_end());
  Ok(())
}
