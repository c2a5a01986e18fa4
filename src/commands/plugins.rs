//! `semrel plugins`: list the built-in plugins

use crate::core::error::ReleaseResult;
use crate::plugins::{PluginInfo, PluginRegistry};

/// List every plugin the config can reference
pub fn run_plugins(json: bool) -> ReleaseResult<()> {
  let plugins = PluginRegistry::with_builtin_plugins().list();

  if json {
    println!("{}", serde_json::to_string_pretty(&plugins)?);
    return Ok(());
  }

  println!("🔌 Available plugins:");
  for info in &plugins {
    print_plugin(info);
  }
  Ok(())
}

fn print_plugin(info: &PluginInfo) {
  println!();
  match &info.alias {
    Some(alias) => println!("  {} (alias: {})", info.identifier, alias),
    None => println!("  {}", info.identifier),
  }
  println!("    {}", info.description);

  let steps: Vec<&str> = info.steps.iter().map(|s| s.as_str()).collect();
  println!("    steps: {}", steps.join(", "));
}
