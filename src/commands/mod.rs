//! CLI commands for semrel
//!
//! ## Releasing
//! - **release**: Run the release pipeline (dry-run and CI aware)
//! - **plan**: Preview the next release without side effects
//!
//! ## Setup & Inspection
//! - **init**: Write a starter `.releaserc.json`
//! - **config**: Show the effective, validated configuration
//! - **plugins**: List the built-in plugins and the steps they handle

pub mod config;
pub mod init;
pub mod plugins;
pub mod release;

pub use config::run_config;
pub use init::run_init;
pub use plugins::run_plugins;
pub use release::{run_plan, run_release};
