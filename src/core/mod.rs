//! Core building blocks shared by the engine, the plugins and the CLI
//!
//! - **config**: release configuration parsing and validation
//! - **context**: the release context threaded through a run
//! - **error**: error types with contextual help messages and exit codes
//! - **vcs**: git access (`Repository` trait, `SystemGit`)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
