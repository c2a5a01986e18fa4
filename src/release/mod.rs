//! Release orchestration
//!
//! A release run walks a fixed sequence of lifecycle steps. Each step is
//! delegated to the configured plugin chain; the engine itself only decides
//! the next version, creates the tag and pushes it.
//!
//! # Invariants
//!
//! 1. **Plugin order is config order**
//!    - Within a step, plugins run in the order they are declared
//!    - A plugin that does not handle a step is skipped
//!
//! 2. **No release, no side effects**
//!    - When commit analysis asks for no release the run stops before
//!      anything is written, committed, tagged or pushed
//!
//! 3. **No rollback**
//!    - A failing step aborts the run; earlier steps stay done
//!
//! # Layout
//!
//! - **step**: the lifecycle steps
//! - **version**: release types, version bumps and tag naming
//! - **executor**: runs one step across the plugin chain
//! - **engine**: the whole run

pub mod engine;
pub mod executor;
pub mod step;
pub mod version;

pub use engine::{ReleaseEngine, RunOptions, RunOutcome};
