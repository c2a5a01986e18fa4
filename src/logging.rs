//! Diagnostic logging
//!
//! User-facing progress goes to stdout via `println!`. Diagnostics go through
//! `tracing` to stderr so `--json` output stays machine-readable.
//!
//! `RUST_LOG` wins when set; otherwise `-v` raises the level one step per
//! occurrence starting from `warn`.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count
pub fn level_for_verbosity(verbose: u8) -> &'static str {
  match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  }
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(verbose: u8) {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(format!("semrel={}", level_for_verbosity(verbose))));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .try_init();
}
