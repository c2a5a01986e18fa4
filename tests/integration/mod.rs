//! Integration tests for semrel
//!
//! Each test builds a throwaway git repository with a bare remote and drives
//! the compiled binary against it.

mod helpers;
mod test_config;
mod test_init;
mod test_release;
