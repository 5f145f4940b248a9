//! Test harness for CLI and workspace integration tests.
//!
//! Provides isolated storage roots, programmatic project creation,
//! and CLI assertion helpers using `assert_cmd`.

mod command;
mod env;
mod project;

// Re-export main types for external use
#[allow(unused_imports)]
pub use command::FolioCommand;
#[allow(unused_imports)]
pub use env::TestEnv;
#[allow(unused_imports)]
pub use project::TestProject;
