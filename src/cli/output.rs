//! Output format types for CLI commands.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Prints the wrapped value as pretty JSON on stdout.
    pub fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Counters of a finished scan.
#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub processed: usize,
    pub skipped: usize,
    pub pruned: usize,
    pub errors: Vec<String>,
    pub cancelled: bool,
}

/// A storage root recorded in the workspace config.
#[derive(Debug, Serialize)]
pub struct WorkspaceListing {
    pub path: String,
    pub active: bool,
}
