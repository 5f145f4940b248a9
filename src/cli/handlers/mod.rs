//! Command handlers for the CLI.

mod categories;
mod check;
mod links;
mod notes;
mod projects;
mod scan;
mod search;
mod workspaces;


use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::{NoteId, ProjectId};
use crate::index::{FileResult, ProgressReporter};
use crate::library::Library;

// Re-export public items
pub use categories::{handle_categories, handle_category};
pub use check::handle_check;
pub use links::{handle_backlinks, handle_graph, handle_links};
pub use notes::{handle_note, handle_notes};
pub use projects::{handle_project, handle_projects};
pub use scan::handle_scan;
pub use search::handle_search;
pub use workspaces::handle_workspaces;

// ===========================================
// Shared Utilities
// ===========================================

/// Progress reporter that prints to stdout.
pub(crate) struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub(crate) fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn on_file(&mut self, path: &Path, result: FileResult) {
        if self.verbose {
            match result {
                FileResult::Indexed => println!("  indexed: {}", path.display()),
                FileResult::Skipped => println!("  skipped: {}", path.display()),
                FileResult::Error(msg) => eprintln!("  error: {}: {}", path.display(), msg),
            }
        }
    }

    fn on_complete(&mut self, processed: usize, errors: usize) {
        if errors > 0 {
            eprintln!("Indexed {} files with {} errors", processed, errors);
        } else {
            println!("Indexed {} files", processed);
        }
    }
}

/// Opens the workspace at `root`, creating its index on first use.
pub(crate) fn open_library(root: &Path) -> Result<Library> {
    Library::open(root)
        .with_context(|| format!("failed to open workspace at {}", root.display()))
}

pub(crate) fn parse_project_id(id: &str) -> Result<ProjectId> {
    ProjectId::new(id).with_context(|| format!("invalid project id: {}", id))
}

pub(crate) fn parse_note_id(id: &str) -> Result<NoteId> {
    id.parse()
        .with_context(|| format!("invalid note id: {}", id))
}

/// Truncates a string to a maximum display width, adding ellipsis if needed.
pub(crate) fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
