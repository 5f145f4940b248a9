//! Check command handler.

use anyhow::{Context, Result};
use std::path::Path;

use super::open_library;
use crate::cli::CheckArgs;
use crate::cli::output::{Output, OutputFormat};

/// Reports index drift. Drift is a warning, never a failure.
pub fn handle_check(args: &CheckArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    let warnings = library
        .read()
        .check_consistency()
        .with_context(|| "failed to compare index with storage")?;

    match args.format {
        OutputFormat::Human => {
            if warnings.is_empty() {
                println!("Index is consistent.");
                return Ok(());
            }
            for warning in &warnings {
                println!("warning: {}", warning);
            }
            println!(
                "\nFound {} issue(s); run `folio scan` to reconcile.",
                warnings.len()
            );
        }
        OutputFormat::Json => Output::new(&warnings).print()?,
    }
    Ok(())
}
