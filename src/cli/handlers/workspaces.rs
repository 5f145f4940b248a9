//! Handler for the `workspaces` command.

use anyhow::Result;

use crate::cli::WorkspacesArgs;
use crate::cli::output::{Output, OutputFormat, WorkspaceListing};
use crate::config::WorkspaceConfig;

/// Lists the storage roots that have been scanned, marking the active one.
pub fn handle_workspaces(args: &WorkspacesArgs, config: &WorkspaceConfig) -> Result<()> {
    let active = config.storage_path.as_deref();
    let listings: Vec<WorkspaceListing> = config
        .storage_paths
        .iter()
        .map(|path| WorkspaceListing {
            path: path.display().to_string(),
            active: Some(path.as_path()) == active,
        })
        .collect();

    match args.format {
        OutputFormat::Human => {
            if listings.is_empty() {
                println!("No workspaces recorded.");
                println!();
                println!("Run `folio scan` inside a storage root to record it in");
                println!("  {}", WorkspaceConfig::config_path().display());
            }
            for listing in &listings {
                let marker = if listing.active { " (active)" } else { "" };
                println!("{}{}", listing.path, marker);
            }
        }
        OutputFormat::Json => Output::new(&listings).print()?,
    }
    Ok(())
}
