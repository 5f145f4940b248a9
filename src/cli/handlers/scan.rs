//! Scan command handler.

use anyhow::{Context, Result};
use std::path::Path;

use super::{ConsoleReporter, open_library};
use crate::cli::ScanArgs;
use crate::cli::output::{Output, OutputFormat, ScanSummary};
use crate::config::WorkspaceConfig;
use crate::index::NoopReporter;
use crate::library::ScanOptions;

pub fn handle_scan(
    args: &ScanArgs,
    root: &Path,
    config: &mut WorkspaceConfig,
    verbose: bool,
) -> Result<()> {
    let library = open_library(root)?;
    let options = ScanOptions {
        last_scan_time: if args.full { None } else { config.mark_for(root) },
        full: args.full,
        ..Default::default()
    };

    let report = match args.format {
        OutputFormat::Human => {
            if args.full {
                println!("Rebuilding index...");
            } else {
                println!("Updating index...");
            }
            library.scan(options, &mut ConsoleReporter::new(verbose))
        }
        OutputFormat::Json => library.scan(options, &mut NoopReporter),
    }
    .with_context(|| format!("failed to scan {}", root.display()))?;

    if !report.cancelled {
        config.record_scan(root, report.last_scan_time);
        config.save()?;
    }

    match args.format {
        OutputFormat::Human => {
            for error in &report.errors {
                eprintln!("  {}", error);
            }
            if verbose && (report.skipped > 0 || report.pruned > 0) {
                println!(
                    "  {} unchanged, {} stale entries removed",
                    report.skipped, report.pruned
                );
            }
        }
        OutputFormat::Json => {
            Output::new(ScanSummary {
                processed: report.processed,
                skipped: report.skipped,
                pruned: report.pruned,
                errors: report.errors.iter().map(ToString::to_string).collect(),
                cancelled: report.cancelled,
            })
            .print()?;
        }
    }

    Ok(())
}
