//! Search command handler.

use anyhow::{Context, Result};
use std::path::Path;

use super::open_library;
use crate::cli::SearchArgs;
use crate::cli::output::{Output, OutputFormat};
use crate::index::SearchHit;

pub fn handle_search(args: &SearchArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    let hits = library
        .read()
        .search(&args.query)
        .with_context(|| format!("search failed for query: {}", args.query))?;

    match args.format {
        OutputFormat::Human => print_hits(&hits),
        OutputFormat::Json => Output::new(&hits).print()?,
    }
    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results found.");
        return;
    }
    for hit in hits {
        match hit.page {
            Some(page) => println!("{} (p.{})", hit.item_id, page),
            None => println!("{}", hit.item_id),
        }
        let snippet = hit.snippet.replace('\n', " ");
        if !snippet.trim().is_empty() {
            println!("  {}", snippet.trim());
        }
    }
    println!();
    println!("{} result(s)", hits.len());
}
