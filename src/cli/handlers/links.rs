//! Link-related command handlers (links, backlinks, graph).

use anyhow::{Context, Result};
use std::path::Path;

use super::open_library;
use crate::cli::output::{Output, OutputFormat};
use crate::cli::{GraphArgs, LinksArgs};

pub fn handle_links(args: &LinksArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    let targets = library
        .read()
        .forward_links(&args.item)
        .with_context(|| format!("failed to query links of {}", args.item))?;
    print_ids(&targets, args.format, "No links found.")
}

pub fn handle_backlinks(args: &LinksArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    let sources = library
        .read()
        .backlinks(&args.item)
        .with_context(|| format!("failed to query backlinks of {}", args.item))?;
    print_ids(&sources, args.format, "No backlinks found.")
}

fn print_ids(ids: &[String], format: OutputFormat, empty: &str) -> Result<()> {
    match format {
        OutputFormat::Human => {
            if ids.is_empty() {
                println!("{}", empty);
            }
            for id in ids {
                println!("{}", id);
            }
        }
        OutputFormat::Json => Output::new(ids).print()?,
    }
    Ok(())
}

pub fn handle_graph(args: &GraphArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    let graph = library
        .graph()
        .graph(&args.item)
        .with_context(|| format!("failed to build graph around {}", args.item))?;

    match args.format {
        OutputFormat::Human => {
            println!("Nodes:");
            for node in &graph.nodes {
                println!("  {:<10}  {}  ({})", node.kind.as_str(), node.id, node.label);
            }
            println!("Edges:");
            if graph.edges.is_empty() {
                println!("  (none)");
            }
            for edge in &graph.edges {
                println!("  {} -> {}", edge.source, edge.target);
            }
        }
        OutputFormat::Json => Output::new(&graph).print()?,
    }
    Ok(())
}
