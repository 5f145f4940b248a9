//! Category tree and category edit handlers.

use anyhow::{Context, Result};
use std::path::Path;

use super::open_library;
use crate::cli::output::{Output, OutputFormat};
use crate::cli::{CategoriesArgs, CategoryAction, CategoryArgs};
use crate::domain::CategoryNode;

pub fn handle_categories(args: &CategoriesArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    let tree = library
        .categories()
        .build_tree()
        .with_context(|| "failed to build category tree")?;

    match args.format {
        OutputFormat::Human => {
            if tree.is_empty() {
                println!("No categories found.");
            } else {
                for node in &tree.roots {
                    print_node(node, 0);
                }
            }
        }
        OutputFormat::Json => Output::new(&tree.roots).print()?,
    }
    Ok(())
}

fn print_node(node: &CategoryNode, depth: usize) {
    let marker = if node.member { "" } else { "/" };
    println!("{}{}{}", "  ".repeat(depth), node.label, marker);
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

pub fn handle_category(args: &CategoryArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    let manager = library.categories();

    let changed = match &args.action {
        CategoryAction::Rename { from, to } => manager
            .rename(from, to)
            .with_context(|| format!("failed to rename category {} to {}", from, to))?,
        CategoryAction::Rm { path } => manager
            .delete(path)
            .with_context(|| format!("failed to delete category {}", path))?,
        CategoryAction::Mv { drag, drop } => manager
            .move_into(drag, drop)
            .with_context(|| format!("failed to move category {} into {}", drag, drop))?,
    };

    println!("Updated {} project(s)", changed.len());
    for id in &changed {
        println!("  {}", id);
    }
    Ok(())
}
