//! folio - research projects, notes and annotations with a rebuildable index

pub mod category;
pub mod cli;
pub mod config;
pub mod domain;
pub mod extract;
pub mod graph;
pub mod index;
pub mod infra;
pub mod library;
pub mod read;
pub mod store;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{
    Cli, Command,
    handlers::{
        handle_backlinks, handle_categories, handle_category, handle_check, handle_graph,
        handle_links, handle_note, handle_notes, handle_project, handle_projects, handle_scan,
        handle_search, handle_workspaces,
    },
};
use config::WorkspaceConfig;

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = WorkspaceConfig::load()?;
    let root = config.storage_root(cli.dir.as_deref());
    let verbose = cli.verbose > 0;

    match &cli.command {
        Command::Scan(args) => handle_scan(args, &root, &mut config, verbose),
        Command::Categories(args) => handle_categories(args, &root),
        Command::Category(args) => handle_category(args, &root),
        Command::Projects(args) => handle_projects(args, &root),
        Command::Project(args) => handle_project(args, &root),
        Command::Notes(args) => handle_notes(args, &root),
        Command::Note(args) => handle_note(args, &root),
        Command::Links(args) => handle_links(args, &root),
        Command::Backlinks(args) => handle_backlinks(args, &root),
        Command::Graph(args) => handle_graph(args, &root),
        Command::Search(args) => handle_search(args, &root),
        Command::Check(args) => handle_check(args, &root),
        Command::Workspaces(args) => handle_workspaces(args, &config),
        Command::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "folio",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Installs a stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("folio={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
