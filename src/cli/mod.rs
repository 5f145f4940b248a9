//! CLI command definitions and handlers

pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use output::OutputFormat;

/// folio - research projects, notes and annotations on disk
#[derive(Parser, Debug)]
#[command(name = "folio", version, about, long_about = None)]
pub struct Cli {
    /// Storage root (overrides the workspace config)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bring the index up to date with the storage root
    Scan(ScanArgs),

    /// Show the category tree
    Categories(CategoriesArgs),

    /// Rename, delete or move a category
    Category(CategoryArgs),

    /// List projects, optionally restricted to a category or view
    Projects(ProjectsArgs),

    /// Create, show, rename or delete a project
    Project(ProjectArgs),

    /// List the notes of a project
    Notes(NotesArgs),

    /// Create, rename or delete a note
    Note(NoteArgs),

    /// Show the items a note or project links to
    Links(LinksArgs),

    /// Show the notes that link to an item
    Backlinks(LinksArgs),

    /// Show the link graph around an item
    Graph(GraphArgs),

    /// Full-text search across projects, notes, attachments and annotations
    Search(SearchArgs),

    /// Compare the index against the files on disk
    Check(CheckArgs),

    /// List storage roots recorded in the workspace config
    Workspaces(WorkspacesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `scan` command
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Clear the index and rescan every file
    #[arg(long)]
    pub full: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `categories` command
#[derive(Parser, Debug)]
pub struct CategoriesArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `category` command
#[derive(Parser, Debug)]
pub struct CategoryArgs {
    #[command(subcommand)]
    pub action: CategoryAction,
}

#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    /// Rename a category (descendants keep their paths)
    Rename {
        /// Current path, e.g. physics/optics
        from: String,
        /// New path
        to: String,
    },

    /// Remove a category and its descendants from every project
    Rm {
        /// Category path
        path: String,
    },

    /// Move a category subtree below another category
    Mv {
        /// Category to move
        drag: String,
        /// New parent category
        drop: String,
    },
}

/// Arguments for the `projects` command
#[derive(Parser, Debug)]
pub struct ProjectsArgs {
    /// Category path or view (library, favorites, added)
    pub category: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `project` command
#[derive(Parser, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Create a project with a generated id
    New {
        /// Project title
        title: String,

        /// Category for the project (can be specified multiple times)
        #[arg(short = 'c', long = "category", action = ArgAction::Append)]
        categories: Vec<String>,
    },

    /// Show a project's metadata
    Show {
        /// Project id
        id: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },

    /// Change a project's id, rewriting links to it and its notes
    Mv {
        /// Current project id
        id: String,
        /// New project id
        new_id: String,
    },

    /// Delete a project, its notes and its annotations
    Rm {
        /// Project id
        id: String,
    },
}

/// Arguments for the `notes` command
#[derive(Parser, Debug)]
pub struct NotesArgs {
    /// Project id
    pub project: String,

    /// Show folders and notes as a tree
    #[arg(long)]
    pub tree: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `note` command
#[derive(Parser, Debug)]
pub struct NoteArgs {
    #[command(subcommand)]
    pub action: NoteAction,
}

#[derive(Subcommand, Debug)]
pub enum NoteAction {
    /// Create an untitled note in a project
    New {
        /// Project id
        project: String,

        /// Create a drawing instead of a markdown note
        #[arg(long)]
        drawing: bool,

        /// Folder below the project, e.g. drafts/2024
        #[arg(long)]
        folder: Option<String>,
    },

    /// Rename a note, keeping its extension
    Mv {
        /// Note id, e.g. P01.../intro.md
        note: String,
        /// New file name without extension
        name: String,
    },

    /// Delete a note
    Rm {
        /// Note id
        note: String,
    },

    /// Create a "New Folder" in a project
    Mkdir {
        /// Project id
        project: String,

        /// Parent folder below the project
        #[arg(long)]
        parent: Option<String>,
    },

    /// Rename a folder and rewrite links to everything inside it
    Mvdir {
        /// Folder id, e.g. P01.../drafts
        folder: String,
        /// New folder name
        name: String,
    },

    /// Delete a folder with all its notes and attachments
    Rmdir {
        /// Folder id
        folder: String,
    },
}

/// Arguments for the `links` and `backlinks` commands
#[derive(Parser, Debug)]
pub struct LinksArgs {
    /// Item id (project, note or annotation)
    pub item: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `graph` command
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Item id at the center of the graph
    pub item: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `search` command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query (case-insensitive substring)
    pub query: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `check` command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `workspaces` command
#[derive(Parser, Debug)]
pub struct WorkspacesArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
