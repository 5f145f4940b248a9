//! Note listing and note command handlers.

use anyhow::{Context, Result};
use std::path::Path;

use super::{open_library, parse_note_id, parse_project_id};
use crate::cli::output::{Output, OutputFormat};
use crate::cli::{NoteAction, NoteArgs, NotesArgs};
use crate::domain::{NoteKind, NoteTreeEntry};
use crate::library::Library;

pub fn handle_notes(args: &NotesArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    if args.tree {
        return print_tree(&library, args);
    }
    let notes = library
        .read()
        .notes_of_project(&args.project)
        .with_context(|| format!("failed to list notes of {}", args.project))?;

    match args.format {
        OutputFormat::Human => {
            if notes.is_empty() {
                println!("No notes found.");
            }
            for note in &notes {
                println!("{:<10} {}", note.kind().as_str(), note.id());
            }
        }
        OutputFormat::Json => Output::new(&notes).print()?,
    }
    Ok(())
}

fn print_tree(library: &Library, args: &NotesArgs) -> Result<()> {
    let tree = library
        .read()
        .note_tree(&args.project)
        .with_context(|| format!("failed to list folders of {}", args.project))?;

    match args.format {
        OutputFormat::Human => {
            if tree.is_empty() {
                println!("No notes found.");
            }
            print_entries(&tree, 0);
        }
        OutputFormat::Json => Output::new(&tree).print()?,
    }
    Ok(())
}

fn print_entries(entries: &[NoteTreeEntry], depth: usize) {
    let indent = "  ".repeat(depth);
    for entry in entries {
        match entry {
            NoteTreeEntry::Folder { label, children, .. } => {
                println!("{indent}{label}/");
                print_entries(children, depth + 1);
            }
            NoteTreeEntry::Note { label, .. } => println!("{indent}{label}"),
        }
    }
}

pub fn handle_note(args: &NoteArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;

    match &args.action {
        NoteAction::New {
            project,
            drawing,
            folder,
        } => {
            let pid = parse_project_id(project)?;
            let kind = if *drawing {
                NoteKind::Drawing
            } else {
                NoteKind::Markdown
            };
            let id = library
                .create_note(&pid, kind, folder.as_deref())
                .with_context(|| format!("failed to create note in {}", project))?;
            println!("Created note {}", id);
            println!("  {}", id.to_path(library.root()).display());
        }
        NoteAction::Mv { note, name } => {
            let id = parse_note_id(note)?;
            let change = library
                .rename_note(&id, name)
                .with_context(|| format!("failed to rename note {}", note))?;
            println!("Renamed note {} -> {}", change.old, change.new);
        }
        NoteAction::Rm { note } => {
            let id = parse_note_id(note)?;
            library
                .delete_note(&id)
                .with_context(|| format!("failed to delete note {}", note))?;
            println!("Deleted note {}", note);
        }
        NoteAction::Mkdir { project, parent } => {
            let pid = parse_project_id(project)?;
            let id = library
                .create_folder(&pid, parent.as_deref())
                .with_context(|| format!("failed to create folder in {}", project))?;
            println!("Created folder {}", id);
        }
        NoteAction::Mvdir { folder, name } => {
            let id = parse_note_id(folder)?;
            let change = library
                .rename_folder(&id, name)
                .with_context(|| format!("failed to rename folder {}", folder))?;
            println!(
                "Renamed folder {} -> {} ({} files moved)",
                change.folder.old,
                change.folder.new,
                change.files.len()
            );
        }
        NoteAction::Rmdir { folder } => {
            let id = parse_note_id(folder)?;
            let removed = library
                .delete_folder(&id)
                .with_context(|| format!("failed to delete folder {}", folder))?;
            println!("Deleted folder {} ({} files)", folder, removed.len());
        }
    }
    Ok(())
}
