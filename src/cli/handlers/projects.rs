//! Project listing and project command handlers.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::Path;

use super::{open_library, parse_project_id, truncate_str};
use crate::cli::output::{Output, OutputFormat};
use crate::cli::{ProjectAction, ProjectArgs, ProjectsArgs};
use crate::domain::{CategoryPath, Note};
use crate::read::{AnnotationSummary, ProjectSummary};

pub fn handle_projects(args: &ProjectsArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;
    let read = library.read();
    let projects = match &args.category {
        Some(category) => read
            .projects_in_category(category)
            .with_context(|| format!("failed to list projects in {}", category))?,
        None => read
            .all_projects()
            .with_context(|| "failed to list projects")?,
    };

    match args.format {
        OutputFormat::Human => {
            if projects.is_empty() {
                println!("No projects found.");
                return Ok(());
            }
            println!("{:<28}  {:<50}  {:>4}", "ID", "Title", "Year");
            println!("{:<28}  {:<50}  {:>4}", "-".repeat(28), "-".repeat(50), "----");
            for project in &projects {
                let year = project.year.map(|y| y.to_string()).unwrap_or_default();
                println!(
                    "{:<28}  {:<50}  {:>4}",
                    project.id,
                    truncate_str(&project.title, 50),
                    year
                );
            }
            println!();
            println!("{} project(s)", projects.len());
        }
        OutputFormat::Json => Output::new(&projects).print()?,
    }
    Ok(())
}

/// A project with its notes and annotations.
#[derive(Debug, Serialize)]
struct ProjectDetail {
    #[serde(flatten)]
    project: ProjectSummary,
    notes: Vec<Note>,
    annotations: Vec<AnnotationSummary>,
}

pub fn handle_project(args: &ProjectArgs, root: &Path) -> Result<()> {
    let library = open_library(root)?;

    match &args.action {
        ProjectAction::New { title, categories } => {
            let categories = categories
                .iter()
                .map(|c| {
                    CategoryPath::new(c)
                        .map(|path| path.to_string())
                        .with_context(|| format!("invalid category: {}", c))
                })
                .collect::<Result<Vec<_>>>()?;
            let mut project = library
                .create_project(title)
                .with_context(|| format!("failed to create project {}", title))?;
            if !categories.is_empty() {
                project.set_categories(categories);
                library.update_project(&project)?;
            }
            println!("Created project {}", project.id);
            println!("  {}", project.id.self_note_path(library.root()).display());
        }
        ProjectAction::Show { id, format } => {
            let read = library.read();
            let Some(project) = read.get_project(id)? else {
                bail!("project not found: {}", id);
            };
            let detail = ProjectDetail {
                notes: read.notes_of_project(id)?,
                annotations: read.annotations_of_project(id)?,
                project,
            };
            match format {
                OutputFormat::Human => print_detail(&detail),
                OutputFormat::Json => Output::new(&detail).print()?,
            }
        }
        ProjectAction::Mv { id, new_id } => {
            let old = parse_project_id(id)?;
            let new = parse_project_id(new_id)?;
            match library
                .rename_project(&old, &new)
                .with_context(|| format!("failed to rename project {}", id))?
            {
                Some(change) => println!("Renamed project {} -> {}", change.old, change.new),
                None => println!("Project {} unchanged", id),
            }
        }
        ProjectAction::Rm { id } => {
            let pid = parse_project_id(id)?;
            library
                .delete_project(&pid)
                .with_context(|| format!("failed to delete project {}", id))?;
            println!("Deleted project {}", id);
        }
    }
    Ok(())
}

fn print_detail(detail: &ProjectDetail) {
    let project = &detail.project;
    println!("{}", project.title);
    println!("  id:         {}", project.id);
    if let Some(kind) = &project.kind {
        println!("  type:       {}", kind);
    }
    if let Some(year) = project.year {
        println!("  year:       {}", year);
    }
    if !project.authors.is_empty() {
        println!("  authors:    {}", project.authors.join("; "));
    }
    if !project.categories.is_empty() {
        println!("  categories: {}", project.categories.join(", "));
    }
    if !project.tags.is_empty() {
        println!("  tags:       {}", project.tags.join(", "));
    }
    if project.favorite {
        println!("  favorite:   yes");
    }

    if !detail.notes.is_empty() {
        println!();
        println!("Notes:");
        for note in &detail.notes {
            println!("  {}", note.id());
        }
    }
    if !detail.annotations.is_empty() {
        println!();
        println!("Annotations:");
        for annotation in &detail.annotations {
            println!(
                "  {} (p.{}, {}) {}",
                annotation.id,
                annotation.page_number,
                annotation.kind,
                truncate_str(&annotation.content, 60)
            );
        }
    }
}
