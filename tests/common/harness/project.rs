//! Builder for test projects with sensible defaults.

// Allow dead code since not every test binary uses every setter
#![allow(dead_code)]

use folio::domain::{Author, Project, ProjectId};

/// Builder for creating test projects.
#[derive(Debug)]
pub struct TestProject {
    project: Project,
}

impl TestProject {
    /// Creates a project with a fixed id and a title equal to the id.
    pub fn new(id: &str) -> Self {
        let id = ProjectId::new(id).expect("Invalid ProjectId");
        let title = id.to_string();
        Self {
            project: Project::new(id, title),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.project.title = title.into();
        self
    }

    /// Adds a category path to the project.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.project.add_category(category);
        self
    }

    pub fn author(mut self, given: &str, family: &str) -> Self {
        self.project.author.push(Author::new(given, family));
        self
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.project.abstract_text = Some(text.into());
        self
    }

    pub fn favorite(mut self) -> Self {
        self.project.favorite = true;
        self
    }

    /// Returns the id of the project being built.
    pub fn id(&self) -> &ProjectId {
        &self.project.id
    }

    pub fn to_project(&self) -> Project {
        self.project.clone()
    }
}
