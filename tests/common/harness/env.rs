//! Isolated test environment with a temp storage root.

// Allow dead code since not every test binary uses every helper
#![allow(dead_code)]

use super::{FolioCommand, TestProject};
use folio::domain::{Annotation, AnnotationKind, NoteId, ProjectId};
use folio::index::NoopReporter;
use folio::library::{Library, ScanOptions};
use folio::store::ItemStore;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment with a temporary storage root.
///
/// The workspace descriptor lives next to the root, never inside it, so
/// CLI runs never touch the user's real config.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    /// Path to the storage root
    root: PathBuf,
    /// Path to the workspace descriptor
    config_path: PathBuf,
}

impl TestEnv {
    /// Creates a new isolated test environment with an empty storage root.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("library");
        std::fs::create_dir(&root).expect("Failed to create storage root");
        let config_path = temp_dir.path().join("config").join("workspace.toml");
        Self {
            _temp_dir: temp_dir,
            root,
            config_path,
        }
    }

    /// Returns the path to the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the path where the SQLite index is stored.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(".folio").join("index.db")
    }

    pub fn store(&self) -> ItemStore {
        ItemStore::new(&self.root)
    }

    /// Opens the workspace with its on-disk index.
    pub fn library(&self) -> Library {
        Library::open(&self.root).expect("Failed to open library")
    }

    /// Writes a project folder with its self note.
    pub fn add_project(&self, project: &TestProject) -> ProjectId {
        self.store()
            .create_project(&project.to_project())
            .expect("Failed to write test project");
        project.id().clone()
    }

    /// Writes a note file below a project folder and returns its id.
    pub fn add_note(&self, project: &ProjectId, relative: &str, content: &str) -> NoteId {
        let id = NoteId::new(project, relative).expect("Invalid note path");
        self.store()
            .write_note(&id, content)
            .expect("Failed to write test note");
        id
    }

    /// Writes an annotation side-file and returns its id.
    pub fn add_annotation(&self, project: &ProjectId, page: u32, content: &str) -> String {
        let mut annotation = Annotation::new(project.clone(), page, AnnotationKind::Highlight);
        annotation.content = content.to_string();
        self.store()
            .put_annotation(&annotation)
            .expect("Failed to write test annotation");
        annotation.id
    }

    /// Runs a full scan against the on-disk index.
    pub fn scan(&self) -> Library {
        let library = self.library();
        library
            .scan(ScanOptions::default(), &mut NoopReporter)
            .expect("Scan should succeed");
        library
    }

    /// Creates a FolioCommand configured for this test environment.
    pub fn cmd(&self) -> FolioCommand {
        FolioCommand::new()
            .config(&self.config_path)
            .dir(&self.root)
    }

    /// Writes a file below the storage root and returns its path.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_creates_root() {
        let env = TestEnv::new();
        assert!(env.root().is_dir());
        assert!(!env.config_path().starts_with(env.root()));
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.root().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_add_project_writes_self_note() {
        let env = TestEnv::new();
        let id = env.add_project(&TestProject::new("p1").title("Optics"));
        assert!(env.root().join("p1").join("p1.md").is_file());
        assert_eq!(env.store().read_project(&id).unwrap().title, "Optics");
    }

    #[test]
    fn test_env_scan_creates_index() {
        let env = TestEnv::new();
        env.add_project(&TestProject::new("p1"));
        let library = env.scan();
        assert!(env.index_path().exists());
        assert_eq!(library.index().meta_ids().unwrap(), vec!["p1"]);
    }
}
