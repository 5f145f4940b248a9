//! File-backed item store.
//!
//! The storage root is the single source of truth. Every project is a folder
//! holding a self-describing note plus any number of notes and attachments;
//! annotations live as JSON side-files under the hidden `.folio/` tree.
//! Nothing here touches the content index.

mod annotations;
mod notes;
mod projects;

#[cfg(test)]
mod tests;

pub(crate) use annotations::parse_annotation;
pub(crate) use projects::project_from_note;

use crate::domain::{Annotation, ItemKind, NoteId, ParseItemIdError, ProjectId};
use crate::infra::{FsError, path_exists};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the hidden per-workspace directory.
pub const APP_DIR: &str = ".folio";

// ===========================================
// Error Types
// ===========================================

/// Errors from item store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: ItemKind, id: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("folder not found: {id}")]
    FolderNotFound { id: String },

    #[error("item already exists: {id}")]
    AlreadyExists { id: String },

    #[error(transparent)]
    InvalidId(#[from] ParseItemIdError),

    #[error("cannot {action} the self note of project {project}")]
    SelfNote {
        project: ProjectId,
        action: &'static str,
    },

    #[error(transparent)]
    Fs(#[from] FsError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::FolderNotFound { .. }
        )
            || matches!(self, StoreError::Fs(e) if e.is_not_found())
    }

    fn not_found(kind: ItemKind, id: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for item store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// An id change reported by a rename so dependents can cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdChange<T> {
    pub old: T,
    pub new: T,
}

/// What moved when a folder was renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderChange {
    pub folder: IdChange<NoteId>,
    /// Notes and attachments below the folder, old and new ids.
    pub files: Vec<IdChange<NoteId>>,
}

// ===========================================
// ItemStore
// ===========================================

/// Create/read/update/delete access to items under a storage root.
#[derive(Debug, Clone)]
pub struct ItemStore {
    root: PathBuf,
}

impl ItemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The hidden `.folio/` directory.
    pub fn app_dir(&self) -> PathBuf {
        self.root.join(APP_DIR)
    }

    pub fn annotations_dir(&self) -> PathBuf {
        self.app_dir().join("annotations")
    }

    /// Default location of the content index database.
    pub fn index_path(&self) -> PathBuf {
        self.app_dir().join("index.db")
    }

    pub fn annotation_path(&self, id: &str) -> PathBuf {
        self.annotations_dir().join(format!("{id}.json"))
    }

    /// Classifies `id` by looking at which backing file exists.
    ///
    /// Existence checks that fail are treated as absent.
    pub fn resolve(&self, id: &str) -> Option<ItemKind> {
        let exists = |path: &Path| path_exists(path).unwrap_or(false);

        if ProjectId::new(id).is_ok_and(|p| exists(&p.self_note_path(&self.root))) {
            return Some(ItemKind::Project);
        }
        if id
            .parse::<NoteId>()
            .is_ok_and(|n| exists(&n.to_path(&self.root)))
        {
            return Some(ItemKind::Note);
        }
        if Annotation::validate_id(id).is_ok() && exists(&self.annotation_path(id)) {
            return Some(ItemKind::Annotation);
        }
        None
    }
}
