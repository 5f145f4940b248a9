//! Notes owned by a project.

use crate::domain::{NoteId, ProjectId};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Content type of a note file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Markdown text (`.md`).
    Markdown,
    /// Drawing scene (`.excalidraw`), text comes from an extractor.
    Drawing,
}

impl NoteKind {
    pub fn extension(&self) -> &'static str {
        match self {
            NoteKind::Markdown => "md",
            NoteKind::Drawing => "excalidraw",
        }
    }

    /// Value stored in the index `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Markdown => "markdown",
            NoteKind::Drawing => "excalidraw",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" => Some(NoteKind::Markdown),
            "excalidraw" => Some(NoteKind::Drawing),
            _ => None,
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" | "md" => Ok(NoteKind::Markdown),
            "excalidraw" | "drawing" => Ok(NoteKind::Drawing),
            other => Err(format!("unknown note type '{other}'")),
        }
    }
}

/// One entry of a project's folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoteTreeEntry {
    Folder {
        id: NoteId,
        label: String,
        children: Vec<NoteTreeEntry>,
    },
    Note {
        id: NoteId,
        label: String,
        kind: NoteKind,
    },
}

impl NoteTreeEntry {
    pub fn id(&self) -> &NoteId {
        match self {
            NoteTreeEntry::Folder { id, .. } | NoteTreeEntry::Note { id, .. } => id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NoteTreeEntry::Folder { label, .. } | NoteTreeEntry::Note { label, .. } => label,
        }
    }
}

/// A note file inside a project folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Note {
    id: NoteId,
    kind: NoteKind,
}

impl Note {
    pub fn new(id: NoteId, kind: NoteKind) -> Self {
        Self { id, kind }
    }

    /// Classifies a note id by its extension.
    pub fn from_id(id: NoteId) -> Option<Self> {
        let kind = NoteKind::from_extension(id.extension()?)?;
        Some(Self { id, kind })
    }

    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn project_id(&self) -> &ProjectId {
        self.id.project_id()
    }

    pub fn kind(&self) -> NoteKind {
        self.kind
    }

    /// Display label: the file name with `%20` shown as a space.
    pub fn label(&self) -> String {
        self.id.file_name().replace("%20", " ")
    }

    pub fn path(&self, root: &Path) -> PathBuf {
        self.id.to_path(root)
    }
}
