//! Notes and attachments inside project folders.

use super::{FolderChange, IdChange, ItemStore, StoreError, StoreResult};
use crate::domain::{
    ItemKind, Note, NoteId, NoteKind, NoteTreeEntry, ProjectId, rewrite_link_targets,
};
use crate::infra::{FsError, path_exists, read_text, walk_dirs, walk_files, write_atomic};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::{debug, warn};

const UNTITLED: &str = "Untitled";
const NEW_FOLDER: &str = "New Folder";

/// Initial content of a new drawing note.
const EMPTY_DRAWING: &str = r#"{
  "type": "excalidraw",
  "version": 2,
  "elements": [],
  "appState": {},
  "files": {}
}
"#;

impl ItemStore {
    /// Creates an empty note named "Untitled", "Untitled 1", ... in `folder`
    /// (relative to the project folder, or the project folder itself).
    pub fn create_note(
        &self,
        project: &ProjectId,
        kind: NoteKind,
        folder: Option<&str>,
    ) -> StoreResult<NoteId> {
        self.require_project(project)?;
        let prefix = folder_prefix(folder);

        let mut counter = 0;
        let id = loop {
            let stem = match counter {
                0 => UNTITLED.to_string(),
                n => format!("{UNTITLED} {n}"),
            };
            let id = NoteId::new(project, &format!("{prefix}{stem}.{}", kind.extension()))?;
            if !path_exists(&id.to_path(&self.root))? {
                break id;
            }
            counter += 1;
        };

        let content = match kind {
            NoteKind::Markdown => "",
            NoteKind::Drawing => EMPTY_DRAWING,
        };
        self.write_note(&id, content)?;
        debug!(note = %id, "created note");
        Ok(id)
    }

    /// Writes the full text of a note, creating parent folders as needed.
    pub fn write_note(&self, id: &NoteId, content: &str) -> StoreResult<()> {
        let path = id.to_path(&self.root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FsError::from_io(parent, e))?;
        }
        write_atomic(&path, content.as_bytes())?;
        Ok(())
    }

    pub fn read_note(&self, id: &NoteId) -> StoreResult<String> {
        read_text(&id.to_path(&self.root)).map_err(|e| match e {
            e if e.is_not_found() => StoreError::not_found(ItemKind::Note, id),
            e => e.into(),
        })
    }

    /// Renames a note in place, keeping its folder and extension.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` rather than overwriting another
    /// file, and `StoreError::SelfNote` for the project's own note.
    pub fn rename_note(&self, id: &NoteId, stem: &str) -> StoreResult<IdChange<NoteId>> {
        if id.is_self_note() {
            return Err(StoreError::SelfNote {
                project: id.project_id().clone(),
                action: "rename",
            });
        }
        let old_path = id.to_path(&self.root);
        if !path_exists(&old_path)? {
            return Err(StoreError::not_found(ItemKind::Note, id));
        }
        let new_id = id.with_stem(stem)?;
        if new_id == *id {
            return Ok(IdChange {
                old: id.clone(),
                new: new_id,
            });
        }
        let new_path = new_id.to_path(&self.root);
        if path_exists(&new_path)? {
            return Err(StoreError::AlreadyExists {
                id: new_id.to_string(),
            });
        }
        std::fs::rename(&old_path, &new_path).map_err(|e| FsError::from_io(&old_path, e))?;
        debug!(old = %id, new = %new_id, "renamed note");
        Ok(IdChange {
            old: id.clone(),
            new: new_id,
        })
    }

    pub fn delete_note(&self, id: &NoteId) -> StoreResult<()> {
        if id.is_self_note() {
            return Err(StoreError::SelfNote {
                project: id.project_id().clone(),
                action: "delete",
            });
        }
        let path = id.to_path(&self.root);
        std::fs::remove_file(&path).map_err(|e| match FsError::from_io(&path, e) {
            e if e.is_not_found() => StoreError::not_found(ItemKind::Note, id),
            e => e.into(),
        })
    }

    /// Notes of a project, sorted by id. The self note is not included.
    pub fn list_notes(&self, project: &ProjectId) -> StoreResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .project_files(project)?
            .into_iter()
            .filter(|id| !id.is_self_note())
            .filter_map(Note::from_id)
            .collect();
        notes.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(notes)
    }

    /// Notes of every project, sorted by id.
    pub fn list_all_notes(&self) -> StoreResult<Vec<Note>> {
        let mut notes = Vec::new();
        for project in self.list_project_ids()? {
            notes.extend(self.list_notes(&project)?);
        }
        Ok(notes)
    }

    /// PDF attachments of a project, sorted by id.
    pub fn list_attachments(&self, project: &ProjectId) -> StoreResult<Vec<NoteId>> {
        let mut ids: Vec<NoteId> = self
            .project_files(project)?
            .into_iter()
            .filter(|id| id.extension().is_some_and(|e| e.eq_ignore_ascii_case("pdf")))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Rewrites links pointing at `old` to point at `new` in every markdown note.
    ///
    /// Returns the ids of the notes whose text changed.
    pub fn rewrite_links(&self, old: &str, new: &str) -> StoreResult<Vec<NoteId>> {
        let mut changed = Vec::new();
        for note in self.list_all_notes()? {
            if note.kind() != NoteKind::Markdown {
                continue;
            }
            let content = match self.read_note(note.id()) {
                Ok(content) => content,
                Err(err) => {
                    warn!(note = %note.id(), error = %err, "cannot rewrite links");
                    continue;
                }
            };
            if let Cow::Owned(rewritten) = rewrite_link_targets(&content, old, new) {
                self.write_note(note.id(), &rewritten)?;
                changed.push(note.id().clone());
            }
        }
        Ok(changed)
    }

    // ===========================================
    // Folders
    // ===========================================

    /// Creates an empty folder named "New Folder", "New Folder 1", ... in
    /// `parent` (relative to the project folder, or the project folder itself).
    pub fn create_folder(&self, project: &ProjectId, parent: Option<&str>) -> StoreResult<NoteId> {
        self.require_project(project)?;
        let prefix = folder_prefix(parent);

        let mut counter = 0;
        let id = loop {
            let name = match counter {
                0 => NEW_FOLDER.to_string(),
                n => format!("{NEW_FOLDER} {n}"),
            };
            let id = NoteId::new(project, &format!("{prefix}{name}"))?;
            if !path_exists(&id.to_path(&self.root))? {
                break id;
            }
            counter += 1;
        };

        let path = id.to_path(&self.root);
        std::fs::create_dir_all(&path).map_err(|e| FsError::from_io(&path, e))?;
        debug!(folder = %id, "created folder");
        Ok(id)
    }

    /// Notes and attachments anywhere below `folder`, sorted by id.
    pub fn folder_files(&self, folder: &NoteId) -> StoreResult<Vec<NoteId>> {
        let dir = self.folder_dir(folder)?;
        let mut ids: Vec<NoteId> = walk_files(&dir)?
            .filter_map(|file| {
                let relative = format!("{}/{}", folder.relative_path(), file.relative);
                NoteId::new(folder.project_id(), &relative).ok()
            })
            .filter(is_tracked_file)
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Renames a folder in place. Every file below it changes id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::FolderNotFound` if `folder` is not a directory,
    /// and `StoreError::AlreadyExists` if the new name is taken.
    pub fn rename_folder(&self, folder: &NoteId, name: &str) -> StoreResult<FolderChange> {
        let old_dir = self.folder_dir(folder)?;
        let new_id = folder.with_file_name(name)?;
        if new_id == *folder {
            return Ok(FolderChange {
                folder: IdChange {
                    old: folder.clone(),
                    new: new_id,
                },
                files: Vec::new(),
            });
        }
        let new_dir = new_id.to_path(&self.root);
        if path_exists(&new_dir)? {
            return Err(StoreError::AlreadyExists {
                id: new_id.to_string(),
            });
        }

        let old_files = self.folder_files(folder)?;
        std::fs::rename(&old_dir, &new_dir).map_err(|e| FsError::from_io(&old_dir, e))?;
        let files: Vec<IdChange<NoteId>> = old_files
            .into_iter()
            .filter_map(|old| {
                let new = old.rebase(folder, &new_id)?;
                Some(IdChange { old, new })
            })
            .collect();

        debug!(old = %folder, new = %new_id, files = files.len(), "renamed folder");
        Ok(FolderChange {
            folder: IdChange {
                old: folder.clone(),
                new: new_id,
            },
            files,
        })
    }

    /// Deletes a folder and everything below it.
    ///
    /// Returns the notes and attachments that were removed.
    pub fn delete_folder(&self, folder: &NoteId) -> StoreResult<Vec<NoteId>> {
        let dir = self.folder_dir(folder)?;
        let removed = self.folder_files(folder)?;
        std::fs::remove_dir_all(&dir).map_err(|e| FsError::from_io(&dir, e))?;
        debug!(folder = %folder, files = removed.len(), "deleted folder");
        Ok(removed)
    }

    /// The folders and notes of a project as a tree.
    ///
    /// Each level lists folders before notes, both by name. Empty folders are
    /// kept; the self note and attachments are not part of the tree.
    pub fn note_tree(&self, project: &ProjectId) -> StoreResult<Vec<NoteTreeEntry>> {
        self.require_project(project)?;
        let dirs = walk_dirs(&project.dir(&self.root))?;
        let notes: Vec<Note> = self
            .project_files(project)?
            .into_iter()
            .filter(|id| !id.is_self_note())
            .filter_map(Note::from_id)
            .collect();
        tree_level(project, "", &dirs, &notes)
    }

    fn folder_dir(&self, folder: &NoteId) -> StoreResult<PathBuf> {
        let dir = folder.to_path(&self.root);
        let is_dir = std::fs::metadata(&dir)
            .map(|meta| meta.is_dir())
            .or_else(|e| match FsError::from_io(&dir, e) {
                e if e.is_not_found() => Ok(false),
                e => Err(e),
            })?;
        if !is_dir {
            return Err(StoreError::FolderNotFound {
                id: folder.to_string(),
            });
        }
        Ok(dir)
    }

    fn require_project(&self, project: &ProjectId) -> StoreResult<()> {
        if !path_exists(&project.self_note_path(&self.root))? {
            return Err(StoreError::not_found(ItemKind::Project, project));
        }
        Ok(())
    }

    fn project_files(&self, project: &ProjectId) -> StoreResult<Vec<NoteId>> {
        let dir = project.dir(&self.root);
        let files = walk_files(&dir).map_err(|e| match e {
            e if e.is_not_found() => StoreError::not_found(ItemKind::Project, project),
            e => e.into(),
        })?;
        Ok(files
            .filter_map(|file| NoteId::new(project, &file.relative).ok())
            .collect())
    }
}

/// `folder` as a `dir/` prefix, or empty for the project folder itself.
fn folder_prefix(folder: Option<&str>) -> String {
    folder
        .map(|f| f.trim_matches('/'))
        .filter(|f| !f.is_empty())
        .map(|f| format!("{f}/"))
        .unwrap_or_default()
}

fn is_tracked_file(id: &NoteId) -> bool {
    id.extension().is_some_and(|ext| {
        NoteKind::from_extension(ext).is_some() || ext.eq_ignore_ascii_case("pdf")
    })
}

/// Path of the folder holding `relative`, empty at the project level.
fn parent_of(relative: &str) -> &str {
    relative.rfind('/').map_or("", |i| &relative[..i])
}

fn tree_level(
    project: &ProjectId,
    parent: &str,
    dirs: &[String],
    notes: &[Note],
) -> StoreResult<Vec<NoteTreeEntry>> {
    let mut entries = Vec::new();
    for dir in dirs.iter().filter(|d| parent_of(d) == parent) {
        let id = NoteId::new(project, dir)?;
        entries.push(NoteTreeEntry::Folder {
            label: id.file_name().replace("%20", " "),
            children: tree_level(project, dir, dirs, notes)?,
            id,
        });
    }
    for note in notes
        .iter()
        .filter(|n| parent_of(n.id().relative_path()) == parent)
    {
        entries.push(NoteTreeEntry::Note {
            id: note.id().clone(),
            label: note.label(),
            kind: note.kind(),
        });
    }
    Ok(entries)
}
