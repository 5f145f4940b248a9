//! Project folders and their self-describing notes.

use super::{IdChange, ItemStore, StoreError, StoreResult};
use crate::domain::{ItemKind, Project, ProjectId};
use crate::infra::{
    FsError, list_dirs, parse_project_note, path_exists, read_text, serialize_project_note,
    write_atomic,
};
use std::path::Path;
use tracing::{debug, warn};

/// Parses a self note read from the folder of `id`.
///
/// The folder name is authoritative: a mismatching `_id` inside the block
/// is logged and replaced.
pub(crate) fn project_from_note(id: &ProjectId, path: &Path, content: &str) -> StoreResult<Project> {
    let mut project = parse_project_note(content).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if project.id != *id {
        warn!(
            folder = %id,
            embedded = %project.id,
            "project id in metadata does not match its folder"
        );
        project.id = id.clone();
    }
    Ok(project)
}

impl ItemStore {
    /// Creates the folder and self note of a new project.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the folder is already present.
    pub fn create_project(&self, project: &Project) -> StoreResult<()> {
        let dir = project.id.dir(&self.root);
        if path_exists(&dir)? {
            return Err(StoreError::AlreadyExists {
                id: project.id.to_string(),
            });
        }
        std::fs::create_dir_all(&dir).map_err(|e| FsError::from_io(&dir, e))?;
        self.write_project_note(project)?;
        debug!(project = %project.id, "created project");
        Ok(())
    }

    pub fn read_project(&self, id: &ProjectId) -> StoreResult<Project> {
        let path = id.self_note_path(&self.root);
        let content = read_text(&path).map_err(|e| match e {
            e if e.is_not_found() => StoreError::not_found(ItemKind::Project, id),
            e => e.into(),
        })?;
        project_from_note(id, &path, &content)
    }

    /// Writes `project` back to disk.
    ///
    /// When `project.id` differs from `current`, the folder is moved, the
    /// self note is renamed after the new id and annotations are re-pointed.
    /// The id change is returned so callers can cascade it.
    pub fn update_project(
        &self,
        current: &ProjectId,
        project: &Project,
    ) -> StoreResult<Option<IdChange<ProjectId>>> {
        let old_dir = current.dir(&self.root);
        if !path_exists(&old_dir)? {
            return Err(StoreError::not_found(ItemKind::Project, current));
        }
        if project.id == *current {
            self.write_project_note(project)?;
            return Ok(None);
        }

        let new_dir = project.id.dir(&self.root);
        if path_exists(&new_dir)? {
            return Err(StoreError::AlreadyExists {
                id: project.id.to_string(),
            });
        }
        std::fs::rename(&old_dir, &new_dir).map_err(|e| FsError::from_io(&old_dir, e))?;

        let stale_note = new_dir.join(format!("{current}.md"));
        if path_exists(&stale_note)? {
            let fresh_note = project.id.self_note_path(&self.root);
            std::fs::rename(&stale_note, &fresh_note)
                .map_err(|e| FsError::from_io(&stale_note, e))?;
        }
        self.write_project_note(project)?;

        for mut annotation in self.list_annotations(Some(current))? {
            annotation.project_id = project.id.clone();
            self.put_annotation(&annotation)?;
        }

        debug!(old = %current, new = %project.id, "renamed project");
        Ok(Some(IdChange {
            old: current.clone(),
            new: project.id.clone(),
        }))
    }

    /// Removes a project's folder and its annotation side-files.
    pub fn delete_project(&self, id: &ProjectId) -> StoreResult<()> {
        let dir = id.dir(&self.root);
        if !path_exists(&dir)? {
            return Err(StoreError::not_found(ItemKind::Project, id));
        }
        for annotation in self.list_annotations(Some(id))? {
            self.delete_annotation(&annotation.id)?;
        }
        std::fs::remove_dir_all(&dir).map_err(|e| FsError::from_io(&dir, e))?;
        debug!(project = %id, "deleted project");
        Ok(())
    }

    /// Ids of every folder under the root that holds a self note, sorted.
    pub fn list_project_ids(&self) -> StoreResult<Vec<ProjectId>> {
        let mut ids = Vec::new();
        for name in list_dirs(&self.root)? {
            let Ok(id) = ProjectId::new(&name) else {
                continue;
            };
            if path_exists(&id.self_note_path(&self.root))? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Every readable project, sorted by id. Unparsable projects are skipped.
    pub fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let mut projects = Vec::new();
        for id in self.list_project_ids()? {
            match self.read_project(&id) {
                Ok(project) => projects.push(project),
                Err(err) => warn!(project = %id, error = %err, "skipping unreadable project"),
            }
        }
        Ok(projects)
    }

    fn write_project_note(&self, project: &Project) -> StoreResult<()> {
        let path = project.id.self_note_path(&self.root);
        write_atomic(&path, serialize_project_note(project).as_bytes())?;
        Ok(())
    }
}
