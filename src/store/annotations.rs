//! Annotation side-files under `.folio/annotations/`.

use super::{ItemStore, StoreError, StoreResult};
use crate::domain::{Annotation, ItemKind, ProjectId};
use crate::infra::{FsError, ensure_dir, read_text, write_atomic};
use std::path::Path;
use tracing::warn;

/// Parses one annotation side-file.
pub(crate) fn parse_annotation(path: &Path, content: &str) -> StoreResult<Annotation> {
    serde_json::from_str(content).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl ItemStore {
    /// Creates or replaces an annotation side-file.
    pub fn put_annotation(&self, annotation: &Annotation) -> StoreResult<()> {
        Annotation::validate_id(&annotation.id)?;
        ensure_dir(&self.annotations_dir())?;
        let json = serde_json::to_vec_pretty(annotation)
            .expect("annotation serialization is infallible");
        write_atomic(&self.annotation_path(&annotation.id), &json)?;
        Ok(())
    }

    pub fn read_annotation(&self, id: &str) -> StoreResult<Annotation> {
        Annotation::validate_id(id)?;
        let path = self.annotation_path(id);
        let content = read_text(&path).map_err(|e| match e {
            e if e.is_not_found() => StoreError::not_found(ItemKind::Annotation, id),
            e => e.into(),
        })?;
        parse_annotation(&path, &content)
    }

    pub fn delete_annotation(&self, id: &str) -> StoreResult<()> {
        Annotation::validate_id(id)?;
        let path = self.annotation_path(id);
        std::fs::remove_file(&path).map_err(|e| match FsError::from_io(&path, e) {
            e if e.is_not_found() => StoreError::not_found(ItemKind::Annotation, id),
            e => e.into(),
        })
    }

    /// Readable annotations, optionally limited to one project, sorted by id.
    ///
    /// A missing annotations directory means there are none.
    pub fn list_annotations(&self, project: Option<&ProjectId>) -> StoreResult<Vec<Annotation>> {
        let dir = self.annotations_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FsError::from_io(&dir, e).into()),
        };

        let mut annotations = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| FsError::from_io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = read_text(&path)
                .map_err(StoreError::from)
                .and_then(|content| parse_annotation(&path, &content));
            match parsed {
                Ok(annotation) => {
                    if project.is_none_or(|p| annotation.project_id == *p) {
                        annotations.push(annotation);
                    }
                }
                Err(err) => warn!(path = %path.display(), error = %err, "skipping annotation"),
            }
        }
        annotations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(annotations)
    }
}
