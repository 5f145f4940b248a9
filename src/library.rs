//! One workspace: the item store, its content index and the operations
//! that keep both in step.
//!
//! Mutations write the store first and the index second. The writes are not
//! transactional; if the second one is lost, the next scan repairs it.

use crate::category::{CategoryError, CategoryPathManager};
use crate::domain::{NoteId, NoteKind, Project, ProjectId};
use crate::extract::{DefaultExtractor, TextExtractor};
use crate::graph::{GraphError, LinkGraphEngine};
use crate::index::{
    CancelFlag, ContentIndex, IndexError, ProgressReporter, ReindexError, Reindexer, ScanReport,
};
use crate::infra::check_readable_dir;
use crate::read::{ReadError, ReadPath};
use crate::store::{FolderChange, IdChange, ItemStore, StoreError};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Reindex(#[from] ReindexError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Category(#[from] CategoryError),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Options for [`Library::scan`].
#[derive(Default)]
pub struct ScanOptions {
    /// Mark of the previous scan; `None` processes every file.
    pub last_scan_time: Option<DateTime<Utc>>,
    /// Clear the index and rescan from scratch.
    pub full: bool,
    pub cancel: CancelFlag,
}

pub struct Library {
    store: ItemStore,
    index: ContentIndex,
    extractor: Box<dyn TextExtractor>,
}

impl Library {
    /// Opens the workspace at `root` with its index under `.folio/`.
    pub fn open(root: impl Into<PathBuf>) -> LibraryResult<Self> {
        let store = ItemStore::new(root);
        check_readable_dir(store.root()).map_err(StoreError::from)?;
        let index = ContentIndex::open(&store.index_path())?;
        Ok(Self::from_parts(store, index))
    }

    /// Opens the workspace at `root` with a throwaway in-memory index.
    pub fn open_in_memory(root: impl Into<PathBuf>) -> LibraryResult<Self> {
        let store = ItemStore::new(root);
        let index = ContentIndex::open_in_memory()?;
        Ok(Self::from_parts(store, index))
    }

    fn from_parts(store: ItemStore, index: ContentIndex) -> Self {
        Self {
            store,
            index,
            extractor: Box::new(DefaultExtractor),
        }
    }

    /// Replaces the text extractor used for drawings and attachments.
    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn index(&self) -> &ContentIndex {
        &self.index
    }

    pub fn read(&self) -> ReadPath<'_> {
        ReadPath::new(&self.index, &self.store, self.extractor.as_ref())
    }

    pub fn graph(&self) -> LinkGraphEngine<'_> {
        LinkGraphEngine::new(&self.index, &self.store)
    }

    pub fn categories(&self) -> CategoryPathManager<'_> {
        CategoryPathManager::new(&self.index, &self.store, self.extractor.as_ref())
    }

    // ===========================================
    // Scanning
    // ===========================================

    pub fn scan<P: ProgressReporter>(
        &self,
        options: ScanOptions,
        progress: &mut P,
    ) -> LibraryResult<ScanReport> {
        let reindexer = Reindexer::new(&self.store, self.extractor.as_ref())
            .with_last_scan_time(options.last_scan_time)
            .with_cancel_flag(options.cancel);
        let report = if options.full {
            reindexer.rebuild_with_progress(&self.index, progress)?
        } else {
            reindexer.full_scan_with_progress(&self.index, progress)?
        };
        Ok(report)
    }

    // ===========================================
    // Projects
    // ===========================================

    /// Creates a project with a generated id and no categories.
    pub fn create_project(&self, title: &str) -> LibraryResult<Project> {
        let project = Project::new(ProjectId::generate(), title);
        self.store.create_project(&project)?;
        self.index.upsert_project(&project)?;
        Ok(project)
    }

    /// Writes changed metadata of an existing project. The id must not change.
    pub fn update_project(&self, project: &Project) -> LibraryResult<()> {
        self.store.update_project(&project.id, project)?;
        self.index.upsert_project(project)?;
        Ok(())
    }

    /// Changes a project's id, cascading to note ids and links.
    pub fn rename_project(
        &self,
        old: &ProjectId,
        new: &ProjectId,
    ) -> LibraryResult<Option<IdChange<ProjectId>>> {
        let notes = self.store.list_notes(old)?;
        let mut project = self.store.read_project(old)?;
        project.id = new.clone();
        project.touch();

        let Some(change) = self.store.update_project(old, &project)? else {
            return Ok(None);
        };
        self.index
            .rename_project_rows(change.old.as_str(), change.new.as_str())?;
        self.index.upsert_project(&project)?;

        let mut touched = self
            .store
            .rewrite_links(change.old.as_str(), change.new.as_str())?;
        for note in &notes {
            let moved = note.id().with_project(new);
            touched.extend(
                self.store
                    .rewrite_links(&note.id().to_string(), &moved.to_string())?,
            );
        }
        touched.sort();
        touched.dedup();
        self.reindex_notes(&touched)?;
        Ok(Some(change))
    }

    pub fn delete_project(&self, id: &ProjectId) -> LibraryResult<()> {
        self.store.delete_project(id)?;
        self.index.delete_project_rows(id.as_str())?;
        Ok(())
    }

    // ===========================================
    // Notes
    // ===========================================

    pub fn create_note(
        &self,
        project: &ProjectId,
        kind: NoteKind,
        folder: Option<&str>,
    ) -> LibraryResult<NoteId> {
        let id = self.store.create_note(project, kind, folder)?;
        self.reindex_notes(std::slice::from_ref(&id))?;
        Ok(id)
    }

    /// Writes a note's text and refreshes its index row and links.
    pub fn save_note(&self, id: &NoteId, content: &str) -> LibraryResult<()> {
        self.store.write_note(id, content)?;
        self.reindex_notes(std::slice::from_ref(id))?;
        Ok(())
    }

    /// Renames a note and rewrites every link that pointed at it.
    pub fn rename_note(&self, id: &NoteId, stem: &str) -> LibraryResult<IdChange<NoteId>> {
        let change = self.store.rename_note(id, stem)?;
        if change.old == change.new {
            return Ok(change);
        }
        let (old, new) = (change.old.to_string(), change.new.to_string());
        self.index.rename_note_rows(&old, &new)?;
        let touched = self.store.rewrite_links(&old, &new)?;
        self.reindex_notes(&touched)?;
        debug!(old = %old, new = %new, rewritten = touched.len(), "renamed note");
        Ok(change)
    }

    pub fn delete_note(&self, id: &NoteId) -> LibraryResult<()> {
        self.store.delete_note(id)?;
        self.index.delete_note_rows(&id.to_string())?;
        Ok(())
    }

    // ===========================================
    // Folders
    // ===========================================

    pub fn create_folder(
        &self,
        project: &ProjectId,
        parent: Option<&str>,
    ) -> LibraryResult<NoteId> {
        Ok(self.store.create_folder(project, parent)?)
    }

    /// Renames a folder, moving the index rows of every file below it and
    /// rewriting links that pointed at those files.
    pub fn rename_folder(&self, folder: &NoteId, name: &str) -> LibraryResult<FolderChange> {
        let change = self.store.rename_folder(folder, name)?;
        let mut touched = Vec::new();
        for file in &change.files {
            let (old, new) = (file.old.to_string(), file.new.to_string());
            self.index.rename_note_rows(&old, &new)?;
            touched.extend(self.store.rewrite_links(&old, &new)?);
        }
        touched.sort();
        touched.dedup();
        self.reindex_notes(&touched)?;
        debug!(
            old = %change.folder.old,
            new = %change.folder.new,
            files = change.files.len(),
            rewritten = touched.len(),
            "renamed folder"
        );
        Ok(change)
    }

    /// Deletes a folder and drops the index rows of every file below it.
    pub fn delete_folder(&self, folder: &NoteId) -> LibraryResult<Vec<NoteId>> {
        let removed = self.store.delete_folder(folder)?;
        for id in &removed {
            let id = id.to_string();
            self.index.delete_note_rows(&id)?;
            self.index.delete_attachment_rows(&id)?;
        }
        Ok(removed)
    }

    /// Re-reads notes from the store into the index.
    fn reindex_notes(&self, ids: &[NoteId]) -> LibraryResult<()> {
        for id in ids {
            let Some(kind) = id.extension().and_then(NoteKind::from_extension) else {
                continue;
            };
            match kind {
                NoteKind::Markdown => {
                    let content = self.store.read_note(id)?;
                    self.index.upsert_note(id, kind, &content)?;
                    self.graph().replace_forward_links(id, &content)?;
                }
                NoteKind::Drawing => {
                    let path = id.to_path(self.root());
                    let text = self.extractor.extract_drawing_text(&path).unwrap_or_else(|err| {
                        warn!(note = %id, error = %err, "cannot extract drawing text");
                        String::new()
                    });
                    self.index.upsert_note(id, kind, &text)?;
                    self.index.replace_links(&id.to_string(), &[])?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::NoopReporter;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Library) {
        let dir = TempDir::new().unwrap();
        let library = Library::open_in_memory(dir.path()).unwrap();
        (dir, library)
    }

    #[test]
    fn open_places_index_in_app_dir() {
        let dir = TempDir::new().unwrap();
        Library::open(dir.path()).unwrap();
        assert!(dir.path().join(".folio/index.db").exists());
    }

    #[test]
    fn create_project_writes_both_sides() {
        let (_dir, library) = setup();
        let project = library.create_project("Optics").unwrap();
        assert!(project.id.as_str().starts_with('P'));
        assert!(project.categories.is_empty());
        assert_eq!(library.store().read_project(&project.id).unwrap(), project);
        assert!(library.index().has_project(project.id.as_str()).unwrap());
    }

    #[test]
    fn rename_note_rewrites_links_everywhere() {
        let (_dir, library) = setup();
        let p = library.create_project("P").unwrap();
        let target = library.create_note(&p.id, NoteKind::Markdown, None).unwrap();
        let source = NoteId::new(&p.id, "source.md").unwrap();
        library
            .save_note(&source, &format!("see [t]({target})"))
            .unwrap();

        let change = library.rename_note(&target, "Renamed").unwrap();

        let new_id = change.new.to_string();
        assert_eq!(new_id, format!("{}/Renamed.md", p.id));
        assert_eq!(
            library.store().read_note(&source).unwrap(),
            format!("see [t]({new_id})")
        );
        assert_eq!(
            library.index().links_from(&source.to_string()).unwrap(),
            vec![new_id.clone()]
        );
        assert_eq!(
            library.index().links_to(&new_id).unwrap(),
            vec![source.to_string()]
        );
    }

    #[test]
    fn rename_project_cascades_to_notes_and_links() {
        let (_dir, library) = setup();
        let a = library.create_project("A").unwrap();
        let b = library.create_project("B").unwrap();
        let inside = NoteId::new(&a.id, "inside.md").unwrap();
        library.save_note(&inside, "text").unwrap();
        let outside = NoteId::new(&b.id, "outside.md").unwrap();
        library
            .save_note(&outside, &format!("[p]({}) [n]({inside})", a.id))
            .unwrap();

        let new = ProjectId::new("renamed").unwrap();
        library.rename_project(&a.id, &new).unwrap().unwrap();

        assert!(library.index().has_project("renamed").unwrap());
        assert!(!library.index().has_project(a.id.as_str()).unwrap());
        assert!(library.index().has_note("renamed/inside.md").unwrap());
        assert_eq!(
            library.index().links_from(&outside.to_string()).unwrap(),
            vec!["renamed", "renamed/inside.md"]
        );
        assert_eq!(
            library.store().read_note(&outside).unwrap(),
            "[p](renamed) [n](renamed/inside.md)"
        );
    }

    #[test]
    fn delete_project_cascades() {
        let (_dir, library) = setup();
        let p = library.create_project("P").unwrap();
        let note = NoteId::new(&p.id, "n.md").unwrap();
        library.save_note(&note, "[x](elsewhere)").unwrap();

        library.delete_project(&p.id).unwrap();
        assert!(library.index().meta_ids().unwrap().is_empty());
        assert!(library.index().note_ids().unwrap().is_empty());
        assert!(library.index().links_from(&note.to_string()).unwrap().is_empty());
    }

    #[test]
    fn delete_note_removes_rows() {
        let (_dir, library) = setup();
        let p = library.create_project("P").unwrap();
        let note = library.create_note(&p.id, NoteKind::Drawing, None).unwrap();
        assert!(library.index().has_note(&note.to_string()).unwrap());
        library.delete_note(&note).unwrap();
        assert!(!library.index().has_note(&note.to_string()).unwrap());
        assert!(library.store().read_note(&note).is_err());
    }

    fn folder_with_note_and_attachment(library: &Library, project: &ProjectId) -> (NoteId, NoteId) {
        let inner = NoteId::new(project, "drafts/inner.md").unwrap();
        library.save_note(&inner, "[back](elsewhere)").unwrap();
        let paper = NoteId::new(project, "drafts/paper.pdf").unwrap();
        std::fs::write(paper.to_path(library.root()), b"%PDF").unwrap();
        library
            .index()
            .upsert_attachment_pages(&paper, &["page text".to_string()])
            .unwrap();
        (inner, paper)
    }

    #[test]
    fn rename_folder_moves_rows_and_rewrites_links() {
        let (_dir, library) = setup();
        let p = library.create_project("P").unwrap();
        let (inner, paper) = folder_with_note_and_attachment(&library, &p.id);
        let source = NoteId::new(&p.id, "source.md").unwrap();
        library.save_note(&source, &format!("see [i]({inner})")).unwrap();

        let forward = library.index().links_from(&inner.to_string()).unwrap();
        assert_eq!(forward.len(), 1);

        let folder = NoteId::new(&p.id, "drafts").unwrap();
        let change = library.rename_folder(&folder, "final").unwrap();

        let new_inner = format!("{}/final/inner.md", p.id);
        let new_paper = format!("{}/final/paper.pdf", p.id);
        assert_eq!(change.folder.new.to_string(), format!("{}/final", p.id));
        assert_eq!(change.files.len(), 2);
        assert!(library.index().has_note(&new_inner).unwrap());
        assert!(!library.index().has_note(&inner.to_string()).unwrap());
        assert!(library.index().has_attachment(&new_paper).unwrap());
        assert!(!library.index().has_attachment(&paper.to_string()).unwrap());
        assert_eq!(library.index().links_from(&new_inner).unwrap(), forward);
        assert_eq!(
            library.store().read_note(&source).unwrap(),
            format!("see [i]({new_inner})")
        );
        assert_eq!(
            library.index().links_to(&new_inner).unwrap(),
            vec![source.to_string()]
        );
    }

    #[test]
    fn delete_folder_removes_rows_of_contained_files() {
        let (_dir, library) = setup();
        let p = library.create_project("P").unwrap();
        let (inner, paper) = folder_with_note_and_attachment(&library, &p.id);

        let folder = NoteId::new(&p.id, "drafts").unwrap();
        let removed = library.delete_folder(&folder).unwrap();

        assert_eq!(removed, vec![inner.clone(), paper.clone()]);
        assert!(!folder.to_path(library.root()).exists());
        assert!(!library.index().has_note(&inner.to_string()).unwrap());
        assert!(!library.index().has_attachment(&paper.to_string()).unwrap());
        assert!(library.index().links_from(&inner.to_string()).unwrap().is_empty());
    }

    #[test]
    fn scan_options_full_rebuilds() {
        let (_dir, library) = setup();
        library.create_project("P").unwrap();
        library
            .index()
            .replace_links("ghost/n.md", &["x".into()])
            .unwrap();
        let report = library
            .scan(
                ScanOptions {
                    full: true,
                    ..Default::default()
                },
                &mut NoopReporter,
            )
            .unwrap();
        assert_eq!(report.processed, 1);
        assert!(library.index().links_from("ghost/n.md").unwrap().is_empty());
    }
}
