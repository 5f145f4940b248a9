//! Read queries that prefer the index and fall back to the store.
//!
//! Every query first asks the content index. When that answer is empty and
//! the index cannot be trusted (no completed scan, or no projects although
//! the store has some), the same answer is computed by walking the store.
//! Both paths produce identical, deterministically ordered results.

use crate::domain::{
    Annotation, Note, NoteId, NoteKind, NoteTreeEntry, Project, ProjectId, extract_link_targets,
};
use crate::extract::TextExtractor;
use crate::graph::{GraphError, LinkGraphEngine};
use crate::index::{
    ContentIndex, IndexError, IndexedAnnotation, IndexedProject, SearchHit, snippet, text_matches,
};
use crate::infra::path_exists;
use crate::store::{ItemStore, StoreError};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Virtual category listing every project.
pub const VIEW_LIBRARY: &str = "library";
/// Virtual category listing favorite projects.
pub const VIEW_FAVORITES: &str = "favorites";
/// Virtual category listing projects added in the last 30 days, newest first.
pub const VIEW_ADDED: &str = "added";

const RECENT_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type ReadResult<T> = Result<T, ReadError>;

// ===========================================
// Result Types
// ===========================================

/// A project as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub timestamp_added: i64,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.to_string(),
            title: project.title.clone(),
            kind: project.kind.clone().filter(|k| !k.is_empty()),
            year: project.year(),
            authors: project.author.iter().map(|a| a.display_name()).collect(),
            categories: project.categories.clone(),
            tags: project.tags.clone(),
            favorite: project.favorite,
            timestamp_added: project.timestamp_added,
        }
    }
}

impl From<IndexedProject> for ProjectSummary {
    fn from(project: IndexedProject) -> Self {
        Self {
            id: project.id,
            title: project.title,
            kind: project.kind,
            year: project.year,
            authors: project.authors.iter().map(|a| a.display_name()).collect(),
            categories: project.categories,
            tags: project.tags,
            favorite: project.favorite,
            timestamp_added: project.timestamp_added,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationSummary {
    pub id: String,
    pub project_id: String,
    pub kind: String,
    pub page_number: u32,
    pub content: String,
    pub color: String,
}

impl From<&Annotation> for AnnotationSummary {
    fn from(a: &Annotation) -> Self {
        Self {
            id: a.id.clone(),
            project_id: a.project_id.to_string(),
            kind: a.kind.as_str().to_string(),
            page_number: a.page_number,
            content: a.content.clone(),
            color: a.color.clone(),
        }
    }
}

impl From<IndexedAnnotation> for AnnotationSummary {
    fn from(a: IndexedAnnotation) -> Self {
        Self {
            id: a.id,
            project_id: a.project_id,
            kind: a.kind,
            page_number: a.page_number,
            content: a.content,
            color: a.color,
        }
    }
}

/// A disagreement between the index and the store. A rescan fixes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyWarning {
    IndexNotReady,
    MissingProject { id: String },
    ExtraProject { id: String },
    CategoryMismatch {
        id: String,
        store: Vec<String>,
        index: Vec<String>,
    },
    MissingNote { id: String },
    ExtraNote { id: String },
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyWarning::IndexNotReady => write!(f, "index has never completed a scan"),
            ConsistencyWarning::MissingProject { id } => {
                write!(f, "project {id} is not in the index")
            }
            ConsistencyWarning::ExtraProject { id } => {
                write!(f, "project {id} is indexed but not on disk")
            }
            ConsistencyWarning::CategoryMismatch { id, store, index } => write!(
                f,
                "categories of {id} differ: store [{}], index [{}]",
                store.join(", "),
                index.join(", ")
            ),
            ConsistencyWarning::MissingNote { id } => write!(f, "note {id} is not in the index"),
            ConsistencyWarning::ExtraNote { id } => {
                write!(f, "note {id} is indexed but not on disk")
            }
        }
    }
}

// ===========================================
// ReadPath
// ===========================================

pub struct ReadPath<'a> {
    index: &'a ContentIndex,
    store: &'a ItemStore,
    extractor: &'a dyn TextExtractor,
}

impl<'a> ReadPath<'a> {
    pub fn new(
        index: &'a ContentIndex,
        store: &'a ItemStore,
        extractor: &'a dyn TextExtractor,
    ) -> Self {
        Self {
            index,
            store,
            extractor,
        }
    }

    /// Decides whether an empty index answer must be recomputed from the store.
    fn needs_fallback(&self, index_empty: bool) -> ReadResult<bool> {
        if !index_empty {
            return Ok(false);
        }
        if !self.index.is_ready()? {
            debug!("index not ready, reading from store");
            return Ok(true);
        }
        if self.index.meta_ids()?.is_empty() && !self.store.list_project_ids()?.is_empty() {
            warn!("index holds no projects but the store does, reading from store");
            return Ok(true);
        }
        Ok(false)
    }

    // ===========================================
    // Categories and Projects
    // ===========================================

    /// Distinct category paths across all projects, sorted.
    pub fn categories(&self) -> ReadResult<Vec<String>> {
        let categories = self.index.distinct_categories()?;
        if !self.needs_fallback(categories.is_empty())? {
            return Ok(categories);
        }
        let set: BTreeSet<String> = self
            .store
            .list_projects()?
            .into_iter()
            .flat_map(|p| p.categories)
            .collect();
        Ok(set.into_iter().collect())
    }

    /// Every project, sorted by id.
    pub fn all_projects(&self) -> ReadResult<Vec<ProjectSummary>> {
        let projects = self.index.all_projects()?;
        if !self.needs_fallback(projects.is_empty())? {
            return Ok(projects.into_iter().map(ProjectSummary::from).collect());
        }
        Ok(self
            .store
            .list_projects()?
            .iter()
            .map(ProjectSummary::from)
            .collect())
    }

    /// Projects of a category or of one of the virtual views.
    ///
    /// `library`, `favorites` and `added` are resolved before literal
    /// category membership. Literal matches are sorted by id.
    pub fn projects_in_category(&self, category: &str) -> ReadResult<Vec<ProjectSummary>> {
        match category {
            VIEW_LIBRARY => self.all_projects(),
            VIEW_FAVORITES => Ok(self
                .all_projects()?
                .into_iter()
                .filter(|p| p.favorite)
                .collect()),
            VIEW_ADDED => {
                let since = (Utc::now() - Duration::days(RECENT_DAYS)).timestamp_millis();
                let mut recent: Vec<ProjectSummary> = self
                    .all_projects()?
                    .into_iter()
                    .filter(|p| p.timestamp_added >= since)
                    .collect();
                recent.sort_by(|a, b| {
                    b.timestamp_added
                        .cmp(&a.timestamp_added)
                        .then_with(|| a.id.cmp(&b.id))
                });
                Ok(recent)
            }
            literal => {
                let ids = self.index.project_ids_in_category(literal)?;
                if !self.needs_fallback(ids.is_empty())? {
                    let mut projects = Vec::with_capacity(ids.len());
                    for id in ids {
                        if let Some(project) = self.index.get_project(&id)? {
                            projects.push(ProjectSummary::from(project));
                        }
                    }
                    return Ok(projects);
                }
                Ok(self
                    .store
                    .list_projects()?
                    .iter()
                    .filter(|p| p.categories.iter().any(|c| c == literal))
                    .map(ProjectSummary::from)
                    .collect())
            }
        }
    }

    pub fn get_project(&self, id: &str) -> ReadResult<Option<ProjectSummary>> {
        let project = self.index.get_project(id)?;
        if !self.needs_fallback(project.is_none())? {
            return Ok(project.map(ProjectSummary::from));
        }
        let Ok(pid) = ProjectId::new(id) else {
            return Ok(None);
        };
        match self.store.read_project(&pid) {
            Ok(project) => Ok(Some(ProjectSummary::from(&project))),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    // ===========================================
    // Notes and Annotations
    // ===========================================

    /// Notes of a project, sorted by id.
    pub fn notes_of_project(&self, project: &str) -> ReadResult<Vec<Note>> {
        let rows = self.index.notes_of_project(project)?;
        if !self.needs_fallback(rows.is_empty())? {
            return Ok(rows
                .into_iter()
                .filter_map(|row| {
                    let id: NoteId = row.id.parse().ok()?;
                    let kind: NoteKind = row.kind.parse().ok()?;
                    Some(Note::new(id, kind))
                })
                .collect());
        }
        let Ok(pid) = ProjectId::new(project) else {
            return Ok(Vec::new());
        };
        match self.store.list_notes(&pid) {
            Ok(notes) => Ok(notes),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Folder tree of a project. Folders are not indexed, so this always
    /// reads the store.
    pub fn note_tree(&self, project: &str) -> ReadResult<Vec<NoteTreeEntry>> {
        let Ok(pid) = ProjectId::new(project) else {
            return Ok(Vec::new());
        };
        match self.store.note_tree(&pid) {
            Ok(tree) => Ok(tree),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Annotations of a project, sorted by id.
    pub fn annotations_of_project(&self, project: &str) -> ReadResult<Vec<AnnotationSummary>> {
        let rows = self.index.annotations_of_project(project)?;
        if !self.needs_fallback(rows.is_empty())? {
            return Ok(rows.into_iter().map(AnnotationSummary::from).collect());
        }
        let Ok(pid) = ProjectId::new(project) else {
            return Ok(Vec::new());
        };
        Ok(self
            .live_annotations()?
            .iter()
            .filter(|a| a.project_id == pid)
            .map(AnnotationSummary::from)
            .collect())
    }

    /// Annotations whose project folder still exists.
    fn live_annotations(&self) -> ReadResult<Vec<Annotation>> {
        let root = self.store.root();
        Ok(self
            .store
            .list_annotations(None)?
            .into_iter()
            .filter(|a| path_exists(&a.project_id.self_note_path(root)).unwrap_or(true))
            .collect())
    }

    // ===========================================
    // Links
    // ===========================================

    /// Link targets of a note, or of every note of a project (sorted).
    pub fn forward_links(&self, item: &str) -> ReadResult<Vec<String>> {
        let targets = LinkGraphEngine::new(self.index, self.store).forward_links(item)?;
        if !self.needs_fallback(targets.is_empty())? {
            return Ok(targets);
        }
        if let Ok(project) = ProjectId::new(item) {
            let mut targets = Vec::new();
            for note in self.store.list_notes(&project).unwrap_or_default() {
                targets.extend(self.note_links(&note)?);
            }
            targets.sort();
            targets.dedup();
            return Ok(targets);
        }
        match item.parse::<NoteId>().ok().and_then(Note::from_id) {
            Some(note) => self.note_links(&note),
            None => Ok(Vec::new()),
        }
    }

    /// Notes linking to `item`, sorted.
    pub fn backlinks(&self, item: &str) -> ReadResult<Vec<String>> {
        let sources = self.index.links_to(item)?;
        if !self.needs_fallback(sources.is_empty())? {
            return Ok(sources);
        }
        let mut sources = Vec::new();
        for note in self.store.list_all_notes()? {
            if self.note_links(&note)?.iter().any(|t| t == item) {
                sources.push(note.id().to_string());
            }
        }
        sources.sort();
        Ok(sources)
    }

    fn note_links(&self, note: &Note) -> ReadResult<Vec<String>> {
        if note.kind() != NoteKind::Markdown {
            return Ok(Vec::new());
        }
        match self.store.read_note(note.id()) {
            Ok(content) => Ok(extract_link_targets(&content)),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    // ===========================================
    // Search
    // ===========================================

    /// Case-insensitive substring search, sorted by item id then page.
    pub fn search(&self, query: &str) -> ReadResult<Vec<SearchHit>> {
        let hits = self.index.search(query)?;
        if !self.needs_fallback(hits.is_empty())? {
            return Ok(hits);
        }

        let mut hits = Vec::new();
        let root = self.store.root();
        for project in self.store.list_projects()? {
            let abstract_text = project.abstract_text.clone().unwrap_or_default();
            let source = if text_matches(&project.title, query) {
                Some(&project.title)
            } else if text_matches(&abstract_text, query) {
                Some(&abstract_text)
            } else {
                None
            };
            if let Some(source) = source {
                hits.push(SearchHit {
                    item_id: project.id.to_string(),
                    page: None,
                    snippet: snippet(source, query),
                });
            }

            for note in self.store.list_notes(&project.id)? {
                let text = match note.kind() {
                    NoteKind::Markdown => self.store.read_note(note.id()).ok(),
                    NoteKind::Drawing => self
                        .extractor
                        .extract_drawing_text(&note.path(root))
                        .ok(),
                };
                if let Some(text) = text.filter(|t| text_matches(t, query)) {
                    hits.push(SearchHit {
                        item_id: note.id().to_string(),
                        page: None,
                        snippet: snippet(&text, query),
                    });
                }
            }

            for attachment in self.store.list_attachments(&project.id)? {
                let Ok(pages) = self.extractor.extract_pages(&attachment.to_path(root)) else {
                    continue;
                };
                for (i, text) in pages.iter().enumerate() {
                    if text_matches(text, query) {
                        hits.push(SearchHit {
                            item_id: attachment.to_string(),
                            page: Some(i as u32 + 1),
                            snippet: snippet(text, query),
                        });
                    }
                }
            }
        }

        for annotation in self.live_annotations()? {
            if text_matches(&annotation.content, query) {
                hits.push(SearchHit {
                    item_id: annotation.id.clone(),
                    page: None,
                    snippet: snippet(&annotation.content, query),
                });
            }
        }

        hits.sort();
        Ok(hits)
    }

    // ===========================================
    // Consistency
    // ===========================================

    /// Compares the index against the store.
    ///
    /// Disagreements are returned as warnings rather than errors; a rescan
    /// resolves them.
    pub fn check_consistency(&self) -> ReadResult<Vec<ConsistencyWarning>> {
        let mut warnings = Vec::new();
        if !self.index.is_ready()? {
            warnings.push(ConsistencyWarning::IndexNotReady);
        }

        let projects = self.store.list_projects()?;
        let stored: BTreeSet<String> = projects.iter().map(|p| p.id.to_string()).collect();
        let indexed: BTreeSet<String> = self.index.meta_ids()?.into_iter().collect();

        for id in stored.difference(&indexed) {
            warnings.push(ConsistencyWarning::MissingProject { id: id.clone() });
        }
        for id in indexed.difference(&stored) {
            warnings.push(ConsistencyWarning::ExtraProject { id: id.clone() });
        }
        for project in &projects {
            let id = project.id.as_str();
            if !indexed.contains(id) {
                continue;
            }
            let index_categories = self.index.project_categories(id)?;
            if index_categories != project.categories {
                warnings.push(ConsistencyWarning::CategoryMismatch {
                    id: id.to_string(),
                    store: project.categories.clone(),
                    index: index_categories,
                });
            }
        }

        let stored_notes: BTreeSet<String> = self
            .store
            .list_all_notes()?
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        let indexed_notes: BTreeSet<String> = self.index.note_ids()?.into_iter().collect();
        for id in stored_notes.difference(&indexed_notes) {
            warnings.push(ConsistencyWarning::MissingNote { id: id.clone() });
        }
        for id in indexed_notes.difference(&stored_notes) {
            warnings.push(ConsistencyWarning::ExtraNote { id: id.clone() });
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnotationKind, Author};
    use crate::extract::DefaultExtractor;
    use crate::index::Reindexer;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn pid(s: &str) -> ProjectId {
        ProjectId::new(s).unwrap()
    }

    fn fixture() -> (TempDir, ItemStore) {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path());

        let mut p1 = Project::new(pid("p1"), "Laser Optics");
        p1.author.push(Author::new("Ada", "Smith"));
        p1.categories = vec!["physics".into(), "physics/optics".into()];
        p1.favorite = true;
        p1.abstract_text = Some("Coherent light sources.".into());
        store.create_project(&p1).unwrap();

        let mut p2 = Project::new(pid("p2"), "Old Paper");
        p2.categories = vec!["physics".into()];
        p2.timestamp_added = 0;
        store.create_project(&p2).unwrap();

        store
            .write_note(&"p1/notes.md".parse().unwrap(), "laser [see](p2) and [x](p1/b.md)")
            .unwrap();
        store
            .write_note(&"p1/b.md".parse().unwrap(), "back to [n](p1/notes.md)")
            .unwrap();
        store
            .write_note(
                &"p2/d.excalidraw".parse().unwrap(),
                r#"{"elements":[{"type":"text","text":"laser sketch"}]}"#,
            )
            .unwrap();

        let mut annotation = Annotation::new(pid("p1"), 2, AnnotationKind::Highlight);
        annotation.id = "SA1".into();
        annotation.content = "laser threshold".into();
        store.put_annotation(&annotation).unwrap();

        (dir, store)
    }

    /// Runs every query and renders the answers for comparison.
    fn answers(read: &ReadPath) -> Vec<String> {
        vec![
            format!("{:?}", read.categories().unwrap()),
            format!("{:?}", read.all_projects().unwrap()),
            format!("{:?}", read.projects_in_category("physics").unwrap()),
            format!("{:?}", read.projects_in_category("physics/optics").unwrap()),
            format!("{:?}", read.projects_in_category(VIEW_FAVORITES).unwrap()),
            format!("{:?}", read.projects_in_category(VIEW_ADDED).unwrap()),
            format!("{:?}", read.get_project("p1").unwrap()),
            format!("{:?}", read.notes_of_project("p1").unwrap()),
            format!("{:?}", read.notes_of_project("p2").unwrap()),
            format!("{:?}", read.annotations_of_project("p1").unwrap()),
            format!("{:?}", read.forward_links("p1/notes.md").unwrap()),
            format!("{:?}", read.forward_links("p1").unwrap()),
            format!("{:?}", read.backlinks("p1/notes.md").unwrap()),
            format!("{:?}", read.search("LASER").unwrap()),
        ]
    }

    #[test]
    fn fallback_matches_completed_index() {
        let (_dir, store) = fixture();
        let index = ContentIndex::open_in_memory().unwrap();
        let read = ReadPath::new(&index, &store, &DefaultExtractor);
        let before = answers(&read);

        Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();
        let after = answers(&read);

        assert_eq!(before, after);
        assert!(read.check_consistency().unwrap().is_empty());
    }

    #[test]
    fn note_tree_reads_folders_from_store() {
        let (dir, store) = fixture();
        std::fs::create_dir_all(dir.path().join("p2/empty")).unwrap();
        let index = ContentIndex::open_in_memory().unwrap();
        let read = ReadPath::new(&index, &store, &DefaultExtractor);

        let labels: Vec<String> = read
            .note_tree("p2")
            .unwrap()
            .iter()
            .map(|e| e.label().to_string())
            .collect();
        assert_eq!(labels, vec!["empty", "d.excalidraw"]);
        assert!(read.note_tree("missing").unwrap().is_empty());
        assert!(read.note_tree("a/b").unwrap().is_empty());
    }

    #[test]
    fn special_views() {
        let (_dir, store) = fixture();
        let index = ContentIndex::open_in_memory().unwrap();
        let read = ReadPath::new(&index, &store, &DefaultExtractor);

        let ids = |name: &str| -> Vec<String> {
            read.projects_in_category(name)
                .unwrap()
                .into_iter()
                .map(|p| p.id)
                .collect()
        };
        assert_eq!(ids(VIEW_LIBRARY), vec!["p1", "p2"]);
        assert_eq!(ids(VIEW_FAVORITES), vec!["p1"]);
        assert_eq!(ids(VIEW_ADDED), vec!["p1"]);
    }

    #[test]
    fn consistency_reports_drift() {
        let (_dir, store) = fixture();
        let index = ContentIndex::open_in_memory().unwrap();
        Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();
        index.replace_categories(&pid("p2"), &["chemistry".into()]).unwrap();
        index.delete_project_rows("p1").unwrap();

        let read = ReadPath::new(&index, &store, &DefaultExtractor);
        let warnings = read.check_consistency().unwrap();
        assert!(warnings.contains(&ConsistencyWarning::MissingProject { id: "p1".into() }));
        assert!(warnings.contains(&ConsistencyWarning::CategoryMismatch {
            id: "p2".into(),
            store: vec!["physics".into()],
            index: vec!["chemistry".into()],
        }));
    }

    #[test]
    fn ready_index_is_trusted_when_empty() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path());
        let index = ContentIndex::open_in_memory().unwrap();
        Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();

        let read = ReadPath::new(&index, &store, &DefaultExtractor);
        assert!(read.categories().unwrap().is_empty());
        assert!(read.check_consistency().unwrap().is_empty());
    }
}
