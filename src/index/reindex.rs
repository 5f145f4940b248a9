//! Reconciles the content index with the item store.

use crate::domain::{NoteId, NoteKind, ProjectId};
use crate::extract::{ExtractError, TextExtractor};
use crate::graph::{GraphError, LinkGraphEngine};
use crate::index::{ContentIndex, IndexError, IndexResult};
use crate::infra::{
    FsError, WalkedFile, check_readable_dir, modified_time, path_exists, read_text, walk_files,
};
use crate::store::{APP_DIR, ItemStore, StoreError, parse_annotation, project_from_note};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

// ===========================================
// Error Types
// ===========================================

/// Errors that abort a scan. The previous index state is left untouched.
#[derive(Debug, Error)]
pub enum ReindexError {
    #[error("cannot read storage root: {0}")]
    Root(#[source] FsError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A per-file failure. The file is skipped and the scan continues.
#[derive(Debug)]
pub enum ScanError {
    /// Malformed metadata, annotation JSON or drawing.
    Parse { path: PathBuf, message: String },
    /// The file could not be read.
    Io { path: PathBuf, message: String },
    /// The injected extractor failed.
    Extract { path: PathBuf, message: String },
}

impl ScanError {
    pub fn path(&self) -> &Path {
        match self {
            ScanError::Parse { path, .. } => path,
            ScanError::Io { path, .. } => path,
            ScanError::Extract { path, .. } => path,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ScanError::Parse { message, .. } => message,
            ScanError::Io { message, .. } => message,
            ScanError::Extract { message, .. } => message,
        }
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path().display(), self.message())
    }
}

impl std::error::Error for ScanError {}

// ===========================================
// Result Types
// ===========================================

/// Outcome of one scan.
#[derive(Debug)]
pub struct ScanReport {
    /// Files read and written to the index.
    pub processed: usize,
    /// Files unchanged since the mark, or gone before they could be read.
    pub skipped: usize,
    /// Index entries removed because their backing file is gone.
    pub pruned: usize,
    pub errors: Vec<ScanError>,
    /// True if the scan stopped early; nothing was pruned.
    pub cancelled: bool,
    pub scan_started: DateTime<Utc>,
    /// The mark to persist for the next scan.
    pub last_scan_time: Option<DateTime<Utc>>,
}

// ===========================================
// Progress Reporting
// ===========================================

/// Result of processing a single file.
#[derive(Debug, Clone)]
pub enum FileResult {
    Indexed,
    Skipped,
    Error(String),
}

/// Receives progress updates during a scan.
pub trait ProgressReporter {
    /// Called after each file. `path` is relative to the storage root.
    fn on_file(&mut self, path: &Path, result: FileResult);
    /// Called when the scan is complete.
    fn on_complete(&mut self, processed: usize, errors: usize);
}

#[derive(Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_file(&mut self, _path: &Path, _result: FileResult) {}
    fn on_complete(&mut self, _processed: usize, _errors: usize) {}
}

/// Cooperative cancellation, checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ===========================================
// Reindexer
// ===========================================

/// What a walked file stands for.
enum Entry {
    Project(ProjectId),
    Note(NoteId, NoteKind),
    Attachment(NoteId),
    Annotation(String),
}

enum Outcome {
    Indexed,
    Skipped,
    Failed(ScanError),
}

/// Walks the storage root and brings the index up to date.
///
/// A file is read only when it changed after `last_scan_time` or when the
/// index does not hold it yet. After walking, rows whose backing file or
/// folder is gone are pruned and the index is marked ready.
pub struct Reindexer<'a> {
    store: &'a ItemStore,
    extractor: &'a dyn TextExtractor,
    last_scan_time: Option<DateTime<Utc>>,
    cancel: CancelFlag,
}

impl<'a> Reindexer<'a> {
    pub fn new(store: &'a ItemStore, extractor: &'a dyn TextExtractor) -> Self {
        Self {
            store,
            extractor,
            last_scan_time: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Sets the high-water mark of the previous scan.
    pub fn with_last_scan_time(mut self, mark: Option<DateTime<Utc>>) -> Self {
        self.last_scan_time = mark;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Scans the storage root.
    ///
    /// # Errors
    ///
    /// Returns `ReindexError::Root` if the storage root cannot be read, and
    /// `ReindexError::Index` if a database write fails. Per-file problems are
    /// collected in the report instead.
    pub fn full_scan(&self, index: &ContentIndex) -> Result<ScanReport, ReindexError> {
        self.full_scan_with_progress(index, &mut NoopReporter)
    }

    pub fn full_scan_with_progress<P: ProgressReporter>(
        &self,
        index: &ContentIndex,
        progress: &mut P,
    ) -> Result<ScanReport, ReindexError> {
        self.scan(index, self.last_scan_time, progress)
    }

    /// Clears every table and scans from scratch.
    pub fn rebuild_with_progress<P: ProgressReporter>(
        &self,
        index: &ContentIndex,
        progress: &mut P,
    ) -> Result<ScanReport, ReindexError> {
        let root = self.store.root();
        check_readable_dir(root).map_err(ReindexError::Root)?;
        index.clear()?;
        self.scan(index, None, progress)
    }

    pub fn rebuild(&self, index: &ContentIndex) -> Result<ScanReport, ReindexError> {
        self.rebuild_with_progress(index, &mut NoopReporter)
    }

    fn scan<P: ProgressReporter>(
        &self,
        index: &ContentIndex,
        mark: Option<DateTime<Utc>>,
        progress: &mut P,
    ) -> Result<ScanReport, ReindexError> {
        let root = self.store.root();
        check_readable_dir(root).map_err(ReindexError::Root)?;

        let scan_started = Utc::now();
        let mut report = ScanReport {
            processed: 0,
            skipped: 0,
            pruned: 0,
            errors: Vec::new(),
            cancelled: false,
            scan_started,
            last_scan_time: mark,
        };

        let mut files: Vec<WalkedFile> = walk_files(root).map_err(ReindexError::Root)?.collect();
        let annotations_dir = self.store.annotations_dir();
        if path_exists(&annotations_dir).unwrap_or(false) {
            files.extend(walk_files(&annotations_dir).map_err(ReindexError::Root)?.map(
                |file| WalkedFile {
                    relative: format!("{APP_DIR}/annotations/{}", file.relative),
                    path: file.path,
                },
            ));
        }
        debug!(files = files.len(), mark = ?mark, "scanning storage root");

        let mut project_dirs = HashMap::new();
        for file in &files {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let Some(entry) = self.classify(file, &mut project_dirs) else {
                continue;
            };
            let relative = Path::new(&file.relative);
            match self.visit(index, file, &entry, mark)? {
                Outcome::Indexed => {
                    report.processed += 1;
                    progress.on_file(relative, FileResult::Indexed);
                }
                Outcome::Skipped => {
                    report.skipped += 1;
                    progress.on_file(relative, FileResult::Skipped);
                }
                Outcome::Failed(err) => {
                    warn!(error = %err, "skipping file");
                    progress.on_file(relative, FileResult::Error(err.message().to_string()));
                    report.errors.push(err);
                }
            }
        }

        if report.cancelled {
            info!(processed = report.processed, "scan cancelled");
        } else {
            report.pruned = self.prune_dangling(index)?;
            index.set_ready(true)?;
            report.last_scan_time = Some(scan_started);
            info!(
                processed = report.processed,
                skipped = report.skipped,
                pruned = report.pruned,
                errors = report.errors.len(),
                "scan complete"
            );
        }

        progress.on_complete(report.processed, report.errors.len());
        Ok(report)
    }

    /// Maps a walked file to what it stands for.
    ///
    /// Files in a folder without a self note belong to no project and are
    /// ignored. `project_dirs` caches that check per folder.
    fn classify(
        &self,
        file: &WalkedFile,
        project_dirs: &mut HashMap<ProjectId, bool>,
    ) -> Option<Entry> {
        if file.relative.starts_with(APP_DIR) {
            let stem = file.relative.rsplit('/').next()?.strip_suffix(".json")?;
            return Some(Entry::Annotation(stem.to_string()));
        }
        let (folder, relative) = file.relative.split_once('/')?;
        let project = ProjectId::new(folder).ok()?;
        let id = NoteId::new(&project, relative).ok()?;
        if id.is_self_note() {
            return Some(Entry::Project(project));
        }
        let root = self.store.root();
        let is_project = *project_dirs.entry(project).or_insert_with_key(|pid| {
            let found = path_exists(&pid.self_note_path(root)).unwrap_or(false);
            if !found {
                debug!(folder = %pid, "no project note, ignoring folder");
            }
            found
        });
        if !is_project {
            return None;
        }
        let ext = id.extension()?.to_ascii_lowercase();
        if ext == "pdf" {
            return Some(Entry::Attachment(id));
        }
        let kind = NoteKind::from_extension(&ext)?;
        Some(Entry::Note(id, kind))
    }

    fn is_represented(&self, index: &ContentIndex, entry: &Entry) -> IndexResult<bool> {
        match entry {
            Entry::Project(id) => index.has_project(id.as_str()),
            Entry::Note(id, _) => index.has_note(&id.to_string()),
            Entry::Attachment(id) => index.has_attachment(&id.to_string()),
            Entry::Annotation(id) => index.has_annotation(id),
        }
    }

    fn visit(
        &self,
        index: &ContentIndex,
        file: &WalkedFile,
        entry: &Entry,
        mark: Option<DateTime<Utc>>,
    ) -> Result<Outcome, ReindexError> {
        let modified = match modified_time(&file.path) {
            Ok(time) => time,
            Err(err) => return Ok(vanished_or_failed(&file.path, err)),
        };
        let changed = mark.is_none_or(|mark| modified > mark);
        if !changed && self.is_represented(index, entry)? {
            return Ok(Outcome::Skipped);
        }

        let path = &file.path;
        match entry {
            Entry::Project(id) => {
                let content = match read_text(path) {
                    Ok(content) => content,
                    Err(err) => return Ok(vanished_or_failed(path, err)),
                };
                match project_from_note(id, path, &content) {
                    Ok(project) => index.upsert_project(&project)?,
                    Err(err) => return Ok(Outcome::Failed(parse_error(path, err))),
                }
            }
            Entry::Note(id, NoteKind::Markdown) => {
                let content = match read_text(path) {
                    Ok(content) => content,
                    Err(err) => return Ok(vanished_or_failed(path, err)),
                };
                index.upsert_note(id, NoteKind::Markdown, &content)?;
                LinkGraphEngine::new(index, self.store).replace_forward_links(id, &content)?;
            }
            Entry::Note(id, NoteKind::Drawing) => {
                let text = match self.extractor.extract_drawing_text(path) {
                    Ok(text) => text,
                    Err(err) => return Ok(extract_failed(path, err)),
                };
                index.upsert_note(id, NoteKind::Drawing, &text)?;
                index.replace_links(&id.to_string(), &[])?;
            }
            Entry::Attachment(id) => {
                let pages = match self.extractor.extract_pages(path) {
                    Ok(pages) => pages,
                    Err(err) => return Ok(extract_failed(path, err)),
                };
                index.upsert_attachment_pages(id, &pages)?;
            }
            Entry::Annotation(id) => {
                let content = match read_text(path) {
                    Ok(content) => content,
                    Err(err) => return Ok(vanished_or_failed(path, err)),
                };
                let annotation = match parse_annotation(path, &content) {
                    Ok(annotation) => annotation,
                    Err(err) => return Ok(Outcome::Failed(parse_error(path, err))),
                };
                if annotation.id != *id {
                    return Ok(Outcome::Failed(ScanError::Parse {
                        path: path.clone(),
                        message: format!("annotation id '{}' does not match file name", annotation.id),
                    }));
                }
                let project_note = annotation.project_id.self_note_path(self.store.root());
                if !path_exists(&project_note).unwrap_or(true) {
                    debug!(annotation = %id, project = %annotation.project_id, "annotation of missing project");
                    return Ok(Outcome::Skipped);
                }
                index.upsert_annotation(&annotation)?;
            }
        }
        Ok(Outcome::Indexed)
    }

    /// Deletes rows whose backing file or folder no longer exists.
    ///
    /// An existence check that fails is treated as "still exists".
    fn prune_dangling(&self, index: &ContentIndex) -> Result<usize, ReindexError> {
        let root = self.store.root();
        let mut pruned = 0;

        for id in index.meta_ids()? {
            let gone = match ProjectId::new(&id) {
                Ok(pid) => is_gone(&pid.self_note_path(root)),
                Err(_) => true,
            };
            if gone {
                index.delete_project_rows(&id)?;
                pruned += 1;
            }
        }

        for id in index.note_ids()? {
            if note_is_gone(root, &id) {
                index.delete_note_rows(&id)?;
                pruned += 1;
            }
        }

        for id in index.attachment_ids()? {
            if note_is_gone(root, &id) {
                index.delete_attachment_rows(&id)?;
                pruned += 1;
            }
        }

        for id in index.annotation_ids()? {
            if is_gone(&self.store.annotation_path(&id)) {
                index.delete_annotation_rows(&id)?;
                pruned += 1;
            }
        }

        if pruned > 0 {
            debug!(pruned, "pruned dangling index entries");
        }
        Ok(pruned)
    }
}

// ===========================================
// Helper Functions
// ===========================================

fn is_gone(path: &Path) -> bool {
    match path_exists(path) {
        Ok(exists) => !exists,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "existence check failed, keeping rows");
            false
        }
    }
}

/// A note is gone with its file or with its project's self note.
fn note_is_gone(root: &Path, id: &str) -> bool {
    match id.parse::<NoteId>() {
        Ok(note) => {
            is_gone(&note.to_path(root)) || is_gone(&note.project_id().self_note_path(root))
        }
        Err(_) => true,
    }
}

/// A file that disappeared between walking and reading counts as skipped.
fn vanished_or_failed(path: &Path, err: FsError) -> Outcome {
    if err.is_not_found() {
        debug!(path = %path.display(), "file vanished during scan");
        return Outcome::Skipped;
    }
    match err {
        FsError::InvalidEncoding { encoding, .. } => Outcome::Failed(ScanError::Parse {
            path: path.to_path_buf(),
            message: format!("invalid encoding: {encoding}"),
        }),
        err => Outcome::Failed(ScanError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

fn extract_failed(path: &Path, err: ExtractError) -> Outcome {
    match err {
        ExtractError::Read(fs) => vanished_or_failed(path, fs),
        ExtractError::Drawing { source, .. } => Outcome::Failed(ScanError::Parse {
            path: path.to_path_buf(),
            message: source.to_string(),
        }),
        err => Outcome::Failed(ScanError::Extract {
            path: path.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

fn parse_error(path: &Path, err: StoreError) -> ScanError {
    let message = match err {
        StoreError::Parse { message, .. } => message,
        other => other.to_string(),
    };
    ScanError::Parse {
        path: path.to_path_buf(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Annotation, AnnotationKind, Project};
    use crate::extract::DefaultExtractor;
    use crate::infra::serialize_project_note;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    // ===========================================
    // Test Helpers
    // ===========================================

    fn pid(s: &str) -> ProjectId {
        ProjectId::new(s).unwrap()
    }

    fn write_project(root: &Path, id: &str, categories: &[&str]) {
        let mut project = Project::new(pid(id), format!("Title {id}"));
        project.categories = categories.iter().map(|c| c.to_string()).collect();
        fs::create_dir_all(root.join(id)).unwrap();
        fs::write(
            root.join(id).join(format!("{id}.md")),
            serialize_project_note(&project),
        )
        .unwrap();
    }

    fn setup() -> (TempDir, ItemStore, ContentIndex) {
        let dir = TempDir::new().unwrap();
        write_project(dir.path(), "p1", &["a", "a/b"]);
        write_project(dir.path(), "p2", &["c"]);
        fs::write(dir.path().join("p1/note.md"), "see [p2](p2)").unwrap();
        fs::write(
            dir.path().join("p2/sketch.excalidraw"),
            r#"{"elements":[{"type":"text","text":"drawn words"}]}"#,
        )
        .unwrap();
        let store = ItemStore::new(dir.path());
        let mut annotation = Annotation::new(pid("p1"), 3, AnnotationKind::Comment);
        annotation.id = "SA1".into();
        annotation.content = "remark".into();
        store.put_annotation(&annotation).unwrap();
        (dir, store, ContentIndex::open_in_memory().unwrap())
    }

    struct Recorder(Vec<(String, &'static str)>);

    impl ProgressReporter for Recorder {
        fn on_file(&mut self, path: &Path, result: FileResult) {
            let tag = match result {
                FileResult::Indexed => "indexed",
                FileResult::Skipped => "skipped",
                FileResult::Error(_) => "error",
            };
            self.0.push((path.display().to_string(), tag));
        }
        fn on_complete(&mut self, _processed: usize, _errors: usize) {}
    }

    // ===========================================
    // Scanning
    // ===========================================

    #[test]
    fn scan_indexes_every_item_kind() {
        let (_dir, store, index) = setup();
        let report = Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();

        assert_eq!(report.processed, 5);
        assert!(report.errors.is_empty());
        assert!(index.is_ready().unwrap());
        assert_eq!(report.last_scan_time, Some(report.scan_started));
        assert_eq!(index.meta_ids().unwrap(), vec!["p1", "p2"]);
        assert_eq!(
            index.note_ids().unwrap(),
            vec!["p1/note.md", "p2/sketch.excalidraw"]
        );
        assert_eq!(index.annotation_ids().unwrap(), vec!["SA1"]);
        assert_eq!(index.links_from("p1/note.md").unwrap(), vec!["p2"]);
        assert_eq!(index.search("drawn").unwrap()[0].item_id, "p2/sketch.excalidraw");
    }

    #[test]
    fn second_scan_skips_unchanged_files() {
        let (_dir, store, index) = setup();
        let first = Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();
        let before = index.snapshot().unwrap();

        let second = Reindexer::new(&store, &DefaultExtractor)
            .with_last_scan_time(first.last_scan_time)
            .full_scan(&index)
            .unwrap();

        assert_eq!(second.processed, 0);
        assert_eq!(second.skipped, 5);
        assert_eq!(index.snapshot().unwrap(), before);
    }

    #[test]
    fn unrepresented_files_are_processed_despite_the_mark() {
        let (_dir, store, index) = setup();
        let future = Utc::now() + Duration::hours(1);
        let report = Reindexer::new(&store, &DefaultExtractor)
            .with_last_scan_time(Some(future))
            .full_scan(&index)
            .unwrap();
        assert_eq!(report.processed, 5);

        let again = Reindexer::new(&store, &DefaultExtractor)
            .with_last_scan_time(Some(future))
            .full_scan(&index)
            .unwrap();
        assert_eq!(again.processed, 0);
    }

    #[test]
    fn attachments_without_text_are_skipped_once_indexed() {
        let (dir, store, index) = setup();
        fs::write(dir.path().join("p1/paper.pdf"), b"%PDF-1.4").unwrap();

        let first = Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();
        assert_eq!(first.processed, 6);
        assert!(index.has_attachment("p1/paper.pdf").unwrap());

        let second = Reindexer::new(&store, &DefaultExtractor)
            .with_last_scan_time(first.last_scan_time)
            .full_scan(&index)
            .unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.skipped, 6);
    }

    #[test]
    fn folders_without_project_note_are_ignored() {
        let (dir, store, index) = setup();
        fs::create_dir_all(dir.path().join("junk")).unwrap();
        fs::write(dir.path().join("junk/x.md"), "see [p1](p1)").unwrap();
        fs::write(dir.path().join("junk/scan.pdf"), b"%PDF-1.4").unwrap();

        let report = Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();

        assert_eq!(report.processed, 5);
        assert!(!index.has_note("junk/x.md").unwrap());
        assert!(index.attachment_ids().unwrap().is_empty());
        assert!(index.links_to("p1").unwrap().is_empty());
    }

    #[test]
    fn notes_are_pruned_when_the_project_note_goes() {
        let (dir, store, index) = setup();
        let first = Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();
        fs::remove_file(dir.path().join("p2/p2.md")).unwrap();

        Reindexer::new(&store, &DefaultExtractor)
            .with_last_scan_time(first.last_scan_time)
            .full_scan(&index)
            .unwrap();

        assert_eq!(index.meta_ids().unwrap(), vec!["p1"]);
        assert_eq!(index.note_ids().unwrap(), vec!["p1/note.md"]);
    }

    #[test]
    fn malformed_files_are_skipped_and_reported() {
        let (dir, store, index) = setup();
        fs::write(dir.path().join("p2/p2.md"), "no metadata").unwrap();
        fs::write(dir.path().join("p1/broken.excalidraw"), "not json").unwrap();

        let report = Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();

        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().all(|e| matches!(e, ScanError::Parse { .. })));
        assert_eq!(index.meta_ids().unwrap(), vec!["p1"]);
        assert!(index.is_ready().unwrap());
    }

    #[test]
    fn unreadable_root_aborts_and_keeps_index() {
        let (dir, store, index) = setup();
        Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();
        let before = index.snapshot().unwrap();

        let missing = ItemStore::new(dir.path().join("nope"));
        let err = Reindexer::new(&missing, &DefaultExtractor)
            .full_scan(&index)
            .unwrap_err();
        assert!(matches!(err, ReindexError::Root(_)));
        assert_eq!(index.snapshot().unwrap(), before);
    }

    #[test]
    fn deleted_items_are_pruned() {
        let (dir, store, index) = setup();
        let first = Reindexer::new(&store, &DefaultExtractor)
            .full_scan(&index)
            .unwrap();

        fs::remove_dir_all(dir.path().join("p2")).unwrap();
        fs::remove_file(dir.path().join("p1/note.md")).unwrap();
        store.delete_annotation("SA1").unwrap();

        let report = Reindexer::new(&store, &DefaultExtractor)
            .with_last_scan_time(first.last_scan_time)
            .full_scan(&index)
            .unwrap();

        assert_eq!(report.pruned, 3);
        assert_eq!(index.meta_ids().unwrap(), vec!["p1"]);
        assert!(index.note_ids().unwrap().is_empty());
        assert!(index.annotation_ids().unwrap().is_empty());
        assert!(index.links_from("p1/note.md").unwrap().is_empty());
    }

    #[test]
    fn cancelled_scan_neither_prunes_nor_advances() {
        let (_dir, store, index) = setup();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let report = Reindexer::new(&store, &DefaultExtractor)
            .with_cancel_flag(cancel)
            .full_scan(&index)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.processed, 0);
        assert_eq!(report.last_scan_time, None);
        assert!(!index.is_ready().unwrap());
    }

    #[test]
    fn rebuild_clears_stale_rows() {
        let (_dir, store, index) = setup();
        index
            .replace_links("ghost/n.md", &["elsewhere".into()])
            .unwrap();
        Reindexer::new(&store, &DefaultExtractor)
            .rebuild(&index)
            .unwrap();
        assert!(index.links_from("ghost/n.md").unwrap().is_empty());
        assert_eq!(index.meta_ids().unwrap(), vec!["p1", "p2"]);
    }

    #[test]
    fn progress_reports_relative_paths() {
        let (_dir, store, index) = setup();
        let mut recorder = Recorder(Vec::new());
        Reindexer::new(&store, &DefaultExtractor)
            .full_scan_with_progress(&index, &mut recorder)
            .unwrap();
        let paths: Vec<&str> = recorder.0.iter().map(|(p, _)| p.as_str()).collect();
        assert!(paths.contains(&"p1/p1.md"));
        assert!(paths.contains(&".folio/annotations/SA1.json"));
        assert!(recorder.0.iter().all(|(_, tag)| *tag == "indexed"));
    }
}
