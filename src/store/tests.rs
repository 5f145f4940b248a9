use super::*;
use crate::domain::{AnnotationKind, NoteKind, NoteTreeEntry, Project};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

// ===========================================
// Test Helpers
// ===========================================

fn pid(s: &str) -> ProjectId {
    ProjectId::new(s).unwrap()
}

fn nid(s: &str) -> NoteId {
    s.parse().unwrap()
}

fn setup() -> (TempDir, ItemStore) {
    let dir = TempDir::new().unwrap();
    let store = ItemStore::new(dir.path());
    (dir, store)
}

fn with_project(store: &ItemStore, id: &str) -> Project {
    let project = Project::new(pid(id), format!("Title {id}"));
    store.create_project(&project).unwrap();
    project
}

// ===========================================
// Projects
// ===========================================

#[test]
fn create_and_read_project() {
    let (_dir, store) = setup();
    let mut project = with_project(&store, "p1");
    project.categories = vec!["a/b".into()];
    store.update_project(&pid("p1"), &project).unwrap();

    let read = store.read_project(&pid("p1")).unwrap();
    assert_eq!(read, project);
    assert_eq!(store.resolve("p1"), Some(ItemKind::Project));
}

#[test]
fn create_project_refuses_existing_folder() {
    let (_dir, store) = setup();
    with_project(&store, "p1");
    let err = store.create_project(&Project::new(pid("p1"), "x")).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
}

#[test]
fn read_missing_project_is_not_found() {
    let (_dir, store) = setup();
    let err = store.read_project(&pid("nope")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn read_project_with_broken_metadata_is_parse_error() {
    let (dir, store) = setup();
    fs::create_dir(dir.path().join("p1")).unwrap();
    fs::write(dir.path().join("p1/p1.md"), "# no metadata here\n").unwrap();
    let err = store.read_project(&pid("p1")).unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }));
}

#[test]
fn folder_name_wins_over_embedded_id() {
    let (dir, store) = setup();
    with_project(&store, "p1");
    fs::rename(dir.path().join("p1"), dir.path().join("p2")).unwrap();
    fs::rename(dir.path().join("p2/p1.md"), dir.path().join("p2/p2.md")).unwrap();
    assert_eq!(store.read_project(&pid("p2")).unwrap().id, pid("p2"));
}

#[test]
fn update_project_with_new_id_moves_everything() {
    let (dir, store) = setup();
    let mut project = with_project(&store, "p1");
    store.write_note(&nid("p1/n.md"), "hello").unwrap();
    let mut annotation = Annotation::new(pid("p1"), 1, AnnotationKind::Highlight);
    annotation.id = "SA1".into();
    store.put_annotation(&annotation).unwrap();

    project.id = pid("q1");
    let change = store.update_project(&pid("p1"), &project).unwrap().unwrap();

    assert_eq!(change.old, pid("p1"));
    assert_eq!(change.new, pid("q1"));
    assert!(!dir.path().join("p1").exists());
    assert!(dir.path().join("q1/q1.md").exists());
    assert!(!dir.path().join("q1/p1.md").exists());
    assert_eq!(store.read_note(&nid("q1/n.md")).unwrap(), "hello");
    assert_eq!(store.read_annotation("SA1").unwrap().project_id, pid("q1"));
}

#[test]
fn update_project_refuses_to_overwrite() {
    let (_dir, store) = setup();
    let mut project = with_project(&store, "p1");
    with_project(&store, "p2");
    project.id = pid("p2");
    let err = store.update_project(&pid("p1"), &project).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
}

#[test]
fn delete_project_removes_folder_and_annotations() {
    let (dir, store) = setup();
    with_project(&store, "p1");
    let mut annotation = Annotation::new(pid("p1"), 1, AnnotationKind::Comment);
    annotation.id = "SA1".into();
    store.put_annotation(&annotation).unwrap();

    store.delete_project(&pid("p1")).unwrap();
    assert!(!dir.path().join("p1").exists());
    assert!(store.list_annotations(None).unwrap().is_empty());
    assert!(store.delete_project(&pid("p1")).unwrap_err().is_not_found());
}

#[test]
fn list_projects_skips_plain_and_hidden_folders() {
    let (dir, store) = setup();
    with_project(&store, "b");
    with_project(&store, "a");
    fs::create_dir(dir.path().join("plain")).unwrap();
    fs::create_dir_all(dir.path().join(".folio")).unwrap();

    let ids: Vec<String> = store
        .list_projects()
        .unwrap()
        .into_iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

// ===========================================
// Notes
// ===========================================

#[test]
fn create_note_picks_unique_untitled_names() {
    let (_dir, store) = setup();
    with_project(&store, "p1");
    let first = store.create_note(&pid("p1"), NoteKind::Markdown, None).unwrap();
    let second = store.create_note(&pid("p1"), NoteKind::Markdown, None).unwrap();
    let drawing = store
        .create_note(&pid("p1"), NoteKind::Drawing, Some("sketches"))
        .unwrap();

    assert_eq!(first.to_string(), "p1/Untitled.md");
    assert_eq!(second.to_string(), "p1/Untitled 1.md");
    assert_eq!(drawing.to_string(), "p1/sketches/Untitled.excalidraw");
    assert!(store.read_note(&drawing).unwrap().contains("\"elements\""));
}

#[test]
fn create_note_requires_project() {
    let (_dir, store) = setup();
    let err = store
        .create_note(&pid("p1"), NoteKind::Markdown, None)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn rename_note_keeps_extension() {
    let (_dir, store) = setup();
    with_project(&store, "p1");
    store.write_note(&nid("p1/sub/old.md"), "x").unwrap();

    let change = store.rename_note(&nid("p1/sub/old.md"), "new").unwrap();
    assert_eq!(change.new, nid("p1/sub/new.md"));
    assert_eq!(store.read_note(&change.new).unwrap(), "x");
    assert!(store.read_note(&change.old).unwrap_err().is_not_found());
}

#[test]
fn rename_note_refuses_to_overwrite() {
    let (_dir, store) = setup();
    with_project(&store, "p1");
    store.write_note(&nid("p1/a.md"), "a").unwrap();
    store.write_note(&nid("p1/b.md"), "b").unwrap();
    let err = store.rename_note(&nid("p1/a.md"), "b").unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
    assert_eq!(store.read_note(&nid("p1/b.md")).unwrap(), "b");
}

#[test]
fn self_note_cannot_be_renamed_or_deleted() {
    let (_dir, store) = setup();
    with_project(&store, "p1");
    let id = pid("p1").self_note_id();
    assert!(matches!(
        store.rename_note(&id, "x").unwrap_err(),
        StoreError::SelfNote { .. }
    ));
    assert!(matches!(
        store.delete_note(&id).unwrap_err(),
        StoreError::SelfNote { .. }
    ));
}

#[test]
fn list_notes_excludes_self_note_and_attachments() {
    let (dir, store) = setup();
    with_project(&store, "p1");
    store.write_note(&nid("p1/b.md"), "").unwrap();
    store.write_note(&nid("p1/a/c.excalidraw"), "{}").unwrap();
    fs::write(dir.path().join("p1/paper.pdf"), b"%PDF").unwrap();

    let ids: Vec<String> = store
        .list_notes(&pid("p1"))
        .unwrap()
        .iter()
        .map(|n| n.id().to_string())
        .collect();
    assert_eq!(ids, vec!["p1/a/c.excalidraw", "p1/b.md"]);
    assert_eq!(
        store.list_attachments(&pid("p1")).unwrap(),
        vec![nid("p1/paper.pdf")]
    );
}

#[test]
fn rewrite_links_touches_only_referring_notes() {
    let (_dir, store) = setup();
    with_project(&store, "p1");
    store
        .write_note(&nid("p1/a.md"), "see [b](p1/b.md#part)")
        .unwrap();
    store.write_note(&nid("p1/c.md"), "nothing").unwrap();

    let changed = store.rewrite_links("p1/b.md", "p1/renamed.md").unwrap();
    assert_eq!(changed, vec![nid("p1/a.md")]);
    assert_eq!(
        store.read_note(&nid("p1/a.md")).unwrap(),
        "see [b](p1/renamed.md#part)"
    );
}

// ===========================================
// Folders
// ===========================================

fn write_files(store: &ItemStore, ids: &[&str]) {
    for id in ids {
        store.write_note(&nid(id), "").unwrap();
    }
}

#[test]
fn create_folder_picks_unique_names() {
    let (dir, store) = setup();
    with_project(&store, "p1");

    let first = store.create_folder(&pid("p1"), None).unwrap();
    let second = store.create_folder(&pid("p1"), None).unwrap();
    let nested = store.create_folder(&pid("p1"), Some("New Folder/")).unwrap();

    assert_eq!(first.to_string(), "p1/New Folder");
    assert_eq!(second.to_string(), "p1/New Folder 1");
    assert_eq!(nested.to_string(), "p1/New Folder/New Folder");
    assert!(dir.path().join("p1/New Folder/New Folder").is_dir());
}

#[test]
fn create_folder_requires_project() {
    let (_dir, store) = setup();
    let err = store.create_folder(&pid("nope"), None).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn rename_folder_reports_every_tracked_file() {
    let (dir, store) = setup();
    with_project(&store, "p1");
    write_files(
        &store,
        &[
            "p1/drafts/a.md",
            "p1/drafts/paper.pdf",
            "p1/drafts/picture.png",
            "p1/drafts/sub/b.excalidraw",
            "p1/outside.md",
        ],
    );

    let change = store.rename_folder(&nid("p1/drafts"), "final").unwrap();

    assert_eq!(change.folder.new, nid("p1/final"));
    let moved: Vec<(String, String)> = change
        .files
        .iter()
        .map(|c| (c.old.to_string(), c.new.to_string()))
        .collect();
    assert_eq!(
        moved,
        vec![
            ("p1/drafts/a.md".to_string(), "p1/final/a.md".to_string()),
            ("p1/drafts/paper.pdf".into(), "p1/final/paper.pdf".into()),
            (
                "p1/drafts/sub/b.excalidraw".into(),
                "p1/final/sub/b.excalidraw".into()
            ),
        ]
    );
    assert!(!dir.path().join("p1/drafts").exists());
    assert!(dir.path().join("p1/final/picture.png").exists());
    assert!(dir.path().join("p1/outside.md").exists());
}

#[test]
fn rename_folder_to_same_name_moves_nothing() {
    let (_dir, store) = setup();
    with_project(&store, "p1");
    write_files(&store, &["p1/drafts/a.md"]);
    let change = store.rename_folder(&nid("p1/drafts"), "drafts").unwrap();
    assert_eq!(change.folder.old, change.folder.new);
    assert!(change.files.is_empty());
}

#[test]
fn rename_folder_rejects_missing_taken_and_file_targets() {
    let (_dir, store) = setup();
    with_project(&store, "p1");
    write_files(&store, &["p1/drafts/a.md", "p1/other/b.md", "p1/note.md"]);

    let taken = store.rename_folder(&nid("p1/drafts"), "other").unwrap_err();
    assert!(matches!(taken, StoreError::AlreadyExists { .. }));

    let missing = store.rename_folder(&nid("p1/ghost"), "x").unwrap_err();
    assert!(matches!(missing, StoreError::FolderNotFound { .. }));
    assert!(missing.is_not_found());

    let file = store.rename_folder(&nid("p1/note.md"), "x").unwrap_err();
    assert!(matches!(file, StoreError::FolderNotFound { .. }));

    assert!(store.rename_folder(&nid("p1/drafts"), "a/b").is_err());
}

#[test]
fn delete_folder_returns_removed_files() {
    let (dir, store) = setup();
    with_project(&store, "p1");
    write_files(&store, &["p1/drafts/a.md", "p1/drafts/sub/b.md", "p1/keep.md"]);

    let removed = store.delete_folder(&nid("p1/drafts")).unwrap();

    assert_eq!(removed, vec![nid("p1/drafts/a.md"), nid("p1/drafts/sub/b.md")]);
    assert!(!dir.path().join("p1/drafts").exists());
    assert!(dir.path().join("p1/keep.md").exists());
    assert!(store.delete_folder(&nid("p1/drafts")).unwrap_err().is_not_found());
}

#[test]
fn note_tree_lists_folders_before_notes() {
    let (dir, store) = setup();
    with_project(&store, "p1");
    write_files(
        &store,
        &[
            "p1/b.md",
            "p1/a/inner.md",
            "p1/a/deep/d.excalidraw",
            "p1/paper.pdf",
        ],
    );
    fs::create_dir_all(dir.path().join("p1/empty")).unwrap();

    let tree = store.note_tree(&pid("p1")).unwrap();

    let note = |id: &str, label: &str, kind| NoteTreeEntry::Note {
        id: nid(id),
        label: label.into(),
        kind,
    };
    let folder = |id: &str, label: &str, children| NoteTreeEntry::Folder {
        id: nid(id),
        label: label.into(),
        children,
    };
    assert_eq!(
        tree,
        vec![
            folder(
                "p1/a",
                "a",
                vec![
                    folder(
                        "p1/a/deep",
                        "deep",
                        vec![note("p1/a/deep/d.excalidraw", "d.excalidraw", NoteKind::Drawing)]
                    ),
                    note("p1/a/inner.md", "inner.md", NoteKind::Markdown),
                ]
            ),
            folder("p1/empty", "empty", vec![]),
            note("p1/b.md", "b.md", NoteKind::Markdown),
        ]
    );
    assert_eq!(
        serde_json::to_value(&tree[2]).unwrap(),
        serde_json::json!({"type": "note", "id": "p1/b.md", "label": "b.md", "kind": "markdown"})
    );
}

#[test]
fn note_tree_of_unknown_project_is_not_found() {
    let (_dir, store) = setup();
    assert!(store.note_tree(&pid("nope")).unwrap_err().is_not_found());
}

// ===========================================
// Annotations
// ===========================================

#[test]
fn annotations_round_trip_and_filter_by_project() {
    let (_dir, store) = setup();
    for (id, project) in [("SA2", "p1"), ("SA1", "p1"), ("SA3", "p2")] {
        let mut annotation = Annotation::new(pid(project), 1, AnnotationKind::Highlight);
        annotation.id = id.into();
        store.put_annotation(&annotation).unwrap();
    }

    let ids: Vec<String> = store
        .list_annotations(Some(&pid("p1")))
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec!["SA1", "SA2"]);
    assert_eq!(store.list_annotations(None).unwrap().len(), 3);
    assert_eq!(store.resolve("SA3"), Some(ItemKind::Annotation));

    store.delete_annotation("SA3").unwrap();
    assert!(store.read_annotation("SA3").unwrap_err().is_not_found());
}

#[test]
fn list_annotations_without_directory_is_empty() {
    let (_dir, store) = setup();
    assert!(store.list_annotations(None).unwrap().is_empty());
}

#[test]
fn resolve_unknown_id() {
    let (_dir, store) = setup();
    assert_eq!(store.resolve("missing/thing.md"), None);
    assert_eq!(store.resolve(""), None);
}
