//! Core types: ProjectId, NoteId, Project, Note, Annotation, CategoryPath, Edge

mod annotation;
mod category;
pub(crate) mod item_id;
mod link;
mod note;
mod project;

pub use annotation::{Annotation, AnnotationKind, Rect};
pub use category::{CategoryNode, CategoryPath, CategoryTree, ParseCategoryError};
pub use item_id::{ItemKind, NoteId, ParseItemIdError, ProjectId};
pub use link::{Edge, ITEM_SCHEME, extract_link_targets, normalize_target, rewrite_link_targets};
pub use note::{Note, NoteKind, NoteTreeEntry};
pub use project::{Author, Project};
