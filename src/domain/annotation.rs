//! PDF annotations stored as JSON side-files.

use crate::domain::ProjectId;
use crate::domain::item_id::{ParseItemIdError, validate_segment};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Comment,
    Highlight,
    Rectangle,
    Underline,
    Strikeout,
    Ink,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Comment => "comment",
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Rectangle => "rectangle",
            AnnotationKind::Underline => "underline",
            AnnotationKind::Strikeout => "strikeout",
            AnnotationKind::Ink => "ink",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A region on a page, in page-relative units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub height: f64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(rename = "_id")]
    pub id: String,
    pub project_id: ProjectId,
    pub page_number: u32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub rects: Vec<Rect>,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    #[serde(default)]
    pub timestamp_added: i64,
    #[serde(default)]
    pub timestamp_modified: i64,
}

impl Annotation {
    /// Creates an annotation with a generated `SA<ULID>` id.
    pub fn new(project_id: ProjectId, page_number: u32, kind: AnnotationKind) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: format!("SA{}", Ulid::new()),
            project_id,
            page_number,
            content: String::new(),
            color: "#ffd400".to_string(),
            rects: Vec::new(),
            kind,
            timestamp_added: now,
            timestamp_modified: now,
        }
    }

    /// Validates an annotation id for use as a side-file name.
    pub fn validate_id(id: &str) -> Result<(), ParseItemIdError> {
        validate_segment(id, "annotation id")
    }
}
