//! Bibliographic project record.

use crate::domain::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A CSL-style author entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Single-string name used for institutions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl Author {
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: Some(given.into()),
            family: Some(family.into()),
            ..Self::default()
        }
    }

    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            literal: Some(name.into()),
            ..Self::default()
        }
    }

    /// Display name: the literal name, or "Given Family".
    pub fn display_name(&self) -> String {
        if let Some(literal) = &self.literal {
            return literal.clone();
        }
        [self.given.as_deref(), self.family.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A bibliographic project.
///
/// The project owns a folder under the storage root. Its metadata is
/// serialized as JSON inside the project's self-describing note, using the
/// camelCase / CSL key names below. Unknown keys are ignored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ProjectId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    /// CSL item type (`article-journal`, `book`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_key: Option<String>,
    #[serde(default)]
    pub author: Vec<Author>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// CSL date value, e.g. `{"date-parts": [[2020, 5]]}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<Value>,
    #[serde(rename = "DOI", default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(rename = "ISBN", default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ordered set of category paths.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp_added: i64,
    #[serde(default)]
    pub timestamp_modified: i64,
}

impl Project {
    /// Creates a project with the given id and title, stamped with the current time.
    pub fn new(id: ProjectId, title: impl Into<String>) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id,
            title: title.into(),
            original_title: None,
            kind: None,
            citation_key: None,
            author: Vec::new(),
            abstract_text: None,
            issued: None,
            doi: None,
            isbn: None,
            url: None,
            publisher: None,
            container_title: None,
            volume: None,
            favorite: false,
            tags: Vec::new(),
            categories: Vec::new(),
            timestamp_added: now,
            timestamp_modified: now,
        }
    }

    /// Title for display, falling back to the id.
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.title
        }
    }

    /// Publication year from `issued.date-parts[0][0]`, if present.
    pub fn year(&self) -> Option<i64> {
        let first = self.issued.as_ref()?.get("date-parts")?.get(0)?.get(0)?;
        first
            .as_i64()
            .or_else(|| first.as_str().and_then(|s| s.trim().parse().ok()))
    }

    /// Adds a category unless an equal entry is already present.
    pub fn add_category(&mut self, category: impl Into<String>) -> bool {
        let category = category.into();
        if self.categories.contains(&category) {
            return false;
        }
        self.categories.push(category);
        true
    }

    /// Replaces the category list, dropping later duplicates.
    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.categories.clear();
        for category in categories {
            self.add_category(category);
        }
    }

    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_added)
    }

    pub fn touch(&mut self) {
        self.timestamp_modified = Utc::now().timestamp_millis();
    }
}
