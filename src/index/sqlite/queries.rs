//! Read queries for ContentIndex.

use super::ContentIndex;
use crate::domain::Author;
use crate::index::{IndexError, IndexResult, Table};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Params, Row};
use serde::Serialize;
use std::collections::HashMap;

// ===========================================
// Row Types
// ===========================================

/// A project as reconstructed from index rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedProject {
    pub id: String,
    pub title: String,
    pub kind: Option<String>,
    pub citation_key: Option<String>,
    pub abstract_text: Option<String>,
    pub year: Option<i64>,
    pub favorite: bool,
    pub timestamp_added: i64,
    pub timestamp_modified: i64,
    pub authors: Vec<Author>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedNote {
    pub id: String,
    pub project_id: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedAnnotation {
    pub id: String,
    pub project_id: String,
    pub kind: String,
    pub page_number: u32,
    pub content: String,
    pub color: String,
}

/// A text match with a short excerpt around it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SearchHit {
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub snippet: String,
}

// ===========================================
// Text Matching
// ===========================================

/// ASCII case-insensitive substring test, the same rule as SQLite `LIKE`.
pub(crate) fn text_matches(text: &str, query: &str) -> bool {
    text.to_ascii_lowercase()
        .contains(&query.to_ascii_lowercase())
}

/// Returns up to 40 characters of context on each side of the first match.
///
/// Whitespace runs are collapsed and cut ends are marked with `…`.
pub fn snippet(text: &str, query: &str) -> String {
    const CONTEXT: usize = 40;

    let start = text
        .to_ascii_lowercase()
        .find(&query.to_ascii_lowercase())
        .unwrap_or(0);
    let end = (start + query.len()).min(text.len());

    let mut from = start.saturating_sub(CONTEXT);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + CONTEXT).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }

    let mut out = String::new();
    if from > 0 {
        out.push('…');
    }
    out.push_str(&text[from..to].split_whitespace().collect::<Vec<_>>().join(" "));
    if to < text.len() {
        out.push('…');
    }
    out
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// ===========================================
// Value Decoding
// ===========================================

fn none_if_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn parse_number<T: std::str::FromStr>(
    table: &'static str,
    column: &'static str,
    value: &str,
) -> IndexResult<T> {
    value.trim().parse().map_err(|_| IndexError::CorruptValue {
        table,
        column,
        value: value.to_string(),
    })
}

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

struct MetaRow {
    id: String,
    kind: String,
    citation_key: String,
    title: String,
    abstract_text: String,
    year: String,
    favorite: String,
    timestamp_added: String,
    timestamp_modified: String,
}

const META_SELECT: &str = "SELECT meta_id, type, citation_key, title, abstract, year, favorite, \
     timestamp_added, timestamp_modified FROM metas";

fn meta_row(row: &Row<'_>) -> rusqlite::Result<MetaRow> {
    Ok(MetaRow {
        id: text(row, 0)?,
        kind: text(row, 1)?,
        citation_key: text(row, 2)?,
        title: text(row, 3)?,
        abstract_text: text(row, 4)?,
        year: text(row, 5)?,
        favorite: text(row, 6)?,
        timestamp_added: text(row, 7)?,
        timestamp_modified: text(row, 8)?,
    })
}

fn author_row(row: &Row<'_>) -> rusqlite::Result<(String, Author)> {
    Ok((
        text(row, 0)?,
        Author {
            given: none_if_empty(text(row, 1)?),
            family: none_if_empty(text(row, 2)?),
            literal: none_if_empty(text(row, 3)?),
            affiliation: none_if_empty(text(row, 4)?),
        },
    ))
}

impl ContentIndex {
    // ===========================================
    // Raw Primitives
    // ===========================================

    /// Runs a parametrized query and returns every row as raw values.
    pub fn select(&self, sql: &str, params: impl Params) -> IndexResult<Vec<Vec<Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params, |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<Value>>>()
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn strings(&self, sql: &str, params: impl Params) -> IndexResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| text(row, 0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn exists(&self, sql: &str, id: &str) -> IndexResult<bool> {
        Ok(self
            .conn
            .query_row(sql, [id], |_| Ok(()))
            .optional()?
            .is_some())
    }

    // ===========================================
    // State
    // ===========================================

    /// Returns true once a scan has completed against this index.
    pub fn is_ready(&self) -> IndexResult<bool> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM index_state WHERE key = 'ready'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref() == Some("1"))
    }

    /// Row count of every table, in schema order.
    pub fn row_counts(&self) -> IndexResult<Vec<(&'static str, usize)>> {
        let mut counts = Vec::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            let count: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", table.name()),
                [],
                |row| row.get(0),
            )?;
            counts.push((table.name(), count as usize));
        }
        Ok(counts)
    }

    /// Every row of every table, rendered as `table|rowid|col|col...` lines.
    pub fn snapshot(&self) -> IndexResult<Vec<String>> {
        let mut lines = Vec::new();
        for table in Table::ALL {
            let sql = format!(
                "SELECT rowid, {} FROM {} ORDER BY rowid",
                table.columns().join(", "),
                table.name()
            );
            for row in self.select(&sql, [])? {
                let cells: Vec<String> = row
                    .iter()
                    .map(|v| match v {
                        Value::Null => String::new(),
                        Value::Integer(i) => i.to_string(),
                        Value::Real(f) => f.to_string(),
                        Value::Text(s) => s.clone(),
                        Value::Blob(b) => format!("<{} bytes>", b.len()),
                    })
                    .collect();
                lines.push(format!("{}|{}", table.name(), cells.join("|")));
            }
        }
        Ok(lines)
    }

    // ===========================================
    // Ids
    // ===========================================

    /// Ids of all indexed projects, sorted.
    pub fn meta_ids(&self) -> IndexResult<Vec<String>> {
        self.strings("SELECT meta_id FROM metas ORDER BY meta_id", [])
    }

    pub fn note_ids(&self) -> IndexResult<Vec<String>> {
        self.strings("SELECT note_id FROM notes ORDER BY note_id", [])
    }

    pub fn annotation_ids(&self) -> IndexResult<Vec<String>> {
        self.strings("SELECT annot_id FROM annotations ORDER BY annot_id", [])
    }

    pub fn attachment_ids(&self) -> IndexResult<Vec<String>> {
        self.strings(
            "SELECT DISTINCT item_id FROM contents ORDER BY item_id",
            [],
        )
    }

    pub fn has_project(&self, id: &str) -> IndexResult<bool> {
        self.exists("SELECT 1 FROM metas WHERE meta_id = ?1", id)
    }

    pub fn has_note(&self, id: &str) -> IndexResult<bool> {
        self.exists("SELECT 1 FROM notes WHERE note_id = ?1", id)
    }

    pub fn has_annotation(&self, id: &str) -> IndexResult<bool> {
        self.exists("SELECT 1 FROM annotations WHERE annot_id = ?1", id)
    }

    pub fn has_attachment(&self, id: &str) -> IndexResult<bool> {
        self.exists("SELECT 1 FROM contents WHERE item_id = ?1", id)
    }

    // ===========================================
    // Projects and Categories
    // ===========================================

    /// Distinct category strings across all projects, sorted.
    pub fn distinct_categories(&self) -> IndexResult<Vec<String>> {
        self.strings(
            "SELECT DISTINCT category FROM categories ORDER BY category",
            [],
        )
    }

    /// Category list of one project, in stored order.
    pub fn project_categories(&self, project: &str) -> IndexResult<Vec<String>> {
        self.strings(
            "SELECT category FROM categories WHERE meta_id = ?1 ORDER BY rowid",
            [project],
        )
    }

    /// Ids of projects that list `category` literally, sorted.
    pub fn project_ids_in_category(&self, category: &str) -> IndexResult<Vec<String>> {
        self.strings(
            "SELECT DISTINCT meta_id FROM categories WHERE category = ?1 ORDER BY meta_id",
            [category],
        )
    }

    pub fn get_project(&self, id: &str) -> IndexResult<Option<IndexedProject>> {
        let meta = self
            .conn
            .query_row(&format!("{META_SELECT} WHERE meta_id = ?1"), [id], meta_row)
            .optional()?;
        let Some(meta) = meta else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT meta_id, given, family, literal, affiliation FROM authors
             WHERE meta_id = ?1 ORDER BY rowid",
        )?;
        let authors = stmt
            .query_map([id], author_row)?
            .map(|r| r.map(|(_, a)| a))
            .collect::<Result<Vec<_>, _>>()?;
        let categories = self.project_categories(id)?;
        let tags = self.strings(
            "SELECT tag FROM tags WHERE meta_id = ?1 ORDER BY rowid",
            [id],
        )?;

        Ok(Some(build_project(meta, authors, categories, tags)?))
    }

    /// Every indexed project, sorted by id.
    pub fn all_projects(&self) -> IndexResult<Vec<IndexedProject>> {
        let mut authors: HashMap<String, Vec<Author>> = HashMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT meta_id, given, family, literal, affiliation FROM authors ORDER BY rowid",
        )?;
        for row in stmt.query_map([], author_row)? {
            let (id, author) = row?;
            authors.entry(id).or_default().push(author);
        }

        let lists = |table: &str, column: &str| -> IndexResult<HashMap<String, Vec<String>>> {
            let mut map: HashMap<String, Vec<String>> = HashMap::new();
            let mut stmt = self.conn.prepare(&format!(
                "SELECT meta_id, {column} FROM {table} ORDER BY rowid"
            ))?;
            for row in stmt.query_map([], |row| Ok((text(row, 0)?, text(row, 1)?)))? {
                let (id, value) = row?;
                map.entry(id).or_default().push(value);
            }
            Ok(map)
        };
        let mut categories = lists("categories", "category")?;
        let mut tags = lists("tags", "tag")?;

        let mut stmt = self
            .conn
            .prepare(&format!("{META_SELECT} ORDER BY meta_id"))?;
        let metas = stmt
            .query_map([], meta_row)?
            .collect::<Result<Vec<_>, _>>()?;

        metas
            .into_iter()
            .map(|meta| {
                let id = meta.id.clone();
                build_project(
                    meta,
                    authors.remove(&id).unwrap_or_default(),
                    categories.remove(&id).unwrap_or_default(),
                    tags.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }

    // ===========================================
    // Notes and Annotations
    // ===========================================

    /// Notes of a project, sorted by id.
    pub fn notes_of_project(&self, project: &str) -> IndexResult<Vec<IndexedNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_id, meta_id, type FROM notes WHERE meta_id = ?1 ORDER BY note_id",
        )?;
        let rows = stmt.query_map([project], |row| {
            Ok(IndexedNote {
                id: text(row, 0)?,
                project_id: text(row, 1)?,
                kind: text(row, 2)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Annotations of a project, sorted by id.
    pub fn annotations_of_project(&self, project: &str) -> IndexResult<Vec<IndexedAnnotation>> {
        self.annotations_where("meta_id", project)
    }

    pub fn get_annotation(&self, id: &str) -> IndexResult<Option<IndexedAnnotation>> {
        Ok(self.annotations_where("annot_id", id)?.into_iter().next())
    }

    fn annotations_where(&self, column: &str, value: &str) -> IndexResult<Vec<IndexedAnnotation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT annot_id, meta_id, type, page_number, content, color FROM annotations
             WHERE {column} = ?1 ORDER BY annot_id"
        ))?;
        let rows = stmt
            .query_map([value], |row| {
                Ok((
                    text(row, 0)?,
                    text(row, 1)?,
                    text(row, 2)?,
                    text(row, 3)?,
                    text(row, 4)?,
                    text(row, 5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut annotations = Vec::with_capacity(rows.len());
        for (id, project_id, kind, page, content, color) in rows {
            annotations.push(IndexedAnnotation {
                id,
                project_id,
                kind,
                page_number: parse_number("annotations", "page_number", &page)?,
                content,
                color,
            });
        }
        Ok(annotations)
    }

    // ===========================================
    // Links
    // ===========================================

    /// Targets of `source`, in the order they were stored.
    pub fn links_from(&self, source: &str) -> IndexResult<Vec<String>> {
        self.strings(
            "SELECT target FROM links WHERE source = ?1 ORDER BY rowid",
            [source],
        )
    }

    /// Sources that link to `target`, sorted.
    pub fn links_to(&self, target: &str) -> IndexResult<Vec<String>> {
        self.strings(
            "SELECT DISTINCT source FROM links WHERE target = ?1 ORDER BY source",
            [target],
        )
    }

    // ===========================================
    // Search
    // ===========================================

    /// Case-insensitive substring search over project titles and
    /// abstracts, note text, attachment pages and annotation comments.
    ///
    /// Hits are sorted by item id, then page.
    pub fn search(&self, query: &str) -> IndexResult<Vec<SearchHit>> {
        let pattern = like_pattern(query);
        let mut hits = Vec::new();

        let mut stmt = self.conn.prepare(
            "SELECT meta_id, title, abstract FROM metas
             WHERE title LIKE ?1 ESCAPE '\\' OR abstract LIKE ?1 ESCAPE '\\'",
        )?;
        for row in stmt.query_map([&pattern], |row| {
            Ok((text(row, 0)?, text(row, 1)?, text(row, 2)?))
        })? {
            let (id, title, abstract_text) = row?;
            let source = if text_matches(&title, query) {
                title
            } else {
                abstract_text
            };
            hits.push(SearchHit {
                item_id: id,
                page: None,
                snippet: snippet(&source, query),
            });
        }

        for (sql, paged) in [
            (
                "SELECT note_id, '', content FROM notes WHERE content LIKE ?1 ESCAPE '\\'",
                false,
            ),
            (
                "SELECT item_id, page, content FROM contents
                 WHERE content LIKE ?1 ESCAPE '\\' AND page != '0'",
                true,
            ),
            (
                "SELECT annot_id, '', content FROM annotations WHERE content LIKE ?1 ESCAPE '\\'",
                false,
            ),
        ] {
            let mut stmt = self.conn.prepare(sql)?;
            let rows = stmt
                .query_map([&pattern], |row| {
                    Ok((text(row, 0)?, text(row, 1)?, text(row, 2)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (id, page, content) in rows {
                let page = if paged {
                    Some(parse_number("contents", "page", &page)?)
                } else {
                    None
                };
                hits.push(SearchHit {
                    item_id: id,
                    page,
                    snippet: snippet(&content, query),
                });
            }
        }

        hits.sort();
        Ok(hits)
    }
}

fn build_project(
    meta: MetaRow,
    authors: Vec<Author>,
    categories: Vec<String>,
    tags: Vec<String>,
) -> IndexResult<IndexedProject> {
    let year = if meta.year.is_empty() {
        None
    } else {
        Some(parse_number("metas", "year", &meta.year)?)
    };
    Ok(IndexedProject {
        id: meta.id,
        title: meta.title,
        kind: none_if_empty(meta.kind),
        citation_key: none_if_empty(meta.citation_key),
        abstract_text: none_if_empty(meta.abstract_text),
        year,
        favorite: meta.favorite == "1",
        timestamp_added: parse_number("metas", "timestamp_added", &meta.timestamp_added)?,
        timestamp_modified: parse_number("metas", "timestamp_modified", &meta.timestamp_modified)?,
        authors,
        categories,
        tags,
    })
}
