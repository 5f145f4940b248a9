//! SQLite schema for the content index.

use rusqlite::Connection;

/// A derived table of the content index.
///
/// Every table carries the id of its parent so that rows can be removed in
/// bulk. For `links` the parent is the `source` note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Metas,
    Contents,
    Categories,
    Authors,
    Notes,
    Annotations,
    Tags,
    Links,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Metas,
        Table::Contents,
        Table::Categories,
        Table::Authors,
        Table::Notes,
        Table::Annotations,
        Table::Tags,
        Table::Links,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Metas => "metas",
            Table::Contents => "contents",
            Table::Categories => "categories",
            Table::Authors => "authors",
            Table::Notes => "notes",
            Table::Annotations => "annotations",
            Table::Tags => "tags",
            Table::Links => "links",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Metas => &[
                "meta_id",
                "type",
                "citation_key",
                "title",
                "original_title",
                "abstract",
                "year",
                "publisher",
                "container_title",
                "volume",
                "doi",
                "isbn",
                "url",
                "favorite",
                "timestamp_added",
                "timestamp_modified",
            ],
            Table::Contents => &["meta_id", "item_id", "page", "content"],
            Table::Categories => &["meta_id", "category"],
            Table::Authors => &["meta_id", "given", "family", "literal", "affiliation"],
            Table::Notes => &["meta_id", "note_id", "type", "content"],
            Table::Annotations => &[
                "meta_id",
                "annot_id",
                "type",
                "color",
                "page_number",
                "rects",
                "content",
                "timestamp_added",
                "timestamp_modified",
            ],
            Table::Tags => &["meta_id", "tag"],
            Table::Links => &["source", "target"],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    fn create_sql(&self) -> String {
        format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING fts5({});",
            self.name(),
            self.columns().join(", ")
        )
    }
}

/// Creates the content index schema.
///
/// Every table is an FTS5 virtual table. It is idempotent - calling it
/// multiple times is safe.
///
/// # Tables Created
/// - `metas` - one row per project
/// - `contents` - one row per attachment page
/// - `categories`, `authors`, `tags` - per-project lists
/// - `notes` - one row per note with its text
/// - `annotations` - one row per annotation
/// - `links` - directed note-to-item edges
/// - `index_state` - key/value flags such as readiness
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    for table in Table::ALL {
        conn.execute_batch(&table.create_sql())?;
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS index_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'))",
        [],
    )?;

    Ok(())
}

/// Returns the current schema version.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get(0)
    })
}
