//! Upsert and delete primitives for ContentIndex.

use super::ContentIndex;
use crate::domain::{Annotation, NoteId, NoteKind, Project, ProjectId};
use crate::index::{IndexError, IndexResult, Table};
use rusqlite::{Params, params};
use tracing::debug;

/// Page number of the placeholder row of an attachment without text.
const NO_PAGES: &str = "0";

/// Tables keyed by the owning project id.
const PROJECT_TABLES: [Table; 7] = [
    Table::Metas,
    Table::Contents,
    Table::Categories,
    Table::Authors,
    Table::Notes,
    Table::Annotations,
    Table::Tags,
];

/// Prefix shared by every item id below `id`, with its length in characters.
///
/// Compared with `substr(col, 1, len) = prefix`, which unlike `LIKE` is
/// case-sensitive.
fn child_prefix(id: &str) -> (String, i64) {
    let prefix = format!("{id}/");
    let len = prefix.chars().count() as i64;
    (prefix, len)
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

impl ContentIndex {
    // ===========================================
    // Raw Primitives
    // ===========================================

    /// Executes a parametrized statement.
    pub fn execute(&self, sql: &str, params: impl Params) -> IndexResult<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Deletes every row of `table` whose `column` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::UnknownColumn` if `column` is not part of `table`.
    pub fn delete_where(&self, table: Table, column: &str, value: &str) -> IndexResult<usize> {
        if !table.has_column(column) {
            return Err(IndexError::UnknownColumn {
                table: table.name(),
                column: column.to_string(),
            });
        }
        let sql = format!("DELETE FROM {} WHERE {} = ?1", table.name(), column);
        Ok(self.conn.execute(&sql, [value])?)
    }

    /// Removes all rows from every table and marks the index not ready.
    pub fn clear(&self) -> IndexResult<()> {
        let tx = self.transaction()?;
        for table in Table::ALL {
            tx.clear(table)?;
        }
        tx.execute("DELETE FROM index_state", [])?;
        tx.commit()
    }

    /// Records whether a scan has completed against this index.
    pub fn set_ready(&self, ready: bool) -> IndexResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO index_state (key, value) VALUES ('ready', ?1)",
            [if ready { "1" } else { "0" }],
        )?;
        Ok(())
    }

    // ===========================================
    // Upserts
    // ===========================================

    /// Replaces the meta, author, category and tag rows of a project.
    pub fn upsert_project(&self, project: &Project) -> IndexResult<()> {
        let pid = project.id.as_str();
        let tx = self.transaction()?;
        for table in [Table::Metas, Table::Authors, Table::Categories, Table::Tags] {
            tx.delete_matching(table, "meta_id", pid)?;
        }

        tx.insert(
            Table::Metas,
            params![
                pid,
                opt(&project.kind),
                opt(&project.citation_key),
                project.title,
                opt(&project.original_title),
                opt(&project.abstract_text),
                project.year().map(|y| y.to_string()).unwrap_or_default(),
                opt(&project.publisher),
                opt(&project.container_title),
                opt(&project.volume),
                opt(&project.doi),
                opt(&project.isbn),
                opt(&project.url),
                if project.favorite { "1" } else { "0" },
                project.timestamp_added.to_string(),
                project.timestamp_modified.to_string(),
            ],
        )?;

        for author in &project.author {
            tx.insert(
                Table::Authors,
                params![
                    pid,
                    opt(&author.given),
                    opt(&author.family),
                    opt(&author.literal),
                    opt(&author.affiliation),
                ],
            )?;
        }

        for category in &project.categories {
            tx.insert(Table::Categories, params![pid, category])?;
        }

        for tag in &project.tags {
            tx.insert(Table::Tags, params![pid, tag])?;
        }

        tx.commit()
    }

    /// Replaces only the category rows of a project.
    pub fn replace_categories(&self, project: &ProjectId, categories: &[String]) -> IndexResult<()> {
        let tx = self.transaction()?;
        tx.delete_matching(Table::Categories, "meta_id", project.as_str())?;
        for category in categories {
            tx.insert(Table::Categories, params![project.as_str(), category])?;
        }
        tx.commit()
    }

    /// Replaces the row of a note.
    pub fn upsert_note(&self, id: &NoteId, kind: NoteKind, content: &str) -> IndexResult<()> {
        let note_id = id.to_string();
        let tx = self.transaction()?;
        tx.delete_matching(Table::Notes, "note_id", &note_id)?;
        tx.insert(
            Table::Notes,
            params![id.project_id().as_str(), note_id, kind.as_str(), content],
        )?;
        tx.commit()
    }

    /// Replaces the row of an annotation.
    pub fn upsert_annotation(&self, annotation: &Annotation) -> IndexResult<()> {
        let rects = serde_json::to_string(&annotation.rects).unwrap_or_else(|_| "[]".into());
        let tx = self.transaction()?;
        tx.delete_matching(Table::Annotations, "annot_id", &annotation.id)?;
        tx.insert(
            Table::Annotations,
            params![
                annotation.project_id.as_str(),
                annotation.id,
                annotation.kind.as_str(),
                annotation.color,
                annotation.page_number.to_string(),
                rects,
                annotation.content,
                annotation.timestamp_added.to_string(),
                annotation.timestamp_modified.to_string(),
            ],
        )?;
        tx.commit()
    }

    /// Replaces the per-page text rows of an attachment. Pages are 1-based.
    ///
    /// An attachment without pages keeps a single empty row on page 0 so
    /// later scans see it as indexed. Search skips that row.
    pub fn upsert_attachment_pages(&self, item: &NoteId, pages: &[String]) -> IndexResult<()> {
        let item_id = item.to_string();
        let pid = item.project_id().as_str();
        let tx = self.transaction()?;
        tx.delete_matching(Table::Contents, "item_id", &item_id)?;
        if pages.is_empty() {
            tx.insert(Table::Contents, params![pid, item_id, NO_PAGES, ""])?;
        }
        for (i, text) in pages.iter().enumerate() {
            tx.insert(
                Table::Contents,
                params![pid, item_id, (i + 1).to_string(), text],
            )?;
        }
        tx.commit()
    }

    /// Replaces the complete outgoing edge set of `source`.
    ///
    /// Duplicate targets are stored once, in first-seen order.
    pub fn replace_links(&self, source: &str, targets: &[String]) -> IndexResult<()> {
        let tx = self.transaction()?;
        tx.delete_matching(Table::Links, "source", source)?;
        let mut seen: Vec<&str> = Vec::new();
        for target in targets {
            if seen.contains(&target.as_str()) {
                continue;
            }
            seen.push(target);
            tx.insert(Table::Links, params![source, target])?;
        }
        tx.commit()
    }

    // ===========================================
    // Cascading Deletes
    // ===========================================

    /// Deletes every row that references project `id`.
    ///
    /// Covers all project-keyed tables plus links whose source or target is
    /// the project or one of its items. Returns the number of rows removed.
    pub fn delete_project_rows(&self, id: &str) -> IndexResult<usize> {
        let (prefix, len) = child_prefix(id);
        let tx = self.transaction()?;
        let mut removed = 0;
        for table in PROJECT_TABLES {
            removed += tx.execute(
                &format!("DELETE FROM {} WHERE meta_id = ?1", table.name()),
                [id],
            )?;
        }
        removed += tx.execute(
            "DELETE FROM links
             WHERE source = ?1 OR substr(source, 1, ?3) = ?2
                OR target = ?1 OR substr(target, 1, ?3) = ?2",
            params![id, prefix, len],
        )?;
        tx.commit()?;
        debug!(project = id, removed, "deleted project rows");
        Ok(removed)
    }

    /// Deletes a note's row and its outgoing links.
    pub fn delete_note_rows(&self, id: &str) -> IndexResult<usize> {
        let tx = self.transaction()?;
        let mut removed = tx.delete_matching(Table::Notes, "note_id", id)?;
        removed += tx.delete_matching(Table::Links, "source", id)?;
        tx.commit()?;
        Ok(removed)
    }

    pub fn delete_annotation_rows(&self, id: &str) -> IndexResult<usize> {
        self.delete_where(Table::Annotations, "annot_id", id)
    }

    pub fn delete_attachment_rows(&self, id: &str) -> IndexResult<usize> {
        self.delete_where(Table::Contents, "item_id", id)
    }

    // ===========================================
    // Renames
    // ===========================================

    /// Moves every row of project `old` to project `new`.
    ///
    /// Note and attachment ids below the project are re-prefixed, and link
    /// endpoints are rewritten on both sides.
    pub fn rename_project_rows(&self, old: &str, new: &str) -> IndexResult<()> {
        let (prefix, len) = child_prefix(old);
        let tail = old.chars().count() as i64 + 1;
        let old_self = format!("{new}/{old}.md");
        let new_self = format!("{new}/{new}.md");

        let tx = self.transaction()?;
        for table in PROJECT_TABLES {
            tx.execute(
                &format!("UPDATE {} SET meta_id = ?2 WHERE meta_id = ?1", table.name()),
                params![old, new],
            )?;
        }
        tx.execute(
            "UPDATE notes SET note_id = ?1 || substr(note_id, ?2)
             WHERE substr(note_id, 1, ?4) = ?3",
            params![new, tail, prefix, len],
        )?;
        tx.execute(
            "UPDATE contents SET item_id = ?1 || substr(item_id, ?2)
             WHERE substr(item_id, 1, ?4) = ?3",
            params![new, tail, prefix, len],
        )?;
        for column in ["source", "target"] {
            tx.execute(
                &format!(
                    "UPDATE links SET {column} = CASE
                        WHEN {column} = ?1 THEN ?2
                        ELSE ?2 || substr({column}, ?3)
                     END
                     WHERE {column} = ?1 OR substr({column}, 1, ?5) = ?4"
                ),
                params![old, new, tail, prefix, len],
            )?;
            tx.execute(
                &format!("UPDATE links SET {column} = ?2 WHERE {column} = ?1"),
                params![old_self, new_self],
            )?;
        }
        tx.commit()
    }

    /// Renames a note's row, its extracted pages and both ends of its links.
    ///
    /// Works for attachments too, which only have page rows.
    pub fn rename_note_rows(&self, old: &str, new: &str) -> IndexResult<()> {
        let tx = self.transaction()?;
        tx.execute(
            "UPDATE notes SET note_id = ?2 WHERE note_id = ?1",
            params![old, new],
        )?;
        tx.execute(
            "UPDATE contents SET item_id = ?2 WHERE item_id = ?1",
            params![old, new],
        )?;
        tx.execute(
            "UPDATE links SET source = ?2 WHERE source = ?1",
            params![old, new],
        )?;
        tx.execute(
            "UPDATE links SET target = ?2 WHERE target = ?1",
            params![old, new],
        )?;
        tx.commit()
    }
}
