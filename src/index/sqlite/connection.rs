//! Connection management for ContentIndex.

use super::ContentIndex;
use super::transaction::Transaction;
use crate::index::{IndexError, IndexResult, create_schema};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tracing::debug;

impl ContentIndex {
    // ===========================================
    // In-Memory Connection
    // ===========================================

    /// Opens an in-memory index with the schema created.
    pub fn open_in_memory() -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===========================================
    // File-Based Connection
    // ===========================================

    /// Opens or creates the index database at the given path.
    ///
    /// Creates parent directories if they don't exist. The schema is created
    /// when missing and left alone otherwise.
    pub fn open(path: &Path) -> IndexResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| IndexError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        debug!(path = %path.display(), "opening content index");
        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Starts a write batch; dropping it uncommitted rolls back.
    pub fn transaction(&self) -> IndexResult<Transaction<'_>> {
        Transaction::begin(&self.conn)
    }
}
