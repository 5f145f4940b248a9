//! Write batches for ContentIndex.

use crate::index::{IndexResult, Table};
use rusqlite::{Connection, Params};

/// One delete-then-insert batch against the index.
///
/// Rolls back on drop unless [`Transaction::commit`] ran. This only makes a
/// single upsert atomic; the file store is never part of it.
pub struct Transaction<'a> {
    conn: &'a Connection,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(conn: &'a Connection) -> IndexResult<Self> {
        conn.execute_batch("BEGIN")?;
        Ok(Self {
            conn,
            committed: false,
        })
    }

    pub fn execute(&self, sql: &str, params: impl Params) -> IndexResult<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Inserts one full row. `params` must follow [`Table::columns`] order.
    pub fn insert(&self, table: Table, params: impl Params) -> IndexResult<usize> {
        self.execute(&insert_sql(table), params)
    }

    /// Deletes the rows of `table` whose `column` equals `value`.
    ///
    /// `column` comes from code, never from user input.
    pub fn delete_matching(&self, table: Table, column: &str, value: &str) -> IndexResult<usize> {
        debug_assert!(table.has_column(column), "{} has no column {column}", table.name());
        self.execute(
            &format!("DELETE FROM {} WHERE {column} = ?1", table.name()),
            [value],
        )
    }

    /// Empties `table`.
    pub fn clear(&self, table: Table) -> IndexResult<usize> {
        self.execute(&format!("DELETE FROM {}", table.name()), [])
    }

    pub fn commit(mut self) -> IndexResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

fn insert_sql(table: Table) -> String {
    let columns = table.columns();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders.join(", ")
    )
}
