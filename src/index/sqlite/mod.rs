//! SQLite-backed content index.

mod connection;
mod queries;
mod transaction;
mod writes;


use rusqlite::Connection;

pub use queries::{IndexedAnnotation, IndexedNote, IndexedProject, SearchHit, snippet};
pub(crate) use queries::text_matches;
pub use transaction::Transaction;

// ===========================================
// ContentIndex Struct
// ===========================================

/// Derived, rebuildable mirror of the item store.
///
/// Every write is a delete-then-insert of whole logical rows. Deletes never
/// cascade on their own: removing a parent means calling the matching
/// `delete_*_rows` method, which enumerates every table explicitly.
pub struct ContentIndex {
    pub(crate) conn: Connection,
}
