//! Content index: SQLite FTS5 mirror of the item store, and the scanner that fills it

mod error;
mod reindex;
mod schema;
mod sqlite;

pub use error::{IndexError, IndexResult};
pub use reindex::{
    CancelFlag, FileResult, NoopReporter, ProgressReporter, ReindexError, Reindexer, ScanError,
    ScanReport,
};
pub use schema::{Table, create_schema, get_schema_version};
pub use sqlite::{
    ContentIndex, IndexedAnnotation, IndexedNote, IndexedProject, SearchHit, Transaction, snippet,
};
pub(crate) use sqlite::text_matches;
