//! File I/O and the self-describing project note format

mod fs;
mod project_note;

pub use fs::{
    FsError, WalkedFile, check_readable_dir, ensure_dir, list_dirs, modified_time, path_exists,
    read_text, walk_dirs, walk_files, write_atomic,
};
pub use project_note::{
    ProjectNoteError, metadata_block, parse_project_note, serialize_project_note,
};
