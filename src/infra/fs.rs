//! File system helpers: text reads, atomic writes and storage walking.

use chrono::{DateTime, Utc};
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Errors during file system operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("atomic write failed for {path}: {source}")]
    AtomicWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parent directory does not exist: {path}")]
    ParentNotFound { path: PathBuf },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("invalid encoding in {path}: {encoding}")]
    InvalidEncoding { path: PathBuf, encoding: String },
}

impl FsError {
    /// Creates an appropriate FsError from an io::Error.
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path: path.into() },
            _ => FsError::Io {
                path: path.into(),
                source: error,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }
}

/// Reads a UTF-8 text file, stripping a leading byte order mark.
///
/// # Errors
///
/// Returns `FsError::NotFound` if the file doesn't exist.
/// Returns `FsError::InvalidEncoding` for UTF-16 or otherwise non-UTF-8 bytes.
pub fn read_text(path: &Path) -> Result<String, FsError> {
    let bytes = std::fs::read(path).map_err(|e| FsError::from_io(path, e))?;

    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(FsError::InvalidEncoding {
            path: path.into(),
            encoding: "UTF-16 byte order mark detected; convert to UTF-8".into(),
        });
    }

    let content = String::from_utf8(bytes).map_err(|e| FsError::InvalidEncoding {
        path: path.into(),
        encoding: format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
    })?;

    Ok(match content.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// Writes `contents` to `path` atomically via a temporary sibling file.
///
/// The parent directory must exist.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), FsError> {
    let parent = path
        .parent()
        .ok_or_else(|| FsError::ParentNotFound { path: path.into() })?;

    if !parent.exists() {
        return Err(FsError::ParentNotFound {
            path: parent.into(),
        });
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| FsError::Io {
        path: path.into(),
        source: e,
    })?;

    temp.write_all(contents).map_err(|e| FsError::Io {
        path: path.into(),
        source: e,
    })?;

    temp.persist(path).map_err(|e| FsError::AtomicWrite {
        path: path.into(),
        source: e.error,
    })?;

    Ok(())
}

/// Creates `dir` and all missing parents.
pub fn ensure_dir(dir: &Path) -> Result<(), FsError> {
    std::fs::create_dir_all(dir).map_err(|e| FsError::from_io(dir, e))
}

/// Returns the modification time of `path`.
pub fn modified_time(path: &Path) -> Result<DateTime<Utc>, FsError> {
    let meta = std::fs::metadata(path).map_err(|e| FsError::from_io(path, e))?;
    let modified = meta.modified().map_err(|e| FsError::from_io(path, e))?;
    Ok(modified.into())
}

/// Checks whether `path` exists, distinguishing "absent" from "unknown".
///
/// Returns `Err` when existence cannot be determined (permissions, I/O).
pub fn path_exists(path: &Path) -> Result<bool, FsError> {
    path.try_exists().map_err(|e| FsError::from_io(path, e))
}

/// Ensures `dir` is a readable directory.
pub fn check_readable_dir(dir: &Path) -> Result<(), FsError> {
    let meta = std::fs::metadata(dir).map_err(|e| FsError::from_io(dir, e))?;
    if !meta.is_dir() {
        return Err(FsError::NotADirectory { path: dir.into() });
    }
    std::fs::read_dir(dir).map_err(|e| FsError::from_io(dir, e))?;
    Ok(())
}

/// Lists the names of non-hidden directories directly under `root`, sorted.
pub fn list_dirs(root: &Path) -> Result<Vec<String>, FsError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|e| FsError::from_io(root, e))? {
        let entry = entry.map_err(|e| FsError::from_io(root, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| FsError::from_io(&entry.path(), e))?
            .is_dir();
        if let Some(name) = entry.file_name().to_str()
            && is_dir
            && !name.starts_with('.')
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// A file found while walking a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated.
    pub relative: String,
}

/// Walks `dir` recursively and yields regular files.
///
/// Hidden files and directories (leading `.`) are skipped, so the app's
/// `.folio/` side-file tree is never treated as project content. Entries
/// that cannot be read are logged and skipped.
///
/// # Errors
///
/// Returns `FsError::NotFound` if the directory doesn't exist.
/// Returns `FsError::NotADirectory` if the path is not a directory.
pub fn walk_files(dir: &Path) -> Result<impl Iterator<Item = WalkedFile>, FsError> {
    check_readable_dir(dir)?;

    let dir_owned = dir.to_path_buf();
    let iter = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(move |e| {
            Some(WalkedFile {
                relative: slash_relative(&dir_owned, e.path())?,
                path: e.path().to_path_buf(),
            })
        });

    Ok(iter)
}

/// Lists every non-hidden directory below `dir` as a `/`-separated relative
/// path, sorted. `dir` itself is not included.
pub fn walk_dirs(dir: &Path) -> Result<Vec<String>, FsError> {
    check_readable_dir(dir)?;

    let mut dirs: Vec<String> = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| slash_relative(dir, e.path()))
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn slash_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?
            .join("/"),
    )
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}
