//! Workspace descriptor persisted outside the workspace.

use crate::infra::{FsError, ensure_dir, read_text, write_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the descriptor location.
pub const CONFIG_ENV: &str = "FOLIO_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: FsError,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: FsError,
    },
}

/// The active storage root, its scan mark and the roots used before.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,

    /// High-water mark of the last completed scan of `storage_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scan_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub storage_paths: Vec<PathBuf>,
}

impl WorkspaceConfig {
    /// Returns the descriptor location.
    ///
    /// Default: `<config dir>/folio/workspace.toml`, overridden by `FOLIO_CONFIG`.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
            .join("workspace.toml")
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads the descriptor, returning the default if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match read_text(path) {
            Ok(contents) => contents,
            Err(e) if e.is_not_found() => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Writes the descriptor atomically, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string(self)?;
        let write = |path: &Path| -> Result<(), FsError> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            write_atomic(path, contents.as_bytes())
        };
        write(path).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "saved workspace config");
        Ok(())
    }

    /// Resolves the storage root.
    ///
    /// Precedence order:
    /// 1. CLI `--dir` argument
    /// 2. Config file `storage_path` setting
    /// 3. Current working directory
    pub fn storage_root(&self, cli_dir: Option<&Path>) -> PathBuf {
        cli_dir
            .map(Path::to_path_buf)
            .or_else(|| self.storage_path.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// The scan mark, if it belongs to `root`.
    pub fn mark_for(&self, root: &Path) -> Option<DateTime<Utc>> {
        let stored = self.storage_path.as_deref()?;
        same_path(stored, root).then_some(self.last_scan_time).flatten()
    }

    /// Makes `root` the active workspace and stores its scan mark.
    pub fn record_scan(&mut self, root: &Path, mark: Option<DateTime<Utc>>) {
        let root = canonical(root);
        if !self.storage_paths.iter().any(|p| same_path(p, &root)) {
            self.storage_paths.push(root.clone());
        }
        self.storage_path = Some(root);
        self.last_scan_time = mark;
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn same_path(a: &Path, b: &Path) -> bool {
    canonical(a) == canonical(b)
}
