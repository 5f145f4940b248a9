//! Text extraction callbacks for non-text files.
//!
//! Paginated attachments (PDF) and drawing notes carry their text in formats
//! the core does not render. A renderer supplies a [`TextExtractor`]; the
//! default one understands drawing scenes and reports attachments as empty.

use crate::infra::{FsError, read_text};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by an extractor.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Read(#[from] FsError),

    #[error("invalid drawing in {path}: {source}")]
    Drawing {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("text extraction failed for {path}: {message}")]
    Failed { path: PathBuf, message: String },
}

/// Supplies text for file types the core cannot read itself.
pub trait TextExtractor {
    /// Number of pages in a paginated attachment.
    fn page_count(&self, path: &Path) -> Result<u32, ExtractError>;

    /// Text of page `page` (1-based) of a paginated attachment.
    fn extract_page_text(&self, path: &Path, page: u32) -> Result<String, ExtractError>;

    /// Text elements of a drawing note, one per line.
    fn extract_drawing_text(&self, path: &Path) -> Result<String, ExtractError> {
        let content = read_text(path)?;
        drawing_text(&content).map_err(|source| ExtractError::Drawing {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Text of every page, in order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        (1..=self.page_count(path)?)
            .map(|page| self.extract_page_text(path, page))
            .collect()
    }
}

/// Extractor without PDF support: attachments have no pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExtractor;

impl TextExtractor for DefaultExtractor {
    fn page_count(&self, _path: &Path) -> Result<u32, ExtractError> {
        Ok(0)
    }

    fn extract_page_text(&self, path: &Path, page: u32) -> Result<String, ExtractError> {
        Err(ExtractError::Failed {
            path: path.to_path_buf(),
            message: format!("no page text available for page {page}"),
        })
    }
}

#[derive(Deserialize)]
struct Scene {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Element {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    text: String,
}

/// Joins the live text elements of a drawing scene with newlines.
pub fn drawing_text(scene: &str) -> Result<String, serde_json::Error> {
    let scene: Scene = serde_json::from_str(scene)?;
    Ok(scene
        .elements
        .into_iter()
        .filter(|e| e.kind == "text" && !e.is_deleted)
        .map(|e| e.text)
        .collect::<Vec<_>>()
        .join("\n"))
}
