//! Category tree construction and bulk category edits.
//!
//! Categories have no rows of their own. Every edit rewrites the category
//! lists of the affected projects, first in the store and then in the
//! index. The two writes are independent; a rescan reconciles them if the
//! second one is lost.

use crate::domain::{CategoryPath, CategoryTree, ParseCategoryError, ProjectId};
use crate::extract::TextExtractor;
use crate::index::{ContentIndex, IndexError};
use crate::read::{ReadError, ReadPath};
use crate::store::{ItemStore, StoreError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("invalid category: {0}")]
    Invalid(#[from] ParseCategoryError),

    #[error("cannot move category '{drag}' into itself or its descendant '{drop}'")]
    MoveIntoSelf { drag: String, drop: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Read(#[from] ReadError),
}

pub type CategoryResult<T> = Result<T, CategoryError>;

/// An edit applied to every project's category list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOp {
    /// Replaces entries equal to `from`. Descendants are left alone.
    Rename { from: CategoryPath, to: CategoryPath },
    /// Drops the path and every descendant.
    Delete(CategoryPath),
    /// Re-parents the `drag` subtree below `drop`.
    MoveInto { drag: CategoryPath, drop: CategoryPath },
}

impl CategoryOp {
    /// Validates and builds a move.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::MoveIntoSelf` if `drop` is `drag` or lies below it.
    pub fn move_into(drag: CategoryPath, drop: CategoryPath) -> CategoryResult<Self> {
        if drag.covers(&drop) {
            return Err(CategoryError::MoveIntoSelf {
                drag: drag.to_string(),
                drop: drop.to_string(),
            });
        }
        Ok(CategoryOp::MoveInto { drag, drop })
    }

    /// Applies the edit to one category list.
    ///
    /// Returns `None` if the list is unchanged. Entries that are not valid
    /// paths are kept verbatim; duplicates produced by the edit collapse.
    pub fn apply(&self, categories: &[String]) -> Option<Vec<String>> {
        let mut out: Vec<String> = Vec::with_capacity(categories.len());
        for entry in categories {
            let next = match CategoryPath::new(entry) {
                Ok(path) => self.apply_one(&path).map(|p| p.map(|p| p.to_string())),
                Err(_) => None,
            };
            let value = match next {
                Some(Some(value)) => value,
                Some(None) => continue,
                None => entry.clone(),
            };
            if !out.contains(&value) {
                out.push(value);
            }
        }
        (out.as_slice() != categories).then_some(out)
    }

    /// `None` keeps the entry, `Some(None)` drops it, `Some(Some(p))` replaces it.
    fn apply_one(&self, path: &CategoryPath) -> Option<Option<CategoryPath>> {
        match self {
            CategoryOp::Rename { from, to } => (path == from).then(|| Some(to.clone())),
            CategoryOp::Delete(target) => target.covers(path).then_some(None),
            CategoryOp::MoveInto { drag, drop } => {
                let onto = drop.join(&CategoryPath::new(drag.label()).ok()?);
                path.rebase(drag, &onto).map(Some)
            }
        }
    }
}

pub struct CategoryPathManager<'a> {
    index: &'a ContentIndex,
    store: &'a ItemStore,
    extractor: &'a dyn TextExtractor,
}

impl<'a> CategoryPathManager<'a> {
    pub fn new(
        index: &'a ContentIndex,
        store: &'a ItemStore,
        extractor: &'a dyn TextExtractor,
    ) -> Self {
        Self {
            index,
            store,
            extractor,
        }
    }

    /// Builds the display tree from every distinct category string.
    pub fn build_tree(&self) -> CategoryResult<CategoryTree> {
        let categories = ReadPath::new(self.index, self.store, self.extractor).categories()?;
        Ok(CategoryTree::build(categories.iter().map(String::as_str)))
    }

    pub fn rename(&self, old: &str, new: &str) -> CategoryResult<Vec<ProjectId>> {
        self.apply(CategoryOp::Rename {
            from: CategoryPath::new(old)?,
            to: CategoryPath::new(new)?,
        })
    }

    pub fn delete(&self, path: &str) -> CategoryResult<Vec<ProjectId>> {
        self.apply(CategoryOp::Delete(CategoryPath::new(path)?))
    }

    pub fn move_into(&self, drag: &str, drop: &str) -> CategoryResult<Vec<ProjectId>> {
        self.apply(CategoryOp::move_into(
            CategoryPath::new(drag)?,
            CategoryPath::new(drop)?,
        )?)
    }

    /// Applies `op` to every project and returns the ids that changed.
    pub fn apply(&self, op: CategoryOp) -> CategoryResult<Vec<ProjectId>> {
        let mut changed = Vec::new();
        for mut project in self.store.list_projects()? {
            let Some(categories) = op.apply(&project.categories) else {
                continue;
            };
            project.set_categories(categories);
            let id = project.id.clone();
            self.store.update_project(&id, &project)?;
            self.index.replace_categories(&id, &project.categories)?;
            debug!(project = %id, categories = ?project.categories, "updated categories");
            changed.push(id);
        }
        info!(op = ?op, projects = changed.len(), "applied category edit");
        Ok(changed)
    }
}
