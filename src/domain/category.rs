//! Hierarchical category paths and the tree derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `/`-separated category path such as `physics/optics/lasers`.
///
/// Categories are not stored on their own: a category exists only as a
/// literal entry in some project's category list, or as an ancestor of one.
///
/// # Normalization
/// - Surrounding whitespace is trimmed, per path and per segment
/// - Leading, trailing and repeated slashes are dropped
///
/// Segment text is otherwise free-form (spaces, unicode, punctuation).
///
/// # Examples
///
/// ```
/// use folio::domain::CategoryPath;
///
/// let path = CategoryPath::new("physics/optics/lasers").unwrap();
/// assert_eq!(path.depth(), 3);
/// assert_eq!(path.label(), "lasers");
/// assert_eq!(path.parent().unwrap().to_string(), "physics/optics");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryPath {
    path: String,
    segments: Vec<String>,
}

/// Error returned when parsing an invalid category path.
#[derive(Debug, Clone)]
pub struct ParseCategoryError(String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseCategoryError {}

impl CategoryPath {
    /// Creates a category path, normalizing slashes and whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ParseCategoryError` if nothing is left after normalization.
    pub fn new(path: &str) -> Result<Self, ParseCategoryError> {
        let segments: Vec<String> = path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(ParseCategoryError(
                "category path cannot be empty".to_string(),
            ));
        }

        Ok(Self::from_segments(segments))
    }

    fn from_segments(segments: Vec<String>) -> Self {
        Self {
            path: segments.join("/"),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, used as the display label in the tree.
    pub fn label(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Returns the parent path, or `None` for a root-level category.
    pub fn parent(&self) -> Option<CategoryPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self::from_segments(
            self.segments[..self.segments.len() - 1].to_vec(),
        ))
    }

    /// Returns every prefix of this path, from the root down to itself.
    pub fn prefixes(&self) -> Vec<CategoryPath> {
        (1..=self.segments.len())
            .map(|i| Self::from_segments(self.segments[..i].to_vec()))
            .collect()
    }

    /// Returns whether this path is a strict ancestor of `other`.
    ///
    /// Matching happens at segment boundaries: `a/c` is an ancestor of
    /// `a/c/d` but not of `a/cd`.
    pub fn is_ancestor_of(&self, other: &CategoryPath) -> bool {
        self.segments.len() < other.segments.len() && self.covers(other)
    }

    /// Returns whether `other` is this path or one of its descendants.
    pub fn covers(&self, other: &CategoryPath) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// Replaces the `from` prefix of this path with `onto`.
    ///
    /// Returns `None` when `from` does not cover this path.
    pub fn rebase(&self, from: &CategoryPath, onto: &CategoryPath) -> Option<CategoryPath> {
        if !from.covers(self) {
            return None;
        }
        let mut segments = onto.segments.clone();
        segments.extend_from_slice(&self.segments[from.segments.len()..]);
        Some(Self::from_segments(segments))
    }

    /// Appends a single segment path below this one.
    pub fn join(&self, child: &CategoryPath) -> CategoryPath {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(&child.segments);
        Self::from_segments(segments)
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl fmt::Debug for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CategoryPath(\"{}\")", self.path)
    }
}

impl FromStr for CategoryPath {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for CategoryPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.path)
    }
}

impl<'de> Deserialize<'de> for CategoryPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ===========================================
// Category Tree
// ===========================================

/// A node of the category tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub label: String,
    pub path: String,
    /// True if some project lists this exact path.
    pub member: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}

/// A display tree built on demand from flat category path strings.
///
/// Every prefix of every input path becomes a node. Siblings are sorted by
/// label. Blank inputs are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTree {
    pub roots: Vec<CategoryNode>,
}

impl CategoryTree {
    pub fn build<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut roots: Vec<CategoryNode> = Vec::new();
        for raw in paths {
            let Ok(path) = CategoryPath::new(raw) else {
                continue;
            };
            let mut level = &mut roots;
            let prefixes = path.prefixes();
            let last = prefixes.len() - 1;
            for (i, prefix) in prefixes.into_iter().enumerate() {
                let pos = match level.iter().position(|n| n.path == prefix.as_str()) {
                    Some(pos) => pos,
                    None => {
                        level.push(CategoryNode {
                            label: prefix.label().to_string(),
                            path: prefix.to_string(),
                            member: false,
                            children: Vec::new(),
                        });
                        level.len() - 1
                    }
                };
                if i == last {
                    level[pos].member = true;
                }
                level = &mut level[pos].children;
            }
        }
        sort_nodes(&mut roots);
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Finds the node for `path`, if it exists in the tree.
    pub fn find(&self, path: &str) -> Option<&CategoryNode> {
        let path = CategoryPath::new(path).ok()?;
        let mut level = &self.roots;
        let mut found = None;
        for prefix in path.prefixes() {
            let node = level.iter().find(|n| n.path == prefix.as_str())?;
            level = &node.children;
            found = Some(node);
        }
        found
    }

    /// All node paths in depth-first display order.
    pub fn all_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        walk(&self.roots, &mut |n| out.push(n.path.clone()));
        out
    }

    /// Paths that are literal project categories, in display order.
    pub fn members(&self) -> Vec<String> {
        let mut out = Vec::new();
        walk(&self.roots, &mut |n| {
            if n.member {
                out.push(n.path.clone());
            }
        });
        out
    }
}

fn sort_nodes(nodes: &mut [CategoryNode]) {
    nodes.sort_by(|a, b| a.label.cmp(&b.label));
    for node in nodes {
        sort_nodes(&mut node.children);
    }
}

fn walk(nodes: &[CategoryNode], visit: &mut impl FnMut(&CategoryNode)) {
    for node in nodes {
        visit(node);
        walk(&node.children, visit);
    }
}
