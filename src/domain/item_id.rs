//! Path-shaped identifiers for projects and notes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use ulid::Ulid;

/// Identifier of a project.
///
/// A project id doubles as the name of the project's folder under the
/// storage root, so it must be a single, non-hidden path segment.
///
/// # Examples
///
/// ```
/// use folio::domain::ProjectId;
///
/// let id = ProjectId::new("smith2020").unwrap();
/// assert_eq!(id.as_str(), "smith2020");
/// assert!(ProjectId::new("a/b").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(String);

/// Error returned when parsing an invalid item id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseItemIdError(String);

impl fmt::Display for ParseItemIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseItemIdError {}

/// Checks that `segment` can be used as a single file name under the root.
pub(crate) fn validate_segment(segment: &str, what: &str) -> Result<(), ParseItemIdError> {
    if segment.trim().is_empty() {
        return Err(ParseItemIdError(format!("{what} cannot be empty")));
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err(ParseItemIdError(format!(
            "{what} '{segment}' cannot contain path separators"
        )));
    }
    if segment.starts_with('.') {
        return Err(ParseItemIdError(format!(
            "{what} '{segment}' cannot start with '.'"
        )));
    }
    Ok(())
}

impl ProjectId {
    /// Creates a project id, rejecting empty, hidden or multi-segment values.
    pub fn new(id: &str) -> Result<Self, ParseItemIdError> {
        validate_segment(id, "project id")?;
        Ok(Self(id.to_string()))
    }

    /// Generates a fresh id of the form `P<ULID>`.
    pub fn generate() -> Self {
        Self(format!("P{}", Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the project's folder under `root`.
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }

    /// Returns the path of the project's self-describing note under `root`.
    pub fn self_note_path(&self, root: &Path) -> PathBuf {
        self.dir(root).join(format!("{}.md", self.0))
    }

    /// Returns the id of the project's self-describing note.
    pub fn self_note_id(&self) -> NoteId {
        NoteId {
            project: self.clone(),
            path: format!("{}.md", self.0),
        }
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectId(\"{}\")", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = ParseItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ProjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a note: `<projectId>/<relative path>`.
///
/// The relative path always uses `/` separators and keeps the file
/// extension, so `smith2020/drafts/summary.md` names the file
/// `<root>/smith2020/drafts/summary.md`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId {
    project: ProjectId,
    path: String,
}

impl NoteId {
    /// Creates a note id from its project and a path relative to the project folder.
    pub fn new(project: &ProjectId, relative: &str) -> Result<Self, ParseItemIdError> {
        let mut segments = Vec::new();
        for segment in relative.split(['/', '\\']) {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(ParseItemIdError(format!(
                        "note path '{relative}' cannot leave its project folder"
                    )));
                }
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Err(ParseItemIdError("note path cannot be empty".to_string()));
        }
        Ok(Self {
            project: project.clone(),
            path: segments.join("/"),
        })
    }

    /// Builds a note id from a file path below `root`.
    ///
    /// Returns `None` when the file is not inside a project folder.
    pub fn from_path(root: &Path, file: &Path) -> Option<Self> {
        let relative = file.strip_prefix(root).ok()?;
        let mut components = relative.components();
        let project = components.next()?.as_os_str().to_str()?;
        let rest: Vec<&str> = components
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        if rest.is_empty() {
            return None;
        }
        let project = ProjectId::new(project).ok()?;
        Self::new(&project, &rest.join("/")).ok()
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project
    }

    /// Path relative to the project folder, `/`-separated.
    pub fn relative_path(&self) -> &str {
        &self.path
    }

    /// Last path segment, including the extension.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File extension without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rfind('.')
            .filter(|&i| i > 0)
            .map(|i| &name[i + 1..])
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(i) if i > 0 => &name[..i],
            _ => name,
        }
    }

    /// Returns true if this is the project's self-describing note.
    pub fn is_self_note(&self) -> bool {
        self.path == format!("{}.md", self.project)
    }

    /// Absolute file location under `root`.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        self.path
            .split('/')
            .fold(self.project.dir(root), |acc, seg| acc.join(seg))
    }

    /// Returns a sibling id with the stem replaced and the extension kept.
    pub fn with_stem(&self, stem: &str) -> Result<Self, ParseItemIdError> {
        validate_segment(stem, "note name")?;
        let file_name = match self.extension() {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        };
        let relative = match self.path.rfind('/') {
            Some(i) => format!("{}/{}", &self.path[..i], file_name),
            None => file_name,
        };
        Self::new(&self.project, &relative)
    }

    /// Returns a sibling id with the last segment replaced by `name`.
    pub fn with_file_name(&self, name: &str) -> Result<Self, ParseItemIdError> {
        validate_segment(name, "name")?;
        let relative = match self.path.rfind('/') {
            Some(i) => format!("{}/{}", &self.path[..i], name),
            None => name.to_string(),
        };
        Self::new(&self.project, &relative)
    }

    /// Returns true if `self` lies strictly below the folder `folder`.
    pub fn is_inside(&self, folder: &NoteId) -> bool {
        self.project == folder.project
            && self
                .path
                .strip_prefix(folder.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Moves an id below folder `from` to the same place below `onto`.
    ///
    /// Returns `None` if `self` is not inside `from`.
    pub fn rebase(&self, from: &NoteId, onto: &NoteId) -> Option<Self> {
        if !self.is_inside(from) {
            return None;
        }
        let rest = &self.path[from.path.len()..];
        Some(Self {
            project: onto.project.clone(),
            path: format!("{}{}", onto.path, rest),
        })
    }

    /// Returns the same relative path under another project.
    pub fn with_project(&self, project: &ProjectId) -> Self {
        let path = if self.is_self_note() {
            format!("{project}.md")
        } else {
            self.path.clone()
        };
        Self {
            project: project.clone(),
            path,
        }
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.path)
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId(\"{}\")", self)
    }
}

impl FromStr for NoteId {
    type Err = ParseItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (project, rest) = s
            .split_once('/')
            .ok_or_else(|| ParseItemIdError(format!("note id '{s}' has no project prefix")))?;
        Self::new(&ProjectId::new(project)?, rest)
    }
}

impl Serialize for NoteId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What kind of item an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Project,
    Note,
    Annotation,
    /// A link target that names no existing item.
    Unresolved,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Project => "project",
            ItemKind::Note => "note",
            ItemKind::Annotation => "annotation",
            ItemKind::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
