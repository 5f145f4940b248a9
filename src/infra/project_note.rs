//! Parser for the project's self-describing note.
//!
//! The note is ordinary markdown followed by a `## meta` heading and a
//! fenced JSON block holding the project record:
//!
//! ````text
//! # Lasers
//! Authors: Ada Smith
//!
//! ## meta
//! ```json
//! { "_id": "smith2020", "title": "Lasers", ... }
//! ```
//! ````

use crate::domain::Project;
use thiserror::Error;

const OPEN_FENCE: &str = "```json";
const CLOSE_FENCE: &str = "```";

/// Errors while reading the embedded metadata block.
#[derive(Debug, Error)]
pub enum ProjectNoteError {
    #[error("missing opening metadata fence '```json'")]
    MissingOpeningFence,

    #[error("missing closing metadata fence '```'")]
    MissingClosingFence,

    #[error("invalid JSON in metadata block: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Returns the text between the first `` ```json `` line and the next `` ``` `` line.
pub fn metadata_block(content: &str) -> Result<String, ProjectNoteError> {
    let lines: Vec<&str> = content.lines().map(|l| l.trim_end()).collect();
    let start = lines
        .iter()
        .position(|l| *l == OPEN_FENCE)
        .ok_or(ProjectNoteError::MissingOpeningFence)?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| *l == CLOSE_FENCE)
        .map(|i| start + 1 + i)
        .ok_or(ProjectNoteError::MissingClosingFence)?;
    Ok(lines[start + 1..end].join("\n"))
}

/// Reconstructs a project from its self-describing note.
///
/// # Errors
///
/// Returns `ProjectNoteError` if either fence is missing or the block is
/// not a valid project record.
pub fn parse_project_note(content: &str) -> Result<Project, ProjectNoteError> {
    let block = metadata_block(content)?;
    Ok(serde_json::from_str(&block)?)
}

/// Renders a project as its self-describing note.
///
/// The header above `## meta` is regenerated on every save.
pub fn serialize_project_note(project: &Project) -> String {
    let json =
        serde_json::to_string_pretty(project).expect("project serialization is infallible");
    let authors: Vec<String> = project.author.iter().map(|a| a.display_name()).collect();

    let mut out = String::new();
    out.push_str("<!-- managed by folio: text above \"## meta\" is regenerated -->\n");
    out.push_str(&format!("# {}\n", project.label()));
    if !authors.is_empty() {
        out.push_str(&format!("Authors: {}\n", authors.join(", ")));
    }
    if let Some(abstract_text) = &project.abstract_text {
        out.push_str(&format!("Abstract: {}\n", abstract_text));
    }
    out.push_str("\n## meta\n");
    out.push_str(OPEN_FENCE);
    out.push('\n');
    out.push_str(&json);
    out.push('\n');
    out.push_str(CLOSE_FENCE);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Author, ProjectId};
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        let mut p = Project::new(ProjectId::new("smith2020").unwrap(), "Lasers");
        p.author.push(Author::new("Ada", "Smith"));
        p.categories = vec!["physics/optics".into()];
        p
    }

    #[test]
    fn serialized_note_parses_back() {
        let p = project();
        let text = serialize_project_note(&p);
        assert!(text.contains("# Lasers"));
        assert!(text.contains("Authors: Ada Smith"));
        assert_eq!(parse_project_note(&text).unwrap(), p);
    }

    #[test]
    fn ignores_text_around_block() {
        let text = "# Title\nsome notes\n\n## meta\n```json\n{\"_id\": \"p1\", \"title\": \"T\"}\n```\ntrailing\n";
        let p = parse_project_note(text).unwrap();
        assert_eq!(p.id.as_str(), "p1");
        assert_eq!(p.title, "T");
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let text = "## meta\r\n```json\r\n{\"_id\": \"p1\"}\r\n```\r\n";
        assert_eq!(parse_project_note(text).unwrap().id.as_str(), "p1");
    }

    #[test]
    fn missing_fences_are_errors() {
        assert!(matches!(
            parse_project_note("# only text"),
            Err(ProjectNoteError::MissingOpeningFence)
        ));
        assert!(matches!(
            parse_project_note("```json\n{}\n"),
            Err(ProjectNoteError::MissingClosingFence)
        ));
    }

    #[test]
    fn earlier_code_fence_does_not_end_block() {
        let text = "```\ncode\n```\n```json\n{\"_id\": \"p1\"}\n```\n";
        assert_eq!(parse_project_note(text).unwrap().id.as_str(), "p1");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let text = "```json\n{\"_id\": \n```\n";
        assert!(matches!(
            parse_project_note(text),
            Err(ProjectNoteError::InvalidJson(_))
        ));
    }
}
