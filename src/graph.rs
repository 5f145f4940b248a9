//! Link graph over notes and the items they reference.

use crate::domain::{Edge, ItemKind, NoteId, ProjectId, extract_link_targets};
use crate::index::{ContentIndex, IndexError};
use crate::store::{ItemStore, StoreError};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// A node of a rendered graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: ItemKind,
    /// Owning project of a note or annotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Nodes and edges around one item, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Maintains the `links` table and answers graph-shaped queries.
pub struct LinkGraphEngine<'a> {
    index: &'a ContentIndex,
    store: &'a ItemStore,
}

impl<'a> LinkGraphEngine<'a> {
    pub fn new(index: &'a ContentIndex, store: &'a ItemStore) -> Self {
        Self { index, store }
    }

    /// Replaces the outgoing edges of `source` with the links found in `content`.
    ///
    /// Returns the distinct targets that were stored.
    pub fn replace_forward_links(&self, source: &NoteId, content: &str) -> GraphResult<Vec<String>> {
        let targets = extract_link_targets(content);
        self.index.replace_links(&source.to_string(), &targets)?;
        debug!(note = %source, links = targets.len(), "replaced forward links");
        Ok(targets)
    }

    /// Link targets of a note, or of every note of a project.
    ///
    /// Note targets keep their stored order; project targets are sorted.
    pub fn forward_links(&self, item: &str) -> GraphResult<Vec<String>> {
        if self.kind_of(item)? != ItemKind::Project {
            return Ok(self.index.links_from(item)?);
        }
        let mut targets = Vec::new();
        for note in self.project_notes(item)? {
            targets.extend(self.index.links_from(&note)?);
        }
        targets.sort();
        targets.dedup();
        Ok(targets)
    }

    /// Builds the graph around `item`.
    ///
    /// The item's cluster is always present: the item, its parent project
    /// and that project's notes. Every edge with the item as source or
    /// target is added together with the clusters of both endpoints.
    /// Targets naming no item become `Unresolved` nodes.
    pub fn graph(&self, item: &str) -> GraphResult<Graph> {
        let mut builder = GraphBuilder::default();
        self.add_cluster(&mut builder, item)?;

        let mut edges: Vec<Edge> = self
            .index
            .links_from(item)?
            .into_iter()
            .map(|target| Edge::new(item, target))
            .collect();
        edges.extend(
            self.index
                .links_to(item)?
                .into_iter()
                .map(|source| Edge::new(source, item)),
        );

        for edge in edges {
            if !builder.add_edge(edge.clone()) {
                continue;
            }
            self.add_cluster(&mut builder, &edge.source)?;
            self.add_cluster(&mut builder, &edge.target)?;
        }
        Ok(builder.graph)
    }

    /// Classifies an id using the index first, then the store.
    pub fn kind_of(&self, id: &str) -> GraphResult<ItemKind> {
        if self.index.has_project(id)? {
            return Ok(ItemKind::Project);
        }
        if self.index.has_note(id)? || self.index.has_attachment(id)? {
            return Ok(ItemKind::Note);
        }
        if self.index.has_annotation(id)? {
            return Ok(ItemKind::Annotation);
        }
        Ok(self.store.resolve(id).unwrap_or(ItemKind::Unresolved))
    }

    fn add_cluster(&self, builder: &mut GraphBuilder, id: &str) -> GraphResult<()> {
        if builder.contains(id) {
            return Ok(());
        }
        let kind = self.kind_of(id)?;
        let parent = match kind {
            ItemKind::Project => {
                builder.add_node(self.project_node(id)?);
                for note in self.project_notes(id)? {
                    builder.add_node(note_node(&note));
                }
                return Ok(());
            }
            ItemKind::Note => {
                let node = note_node(id);
                let parent = node.parent.clone();
                builder.add_node(node);
                parent
            }
            ItemKind::Annotation => {
                let node = self.annotation_node(id)?;
                let parent = node.parent.clone();
                builder.add_node(node);
                parent
            }
            ItemKind::Unresolved => {
                builder.add_node(GraphNode {
                    id: id.to_string(),
                    label: id.to_string(),
                    kind,
                    parent: None,
                });
                return Ok(());
            }
        };
        match parent {
            Some(parent) => self.add_project_cluster(builder, &parent),
            None => Ok(()),
        }
    }

    /// Adds a parent project and its notes. Notes already present stay as they are.
    fn add_project_cluster(&self, builder: &mut GraphBuilder, project: &str) -> GraphResult<()> {
        if !builder.contains(project) {
            builder.add_node(self.project_node(project)?);
        }
        for note in self.project_notes(project)? {
            builder.add_node(note_node(&note));
        }
        Ok(())
    }

    /// Note ids of a project, from the index or else the store.
    fn project_notes(&self, project: &str) -> GraphResult<Vec<String>> {
        let notes: Vec<String> = self
            .index
            .notes_of_project(project)?
            .into_iter()
            .map(|n| n.id)
            .collect();
        if !notes.is_empty() {
            return Ok(notes);
        }
        let Ok(pid) = ProjectId::new(project) else {
            return Ok(notes);
        };
        match self.store.list_notes(&pid) {
            Ok(notes) => Ok(notes.iter().map(|n| n.id().to_string()).collect()),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn project_node(&self, id: &str) -> GraphResult<GraphNode> {
        let title = match self.index.get_project(id)? {
            Some(project) => Some(project.title),
            None => ProjectId::new(id)
                .ok()
                .and_then(|pid| self.store.read_project(&pid).ok())
                .map(|p| p.title),
        };
        let label = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| id.to_string());
        Ok(GraphNode {
            id: id.to_string(),
            label,
            kind: ItemKind::Project,
            parent: None,
        })
    }

    fn annotation_node(&self, id: &str) -> GraphResult<GraphNode> {
        let (kind, parent) = match self.index.get_annotation(id)? {
            Some(annotation) => (annotation.kind, annotation.project_id),
            None => {
                let annotation = self.store.read_annotation(id)?;
                (
                    annotation.kind.as_str().to_string(),
                    annotation.project_id.to_string(),
                )
            }
        };
        Ok(GraphNode {
            id: id.to_string(),
            label: kind,
            kind: ItemKind::Annotation,
            parent: Some(parent),
        })
    }
}

fn note_node(id: &str) -> GraphNode {
    match id.parse::<NoteId>() {
        Ok(note) => GraphNode {
            id: id.to_string(),
            label: note.file_name().replace("%20", " "),
            kind: ItemKind::Note,
            parent: Some(note.project_id().to_string()),
        },
        Err(_) => GraphNode {
            id: id.to_string(),
            label: id.to_string(),
            kind: ItemKind::Note,
            parent: None,
        },
    }
}

#[derive(Default)]
struct GraphBuilder {
    graph: Graph,
    node_ids: HashSet<String>,
    edge_keys: HashSet<Edge>,
}

impl GraphBuilder {
    fn contains(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    fn add_node(&mut self, node: GraphNode) {
        if self.node_ids.insert(node.id.clone()) {
            self.graph.nodes.push(node);
        }
    }

    /// Returns false if the edge was already present.
    fn add_edge(&mut self, edge: Edge) -> bool {
        if !self.edge_keys.insert(edge.clone()) {
            return false;
        }
        self.graph.edges.push(edge);
        true
    }
}
