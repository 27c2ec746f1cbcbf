//! Graph document persistence
//!
//! The storage collaborator owns the bytes; this module owns the shape. A
//! dialog persists as a single JSON object with camelCase keys, optional
//! fields omitted when unset, and node kinds discriminated by a `kind`
//! string. Key order is preserved end to end.

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use super::store::{GraphStore, repair_root};
use super::types::{DialogGraph, Node, NodeId, NodePosition};

/// Serialized form of one dialog: the graph plus its editor metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    /// Unique identifier for this dialog.
    pub id: String,
    /// Primary character this dialog belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    /// Entry point of the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_node_id: Option<NodeId>,
    /// All dialog nodes, indexed by ID.
    #[serde(default)]
    pub nodes: IndexMap<NodeId, Node>,
    /// Cosmetic layout coordinates.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub node_positions: IndexMap<NodeId, NodePosition>,
    /// Scene this dialog plays in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GraphDocument {
    /// Create an empty document with fresh timestamps.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            character_id: None,
            root_node_id: None,
            nodes: IndexMap::new(),
            node_positions: IndexMap::new(),
            scene_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Capture a store's live state into a document.
    pub fn from_store(id: impl Into<String>, store: &GraphStore) -> Self {
        let graph = store.graph();
        let mut doc = Self::new(id);
        doc.root_node_id = graph.root_node_id.clone();
        doc.nodes = graph.nodes.clone();
        doc.node_positions = store.positions().clone();
        doc
    }

    /// Split into the graph (with root repair applied) and the layout
    /// side-table.
    pub fn into_graph(self) -> (DialogGraph, IndexMap<NodeId, NodePosition>) {
        let mut graph = DialogGraph {
            root_node_id: self.root_node_id,
            nodes: self.nodes,
        };
        repair_root(&mut graph);
        (graph, self.node_positions)
    }

    /// Load this document into a store, replacing its state.
    pub fn into_store(self) -> GraphStore {
        let mut store = GraphStore::new();
        let (graph, positions) = self.into_graph();
        store.load_graph(graph);
        store.load_positions(positions);
        store
    }
}

/// Parse a graph document from a JSON string.
pub fn parse_document(content: &str) -> Result<GraphDocument> {
    Ok(serde_json::from_str(content)?)
}

/// Read a graph document from a file path.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<GraphDocument> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let doc = parse_document(&content)?;
    tracing::debug!("read graph document {} ({} nodes)", doc.id, doc.nodes.len());
    Ok(doc)
}

/// Serialize a graph document to pretty-printed JSON.
pub fn serialize_document(doc: &GraphDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Write a graph document to disk.
pub fn write_document<P: AsRef<Path>>(doc: &GraphDocument, path: P) -> Result<()> {
    let json = serialize_document(doc)?;
    std::fs::write(path, json)?;
    Ok(())
}
