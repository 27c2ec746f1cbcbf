//! Graph store: canonical dialog graph plus mutation operations
//!
//! All mutations are synchronous and atomic against the in-memory graph.
//! Preconditions that fail (operating on a missing node) are silent no-ops
//! favoring editor robustness; every mutator returns whether it changed
//! anything so callers that need confirmation can check.

use indexmap::IndexMap;
use uuid::Uuid;

use super::history::History;
use super::types::{DialogGraph, Node, NodeId, NodeKind, NodePosition};

/// Owns a dialog graph, its cosmetic layout table, and bounded undo/redo
/// history. One store per open dialog; multiple stores coexist in-process.
///
/// The store provides no locking. Callers serialize mutation calls; the
/// intended host is a single-threaded editor event loop that performs all
/// async work (AI calls, file pickers) outside any mutation.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: DialogGraph,
    positions: IndexMap<NodeId, NodePosition>,
    history: History,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the live graph.
    pub fn graph(&self) -> &DialogGraph {
        &self.graph
    }

    /// Read-only view of the layout side-table.
    pub fn positions(&self) -> &IndexMap<NodeId, NodePosition> {
        &self.positions
    }

    /// Get a node by ID.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.graph.nodes.get(id)
    }

    /// Insert a new node with a generated ID and fresh timestamps.
    /// Becomes the root if no root is set. Returns the new ID.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let node = Node::new(Uuid::new_v4().to_string(), kind);
        let id = node.id.clone();
        self.graph.nodes.insert(id.clone(), node);
        if self.graph.root_node_id.is_none() {
            self.graph.root_node_id = Some(id.clone());
        }
        id
    }

    /// Apply an in-place update to a node and bump its `updated_at`.
    /// Silent no-op (returns `false`) if the ID is absent.
    pub fn update_node(&mut self, id: &str, update: impl FnOnce(&mut Node)) -> bool {
        let Some(node) = self.graph.nodes.get_mut(id) else {
            return false;
        };
        update(node);
        node.updated_at = chrono::Utc::now();
        true
    }

    /// Remove a node, rewiring every neighbor's edge lists before the node
    /// itself goes away. Silent no-op if the ID is absent.
    pub fn delete_node(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.nodes.shift_remove(id) else {
            return false;
        };
        for parent_id in &node.parent_node_ids {
            if let Some(parent) = self.graph.nodes.get_mut(parent_id) {
                parent.child_node_ids.retain(|c| c != id);
            }
        }
        for child_id in &node.child_node_ids {
            if let Some(child) = self.graph.nodes.get_mut(child_id) {
                child.parent_node_ids.retain(|p| p != id);
            }
        }
        if self.graph.root_node_id.as_deref() == Some(id) {
            self.graph.root_node_id = None;
        }
        self.positions.shift_remove(id);
        true
    }

    /// Insert an edge in both directions. Idempotent; no-op on missing
    /// endpoints or self-links.
    pub fn link_nodes(&mut self, parent_id: &str, child_id: &str) -> bool {
        if parent_id == child_id
            || !self.graph.nodes.contains_key(parent_id)
            || !self.graph.nodes.contains_key(child_id)
        {
            return false;
        }
        let parent = &mut self.graph.nodes[parent_id];
        if parent.child_node_ids.iter().any(|c| c == child_id) {
            return false;
        }
        parent.child_node_ids.push(child_id.to_string());
        self.graph.nodes[child_id]
            .parent_node_ids
            .push(parent_id.to_string());
        true
    }

    /// Remove an edge in both directions. Idempotent; no-op on missing
    /// endpoints or an absent edge.
    pub fn unlink_nodes(&mut self, parent_id: &str, child_id: &str) -> bool {
        if !self.graph.nodes.contains_key(parent_id) || !self.graph.nodes.contains_key(child_id) {
            return false;
        }
        let parent = &mut self.graph.nodes[parent_id];
        let before = parent.child_node_ids.len();
        parent.child_node_ids.retain(|c| c != child_id);
        let removed = parent.child_node_ids.len() != before;
        self.graph.nodes[child_id]
            .parent_node_ids
            .retain(|p| p != parent_id);
        removed
    }

    /// Merge cosmetic layout coordinates. Never affects graph shape.
    pub fn update_node_positions(
        &mut self,
        positions: impl IntoIterator<Item = (NodeId, NodePosition)>,
    ) {
        for (id, position) in positions {
            self.positions.insert(id, position);
        }
    }

    /// Push a deep copy of the current graph onto the history ring.
    pub fn save_to_history(&mut self) {
        self.history.save(&self.graph);
    }

    /// Replace the live graph with the previous snapshot. No-op at the
    /// boundary; returns whether anything happened.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.graph) {
            Some(snapshot) => {
                self.graph = snapshot;
                true
            }
            None => false,
        }
    }

    /// Replace the live graph with the next snapshot. No-op at the
    /// boundary; returns whether anything happened.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.graph = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of snapshots currently held.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Replace the graph wholesale (import path) and repair the root.
    pub fn load_graph(&mut self, graph: DialogGraph) {
        tracing::debug!("loading graph wholesale ({} nodes)", graph.node_count());
        self.graph = graph;
        repair_root(&mut self.graph);
    }

    /// Replace the layout side-table wholesale.
    pub fn load_positions(&mut self, positions: IndexMap<NodeId, NodePosition>) {
        self.positions = positions;
    }
}

/// Root-repair policy for wholesale loads: clear a dangling root pointer;
/// when no root is set but nodes exist, select the first parentless node in
/// map order. Map order is insertion order, so the pick is deterministic.
pub fn repair_root(graph: &mut DialogGraph) {
    if let Some(root_id) = &graph.root_node_id {
        if !graph.nodes.contains_key(root_id) {
            tracing::debug!("clearing dangling root {root_id}");
            graph.root_node_id = None;
        }
    }
    if graph.root_node_id.is_none() && !graph.nodes.is_empty() {
        graph.root_node_id = graph
            .nodes
            .values()
            .find(|node| node.parent_node_ids.is_empty())
            .map(|node| node.id.clone());
        if let Some(root_id) = &graph.root_node_id {
            tracing::debug!("repaired root to {root_id}");
        }
    }
}
