//! Bounded undo/redo history
//!
//! Snapshots are full deep copies of the graph. A snapshot never shares
//! structure with the live graph, so later mutation cannot corrupt stored
//! state. History is linear: saving after an undo discards the orphaned
//! "future" entries.

use super::types::DialogGraph;

/// Maximum number of snapshots retained. Saving past this evicts the
/// oldest entry and shifts the current index down by one.
pub const HISTORY_LIMIT: usize = 50;

/// Append-only ring of graph snapshots with a current index.
#[derive(Debug, Clone, Default)]
pub struct History {
    snapshots: Vec<DialogGraph>,
    /// Index of the snapshot matching (or most recently behind) the live
    /// graph. Only meaningful while `snapshots` is non-empty.
    index: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots currently held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the current snapshot.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.index + 1 < self.snapshots.len()
    }

    /// Push a deep copy of `graph`, truncating any redo entries beyond the
    /// current index and evicting the oldest snapshot past the cap.
    pub fn save(&mut self, graph: &DialogGraph) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.index + 1);
        }
        self.snapshots.push(graph.clone());
        if self.snapshots.len() > HISTORY_LIMIT {
            self.snapshots.remove(0);
        }
        self.index = self.snapshots.len() - 1;
    }

    /// Step back one snapshot and return a deep copy of it, or `None` at
    /// the boundary.
    ///
    /// When the live graph has unsaved edits past the current snapshot,
    /// those edits are captured first so a following [`redo`](Self::redo)
    /// restores them.
    pub fn undo(&mut self, live: &DialogGraph) -> Option<DialogGraph> {
        if self.snapshots.is_empty() {
            return None;
        }
        if *live != self.snapshots[self.index] {
            self.save(live);
        }
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.snapshots[self.index].clone())
    }

    /// Step forward one snapshot and return a deep copy of it, or `None`
    /// at the boundary.
    pub fn redo(&mut self) -> Option<DialogGraph> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.snapshots[self.index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{Node, NodeKind};

    fn graph_with_node(id: &str) -> DialogGraph {
        let mut graph = DialogGraph::new();
        let node = Node::new(id, NodeKind::SceneDescription { text: id.into() });
        graph.nodes.insert(node.id.clone(), node);
        graph.root_node_id = Some(id.into());
        graph
    }

    #[test]
    fn test_undo_at_boundary_is_noop() {
        let mut history = History::new();
        let graph = graph_with_node("a");
        assert!(history.undo(&graph).is_none());

        history.save(&graph);
        assert!(history.undo(&graph).is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_restores_saved_snapshot_and_redo_restores_edits() {
        let mut history = History::new();
        let before = graph_with_node("a");
        history.save(&before);

        let mut after = before.clone();
        let extra = Node::new("b", NodeKind::SceneDescription { text: "b".into() });
        after.nodes.insert(extra.id.clone(), extra);

        let undone = history.undo(&after).expect("undo");
        assert_eq!(undone, before);

        let redone = history.redo().expect("redo");
        assert_eq!(redone, after);
    }

    #[test]
    fn test_save_truncates_redo_entries() {
        let mut history = History::new();
        let a = graph_with_node("a");
        let b = graph_with_node("b");
        history.save(&a);
        history.save(&b);

        history.undo(&b).expect("undo to a");
        assert!(history.can_redo());

        let c = graph_with_node("c");
        history.save(&c);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_cap_evicts_oldest_and_shifts_index() {
        let mut history = History::new();
        for i in 0..HISTORY_LIMIT {
            history.save(&graph_with_node(&format!("n{i}")));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.current_index(), HISTORY_LIMIT - 1);

        history.save(&graph_with_node("overflow"));
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.current_index(), HISTORY_LIMIT - 1);

        // The oldest snapshot is gone: undoing all the way back lands on
        // the second-oldest save, not the first.
        let mut live = graph_with_node("overflow");
        while let Some(snapshot) = history.undo(&live) {
            live = snapshot;
        }
        assert_eq!(live.root_node_id.as_deref(), Some("n1"));
    }
}
