//! Integration tests for the graph store: mutation, edges, undo/redo.

use pretty_assertions::assert_eq;
use renweave::graph::HISTORY_LIMIT;
use renweave::prelude::*;

fn npc(text: &str) -> NodeKind {
    NodeKind::Dialogue {
        speaker: Speaker::Npc,
        text: text.into(),
        character_id: None,
        emotion: None,
        show_avatar: None,
    }
}

#[test]
fn link_then_unlink_restores_edge_lists() {
    let mut store = GraphStore::new();
    let a = store.add_node(npc("a"));
    let b = store.add_node(npc("b"));
    let c = store.add_node(npc("c"));
    store.link_nodes(&a, &b);

    let a_children = store.get_node(&a).unwrap().child_node_ids.clone();
    let c_parents = store.get_node(&c).unwrap().parent_node_ids.clone();

    assert!(store.link_nodes(&a, &c));
    assert!(store.unlink_nodes(&a, &c));

    assert_eq!(store.get_node(&a).unwrap().child_node_ids, a_children);
    assert_eq!(store.get_node(&c).unwrap().parent_node_ids, c_parents);
}

#[test]
fn undo_restores_pre_mutation_state_and_redo_restores_post() {
    let mut store = GraphStore::new();
    let a = store.add_node(npc("a"));
    store.save_to_history();
    let before = store.graph().clone();

    let b = store.add_node(npc("b"));
    store.link_nodes(&a, &b);
    let after = store.graph().clone();
    assert_ne!(before, after);

    assert!(store.undo());
    assert_eq!(*store.graph(), before);

    assert!(store.redo());
    assert_eq!(*store.graph(), after);
}

#[test]
fn undo_and_redo_are_noops_at_boundaries() {
    let mut store = GraphStore::new();
    assert!(!store.undo());
    assert!(!store.redo());

    store.add_node(npc("a"));
    store.save_to_history();
    assert!(!store.undo());
    assert!(!store.redo());
}

#[test]
fn saving_after_undo_discards_future_snapshots() {
    let mut store = GraphStore::new();
    store.add_node(npc("a"));
    store.save_to_history();
    store.add_node(npc("b"));
    store.save_to_history();

    assert!(store.undo());
    assert!(store.can_redo());

    store.add_node(npc("c"));
    store.save_to_history();
    assert!(!store.can_redo());
    assert!(!store.redo());
}

#[test]
fn history_never_exceeds_limit() {
    let mut store = GraphStore::new();
    for i in 0..(HISTORY_LIMIT + 10) {
        store.add_node(npc(&format!("n{i}")));
        store.save_to_history();
        assert!(store.history_len() <= HISTORY_LIMIT);
    }
    assert_eq!(store.history_len(), HISTORY_LIMIT);

    // The oldest snapshots were evicted: undoing to the boundary leaves a
    // graph that already holds the first eleven nodes.
    while store.undo() {}
    assert_eq!(store.graph().node_count(), 11);
}

#[test]
fn snapshots_are_independent_of_later_mutation() {
    let mut store = GraphStore::new();
    let a = store.add_node(npc("original"));
    store.save_to_history();

    store.update_node(&a, |node| {
        if let NodeKind::Dialogue { text, .. } = &mut node.kind {
            *text = "rewritten".into();
        }
    });

    assert!(store.undo());
    assert_eq!(
        store.get_node(&a).unwrap().dialogue_text(),
        Some("original")
    );
}

#[test]
fn document_round_trip_through_store() {
    let mut store = GraphStore::new();
    let a = store.add_node(npc("a"));
    let b = store.add_node(npc("b"));
    store.link_nodes(&a, &b);
    store.update_node_positions([(a.clone(), NodePosition { x: 3.0, y: 4.0 })]);

    let doc = GraphDocument::from_store("dlg-rt", &store);
    let json = serialize_document(&doc).unwrap();
    let restored = parse_document(&json).unwrap().into_store();

    assert_eq!(restored.graph(), store.graph());
    assert_eq!(restored.positions(), store.positions());
}
