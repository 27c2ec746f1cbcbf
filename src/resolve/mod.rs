//! Conversation traversal over an immutable graph snapshot
//!
//! Pure read-only functions: nothing here mutates the graph, nothing
//! panics, and nothing errors. An unreachable or unknown target yields an
//! empty collection. The functions answer the questions the editor and the
//! AI-prompt builder keep asking: "how did the conversation get to this
//! node, and what state has accumulated along the way?"
//!
//! A target may sit behind a merge point (several parents) or inside an
//! authored cycle, so path finding first walks *backward* from the target
//! toward the root over a reverse adjacency map with a visited-set cycle
//! guard, then falls back to a forward search from the root when parent
//! links are disconnected.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::graph::{DialogGraph, Node, NodeId, NodeKind, ScriptValue, VariableOp};

/// Resolve the root for read-only callers, mirroring the wholesale-load
/// repair policy: the stored pointer when valid, else the first parentless
/// node in map order.
pub fn effective_root(graph: &DialogGraph) -> Option<&Node> {
    if let Some(root) = graph.root() {
        return Some(root);
    }
    graph.nodes.values().find(|node| node.parent_node_ids.is_empty())
}

/// The sequence of node IDs from the root to `target_id`, following real
/// edges. Returns `[]` when no path exists.
pub fn node_path(graph: &DialogGraph, target_id: &str) -> Vec<NodeId> {
    let Some(root) = effective_root(graph) else {
        return Vec::new();
    };
    if !graph.nodes.contains_key(target_id) {
        return Vec::new();
    }
    if root.id == target_id {
        return vec![root.id.clone()];
    }

    // Reverse adjacency (child -> parents) built from child lists, which
    // are the authoritative edge direction.
    let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
    for (id, node) in &graph.nodes {
        for child in &node.child_node_ids {
            if graph.nodes.contains_key(child.as_str()) {
                reverse.entry(child.as_str()).or_default().push(id.as_str());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut path = Vec::new();
    if walk_backward(target_id, &root.id, &reverse, &mut visited, &mut path) {
        path.reverse();
        return path.into_iter().map(String::from).collect();
    }

    // Disconnected parent data: forward depth-first search from the root.
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    if walk_forward(graph, &root.id, target_id, &mut visited, &mut path) {
        return path;
    }
    Vec::new()
}

fn walk_backward<'a>(
    current: &'a str,
    root_id: &str,
    reverse: &HashMap<&str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> bool {
    path.push(current);
    if current == root_id {
        return true;
    }
    visited.insert(current);
    if let Some(parents) = reverse.get(current) {
        for parent in parents {
            if !visited.contains(parent)
                && walk_backward(parent, root_id, reverse, visited, path)
            {
                return true;
            }
        }
    }
    path.pop();
    false
}

fn walk_forward(
    graph: &DialogGraph,
    current: &str,
    target_id: &str,
    visited: &mut HashSet<NodeId>,
    path: &mut Vec<NodeId>,
) -> bool {
    path.push(current.to_string());
    if current == target_id {
        return true;
    }
    visited.insert(current.to_string());
    if let Some(node) = graph.nodes.get(current) {
        for child in &node.child_node_ids {
            if graph.nodes.contains_key(child.as_str())
                && !visited.contains(child.as_str())
                && walk_forward(graph, child, target_id, visited, path)
            {
                return true;
            }
        }
    }
    path.pop();
    false
}

/// The conversation as spoken: [`node_path`] restricted to dialogue nodes.
/// Side-effect nodes on the path are invisible to this sequence.
pub fn conversation_history<'a>(graph: &'a DialogGraph, target_id: &str) -> Vec<&'a Node> {
    node_path(graph, target_id)
        .iter()
        .filter_map(|id| graph.nodes.get(id.as_str()))
        .filter(|node| node.is_dialogue())
        .collect()
}

/// Everything that has happened by the time the conversation reaches
/// `target_id`: the path nodes in path order, then the side-effect nodes
/// hanging off each path node (direct children and parents, plus one
/// further hop of side-effect neighbors for effect-of-effect chains),
/// grouped in the order their owning path node is visited.
pub fn reachable_nodes<'a>(graph: &'a DialogGraph, target_id: &str) -> Vec<&'a Node> {
    let path = node_path(graph, target_id);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out: Vec<&Node> = Vec::new();

    for id in &path {
        if let Some(node) = graph.nodes.get(id.as_str()) {
            if seen.insert(&node.id) {
                out.push(node);
            }
        }
    }

    for id in &path {
        let Some(node) = graph.nodes.get(id.as_str()) else {
            continue;
        };
        let mut cluster: Vec<&Node> = Vec::new();
        collect_effect_neighbors(graph, node, &mut seen, &mut cluster);
        let direct = cluster.len();
        for i in 0..direct {
            let effect = cluster[i];
            let mut second: Vec<&Node> = Vec::new();
            collect_effect_neighbors(graph, effect, &mut seen, &mut second);
            cluster.extend(second);
        }
        out.extend(cluster);
    }
    out
}

/// Side-effect children (in child order) then side-effect parents of
/// `node` that have not been collected yet.
fn collect_effect_neighbors<'a>(
    graph: &'a DialogGraph,
    node: &Node,
    seen: &mut HashSet<&'a str>,
    into: &mut Vec<&'a Node>,
) {
    let neighbors = node.child_node_ids.iter().chain(node.parent_node_ids.iter());
    for id in neighbors {
        if let Some(neighbor) = graph.nodes.get(id.as_str()) {
            if neighbor.is_side_effect() && seen.insert(&neighbor.id) {
                into.push(neighbor);
            }
        }
    }
}

/// Fold variable state over the reachable set, in order. `SetVariable`
/// overwrites unconditionally; `ChangeVariable` treats an unset variable
/// as `0` and leaves non-numeric state untouched.
pub fn fold_variables(graph: &DialogGraph, target_id: &str) -> IndexMap<String, ScriptValue> {
    let mut vars: IndexMap<String, ScriptValue> = IndexMap::new();
    for node in reachable_nodes(graph, target_id) {
        match &node.kind {
            NodeKind::SetVariable { name, value } => {
                vars.insert(name.clone(), value.clone());
            }
            NodeKind::ChangeVariable { name, op, value } => {
                let Some(delta) = value.as_number() else {
                    continue;
                };
                let current = match vars.get(name) {
                    None => 0.0,
                    Some(ScriptValue::Number(n)) => *n,
                    Some(_) => continue,
                };
                let next = match op {
                    VariableOp::Add => current + delta,
                    VariableOp::Subtract => current - delta,
                };
                vars.insert(name.clone(), ScriptValue::Number(next));
            }
            _ => {}
        }
    }
    vars
}

/// Text of every `SceneDescription` in the reachable set, in order.
pub fn scene_descriptions(graph: &DialogGraph, target_id: &str) -> Vec<String> {
    reachable_nodes(graph, target_id)
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::SceneDescription { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphStore, Speaker};

    fn dialogue(speaker: Speaker, text: &str) -> NodeKind {
        NodeKind::Dialogue {
            speaker,
            text: text.into(),
            character_id: None,
            emotion: None,
            show_avatar: None,
        }
    }

    /// root -> a -> b, with a SetVariable hanging off `a` and a PlaySound
    /// hanging off that (effect-of-effect).
    fn linear_store() -> (GraphStore, NodeId, NodeId, NodeId) {
        let mut store = GraphStore::new();
        let root = store.add_node(dialogue(Speaker::Npc, "root"));
        let a = store.add_node(dialogue(Speaker::Player, "a"));
        let b = store.add_node(dialogue(Speaker::Npc, "b"));
        store.link_nodes(&root, &a);
        store.link_nodes(&a, &b);

        let set = store.add_node(NodeKind::SetVariable {
            name: "trust".into(),
            value: ScriptValue::Number(2.0),
        });
        store.link_nodes(&a, &set);
        let sound = store.add_node(NodeKind::PlaySound { file: "ding.ogg".into() });
        store.link_nodes(&set, &sound);

        (store, root, a, b)
    }

    #[test]
    fn test_path_to_root_is_root() {
        let (store, root, _, _) = linear_store();
        assert_eq!(node_path(store.graph(), &root), vec![root]);
    }

    #[test]
    fn test_path_follows_real_edges() {
        let (store, root, a, b) = linear_store();
        assert_eq!(node_path(store.graph(), &b), vec![root, a, b]);
    }

    #[test]
    fn test_unknown_target_yields_empty() {
        let (store, _, _, _) = linear_store();
        assert!(node_path(store.graph(), "ghost").is_empty());
        assert!(reachable_nodes(store.graph(), "ghost").is_empty());
        assert!(fold_variables(store.graph(), "ghost").is_empty());
    }

    #[test]
    fn test_path_through_merge_point() {
        let mut store = GraphStore::new();
        let root = store.add_node(dialogue(Speaker::Npc, "root"));
        let left = store.add_node(dialogue(Speaker::Player, "left"));
        let right = store.add_node(dialogue(Speaker::Player, "right"));
        let shared = store.add_node(dialogue(Speaker::Npc, "shared"));
        store.link_nodes(&root, &left);
        store.link_nodes(&root, &right);
        store.link_nodes(&left, &shared);
        store.link_nodes(&right, &shared);

        let path = node_path(store.graph(), &shared);
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], root);
        assert_eq!(path[2], shared);
        assert!(path[1] == left || path[1] == right);
    }

    #[test]
    fn test_path_terminates_in_cycle() {
        let mut store = GraphStore::new();
        let hub = store.add_node(dialogue(Speaker::Npc, "hub"));
        let spoke = store.add_node(dialogue(Speaker::Player, "spoke"));
        let tail = store.add_node(dialogue(Speaker::Npc, "tail"));
        store.link_nodes(&hub, &spoke);
        store.link_nodes(&spoke, &hub);
        store.link_nodes(&spoke, &tail);

        let path = node_path(store.graph(), &tail);
        assert_eq!(path, vec![hub, spoke, tail]);
    }

    #[test]
    fn test_conversation_history_is_dialogue_only() {
        let (store, _, _, b) = linear_store();
        let history = conversation_history(store.graph(), &b);
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|node| node.is_dialogue()));
    }

    #[test]
    fn test_reachable_set_includes_effect_of_effect() {
        let (store, root, a, b) = linear_store();
        let reachable = reachable_nodes(store.graph(), &b);
        let ids: Vec<&str> = reachable.iter().map(|n| n.id.as_str()).collect();

        // Path nodes first, in path order.
        assert_eq!(&ids[..3], &[root.as_str(), a.as_str(), b.as_str()]);
        // Then the SetVariable attached to `a`, then the PlaySound one hop
        // further down the effect chain.
        assert!(matches!(reachable[3].kind, NodeKind::SetVariable { .. }));
        assert!(matches!(reachable[4].kind, NodeKind::PlaySound { .. }));
    }

    #[test]
    fn test_fold_variables_empty_without_setters() {
        let mut store = GraphStore::new();
        let root = store.add_node(dialogue(Speaker::Npc, "root"));
        let next = store.add_node(dialogue(Speaker::Npc, "next"));
        store.link_nodes(&root, &next);
        assert!(fold_variables(store.graph(), &next).is_empty());
    }

    #[test]
    fn test_fold_variables_set_then_change() {
        let (store, _, _, b) = linear_store();
        let mut store = store;
        let change = store.add_node(NodeKind::ChangeVariable {
            name: "trust".into(),
            op: VariableOp::Add,
            value: ScriptValue::Number(3.0),
        });
        store.link_nodes(&b, &change);

        let vars = fold_variables(store.graph(), &b);
        assert_eq!(vars["trust"], ScriptValue::Number(5.0));
    }

    #[test]
    fn test_change_on_unset_variable_counts_from_zero() {
        let mut store = GraphStore::new();
        let root = store.add_node(dialogue(Speaker::Npc, "root"));
        let change = store.add_node(NodeKind::ChangeVariable {
            name: "gold".into(),
            op: VariableOp::Add,
            value: ScriptValue::Number(5.0),
        });
        store.link_nodes(&root, &change);

        let vars = fold_variables(store.graph(), &root);
        assert_eq!(vars["gold"], ScriptValue::Number(5.0));
    }

    #[test]
    fn test_change_leaves_non_numeric_state_untouched() {
        let mut store = GraphStore::new();
        let root = store.add_node(dialogue(Speaker::Npc, "root"));
        let set = store.add_node(NodeKind::SetVariable {
            name: "mood".into(),
            value: ScriptValue::Text("grim".into()),
        });
        let change = store.add_node(NodeKind::ChangeVariable {
            name: "mood".into(),
            op: VariableOp::Add,
            value: ScriptValue::Number(1.0),
        });
        store.link_nodes(&root, &set);
        store.link_nodes(&set, &change);

        let vars = fold_variables(store.graph(), &root);
        assert_eq!(vars["mood"], ScriptValue::Text("grim".into()));
    }

    #[test]
    fn test_scene_descriptions_in_order() {
        let mut store = GraphStore::new();
        let root = store.add_node(dialogue(Speaker::Npc, "root"));
        let first = store.add_node(NodeKind::SceneDescription {
            text: "A storm rolls in.".into(),
        });
        let next = store.add_node(dialogue(Speaker::Npc, "next"));
        let second = store.add_node(NodeKind::SceneDescription {
            text: "Thunder, closer now.".into(),
        });
        store.link_nodes(&root, &first);
        store.link_nodes(&root, &next);
        store.link_nodes(&next, &second);

        let scenes = scene_descriptions(store.graph(), &next);
        assert_eq!(scenes, vec!["A storm rolls in.", "Thunder, closer now."]);
    }

    #[test]
    fn test_effective_root_falls_back_to_parentless() {
        let mut store = GraphStore::new();
        let root = store.add_node(dialogue(Speaker::Npc, "root"));
        let child = store.add_node(dialogue(Speaker::Npc, "child"));
        store.link_nodes(&root, &child);

        let mut graph = store.graph().clone();
        graph.root_node_id = Some("ghost".into());
        assert_eq!(effective_root(&graph).unwrap().id, root);
    }
}
