//! CLI interface for graph document inspection

use std::collections::BTreeMap;
use std::path::Path;

use crate::graph::read_document;
use crate::resolve::effective_root;

pub fn execute(source: &Path) -> anyhow::Result<()> {
    let doc = read_document(source)?;
    let (graph, positions) = doc.clone().into_graph();

    println!("Dialog: {}", doc.id);
    if let Some(scene_id) = &doc.scene_id {
        println!("Scene: {scene_id}");
    }
    println!("Nodes: {}", graph.node_count());

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for node in graph.nodes.values() {
        *by_kind.entry(node.kind.display_name()).or_default() += 1;
    }
    for (kind, count) in by_kind {
        println!("  {kind}: {count}");
    }

    match effective_root(&graph) {
        Some(root) => println!(
            "Root: {} ({})",
            root.id,
            root.dialogue_text().unwrap_or("-")
        ),
        None => println!("Root: none"),
    }

    let merge_nodes: Vec<&str> = graph
        .nodes
        .values()
        .filter(|node| node.is_dialogue() && node.parent_node_ids.len() > 1)
        .map(|node| node.id.as_str())
        .collect();
    println!("Merge nodes: {}", merge_nodes.len());
    for id in merge_nodes {
        println!("  {id}");
    }
    if !positions.is_empty() {
        println!("Layout entries: {}", positions.len());
    }

    Ok(())
}
