//! # renweave
//!
//! A pure-Rust engine for authoring branching NPC/player conversations as
//! a graph of typed nodes and compiling that graph into an executable
//! Ren'Py script.
//!
//! The crate is the core of a dialog editor: the editor UI, AI text
//! generation, and file storage are external collaborators that mutate
//! and read through the types here.
//!
//! ## What's Inside
//!
//! - **Graph model** - an arena of typed nodes (dialogue lines, variable
//!   mutations, backgrounds, sounds, music, branches, stage directions)
//!   with bidirectional ID edges
//! - **Graph store** - the full mutation surface plus bounded undo/redo
//!   over deep snapshots
//! - **Traversal** - conversation paths, reachable side-effect state, and
//!   accumulated variables for any node, tolerant of merge points and
//!   authored cycles
//! - **Compiler** - linear Ren'Py output with labels and jumps for shared
//!   nodes, `menu:` blocks for player fan-out, and `if`/`elif`/`else`
//!   chains for branch nodes
//!
//! ## Quick Start
//!
//! ```
//! use renweave::prelude::*;
//!
//! let mut store = GraphStore::new();
//! let hello = store.add_node(NodeKind::Dialogue {
//!     speaker: Speaker::Npc,
//!     text: "You're new here, aren't you?".into(),
//!     character_id: None,
//!     emotion: None,
//!     show_avatar: None,
//! });
//! let reply = store.add_node(NodeKind::Dialogue {
//!     speaker: Speaker::Player,
//!     text: "Just arrived this morning.".into(),
//!     character_id: None,
//!     emotion: None,
//!     show_avatar: None,
//! });
//! store.link_nodes(&hello, &reply);
//! store.save_to_history();
//!
//! let script = compile_graph(store.graph(), &StoryCatalog::new());
//! assert!(script.contains("label start:"));
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `renweave` command-line binary

pub mod error;
pub mod graph;
pub mod resolve;
pub mod compile;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::graph::{
        Character, CompareOp, DialogGraph, GraphDocument, GraphStore, Node, NodeId, NodeKind,
        NodePosition, Scene, ScriptValue, Speaker, SwitchArm, VariableOp,
        parse_document, read_document, serialize_document, write_document,
    };
    pub use crate::resolve::{
        conversation_history, effective_root, fold_variables, node_path, reachable_nodes,
        scene_descriptions,
    };
    pub use crate::compile::{
        StoryCatalog, StoryLookup, compile_document, compile_graph, sanitize_identifier,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
