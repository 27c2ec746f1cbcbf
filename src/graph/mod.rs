//! Dialog graph data model and mutation
//!
//! The graph is an arena of typed nodes keyed by UUID, with edges stored as
//! ID lists on both endpoints. [`GraphStore`] owns one graph and exposes
//! the full mutation surface (add/update/delete/link/unlink, cosmetic
//! positions, bounded undo/redo); [`persist`] maps a graph to and from its
//! JSON document form.
//!
//! # Usage
//!
//! ```
//! use renweave::graph::{GraphStore, NodeKind, Speaker};
//!
//! let mut store = GraphStore::new();
//! let greeting = store.add_node(NodeKind::Dialogue {
//!     speaker: Speaker::Npc,
//!     text: "Welcome to the Rusted Anchor.".into(),
//!     character_id: None,
//!     emotion: None,
//!     show_avatar: None,
//! });
//! let reply = store.add_node(NodeKind::Dialogue {
//!     speaker: Speaker::Player,
//!     text: "Just passing through.".into(),
//!     character_id: None,
//!     emotion: None,
//!     show_avatar: None,
//! });
//! store.link_nodes(&greeting, &reply);
//!
//! assert_eq!(store.graph().root_node_id.as_deref(), Some(greeting.as_str()));
//! ```

mod history;
mod store;
mod types;
pub mod persist;

pub use history::{HISTORY_LIMIT, History};
pub use store::{GraphStore, repair_root};
pub use types::{
    Character, CompareOp, DialogGraph, Node, NodeId, NodeKind, NodePosition, Scene, ScriptValue,
    Speaker, SwitchArm, VariableOp,
};
pub use persist::{
    GraphDocument, parse_document, read_document, serialize_document, write_document,
};
