//! Script compilation
//!
//! Converts a rooted dialog graph into linear Ren'Py script text. The
//! graph may contain merge points (shared nodes with several parents) and
//! authored cycles ("return to hub"), neither of which can be inlined into
//! a linear script; shared nodes become labeled blocks reached by jumps,
//! branch nodes expand into nested conditionals, and player fan-out
//! collapses into choice menus.
//!
//! Compilation is read-only over the graph, always terminates, and always
//! produces syntactically valid output for a graph with a valid root:
//! dangling references are skipped, unresolvable values degrade to string
//! literals or comments, and empty branches are kept well-formed with
//! `pass`.
//!
//! # Usage
//!
//! ```
//! use renweave::compile::{StoryCatalog, compile_graph};
//! use renweave::graph::{Character, GraphStore, NodeKind, Speaker};
//!
//! let mut store = GraphStore::new();
//! store.add_node(NodeKind::Dialogue {
//!     speaker: Speaker::Npc,
//!     text: "Mind the step.".into(),
//!     character_id: Some("keeper".into()),
//!     emotion: None,
//!     show_avatar: None,
//! });
//!
//! let mut catalog = StoryCatalog::new();
//! catalog.add_character(Character::new("keeper", "Tavern Keeper"));
//!
//! let script = compile_graph(store.graph(), &catalog);
//! assert!(script.contains("define tavern_keeper = Character(\"Tavern Keeper\")"));
//! assert!(script.contains("label start:"));
//! ```

mod sanitize;
mod script;

use std::collections::HashMap;

use crate::graph::{Character, GraphDocument, Scene};

pub use sanitize::{escape_text, sanitize_identifier};
pub use script::compile_graph;

/// Lookup seam to the character/scene storage collaborators. The compiler
/// only ever reads records by ID; a miss degrades the affected line rather
/// than failing compilation.
pub trait StoryLookup {
    /// Resolve a character record by ID.
    fn character(&self, id: &str) -> Option<&Character>;
    /// Resolve a scene record by ID.
    fn scene(&self, id: &str) -> Option<&Scene>;
}

/// In-memory [`StoryLookup`] backed by plain maps. The default catalog for
/// tests and the CLI; editor hosts with real storage implement the trait
/// directly.
#[derive(Debug, Clone, Default)]
pub struct StoryCatalog {
    characters: HashMap<String, Character>,
    scenes: HashMap<String, Scene>,
}

impl StoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of character records held.
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.scenes.is_empty()
    }

    /// Add or replace a character record.
    pub fn add_character(&mut self, character: Character) {
        self.characters.insert(character.id.clone(), character);
    }

    /// Add or replace a scene record.
    pub fn add_scene(&mut self, scene: Scene) {
        self.scenes.insert(scene.id.clone(), scene);
    }
}

impl StoryLookup for StoryCatalog {
    fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }
}

/// Compile a persisted graph document.
///
/// Convenience wrapper over [`compile_graph`] that applies the wholesale
/// root-repair policy before compiling.
pub fn compile_document(doc: GraphDocument, lookup: &dyn StoryLookup) -> String {
    let (graph, _positions) = doc.into_graph();
    compile_graph(&graph, lookup)
}
