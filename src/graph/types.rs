//! Dialog graph data types
//!
//! A dialog is a graph of typed nodes keyed by UUID. Edges are stored as ID
//! lists on both endpoints (`child_node_ids` / `parent_node_ids`), which
//! keeps the structure an arena: mutation is always "ID lookup + field
//! replace", and cycles cost nothing because no node owns another.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node identifier - a UUID rendered as text.
pub type NodeId = String;

/// Who speaks a dialogue line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// A non-player character line.
    Npc,
    /// A player line (choice caption or spoken response).
    Player,
}

/// A literal value carried by variable and condition nodes.
///
/// Authors type these into the editor, so the same field may hold a number,
/// a flag, or free text. Values that fail numeric coercion are treated as
/// string literals rather than errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Free text (may still be a numeral typed as text).
    Text(String),
}

impl ScriptValue {
    /// Coerce to a number. `Text` parses leniently; `Bool` does not coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            ScriptValue::Text(s) => s.trim().parse().ok(),
            ScriptValue::Bool(_) => None,
        }
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::Text(s.to_string())
    }
}

/// Arithmetic applied by a `ChangeVariable` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableOp {
    Add,
    Subtract,
}

impl VariableOp {
    /// The compound-assignment operator this emits in script output.
    pub fn symbol(self) -> &'static str {
        match self {
            VariableOp::Add => "+=",
            VariableOp::Subtract => "-=",
        }
    }
}

/// Comparison operator of an `IfStatement` node.
///
/// Serialized as the operator symbol itself, matching what the condition
/// editor stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        }
    }
}

/// One arm of a `SwitchCase` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchArm {
    /// The value this arm matches against.
    pub value: ScriptValue,
    /// Branch entry node, when wired up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
}

/// Node payload, discriminated by `kind`.
///
/// `Dialogue` is the only speaker-bearing kind. Every other kind is a
/// side-effect node: it mutates variables or the presentation environment
/// but represents no spoken line, and conversation-path traversal treats it
/// as transparent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeKind {
    /// A spoken line.
    #[serde(rename_all = "camelCase")]
    Dialogue {
        speaker: Speaker,
        text: String,
        /// Character record backing this line, when cast.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character_id: Option<String>,
        /// Emotion tag for the avatar sprite.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emotion: Option<String>,
        /// Whether the avatar sprite is shown alongside the line.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        show_avatar: Option<bool>,
    },
    /// Unconditional variable assignment.
    SetVariable { name: String, value: ScriptValue },
    /// Arithmetic variable mutation. An unset variable counts as `0`.
    ChangeVariable {
        name: String,
        op: VariableOp,
        value: ScriptValue,
    },
    /// Background image change.
    SetBackground { image: String },
    /// One-shot sound effect.
    PlaySound { file: String },
    /// Music change with optional fades (seconds).
    #[serde(rename_all = "camelCase")]
    SetMusic {
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fade_in: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fade_out: Option<f64>,
    },
    /// Two-way branch. Children are ordered `[true_branch, false_branch]`
    /// and either may be absent.
    IfStatement {
        variable: String,
        operator: CompareOp,
        value: ScriptValue,
    },
    /// Multi-way branch over declared case values, in declared order.
    SwitchCase {
        variable: String,
        cases: Vec<SwitchArm>,
    },
    /// Stage direction. Compiles to a script comment, never a spoken line.
    SceneDescription { text: String },
}

impl NodeKind {
    /// Display-friendly name for UI and diagnostics.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::Dialogue { .. } => "Dialogue",
            NodeKind::SetVariable { .. } => "Set Variable",
            NodeKind::ChangeVariable { .. } => "Change Variable",
            NodeKind::SetBackground { .. } => "Set Background",
            NodeKind::PlaySound { .. } => "Play Sound",
            NodeKind::SetMusic { .. } => "Set Music",
            NodeKind::IfStatement { .. } => "If Statement",
            NodeKind::SwitchCase { .. } => "Switch Case",
            NodeKind::SceneDescription { .. } => "Scene Description",
        }
    }
}

/// A single dialog node: shared identity fields plus a kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Outgoing edges. Every entry must be mirrored in the child's
    /// `parent_node_ids`.
    #[serde(default)]
    pub child_node_ids: Vec<NodeId>,
    /// Incoming edges. Every entry must be mirrored in the parent's
    /// `child_node_ids`.
    #[serde(default)]
    pub parent_node_ids: Vec<NodeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Kind-specific payload, flattened into the node object under `kind`.
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// Create an unlinked node with fresh timestamps.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            child_node_ids: Vec::new(),
            parent_node_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            kind,
        }
    }

    /// Whether this node is a spoken line.
    pub fn is_dialogue(&self) -> bool {
        matches!(self.kind, NodeKind::Dialogue { .. })
    }

    /// Whether this node is a side-effect node (any non-dialogue kind).
    pub fn is_side_effect(&self) -> bool {
        !self.is_dialogue()
    }

    /// Whether this node compiles to conditional control flow.
    pub fn is_branch(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::IfStatement { .. } | NodeKind::SwitchCase { .. }
        )
    }

    /// The speaker, for dialogue nodes.
    pub fn speaker(&self) -> Option<Speaker> {
        match &self.kind {
            NodeKind::Dialogue { speaker, .. } => Some(*speaker),
            _ => None,
        }
    }

    /// The spoken text, for dialogue nodes.
    pub fn dialogue_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Dialogue { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Cosmetic editor coordinates for a node. Kept in a side-table, never
/// invariant-bearing, never part of undo history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// The canonical dialog graph: a root pointer plus an arena of nodes.
///
/// Insertion order of the node map is preserved through serialization, so
/// traversal and fallback-root selection are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogGraph {
    /// Entry point of the conversation. Conventionally has no parents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_node_id: Option<NodeId>,
    /// All nodes, indexed by ID.
    #[serde(default)]
    pub nodes: IndexMap<NodeId, Node>,
}

impl DialogGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a node by ID.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The node the stored root points at, if valid.
    pub fn root(&self) -> Option<&Node> {
        self.root_node_id.as_deref().and_then(|id| self.nodes.get(id))
    }

    /// Count total nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve a node's children, skipping dangling references.
    pub fn children_of<'a>(&'a self, node: &Node) -> Vec<&'a Node> {
        node.child_node_ids
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Resolve a node's parents, skipping dangling references.
    pub fn parents_of<'a>(&'a self, node: &Node) -> Vec<&'a Node> {
        node.parent_node_ids
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }
}

/// A character record, owned by external storage and referenced by ID from
/// dialogue nodes. Name and personality are used verbatim (escaped) in
/// compiled declarations and AI prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    /// Create a character with fresh timestamps.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            personality: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A scene record, owned by external storage and referenced by ID from the
/// graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scene {
    /// Create a scene with fresh timestamps.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
