//! Ren'Py script emission
//!
//! A three-phase state machine over the rooted graph:
//!
//! 1. analysis - one reachability walk collects referenced variables,
//!    cast character IDs, and merge nodes (dialogue nodes with more than
//!    one parent, which cannot be inlined twice),
//! 2. declarations - `define` lines and `$ name = 0` initializations so
//!    conditionals never touch an undefined variable,
//! 3. emission - a depth-first walk from the root that inlines linear
//!    continuations, collapses player fan-out into `menu:` blocks, expands
//!    branch nodes into `if`/`elif`/`else` chains, and reaches every merge
//!    node through `jump`; each merge node's body is emitted exactly once
//!    as its own top-level `label` block.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::graph::{DialogGraph, Node, NodeId, NodeKind, ScriptValue, Speaker};
use crate::resolve::effective_root;

use super::StoryLookup;
use super::sanitize::{escape_text, sanitize_identifier};

/// Compile a rooted graph into Ren'Py script text.
///
/// Never fails: a graph without a resolvable root compiles to an empty
/// (but valid) script, and malformed subgraphs degrade locally.
pub fn compile_graph(graph: &DialogGraph, lookup: &dyn StoryLookup) -> String {
    tracing::info!("compiling dialog graph ({} nodes)", graph.node_count());

    let Some(root) = effective_root(graph) else {
        tracing::debug!("no resolvable root; emitting empty script");
        let mut emitter = ScriptEmitter::new(graph, lookup);
        emitter.line(0, "label start:");
        emitter.line(1, "return");
        return emitter.out;
    };

    let mut emitter = ScriptEmitter::new(graph, lookup);
    emitter.analyze(root);
    tracing::debug!(
        "analysis: {} variables, {} characters, {} merge nodes",
        emitter.variables.len(),
        emitter.char_vars.len(),
        emitter.labels.len()
    );
    emitter.emit(root);
    tracing::debug!("emitted {} bytes", emitter.out.len());
    emitter.out
}

struct ScriptEmitter<'a> {
    graph: &'a DialogGraph,
    lookup: &'a dyn StoryLookup,
    out: String,
    /// Character ID -> script variable, in encounter order.
    char_vars: IndexMap<String, String>,
    /// Merge node -> label name, in encounter order.
    labels: IndexMap<NodeId, String>,
    /// Sanitized variable names, in encounter order.
    variables: IndexSet<String>,
    /// Side-effect nodes already rendered anywhere in the output. A node
    /// visited via more than one traversal branch is never duplicated.
    emitted_effects: HashSet<NodeId>,
    /// Dialogue nodes on the active traversal stack (cycle guard).
    stack: Vec<NodeId>,
    /// Whether any reachable player line lacks a castable character.
    needs_player_define: bool,
}

impl<'a> ScriptEmitter<'a> {
    fn new(graph: &'a DialogGraph, lookup: &'a dyn StoryLookup) -> Self {
        Self {
            graph,
            lookup,
            out: String::new(),
            char_vars: IndexMap::new(),
            labels: IndexMap::new(),
            variables: IndexSet::new(),
            emitted_effects: HashSet::new(),
            stack: Vec::new(),
            needs_player_define: false,
        }
    }

    // ==================== Phase 1+2: analysis ====================

    /// Preorder walk of everything reachable from the root, collecting
    /// variables, cast characters, and merge nodes.
    fn analyze(&mut self, root: &'a Node) {
        let graph = self.graph;
        let mut used_chars: HashSet<String> = HashSet::from(["player".to_string()]);
        let mut used_labels: HashSet<String> = HashSet::from(["start".to_string()]);
        let mut visited: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&Node> = vec![root];

        while let Some(node) = pending.pop() {
            if !visited.insert(&node.id) {
                continue;
            }
            match &node.kind {
                NodeKind::Dialogue {
                    speaker,
                    text,
                    character_id,
                    ..
                } => {
                    match character_id.as_deref().and_then(|id| self.lookup.character(id)) {
                        Some(character) => {
                            if !self.char_vars.contains_key(&character.id) {
                                let var = unique_name(
                                    &ident_or(&character.name, "npc"),
                                    &mut used_chars,
                                );
                                self.char_vars.insert(character.id.clone(), var);
                            }
                        }
                        None => {
                            if *speaker == Speaker::Player {
                                self.needs_player_define = true;
                            }
                        }
                    }
                    let parent_count = graph.parents_of(node).len();
                    let is_cycle_root = node.id == root.id && parent_count > 0;
                    if parent_count > 1 || is_cycle_root {
                        let base = label_base(text);
                        let label = unique_name(&base, &mut used_labels);
                        self.labels.insert(node.id.clone(), label);
                    }
                }
                NodeKind::SetVariable { name, .. } | NodeKind::ChangeVariable { name, .. } => {
                    self.variables.insert(ident_or(name, "var"));
                }
                NodeKind::IfStatement { variable, .. } => {
                    self.variables.insert(ident_or(variable, "var"));
                }
                NodeKind::SwitchCase { variable, cases } => {
                    self.variables.insert(ident_or(variable, "var"));
                    // Case targets may not be mirrored in the child list.
                    for arm in cases.iter().rev() {
                        if let Some(target) = arm.node_id.as_deref() {
                            if let Some(target_node) = graph.nodes.get(target) {
                                pending.push(target_node);
                            }
                        }
                    }
                }
                _ => {}
            }
            // Reverse push keeps the walk in child order.
            for child in graph.children_of(node).into_iter().rev() {
                pending.push(child);
            }
        }
    }

    // ==================== Phase 3: emission ====================

    fn emit(&mut self, root: &'a Node) {
        for (character_id, var) in self.char_vars.clone() {
            if let Some(character) = self.lookup.character(&character_id) {
                let name = escape_text(&character.name);
                self.line(0, format!("define {var} = Character(\"{name}\")"));
            }
        }
        if self.needs_player_define {
            self.line(0, "define player = Character(\"You\")");
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }

        self.line(0, "label start:");
        for variable in self.variables.clone() {
            self.line(1, format!("$ {variable} = 0"));
        }
        self.walk_node(root, 1);
        self.line(1, "return");

        // Merge-node bodies, each in its own label block with its own
        // inline bookkeeping so the main walk's state never skips them.
        for (node_id, label) in self.labels.clone() {
            let Some(node) = self.graph.nodes.get(&node_id) else {
                continue;
            };
            self.out.push('\n');
            self.line(0, format!("label {label}:"));
            self.walk_dialogue(node, 1, true);
            self.line(1, "return");
        }
    }

    /// Dispatch on node kind. Dangling IDs are skipped silently.
    fn walk(&mut self, id: &str, indent: usize) {
        let Some(node) = self.graph.nodes.get(id) else {
            return;
        };
        self.walk_node(node, indent);
    }

    fn walk_node(&mut self, node: &'a Node, indent: usize) {
        match &node.kind {
            NodeKind::Dialogue { .. } => self.walk_dialogue(node, indent, false),
            NodeKind::IfStatement { .. } => self.walk_if(node, indent),
            NodeKind::SwitchCase { .. } => self.walk_switch(node, indent),
            _ => {
                self.emit_effect(node, indent);
                for child in self.graph.children_of(node) {
                    self.walk_node(child, indent);
                }
            }
        }
    }

    /// Emit a dialogue node and its continuation. `body_entry` marks the
    /// single canonical definition walk of a merge node's label block;
    /// every other arrival at a labeled node becomes a jump.
    fn walk_dialogue(&mut self, node: &'a Node, indent: usize, body_entry: bool) {
        if !body_entry {
            if let Some(label) = self.labels.get(&node.id).cloned() {
                self.line(indent, format!("jump {label}"));
                return;
            }
            if self.on_stack(&node.id) {
                // An authored loop without a merge label cannot be
                // inlined; annotate instead of recursing forever.
                let text = node.dialogue_text().unwrap_or_default();
                self.line(indent, format!("# loops back to \"{}\"", escape_text(text)));
                return;
            }
        } else if self.on_stack(&node.id) {
            return;
        }

        self.stack.push(node.id.clone());
        match node.speaker() {
            Some(Speaker::Npc) => self.emit_npc_line(node, indent),
            Some(Speaker::Player) => {
                if body_entry || self.player_line_is_unambiguous(node) {
                    self.emit_player_spoken(node, indent);
                } else {
                    // A bare player line with ambiguous provenance cannot
                    // be safely inlined.
                    let text = node.dialogue_text().unwrap_or_default();
                    self.line(indent, format!("# player: \"{}\"", escape_text(text)));
                }
            }
            None => {}
        }
        self.walk_dialogue_children(node, indent);
        self.stack.pop();
    }

    /// Emit the continuation below a dialogue node: side-effect and branch
    /// children first in child order, then the dialogue children under the
    /// menu/inline rules.
    fn walk_dialogue_children(&mut self, node: &'a Node, indent: usize) {
        let children = self.graph.children_of(node);
        let (dialogue, other): (Vec<&Node>, Vec<&Node>) =
            children.into_iter().partition(|child| child.is_dialogue());

        for child in other {
            self.walk_node(child, indent);
        }

        match dialogue.len() {
            0 => {}
            // A single surviving dialogue child is a genuine linear
            // continuation, never a one-item menu.
            1 => self.walk_node(dialogue[0], indent),
            _ => {
                let all_player = dialogue
                    .iter()
                    .all(|child| child.speaker() == Some(Speaker::Player));
                if all_player && node.speaker() == Some(Speaker::Npc) {
                    self.emit_menu(&dialogue, indent);
                } else {
                    for child in dialogue {
                        self.walk_node(child, indent);
                    }
                }
            }
        }
    }

    /// Player fan-out under an NPC line: one labeled choice per player
    /// text, each choice body holding that player node's own continuation.
    fn emit_menu(&mut self, choices: &[&'a Node], indent: usize) {
        self.line(indent, "menu:");
        for &choice in choices {
            let caption = escape_text(choice.dialogue_text().unwrap_or_default());
            self.line(indent + 1, format!("\"{caption}\":"));
            let mark = self.out.len();
            if let Some(label) = self.labels.get(&choice.id).cloned() {
                self.line(indent + 2, format!("jump {label}"));
            } else if self.on_stack(&choice.id) {
                self.line(indent + 2, "pass");
            } else {
                self.stack.push(choice.id.clone());
                self.walk_dialogue_children(choice, indent + 2);
                self.stack.pop();
            }
            if self.out.len() == mark {
                self.line(indent + 2, "pass");
            }
        }
    }

    fn walk_if(&mut self, node: &'a Node, indent: usize) {
        let NodeKind::IfStatement {
            variable,
            operator,
            value,
        } = &node.kind
        else {
            return;
        };
        let children = self.graph.children_of(node);
        // Both branches absent: nothing to condition on.
        if children.is_empty() {
            return;
        }
        self.line(
            indent,
            format!(
                "if {} {} {}:",
                ident_or(variable, "var"),
                operator.as_str(),
                render_value(value)
            ),
        );
        let mark = self.out.len();
        self.walk_node(children[0], indent + 1);
        if self.out.len() == mark {
            self.line(indent + 1, "pass");
        }
        if let Some(false_branch) = children.get(1).copied() {
            self.line(indent, "else:");
            let mark = self.out.len();
            self.walk_node(false_branch, indent + 1);
            if self.out.len() == mark {
                self.line(indent + 1, "pass");
            }
        }
    }

    fn walk_switch(&mut self, node: &'a Node, indent: usize) {
        let NodeKind::SwitchCase { variable, cases } = &node.kind else {
            return;
        };
        let variable = ident_or(variable, "var");
        let claimed: HashSet<&str> = cases
            .iter()
            .filter_map(|arm| arm.node_id.as_deref())
            .collect();

        let mut first = true;
        for arm in cases {
            let keyword = if first { "if" } else { "elif" };
            first = false;
            self.line(
                indent,
                format!("{keyword} {variable} == {}:", render_value(&arm.value)),
            );
            let mark = self.out.len();
            if let Some(target) = arm.node_id.as_deref() {
                self.walk(target, indent + 1);
            }
            // An empty clause still needs a body to stay well-formed.
            if self.out.len() == mark {
                self.line(indent + 1, "pass");
            }
        }

        // Children not claimed by any case form the implicit else branch.
        let extras: Vec<&Node> = self
            .graph
            .children_of(node)
            .into_iter()
            .filter(|child| !claimed.contains(child.id.as_str()))
            .collect();
        if extras.is_empty() {
            return;
        }
        if first {
            // No declared cases at all: nothing to condition on, run the
            // branch unconditionally.
            for extra in extras {
                self.walk_node(extra, indent);
            }
        } else {
            self.line(indent, "else:");
            let mark = self.out.len();
            for extra in extras {
                self.walk_node(extra, indent + 1);
            }
            if self.out.len() == mark {
                self.line(indent + 1, "pass");
            }
        }
    }

    // ==================== Line-level emission ====================

    fn emit_npc_line(&mut self, node: &'a Node, indent: usize) {
        let NodeKind::Dialogue {
            text,
            character_id,
            emotion,
            show_avatar,
            ..
        } = &node.kind
        else {
            return;
        };
        let var = character_id
            .as_deref()
            .and_then(|id| self.char_vars.get(id))
            .cloned();

        if let (Some(var), Some(emotion)) = (&var, emotion) {
            if show_avatar.unwrap_or(false) {
                if let Some(background) = self.find_unemitted_background(node) {
                    self.emit_effect(background, indent);
                }
                self.line(
                    indent,
                    format!("show {var} {}", ident_or(emotion, "neutral")),
                );
            }
        }

        let text = escape_text(text);
        match var {
            Some(var) => self.line(indent, format!("{var} \"{text}\"")),
            None => self.line(indent, format!("\"{text}\"")),
        }
    }

    fn emit_player_spoken(&mut self, node: &'a Node, indent: usize) {
        let NodeKind::Dialogue {
            text, character_id, ..
        } = &node.kind
        else {
            return;
        };
        let var = character_id
            .as_deref()
            .and_then(|id| self.char_vars.get(id))
            .cloned()
            .unwrap_or_else(|| "player".to_string());
        self.line(indent, format!("{var} \"{}\"", escape_text(text)));
    }

    /// A player line may be inlined as spoken only when its provenance is
    /// unambiguous: a unique parent whose sole dialogue-kind child it is.
    fn player_line_is_unambiguous(&self, node: &Node) -> bool {
        let parents = self.graph.parents_of(node);
        if parents.len() != 1 {
            return false;
        }
        let siblings = self
            .graph
            .children_of(parents[0])
            .into_iter()
            .filter(|child| child.is_dialogue())
            .count();
        siblings == 1
    }

    /// Render a side-effect node's immediate effect once. Repeat arrivals
    /// through other traversal branches emit nothing.
    fn emit_effect(&mut self, node: &'a Node, indent: usize) {
        if !self.emitted_effects.insert(node.id.clone()) {
            return;
        }
        match &node.kind {
            NodeKind::SetVariable { name, value } => {
                self.line(
                    indent,
                    format!("$ {} = {}", ident_or(name, "var"), render_value(value)),
                );
            }
            NodeKind::ChangeVariable { name, op, value } => match value.as_number() {
                Some(delta) => {
                    self.line(
                        indent,
                        format!(
                            "$ {} {} {}",
                            ident_or(name, "var"),
                            op.symbol(),
                            format_number(delta)
                        ),
                    );
                }
                None => {
                    self.line(
                        indent,
                        format!("# skipped change to {}: non-numeric amount", ident_or(name, "var")),
                    );
                }
            },
            NodeKind::SetBackground { image } => {
                self.line(indent, format!("scene {}", background_tag(image)));
            }
            NodeKind::PlaySound { file } => {
                self.line(indent, format!("play sound \"{}\"", escape_text(file)));
            }
            NodeKind::SetMusic {
                file,
                fade_in,
                fade_out,
            } => {
                let mut statement = format!("play music \"{}\"", escape_text(file));
                if let Some(seconds) = fade_in {
                    statement.push_str(&format!(" fadein {}", render_seconds(*seconds)));
                }
                if let Some(seconds) = fade_out {
                    statement.push_str(&format!(" fadeout {}", render_seconds(*seconds)));
                }
                self.line(indent, statement);
            }
            NodeKind::SceneDescription { text } => {
                self.line(indent, format!("# {}", text.replace('\n', " ")));
            }
            // Dialogue and branch kinds never reach effect emission.
            _ => {}
        }
    }

    /// Find the background change that should precede an emotive NPC line:
    /// the first unemitted `SetBackground` among the node's own side-effect
    /// children, else among the previous NPC turn's.
    fn find_unemitted_background(&self, node: &Node) -> Option<&'a Node> {
        self.unemitted_background_child(node).or_else(|| {
            previous_npc_turn(self.graph, node)
                .and_then(|previous| self.unemitted_background_child(previous))
        })
    }

    fn unemitted_background_child(&self, node: &Node) -> Option<&'a Node> {
        self.graph
            .children_of(node)
            .into_iter()
            .find(|child| {
                matches!(child.kind, NodeKind::SetBackground { .. })
                    && !self.emitted_effects.contains(&child.id)
            })
    }

    fn on_stack(&self, id: &str) -> bool {
        self.stack.iter().any(|entry| entry == id)
    }

    fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        for _ in 0..indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }
}

/// The previous NPC turn relative to `node`: its dialogue parent when that
/// parent is an NPC line, or that player parent's own NPC parent.
fn previous_npc_turn<'g>(graph: &'g DialogGraph, node: &Node) -> Option<&'g Node> {
    let parent = graph
        .parents_of(node)
        .into_iter()
        .find(|candidate| candidate.is_dialogue())?;
    match parent.speaker() {
        Some(Speaker::Npc) => Some(parent),
        Some(Speaker::Player) => graph
            .parents_of(parent)
            .into_iter()
            .find(|candidate| candidate.speaker() == Some(Speaker::Npc)),
        None => None,
    }
}

fn ident_or(raw: &str, fallback: &str) -> String {
    let sanitized = sanitize_identifier(raw);
    if sanitized.is_empty() {
        fallback.to_string()
    } else {
        sanitized
    }
}

/// Label base from a merge node's text: its first few words, sanitized.
fn label_base(text: &str) -> String {
    let head: Vec<&str> = text.split_whitespace().take(3).collect();
    ident_or(&head.join(" "), "shared")
}

/// Reserve `base` in `used`, suffixing `_2`, `_3`, ... on collision.
fn unique_name(base: &str, used: &mut HashSet<String>) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{base}_{counter}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Background tag from an image reference: file stem, sanitized.
fn background_tag(image: &str) -> String {
    let stem = image
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(image);
    let stem = stem.split_once('.').map_or(stem, |(head, _)| head);
    ident_or(stem, "bg")
}

/// Seconds for fadein/fadeout clauses, without a trailing `.0`.
fn render_seconds(seconds: f64) -> String {
    format_number(seconds)
}

/// Render a value as a script literal: numerals stay bare (a numeral typed
/// as text counts), booleans become Python literals, anything else becomes
/// a quoted string.
fn render_value(value: &ScriptValue) -> String {
    match value {
        ScriptValue::Number(n) => format_number(*n),
        ScriptValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        ScriptValue::Text(s) => {
            if s.trim().parse::<f64>().is_ok() {
                s.trim().to_string()
            } else {
                format!("\"{}\"", escape_text(s))
            }
        }
    }
}

/// Format a float the way a script author would write it: integral values
/// without a trailing `.0`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
