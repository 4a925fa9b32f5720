// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-pass compilation state.
//!
//! A [`CompilationContext`] borrows the node tree for one pass. It owns
//! everything the pass needs to make synthesis idempotent:
//!
//! - per-Kind handle counters and the positional literal counter, which
//!   together make tags deterministic
//! - the tag → node index, built once by scanning the tree
//! - the produced-tag cache, so a common sub-expression yields one node
//! - the set of nodes touched this pass, used by the stale sweep
//!
//! Generated nodes are named with their tag. Tags start with one of
//! [`FUNCTION_PREFIX`], [`CONSTANT_PREFIX`], [`FRAME_PREFIX`] or
//! [`DEFAULT_PREFIX`]; nodes without such a name are never touched.

use crate::error::{CompileError, Result};
use crate::kind::{Handle, Kind, Literal, Operand};
use nodex_graph::catalog::{self, create_registry};
use nodex_graph::{NodeId, NodeRegistry, NodeTree, SocketRef, TreeKind};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Tag prefix of operation nodes
pub const FUNCTION_PREFIX: &str = "F|";
/// Tag prefix of constant value nodes
pub const CONSTANT_PREFIX: &str = "C|";
/// Tag prefix of frames
pub const FRAME_PREFIX: &str = "G|";
/// Tag prefix of default-assembly nodes
pub const DEFAULT_PREFIX: &str = "D|";

/// Color of nodes whose literal defaults were rewritten
pub const CHANGED_COLOR: [u8; 3] = [128, 51, 153];

/// Horizontal gap between a new node and the active one
const NODE_GAP: f32 = 70.0;
/// Vertical step from the active node to a new node
const NODE_STEP: f32 = -90.0;
/// Vertical step from the active node to the group output
const OUTPUT_STEP: f32 = -120.0;
/// Position of the first node when nothing is active
const FIRST_POSITION: [f32; 2] = [0.0, 200.0];
/// Offset of the first constant below the group input
const CONSTANT_OFFSET: f32 = 330.0;
/// Spacing of stacked constants
const CONSTANT_SPACING: f32 = 90.0;

/// Whether a node name is a tag written by the compiler
pub fn is_generated(name: &str) -> bool {
    [FUNCTION_PREFIX, CONSTANT_PREFIX, FRAME_PREFIX, DEFAULT_PREFIX]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Name of a generated node without its tag machinery, as shown after baking
pub fn strip_tag(name: &str) -> &str {
    let mut body = name;
    while let Some(rest) = [FUNCTION_PREFIX, CONSTANT_PREFIX, FRAME_PREFIX, DEFAULT_PREFIX]
        .iter()
        .find_map(|prefix| body.strip_prefix(prefix))
    {
        body = rest;
    }
    body.split('(').next().unwrap_or(body)
}

/// State of one compilation pass
pub struct CompilationContext<'t> {
    tree: &'t mut NodeTree,
    registry: NodeRegistry,
    counters: HashMap<Kind, u32>,
    literals: u32,
    index: HashMap<String, NodeId>,
    produced: HashMap<String, Vec<Handle>>,
    touched: HashSet<NodeId>,
    constants: usize,
    created: usize,
}

impl<'t> CompilationContext<'t> {
    /// Start a pass on a tree. The group input becomes the active node.
    pub fn new(tree: &'t mut NodeTree) -> Self {
        let registry = create_registry(tree.kind());
        let index = tree
            .nodes()
            .filter(|n| is_generated(&n.name))
            .map(|n| (n.name.clone(), n.id))
            .collect();
        let group_input = tree.group_input();
        tree.set_active(Some(group_input));

        Self {
            tree,
            registry,
            counters: HashMap::new(),
            literals: 0,
            index,
            produced: HashMap::new(),
            touched: HashSet::new(),
            constants: 0,
            created: 0,
        }
    }

    /// The tree being compiled into
    pub fn tree(&self) -> &NodeTree {
        self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut NodeTree {
        self.tree
    }

    /// Editor of the tree
    pub fn editor(&self) -> TreeKind {
        self.tree.kind()
    }

    /// Whether the editor has a node type
    pub(crate) fn has_node_type(&self, type_id: &str) -> bool {
        self.registry.contains(type_id)
    }

    /// Nodes created so far in this pass
    pub fn created(&self) -> usize {
        self.created
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Mint a handle with the next id of its kind
    pub(crate) fn mint(&mut self, kind: Kind, socket: SocketRef, boundary: Option<String>) -> Handle {
        let counter = self.counters.entry(kind).or_insert(0);
        let id = *counter;
        *counter += 1;
        Handle::new(kind, id, socket, boundary)
    }

    /// Tag of an operation applied to operands
    pub(crate) fn tag(&mut self, op: &str, operands: &[&Operand]) -> String {
        let markers: Vec<String> = operands
            .iter()
            .map(|operand| match operand {
                Operand::Handle(handle) => handle.marker(),
                Operand::Literal(_) => {
                    let marker = format!("p{}", self.literals);
                    self.literals += 1;
                    marker
                }
            })
            .collect();
        format!("{FUNCTION_PREFIX}{op}({})", markers.join(","))
    }

    /// Handles already produced for a tag in this pass
    pub(crate) fn produced(&self, tag: &str) -> Option<&[Handle]> {
        self.produced.get(tag).map(Vec::as_slice)
    }

    pub(crate) fn remember(&mut self, tag: &str, handles: Vec<Handle>) {
        self.produced.insert(tag.to_string(), handles);
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Find the node carrying a tag, or create it next to the active node
    pub(crate) fn ensure_node(
        &mut self,
        tag: &str,
        type_id: &str,
        properties: &[(&str, &str)],
    ) -> Result<NodeId> {
        if let Some(id) = self.index.get(tag).copied() {
            match self.tree.node(id).map(|n| n.node_type == type_id) {
                Some(true) => {
                    if let Some(node) = self.tree.node_mut(id) {
                        for (key, value) in properties {
                            if node.property(key) != Some(*value) {
                                node.properties.insert((*key).to_string(), (*value).to_string());
                            }
                        }
                    }
                    self.touched.insert(id);
                    debug!(tag, "reusing node");
                    return Ok(id);
                }
                Some(false) => {
                    debug!(tag, type_id, "replacing node of another type");
                    self.tree.remove_node(id);
                }
                None => {}
            }
            self.index.remove(tag);
        }

        let node = self.registry.create_node(type_id).ok_or_else(|| {
            CompileError::Unavailable(format!(
                "Node '{type_id}' is not available in the {} editor.",
                self.editor().name()
            ))
        })?;
        let [x, y] = self.next_position();
        let mut node = node.with_name(tag).with_position(x, y);
        for (key, value) in properties {
            node = node.with_property(*key, *value);
        }

        let id = self.tree.add_node(node);
        self.index.insert(tag.to_string(), id);
        self.touched.insert(id);
        self.created += 1;
        debug!(tag, type_id, "created node");
        Ok(id)
    }

    fn next_position(&self) -> [f32; 2] {
        self.tree
            .active()
            .and_then(|id| self.tree.node(id))
            .map_or(FIRST_POSITION, |active| {
                [
                    active.position[0] + active.width + NODE_GAP,
                    active.position[1] + NODE_STEP,
                ]
            })
    }

    /// Make a node the layout anchor
    pub(crate) fn activate(&mut self, node: NodeId) {
        self.tree.set_active(Some(node));
    }

    pub(crate) fn touch(&mut self, node: NodeId) {
        self.touched.insert(node);
    }

    /// Wire an operand into an input slot of a node.
    ///
    /// Handles are linked, replacing a different source. Literals become the
    /// slot default; a changed default marks the node.
    pub(crate) fn feed(&mut self, node: NodeId, slot: usize, operand: &Operand) -> Result<()> {
        let (port, port_type, current) = self
            .tree
            .node(node)
            .and_then(|n| n.input(slot))
            .map(|p| (p.id, p.port_type, p.default_value))
            .ok_or_else(|| CompileError::Graph(format!("missing input slot {slot}")))?;
        let target = SocketRef::new(node, port);

        match operand {
            Operand::Handle(handle) => {
                if handle.kind() == Kind::Output {
                    return Err(CompileError::Type(format!(
                        "Output '{}' cannot be read",
                        handle.boundary().unwrap_or_default()
                    )));
                }
                if self.tree.link_into(port).is_some_and(|l| l.from == handle.socket()) {
                    return Ok(());
                }
                self.tree.reconnect(handle.socket(), target)?;
                debug!(from = %handle.marker(), slot, "linked");
            }
            Operand::Literal(literal) => {
                let value = literal
                    .to_port_value()
                    .and_then(|v| v.convert(port_type))
                    .ok_or_else(|| {
                        CompileError::Type(format!(
                            "A {} literal cannot feed a {} socket",
                            literal.kind(),
                            port_type.name()
                        ))
                    })?;
                self.tree.disconnect_input(port);
                if !current.is_some_and(|current| current.same(&value)) {
                    if let Some(n) = self.tree.node_mut(node) {
                        if let Some(p) = n.input_mut(slot) {
                            p.default_value = Some(value);
                        }
                        n.color = Some(CHANGED_COLOR);
                    }
                }
            }
        }
        Ok(())
    }

    /// Fresh handle on an output slot of a node
    pub(crate) fn output_handle(&mut self, node: NodeId, slot: usize, kind: Kind) -> Result<Handle> {
        let port = self
            .tree
            .node(node)
            .and_then(|n| n.output(slot))
            .map(|p| p.id)
            .ok_or_else(|| CompileError::Graph(format!("missing output slot {slot}")))?;
        Ok(self.mint(kind, SocketRef::new(node, port), None))
    }

    /// Create or reuse a tagged node, wire its slots and return its output.
    ///
    /// The node becomes the active node.
    pub(crate) fn primitive(
        &mut self,
        tag: &str,
        type_id: &str,
        properties: &[(&str, &str)],
        slots: &[(usize, &Operand)],
        output: (usize, Kind),
    ) -> Result<Handle> {
        if let Some(handle) = self.produced(tag).and_then(<[Handle]>::first) {
            return Ok(handle.clone());
        }
        let node = self.ensure_node(tag, type_id, properties)?;
        self.activate(node);
        for (slot, operand) in slots {
            self.feed(node, *slot, operand)?;
        }
        let handle = self.output_handle(node, output.0, output.1)?;
        self.remember(tag, vec![handle.clone()]);
        Ok(handle)
    }

    /// Value node holding a constant, stacked below the group input
    pub fn constant(&mut self, value: f64) -> Result<Handle> {
        let tag = format!("{CONSTANT_PREFIX}{value}");
        if let Some(handle) = self.produced(&tag).and_then(<[Handle]>::first) {
            return Ok(handle.clone());
        }

        let id = self.ensure_node(&tag, catalog::VALUE, &[])?;
        let slot = self.constants as f32;
        self.constants += 1;
        let anchor = self
            .tree
            .node(self.tree.group_input())
            .map_or([0.0, 0.0], |n| n.position);
        if let Some(node) = self.tree.node_mut(id) {
            node.position = [anchor[0], anchor[1] - CONSTANT_OFFSET - CONSTANT_SPACING * slot];
            if let Some(port) = node.output_mut(0) {
                port.default_value = Literal::Scalar(value as f32).to_port_value();
            }
        }

        let handle = self.output_handle(id, 0, Kind::Scalar)?;
        self.remember(&tag, vec![handle.clone()]);
        Ok(handle)
    }

    /// Group nodes under a labelled frame keyed by the tag of the operation
    /// that produced them. Nodes already framed move with their outermost frame.
    pub(crate) fn frame(&mut self, outer: &str, label: &str, members: &[NodeId]) -> Result<NodeId> {
        let tag = format!("{FRAME_PREFIX}{outer}");
        let frame = self.ensure_node(&tag, catalog::FRAME, &[])?;

        let mut roots: Vec<NodeId> = Vec::new();
        for member in members {
            let root = self.outermost(*member, frame);
            if root != frame && !roots.contains(&root) && !self.encloses(root, frame) {
                roots.push(root);
            }
        }

        let position = members
            .first()
            .and_then(|id| self.tree.node(*id))
            .map(|n| n.position);
        if let Some(node) = self.tree.node_mut(frame) {
            node.label = label.to_string();
            if let Some(position) = position {
                node.position = position;
            }
        }
        for root in roots {
            if let Some(node) = self.tree.node_mut(root) {
                node.parent = Some(frame);
            }
        }
        Ok(frame)
    }

    /// Topmost frame containing a node, stopping below `frame`
    fn outermost(&self, node: NodeId, frame: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.tree.node(current).and_then(|n| n.parent) {
            if parent == frame {
                break;
            }
            current = parent;
        }
        current
    }

    /// Whether `outer` is `node` or one of its enclosing frames
    fn encloses(&self, outer: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.tree.node(id).and_then(|n| n.parent);
        }
        false
    }

    // ------------------------------------------------------------------
    // Pass end
    // ------------------------------------------------------------------

    /// Move the group output next to the active node
    pub(crate) fn place_group_output(&mut self) {
        let anchor = self
            .tree
            .active()
            .or(Some(self.tree.group_input()))
            .and_then(|id| self.tree.node(id))
            .map(|n| [n.position[0] + n.width + NODE_GAP, n.position[1] + OUTPUT_STEP]);
        let output = self.tree.group_output();
        if let (Some(position), Some(node)) = (anchor, self.tree.node_mut(output)) {
            node.position = position;
        }
    }

    /// Remove generated nodes this pass did not touch
    pub(crate) fn sweep(&mut self) -> usize {
        let stale: Vec<NodeId> = self
            .tree
            .nodes()
            .filter(|n| is_generated(&n.name) && !self.touched.contains(&n.id))
            .map(|n| n.id)
            .collect();
        for id in &stale {
            if let Some(node) = self.tree.remove_node(*id) {
                debug!(tag = %node.name, "removed stale node");
            }
        }
        stale.len()
    }
}
