// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node tree: nodes, links, the boundary interface and the active node.

use crate::catalog;
use crate::interface::{InterfaceError, InterfaceSocket, TreeKind};
use crate::link::{Link, LinkId, SocketRef};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortDirection, PortId, PortType, PortValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Persistent name of the group input node
pub const GROUP_INPUT_NAME: &str = "Group Input";
/// Persistent name of the group output node
pub const GROUP_OUTPUT_NAME: &str = "Group Output";

/// A node tree with a group interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTree {
    /// Tree name
    pub name: String,
    /// Editor this tree belongs to
    kind: TreeKind,
    /// Nodes in the tree
    nodes: IndexMap<NodeId, Node>,
    /// Links between nodes
    links: IndexMap<LinkId, Link>,
    /// Boundary sockets, inputs and outputs interleaved in creation order
    interface: Vec<InterfaceSocket>,
    /// Node exposing the tree inputs as outputs
    group_input: NodeId,
    /// Node exposing the tree outputs as inputs
    group_output: NodeId,
    /// Anchor for placing new nodes
    active: Option<NodeId>,
}

impl NodeTree {
    /// Create a new tree holding only its group input and output nodes
    pub fn new(name: impl Into<String>, kind: TreeKind) -> Self {
        let input = Node::new(&catalog::group_input_type())
            .with_name(GROUP_INPUT_NAME)
            .with_position(-200.0, 0.0);
        let output = Node::new(&catalog::group_output_type())
            .with_name(GROUP_OUTPUT_NAME)
            .with_position(200.0, 0.0);
        let (group_input, group_output) = (input.id, output.id);

        let mut nodes = IndexMap::new();
        nodes.insert(group_input, input);
        nodes.insert(group_output, output);

        Self {
            name: name.into(),
            kind,
            nodes,
            links: IndexMap::new(),
            interface: Vec::new(),
            group_input,
            group_output,
            active: None,
        }
    }

    /// Editor of this tree
    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    /// ID of the group input node
    pub fn group_input(&self) -> NodeId {
        self.group_input
    }

    /// ID of the group output node
    pub fn group_output(&self) -> NodeId {
        self.group_output
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Add a node to the tree
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its links. The group nodes cannot be removed.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        if node_id == self.group_input || node_id == self.group_output {
            return None;
        }
        self.links.retain(|_, l| !l.involves_node(node_id));
        for node in self.nodes.values_mut() {
            if node.parent == Some(node_id) {
                node.parent = None;
            }
        }
        if self.active == Some(node_id) {
            self.active = None;
        }
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Find a node by its persistent name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes whose frame is `frame`
    pub fn children(&self, frame: NodeId) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.parent == Some(frame))
    }

    /// The active node
    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    /// Set the active node. Unknown IDs clear it.
    pub fn set_active(&mut self, node_id: Option<NodeId>) {
        self.active = node_id.filter(|id| self.nodes.contains_key(id));
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Link an output port to a free input port
    pub fn connect(&mut self, from: SocketRef, to: SocketRef) -> Result<LinkId, ConnectionError> {
        let source_node = self.nodes.get(&from.node)
            .ok_or(ConnectionError::NodeNotFound(from.node))?;
        let target_node = self.nodes.get(&to.node)
            .ok_or(ConnectionError::NodeNotFound(to.node))?;

        let source_port = source_node.port(&from.port)
            .ok_or(ConnectionError::PortNotFound(from.port))?;
        let target_port = target_node.port(&to.port)
            .ok_or(ConnectionError::PortNotFound(to.port))?;

        if source_port.direction != PortDirection::Output
            || target_port.direction != PortDirection::Input
        {
            return Err(ConnectionError::WrongDirection);
        }

        if !source_port.can_connect(target_port) {
            return Err(ConnectionError::IncompatiblePorts {
                from: source_port.port_type,
                to: target_port.port_type,
            });
        }

        if !target_port.multi_connect && self.links.values().any(|l| l.to.port == to.port) {
            return Err(ConnectionError::PortAlreadyConnected(to.port));
        }

        if from.node == to.node {
            return Err(ConnectionError::SelfLoop);
        }

        // The source must not already read from the target
        if self.depends_on(from.node, to.node) {
            return Err(ConnectionError::Cycle);
        }

        let link = Link::new(from, to);
        let id = link.id;
        self.links.insert(id, link);
        Ok(id)
    }

    /// Link an output port to an input port, replacing whatever fed that input
    pub fn reconnect(&mut self, from: SocketRef, to: SocketRef) -> Result<LinkId, ConnectionError> {
        let previous: Vec<Link> = self.links.values()
            .filter(|l| l.to.port == to.port)
            .cloned()
            .collect();
        self.links.retain(|_, l| l.to.port != to.port);

        match self.connect(from, to) {
            Ok(id) => Ok(id),
            Err(e) => {
                for link in previous {
                    self.links.insert(link.id, link);
                }
                Err(e)
            }
        }
    }

    /// Remove every link feeding an input port, returning how many were removed
    pub fn disconnect_input(&mut self, port_id: PortId) -> usize {
        let before = self.links.len();
        self.links.retain(|_, l| l.to.port != port_id);
        before - self.links.len()
    }

    /// The link feeding an input port, if any
    pub fn link_into(&self, port_id: PortId) -> Option<&Link> {
        self.links.values().find(|l| l.to.port == port_id)
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether `node` reads, directly or transitively, from `upstream`
    pub fn depends_on(&self, node: NodeId, upstream: NodeId) -> bool {
        let mut stack = vec![node];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == upstream {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.extend(
                self.links.values()
                    .filter(|l| l.to.node == current)
                    .map(|l| l.from.node),
            );
        }
        false
    }

    // ------------------------------------------------------------------
    // Interface
    // ------------------------------------------------------------------

    /// Boundary sockets on one side, in order
    pub fn interface_sockets(&self, direction: PortDirection) -> impl Iterator<Item = &InterfaceSocket> {
        self.interface.iter().filter(move |s| s.direction == direction)
    }

    /// Boundary socket by ID
    pub fn interface_socket(&self, id: PortId) -> Option<&InterfaceSocket> {
        self.interface.iter().find(|s| s.id == id)
    }

    /// Boundary socket by side and name
    pub fn interface_socket_by_name(&self, direction: PortDirection, name: &str) -> Option<&InterfaceSocket> {
        self.interface.iter().find(|s| s.direction == direction && s.name == name)
    }

    /// Position of a boundary socket among the sockets of its side
    pub fn interface_index(&self, id: PortId) -> Option<usize> {
        let socket = self.interface_socket(id)?;
        self.interface_sockets(socket.direction).position(|s| s.id == id)
    }

    /// Create a boundary socket
    pub fn new_socket(
        &mut self,
        name: impl Into<String>,
        direction: PortDirection,
        port_type: PortType,
    ) -> Result<PortId, InterfaceError> {
        let name = name.into();
        if self.interface_socket_by_name(direction, &name).is_some() {
            return Err(InterfaceError::DuplicateName { name, direction });
        }
        let port_type = self.kind.adjust_socket_type(port_type)
            .ok_or(InterfaceError::Unavailable { port_type, editor: self.kind })?;

        let socket = InterfaceSocket {
            id: PortId::new(),
            name,
            direction,
            port_type,
            default_value: None,
            description: String::new(),
        };
        let id = socket.id;
        self.interface.push(socket);
        self.sync_group_nodes();
        Ok(id)
    }

    /// Remove a boundary socket and every link on its mirrored port
    pub fn remove_socket(&mut self, id: PortId) -> Result<InterfaceSocket, InterfaceError> {
        let index = self.interface.iter().position(|s| s.id == id)
            .ok_or(InterfaceError::NotFound(id))?;
        let socket = self.interface.remove(index);
        self.links.retain(|_, l| !l.involves_port(id));
        self.sync_group_nodes();
        Ok(socket)
    }

    /// Change the type of a boundary socket, dropping links that no longer fit
    pub fn retype_socket(&mut self, id: PortId, port_type: PortType) -> Result<PortType, InterfaceError> {
        let port_type = self.kind.adjust_socket_type(port_type)
            .ok_or(InterfaceError::Unavailable { port_type, editor: self.kind })?;
        let socket = self.interface.iter_mut().find(|s| s.id == id)
            .ok_or(InterfaceError::NotFound(id))?;
        if socket.port_type == port_type {
            return Ok(port_type);
        }
        socket.port_type = port_type;
        socket.default_value = socket.default_value.and_then(|v| v.convert(port_type));
        self.sync_group_nodes();

        let stale: Vec<LinkId> = self.links.values()
            .filter(|l| l.involves_port(id))
            .filter(|l| !self.link_fits(l))
            .map(|l| l.id)
            .collect();
        for link_id in stale {
            self.links.shift_remove(&link_id);
        }
        Ok(port_type)
    }

    /// Set the default value of a boundary socket
    pub fn set_socket_default(&mut self, id: PortId, value: PortValue) -> Result<bool, InterfaceError> {
        let socket = self.interface.iter_mut().find(|s| s.id == id)
            .ok_or(InterfaceError::NotFound(id))?;
        let value = value.convert(socket.port_type);
        let unchanged = match (&socket.default_value, &value) {
            (Some(current), Some(value)) => current.same(value),
            (current, value) => current.is_none() && value.is_none(),
        };
        if unchanged {
            return Ok(false);
        }
        socket.default_value = value;
        self.sync_group_nodes();
        Ok(true)
    }

    fn link_fits(&self, link: &Link) -> bool {
        let from = self.nodes.get(&link.from.node).and_then(|n| n.port(&link.from.port));
        let to = self.nodes.get(&link.to.node).and_then(|n| n.port(&link.to.port));
        match (from, to) {
            (Some(from), Some(to)) => from.can_connect(to),
            _ => false,
        }
    }

    /// Rebuild the group node ports from the interface
    fn sync_group_nodes(&mut self) {
        let mirror = |direction: PortDirection, port_direction: PortDirection, interface: &[InterfaceSocket]| {
            interface.iter()
                .filter(|s| s.direction == direction)
                .map(|s| {
                    let mut port = Port::new(s.id, s.name.clone(), s.port_type, port_direction);
                    port.default_value = s.default_value;
                    port
                })
                .collect::<Vec<_>>()
        };
        let outputs = mirror(PortDirection::Input, PortDirection::Output, &self.interface);
        let inputs = mirror(PortDirection::Output, PortDirection::Input, &self.interface);

        if let Some(node) = self.nodes.get_mut(&self.group_input) {
            node.outputs = outputs;
        }
        if let Some(node) = self.nodes.get_mut(&self.group_output) {
            node.inputs = inputs;
        }
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new("NodeTree", TreeKind::Geometry)
    }
}

/// Error when creating a link
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// Links go from an output to an input
    #[error("Links must go from an output port to an input port")]
    WrongDirection,

    /// Incompatible port types
    #[error("Cannot link a {} port into a {} port", from.name(), to.name())]
    IncompatiblePorts {
        /// Source type
        from: PortType,
        /// Target type
        to: PortType,
    },

    /// Port is already connected
    #[error("Port already connected: {0:?}")]
    PortAlreadyConnected(PortId),

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// The link would close a loop
    #[error("Link would create a cycle")]
    Cycle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::create_registry;

    fn math_node(tree: &mut NodeTree) -> NodeId {
        let registry = create_registry(tree.kind());
        let node = registry.create_node(catalog::MATH).expect("math node registered");
        tree.add_node(node)
    }

    fn socket(tree: &NodeTree, node: NodeId, output: bool, index: usize) -> SocketRef {
        let n = tree.node(node).expect("node exists");
        let port = if output { n.output(index) } else { n.input(index) };
        SocketRef::new(node, port.expect("port exists").id)
    }

    #[test]
    fn test_new_tree_has_group_nodes() {
        let tree = NodeTree::new("expr", TreeKind::Geometry);
        assert_eq!(tree.node_count(), 2);
        assert!(tree.node_by_name(GROUP_INPUT_NAME).is_some());
        assert!(tree.node_by_name(GROUP_OUTPUT_NAME).is_some());
        assert_eq!(tree.active(), None);
    }

    #[test]
    fn test_group_nodes_cannot_be_removed() {
        let mut tree = NodeTree::default();
        let input = tree.group_input();
        assert!(tree.remove_node(input).is_none());
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_interface_mirrors_group_ports() {
        let mut tree = NodeTree::default();
        let a = tree.new_socket("a", PortDirection::Input, PortType::Float).unwrap();
        let out = tree.new_socket("Result", PortDirection::Output, PortType::Float).unwrap();

        let input = tree.node(tree.group_input()).unwrap();
        assert_eq!(input.outputs.len(), 1);
        assert_eq!(input.outputs[0].id, a);
        let output = tree.node(tree.group_output()).unwrap();
        assert_eq!(output.inputs[0].id, out);

        assert!(matches!(
            tree.new_socket("a", PortDirection::Input, PortType::Vector),
            Err(InterfaceError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_connect_and_reconnect() {
        let mut tree = NodeTree::default();
        let a = tree.new_socket("a", PortDirection::Input, PortType::Float).unwrap();
        let b = tree.new_socket("b", PortDirection::Input, PortType::Float).unwrap();
        let math = math_node(&mut tree);
        let gi = tree.group_input();

        let target = socket(&tree, math, false, 0);
        tree.connect(SocketRef::new(gi, a), target).unwrap();
        assert!(matches!(
            tree.connect(SocketRef::new(gi, b), target),
            Err(ConnectionError::PortAlreadyConnected(_))
        ));

        tree.reconnect(SocketRef::new(gi, b), target).unwrap();
        assert_eq!(tree.link_into(target.port).unwrap().from.port, b);
        assert_eq!(tree.link_count(), 1);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = NodeTree::default();
        let first = math_node(&mut tree);
        let second = math_node(&mut tree);

        tree.connect(socket(&tree, first, true, 0), socket(&tree, second, false, 0)).unwrap();
        let result = tree.connect(socket(&tree, second, true, 0), socket(&tree, first, false, 0));
        assert!(matches!(result, Err(ConnectionError::Cycle)));
        assert_eq!(tree.link_count(), 1);
    }

    #[test]
    fn test_retype_drops_incompatible_links() {
        let mut tree = NodeTree::default();
        let out = tree.new_socket("Result", PortDirection::Output, PortType::Float).unwrap();
        let math = math_node(&mut tree);
        let go = tree.group_output();
        tree.connect(socket(&tree, math, true, 0), SocketRef::new(go, out)).unwrap();

        tree.retype_socket(out, PortType::Vector).unwrap();
        assert_eq!(tree.link_count(), 1);
        tree.retype_socket(out, PortType::Matrix).unwrap();
        assert_eq!(tree.link_count(), 0);
    }

    #[test]
    fn test_remove_socket_removes_links() {
        let mut tree = NodeTree::default();
        let a = tree.new_socket("a", PortDirection::Input, PortType::Float).unwrap();
        let math = math_node(&mut tree);
        let gi = tree.group_input();
        tree.connect(SocketRef::new(gi, a), socket(&tree, math, false, 0)).unwrap();

        tree.remove_socket(a).unwrap();
        assert_eq!(tree.link_count(), 0);
        assert!(tree.node(gi).unwrap().outputs.is_empty());
    }

    #[test]
    fn test_nan_socket_default_is_stable() {
        let mut tree = NodeTree::default();
        let out = tree.new_socket("Result", PortDirection::Output, PortType::Float).unwrap();
        assert!(tree.set_socket_default(out, PortValue::Float(f32::NAN)).unwrap());
        assert!(!tree.set_socket_default(out, PortValue::Float(f32::NAN)).unwrap());
    }

    #[test]
    fn test_socket_default_is_converted() {
        let mut tree = NodeTree::new("comp", TreeKind::Compositor);
        let flag = tree.new_socket("flag", PortDirection::Input, PortType::Bool).unwrap();
        assert_eq!(tree.interface_socket(flag).unwrap().port_type, PortType::Int);

        assert!(tree.set_socket_default(flag, PortValue::Bool(true)).unwrap());
        assert!(!tree.set_socket_default(flag, PortValue::Bool(true)).unwrap());
        assert_eq!(tree.interface_socket(flag).unwrap().default_value, Some(PortValue::Int(1)));
    }
}
