// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links (edges) between an output port and an input port.

use crate::node::NodeId;
use crate::port::PortId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// One end of a link: a port on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketRef {
    /// Owning node
    pub node: NodeId,
    /// Port on that node
    pub port: PortId,
}

impl SocketRef {
    /// Create a socket reference
    pub fn new(node: NodeId, port: PortId) -> Self {
        Self { node, port }
    }
}

/// A link from an output port to an input port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// Source (output side)
    pub from: SocketRef,
    /// Target (input side)
    pub to: SocketRef,
}

impl Link {
    /// Create a new link
    pub fn new(from: SocketRef, to: SocketRef) -> Self {
        Self {
            id: LinkId::new(),
            from,
            to,
        }
    }

    /// Check if this link involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from.node == node_id || self.to.node == node_id
    }

    /// Check if this link involves a specific port
    pub fn involves_port(&self, port_id: PortId) -> bool {
        self.from.port == port_id || self.to.port == port_id
    }
}
