// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory host node tree for `nodex`.
//!
//! This crate models the document an expression compiles into:
//! - Nodes with typed input/output ports and literal defaults
//! - Links validated for direction, type and cycles
//! - A group interface mirrored on the Group Input/Output nodes
//! - Frames, persistent node names and an active node for layout
//! - Per-editor node catalogs and socket availability

pub mod catalog;
pub mod interface;
pub mod link;
pub mod node;
pub mod port;
pub mod tree;

pub use interface::{InterfaceError, InterfaceSocket, TreeKind};
pub use link::{Link, LinkId, SocketRef};
pub use node::{Node, NodeCategory, NodeId, NodeRegistry, NodeType};
pub use port::{Port, PortDirection, PortId, PortType, PortValue};
pub use tree::{ConnectionError, NodeTree};
