// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boundary interface of a node tree and per-editor socket availability.

use crate::port::{PortDirection, PortId, PortType, PortValue};
use serde::{Deserialize, Serialize};

/// The editor a tree lives in. Decides which nodes and socket types exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeKind {
    /// Geometry nodes
    Geometry,
    /// Shader nodes
    Shader,
    /// Compositor nodes
    Compositor,
}

impl TreeKind {
    /// Editor display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Geometry => "Geometry",
            Self::Shader => "Shader",
            Self::Compositor => "Compositor",
        }
    }

    /// Socket types usable on a tree interface in this editor
    pub fn socket_types(self) -> &'static [PortType] {
        match self {
            Self::Geometry => &[
                PortType::Float,
                PortType::Int,
                PortType::Vector,
                PortType::Color,
                PortType::Bool,
                PortType::Rotation,
                PortType::Matrix,
            ],
            Self::Shader => &[
                PortType::Float,
                PortType::Int,
                PortType::Vector,
                PortType::Color,
                PortType::Bool,
            ],
            Self::Compositor => &[
                PortType::Float,
                PortType::Int,
                PortType::Vector,
                PortType::Color,
            ],
        }
    }

    /// Map a requested socket type onto one this editor supports.
    ///
    /// The compositor has no booleans and stores them as integers.
    /// Returns `None` when there is no stand-in.
    pub fn adjust_socket_type(self, port_type: PortType) -> Option<PortType> {
        let adjusted = match (self, port_type) {
            (Self::Compositor, PortType::Bool) => PortType::Int,
            (_, other) => other,
        };
        self.socket_types().contains(&adjusted).then_some(adjusted)
    }
}

/// A named socket on the tree boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceSocket {
    /// Socket ID, shared with the mirrored port on the group node
    pub id: PortId,
    /// Name, unique per direction
    pub name: String,
    /// `Input` for tree inputs, `Output` for tree outputs
    pub direction: PortDirection,
    /// Data type
    pub port_type: PortType,
    /// Default value
    pub default_value: Option<PortValue>,
    /// Tooltip text
    pub description: String,
}

/// Error when editing the tree interface
#[derive(Debug, thiserror::Error)]
pub enum InterfaceError {
    /// Name already used on that side
    #[error("{direction:?} socket '{name}' already exists")]
    DuplicateName {
        /// Socket name
        name: String,
        /// Side
        direction: PortDirection,
    },

    /// Socket type missing in the editor
    #[error("{} sockets are unavailable in the {} editor", port_type.name(), editor.name())]
    Unavailable {
        /// Requested type
        port_type: PortType,
        /// Editor of the tree
        editor: TreeKind,
    },

    /// No socket with this ID
    #[error("Interface socket not found: {0:?}")]
    NotFound(PortId),
}
