// SPDX-License-Identifier: MIT OR Apache-2.0
//! Kinds, literals and typed handles.
//!
//! A [`Handle`] wraps exactly one output socket of the tree being compiled.
//! Handles are pass-local: they are minted by the
//! [`CompilationContext`](crate::context::CompilationContext), carry a
//! Kind-scoped id, and are never mutated. Operations take [`Operand`]s, which
//! are either handles or bare literals.

use nodex_graph::{PortType, PortValue, SocketRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-system variant of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Float
    Scalar,
    /// 3D vector
    Vector,
    /// Boolean, usable wherever a scalar is
    Boolean,
    /// Rotation
    Rotation,
    /// 4x4 matrix
    Matrix,
    /// Boundary output sink; can be assigned to, never read
    Output,
}

impl Kind {
    /// Every kind, in counter order
    pub const ALL: [Kind; 6] = [
        Kind::Scalar,
        Kind::Vector,
        Kind::Boolean,
        Kind::Rotation,
        Kind::Matrix,
        Kind::Output,
    ];

    /// Character used in synthesis tags
    pub fn tag_char(self) -> char {
        match self {
            Self::Scalar => 'f',
            Self::Vector => 'v',
            Self::Boolean => 'b',
            Self::Rotation => 'r',
            Self::Matrix => 'm',
            Self::Output => 'o',
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "Scalar",
            Self::Vector => "Vector",
            Self::Boolean => "Boolean",
            Self::Rotation => "Rotation",
            Self::Matrix => "Matrix",
            Self::Output => "Output",
        }
    }

    /// Socket type carrying values of this kind
    pub fn port_type(self) -> Option<PortType> {
        match self {
            Self::Scalar => Some(PortType::Float),
            Self::Vector => Some(PortType::Vector),
            Self::Boolean => Some(PortType::Bool),
            Self::Rotation => Some(PortType::Rotation),
            Self::Matrix => Some(PortType::Matrix),
            Self::Output => None,
        }
    }

    /// Kind of values read from a socket type
    pub fn from_port_type(port_type: PortType) -> Self {
        match port_type {
            PortType::Int | PortType::Float => Self::Scalar,
            PortType::Vector | PortType::Color => Self::Vector,
            PortType::Bool => Self::Boolean,
            PortType::Rotation => Self::Rotation,
            PortType::Matrix => Self::Matrix,
        }
    }

    /// Whether math primitives accept this kind
    pub fn is_numeric(self) -> bool {
        match self {
            Self::Scalar | Self::Vector | Self::Boolean => true,
            Self::Rotation | Self::Matrix | Self::Output => false,
        }
    }

    /// Whether this kind takes part in arithmetic as a single float
    pub fn is_scalar_like(self) -> bool {
        matches!(self, Self::Scalar | Self::Boolean)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bare value not yet bound to the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// Float
    Scalar(f32),
    /// 3D vector
    Vector([f32; 3]),
    /// Boolean
    Boolean(bool),
    /// Quaternion, `[w, x, y, z]`
    Rotation([f32; 4]),
    /// Column-major 4x4 matrix
    Matrix([f32; 16]),
}

impl Literal {
    /// Kind of the literal
    pub fn kind(&self) -> Kind {
        match self {
            Self::Scalar(_) => Kind::Scalar,
            Self::Vector(_) => Kind::Vector,
            Self::Boolean(_) => Kind::Boolean,
            Self::Rotation(_) => Kind::Rotation,
            Self::Matrix(_) => Kind::Matrix,
        }
    }

    /// The value as a single float, for scalar-like literals
    pub fn as_scalar(&self) -> Option<f32> {
        match *self {
            Self::Scalar(v) => Some(v),
            Self::Boolean(b) => Some(f32::from(u8::from(b))),
            Self::Vector(_) | Self::Rotation(_) | Self::Matrix(_) => None,
        }
    }

    /// The value as a 3-vector, broadcasting scalars
    pub fn as_vector(&self) -> Option<[f32; 3]> {
        match *self {
            Self::Vector(v) => Some(v),
            other => other.as_scalar().map(|s| [s; 3]),
        }
    }

    /// Socket default holding this literal, for kinds with a default slot
    pub fn to_port_value(&self) -> Option<PortValue> {
        match *self {
            Self::Scalar(v) => Some(PortValue::Float(v)),
            Self::Vector(v) => Some(PortValue::Vector(v)),
            Self::Boolean(b) => Some(PortValue::Bool(b)),
            Self::Rotation(_) | Self::Matrix(_) => None,
        }
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Self::Scalar(value)
    }
}

impl From<[f32; 3]> for Literal {
    fn from(value: [f32; 3]) -> Self {
        Self::Vector(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Typed wrapper around one output socket
#[derive(Debug, Clone, PartialEq)]
pub struct Handle {
    kind: Kind,
    id: u32,
    socket: SocketRef,
    boundary: Option<String>,
}

impl Handle {
    pub(crate) fn new(kind: Kind, id: u32, socket: SocketRef, boundary: Option<String>) -> Self {
        Self { kind, id, socket, boundary }
    }

    /// Kind of the wrapped socket
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Kind-scoped id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The wrapped socket
    pub fn socket(&self) -> SocketRef {
        self.socket
    }

    /// Boundary socket name, for handles reading an input or feeding an output
    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    /// Identity marker used in synthesis tags, e.g. `v3`
    pub fn marker(&self) -> String {
        format!("{}{}", self.kind.tag_char(), self.id)
    }
}

/// Operation argument
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Value living in the tree
    Handle(Handle),
    /// Bare value
    Literal(Literal),
}

impl Operand {
    /// Kind of the operand
    pub fn kind(&self) -> Kind {
        match self {
            Self::Handle(h) => h.kind(),
            Self::Literal(l) => l.kind(),
        }
    }

    /// The handle, if bound to the tree
    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Self::Handle(h) => Some(h),
            Self::Literal(_) => None,
        }
    }

    /// The literal, if not bound to the tree
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Handle(_) => None,
            Self::Literal(l) => Some(l),
        }
    }

    /// Whether the operand is a vector
    pub fn is_vector(&self) -> bool {
        self.kind() == Kind::Vector
    }
}

impl From<Handle> for Operand {
    fn from(handle: Handle) -> Self {
        Self::Handle(handle)
    }
}

impl From<Literal> for Operand {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Self::Literal(Literal::Scalar(value))
    }
}

impl From<[f32; 3]> for Operand {
    fn from(value: [f32; 3]) -> Self {
        Self::Literal(Literal::Vector(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_broadcast() {
        assert_eq!(Literal::Scalar(2.0).as_vector(), Some([2.0; 3]));
        assert_eq!(Literal::Boolean(true).as_scalar(), Some(1.0));
        assert_eq!(Literal::Vector([1.0, 2.0, 3.0]).as_scalar(), None);
        assert_eq!(Literal::Matrix([0.0; 16]).to_port_value(), None);
    }

    #[test]
    fn test_kind_round_trip_through_port_types() {
        for kind in Kind::ALL {
            if let Some(port_type) = kind.port_type() {
                assert_eq!(Kind::from_port_type(port_type), kind);
            }
        }
        assert_eq!(Kind::from_port_type(PortType::Int), Kind::Scalar);
    }

    #[test]
    fn test_numeric_kinds() {
        assert!(Kind::Boolean.is_numeric());
        assert!(Kind::Boolean.is_scalar_like());
        assert!(!Kind::Rotation.is_numeric());
        assert!(!Kind::Output.is_numeric());
    }
}
