// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port (socket) definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Data type that can flow through ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// 3D vector
    Vector,
    /// Color (RGBA)
    Color,
    /// Rotation (quaternion)
    Rotation,
    /// Matrix 4x4
    Matrix,
}

impl PortType {
    /// Display name of the type, as shown in error messages
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Vector => "Vector",
            Self::Color => "Color",
            Self::Rotation => "Rotation",
            Self::Matrix => "Matrix",
        }
    }

    /// Whether the type stores a literal default on the socket itself.
    ///
    /// Rotation and matrix sockets have no default slot; a value for them
    /// has to come from a node.
    pub fn has_default_slot(self) -> bool {
        !matches!(self, Self::Rotation | Self::Matrix)
    }

    /// Check if this type can connect to another type
    pub fn can_connect_to(self, other: PortType) -> bool {
        if self == other {
            return true;
        }

        // Implicit conversions
        match (self, other) {
            // Numeric types all convert into each other
            (
                Self::Bool | Self::Int | Self::Float | Self::Vector | Self::Color,
                Self::Bool | Self::Int | Self::Float | Self::Vector | Self::Color,
            ) => true,
            // Euler vectors and rotations
            (Self::Vector, Self::Rotation) | (Self::Rotation, Self::Vector) => true,
            _ => false,
        }
    }
}

/// A port on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Data type
    pub port_type: PortType,
    /// Default value (for unlinked inputs, and the value of constant outputs)
    pub default_value: Option<PortValue>,
    /// Whether multiple connections are allowed
    pub multi_connect: bool,
}

impl Port {
    /// Create a new port with a known ID
    pub fn new(
        id: PortId,
        name: impl Into<String>,
        port_type: PortType,
        direction: PortDirection,
    ) -> Self {
        let multi_connect = direction == PortDirection::Output;
        Self {
            id,
            name: name.into(),
            direction,
            port_type,
            default_value: None,
            multi_connect,
        }
    }

    /// Create a new input port
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(PortId::new(), name, port_type, PortDirection::Input)
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(PortId::new(), name, port_type, PortDirection::Output)
    }

    /// Set the default value
    pub fn with_default(mut self, value: PortValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Copy of this port with a fresh ID.
    ///
    /// Node types keep template ports; every instance gets its own IDs.
    pub fn instantiate(&self) -> Self {
        Self {
            id: PortId::new(),
            ..self.clone()
        }
    }

    /// Check if a connection to another port is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        // Must be opposite directions
        if self.direction == other.direction {
            return false;
        }

        self.port_type.can_connect_to(other.port_type)
    }
}

/// Value that can be stored in a port
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// 3D vector
    Vector([f32; 3]),
    /// Color
    Color([f32; 4]),
}

impl PortValue {
    /// Get the port type for this value
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Bool(_) => PortType::Bool,
            Self::Int(_) => PortType::Int,
            Self::Float(_) => PortType::Float,
            Self::Vector(_) => PortType::Vector,
            Self::Color(_) => PortType::Color,
        }
    }

    /// Whether two values are stored identically. Floats compare by bit
    /// pattern, so a NaN default matches itself.
    pub fn same(&self, other: &Self) -> bool {
        fn bits(values: &[f32]) -> impl Iterator<Item = u32> + '_ {
            values.iter().map(|v| v.to_bits())
        }
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Vector(a), Self::Vector(b)) => bits(a).eq(bits(b)),
            (Self::Color(a), Self::Color(b)) => bits(a).eq(bits(b)),
            _ => self == other,
        }
    }

    /// Convert the value to another socket type the way an implicit link would.
    ///
    /// Returns `None` for types without a default slot.
    pub fn convert(self, target: PortType) -> Option<PortValue> {
        let scalar = match self {
            Self::Bool(b) => f32::from(u8::from(b)),
            Self::Int(i) => i as f32,
            Self::Float(f) => f,
            Self::Vector(v) => (v[0] + v[1] + v[2]) / 3.0,
            Self::Color(c) => (c[0] + c[1] + c[2]) / 3.0,
        };
        let vector = match self {
            Self::Vector(v) => v,
            Self::Color(c) => [c[0], c[1], c[2]],
            _ => [scalar; 3],
        };
        match target {
            PortType::Bool => Some(Self::Bool(scalar != 0.0)),
            PortType::Int => Some(Self::Int(scalar.round() as i32)),
            PortType::Float => Some(Self::Float(scalar)),
            PortType::Vector => Some(Self::Vector(vector)),
            PortType::Color => match self {
                Self::Color(c) => Some(Self::Color(c)),
                _ => Some(Self::Color([vector[0], vector[1], vector[2], 1.0])),
            },
            PortType::Rotation | PortType::Matrix => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_conversions() {
        assert!(PortType::Float.can_connect_to(PortType::Vector));
        assert!(PortType::Vector.can_connect_to(PortType::Float));
        assert!(PortType::Bool.can_connect_to(PortType::Int));
        assert!(PortType::Vector.can_connect_to(PortType::Rotation));
        assert!(!PortType::Float.can_connect_to(PortType::Rotation));
        assert!(!PortType::Matrix.can_connect_to(PortType::Vector));
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(
            PortValue::Float(2.0).convert(PortType::Vector),
            Some(PortValue::Vector([2.0, 2.0, 2.0]))
        );
        assert_eq!(
            PortValue::Vector([1.0, 2.0, 3.0]).convert(PortType::Float),
            Some(PortValue::Float(2.0))
        );
        assert_eq!(PortValue::Bool(true).convert(PortType::Int), Some(PortValue::Int(1)));
        assert_eq!(PortValue::Float(1.0).convert(PortType::Matrix), None);
    }

    #[test]
    fn test_nan_values_are_the_same() {
        assert!(PortValue::Float(f32::NAN).same(&PortValue::Float(f32::NAN)));
        assert!(PortValue::Vector([f32::NAN, 1.0, 2.0]).same(&PortValue::Vector([f32::NAN, 1.0, 2.0])));
        assert!(!PortValue::Float(1.0).same(&PortValue::Float(2.0)));
        assert!(!PortValue::Float(1.0).same(&PortValue::Int(1)));
    }

    #[test]
    fn test_instantiate_gives_fresh_id() {
        let template = Port::input("Value", PortType::Float).with_default(PortValue::Float(0.5));
        let instance = template.instantiate();
        assert_ne!(template.id, instance.id);
        assert_eq!(instance.default_value, Some(PortValue::Float(0.5)));
    }
}
