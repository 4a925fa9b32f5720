// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node catalogs for each editor.
//!
//! Port layouts follow the host node types one to one, hidden ports
//! included, so callers address ports by index the same way in every editor
//! that has the node.

use crate::interface::TreeKind;
use crate::node::{NodeCategory, NodeRegistry, NodeType, DEFAULT_NODE_WIDTH};
use crate::port::{Port, PortType, PortValue};

/// Group input node
pub const GROUP_INPUT: &str = "group_input";
/// Group output node
pub const GROUP_OUTPUT: &str = "group_output";
/// Constant float
pub const VALUE: &str = "value";
/// Scalar math, `operation` property
pub const MATH: &str = "math";
/// Clamp, `clamp_type` property
pub const CLAMP: &str = "clamp";
/// Vector math, `operation` property
pub const VECTOR_MATH: &str = "vector_math";
/// Map range, `data_type` and `interpolation_type` properties
pub const MAP_RANGE: &str = "map_range";
/// Mix, `data_type` property
pub const MIX: &str = "mix";
/// Vector to X, Y, Z
pub const SEPARATE_XYZ: &str = "separate_xyz";
/// X, Y, Z to vector
pub const COMBINE_XYZ: &str = "combine_xyz";
/// Vector rotate, `rotation_type` property
pub const VECTOR_ROTATE: &str = "vector_rotate";
/// W, X, Y, Z to rotation
pub const QUATERNION_TO_ROTATION: &str = "quaternion_to_rotation";
/// Sixteen floats to a matrix
pub const COMBINE_MATRIX: &str = "combine_matrix";
/// Layout frame
pub const FRAME: &str = "frame";

/// Group input type. Its outputs are managed by the tree interface.
pub fn group_input_type() -> NodeType {
    NodeType {
        id: GROUP_INPUT.to_string(),
        name: "Group Input".to_string(),
        category: NodeCategory::Input,
        description: "Exposes the tree inputs".to_string(),
        inputs: vec![],
        outputs: vec![],
        width: DEFAULT_NODE_WIDTH,
    }
}

/// Group output type. Its inputs are managed by the tree interface.
pub fn group_output_type() -> NodeType {
    NodeType {
        id: GROUP_OUTPUT.to_string(),
        name: "Group Output".to_string(),
        category: NodeCategory::Output,
        description: "Receives the tree outputs".to_string(),
        inputs: vec![],
        outputs: vec![],
        width: DEFAULT_NODE_WIDTH,
    }
}

/// Create the node registry of an editor
pub fn create_registry(kind: TreeKind) -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Boundary and layout
    // ========================================================================

    registry.register(group_input_type());
    registry.register(group_output_type());

    registry.register(NodeType {
        id: FRAME.to_string(),
        name: "Frame".to_string(),
        category: NodeCategory::Layout,
        description: "Visual container grouping nodes".to_string(),
        inputs: vec![],
        outputs: vec![],
        width: 200.0,
    });

    registry.register(NodeType {
        id: VALUE.to_string(),
        name: "Value".to_string(),
        category: NodeCategory::Input,
        description: "Constant float value".to_string(),
        inputs: vec![],
        outputs: vec![Port::output("Value", PortType::Float).with_default(PortValue::Float(0.5))],
        width: DEFAULT_NODE_WIDTH,
    });

    // ========================================================================
    // Scalar math
    // ========================================================================

    registry.register(NodeType {
        id: MATH.to_string(),
        name: "Math".to_string(),
        category: NodeCategory::Math,
        description: "Scalar math operation".to_string(),
        inputs: vec![
            Port::input("Value", PortType::Float).with_default(PortValue::Float(0.5)),
            Port::input("Value_001", PortType::Float).with_default(PortValue::Float(0.5)),
            Port::input("Value_002", PortType::Float).with_default(PortValue::Float(0.5)),
        ],
        outputs: vec![Port::output("Value", PortType::Float)],
        width: DEFAULT_NODE_WIDTH,
    });

    registry.register(NodeType {
        id: MAP_RANGE.to_string(),
        name: "Map Range".to_string(),
        category: NodeCategory::Converter,
        description: "Remap a value from one range to another".to_string(),
        inputs: vec![
            Port::input("Value", PortType::Float).with_default(PortValue::Float(1.0)),
            Port::input("From Min", PortType::Float).with_default(PortValue::Float(0.0)),
            Port::input("From Max", PortType::Float).with_default(PortValue::Float(1.0)),
            Port::input("To Min", PortType::Float).with_default(PortValue::Float(0.0)),
            Port::input("To Max", PortType::Float).with_default(PortValue::Float(1.0)),
            Port::input("Steps", PortType::Float).with_default(PortValue::Float(4.0)),
            Port::input("Vector", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
            Port::input("From_Min_FLOAT3", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
            Port::input("From_Max_FLOAT3", PortType::Vector).with_default(PortValue::Vector([1.0; 3])),
            Port::input("To_Min_FLOAT3", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
            Port::input("To_Max_FLOAT3", PortType::Vector).with_default(PortValue::Vector([1.0; 3])),
            Port::input("Steps_FLOAT3", PortType::Vector).with_default(PortValue::Vector([4.0; 3])),
        ],
        outputs: vec![
            Port::output("Result", PortType::Float),
            Port::output("Vector", PortType::Vector),
        ],
        width: DEFAULT_NODE_WIDTH,
    });

    registry.register(NodeType {
        id: MIX.to_string(),
        name: "Mix".to_string(),
        category: NodeCategory::Converter,
        description: "Linear interpolation between A and B".to_string(),
        inputs: vec![
            Port::input("Factor", PortType::Float).with_default(PortValue::Float(0.5)),
            Port::input("Factor_Vector", PortType::Vector).with_default(PortValue::Vector([0.5; 3])),
            Port::input("A", PortType::Float).with_default(PortValue::Float(0.0)),
            Port::input("B", PortType::Float).with_default(PortValue::Float(0.0)),
            Port::input("A_Vector", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
            Port::input("B_Vector", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
        ],
        outputs: vec![
            Port::output("Result", PortType::Float),
            Port::output("Result_Vector", PortType::Vector),
        ],
        width: DEFAULT_NODE_WIDTH,
    });

    if kind != TreeKind::Compositor {
        registry.register(NodeType {
            id: CLAMP.to_string(),
            name: "Clamp".to_string(),
            category: NodeCategory::Math,
            description: "Clamp a value between Min and Max".to_string(),
            inputs: vec![
                Port::input("Value", PortType::Float).with_default(PortValue::Float(1.0)),
                Port::input("Min", PortType::Float).with_default(PortValue::Float(0.0)),
                Port::input("Max", PortType::Float).with_default(PortValue::Float(1.0)),
            ],
            outputs: vec![Port::output("Result", PortType::Float)],
            width: DEFAULT_NODE_WIDTH,
        });
    }

    // ========================================================================
    // Vectors
    // ========================================================================

    registry.register(NodeType {
        id: SEPARATE_XYZ.to_string(),
        name: "Separate XYZ".to_string(),
        category: NodeCategory::Converter,
        description: "Split a vector into its components".to_string(),
        inputs: vec![Port::input("Vector", PortType::Vector).with_default(PortValue::Vector([0.0; 3]))],
        outputs: vec![
            Port::output("X", PortType::Float),
            Port::output("Y", PortType::Float),
            Port::output("Z", PortType::Float),
        ],
        width: DEFAULT_NODE_WIDTH,
    });

    registry.register(NodeType {
        id: COMBINE_XYZ.to_string(),
        name: "Combine XYZ".to_string(),
        category: NodeCategory::Converter,
        description: "Build a vector from its components".to_string(),
        inputs: vec![
            Port::input("X", PortType::Float).with_default(PortValue::Float(0.0)),
            Port::input("Y", PortType::Float).with_default(PortValue::Float(0.0)),
            Port::input("Z", PortType::Float).with_default(PortValue::Float(0.0)),
        ],
        outputs: vec![Port::output("Vector", PortType::Vector)],
        width: DEFAULT_NODE_WIDTH,
    });

    if kind != TreeKind::Compositor {
        registry.register(NodeType {
            id: VECTOR_MATH.to_string(),
            name: "Vector Math".to_string(),
            category: NodeCategory::Vector,
            description: "Component-wise vector operation".to_string(),
            inputs: vec![
                Port::input("Vector", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
                Port::input("Vector_001", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
                Port::input("Vector_002", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
                Port::input("Scale", PortType::Float).with_default(PortValue::Float(1.0)),
            ],
            outputs: vec![
                Port::output("Vector", PortType::Vector),
                Port::output("Value", PortType::Float),
            ],
            width: DEFAULT_NODE_WIDTH,
        });

        registry.register(NodeType {
            id: VECTOR_ROTATE.to_string(),
            name: "Vector Rotate".to_string(),
            category: NodeCategory::Vector,
            description: "Rotate a vector around a center point".to_string(),
            inputs: vec![
                Port::input("Vector", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
                Port::input("Center", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
                Port::input("Axis", PortType::Vector).with_default(PortValue::Vector([0.0, 0.0, 1.0])),
                Port::input("Angle", PortType::Float).with_default(PortValue::Float(0.0)),
                Port::input("Rotation", PortType::Vector).with_default(PortValue::Vector([0.0; 3])),
            ],
            outputs: vec![Port::output("Vector", PortType::Vector)],
            width: DEFAULT_NODE_WIDTH,
        });
    }

    // ========================================================================
    // Constant assembly (geometry only)
    // ========================================================================

    if kind == TreeKind::Geometry {
        registry.register(NodeType {
            id: QUATERNION_TO_ROTATION.to_string(),
            name: "Quaternion to Rotation".to_string(),
            category: NodeCategory::Converter,
            description: "Build a rotation from quaternion components".to_string(),
            inputs: vec![
                Port::input("W", PortType::Float).with_default(PortValue::Float(1.0)),
                Port::input("X", PortType::Float).with_default(PortValue::Float(0.0)),
                Port::input("Y", PortType::Float).with_default(PortValue::Float(0.0)),
                Port::input("Z", PortType::Float).with_default(PortValue::Float(0.0)),
            ],
            outputs: vec![Port::output("Rotation", PortType::Rotation)],
            width: DEFAULT_NODE_WIDTH,
        });

        let matrix_inputs = (0..16)
            .map(|i| {
                let (column, row) = (i / 4, i % 4);
                let identity = if column == row { 1.0 } else { 0.0 };
                Port::input(format!("Column {} Row {}", column + 1, row + 1), PortType::Float)
                    .with_default(PortValue::Float(identity))
            })
            .collect();

        registry.register(NodeType {
            id: COMBINE_MATRIX.to_string(),
            name: "Combine Matrix".to_string(),
            category: NodeCategory::Converter,
            description: "Build a 4x4 matrix from column-major values".to_string(),
            inputs: matrix_inputs,
            outputs: vec![Port::output("Matrix", PortType::Matrix)],
            width: DEFAULT_NODE_WIDTH,
        });
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compositor_lacks_vector_math_and_clamp() {
        let registry = create_registry(TreeKind::Compositor);
        assert!(registry.contains(MATH));
        assert!(!registry.contains(CLAMP));
        assert!(!registry.contains(VECTOR_MATH));
        assert!(!registry.contains(COMBINE_MATRIX));
    }

    #[test]
    fn test_geometry_has_constant_assembly() {
        let registry = create_registry(TreeKind::Geometry);
        let matrix = registry.get(COMBINE_MATRIX).unwrap();
        assert_eq!(matrix.inputs.len(), 16);
        assert!(registry.contains(QUATERNION_TO_ROTATION));
        assert!(!create_registry(TreeKind::Shader).contains(QUATERNION_TO_ROTATION));
    }

    #[test]
    fn test_hidden_port_layouts() {
        let registry = create_registry(TreeKind::Shader);
        let map_range = registry.get(MAP_RANGE).unwrap();
        assert_eq!(map_range.inputs[6].port_type, PortType::Vector);
        assert_eq!(map_range.outputs[1].port_type, PortType::Vector);

        let mix = registry.get(MIX).unwrap();
        assert_eq!(mix.inputs[1].port_type, PortType::Vector);
        assert_eq!(mix.inputs[4].port_type, PortType::Vector);
    }

    #[test]
    fn test_instances_get_distinct_port_ids() {
        let registry = create_registry(TreeKind::Geometry);
        let a = registry.create_node(MATH).unwrap();
        let b = registry.create_node(MATH).unwrap();
        assert_ne!(a.inputs[0].id, b.inputs[0].id);
        assert_eq!(registry.types_in_category(NodeCategory::Layout).count(), 1);
    }
}
