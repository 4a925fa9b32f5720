// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boundary sockets of the generated tree.
//!
//! Inputs are created lazily and pruned when their identifier disappears;
//! outputs are only ever created or retyped. Types pass through the editor's
//! compatibility table first, so a compositor silently gets an `Int` where a
//! `Bool` was asked for.

use crate::context::{CompilationContext, DEFAULT_PREFIX};
use crate::error::{CompileError, Result};
use crate::kind::{Literal, Operand};
use nodex_graph::catalog;
use nodex_graph::{InterfaceError, NodeId, NodeTree, PortDirection, PortId, PortType, SocketRef};
use tracing::debug;

/// Horizontal distance between a group node and its default-assembly nodes
const ASSEMBLY_OFFSET: f32 = 250.0;
/// Vertical spacing of default-assembly nodes
const ASSEMBLY_SPACING: f32 = 150.0;

/// Name of an interface side, as used in default-assembly tags
pub fn side_name(direction: PortDirection) -> &'static str {
    match direction {
        PortDirection::Input => "inputs",
        PortDirection::Output => "outputs",
    }
}

/// Look up a boundary socket by name, creating or retyping it as needed
pub fn ensure_socket(
    tree: &mut NodeTree,
    direction: PortDirection,
    name: &str,
    port_type: PortType,
) -> Result<PortId> {
    let editor = tree.kind();
    let wanted = editor
        .adjust_socket_type(port_type)
        .ok_or(InterfaceError::Unavailable { port_type, editor })?;

    if let Some(socket) = tree.interface_socket_by_name(direction, name) {
        let (id, current) = (socket.id, socket.port_type);
        if current != wanted {
            tree.retype_socket(id, wanted)?;
            debug!(name, from = current.name(), to = wanted.name(), "retyped socket");
        }
        return Ok(id);
    }

    let id = tree.new_socket(name, direction, wanted)?;
    debug!(name, side = side_name(direction), port_type = wanted.name(), "created socket");
    Ok(id)
}

/// Remove input sockets whose name is not in `keep`, returning how many went
pub fn prune_inputs<S: AsRef<str>>(tree: &mut NodeTree, keep: &[S]) -> usize {
    let stale: Vec<PortId> = tree
        .interface_sockets(PortDirection::Input)
        .filter(|s| !keep.iter().any(|k| k.as_ref() == s.name))
        .map(|s| s.id)
        .collect();
    let mut removed = 0;
    for id in stale {
        if let Ok(socket) = tree.remove_socket(id) {
            debug!(name = %socket.name, "pruned input socket");
            removed += 1;
        }
    }
    removed
}

/// Drop whatever feeds a named output socket
pub fn unlink_output(tree: &mut NodeTree, name: &str) -> usize {
    match tree.interface_socket_by_name(PortDirection::Output, name) {
        Some(socket) => {
            let id = socket.id;
            tree.disconnect_input(id)
        }
        None => 0,
    }
}

impl CompilationContext<'_> {
    /// Store a literal as the default of a boundary socket.
    ///
    /// On the output side this replaces any link. Rotation and matrix sockets
    /// have no default slot and get a constant-assembly node instead; on the
    /// output side that node is linked in.
    pub(crate) fn seed_default(
        &mut self,
        direction: PortDirection,
        socket: PortId,
        literal: &Literal,
    ) -> Result<()> {
        let port_type = self
            .tree()
            .interface_socket(socket)
            .map(|s| s.port_type)
            .ok_or(InterfaceError::NotFound(socket))?;

        if port_type.has_default_slot() {
            let value = literal.to_port_value().ok_or_else(|| {
                CompileError::Type(format!(
                    "A {} literal cannot be stored on a {} socket",
                    literal.kind(),
                    port_type.name()
                ))
            })?;
            if direction == PortDirection::Output {
                self.tree_mut().disconnect_input(socket);
            }
            if self.tree_mut().set_socket_default(socket, value)? {
                debug!(side = side_name(direction), "socket default changed");
            }
            return Ok(());
        }

        let node = self.assembly_node(direction, socket, port_type, literal)?;
        if direction == PortDirection::Output {
            let from = self
                .tree()
                .node(node)
                .and_then(|n| n.output(0))
                .map(|p| SocketRef::new(node, p.id))
                .ok_or_else(|| CompileError::Graph("assembly node has no output".to_string()))?;
            if self.tree().link_into(socket).map(|l| l.from) != Some(from) {
                let target = SocketRef::new(self.tree().group_output(), socket);
                self.tree_mut().reconnect(from, target)?;
            }
        }
        Ok(())
    }

    fn assembly_node(
        &mut self,
        direction: PortDirection,
        socket: PortId,
        port_type: PortType,
        literal: &Literal,
    ) -> Result<NodeId> {
        let index = self.tree().interface_index(socket).unwrap_or(0);
        let side = side_name(direction);
        let (tag, type_id, values) = match (literal, port_type) {
            (Literal::Rotation(quaternion), PortType::Rotation) => (
                format!("{DEFAULT_PREFIX}Quat|{side}[{index}]"),
                catalog::QUATERNION_TO_ROTATION,
                quaternion.to_vec(),
            ),
            (Literal::Matrix(matrix), PortType::Matrix) => (
                format!("{DEFAULT_PREFIX}Matrix|{side}[{index}]"),
                catalog::COMBINE_MATRIX,
                matrix.to_vec(),
            ),
            _ => {
                return Err(CompileError::Type(format!(
                    "A {} literal cannot be stored on a {} socket",
                    literal.kind(),
                    port_type.name()
                )))
            }
        };

        let node = self.ensure_node(&tag, type_id, &[])?;
        for (slot, value) in values.into_iter().enumerate() {
            self.feed(node, slot, &Operand::from(value))?;
        }

        let anchor = match direction {
            PortDirection::Input => self.tree().group_input(),
            PortDirection::Output => self.tree().group_output(),
        };
        let anchor = self.tree().node(anchor).map_or([0.0, 0.0], |n| n.position);
        if let Some(n) = self.tree_mut().node_mut(node) {
            n.position = [
                anchor[0] - ASSEMBLY_OFFSET,
                anchor[1] - ASSEMBLY_SPACING * index as f32,
            ];
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodex_graph::{PortValue, TreeKind};

    #[test]
    fn test_ensure_socket_reuses_and_retypes() {
        let mut tree = NodeTree::default();
        let a = ensure_socket(&mut tree, PortDirection::Input, "a", PortType::Float).unwrap();
        let again = ensure_socket(&mut tree, PortDirection::Input, "a", PortType::Vector).unwrap();
        assert_eq!(a, again);
        assert_eq!(tree.interface_socket(a).unwrap().port_type, PortType::Vector);
        assert_eq!(tree.interface_sockets(PortDirection::Input).count(), 1);
    }

    #[test]
    fn test_compositor_coerces_bool_and_rejects_rotation() {
        let mut tree = NodeTree::new("comp", TreeKind::Compositor);
        let flag = ensure_socket(&mut tree, PortDirection::Input, "flag", PortType::Bool).unwrap();
        assert_eq!(tree.interface_socket(flag).unwrap().port_type, PortType::Int);

        let err = ensure_socket(&mut tree, PortDirection::Input, "r", PortType::Rotation).unwrap_err();
        assert!(matches!(err, CompileError::Unavailable(_)));
    }

    #[test]
    fn test_prune_keeps_listed_inputs_and_all_outputs() {
        let mut tree = NodeTree::default();
        for name in ["a", "b", "c"] {
            ensure_socket(&mut tree, PortDirection::Input, name, PortType::Float).unwrap();
        }
        ensure_socket(&mut tree, PortDirection::Output, "Result", PortType::Float).unwrap();

        assert_eq!(prune_inputs(&mut tree, &["b"]), 2);
        let names: Vec<_> = tree
            .interface_sockets(PortDirection::Input)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["b"]);
        assert_eq!(tree.interface_sockets(PortDirection::Output).count(), 1);
    }

    #[test]
    fn test_seed_scalar_default() {
        let mut tree = NodeTree::default();
        let socket = ensure_socket(&mut tree, PortDirection::Input, "a", PortType::Float).unwrap();
        let mut ctx = CompilationContext::new(&mut tree);
        ctx.seed_default(PortDirection::Input, socket, &Literal::Scalar(1.5)).unwrap();
        assert_eq!(
            ctx.tree().interface_socket(socket).unwrap().default_value,
            Some(PortValue::Float(1.5))
        );
    }

    #[test]
    fn test_rotation_output_uses_assembly_node() {
        let mut tree = NodeTree::default();
        let socket = ensure_socket(&mut tree, PortDirection::Output, "Rot", PortType::Rotation).unwrap();
        let mut ctx = CompilationContext::new(&mut tree);
        ctx.seed_default(PortDirection::Output, socket, &Literal::Rotation([1.0, 0.0, 0.0, 0.0]))
            .unwrap();

        let tree = ctx.tree();
        let node = tree.node_by_name("D|Quat|outputs[0]").unwrap();
        assert_eq!(node.node_type, catalog::QUATERNION_TO_ROTATION);
        assert_eq!(tree.link_into(socket).unwrap().from.node, node.id);
    }

    #[test]
    fn test_matrix_default_unavailable_in_shader() {
        let mut tree = NodeTree::new("shader", TreeKind::Shader);
        let err = ensure_socket(&mut tree, PortDirection::Output, "M", PortType::Matrix).unwrap_err();
        assert_eq!(err.to_string(), "Matrix sockets are unavailable in the Shader editor");
    }
}
