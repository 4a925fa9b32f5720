// SPDX-License-Identifier: MIT OR Apache-2.0
//! Public handle operations of a compilation pass.
//!
//! Everything here validates kinds before touching the tree, so a rejected
//! operation leaves no partial nodes behind.

use crate::context::CompilationContext;
use crate::error::{CompileError, Result};
use crate::interface::ensure_socket;
use crate::kind::{Handle, Kind, Literal, Operand};
use crate::primitives::Function;
use nodex_graph::{PortDirection, SocketRef, TreeKind};
use tracing::trace;

const MUTATION_LABEL: &str = "Vector Mutation";

/// Axis addressed by a component index, accepting `-3..=2`
fn axis(index: isize) -> Result<usize> {
    match index {
        0..=2 => Ok(index as usize),
        -3..=-1 => Ok((index + 3) as usize),
        _ => Err(CompileError::Index(format!(
            "Vector component index {index} is out of range."
        ))),
    }
}

fn expect_vector(handle: &Handle, operation: &str) -> Result<()> {
    if handle.kind() == Kind::Vector {
        Ok(())
    } else {
        Err(CompileError::Type(format!(
            "{operation} requires a Vector, got a {}.",
            handle.kind()
        )))
    }
}

fn expect_component(value: &Operand) -> Result<()> {
    if value.kind().is_scalar_like() {
        Ok(())
    } else {
        Err(CompileError::Type(format!(
            "Vector components accept Scalar or Boolean values, got a {}.",
            value.kind()
        )))
    }
}

pub(crate) fn ensure_available(function: Function, editor: TreeKind) -> Result<()> {
    if function.available_in(editor) {
        Ok(())
    } else {
        Err(CompileError::Unavailable(format!(
            "Function {function}() is not available in the {} editor.",
            editor.name()
        )))
    }
}

/// Reject argument kinds a function cannot take
fn check_kinds(function: Function, args: &[Operand]) -> Result<()> {
    if args.iter().any(|arg| !arg.kind().is_numeric()) {
        let kinds: Vec<&str> = args.iter().map(|arg| arg.kind().name()).collect();
        return Err(CompileError::Type(format!(
            "Function {function}() does not support {}. Accepted kinds: Scalar, Boolean, Vector.",
            kinds.join(" and ")
        )));
    }

    let params = function.signature().params;
    for (position, arg) in args.iter().enumerate() {
        let scalar_param = function.scalar_only() || function.scalar_params().contains(&position);
        if scalar_param && arg.is_vector() {
            let param = params.get(position).or(params.last()).copied().unwrap_or("?");
            return Err(CompileError::Type(format!(
                "Function {function}() parameter '{param}' does not support Vector. Accepted kinds: Scalar, Boolean."
            )));
        }
    }
    Ok(())
}

impl CompilationContext<'_> {
    /// Handle on a boundary input, creating or retyping the socket.
    ///
    /// A given default is stored on the socket.
    pub fn input(&mut self, name: &str, kind: Kind, default: Option<Literal>) -> Result<Handle> {
        let port_type = kind
            .port_type()
            .ok_or_else(|| CompileError::Type(format!("Input '{name}' cannot be of kind {kind}.")))?;
        let socket = ensure_socket(self.tree_mut(), PortDirection::Input, name, port_type)?;
        if let Some(literal) = default {
            self.seed_default(PortDirection::Input, socket, &literal)?;
        }
        let group_input = self.tree().group_input();
        Ok(self.mint(kind, SocketRef::new(group_input, socket), Some(name.to_string())))
    }

    /// Output sink on a boundary socket of the given value kind
    pub fn output(&mut self, name: &str, kind: Kind) -> Result<Handle> {
        let port_type = kind
            .port_type()
            .ok_or_else(|| CompileError::Type(format!("Output '{name}' needs a value kind.")))?;
        let socket = ensure_socket(self.tree_mut(), PortDirection::Output, name, port_type)?;
        let group_output = self.tree().group_output();
        Ok(self.mint(Kind::Output, SocketRef::new(group_output, socket), Some(name.to_string())))
    }

    /// Route a value into an output sink.
    ///
    /// Handles are linked; literals replace any link with the socket default.
    pub fn assign(&mut self, output: &Handle, value: &Operand) -> Result<()> {
        if output.kind() != Kind::Output {
            return Err(CompileError::Type(format!(
                "Only outputs can be assigned to, got a {}.",
                output.kind()
            )));
        }
        match value {
            Operand::Handle(handle) if handle.kind() == Kind::Output => Err(CompileError::Type(format!(
                "Output '{}' cannot be read.",
                handle.boundary().unwrap_or_default()
            ))),
            Operand::Handle(handle) => {
                let target = output.socket();
                if self.tree().link_into(target.port).is_some_and(|l| l.from == handle.socket()) {
                    return Ok(());
                }
                self.tree_mut().reconnect(handle.socket(), target)?;
                trace!(from = %handle.marker(), output = output.boundary(), "assigned");
                Ok(())
            }
            Operand::Literal(literal) => {
                self.seed_default(PortDirection::Output, output.socket().port, literal)
            }
        }
    }

    /// Apply a function to operands.
    ///
    /// Calls whose arguments are all scalar literals fold to a literal when the
    /// function allows it; anything else becomes nodes.
    pub fn call(&mut self, function: Function, args: &[Operand]) -> Result<Operand> {
        function.signature().check(function.name(), args.len())?;
        ensure_available(function, self.editor())?;
        check_kinds(function, args)?;

        if function.folds() {
            let values: Option<Vec<f64>> = args
                .iter()
                .map(|arg| arg.as_literal().and_then(Literal::as_scalar).map(f64::from))
                .collect();
            if let Some(value) = values.and_then(|values| function.fold(&values)) {
                return Ok(Operand::from(value as f32));
            }
        }

        self.apply(function, args).map(Operand::Handle)
    }

    /// Scalar handles on the three components of a vector
    pub fn components(&mut self, vector: &Handle) -> Result<[Handle; 3]> {
        expect_vector(vector, "Component access")?;
        self.separate(&Operand::Handle(vector.clone()))
    }

    /// One component of a vector; negative indices count from the end
    pub fn component(&mut self, vector: &Handle, index: isize) -> Result<Handle> {
        expect_vector(vector, "Component access")?;
        let axis = axis(index)?;
        let [x, y, z] = self.components(vector)?;
        Ok(match axis {
            0 => x,
            1 => y,
            _ => z,
        })
    }

    /// New vector with some components replaced.
    ///
    /// The source vector is left as it was; the result goes through a
    /// separate/combine pair framed as a mutation.
    pub fn with_components(&mut self, vector: &Handle, updates: &[(isize, Operand)]) -> Result<Handle> {
        expect_vector(vector, "Component assignment")?;
        let mut replaced: [Option<Operand>; 3] = [None, None, None];
        for (index, value) in updates {
            let axis = axis(*index)?;
            expect_component(value)?;
            replaced[axis] = Some(value.clone());
        }

        let source = Operand::Handle(vector.clone());
        let frame_tag = self.tag("mutate", &[&source]);
        let mut members = Vec::new();

        let xyz: Vec<Operand> = if replaced.iter().all(Option::is_some) {
            replaced.into_iter().flatten().collect()
        } else {
            let current = self.separate(&source)?;
            members.push(current[0].socket().node);
            current
                .into_iter()
                .zip(replaced)
                .map(|(component, value)| value.unwrap_or(Operand::Handle(component)))
                .collect()
        };

        let combined = self.combine(&xyz)?;
        members.push(combined.socket().node);
        self.frame(&frame_tag, MUTATION_LABEL, &members)?;
        Ok(combined)
    }

    /// New vector built from exactly three scalar values
    pub fn with_all(&mut self, vector: &Handle, values: &[Operand]) -> Result<Handle> {
        expect_vector(vector, "Slice assignment")?;
        if values.len() != 3 {
            return Err(CompileError::Arity(
                "Slice assignment requires exactly 3 values.".to_string(),
            ));
        }
        values.iter().try_for_each(expect_component)?;
        let updates: Vec<(isize, Operand)> = values
            .iter()
            .enumerate()
            .map(|(index, value)| (index as isize, value.clone()))
            .collect();
        self.with_components(vector, &updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodex_graph::catalog;
    use nodex_graph::{NodeTree, PortValue, TreeKind};

    fn count(tree: &NodeTree, type_id: &str) -> usize {
        tree.nodes().filter(|n| n.node_type == type_id).count()
    }

    #[test]
    fn test_input_output_and_assign() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let a = ctx.input("a", Kind::Scalar, Some(Literal::Scalar(2.0))).unwrap();
        let out = ctx.output("Result", Kind::Scalar).unwrap();
        assert_eq!(a.boundary(), Some("a"));
        assert_eq!(out.kind(), Kind::Output);

        ctx.assign(&out, &a.clone().into()).unwrap();
        let tree = ctx.tree();
        assert_eq!(tree.link_into(out.socket().port).unwrap().from, a.socket());
        let socket = tree.interface_socket(a.socket().port).unwrap();
        assert_eq!(socket.default_value, Some(PortValue::Float(2.0)));
    }

    #[test]
    fn test_assigning_literal_unlinks_output() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let a = ctx.input("a", Kind::Scalar, None).unwrap();
        let out = ctx.output("Result", Kind::Scalar).unwrap();
        ctx.assign(&out, &a.into()).unwrap();
        ctx.assign(&out, &Operand::from(3.5)).unwrap();

        let tree = ctx.tree();
        assert!(tree.link_into(out.socket().port).is_none());
        let socket = tree.interface_socket(out.socket().port).unwrap();
        assert_eq!(socket.default_value, Some(PortValue::Float(3.5)));
    }

    #[test]
    fn test_outputs_are_write_only() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let a = ctx.input("a", Kind::Scalar, None).unwrap();
        let out = ctx.output("Result", Kind::Scalar).unwrap();

        assert!(matches!(ctx.call(Function::Add, &[out.clone().into(), a.clone().into()]), Err(CompileError::Type(_))));
        assert!(matches!(ctx.assign(&a, &Operand::from(1.0)), Err(CompileError::Type(_))));
        assert!(matches!(ctx.assign(&out, &out.clone().into()), Err(CompileError::Type(_))));
        assert!(matches!(ctx.input("o", Kind::Output, None), Err(CompileError::Type(_))));
    }

    #[test]
    fn test_call_rejects_rotation_without_nodes() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let r = ctx.input("r", Kind::Rotation, None).unwrap();
        let err = ctx.call(Function::Add, &[r.into(), Operand::from(1.0)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Function add() does not support Rotation and Scalar. Accepted kinds: Scalar, Boolean, Vector."
        );
        assert_eq!(ctx.created(), 0);
    }

    #[test]
    fn test_scalar_only_parameters() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let v = ctx.input("v", Kind::Vector, None).unwrap();
        let err = ctx.call(Function::Log, &[Operand::from(2.0), v.clone().into()]).unwrap_err();
        assert!(err.to_string().contains("parameter 'n'"));
        assert!(matches!(ctx.call(Function::Min, &[v.into(), Operand::from(1.0)]), Err(CompileError::Type(_))));
    }

    #[test]
    fn test_literal_calls_fold() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let folded = ctx.call(Function::Sqrt, &[Operand::from(16.0)]).unwrap();
        assert_eq!(folded, Operand::from(4.0));
        let added = ctx.call(Function::Add, &[Operand::from(1.0), Operand::from(2.0)]).unwrap();
        assert!(added.as_handle().is_some());
        assert_eq!(ctx.created(), 1);
    }

    #[test]
    fn test_unavailable_function_in_compositor() {
        let mut tree = NodeTree::new("comp", TreeKind::Compositor);
        let mut ctx = CompilationContext::new(&mut tree);
        let args: Vec<Operand> = (0..6).map(|i| Operand::from(i as f32)).collect();
        let err = ctx.call(Function::MapStepped, &args).unwrap_err();
        assert_eq!(err.to_string(), "Function mapst() is not available in the Compositor editor.");
    }

    #[test]
    fn test_component_indices() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let v = ctx.input("v", Kind::Vector, None).unwrap();
        let z = ctx.component(&v, 2).unwrap();
        let last = ctx.component(&v, -1).unwrap();
        assert_eq!(z, last);
        assert!(matches!(ctx.component(&v, 3), Err(CompileError::Index(_))));
        assert!(matches!(ctx.component(&v, -4), Err(CompileError::Index(_))));

        let s = ctx.input("s", Kind::Scalar, None).unwrap();
        assert!(matches!(ctx.component(&s, 0), Err(CompileError::Type(_))));
        assert_eq!(count(ctx.tree(), catalog::SEPARATE_XYZ), 1);
    }

    #[test]
    fn test_vector_mutation() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let v = ctx.input("v", Kind::Vector, None).unwrap();
        let k = ctx.input("k", Kind::Scalar, None).unwrap();
        let mutated = ctx.with_components(&v, &[(1, k.into())]).unwrap();
        assert_eq!(mutated.kind(), Kind::Vector);

        let tree = ctx.tree();
        assert_eq!(count(tree, catalog::SEPARATE_XYZ), 1);
        assert_eq!(count(tree, catalog::COMBINE_XYZ), 1);
        let frame = tree.node_by_name("G|F|mutate(v0)").unwrap();
        assert_eq!(frame.label, "Vector Mutation");
        assert_eq!(tree.children(frame.id).count(), 2);
    }

    #[test]
    fn test_slice_assignment_arity() {
        let mut tree = NodeTree::default();
        let mut ctx = CompilationContext::new(&mut tree);
        let v = ctx.input("v", Kind::Vector, None).unwrap();
        let err = ctx.with_all(&v, &[Operand::from(1.0), Operand::from(2.0)]).unwrap_err();
        assert_eq!(err.to_string(), "Slice assignment requires exactly 3 values.");

        let values = [Operand::from(1.0), Operand::from(2.0), Operand::from(3.0)];
        ctx.with_all(&v, &values).unwrap();
        assert_eq!(count(ctx.tree(), catalog::SEPARATE_XYZ), 0);
        assert_eq!(count(ctx.tree(), catalog::COMBINE_XYZ), 1);
    }
}
