// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compilation passes.
//!
//! A pass syncs the boundary interface with the expression's variables,
//! synthesizes the canonical tree bottom-up, routes the result into the
//! output socket and sweeps generated nodes it no longer needs. The sweep
//! only runs when everything before it succeeded; a failed pass leaves the
//! tree as it found it plus whatever nodes were added before the failure.

use crate::ast::Expr;
use crate::config::CompileOptions;
use crate::context::{is_generated, CompilationContext};
use crate::error::{CompileError, Result};
use crate::interface::prune_inputs;
use crate::kind::{Handle, Kind, Operand};
use crate::resolver::ensure_available;
use crate::sanitize::{apply_macros, Sanitized, Sanitizer};
use crate::transform;
use nodex_graph::{NodeTree, TreeKind};
use std::collections::HashMap;
use tracing::info;

/// Outcome of a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthReport {
    /// Generated nodes in the tree after the pass
    pub node_count: usize,
    /// Nodes created by the pass
    pub created: usize,
    /// Stale nodes removed by the sweep
    pub removed: usize,
    /// Kind of the value routed into the output
    pub result_kind: Kind,
}

/// Intermediate value: constants stay numbers until something consumes them
enum Term {
    Constant(f64),
    Value(Operand),
}

/// Compile raw expression text into a tree
pub fn compile(tree: &mut NodeTree, text: &str, options: &CompileOptions) -> Result<SynthReport> {
    let text = if options.macros {
        apply_macros(text).unwrap_or_else(|| text.to_string())
    } else {
        text.to_string()
    };
    let sanitized = Sanitizer::from_options(options).sanitize(&text)?;
    let expr = transform::build(&sanitized.text, options.variant)?;
    synthesize(tree, &sanitized, &expr, options)
}

/// Run one pass for an already canonicalized expression
pub fn synthesize(
    tree: &mut NodeTree,
    sanitized: &Sanitized,
    expr: &Expr,
    options: &CompileOptions,
) -> Result<SynthReport> {
    check_availability(expr, tree.kind())?;

    let mut ctx = CompilationContext::new(tree);
    let mut inputs: HashMap<&str, Handle> = HashMap::with_capacity(sanitized.variables.len());
    for name in &sanitized.variables {
        let handle = ctx.input(name, options.variable_kind(name), None)?;
        inputs.insert(name.as_str(), handle);
    }
    prune_inputs(ctx.tree_mut(), &sanitized.variables);

    let value = match evaluate(&mut ctx, expr, &inputs, options)? {
        Term::Constant(value) => Operand::from(value as f32),
        Term::Value(operand) => operand,
    };
    let result_kind = value.kind();
    let output_kind = match result_kind {
        Kind::Vector | Kind::Rotation | Kind::Matrix => result_kind,
        Kind::Scalar | Kind::Boolean | Kind::Output => options.variant.output_kind(),
    };
    let output = ctx.output(&options.output_name, output_kind)?;
    ctx.assign(&output, &value)?;

    ctx.place_group_output();
    let created = ctx.created();
    let removed = ctx.sweep();
    let node_count = ctx.tree().nodes().filter(|n| is_generated(&n.name)).count();

    info!(
        expression = %expr,
        nodes = node_count,
        created,
        removed,
        "compiled expression"
    );
    Ok(SynthReport { node_count, created, removed, result_kind })
}

/// Fail before any edit when a called function is missing in the editor
fn check_availability(expr: &Expr, editor: TreeKind) -> Result<()> {
    if let Expr::Call { function, args } = expr {
        ensure_available(*function, editor)?;
        for arg in args {
            check_availability(arg, editor)?;
        }
    }
    Ok(())
}

fn evaluate(
    ctx: &mut CompilationContext<'_>,
    expr: &Expr,
    inputs: &HashMap<&str, Handle>,
    options: &CompileOptions,
) -> Result<Term> {
    match expr {
        Expr::Constant(value) => Ok(Term::Constant(*value)),
        Expr::Name(name) => inputs
            .get(name.as_str())
            .map(|handle| Term::Value(handle.clone().into()))
            .ok_or_else(|| CompileError::Name(format!("Variable '{name}' not recognized."))),
        Expr::Call { function, args } => {
            let terms = args
                .iter()
                .map(|arg| evaluate(ctx, arg, inputs, options))
                .collect::<Result<Vec<_>>>()?;

            if function.folds() {
                let values: Option<Vec<f64>> = terms
                    .iter()
                    .map(|term| match term {
                        Term::Constant(value) => Some(*value),
                        Term::Value(_) => None,
                    })
                    .collect();
                if let Some(value) = values.and_then(|values| function.fold(&values)) {
                    return Ok(Term::Constant(value));
                }
            }

            let operands = terms
                .into_iter()
                .map(|term| match term {
                    Term::Constant(value) if options.constant_nodes => ctx.constant(value).map(Operand::Handle),
                    Term::Constant(value) => Ok(Operand::from(value as f32)),
                    Term::Value(operand) => Ok(operand),
                })
                .collect::<Result<Vec<_>>>()?;
            ctx.call(*function, &operands).map(Term::Value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodex_graph::catalog;
    use nodex_graph::{PortDirection, PortValue};

    fn output_default(tree: &NodeTree) -> Option<PortValue> {
        tree.interface_socket_by_name(PortDirection::Output, "Result")
            .and_then(|s| s.default_value)
    }

    #[test]
    fn test_folded_call_sets_output_default() {
        let mut tree = NodeTree::default();
        let report = compile(&mut tree, "sqrt(16)+0", &CompileOptions::default()).unwrap();
        assert_eq!(report.result_kind, Kind::Scalar);
        // sqrt folds, add does not
        assert_eq!(tree.nodes().filter(|n| n.node_type == catalog::MATH).count(), 1);
        assert!(tree.node_by_name("C|4").is_some());
    }

    #[test]
    fn test_constant_expression_has_no_nodes() {
        let mut tree = NodeTree::default();
        let report = compile(&mut tree, "sin(0)", &CompileOptions::default()).unwrap();
        assert_eq!(report.node_count, 0);
        assert_eq!(output_default(&tree), Some(PortValue::Float(0.0)));
    }

    #[test]
    fn test_literals_in_slots_without_constant_nodes() {
        let mut tree = NodeTree::default();
        let options = CompileOptions { constant_nodes: false, ..CompileOptions::default() };
        let report = compile(&mut tree, "a*2", &options).unwrap();
        assert_eq!(report.node_count, 1);
        let node = tree.node_by_name("F|mult(f0,p0)").unwrap();
        assert_eq!(node.input(1).unwrap().default_value, Some(PortValue::Float(2.0)));
    }

    #[test]
    fn test_unavailable_function_fails_before_edits() {
        let mut tree = NodeTree::new("comp", TreeKind::Compositor);
        let err = compile(&mut tree, "a+mapst(a,0,1,0,1,0.5)", &CompileOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Function mapst() is not available in the Compositor editor.");
        assert_eq!(tree.interface_sockets(PortDirection::Input).count(), 0);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_vector_result_retypes_math_output() {
        let mut tree = NodeTree::default();
        let options = CompileOptions::default().with_variable_kind("v", Kind::Vector);
        let report = compile(&mut tree, "v*2", &options).unwrap();
        assert_eq!(report.result_kind, Kind::Vector);
        let output = tree.interface_socket_by_name(PortDirection::Output, "Result").unwrap();
        assert_eq!(output.port_type, nodex_graph::PortType::Vector);
    }
}
