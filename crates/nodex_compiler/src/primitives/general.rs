// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph construction for every [`Function`].
//!
//! Node families (float math, vector math, clamp, mix, map range,
//! separate/combine, vector rotate) are thin wrappers over
//! [`CompilationContext::primitive`]. Operations the editor cannot do natively
//! on vectors are emulated per component and framed.

use super::Function;
use crate::context::CompilationContext;
use crate::error::{CompileError, Result};
use crate::kind::{Handle, Kind, Literal, Operand};
use nodex_graph::catalog;

const ENTRY_WISE_LABEL: &str = "EntryWise FloatMath";
const PARALLEL_LABEL: &str = "Vec Parallel FloatMath";

/// Float math operation of a function
fn float_operation(function: Function) -> Option<&'static str> {
    let op = match function {
        Function::Add => "ADD",
        Function::Sub => "SUBTRACT",
        Function::Mult => "MULTIPLY",
        Function::Div => "DIVIDE",
        Function::Mod => "MODULO",
        Function::FloorMod => "FLOORED_MODULO",
        Function::Pow => "POWER",
        Function::Log => "LOGARITHM",
        Function::Sqrt => "SQRT",
        Function::InvSqrt => "INVERSE_SQRT",
        Function::Abs => "ABSOLUTE",
        Function::Round => "ROUND",
        Function::Floor => "FLOOR",
        Function::Ceil => "CEIL",
        Function::Trunc => "TRUNC",
        Function::Frac => "FRACT",
        Function::Wrap => "WRAP",
        Function::Snap => "SNAP",
        Function::PingPong => "PINGPONG",
        Function::Sin => "SINE",
        Function::Cos => "COSINE",
        Function::Tan => "TANGENT",
        Function::Asin => "ARCSINE",
        Function::Acos => "ARCCOSINE",
        Function::Atan => "ARCTANGENT",
        Function::Sinh => "SINH",
        Function::Cosh => "COSH",
        Function::Tanh => "TANH",
        Function::Rad => "RADIANS",
        Function::Deg => "DEGREES",
        Function::Min => "MINIMUM",
        Function::Max => "MAXIMUM",
        Function::SMin => "SMOOTH_MIN",
        Function::SMax => "SMOOTH_MAX",
        _ => return None,
    };
    Some(op)
}

/// Vector math operation of a function with a native vector form
fn vector_operation(function: Function) -> Option<&'static str> {
    let op = match function {
        Function::Add => "ADD",
        Function::Sub => "SUBTRACT",
        Function::Mult => "MULTIPLY",
        Function::Div => "DIVIDE",
        Function::Mod => "MODULO",
        Function::Wrap => "WRAP",
        Function::Snap => "SNAP",
        Function::Floor => "FLOOR",
        Function::Ceil => "CEIL",
        Function::Frac => "FRACTION",
        Function::Abs => "ABSOLUTE",
        Function::Sin => "SINE",
        Function::Cos => "COSINE",
        Function::Tan => "TANGENT",
        _ => return None,
    };
    Some(op)
}

/// Output slot and kind of a vector math operation
fn vector_output(operation: &str) -> (usize, Kind) {
    match operation {
        "DOT_PRODUCT" | "LENGTH" | "DISTANCE" => (1, Kind::Scalar),
        _ => (0, Kind::Vector),
    }
}

fn slots(args: &[Operand], offset: usize) -> Vec<(usize, &Operand)> {
    args.iter().enumerate().map(|(i, a)| (offset + i, a)).collect()
}

fn unsupported(function: Function) -> CompileError {
    CompileError::Type(format!("Function {}() has no node construction", function.name()))
}

impl CompilationContext<'_> {
    /// Build the nodes of a call whose arguments passed validation.
    ///
    /// A call already made with the same operands in this pass returns the
    /// handle it produced.
    pub(crate) fn apply(&mut self, function: Function, args: &[Operand]) -> Result<Handle> {
        let refs: Vec<&Operand> = args.iter().collect();
        let tag = self.tag(function.name(), &refs);
        if let Some(handle) = self.produced(&tag).and_then(<[Handle]>::first) {
            return Ok(handle.clone());
        }
        let handle = self.construct(function, &tag, args)?;
        self.remember(&tag, vec![handle.clone()]);
        Ok(handle)
    }

    fn construct(&mut self, function: Function, tag: &str, args: &[Operand]) -> Result<Handle> {
        let any_vector = args.iter().any(Operand::is_vector);
        match function {
            Function::Add
            | Function::Sub
            | Function::Mult
            | Function::Div
            | Function::Mod
            | Function::Wrap
            | Function::Snap
            | Function::Floor
            | Function::Ceil
            | Function::Frac
            | Function::Abs
            | Function::Sin
            | Function::Cos
            | Function::Tan => {
                if !any_vector {
                    self.float_math(tag, function, args)
                } else if self.has_node_type(catalog::VECTOR_MATH) {
                    let op = vector_operation(function).ok_or_else(|| unsupported(function))?;
                    self.vector_math(tag, op, args)
                } else {
                    self.component_wise(function, tag, args)
                }
            }
            Function::Pow
            | Function::Log
            | Function::Sqrt
            | Function::InvSqrt
            | Function::Round
            | Function::Trunc
            | Function::Asin
            | Function::Acos
            | Function::Atan
            | Function::Sinh
            | Function::Cosh
            | Function::Tanh
            | Function::PingPong => {
                if any_vector {
                    self.component_wise(function, tag, args)
                } else {
                    self.float_math(tag, function, args)
                }
            }
            Function::FloorMod | Function::Rad | Function::Deg | Function::SMin | Function::SMax => {
                self.float_math(tag, function, args)
            }
            Function::Min | Function::Max => self.min_max_chain(function, tag, args),
            Function::NRoot => {
                let exponent = self.apply(Function::Div, &[Operand::from(1.0), args[1].clone()])?;
                let root = self.apply(Function::Pow, &[args[0].clone(), exponent.clone().into()])?;
                self.frame(tag, "nRoot", &[exponent.socket().node, root.socket().node])?;
                Ok(root)
            }
            Function::Neg => {
                let negated = self.apply(Function::Sub, &[Operand::from(0.0), args[0].clone()])?;
                self.frame(tag, "Negate", &[negated.socket().node])?;
                Ok(negated)
            }
            Function::FloorDiv => {
                let quotient = self.apply(Function::Div, args)?;
                let floored = self.apply(Function::Floor, &[quotient.clone().into()])?;
                self.frame(tag, "FloorDiv", &[quotient.socket().node, floored.socket().node])?;
                Ok(floored)
            }
            Function::Lerp | Function::Mix => self.mix(tag, &args[0], &args[1], &args[2]),
            Function::Clamp | Function::ClampAuto => self.clamp(function, tag, args),
            Function::MapLinear => self.map_range(tag, "LINEAR", args),
            Function::MapStepped => self.map_range(tag, "STEPPED", args),
            Function::MapSmooth => self.map_range(tag, "SMOOTHSTEP", args),
            Function::MapSmoother => self.map_range(tag, "SMOOTHERSTEP", args),
            Function::CombineXyz => self.combine_tagged(tag, args),
            Function::RotateAxis => self.rotate_axis(tag, args),
        }
    }

    // ------------------------------------------------------------------
    // Families
    // ------------------------------------------------------------------

    fn float_math(&mut self, tag: &str, function: Function, args: &[Operand]) -> Result<Handle> {
        let op = float_operation(function).ok_or_else(|| unsupported(function))?;
        self.primitive(
            tag,
            catalog::MATH,
            &[("operation", op)],
            &slots(args, 0),
            (0, Kind::Scalar),
        )
    }

    fn vector_math(&mut self, tag: &str, op: &str, args: &[Operand]) -> Result<Handle> {
        self.primitive(
            tag,
            catalog::VECTOR_MATH,
            &[("operation", op)],
            &slots(args, 0),
            vector_output(op),
        )
    }

    fn mix(&mut self, tag: &str, factor: &Operand, a: &Operand, b: &Operand) -> Result<Handle> {
        if factor.is_vector() || a.is_vector() || b.is_vector() {
            let factor_mode = if factor.is_vector() { "NON_UNIFORM" } else { "UNIFORM" };
            let factor_slot = if factor.is_vector() { 1 } else { 0 };
            self.primitive(
                tag,
                catalog::MIX,
                &[("data_type", "VECTOR"), ("factor_mode", factor_mode)],
                &[(factor_slot, factor), (4, a), (5, b)],
                (1, Kind::Vector),
            )
        } else {
            self.primitive(
                tag,
                catalog::MIX,
                &[("data_type", "FLOAT")],
                &[(0, factor), (2, a), (3, b)],
                (0, Kind::Scalar),
            )
        }
    }

    fn map_range(&mut self, tag: &str, interpolation: &str, args: &[Operand]) -> Result<Handle> {
        if args.iter().any(Operand::is_vector) {
            self.primitive(
                tag,
                catalog::MAP_RANGE,
                &[("data_type", "FLOAT_VECTOR"), ("interpolation_type", interpolation)],
                &slots(args, 6),
                (1, Kind::Vector),
            )
        } else {
            self.primitive(
                tag,
                catalog::MAP_RANGE,
                &[("data_type", "FLOAT"), ("interpolation_type", interpolation)],
                &slots(args, 0),
                (0, Kind::Scalar),
            )
        }
    }

    fn clamp(&mut self, function: Function, tag: &str, args: &[Operand]) -> Result<Handle> {
        if args[0].is_vector() {
            return self.component_wise(function, tag, args);
        }
        if !self.has_node_type(catalog::CLAMP) {
            return self.compositor_clamp(function, tag, args);
        }
        let clamp_type = if function == Function::ClampAuto { "RANGE" } else { "MINMAX" };
        self.primitive(
            tag,
            catalog::CLAMP,
            &[("clamp_type", clamp_type)],
            &slots(args, 0),
            (0, Kind::Scalar),
        )
    }

    /// Clamp out of minimum and maximum, for editors without a clamp node
    fn compositor_clamp(&mut self, function: Function, tag: &str, args: &[Operand]) -> Result<Handle> {
        let value = args[0].clone();
        let low = args.get(1).cloned().unwrap_or(Operand::from(0.0));
        let high = args.get(2).cloned().unwrap_or(Operand::from(1.0));

        if function == Function::ClampAuto {
            let lower = self.apply(Function::Min, &[low.clone(), high.clone()])?;
            let upper = self.apply(Function::Max, &[low, high])?;
            let capped = self.apply(Function::Min, &[value, upper.clone().into()])?;
            let result = self.apply(Function::Max, &[lower.clone().into(), capped.clone().into()])?;
            let members = [lower, upper, capped, result.clone()].map(|h| h.socket().node);
            self.frame(tag, "ClampAuto|CompositorSpecial", &members)?;
            Ok(result)
        } else {
            let capped = self.apply(Function::Min, &[value, high])?;
            let result = self.apply(Function::Max, &[low, capped.clone().into()])?;
            self.frame(
                tag,
                "Clamp|CompositorSpecial",
                &[capped.socket().node, result.socket().node],
            )?;
            Ok(result)
        }
    }

    fn min_max_chain(&mut self, function: Function, tag: &str, args: &[Operand]) -> Result<Handle> {
        if let [a, b] = args {
            return self.float_math(tag, function, &[a.clone(), b.clone()]);
        }
        let mut accumulated = args[0].clone();
        let mut members = Vec::with_capacity(args.len() - 1);
        for arg in &args[1..] {
            let step_tag = self.tag(function.name(), &[&accumulated, arg]);
            let step = self.float_math(&step_tag, function, &[accumulated, arg.clone()])?;
            members.push(step.socket().node);
            accumulated = step.into();
        }
        self.frame(tag, "Batch MinMax", &members)?;
        accumulated
            .as_handle()
            .cloned()
            .ok_or_else(|| unsupported(function))
    }

    fn rotate_axis(&mut self, tag: &str, args: &[Operand]) -> Result<Handle> {
        let mut slots = vec![(0, &args[0]), (2, &args[1]), (3, &args[2])];
        if let Some(center) = args.get(3) {
            slots.push((1, center));
        }
        self.primitive(
            tag,
            catalog::VECTOR_ROTATE,
            &[("rotation_type", "AXIS_ANGLE")],
            &slots,
            (0, Kind::Vector),
        )
    }

    // ------------------------------------------------------------------
    // Separate / combine
    // ------------------------------------------------------------------

    /// Components of a vector through its separate node
    pub(crate) fn separate(&mut self, vector: &Operand) -> Result<[Handle; 3]> {
        let tag = self.tag("sepaxyz", &[vector]);
        if let Some([x, y, z]) = self.produced(&tag) {
            return Ok([x.clone(), y.clone(), z.clone()]);
        }
        let node = self.ensure_node(&tag, catalog::SEPARATE_XYZ, &[])?;
        self.activate(node);
        self.feed(node, 0, vector)?;
        let x = self.output_handle(node, 0, Kind::Scalar)?;
        let y = self.output_handle(node, 1, Kind::Scalar)?;
        let z = self.output_handle(node, 2, Kind::Scalar)?;
        self.remember(&tag, vec![x.clone(), y.clone(), z.clone()]);
        Ok([x, y, z])
    }

    /// Vector out of three scalars
    pub(crate) fn combine(&mut self, xyz: &[Operand]) -> Result<Handle> {
        if xyz.len() != 3 {
            return Err(CompileError::Arity("Vector must have exactly 3 elements".to_string()));
        }
        let refs: Vec<&Operand> = xyz.iter().collect();
        let tag = self.tag(Function::CombineXyz.name(), &refs);
        self.combine_tagged(&tag, xyz)
    }

    fn combine_tagged(&mut self, tag: &str, xyz: &[Operand]) -> Result<Handle> {
        self.primitive(tag, catalog::COMBINE_XYZ, &[], &slots(xyz, 0), (0, Kind::Vector))
    }

    /// Per-component emulation: split vector operands, apply the scalar form
    /// of `function` on each axis, recombine.
    fn component_wise(&mut self, function: Function, tag: &str, args: &[Operand]) -> Result<Handle> {
        let parallel = args.iter().skip(1).any(Operand::is_vector);
        let mut members = Vec::new();

        let mut split: Vec<[Operand; 3]> = Vec::with_capacity(args.len());
        for arg in args {
            let axes = match arg {
                Operand::Literal(Literal::Vector([x, y, z])) => {
                    [Operand::from(*x), Operand::from(*y), Operand::from(*z)]
                }
                operand if operand.is_vector() => {
                    let [x, y, z] = self.separate(operand)?;
                    members.push(x.socket().node);
                    [x.into(), y.into(), z.into()]
                }
                operand => [operand.clone(), operand.clone(), operand.clone()],
            };
            split.push(axes);
        }

        let mut results: Vec<Operand> = Vec::with_capacity(3);
        for axis in 0..3 {
            let axis_args: Vec<Operand> = split.iter().map(|axes| axes[axis].clone()).collect();
            let result = self.apply(function, &axis_args)?;
            members.push(result.socket().node);
            results.push(result.into());
        }

        let combined = self.combine(&results)?;
        members.push(combined.socket().node);
        members.dedup();
        let label = if parallel { PARALLEL_LABEL } else { ENTRY_WISE_LABEL };
        self.frame(tag, label, &members)?;
        Ok(combined)
    }
}
