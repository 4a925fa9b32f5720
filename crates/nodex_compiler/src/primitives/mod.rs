// SPDX-License-Identifier: MIT OR Apache-2.0
//! Operation primitives.
//!
//! [`Function`] is the closed set of operations an expression may call. Each
//! one has a fixed [`Signature`], a Kind-dispatch rule and a graph
//! construction routine (see `general`).

mod general;

use crate::config::Variant;
use crate::error::{CompileError, Result};
use nodex_graph::TreeKind;
use std::fmt;

/// Parameter list of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Parameter names
    pub params: &'static [&'static str],
    /// Number of leading parameters that must be given
    pub required: usize,
    /// Whether any number of arguments from `required` upward is accepted
    pub variadic: bool,
}

impl Signature {
    const fn fixed(params: &'static [&'static str]) -> Self {
        Self { params, required: params.len(), variadic: false }
    }

    const fn optional(params: &'static [&'static str], required: usize) -> Self {
        Self { params, required, variadic: false }
    }

    const fn variadic(params: &'static [&'static str]) -> Self {
        Self { params, required: params.len(), variadic: true }
    }

    /// Check an argument count
    pub fn check(&self, name: &str, received: usize) -> Result<()> {
        if self.variadic {
            if received < self.required {
                return Err(CompileError::Arity(format!(
                    "Function {name}() needs two Params or more."
                )));
            }
            return Ok(());
        }
        let params = self.params.join(", ");
        if received > self.params.len() {
            return Err(CompileError::Arity(format!(
                "Function {name}({params}) received extra Param(s). Expected {}. Received {received}.",
                self.params.len()
            )));
        }
        if received < self.required {
            return Err(CompileError::Arity(format!(
                "Function {name}({params}) needs more Param(s). Expected {}. Received {received}.",
                self.required
            )));
        }
        Ok(())
    }
}

macro_rules! functions {
    ($($variant:ident => $name:literal,)*) => {
        /// Operation callable from an expression
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(missing_docs)]
        pub enum Function {
            $($variant,)*
        }

        impl Function {
            /// Every function
            pub const ALL: &'static [Function] = &[$(Function::$variant,)*];

            /// Name used in expressions
            pub fn name(self) -> &'static str {
                match self {
                    $(Function::$variant => $name,)*
                }
            }
        }
    };
}

functions! {
    Add => "add",
    Sub => "sub",
    Mult => "mult",
    Div => "div",
    Pow => "pow",
    Log => "log",
    Sqrt => "sqrt",
    InvSqrt => "invsqrt",
    NRoot => "nroot",
    Abs => "abs",
    Neg => "neg",
    Round => "round",
    Floor => "floor",
    Ceil => "ceil",
    Trunc => "trunc",
    Frac => "frac",
    Mod => "mod",
    FloorMod => "floormod",
    Wrap => "wrap",
    Snap => "snap",
    PingPong => "pingpong",
    FloorDiv => "floordiv",
    Sin => "sin",
    Cos => "cos",
    Tan => "tan",
    Asin => "asin",
    Acos => "acos",
    Atan => "atan",
    Sinh => "sinh",
    Cosh => "cosh",
    Tanh => "tanh",
    Rad => "rad",
    Deg => "deg",
    Min => "min",
    SMin => "smin",
    Max => "max",
    SMax => "smax",
    Lerp => "lerp",
    Mix => "mix",
    Clamp => "clamp",
    ClampAuto => "clampauto",
    MapLinear => "mapl",
    MapStepped => "mapst",
    MapSmooth => "mapsmo",
    MapSmoother => "mapsmoo",
    CombineXyz => "combixyz",
    RotateAxis => "rotaxis",
}

impl Function {
    /// Look up a function available in an expression variant
    pub fn from_name(name: &str, variant: Variant) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .filter(|f| !f.vector_only() || variant.vector_syntax())
    }

    /// Functions available in an expression variant
    pub fn available(variant: Variant) -> impl Iterator<Item = Function> {
        Self::ALL
            .iter()
            .copied()
            .filter(move |f| !f.vector_only() || variant.vector_syntax())
    }

    /// Whether the function only exists in the vector variant
    pub fn vector_only(self) -> bool {
        matches!(self, Self::CombineXyz | Self::RotateAxis)
    }

    /// Whether the function exists in an editor
    pub fn available_in(self, editor: TreeKind) -> bool {
        match self {
            Self::MapStepped | Self::MapSmooth | Self::MapSmoother | Self::RotateAxis => {
                editor != TreeKind::Compositor
            }
            _ => true,
        }
    }

    /// Parameter list
    pub fn signature(self) -> Signature {
        match self {
            Self::Add | Self::Sub | Self::Mult | Self::Div | Self::Mod | Self::FloorMod | Self::FloorDiv => {
                Signature::fixed(&["a", "b"])
            }
            Self::Pow | Self::Log | Self::NRoot => Signature::fixed(&["a", "n"]),
            Self::Sqrt
            | Self::InvSqrt
            | Self::Abs
            | Self::Neg
            | Self::Round
            | Self::Floor
            | Self::Ceil
            | Self::Trunc
            | Self::Frac
            | Self::Sin
            | Self::Cos
            | Self::Tan
            | Self::Asin
            | Self::Acos
            | Self::Atan
            | Self::Sinh
            | Self::Cosh
            | Self::Tanh
            | Self::Rad
            | Self::Deg => Signature::fixed(&["a"]),
            Self::Wrap => Signature::fixed(&["v", "a", "b"]),
            Self::Snap => Signature::fixed(&["v", "i"]),
            Self::PingPong => Signature::fixed(&["v", "scale"]),
            Self::Min | Self::Max => Signature::variadic(&["a", "b"]),
            Self::SMin | Self::SMax => Signature::fixed(&["a", "b", "dist"]),
            Self::Lerp | Self::Mix => Signature::fixed(&["f", "a", "b"]),
            Self::Clamp => Signature::optional(&["v", "a", "b"], 1),
            Self::ClampAuto => Signature::fixed(&["v", "a", "b"]),
            Self::MapLinear | Self::MapSmooth | Self::MapSmoother => {
                Signature::fixed(&["v", "a", "b", "x", "y"])
            }
            Self::MapStepped => Signature::fixed(&["v", "a", "b", "x", "y", "step"]),
            Self::CombineXyz => Signature::fixed(&["x", "y", "z"]),
            Self::RotateAxis => Signature::optional(&["v", "x", "f", "c"], 3),
        }
    }

    /// Parameters that only accept scalars, by position.
    ///
    /// Functions that are [`scalar_only`](Self::scalar_only) apply this to every parameter.
    pub(crate) fn scalar_params(self) -> &'static [usize] {
        match self {
            Self::Log | Self::NRoot | Self::PingPong => &[1],
            Self::Clamp | Self::ClampAuto => &[1, 2],
            Self::RotateAxis => &[2],
            _ => &[],
        }
    }

    /// Whether the function only ever takes scalars
    pub(crate) fn scalar_only(self) -> bool {
        matches!(
            self,
            Self::FloorMod | Self::Rad | Self::Deg | Self::SMin | Self::SMax | Self::Min | Self::Max | Self::CombineXyz
        )
    }

    /// Evaluate the function on plain numbers, for functions folded at compile time
    pub fn fold(self, args: &[f64]) -> Option<f64> {
        let a = *args.first()?;
        let value = match self {
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Asin => a.asin(),
            Self::Acos => a.acos(),
            Self::Atan => a.atan(),
            Self::Sinh => a.sinh(),
            Self::Cosh => a.cosh(),
            Self::Tanh => a.tanh(),
            Self::Sqrt => a.sqrt(),
            Self::InvSqrt => 1.0 / a.sqrt(),
            Self::Log => a.ln() / args.get(1)?.ln(),
            Self::Rad => a.to_radians(),
            Self::Deg => a.to_degrees(),
            _ => return None,
        };
        Some(value)
    }

    /// Whether pure-literal calls are evaluated without a node
    pub fn folds(self) -> bool {
        matches!(
            self,
            Self::Sin
                | Self::Cos
                | Self::Tan
                | Self::Asin
                | Self::Acos
                | Self::Atan
                | Self::Sinh
                | Self::Cosh
                | Self::Tanh
                | Self::Sqrt
                | Self::InvSqrt
                | Self::Log
                | Self::Rad
                | Self::Deg
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_respects_variant() {
        assert_eq!(Function::from_name("sin", Variant::Math), Some(Function::Sin));
        assert_eq!(Function::from_name("combixyz", Variant::Math), None);
        assert_eq!(Function::from_name("combixyz", Variant::Vector), Some(Function::CombineXyz));
        assert_eq!(Function::from_name("foo", Variant::Vector), None);
        assert!(Function::available(Variant::Vector).count() > Function::available(Variant::Math).count());
    }

    #[test]
    fn test_arity_messages() {
        let err = Function::Add.signature().check("add", 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Function add(a, b) received extra Param(s). Expected 2. Received 3."
        );
        let err = Function::Wrap.signature().check("wrap", 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Function wrap(v, a, b) needs more Param(s). Expected 3. Received 1."
        );
        let err = Function::Min.signature().check("min", 1).unwrap_err();
        assert_eq!(err.to_string(), "Function min() needs two Params or more.");
        assert!(Function::Max.signature().check("max", 5).is_ok());
        assert!(Function::Clamp.signature().check("clamp", 1).is_ok());
        assert!(Function::RotateAxis.signature().check("rotaxis", 3).is_ok());
    }

    #[test]
    fn test_folding() {
        assert_eq!(Function::Sin.fold(&[0.0]), Some(0.0));
        assert_eq!(Function::Deg.fold(&[std::f64::consts::PI]), Some(180.0));
        let log = Function::Log.fold(&[8.0, 2.0]).unwrap();
        assert!((log - 3.0).abs() < 1e-12);
        assert_eq!(Function::Add.fold(&[1.0, 2.0]), None);
        assert!(!Function::Add.folds());
    }

    #[test]
    fn test_editor_availability() {
        assert!(!Function::MapStepped.available_in(TreeKind::Compositor));
        assert!(Function::MapLinear.available_in(TreeKind::Compositor));
        assert!(Function::MapStepped.available_in(TreeKind::Shader));
    }
}
