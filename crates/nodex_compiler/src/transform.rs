// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonicalization of parsed expressions.
//!
//! Rewrites every operator into a function call and checks calls against the
//! function table, so that everything unsupported fails here, before the
//! node tree is touched.

use crate::ast::{BinaryOp, Expr, RawExpr, UnaryOp};
use crate::config::Variant;
use crate::error::{CompileError, Result};
use crate::parser;
use crate::primitives::Function;
use crate::tables;

/// Parse sanitized text and canonicalize it
pub fn build(text: &str, variant: Variant) -> Result<Expr> {
    let raw = parser::parse(text)?;
    transform(&raw, variant)
}

/// Canonicalize a parsed expression
pub fn transform(raw: &RawExpr, variant: Variant) -> Result<Expr> {
    match raw {
        RawExpr::Number(numeral) => numeral
            .parse::<f64>()
            .map(Expr::Constant)
            .map_err(|_| CompileError::Syntax(format!("Unrecognized Float '{numeral}'"))),
        RawExpr::Name(name) => Ok(Expr::Name(name.clone())),
        RawExpr::Unary { op: UnaryOp::Plus, operand } => transform(operand, variant),
        RawExpr::Unary { op: UnaryOp::Neg, operand } => {
            Ok(Expr::call(Function::Neg, vec![transform(operand, variant)?]))
        }
        RawExpr::Binary { op, left, right } => {
            let function = operator_function(*op)?;
            Ok(Expr::call(
                function,
                vec![transform(left, variant)?, transform(right, variant)?],
            ))
        }
        RawExpr::Call { name, args } => {
            let function = Function::from_name(name, variant)
                .ok_or_else(|| CompileError::Name(format!("Function '{name}' not recognized.")))?;
            function.signature().check(name, args.len())?;
            let args = args
                .iter()
                .map(|arg| transform(arg, variant))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expr::call(function, args))
        }
        RawExpr::Tuple(_) => Err(CompileError::Syntax("Wrong use of '( , )' Syntax".to_string())),
        RawExpr::List(items) => {
            if !variant.vector_syntax() {
                return Err(CompileError::Syntax("Unauthorized Symbol '['".to_string()));
            }
            if items.len() != 3 {
                return Err(CompileError::Arity("Vector must have exactly 3 elements".to_string()));
            }
            let items = items
                .iter()
                .map(|item| transform(item, variant))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expr::call(Function::CombineXyz, items))
        }
    }
}

fn operator_function(op: BinaryOp) -> Result<Function> {
    tables::operator_function(op.symbol())
        .and_then(|name| Function::from_name(name, Variant::Math))
        .ok_or_else(|| CompileError::Syntax(format!("Operator '{}' not supported", op.symbol())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(text: &str) -> String {
        build(text, Variant::Math).unwrap().to_string()
    }

    #[test]
    fn test_operators_become_calls() {
        assert_eq!(canonical("a+b*2"), "add(a, mult(b, 2))");
        assert_eq!(canonical("(a+b)*2"), "mult(add(a, b), 2)");
        assert_eq!(canonical("a//b"), "floordiv(a, b)");
        assert_eq!(canonical("a%b**2"), "mod(a, pow(b, 2))");
        assert_eq!(canonical("-a**2"), "neg(pow(a, 2))");
        assert_eq!(canonical("+a"), "a");
        assert_eq!(canonical("sin(a)/2.5"), "div(sin(a), 2.5)");
    }

    #[test]
    fn test_vector_literals() {
        let expr = build("[a,1,2]", Variant::Vector).unwrap();
        assert_eq!(expr.to_string(), "combixyz(a, 1, 2)");

        let err = build("[a,1]", Variant::Vector).unwrap_err();
        assert!(matches!(err, CompileError::Arity(ref m) if m == "Vector must have exactly 3 elements"));
        assert!(matches!(build("[a,1,2]", Variant::Math), Err(CompileError::Syntax(_))));
    }

    #[test]
    fn test_call_checks() {
        assert!(matches!(build("foo(a)", Variant::Math), Err(CompileError::Name(_))));
        assert!(matches!(build("combixyz(a,b,c)", Variant::Math), Err(CompileError::Name(_))));
        assert!(matches!(build("add(a,b,c)", Variant::Math), Err(CompileError::Arity(_))));
        assert!(matches!(build("min(a)", Variant::Math), Err(CompileError::Arity(_))));
        assert!(build("max(a,b,c,d)", Variant::Math).is_ok());
        assert!(build("clamp(a)", Variant::Math).is_ok());
    }

    #[test]
    fn test_tuples_rejected() {
        let err = build("(a,b)", Variant::Math).unwrap_err();
        assert_eq!(err.to_string(), "Wrong use of '( , )' Syntax");
    }
}
