// SPDX-License-Identifier: MIT OR Apache-2.0
//! Expression trees.
//!
//! [`RawExpr`] is what the parser produces: it still carries operators,
//! tuples and bracket lists. [`Expr`] is the canonical tree after
//! [`transform`](crate::transform), made only of calls, names and constants.

use crate::primitives::Function;
use std::fmt;

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
}

impl BinaryOp {
    /// Operator text
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
}

/// Parsed expression, before canonicalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawExpr {
    /// Numeral, kept as written
    Number(String),
    /// Identifier
    Name(String),
    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<RawExpr>,
    },
    /// Infix operator
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<RawExpr>,
        /// Right operand
        right: Box<RawExpr>,
    },
    /// `name(args)`
    Call {
        /// Called identifier
        name: String,
        /// Arguments
        args: Vec<RawExpr>,
    },
    /// `(a, b)`
    Tuple(Vec<RawExpr>),
    /// `[a, b, c]`
    List(Vec<RawExpr>),
}

/// Canonical expression: no operators remain
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Function call
    Call {
        /// Called function
        function: Function,
        /// Arguments
        args: Vec<Expr>,
    },
    /// Variable
    Name(String),
    /// Numeric constant
    Constant(f64),
}

impl Expr {
    /// Create a call
    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Self::Call { function, args }
    }

    /// Number of call nodes in the tree
    pub fn call_count(&self) -> usize {
        match self {
            Self::Call { args, .. } => 1 + args.iter().map(Expr::call_count).sum::<usize>(),
            Self::Name(_) | Self::Constant(_) => 0,
        }
    }

    /// Variable names, in first-use order
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Call { args, .. } => args.iter().for_each(|a| a.collect_names(names)),
            Self::Name(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Self::Constant(_) => {}
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Name(name) => f.write_str(name),
            Self::Constant(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_renders_call_expression() {
        let expr = Expr::call(
            Function::Add,
            vec![
                Expr::Constant(2.0),
                Expr::call(Function::Mult, vec![Expr::Constant(3.0), Expr::Name("x".into())]),
            ],
        );
        assert_eq!(expr.to_string(), "add(2, mult(3, x))");
        assert_eq!(Expr::Constant(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_names_and_call_count() {
        let expr = Expr::call(
            Function::Mult,
            vec![
                Expr::Name("b".into()),
                Expr::call(Function::Add, vec![Expr::Name("a".into()), Expr::Name("b".into())]),
            ],
        );
        assert_eq!(expr.names(), vec!["b", "a"]);
        assert_eq!(expr.call_count(), 2);
    }
}
