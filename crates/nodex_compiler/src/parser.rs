// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pratt parser for sanitized expressions.
//!
//! Grammar, loosest binding first:
//!
//! | level | operators          | assoc |
//! |-------|--------------------|-------|
//! | 10    | `+` `-`            | left  |
//! | 20    | `*` `/` `//` `%`   | left  |
//! | 30    | unary `-` `+`      |       |
//! | 40    | `**`               | right |
//!
//! `**` binds tighter than a unary minus on its left (`-a**2` is
//! `-(a**2)`), and its right operand may itself be unary (`2**-1`).
//!
//! Both the nesting of the text and the height of the resulting tree are
//! capped at [`MAX_DEPTH`], so later stages can walk the tree recursively.

use crate::ast::{BinaryOp, RawExpr, UnaryOp};
use crate::error::{CompileError, Result};
use tracing::debug;

/// Binding power of `**`, which also bounds the operand of a prefix operator
const POW_PREC: u8 = 40;

/// Deepest nesting and tallest expression tree accepted
pub const MAX_DEPTH: usize = 256;

/// A parsed subexpression and the height of its tree
type Parsed = std::result::Result<(RawExpr, usize), String>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Precedence, associativity and operator of a binary token.
///
/// Higher precedence binds tighter.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::Plus => Some((10, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((10, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((20, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((20, Assoc::Left, BinaryOp::Div)),
        Token::SlashSlash => Some((20, Assoc::Left, BinaryOp::FloorDiv)),
        Token::Percent => Some((20, Assoc::Left, BinaryOp::Mod)),
        Token::StarStar => Some((POW_PREC, Assoc::Right, BinaryOp::Pow)),
        _ => None,
    }
}

fn tokenize(text: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let token = match c {
            ' ' | '\t' => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if next == Some('*') => {
                i += 1;
                Token::StarStar
            }
            '*' => Token::Star,
            '/' if next == Some('/') => {
                i += 1;
                Token::SlashSlash
            }
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let numeral: String = chars[start..i].iter().collect();
                if numeral.parse::<f64>().is_err() {
                    return Err(format!("malformed numeral '{numeral}'"));
                }
                tokens.push(Token::Number(numeral));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
                continue;
            }
            other => return Err(format!("unexpected character '{other}'")),
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl TokenStream {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> std::result::Result<(), String> {
        match self.advance() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected {expected:?}, found {token:?}")),
            None => Err(format!("expected {expected:?}, found end of input")),
        }
    }
}

/// Parse sanitized text into a raw expression tree
pub fn parse(text: &str) -> Result<RawExpr> {
    parse_inner(text).map_err(|detail| {
        debug!(text, %detail, "parse failed");
        CompileError::Syntax(format!("Math Expression Not Recognized: '{text}'"))
    })
}

fn parse_inner(text: &str) -> std::result::Result<RawExpr, String> {
    let mut stream = TokenStream { tokens: tokenize(text)?, pos: 0, depth: 0 };
    let (expr, _) = parse_pratt(&mut stream, 0)?;
    match stream.peek() {
        None => Ok(expr),
        Some(token) => Err(format!("unexpected trailing {token:?}")),
    }
}

fn taller(height: usize) -> std::result::Result<usize, String> {
    if height >= MAX_DEPTH {
        return Err(format!("expression deeper than {MAX_DEPTH} levels"));
    }
    Ok(height + 1)
}

/// Every recursive descent goes through here
fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Parsed {
    if stream.depth >= MAX_DEPTH {
        return Err(format!("nesting deeper than {MAX_DEPTH} levels"));
    }
    stream.depth += 1;
    let parsed = parse_binary(stream, min_prec);
    stream.depth -= 1;
    parsed
}

/// Precedence climbing over binary operators.
fn parse_binary(stream: &mut TokenStream, min_prec: u8) -> Parsed {
    let (mut left, mut height) = parse_prefix(stream)?;

    while let Some((prec, assoc, op)) = stream.peek().and_then(binary_op_info) {
        if prec < min_prec {
            break;
        }
        stream.advance();

        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        let (right, right_height) = parse_pratt(stream, next_prec)?;
        height = taller(height.max(right_height))?;
        left = RawExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }

    Ok((left, height))
}

fn parse_prefix(stream: &mut TokenStream) -> Parsed {
    let op = match stream.peek() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Plus) => UnaryOp::Plus,
        _ => return parse_atom(stream),
    };
    stream.advance();

    // The operand keeps any `**` chain but stops before looser operators
    let (operand, height) = parse_pratt(stream, POW_PREC)?;
    let unary = RawExpr::Unary {
        op,
        operand: Box::new(operand),
    };
    Ok((unary, taller(height)?))
}

fn parse_atom(stream: &mut TokenStream) -> Parsed {
    match stream.advance() {
        Some(Token::Number(numeral)) => Ok((RawExpr::Number(numeral), 1)),
        Some(Token::Ident(name)) => {
            if stream.peek() == Some(&Token::LParen) {
                stream.advance();
                let (args, height) = parse_sequence(stream, &Token::RParen)?;
                Ok((RawExpr::Call { name, args }, taller(height)?))
            } else {
                Ok((RawExpr::Name(name), 1))
            }
        }
        Some(Token::LParen) => {
            if stream.peek() == Some(&Token::RParen) {
                stream.advance();
                return Ok((RawExpr::Tuple(Vec::new()), 1));
            }
            let (first, first_height) = parse_pratt(stream, 0)?;
            if stream.peek() == Some(&Token::Comma) {
                stream.advance();
                let (rest, rest_height) = parse_sequence(stream, &Token::RParen)?;
                let mut items = vec![first];
                items.extend(rest);
                return Ok((RawExpr::Tuple(items), taller(first_height.max(rest_height))?));
            }
            stream.expect(&Token::RParen)?;
            Ok((first, first_height))
        }
        Some(Token::LBracket) => {
            let (items, height) = parse_sequence(stream, &Token::RBracket)?;
            Ok((RawExpr::List(items), taller(height)?))
        }
        Some(token) => Err(format!("unexpected {token:?}")),
        None => Err("unexpected end of input".to_string()),
    }
}

/// Comma-separated expressions up to `close`, trailing comma allowed.
///
/// Returns the items with the height of the tallest.
fn parse_sequence(
    stream: &mut TokenStream,
    close: &Token,
) -> std::result::Result<(Vec<RawExpr>, usize), String> {
    let mut items = Vec::new();
    let mut height = 0;
    loop {
        if stream.peek() == Some(close) {
            stream.advance();
            return Ok((items, height));
        }
        let (item, item_height) = parse_pratt(stream, 0)?;
        items.push(item);
        height = height.max(item_height);
        match stream.advance() {
            Some(Token::Comma) => {}
            Some(ref token) if token == close => return Ok((items, height)),
            Some(token) => return Err(format!("expected ',' or {close:?}, found {token:?}")),
            None => return Err(format!("unclosed sequence, expected {close:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: &str) -> RawExpr {
        RawExpr::Number(n.to_string())
    }

    fn name(n: &str) -> RawExpr {
        RawExpr::Name(n.to_string())
    }

    fn bin(op: BinaryOp, left: RawExpr, right: RawExpr) -> RawExpr {
        RawExpr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    fn neg(operand: RawExpr) -> RawExpr {
        RawExpr::Unary { op: UnaryOp::Neg, operand: Box::new(operand) }
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            parse("a+b*2").unwrap(),
            bin(BinaryOp::Add, name("a"), bin(BinaryOp::Mul, name("b"), num("2")))
        );
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(
            parse("a-b-c").unwrap(),
            bin(BinaryOp::Sub, bin(BinaryOp::Sub, name("a"), name("b")), name("c"))
        );
        assert_eq!(
            parse("a//b%c").unwrap(),
            bin(BinaryOp::Mod, bin(BinaryOp::FloorDiv, name("a"), name("b")), name("c"))
        );
    }

    #[test]
    fn test_power_is_right_associative_and_beats_unary() {
        assert_eq!(
            parse("a**b**c").unwrap(),
            bin(BinaryOp::Pow, name("a"), bin(BinaryOp::Pow, name("b"), name("c")))
        );
        assert_eq!(parse("-a**2").unwrap(), neg(bin(BinaryOp::Pow, name("a"), num("2"))));
        assert_eq!(parse("2**-1").unwrap(), bin(BinaryOp::Pow, num("2"), neg(num("1"))));
        assert_eq!(
            parse("-a*b").unwrap(),
            bin(BinaryOp::Mul, neg(name("a")), name("b"))
        );
    }

    #[test]
    fn test_calls_tuples_and_lists() {
        assert_eq!(
            parse("max(a,b,2)").unwrap(),
            RawExpr::Call { name: "max".into(), args: vec![name("a"), name("b"), num("2")] }
        );
        assert_eq!(parse("(a,b)").unwrap(), RawExpr::Tuple(vec![name("a"), name("b")]));
        assert_eq!(parse("[1,a,3]").unwrap(), RawExpr::List(vec![num("1"), name("a"), num("3")]));
        assert_eq!(parse("((a))").unwrap(), name("a"));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parens = format!("{}a{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(parse(&parens), Err(CompileError::Syntax(_))));
        let negations = format!("{}a", "-".repeat(200_000));
        assert!(matches!(parse(&negations), Err(CompileError::Syntax(_))));
        let chain = vec!["a"; 100_000].join("+");
        assert!(matches!(parse(&chain), Err(CompileError::Syntax(_))));

        let shallow = format!("{}a{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&shallow).unwrap(), name("a"));
        assert!(parse(&vec!["a"; 200].join("+")).is_ok());
    }

    #[test]
    fn test_failures_are_syntax_errors() {
        for text in ["", "a+", "(a", "a)", "2 3", "a$b", "1..2", "*a"] {
            let err = parse(text).unwrap_err();
            assert!(matches!(err, CompileError::Syntax(_)), "{text}");
        }
        assert_eq!(
            parse("a+").unwrap_err().to_string(),
            "Math Expression Not Recognized: 'a+'"
        );
    }
}
