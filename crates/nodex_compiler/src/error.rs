// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compilation errors.
//!
//! Every stage of a pass raises one of these; the first one aborts the pass.

use nodex_graph::{ConnectionError, InterfaceError};
use thiserror::Error;

/// Errors raised while compiling an expression
#[derive(Debug, Error)]
pub enum CompileError {
    /// Unauthorized symbol, malformed numeral, illegal composite or unparsable text
    #[error("{0}")]
    Syntax(String),

    /// Operation given an incompatible kind
    #[error("{0}")]
    Type(String),

    /// Wrong element count in a literal or wrong parameter count in a call
    #[error("{0}")]
    Arity(String),

    /// Unknown function, or an identifier colliding with a reserved name
    #[error("{0}")]
    Name(String),

    /// Component index out of range
    #[error("{0}")]
    Index(String),

    /// Node or socket type missing in the tree's editor
    #[error("{0}")]
    Unavailable(String),

    /// A link would close a loop in the tree
    #[error("Cyclic reference: {0}")]
    Cycle(String),

    /// Host tree refused an edit
    #[error("Node tree error: {0}")]
    Graph(String),
}

impl From<ConnectionError> for CompileError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Cycle | ConnectionError::SelfLoop => Self::Cycle(err.to_string()),
            other => Self::Graph(other.to_string()),
        }
    }
}

impl From<InterfaceError> for CompileError {
    fn from(err: InterfaceError) -> Self {
        match err {
            InterfaceError::Unavailable { .. } => Self::Unavailable(err.to_string()),
            other => Self::Graph(other.to_string()),
        }
    }
}

/// Result type for compilation
pub type Result<T> = std::result::Result<T, CompileError>;
