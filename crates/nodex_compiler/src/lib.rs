// SPDX-License-Identifier: MIT OR Apache-2.0
//! Math expressions compiled into node trees.
//!
//! A pass runs the raw text through these stages:
//! - [`sanitize`]: normalize text, classify variables, constants and functions
//! - [`parser`] and [`transform`]: Pratt-parse into a canonical call tree
//! - [`synth`]: sync the boundary sockets and build tagged nodes bottom-up
//!
//! Generated nodes are named with a tag describing the operation and its
//! operands, so compiling the same text twice reuses every node, and editing
//! the text only touches what changed. [`session::ExpressionSession`] wraps a
//! pass with change detection and debug artifacts.
//!
//! ```
//! use nodex_compiler::{compile, CompileOptions};
//! use nodex_graph::NodeTree;
//!
//! let mut tree = NodeTree::default();
//! let report = compile(&mut tree, "a + b * 2", &CompileOptions::default()).unwrap();
//! assert_eq!(report.node_count, 3);
//! ```

pub mod ast;
pub mod config;
pub mod context;
pub mod error;
pub mod interface;
pub mod kind;
pub mod parser;
pub mod primitives;
pub mod resolver;
pub mod sanitize;
pub mod session;
pub mod synth;
pub mod tables;
pub mod transform;

pub use ast::Expr;
pub use config::{CompileOptions, ConfigError, Variant};
pub use context::CompilationContext;
pub use error::{CompileError, Result};
pub use kind::{Handle, Kind, Literal, Operand};
pub use primitives::{Function, Signature};
pub use sanitize::{Sanitized, Sanitizer};
pub use session::{bake, Artifacts, ExpressionSession};
pub use synth::{compile, synthesize, SynthReport};
