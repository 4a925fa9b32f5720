// SPDX-License-Identifier: MIT OR Apache-2.0
//! Expression sessions.
//!
//! An [`ExpressionSession`] is the state behind one expression field: its
//! text, its options, the artifacts of the latest pass and the fingerprint of
//! the last successful one. Edits that change nothing are skipped.
//!
//! The text is mirrored into a frame named [`STORAGE_NAME`] so the tree
//! carries its own source.

use crate::config::CompileOptions;
use crate::context::{is_generated, strip_tag};
use crate::error::{CompileError, Result};
use crate::interface::{prune_inputs, unlink_output};
use crate::sanitize::{apply_macros, Sanitizer};
use crate::synth::{synthesize, SynthReport};
use crate::transform;
use nodex_graph::catalog::{self, create_registry};
use nodex_graph::{NodeId, NodeTree};
use tracing::{debug, warn};

/// Name of the frame holding the expression text
pub const STORAGE_NAME: &str = "EquationStorage";
/// Artifact value of a stage that failed
pub const FAILED: &str = "Failed";

const STORAGE_WIDTH: f32 = 750.0;
const STORAGE_X: f32 = -1000.0;

/// Debug output of the latest pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    /// Sanitized text, or [`FAILED`]
    pub sanitized: String,
    /// Canonical call expression, or [`FAILED`]
    pub expression: String,
    /// Generated nodes after the pass
    pub node_count: usize,
    /// Message of the error that ended the pass
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Fingerprint {
    text: String,
    options: CompileOptions,
}

/// One expression bound to a node tree
#[derive(Debug, Clone, Default)]
pub struct ExpressionSession {
    text: String,
    options: CompileOptions,
    last_success: Option<Fingerprint>,
    artifacts: Artifacts,
}

impl ExpressionSession {
    /// Create an empty session
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Current text, after macro expansion
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current options
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Artifacts of the latest pass
    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Replace the text and compile.
    ///
    /// Returns `Ok(None)` when nothing was compiled: the edit changed nothing
    /// since the last success, or the text is empty.
    pub fn set_text(&mut self, tree: &mut NodeTree, text: &str) -> Result<Option<SynthReport>> {
        self.text = if self.options.macros {
            apply_macros(text).unwrap_or_else(|| text.to_string())
        } else {
            text.to_string()
        };
        self.on_edit(tree)
    }

    /// Set a vector expression from its three components
    pub fn set_components(
        &mut self,
        tree: &mut NodeTree,
        x: &str,
        y: &str,
        z: &str,
    ) -> Result<Option<SynthReport>> {
        self.set_text(tree, &format!("[{x},{y},{z}]"))
    }

    /// Replace the options and compile
    pub fn set_options(&mut self, tree: &mut NodeTree, options: CompileOptions) -> Result<Option<SynthReport>> {
        self.options = options;
        self.on_edit(tree)
    }

    /// Edit callback: compile unless nothing changed since the last success
    pub fn on_edit(&mut self, tree: &mut NodeTree) -> Result<Option<SynthReport>> {
        let fingerprint = Fingerprint {
            text: self.text.clone(),
            options: self.options.clone(),
        };
        if self.last_success.as_ref() == Some(&fingerprint) {
            debug!(text = %self.text, "expression unchanged, skipping pass");
            return Ok(None);
        }

        match self.run(tree) {
            Ok(report) => {
                self.last_success = Some(fingerprint);
                Ok(report)
            }
            Err(err) => {
                warn!(text = %self.text, error = %err, "compilation failed");
                // The failed pass may have edited the boundary already
                self.last_success = None;
                self.artifacts.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Compile even if nothing changed, e.g. after the tree was edited by hand
    pub fn recompile(&mut self, tree: &mut NodeTree) -> Result<Option<SynthReport>> {
        self.last_success = None;
        self.on_edit(tree)
    }

    fn run(&mut self, tree: &mut NodeTree) -> Result<Option<SynthReport>> {
        self.artifacts = Artifacts::default();
        store_text(tree, &self.text)?;

        if self.text.trim().is_empty() {
            let pruned = prune_inputs::<&str>(tree, &[]);
            unlink_output(tree, &self.options.output_name);
            debug!(pruned, "expression cleared");
            return Ok(None);
        }

        let sanitized = match Sanitizer::from_options(&self.options).sanitize(&self.text) {
            Ok(sanitized) => sanitized,
            Err(err) => {
                self.artifacts.sanitized = FAILED.to_string();
                self.artifacts.expression = FAILED.to_string();
                return Err(err);
            }
        };
        self.artifacts.sanitized = sanitized.text.clone();

        let expr = match transform::build(&sanitized.text, self.options.variant) {
            Ok(expr) => expr,
            Err(err) => {
                self.artifacts.expression = FAILED.to_string();
                return Err(err);
            }
        };
        self.artifacts.expression = expr.to_string();

        let report = synthesize(tree, &sanitized, &expr, &self.options)?;
        self.artifacts.node_count = report.node_count;
        Ok(Some(report))
    }
}

/// Mirror the expression text into the storage frame, creating it if needed
fn store_text(tree: &mut NodeTree, text: &str) -> Result<NodeId> {
    let id = match tree.node_by_name(STORAGE_NAME) {
        Some(node) => node.id,
        None => {
            let node = create_registry(tree.kind())
                .create_node(catalog::FRAME)
                .ok_or_else(|| CompileError::Unavailable("Frames are not available in this editor.".to_string()))?
                .with_name(STORAGE_NAME)
                .with_position(STORAGE_X, 0.0);
            tree.add_node(node)
        }
    };
    if let Some(node) = tree.node_mut(id) {
        node.label = text.to_string();
        node.width = STORAGE_WIDTH;
    }
    Ok(id)
}

/// Standalone copy of a tree with the compiler's bookkeeping removed.
///
/// The storage frame goes away and generated nodes lose their tags: frames
/// are named after their label, other nodes after their operation.
pub fn bake(tree: &NodeTree) -> NodeTree {
    let mut baked = tree.clone();
    if let Some(id) = baked.node_by_name(STORAGE_NAME).map(|n| n.id) {
        baked.remove_node(id);
    }

    let generated: Vec<NodeId> = baked
        .nodes()
        .filter(|n| is_generated(&n.name))
        .map(|n| n.id)
        .collect();
    for id in generated {
        if let Some(node) = baked.node_mut(id) {
            let name = if node.node_type == catalog::FRAME {
                node.label.clone()
            } else {
                strip_tag(&node.name).to_string()
            };
            node.label = name.clone();
            node.name = name;
        }
    }
    baked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use nodex_graph::PortDirection;

    #[test]
    fn test_unchanged_edit_is_skipped() {
        let mut tree = NodeTree::default();
        let mut session = ExpressionSession::default();
        assert!(session.set_text(&mut tree, "a+b").unwrap().is_some());
        assert!(session.on_edit(&mut tree).unwrap().is_none());
        let report = session.recompile(&mut tree).unwrap().unwrap();
        assert_eq!(report.created, 0);
    }

    #[test]
    fn test_artifacts() {
        let mut tree = NodeTree::default();
        let mut session = ExpressionSession::default();
        session.set_text(&mut tree, "a + b * 2").unwrap();
        let artifacts = session.artifacts();
        assert_eq!(artifacts.sanitized, "a+b*2");
        assert_eq!(artifacts.expression, "add(a, mult(b, 2))");
        assert_eq!(artifacts.node_count, 3);
        assert_eq!(artifacts.error, None);

        assert!(session.set_text(&mut tree, "a $ b").is_err());
        let artifacts = session.artifacts();
        assert_eq!(artifacts.sanitized, FAILED);
        assert_eq!(artifacts.error.as_deref(), Some("Unauthorized Symbol '$'"));
    }

    #[test]
    fn test_failed_pass_retains_graph() {
        let mut tree = NodeTree::default();
        let mut session = ExpressionSession::default();
        session.set_text(&mut tree, "a*b").unwrap();
        let before = tree.node_count();

        let err = session.set_text(&mut tree, "a*foo(b)").unwrap_err();
        assert!(matches!(err, CompileError::Name(_)));
        assert_eq!(session.artifacts().expression, FAILED);
        assert_eq!(tree.node_count(), before);
        assert!(tree.node_by_name("F|mult(f0,f1)").is_some());
    }

    #[test]
    fn test_revert_after_failed_pass_rebuilds() {
        let mut tree = NodeTree::default();
        let options = CompileOptions::default().with_variable_kind("v", crate::kind::Kind::Vector);
        let mut session = ExpressionSession::new(options);
        session.set_text(&mut tree, "a+b").unwrap();

        // Fails on kinds after the inputs were synced
        let err = session.set_text(&mut tree, "a+min(v,1)").unwrap_err();
        assert!(matches!(err, CompileError::Type(_)));
        assert!(tree.interface_socket_by_name(PortDirection::Input, "b").is_none());

        let report = session.set_text(&mut tree, "a+b").unwrap();
        assert!(report.is_some());
        let b = tree.interface_socket_by_name(PortDirection::Input, "b").unwrap().id;
        assert!(tree.interface_socket_by_name(PortDirection::Input, "v").is_none());
        let add = tree.node_by_name("F|add(f0,f1)").unwrap();
        let link = tree.link_into(add.input(1).unwrap().id).unwrap();
        assert_eq!(link.from.port, b);
    }

    #[test]
    fn test_empty_text_clears_boundary() {
        let mut tree = NodeTree::default();
        let mut session = ExpressionSession::default();
        session.set_text(&mut tree, "a+b").unwrap();
        assert!(session.set_text(&mut tree, "").unwrap().is_none());

        assert_eq!(tree.interface_sockets(PortDirection::Input).count(), 0);
        let output = tree.interface_socket_by_name(PortDirection::Output, "Result").unwrap();
        assert!(tree.link_into(output.id).is_none());
    }

    #[test]
    fn test_storage_frame_mirrors_text() {
        let mut tree = NodeTree::default();
        let mut session = ExpressionSession::default();
        session.set_text(&mut tree, "x**2").unwrap();
        session.set_text(&mut tree, "x**3").unwrap();
        let frames: Vec<_> = tree.nodes().filter(|n| n.name == STORAGE_NAME).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].label, "x**3");
        assert_eq!(frames[0].width, 750.0);
    }

    #[test]
    fn test_macros_rewrite_stored_text() {
        let mut tree = NodeTree::default();
        let options = CompileOptions { macros: true, ..CompileOptions::default() };
        let mut session = ExpressionSession::new(options);
        session.set_text(&mut tree, "2*Pi*r").unwrap();
        assert_eq!(session.text(), "2*π*r");
        assert_eq!(session.artifacts().sanitized, "2*3.1415927*r");
    }

    #[test]
    fn test_set_components() {
        let mut tree = NodeTree::default();
        let mut session = ExpressionSession::new(CompileOptions::vector());
        assert_eq!(session.options().variant, Variant::Vector);
        session.set_components(&mut tree, "a", "1", "b*2").unwrap();
        assert_eq!(session.text(), "[a,1,b*2]");
        assert_eq!(session.artifacts().expression, "combixyz(a, 1, mult(b, 2))");
    }

    #[test]
    fn test_bake_strips_tags() {
        let mut tree = NodeTree::default();
        let mut session = ExpressionSession::default();
        session.set_text(&mut tree, "-a").unwrap();

        let baked = bake(&tree);
        assert!(baked.node_by_name(STORAGE_NAME).is_none());
        assert!(baked.nodes().all(|n| !is_generated(&n.name)));
        assert!(baked.node_by_name("Negate").is_some());
        assert!(baked.node_by_name("sub").is_some());
        assert!(tree.node_by_name(STORAGE_NAME).is_some());
    }
}
