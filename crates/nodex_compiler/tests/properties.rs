// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for compilation passes.

use nodex_compiler::{compile, CompileOptions};
use nodex_graph::NodeTree;
use proptest::prelude::*;
use std::collections::BTreeSet;

// Operands that are valid on their own
fn operand() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-d]".prop_map(String::from),
        (1u8..20).prop_map(|n| n.to_string()),
        Just("sin(a)".to_string()),
        Just("max(a,b,2)".to_string()),
        Just("(a+c)".to_string()),
        Just("sqrt(b)".to_string()),
    ]
}

fn operator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("**"), Just("%")]
}

// Alternating operands and operators, as separate tokens
fn tokens() -> impl Strategy<Value = Vec<String>> {
    (operand(), prop::collection::vec((operator(), operand()), 0..6)).prop_map(|(first, rest)| {
        let mut tokens = vec![first];
        for (op, operand) in rest {
            tokens.push(op.to_string());
            tokens.push(operand);
        }
        tokens
    })
}

fn node_names(tree: &NodeTree) -> BTreeSet<String> {
    tree.nodes().map(|n| n.name.clone()).collect()
}

proptest! {
    /// Property: whitespace between tokens never changes the generated graph
    #[test]
    fn prop_whitespace_is_ignored(
        tokens in tokens(),
        gaps in prop::collection::vec("[ \t]{0,3}", 12),
    ) {
        let compact = tokens.concat();
        let spaced: String = tokens
            .iter()
            .zip(gaps.iter().cycle())
            .map(|(token, gap)| format!("{gap}{token}"))
            .collect();

        let options = CompileOptions::default();
        let mut compact_tree = NodeTree::default();
        let mut spaced_tree = NodeTree::default();
        let compact_report = compile(&mut compact_tree, &compact, &options).unwrap();
        let spaced_report = compile(&mut spaced_tree, &spaced, &options).unwrap();

        prop_assert_eq!(compact_report, spaced_report);
        prop_assert_eq!(node_names(&compact_tree), node_names(&spaced_tree));
    }

    /// Property: a second pass over the same text creates and removes nothing
    #[test]
    fn prop_recompiling_is_idempotent(tokens in tokens()) {
        let text = tokens.concat();
        let options = CompileOptions::default();
        let mut tree = NodeTree::default();
        let first = compile(&mut tree, &text, &options).unwrap();
        let names = node_names(&tree);
        let links = tree.link_count();

        let second = compile(&mut tree, &text, &options).unwrap();
        prop_assert_eq!(second.created, 0);
        prop_assert_eq!(second.removed, 0);
        prop_assert_eq!(second.node_count, first.node_count);
        prop_assert_eq!(node_names(&tree), names);
        prop_assert_eq!(tree.link_count(), links);
    }
}
