//! Warning collection: one record per `warn` call, never deduplicated, keyed
//! to the node's location.

mod common;

use common::{block, func, ident, ident_at, program, stmt};
use treepass::ast::Node;
use treepass::pass::{HandlerSet, PassOptions, PassResults};
use treepass::run_passes;
use treepass::span::Loc;

fn found_identifier() -> HandlerSet {
    HandlerSet::new().on_enter("Identifier", |pass, node, _| {
        pass.warn(node, "found identifier");
        Ok(None)
    })
}

fn warnings_for(tree: Node, source: &str) -> PassResults {
    let mut results = PassResults::default();
    run_passes(tree, &PassOptions::new(source, "input.js"), &[&found_identifier], &mut results).unwrap();
    results
}

#[test]
fn no_identifier_no_warning() {
    let tree = program(vec![stmt(
        Node::new("FunctionExpression").with_children("params", vec![]).with_child("body", block(vec![])),
    )]);
    assert!(warnings_for(tree, "").warnings.is_empty());
}

#[test]
fn one_identifier_one_warning() {
    let tree = program(vec![stmt(func(vec![], vec![stmt(ident("x"))]))]);
    let results = warnings_for(tree, "");
    assert_eq!(results.warnings.len(), 1);
    assert_eq!(results.warnings[0].description, "found identifier");
    assert_eq!(results.warnings[0].filename, "input.js");
}

#[test]
fn repeated_warnings_are_kept() {
    let tree = program(vec![stmt(ident("x")), stmt(ident("x")), stmt(ident("x"))]);
    assert_eq!(warnings_for(tree, "").warnings.len(), 3);
}

#[test]
fn warning_carries_location() {
    let source = "let a;\nfoo;\n";
    let tree = program(vec![stmt(ident_at("foo", 2, 0))]);
    let results = warnings_for(tree, source);

    let warning = &results.warnings[0];
    assert_eq!(warning.loc, Some(Loc::line(2, 0, 3)));
    assert_eq!(warning.to_string(), "input.js:2:1: warning: found identifier");

    let rendered = warning.render(source);
    assert!(rendered.contains("foo;"), "{rendered}");
    assert!(rendered.contains("found identifier"), "{rendered}");
}

#[test]
fn warning_without_location() {
    let results = warnings_for(program(vec![stmt(ident("x"))]), "");
    assert_eq!(results.warnings[0].loc, None);
    assert_eq!(results.warnings[0].to_string(), "input.js: warning: found identifier");
}

#[test]
fn warnings_serialize_as_json() {
    let results = warnings_for(program(vec![stmt(ident_at("x", 1, 4))]), "");
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json["warnings"][0]["description"], "found identifier");
    assert_eq!(json["warnings"][0]["loc"]["start"]["line"], 1);
    assert_eq!(json["warnings"][0]["loc"]["start"]["column"], 4);
}
