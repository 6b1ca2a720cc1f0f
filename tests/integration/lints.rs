//! The bundled lints run over ESTree JSON.

mod common;

use common::tree;
use serde_json::{json, Value};
use treepass::diagnostics::PassError;
use treepass::lints;
use treepass::pass::{HandlerSet, HandlerSource, PassOptions, PassResults};
use treepass::run_passes;

fn lint(program: Value, names: &[&str]) -> Result<Vec<String>, PassError> {
    let sets: Vec<HandlerSet> = names.iter().map(|n| lints::by_name(n).unwrap()).collect();
    let sources: Vec<&dyn HandlerSource> = sets.iter().map(|s| s as &dyn HandlerSource).collect();
    let mut results = PassResults::default();
    run_passes(tree(program), &PassOptions::new("", "input.js"), &sources, &mut results)?;
    Ok(results.warnings.into_iter().map(|w| w.description).collect())
}

fn id(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name })
}

fn let_decl(pattern: Value) -> Value {
    json!({
        "type": "VariableDeclaration",
        "kind": "let",
        "declarations": [{ "type": "VariableDeclarator", "id": pattern, "init": null }]
    })
}

fn function_decl(name: &str, params: Vec<Value>, body: Vec<Value>) -> Value {
    json!({
        "type": "FunctionDeclaration",
        "id": id(name),
        "params": params,
        "body": { "type": "BlockStatement", "body": body },
        "generator": false,
        "async": false
    })
}

fn program(body: Vec<Value>) -> Value {
    json!({ "type": "Program", "sourceType": "module", "body": body })
}

#[test]
fn no_debugger_warns_per_statement() {
    let warnings = lint(
        program(vec![json!({ "type": "DebuggerStatement" }), json!({ "type": "DebuggerStatement" })]),
        &[lints::NO_DEBUGGER],
    )
    .unwrap();
    assert_eq!(warnings, vec!["unexpected 'debugger' statement"; 2]);
}

#[test]
fn no_with_is_fatal() {
    let with = json!({
        "type": "WithStatement",
        "object": id("obj"),
        "body": { "type": "BlockStatement", "body": [] },
        "loc": { "start": { "line": 3, "column": 2 }, "end": { "line": 3, "column": 19 } }
    });
    let err = lint(program(vec![json!({ "type": "DebuggerStatement" }), with]), &[lints::NO_DEBUGGER, lints::NO_WITH])
        .unwrap_err();
    assert_eq!(err.to_string(), "input.js:3:3: 'with' statements are not allowed");
}

#[test]
fn parameter_shadowing_outer_binding() {
    let warnings = lint(
        program(vec![let_decl(id("x")), function_decl("f", vec![id("x")], vec![let_decl(id("y"))])]),
        &[lints::SHADOWING],
    )
    .unwrap();
    assert_eq!(warnings, vec!["'x' shadows a binding from an enclosing scope"]);
}

#[test]
fn sibling_bindings_do_not_shadow() {
    let inner = json!({
        "type": "ExpressionStatement",
        "expression": {
            "type": "FunctionExpression",
            "id": null,
            "params": [],
            "body": { "type": "BlockStatement", "body": [let_decl(id("b"))] }
        }
    });
    let warnings = lint(program(vec![let_decl(id("a")), inner, let_decl(id("b"))]), &[lints::SHADOWING]).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn arrow_and_destructuring_shadowing() {
    let pattern = json!({
        "type": "ObjectPattern",
        "properties": [
            { "type": "Property", "key": id("a"), "value": id("a"), "kind": "init", "shorthand": true, "computed": false, "method": false },
            { "type": "RestElement", "argument": id("rest") }
        ]
    });
    let arrow = json!({
        "type": "ExpressionStatement",
        "expression": {
            "type": "ArrowFunctionExpression",
            "id": null,
            "params": [{ "type": "AssignmentPattern", "left": id("rest"), "right": { "type": "Literal", "value": 0 } }],
            "body": { "type": "BlockStatement", "body": [let_decl(id("a"))] },
            "expression": false
        }
    });
    let warnings = lint(program(vec![let_decl(pattern), arrow]), &[lints::SHADOWING]).unwrap();
    assert_eq!(
        warnings,
        vec![
            "'rest' shadows a binding from an enclosing scope",
            "'a' shadows a binding from an enclosing scope",
        ]
    );
}

#[test]
fn nested_functions_see_every_enclosing_scope() {
    let warnings = lint(
        program(vec![
            let_decl(id("top")),
            function_decl("outer", vec![], vec![function_decl("inner", vec![id("top")], vec![])]),
        ]),
        &[lints::SHADOWING],
    )
    .unwrap();
    assert_eq!(warnings, vec!["'top' shadows a binding from an enclosing scope"]);
}

#[test]
fn lints_compose() {
    let warnings = lint(
        program(vec![let_decl(id("x")), function_decl("x", vec![], vec![json!({ "type": "DebuggerStatement" })])]),
        &[lints::NO_DEBUGGER, lints::SHADOWING],
    )
    .unwrap();
    // Redeclaring in the same scope is not shadowing.
    assert_eq!(warnings, vec!["unexpected 'debugger' statement"]);
}
