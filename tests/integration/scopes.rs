//! Scope stack behaviour under the baseline handlers: balance, nesting depth,
//! context isolation and the scope hooks.

mod common;

use common::{func, ident, program, stmt};
use serde_json::json;
use treepass::ast::Node;
use treepass::pass::{HandlerSet, Hook, PassOptions, PassResults};
use treepass::run_passes;

fn run(tree: Node, set: HandlerSet) -> Vec<String> {
    let mut results = PassResults::default();
    run_passes(tree, &PassOptions::new("", "input.js"), &[&set], &mut results).unwrap();
    results.warnings.into_iter().map(|w| w.description).collect()
}

/// Function expressions are the only scope-introducing nodes below the root.
fn open_scope_ancestors(tree: &Node, target: &str) -> Option<usize> {
    fn go(node: &Node, target: &str, open: usize) -> Option<usize> {
        if node.str_value("name") == Some(target) {
            return Some(open);
        }
        let open = if node.is("Program") || node.is("FunctionExpression") { open + 1 } else { open };
        node.fields.keys().find_map(|key| node.children(key).find_map(|child| go(child, target, open)))
    }
    go(tree, target, 0)
}

fn nested_functions() -> Node {
    // a; (function () { b; (function () { c; }); }); d;
    program(vec![
        stmt(ident("a")),
        stmt(func(vec![], vec![stmt(ident("b")), stmt(func(vec![], vec![stmt(ident("c"))]))])),
        stmt(ident("d")),
    ])
}

#[test]
fn test_stack_depth_matches_open_scopes() {
    let tree = nested_functions();
    let set = HandlerSet::new().on_enter("Identifier", |pass, node, _| {
        let depth = pass.scopes().depth();
        pass.warn(node, format!("{}:{depth}", node.str_value("name").unwrap_or("?")));
        Ok(None)
    });

    let seen = run(tree.clone(), set);
    assert_eq!(seen, vec!["a:1", "b:2", "c:3", "d:1"]);
    for entry in &seen {
        let (name, depth) = entry.split_once(':').unwrap();
        assert_eq!(open_scope_ancestors(&tree, name), Some(depth.parse().unwrap()), "{entry}");
    }
}

#[test]
fn test_scopes_balance_and_root_scope_is_program() {
    let set = HandlerSet::new()
        .hook(Hook::AfterExit, |pass, node, _| {
            if node.is("Program") {
                let open = pass.scopes().depth();
                pass.warn(node, format!("open after program: {open}"));
            }
            Ok(None)
        })
        .on_enter("Identifier", |pass, node, _| {
            let scope = pass.scopes().frames()[0].scope.kind.clone();
            pass.warn(node, scope);
            Ok(None)
        });

    let seen = run(nested_functions(), set);
    assert_eq!(seen.last().map(String::as_str), Some("open after program: 0"));
    assert!(seen[..seen.len() - 1].iter().all(|s| s == "Program"));
}

#[test]
fn test_context_is_isolated_between_siblings() {
    // Each identifier records what it sees, then writes its own name.
    let set = HandlerSet::new().on_enter("Identifier", |pass, node, _| {
        let name = node.str_value("name").unwrap_or("?").to_string();
        let context = pass.context_mut().expect("context inside the program");
        let mut keys: Vec<String> = context.keys().cloned().collect();
        keys.sort();
        context.insert(name.clone(), json!(true));
        pass.warn(node, format!("{name} sees [{}]", keys.join(",")));
        Ok(None)
    });

    let tree = program(vec![
        stmt(ident("outer")),
        stmt(func(vec![], vec![stmt(ident("first"))])),
        stmt(func(vec![], vec![stmt(ident("second"))])),
        stmt(ident("last")),
    ]);
    assert_eq!(
        run(tree, set),
        vec![
            "outer sees []",
            "first sees [outer]",
            "second sees [outer]",
            "last sees [outer]",
        ]
    );
}

#[test]
fn test_child_writes_to_inherited_keys_do_not_leak() {
    let set = HandlerSet::new().on_enter("Identifier", |pass, node, _| {
        let name = node.str_value("name").unwrap_or("?").to_string();
        let context = pass.context_mut().expect("context inside the program");
        let before: i64 = context.get_as("counter").ok().flatten().unwrap_or(0);
        context.set("counter", &(before + 1)).ok();
        pass.warn(node, format!("{name}={}", before + 1));
        Ok(None)
    });

    let tree = program(vec![
        stmt(ident("a")),
        stmt(func(vec![], vec![stmt(ident("b")), stmt(ident("c"))])),
        stmt(ident("d")),
    ]);
    assert_eq!(run(tree, set), vec!["a=1", "b=2", "c=3", "d=2"]);
}

#[test]
fn test_scope_hooks_see_both_frames() {
    let set = HandlerSet::new()
        .on_scope_enter(|t| {
            let depth = t.previous_context.and_then(|c| c.get("depth")).and_then(|v| v.as_u64()).unwrap_or(0);
            if let Some(context) = t.context {
                context.insert("depth", json!(depth + 1));
                context.insert(
                    "entered-from",
                    json!(t.previous_scope.map(|s| s.kind.clone()).unwrap_or_else(|| "nothing".into())),
                );
            }
        })
        .on_scope_exit(|t| {
            // Propagate a flag from the scope being left to the one resumed.
            let flagged = t.previous_context.is_some_and(|c| c.contains_key("flag"));
            if let (true, Some(context)) = (flagged, t.context) {
                context.insert("child-flagged", json!(true));
            }
        })
        .on_enter("Identifier", |pass, node, _| {
            let context = pass.context_mut().expect("context");
            if node.str_value("name") == Some("flag") {
                context.insert("flag", json!(true));
            }
            let summary = format!(
                "{} depth={} from={} child-flagged={}",
                node.str_value("name").unwrap_or("?"),
                context.get("depth").cloned().unwrap_or_default(),
                context.get("entered-from").and_then(|v| v.as_str()).unwrap_or("-"),
                context.contains_key("child-flagged"),
            );
            pass.warn(node, summary);
            Ok(None)
        });

    let tree = program(vec![stmt(func(vec![], vec![stmt(ident("flag"))])), stmt(ident("after"))]);
    assert_eq!(
        run(tree, set),
        vec![
            "flag depth=2 from=Program child-flagged=false",
            "after depth=1 from=nothing child-flagged=true",
        ]
    );
}

#[test]
fn test_function_scope_is_keyed_on_body() {
    let set = HandlerSet::new().on_enter("Identifier", |pass, node, _| {
        let scope = pass.scope().map(|s| s.kind.clone()).unwrap_or_default();
        pass.warn(node, scope);
        Ok(None)
    });
    let tree = program(vec![stmt(func(vec![], vec![stmt(ident("x"))]))]);
    assert_eq!(run(tree, set), vec!["BlockStatement"]);
}

#[test]
fn test_overriding_baseline_removes_scope() {
    let set = HandlerSet::new()
        .on_enter("FunctionExpression", |_, _, _| Ok(None))
        .on_exit("FunctionExpression", |_, _, _| Ok(None))
        .on_enter("Identifier", |pass, node, _| {
            let depth = pass.scopes().depth();
            pass.warn(node, depth.to_string());
            Ok(None)
        });
    let tree = program(vec![stmt(func(vec![], vec![stmt(ident("x"))]))]);
    assert_eq!(run(tree, set), vec!["1"]);
}

#[test]
fn test_override_that_manages_scopes_itself() {
    let set = HandlerSet::new()
        .on_enter("Program", |pass, node, _| {
            pass.push_scope(node);
            pass.context_mut().expect("just pushed").insert("strict", json!(true));
            Ok(None)
        })
        .on_enter("Identifier", |pass, node, _| {
            let strict = pass.context().and_then(|c| c.get("strict")).is_some();
            pass.warn(node, format!("strict={strict}"));
            Ok(None)
        });
    let tree = program(vec![stmt(func(vec![], vec![stmt(ident("x"))]))]);
    assert_eq!(run(tree, set), vec!["strict=true"]);
}
