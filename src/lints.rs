//! Ready-made handler sets, selectable by name from the CLI and config.

use serde_json::Value;

use crate::ast::{Node, Parent};
use crate::pass::baseline::function_scope;
use crate::pass::scope::Context;
use crate::pass::{HandlerResult, HandlerSet, Pass};

pub const NO_DEBUGGER: &str = "no-debugger";
pub const NO_WITH: &str = "no-with";
pub const SHADOWING: &str = "shadowing";

pub const NAMES: &[&str] = &[NO_DEBUGGER, NO_WITH, SHADOWING];

pub fn by_name(name: &str) -> Option<HandlerSet> {
    match name {
        NO_DEBUGGER => Some(no_debugger()),
        NO_WITH => Some(no_with()),
        SHADOWING => Some(shadowing()),
        _ => None,
    }
}

/// Warns on every `debugger` statement.
pub fn no_debugger() -> HandlerSet {
    HandlerSet::new().on_enter("DebuggerStatement", |pass, node, _| {
        pass.warn(node, "unexpected 'debugger' statement");
        Ok(None)
    })
}

/// Rejects `with` statements outright.
pub fn no_with() -> HandlerSet {
    HandlerSet::new().on_enter("WithStatement", |pass, node, _| {
        pass.raise(node, "'with' statements are not allowed")
    })
}

// Context keys used by the shadowing lint. `outer` holds every name bound in
// an enclosing scope, `local` the names bound in the current one.
const OUTER: &str = "shadowing.outer";
const LOCAL: &str = "shadowing.local";

/// Warns when a declaration reuses a name bound in an enclosing scope.
///
/// Functions of every form open a scope here, so this set takes over the
/// `FunctionExpression` handlers from the baseline.
pub fn shadowing() -> HandlerSet {
    HandlerSet::new()
        .on_scope_enter(|transition| {
            if let Some(context) = transition.context {
                let mut outer = names(context, OUTER);
                for name in names(context, LOCAL) {
                    if !outer.contains(&name) {
                        outer.push(name);
                    }
                }
                context.insert(OUTER, Value::from(outer));
                context.insert(LOCAL, Value::Array(Vec::new()));
            }
        })
        .on_enter("VariableDeclarator", |pass, node, _| {
            if let Some(id) = node.child("id") {
                declare_pattern(pass, id);
            }
            Ok(None)
        })
        .on_enter("FunctionDeclaration", |pass, node, parent| {
            if let Some(id) = node.child("id") {
                declare_pattern(pass, id);
            }
            enter_function(pass, node, parent)
        })
        .on_exit("FunctionDeclaration", exit_function)
        .on_enter("FunctionExpression", enter_function)
        .on_exit("FunctionExpression", exit_function)
        .on_enter("ArrowFunctionExpression", enter_function)
        .on_exit("ArrowFunctionExpression", exit_function)
}

fn enter_function(pass: &mut Pass<'_>, node: &mut Node, _: Option<Parent<'_>>) -> HandlerResult {
    pass.push_scope(function_scope(node));
    for param in node.children("params") {
        declare_pattern(pass, param);
    }
    Ok(None)
}

fn exit_function(pass: &mut Pass<'_>, _: &mut Node, _: Option<Parent<'_>>) -> HandlerResult {
    pass.pop_scope();
    Ok(None)
}

fn names(context: &Context, key: &str) -> Vec<String> {
    context.get_as(key).ok().flatten().unwrap_or_default()
}

/// Declare every identifier bound by a binding pattern.
fn declare_pattern(pass: &mut Pass<'_>, pattern: &Node) {
    match pattern.kind.as_str() {
        "Identifier" => {
            if let Some(name) = pattern.str_value("name") {
                declare(pass, pattern, name);
            }
        }
        "AssignmentPattern" => {
            if let Some(left) = pattern.child("left") {
                declare_pattern(pass, left);
            }
        }
        "RestElement" => {
            if let Some(argument) = pattern.child("argument") {
                declare_pattern(pass, argument);
            }
        }
        "ArrayPattern" => {
            for element in pattern.children("elements") {
                declare_pattern(pass, element);
            }
        }
        "ObjectPattern" => {
            for property in pattern.children("properties") {
                match property.child("value") {
                    Some(value) => declare_pattern(pass, value),
                    None => declare_pattern(pass, property),
                }
            }
        }
        _ => {}
    }
}

fn declare(pass: &mut Pass<'_>, node: &Node, name: &str) {
    let Some(context) = pass.context_mut() else {
        return;
    };
    let shadows = names(context, OUTER).iter().any(|n| n == name);
    let mut local = names(context, LOCAL);
    if !local.iter().any(|n| n == name) {
        local.push(name.to_string());
        context.insert(LOCAL, Value::from(local));
    }
    if shadows {
        pass.warn(node, format!("'{name}' shadows a binding from an enclosing scope"));
    }
}
