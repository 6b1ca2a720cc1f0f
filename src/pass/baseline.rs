//! Scope handlers every composed handler set starts from.
//!
//! `Program` opens the outermost scope and `FunctionExpression` opens one
//! per function, on the function body. A handler set that defines any of
//! these four keys replaces the built-in one, scope push/pop included, and
//! then owns keeping the stack balanced.

use super::handlers::HandlerSet;
use crate::ast::Node;

pub const PROGRAM: &str = "Program";
pub const FUNCTION_EXPRESSION: &str = "FunctionExpression";

pub fn baseline() -> HandlerSet {
    HandlerSet::new()
        .on_enter(PROGRAM, |pass, node, _| {
            pass.push_scope(node);
            Ok(None)
        })
        .on_exit(PROGRAM, |pass, _, _| {
            pass.pop_scope();
            Ok(None)
        })
        .on_enter(FUNCTION_EXPRESSION, |pass, node, _| {
            pass.push_scope(function_scope(node));
            Ok(None)
        })
        .on_exit(FUNCTION_EXPRESSION, |pass, _, _| {
            pass.pop_scope();
            Ok(None)
        })
}

/// The node a function's scope is keyed on: its `body`, or the function
/// itself when it has no body node.
pub fn function_scope(node: &Node) -> &Node {
    node.child("body").unwrap_or(node)
}
