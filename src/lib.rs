pub mod span;
pub mod ast;
pub mod diagnostics;
pub mod visit;
pub mod pass;
pub mod config;
pub mod lints;

use serde::Deserialize;

use ast::Node;
use diagnostics::PassError;
use pass::{compose, HandlerSource, Pass, PassOptions, PassResults};

/// Compose `sources` on top of the baseline scope handlers, run them over
/// `tree` in one walk, and return the rewritten tree.
///
/// Warnings are appended to `results` only when the run succeeds, so one
/// accumulator can pool the warnings of several pass groups run in turn.
pub fn run_passes(
    tree: Node,
    options: &PassOptions,
    sources: &[&dyn HandlerSource],
    results: &mut PassResults,
) -> Result<Node, PassError> {
    let handlers = compose(sources);
    let output = Pass::new(options, &handlers).run(tree)?;
    results.warnings.extend(output.warnings);
    Ok(output.tree)
}

/// Parse an ESTree JSON document into a tree.
///
/// Real parser output nests far deeper than serde_json's default recursion
/// limit (long operator chains, `else if` ladders, bundler wrappers), so the
/// limit is lifted and the stack grows on demand instead.
pub fn parse_tree(json: &str) -> Result<Node, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_str(json);
    de.disable_recursion_limit();
    let value = serde_json::Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Node::from_json(value)
}
