//! The pass engine: handler dispatch, lifecycle hooks, scopes and diagnostics
//! layered over the [`visit`](crate::visit) walk.
//!
//! A [`Pass`] is built from [`PassOptions`] and a composed [`HandlerSet`] and
//! consumed by [`Pass::run`]. Handlers receive the engine itself, so they can
//! read the depth and current node, request a skip, push and pop scopes,
//! read and write the scope context, and record warnings or raise errors.

pub mod baseline;
pub mod handlers;
pub mod scope;

use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, debug_span, trace, warn};

use crate::ast::{Node, NodeInfo, Parent};
use crate::diagnostics::{PassError, SyntaxError, Warning};
use crate::visit::keys::VisitorKeys;
use crate::visit::{walk_children_mut, walk_node_mut, VisitControl, VisitMut};

pub use handlers::{compose, DispatchKey, HandlerFn, HandlerResult, HandlerSet, HandlerSource, Hook, Phase};
pub use scope::{Context, ScopeFrame, ScopeInfo, ScopeStack, ScopeTransition};

/// Per-run inputs shared by every handler.
#[derive(Debug, Clone)]
pub struct PassOptions {
    /// Original source text; carried into syntax errors for rendering.
    pub source: String,
    pub filename: String,
    pub keys: VisitorKeys,
}

impl PassOptions {
    pub fn new(source: impl Into<String>, filename: impl Into<String>) -> Self {
        Self { source: source.into(), filename: filename.into(), keys: VisitorKeys::estree() }
    }

    pub fn with_keys(mut self, keys: VisitorKeys) -> Self {
        self.keys = keys;
        self
    }
}

/// Accumulator shared by several runs; each successful run appends its
/// warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassResults {
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct PassOutput {
    pub tree: Node,
    pub warnings: Vec<Warning>,
}

/// Walk control reachable from inside a handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controller {
    skip: bool,
}

impl Controller {
    /// Don't descend into the children of the node being entered. Its exit
    /// handlers still run.
    pub fn skip(&mut self) {
        self.skip = true;
    }

    pub fn is_skip_requested(&self) -> bool {
        self.skip
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.skip)
    }
}

pub struct Pass<'a> {
    options: &'a PassOptions,
    handlers: &'a HandlerSet,
    depth: usize,
    current: Option<NodeInfo>,
    controller: Controller,
    scopes: ScopeStack,
    warnings: Vec<Warning>,
}

impl<'a> Pass<'a> {
    pub fn new(options: &'a PassOptions, handlers: &'a HandlerSet) -> Self {
        Self {
            options,
            handlers,
            depth: 0,
            current: None,
            controller: Controller::default(),
            scopes: ScopeStack::new(),
            warnings: Vec::new(),
        }
    }

    /// Walk `tree` once. On error the engine is dropped with whatever
    /// warnings it had collected.
    pub fn run(mut self, mut tree: Node) -> Result<PassOutput, PassError> {
        let span = debug_span!("pass", filename = %self.options.filename);
        let _guard = span.enter();

        let options = self.options;
        walk_node_mut(&mut self, &options.keys, &mut tree, None)?;

        if !self.scopes.is_empty() {
            warn!(open = self.scopes.depth(), "pass finished with open scopes");
        }
        debug!(warnings = self.warnings.len(), "pass finished");
        Ok(PassOutput { tree, warnings: self.warnings })
    }

    /// Walk `node` and its subtree with this engine, from inside a handler.
    ///
    /// Depth keeps counting from the caller's node. A skip already requested
    /// for the caller's node is still pending when this returns.
    pub fn traverse(&mut self, node: &mut Node, parent: Option<Parent<'_>>) -> Result<(), PassError> {
        let options = self.options;
        self.nested(|pass| walk_node_mut(pass, &options.keys, node, parent))
    }

    /// Walk the children of `node`, with `node` as their parent. Paired with
    /// [`Pass::skip`] this moves the descent into the handler.
    pub fn traverse_children(&mut self, node: &mut Node) -> Result<(), PassError> {
        let options = self.options;
        self.nested(|pass| walk_children_mut(pass, &options.keys, node))
    }

    fn nested(&mut self, walk: impl FnOnce(&mut Self) -> Result<(), PassError>) -> Result<(), PassError> {
        let pending = std::mem::take(&mut self.controller);
        let current = self.current.clone();
        walk(self)?;
        self.controller = pending;
        self.current = current;
        Ok(())
    }

    pub fn options(&self) -> &PassOptions {
        self.options
    }

    /// Depth of the node being processed; the root is at depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn current(&self) -> Option<&NodeInfo> {
        self.current.as_ref()
    }

    pub fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn skip(&mut self) {
        self.controller.skip();
    }

    // ---- scopes ----

    /// Open a scope for `node`, seeded with a copy of the current context.
    pub fn push_scope(&mut self, node: &Node) {
        trace!(kind = %node.kind, depth = self.depth, "push scope");
        let handlers = self.handlers;
        let transition = self.scopes.push(NodeInfo::from(node), self.depth);
        if let Some(hook) = handlers.scope_enter() {
            hook(transition);
        }
    }

    /// Close the innermost scope and return it. `None`, and no hook call,
    /// when no scope is open.
    pub fn pop_scope(&mut self) -> Option<ScopeFrame> {
        let left = self.scopes.pop()?;
        trace!(kind = %left.scope.kind, depth = self.depth, "pop scope");
        let handlers = self.handlers;
        if let Some(hook) = handlers.scope_exit() {
            let (scope, context) = self
                .scopes
                .frames_mut()
                .last_mut()
                .map(|frame| (&frame.scope, &mut frame.context))
                .unzip();
            hook(ScopeTransition {
                scope,
                context,
                previous_scope: Some(&left.scope),
                previous_context: Some(&left.context),
            });
        }
        Some(left)
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn scope(&self) -> Option<&ScopeInfo> {
        self.scopes.current()
    }

    pub fn context(&self) -> Option<&Context> {
        self.scopes.context()
    }

    pub fn context_mut(&mut self) -> Option<&mut Context> {
        self.scopes.context_mut()
    }

    // ---- diagnostics ----

    pub fn warn(&mut self, node: &Node, description: impl Into<String>) {
        let warning = Warning::new(node.loc, self.options.filename.as_str(), description);
        trace!(%warning, "warning");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// A fatal error at `node`, carrying the run's source and filename.
    /// Returning it from a handler aborts the run.
    pub fn syntax_error(&self, node: &Node, description: impl Into<String>) -> PassError {
        SyntaxError::new(node.loc, description, self.options.source.as_str(), self.options.filename.as_str())
            .into()
    }

    pub fn raise<T>(&self, node: &Node, description: impl Into<String>) -> Result<T, PassError> {
        Err(self.syntax_error(node, description))
    }

    fn dispatch(
        &mut self,
        handler: Option<&Rc<HandlerFn>>,
        node: &mut Node,
        parent: Option<Parent<'_>>,
    ) -> Result<(), PassError> {
        let Some(handler) = handler else {
            return Ok(());
        };
        if let Some(replacement) = handler(self, node, parent)? {
            trace!(from = %node.kind, to = %replacement.kind, "replace node");
            *node = replacement;
            self.current = Some(NodeInfo::from(&*node));
        }
        Ok(())
    }
}

impl VisitMut for Pass<'_> {
    type Error = PassError;

    fn enter(&mut self, node: &mut Node, parent: Option<Parent<'_>>) -> Result<VisitControl, PassError> {
        self.depth += 1;
        self.current = Some(NodeInfo::from(&*node));
        trace!(kind = %node.kind, depth = self.depth, "enter");

        let handlers = self.handlers;
        self.dispatch(handlers.hook_handler(Hook::BeforeEnter), node, parent)?;
        self.dispatch(handlers.handler(Phase::Enter, &node.kind), node, parent)?;
        self.dispatch(handlers.hook_handler(Hook::AfterEnter), node, parent)?;

        if self.controller.take() {
            trace!(kind = %node.kind, "skip children");
            Ok(VisitControl::Skip)
        } else {
            Ok(VisitControl::Continue)
        }
    }

    fn leave(&mut self, node: &mut Node, parent: Option<Parent<'_>>) -> Result<(), PassError> {
        self.current = Some(NodeInfo::from(&*node));
        trace!(kind = %node.kind, depth = self.depth, "exit");

        let handlers = self.handlers;
        self.dispatch(handlers.hook_handler(Hook::BeforeExit), node, parent)?;
        self.dispatch(handlers.handler(Phase::Exit, &node.kind), node, parent)?;
        self.dispatch(handlers.hook_handler(Hook::AfterExit), node, parent)?;

        // A skip requested on the way out has nothing to apply to.
        self.controller.take();
        self.depth -= 1;
        Ok(())
    }
}
