//! Handler sets and their composition.
//!
//! A [`HandlerSet`] maps dispatch keys to handler functions. Several sets are
//! merged into one dispatch table per run: for each key the set merged last
//! wins outright, there is no chaining to the handler it replaced.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::Pass;
use super::baseline::baseline;
use super::scope::ScopeTransition;
use crate::ast::{Node, Parent};
use crate::diagnostics::PassError;

/// `Ok(Some(node))` replaces the visited node, `Ok(None)` leaves it as is.
pub type HandlerResult = Result<Option<Node>, PassError>;

pub type HandlerFn = dyn Fn(&mut Pass<'_>, &mut Node, Option<Parent<'_>>) -> HandlerResult;

pub type ScopeHookFn = dyn Fn(ScopeTransition<'_>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Enter,
    Exit,
}

/// Lifecycle hooks that run around the kind-specific handler of every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hook {
    BeforeEnter,
    AfterEnter,
    BeforeExit,
    AfterExit,
}

/// Every key a handler set can define.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DispatchKey {
    Node { kind: String, phase: Phase },
    Hook(Hook),
    ScopeEnter,
    ScopeExit,
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchKey::Node { kind, phase: Phase::Enter } => write!(f, "{kind}"),
            DispatchKey::Node { kind, phase: Phase::Exit } => write!(f, "{kind} (exit)"),
            DispatchKey::Hook(hook) => write!(f, "{hook:?}"),
            DispatchKey::ScopeEnter => write!(f, "ScopeEnter"),
            DispatchKey::ScopeExit => write!(f, "ScopeExit"),
        }
    }
}

#[derive(Clone, Default)]
pub struct HandlerSet {
    enter: HashMap<String, Rc<HandlerFn>>,
    exit: HashMap<String, Rc<HandlerFn>>,
    hooks: HashMap<Hook, Rc<HandlerFn>>,
    scope_enter: Option<Rc<ScopeHookFn>>,
    scope_exit: Option<Rc<ScopeHookFn>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_enter<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Pass<'_>, &mut Node, Option<Parent<'_>>) -> HandlerResult + 'static,
    {
        self.enter.insert(kind.into(), Rc::new(handler));
        self
    }

    pub fn on_exit<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Pass<'_>, &mut Node, Option<Parent<'_>>) -> HandlerResult + 'static,
    {
        self.exit.insert(kind.into(), Rc::new(handler));
        self
    }

    pub fn hook<F>(mut self, hook: Hook, handler: F) -> Self
    where
        F: Fn(&mut Pass<'_>, &mut Node, Option<Parent<'_>>) -> HandlerResult + 'static,
    {
        self.hooks.insert(hook, Rc::new(handler));
        self
    }

    pub fn on_scope_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(ScopeTransition<'_>) + 'static,
    {
        self.scope_enter = Some(Rc::new(hook));
        self
    }

    pub fn on_scope_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(ScopeTransition<'_>) + 'static,
    {
        self.scope_exit = Some(Rc::new(hook));
        self
    }

    pub fn handler(&self, phase: Phase, kind: &str) -> Option<&Rc<HandlerFn>> {
        match phase {
            Phase::Enter => self.enter.get(kind),
            Phase::Exit => self.exit.get(kind),
        }
    }

    pub fn hook_handler(&self, hook: Hook) -> Option<&Rc<HandlerFn>> {
        self.hooks.get(&hook)
    }

    pub fn scope_enter(&self) -> Option<&Rc<ScopeHookFn>> {
        self.scope_enter.as_ref()
    }

    pub fn scope_exit(&self) -> Option<&Rc<ScopeHookFn>> {
        self.scope_exit.as_ref()
    }

    pub fn contains(&self, key: &DispatchKey) -> bool {
        match key {
            DispatchKey::Node { kind, phase } => self.handler(*phase, kind).is_some(),
            DispatchKey::Hook(hook) => self.hooks.contains_key(hook),
            DispatchKey::ScopeEnter => self.scope_enter.is_some(),
            DispatchKey::ScopeExit => self.scope_exit.is_some(),
        }
    }

    /// All defined keys, sorted.
    pub fn keys(&self) -> Vec<DispatchKey> {
        let mut keys: Vec<DispatchKey> = self
            .enter
            .keys()
            .map(|kind| DispatchKey::Node { kind: kind.clone(), phase: Phase::Enter })
            .chain(self.exit.keys().map(|kind| DispatchKey::Node { kind: kind.clone(), phase: Phase::Exit }))
            .chain(self.hooks.keys().copied().map(DispatchKey::Hook))
            .collect();
        if self.scope_enter.is_some() {
            keys.push(DispatchKey::ScopeEnter);
        }
        if self.scope_exit.is_some() {
            keys.push(DispatchKey::ScopeExit);
        }
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.enter.len()
            + self.exit.len()
            + self.hooks.len()
            + usize::from(self.scope_enter.is_some())
            + usize::from(self.scope_exit.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overlay `other` on this set; keys defined in `other` replace ours.
    pub fn merge(&mut self, other: &HandlerSet) {
        for (kind, handler) in &other.enter {
            self.enter.insert(kind.clone(), Rc::clone(handler));
        }
        for (kind, handler) in &other.exit {
            self.exit.insert(kind.clone(), Rc::clone(handler));
        }
        for (hook, handler) in &other.hooks {
            self.hooks.insert(*hook, Rc::clone(handler));
        }
        if let Some(hook) = &other.scope_enter {
            self.scope_enter = Some(Rc::clone(hook));
        }
        if let Some(hook) = &other.scope_exit {
            self.scope_exit = Some(Rc::clone(hook));
        }
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.keys().iter().map(ToString::to_string).collect();
        f.debug_struct("HandlerSet").field("keys", &keys).finish()
    }
}

/// Anything that can contribute a handler set to a run.
pub trait HandlerSource {
    fn handler_set(&self) -> HandlerSet;
}

impl HandlerSource for HandlerSet {
    fn handler_set(&self) -> HandlerSet {
        self.clone()
    }
}

impl<F> HandlerSource for F
where
    F: Fn() -> HandlerSet,
{
    fn handler_set(&self) -> HandlerSet {
        self()
    }
}

/// Merge `sources`, in order, on top of the [`baseline`] scope handlers.
pub fn compose(sources: &[&dyn HandlerSource]) -> HandlerSet {
    let mut composed = baseline();
    for source in sources {
        composed.merge(&source.handler_set());
    }
    debug!(sources = sources.len(), handlers = composed.len(), "composed handler sets");
    composed
}
