//! Scope stack for passes: one frame per open scope-introducing node.
//!
//! Each frame pairs a snapshot of the scope node with a [`Context`], the
//! handler-defined state visible to everything inside that scope. Pushing a
//! frame deep-copies the enclosing context, so a child starts with every value
//! its ancestors had at push time, and nothing the child writes leaks back out
//! or into siblings. This is copy-on-push, not copy-on-write: the copy happens
//! whether or not the child ever writes.
//!
//! # Examples
//!
//! ```rust
//! use treepass::ast::NodeInfo;
//! use treepass::pass::scope::ScopeStack;
//!
//! let mut stack = ScopeStack::new();
//! stack.push(NodeInfo { kind: "Program".into(), loc: None }, 1);
//! stack.context_mut().unwrap().insert("strict", true.into());
//!
//! stack.push(NodeInfo { kind: "BlockStatement".into(), loc: None }, 3);
//! stack.context_mut().unwrap().insert("inner", 1.into());
//! assert_eq!(stack.context().unwrap().get("strict"), Some(&true.into()));
//!
//! stack.pop();
//! assert!(stack.context().unwrap().get("inner").is_none());
//! ```
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::ast::NodeInfo;
use crate::span::Loc;

/// Handler-defined key/value state of one scope.
///
/// Values are JSON so that independently written handler sets can share a
/// context without knowing each other's types; [`Context::get_as`] and
/// [`Context::set`] give typed access on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Decode the value under `key`. `Ok(None)` when the key is absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        self.values
            .get(key)
            .map(|value| T::deserialize(value))
            .transpose()
    }

    /// Encode `value` and store it under `key`.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> Result<(), serde_json::Error> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }
}

/// Snapshot of the node that opened a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeInfo {
    pub kind: String,
    pub loc: Option<Loc>,
    /// Traversal depth of the node that pushed the scope.
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct ScopeFrame {
    pub scope: ScopeInfo,
    pub context: Context,
}

/// What the scope hooks see on a push or pop.
///
/// `scope`/`context` describe the frame that is current after the
/// operation, `previous_*` the one that was current before it. On the
/// outermost push `previous_*` is `None`; on the outermost pop `scope` and
/// `context` are `None`.
pub struct ScopeTransition<'a> {
    pub scope: Option<&'a ScopeInfo>,
    pub context: Option<&'a mut Context>,
    pub previous_scope: Option<&'a ScopeInfo>,
    pub previous_context: Option<&'a Context>,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Open a scope for `node`, starting from a copy of the current context.
    pub fn push(&mut self, node: NodeInfo, depth: usize) -> ScopeTransition<'_> {
        let context = self.context().cloned().unwrap_or_default();
        self.frames.push(ScopeFrame {
            scope: ScopeInfo { kind: node.kind, loc: node.loc, depth },
            context,
        });
        let top = self.frames.len() - 1;
        let (outer, current) = self.frames.split_at_mut(top);
        let frame = &mut current[0];
        let previous = outer.last();
        ScopeTransition {
            scope: Some(&frame.scope),
            context: Some(&mut frame.context),
            previous_scope: previous.map(|f| &f.scope),
            previous_context: previous.map(|f| &f.context),
        }
    }

    /// Close the innermost scope, returning its frame. `None` when the stack
    /// is already empty.
    pub fn pop(&mut self) -> Option<ScopeFrame> {
        self.frames.pop()
    }

    pub fn current(&self) -> Option<&ScopeInfo> {
        self.frames.last().map(|f| &f.scope)
    }

    pub fn context(&self) -> Option<&Context> {
        self.frames.last().map(|f| &f.context)
    }

    pub fn context_mut(&mut self) -> Option<&mut Context> {
        self.frames.last_mut().map(|f| &mut f.context)
    }

    /// Frames from outermost to innermost.
    pub fn frames(&self) -> &[ScopeFrame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [ScopeFrame] {
        &mut self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// ==============================================================================
// Tests
// ==============================================================================
