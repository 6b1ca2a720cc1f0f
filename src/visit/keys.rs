//! Node kind → child field names.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Deserialize;

use super::WalkError;
use crate::ast::{Field, Node};

/// What to do with a node whose kind has no registered keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    /// Fail the walk with [`WalkError::UnknownNodeType`].
    #[default]
    Error,
    /// Walk every field that holds a node or a list of nodes, in field-name
    /// order.
    Fields,
}

const ESTREE_KEYS: &[(&str, &[&str])] = &[
    ("ArrayExpression", &["elements"]),
    ("ArrayPattern", &["elements"]),
    ("ArrowFunctionExpression", &["params", "body"]),
    ("AssignmentExpression", &["left", "right"]),
    ("AssignmentPattern", &["left", "right"]),
    ("AwaitExpression", &["argument"]),
    ("BinaryExpression", &["left", "right"]),
    ("BlockStatement", &["body"]),
    ("BreakStatement", &["label"]),
    ("CallExpression", &["callee", "arguments"]),
    ("CatchClause", &["param", "body"]),
    ("ChainExpression", &["expression"]),
    ("ClassBody", &["body"]),
    ("ClassDeclaration", &["id", "superClass", "body"]),
    ("ClassExpression", &["id", "superClass", "body"]),
    ("ConditionalExpression", &["test", "consequent", "alternate"]),
    ("ContinueStatement", &["label"]),
    ("DebuggerStatement", &[]),
    ("DoWhileStatement", &["body", "test"]),
    ("EmptyStatement", &[]),
    ("ExportAllDeclaration", &["exported", "source"]),
    ("ExportDefaultDeclaration", &["declaration"]),
    ("ExportNamedDeclaration", &["declaration", "specifiers", "source"]),
    ("ExportSpecifier", &["exported", "local"]),
    ("ExpressionStatement", &["expression"]),
    ("ForInStatement", &["left", "right", "body"]),
    ("ForOfStatement", &["left", "right", "body"]),
    ("ForStatement", &["init", "test", "update", "body"]),
    ("FunctionDeclaration", &["id", "params", "body"]),
    ("FunctionExpression", &["id", "params", "body"]),
    ("Identifier", &[]),
    ("IfStatement", &["test", "consequent", "alternate"]),
    ("ImportDeclaration", &["specifiers", "source"]),
    ("ImportDefaultSpecifier", &["local"]),
    ("ImportExpression", &["source"]),
    ("ImportNamespaceSpecifier", &["local"]),
    ("ImportSpecifier", &["imported", "local"]),
    ("LabeledStatement", &["label", "body"]),
    ("Literal", &[]),
    ("LogicalExpression", &["left", "right"]),
    ("MemberExpression", &["object", "property"]),
    ("MetaProperty", &["meta", "property"]),
    ("MethodDefinition", &["key", "value"]),
    ("NewExpression", &["callee", "arguments"]),
    ("ObjectExpression", &["properties"]),
    ("ObjectPattern", &["properties"]),
    ("PrivateIdentifier", &[]),
    ("Program", &["body"]),
    ("Property", &["key", "value"]),
    ("PropertyDefinition", &["key", "value"]),
    ("RestElement", &["argument"]),
    ("ReturnStatement", &["argument"]),
    ("SequenceExpression", &["expressions"]),
    ("SpreadElement", &["argument"]),
    ("StaticBlock", &["body"]),
    ("Super", &[]),
    ("SwitchCase", &["test", "consequent"]),
    ("SwitchStatement", &["discriminant", "cases"]),
    ("TaggedTemplateExpression", &["tag", "quasi"]),
    ("TemplateElement", &[]),
    ("TemplateLiteral", &["quasis", "expressions"]),
    ("ThisExpression", &[]),
    ("ThrowStatement", &["argument"]),
    ("TryStatement", &["block", "handler", "finalizer"]),
    ("UnaryExpression", &["argument"]),
    ("UpdateExpression", &["argument"]),
    ("VariableDeclaration", &["declarations"]),
    ("VariableDeclarator", &["id", "init"]),
    ("WhileStatement", &["test", "body"]),
    ("WithStatement", &["object", "body"]),
    ("YieldExpression", &["argument"]),
];

/// Table of child field names per node kind.
#[derive(Debug, Clone, Default)]
pub struct VisitorKeys {
    keys: HashMap<String, Vec<String>>,
    fallback: Fallback,
}

impl VisitorKeys {
    /// An empty table; every kind must be registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard ESTree (ES2022) node kinds.
    pub fn estree() -> Self {
        let keys = ESTREE_KEYS
            .iter()
            .map(|(kind, fields)| (kind.to_string(), fields.iter().map(|f| f.to_string()).collect()))
            .collect();
        Self { keys, fallback: Fallback::Error }
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// Register (or replace) the child fields of `kind`.
    pub fn register<I, S>(&mut self, kind: impl Into<String>, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.insert(kind.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    /// Register a kind that never has children.
    pub fn register_leaf(&mut self, kind: impl Into<String>) -> &mut Self {
        self.keys.insert(kind.into(), Vec::new());
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.keys.contains_key(kind)
    }

    /// The fields of `node` to descend into, in visiting order.
    pub fn child_keys(&self, node: &Node) -> Result<Cow<'_, [String]>, WalkError> {
        if let Some(keys) = self.keys.get(&node.kind) {
            return Ok(Cow::Borrowed(keys.as_slice()));
        }
        match self.fallback {
            Fallback::Error => Err(WalkError::UnknownNodeType { kind: node.kind.clone(), loc: node.loc }),
            Fallback::Fields => Ok(Cow::Owned(
                node.fields
                    .iter()
                    .filter(|(_, field)| matches!(field, Field::Node(_) | Field::List(_)))
                    .map(|(key, _)| key.clone())
                    .collect(),
            )),
        }
    }
}
