use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::span::Loc;

/// A syntax tree node in ESTree shape.
///
/// Only `kind` (serialized as `type`) and `loc` are structural. Everything
/// else lives in `fields`; which of those hold children is decided by
/// [`VisitorKeys`](crate::visit::keys::VisitorKeys), not by the node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Field>,
}

/// The value of a named node field.
///
/// JSON carries no tag for the variant, so reading classifies by shape: an
/// object with a string `type` is a [`Field::Node`], an array whose items are
/// all such objects or `null` is a [`Field::List`], and anything else is a
/// [`Field::Value`]. A `Value` holding one of those shapes (an empty array,
/// say) therefore reads back as a `List` or a `Node`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Node(Box<Node>),
    /// A list of child nodes; `None` marks a hole (`[a, , b]`).
    List(Vec<Option<Node>>),
    Value(Value),
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), loc: None, fields: BTreeMap::new() }
    }

    pub fn with_loc(mut self, loc: Loc) -> Self {
        self.loc = Some(loc);
        self
    }

    pub fn with_child(mut self, key: impl Into<String>, child: Node) -> Self {
        self.fields.insert(key.into(), Field::Node(Box::new(child)));
        self
    }

    pub fn with_children(mut self, key: impl Into<String>, children: Vec<Node>) -> Self {
        self.fields.insert(key.into(), Field::List(children.into_iter().map(Some).collect()));
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), Field::Value(value.into()));
        self
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn child(&self, key: &str) -> Option<&Node> {
        match self.fields.get(key) {
            Some(Field::Node(node)) => Some(node),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut Node> {
        match self.fields.get_mut(key) {
            Some(Field::Node(node)) => Some(node),
            _ => None,
        }
    }

    /// Child nodes stored under `key`, skipping holes. A single-node field
    /// yields that one node.
    pub fn children<'a>(&'a self, key: &str) -> Box<dyn Iterator<Item = &'a Node> + 'a> {
        match self.fields.get(key) {
            Some(Field::Node(node)) => Box::new(std::iter::once(node.as_ref())),
            Some(Field::List(items)) => Box::new(items.iter().flatten()),
            _ => Box::new(std::iter::empty()),
        }
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.fields.get(key) {
            Some(Field::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(Value::as_str)
    }

    /// Number of nodes in this subtree, following every field that holds
    /// nodes.
    pub fn count(&self) -> usize {
        1 + self
            .fields
            .values()
            .map(|field| match field {
                Field::Node(node) => node.count(),
                Field::List(items) => items.iter().flatten().map(Node::count).sum(),
                Field::Value(_) => 0,
            })
            .sum::<usize>()
    }
}

// Deserialization goes through `serde_json::Value` and is then converted by
// hand; nesting follows the tree, so the conversion grows the stack as it
// descends instead of relying on serde's derived recursion.
impl Node {
    /// Convert an ESTree JSON object into a node.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(map) = value else {
            return Err(de::Error::custom("expected an ESTree node object"));
        };
        Self::from_object(map)
    }

    fn from_object(mut map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let kind = match map.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(_) => return Err(de::Error::custom("node `type` must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };
        let loc = match map.remove("loc") {
            None | Some(Value::Null) => None,
            Some(loc) => Some(serde_json::from_value(loc)?),
        };
        let fields = map
            .into_iter()
            .map(|(key, value)| Ok((key, Field::from_json(value)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        Ok(Self { kind, loc, fields })
    }
}

impl Field {
    /// Classify a JSON value by shape; see [`Field`].
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(map) if is_node_object(&map) => {
                let node = stacker::maybe_grow(32 * 1024, 1024 * 1024, || Node::from_object(map))?;
                Ok(Field::Node(Box::new(node)))
            }
            Value::Array(items) if items.iter().all(is_node_or_hole) => {
                let items = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => {
                            stacker::maybe_grow(32 * 1024, 1024 * 1024, || Node::from_object(map)).map(Some)
                        }
                        _ => Ok(None),
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Field::List(items))
            }
            other => Ok(Field::Value(other)),
        }
    }
}

fn is_node_object(map: &Map<String, Value>) -> bool {
    matches!(map.get("type"), Some(Value::String(_)))
}

fn is_node_or_hole(item: &Value) -> bool {
    match item {
        Value::Null => true,
        Value::Object(map) => is_node_object(map),
        _ => false,
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Node::from_json(value).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Field::from_json(value).map_err(de::Error::custom)
    }
}

/// Kind and location of a node, detached from the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub kind: String,
    pub loc: Option<Loc>,
}

impl From<&Node> for NodeInfo {
    fn from(node: &Node) -> Self {
        Self { kind: node.kind.clone(), loc: node.loc }
    }
}

/// How a node was reached from its parent.
///
/// The field named by `key` is detached from `node` while it is being walked,
/// so `node` shows every field of the parent except that one.
#[derive(Debug, Clone, Copy)]
pub struct Parent<'a> {
    pub node: &'a Node,
    pub key: &'a str,
    pub index: Option<usize>,
}

impl Parent<'_> {
    pub fn kind(&self) -> &str {
        &self.node.kind
    }
}
