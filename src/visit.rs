//! Depth-first enter/leave walk over a mutable syntax tree
//!
//! This is the low-level traversal the pass engine is built on. It knows
//! nothing about handlers or scopes: a [`VisitMut`] implementation is called
//! on entry and on exit of every node, and which fields of a node are
//! children is looked up in [`VisitorKeys`].
//!
//! ## Usage
//!
//! ```rust
//! use treepass::ast::{Node, Parent};
//! use treepass::visit::keys::VisitorKeys;
//! use treepass::visit::{walk_node_mut, VisitControl, VisitMut, WalkError};
//!
//! struct Renamer;
//!
//! impl VisitMut for Renamer {
//!     type Error = WalkError;
//!
//!     fn enter(&mut self, node: &mut Node, _parent: Option<Parent<'_>>) -> Result<VisitControl, WalkError> {
//!         if node.is("Identifier") {
//!             node.fields.insert("name".into(), treepass::ast::Field::Value("renamed".into()));
//!         }
//!         Ok(VisitControl::Continue)
//!     }
//! }
//!
//! let mut tree = Node::new("ExpressionStatement")
//!     .with_child("expression", Node::new("Identifier").with_value("name", "x"));
//! walk_node_mut(&mut Renamer, &VisitorKeys::estree(), &mut tree, None).unwrap();
//! assert_eq!(tree.child("expression").unwrap().str_value("name"), Some("renamed"));
//! ```
//!
//! ## Semantics
//!
//! - `enter` runs before the children are resolved, so writing a new node
//!   into `*node` from `enter` changes which children get visited.
//! - Returning [`VisitControl::Skip`] from `enter` suppresses descent; `leave`
//!   still runs for that node.
//! - Children are visited in key order, list items in index order, and list
//!   holes are skipped.
//! - While a field is walked it is taken out of its parent and put back
//!   afterwards, even when the walk fails.

pub mod keys;

use thiserror::Error;

use crate::ast::{Field, Node, Parent};
use crate::span::Loc;
use keys::VisitorKeys;

/// Returned from [`VisitMut::enter`] to steer descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitControl {
    #[default]
    Continue,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkError {
    #[error("unknown node type '{kind}'")]
    UnknownNodeType { kind: String, loc: Option<Loc> },
}

/// Mutable enter/leave visitor. Both methods default to doing nothing.
pub trait VisitMut {
    type Error: From<WalkError>;

    fn enter(&mut self, _node: &mut Node, _parent: Option<Parent<'_>>) -> Result<VisitControl, Self::Error> {
        Ok(VisitControl::Continue)
    }

    fn leave(&mut self, _node: &mut Node, _parent: Option<Parent<'_>>) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub fn walk_node_mut<V: VisitMut>(
    v: &mut V,
    keys: &VisitorKeys,
    node: &mut Node,
    parent: Option<Parent<'_>>,
) -> Result<(), V::Error> {
    if v.enter(node, parent)? == VisitControl::Continue {
        walk_children_mut(v, keys, node)?;
    }
    v.leave(node, parent)
}

pub fn walk_children_mut<V: VisitMut>(v: &mut V, keys: &VisitorKeys, node: &mut Node) -> Result<(), V::Error> {
    let child_keys = keys.child_keys(node)?;
    for key in child_keys.iter() {
        let Some(mut field) = node.fields.remove(key.as_str()) else {
            continue;
        };
        let result = walk_field_mut(v, keys, &mut field, node, key);
        node.fields.insert(key.clone(), field);
        result?;
    }
    Ok(())
}

fn walk_field_mut<V: VisitMut>(
    v: &mut V,
    keys: &VisitorKeys,
    field: &mut Field,
    parent: &Node,
    key: &str,
) -> Result<(), V::Error> {
    match field {
        Field::Node(child) => grow(|| walk_node_mut(v, keys, child, Some(Parent { node: parent, key, index: None }))),
        Field::List(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                if let Some(child) = item {
                    grow(|| walk_node_mut(v, keys, child, Some(Parent { node: parent, key, index: Some(index) })))?;
                }
            }
            Ok(())
        }
        Field::Value(_) => Ok(()),
    }
}

// Trees can nest thousands of levels deep; grow the stack before descending.
fn grow<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, f)
}
