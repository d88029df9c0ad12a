//! Tree nodes and the records they hold.
//!
//! A [`Node`] pairs a [`NodeRole`] with a [`NodeBody`]:
//! - leaf roles (`RootLeaf`, `Leaf`) carry sorted [`Record`]s and a `next` link
//! - branch roles (`Root`, `Internal`) carry sorted separator keys and
//!   exactly one more child than separators

use std::fmt;

use crate::common::{Error, NodeId, Result};

/// An immutable key/value pair stored in a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    key: String,
    value: String,
}

impl Record {
    /// Create a new record.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consume the record, returning `(key, value)`.
    pub fn into_parts(self) -> (String, String) {
        (self.key, self.value)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// What a node is, structurally.
///
/// Transitions only happen at split time and only go one way:
///
/// ```text
/// RootLeaf ──first split──▶ Leaf
/// Root     ──root split───▶ Internal
/// ```
///
/// A fresh `Root` is created above the demoted node in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// The initial, never-split root that doubles as the only leaf.
    RootLeaf,
    /// Branch node with no parent.
    Root,
    /// Branch node below the root.
    Internal,
    /// Leaf below the root.
    Leaf,
}

impl NodeRole {
    #[inline]
    pub fn is_root(self) -> bool {
        matches!(self, NodeRole::RootLeaf | NodeRole::Root)
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeRole::RootLeaf | NodeRole::Leaf)
    }

    /// The role a root takes once a new root is installed above it.
    ///
    /// # Errors
    /// `Error::InvariantViolation` for non-root roles.
    pub fn demoted(self) -> Result<NodeRole> {
        match self {
            NodeRole::RootLeaf => Ok(NodeRole::Leaf),
            NodeRole::Root => Ok(NodeRole::Internal),
            other => Err(Error::corrupt(format!("cannot demote a {:?} node", other))),
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeRole::RootLeaf => "rootleaf",
            NodeRole::Root => "root",
            NodeRole::Internal => "internal",
            NodeRole::Leaf => "leaf",
        };
        f.write_str(name)
    }
}

/// Role-specific node contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    Leaf {
        /// Strictly ascending by key.
        records: Vec<Record>,
        /// Right sibling at the same level.
        next: Option<NodeId>,
    },
    Branch {
        /// Strictly ascending routing keys.
        separators: Vec<String>,
        /// Always `separators.len() + 1` entries.
        children: Vec<NodeId>,
    },
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    role: NodeRole,
    body: NodeBody,
}

impl Node {
    /// The empty node a new tree starts with.
    pub fn root_leaf() -> Self {
        Self {
            role: NodeRole::RootLeaf,
            body: NodeBody::Leaf {
                records: Vec::new(),
                next: None,
            },
        }
    }

    /// A non-root leaf, as produced by a leaf split.
    pub fn leaf(records: Vec<Record>, next: Option<NodeId>) -> Self {
        Self {
            role: NodeRole::Leaf,
            body: NodeBody::Leaf { records, next },
        }
    }

    /// A branch node with the given role.
    pub fn branch(role: NodeRole, separators: Vec<String>, children: Vec<NodeId>) -> Self {
        debug_assert!(!role.is_leaf());
        debug_assert_eq!(children.len(), separators.len() + 1);
        Self {
            role,
            body: NodeBody::Branch {
                separators,
                children,
            },
        }
    }

    /// A fresh root above `left` and `right`.
    pub fn new_root(separator: String, left: NodeId, right: NodeId) -> Self {
        Self::branch(NodeRole::Root, vec![separator], vec![left, right])
    }

    #[inline]
    pub fn role(&self) -> NodeRole {
        self.role
    }

    #[inline]
    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    #[inline]
    pub(crate) fn body_mut(&mut self) -> &mut NodeBody {
        &mut self.body
    }

    /// Apply the one-way root demotion (see [`NodeRole::demoted`]).
    pub(crate) fn demote(&mut self) -> Result<()> {
        self.role = self.role.demoted()?;
        Ok(())
    }

    /// Number of records (leaf) or separators (branch).
    pub fn entry_count(&self) -> usize {
        match &self.body {
            NodeBody::Leaf { records, .. } => records.len(),
            NodeBody::Branch { separators, .. } => separators.len(),
        }
    }

    /// Key of the first entry, if any.
    pub fn first_key(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Leaf { records, .. } => records.first().map(Record::key),
            NodeBody::Branch { separators, .. } => separators.first().map(String::as_str),
        }
    }

    /// Children of a branch node; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        match &self.body {
            NodeBody::Leaf { .. } => &[],
            NodeBody::Branch { children, .. } => children,
        }
    }

    /// Right sibling of a leaf; `None` for branches.
    pub fn next(&self) -> Option<NodeId> {
        match &self.body {
            NodeBody::Leaf { next, .. } => *next,
            NodeBody::Branch { .. } => None,
        }
    }
}

/// Index of the child a key descends into.
///
/// Equal-to-separator routes right, so each separator is the smallest key
/// reachable in its right subtree.
#[inline]
pub(crate) fn route(separators: &[String], key: &str) -> usize {
    separators.partition_point(|sep| sep.as_str() <= key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seps(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_record_accessors() {
        let r = Record::new("k", "v");
        assert_eq!(r.key(), "k");
        assert_eq!(r.value(), "v");
        assert_eq!(format!("{}", r), "k=v");
        assert_eq!(r.into_parts(), ("k".to_string(), "v".to_string()));
    }

    #[test]
    fn test_role_transitions() {
        assert_eq!(NodeRole::RootLeaf.demoted().unwrap(), NodeRole::Leaf);
        assert_eq!(NodeRole::Root.demoted().unwrap(), NodeRole::Internal);
        assert!(NodeRole::Leaf.demoted().is_err());
        assert!(NodeRole::Internal.demoted().is_err());
    }

    #[test]
    fn test_role_predicates() {
        assert!(NodeRole::RootLeaf.is_root() && NodeRole::RootLeaf.is_leaf());
        assert!(NodeRole::Root.is_root() && !NodeRole::Root.is_leaf());
        assert!(!NodeRole::Internal.is_root() && !NodeRole::Internal.is_leaf());
        assert!(!NodeRole::Leaf.is_root() && NodeRole::Leaf.is_leaf());
        assert_eq!(NodeRole::RootLeaf.to_string(), "rootleaf");
    }

    #[test]
    fn test_root_leaf_starts_empty() {
        let n = Node::root_leaf();
        assert_eq!(n.role(), NodeRole::RootLeaf);
        assert_eq!(n.entry_count(), 0);
        assert!(n.children().is_empty());
        assert_eq!(n.first_key(), None);
        assert_eq!(n.next(), None);
    }

    #[test]
    fn test_new_root_shape() {
        let n = Node::new_root("d".into(), NodeId::new(0), NodeId::new(1));
        assert_eq!(n.role(), NodeRole::Root);
        assert_eq!(n.entry_count(), 1);
        assert_eq!(n.children(), &[NodeId::new(0), NodeId::new(1)]);
        assert_eq!(n.first_key(), Some("d"));
    }

    #[test]
    fn test_demote() {
        let mut n = Node::root_leaf();
        n.demote().unwrap();
        assert_eq!(n.role(), NodeRole::Leaf);
        assert!(n.demote().is_err());
    }

    #[test]
    fn test_route_equal_goes_right() {
        let s = seps(&["d", "g"]);
        assert_eq!(route(&s, "a"), 0);
        assert_eq!(route(&s, "d"), 1);
        assert_eq!(route(&s, "e"), 1);
        assert_eq!(route(&s, "g"), 2);
        assert_eq!(route(&s, "z"), 2);
        assert_eq!(route(&[], "anything"), 0);
    }
}
