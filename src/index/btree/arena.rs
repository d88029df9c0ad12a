//! Node storage.
//!
//! Every node lives in one `Vec<Node>` and is addressed by [`NodeId`].
//! Parents own children only in the logical sense; the arena owns them all,
//! which keeps sibling links and recorded descent paths free of borrows.

use crate::common::{Error, NodeId, Result};

use super::node::Node;

#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Store a node, returning its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// # Errors
    /// `Error::InvariantViolation` if `id` was never allocated.
    #[inline]
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::corrupt(format!("dangling reference to {}", id)))
    }

    /// # Errors
    /// `Error::InvariantViolation` if `id` was never allocated.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::corrupt(format!("dangling reference to {}", id)))
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_assigns_sequential_ids() {
        let mut arena = NodeArena::new();
        assert_eq!(arena.len(), 0);

        let a = arena.alloc(Node::root_leaf());
        let b = arena.alloc(Node::leaf(Vec::new(), None));

        assert_eq!(a, NodeId::new(0));
        assert_eq!(b, NodeId::new(1));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_dangling_id_is_corruption() {
        let mut arena = NodeArena::new();
        arena.alloc(Node::root_leaf());

        assert!(matches!(
            arena.get(NodeId::new(7)),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(
            arena.get_mut(NodeId::new(7)),
            Err(Error::InvariantViolation(_))
        ));
    }
}
