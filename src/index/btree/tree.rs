//! The B+Tree facade.
//!
//! The tree starts as a single `RootLeaf` and grows upward: an overflowing
//! node splits, pushes a separator into its parent, and the parent may split
//! in turn until a fresh `Root` is installed above the old one.
//!
//! ```text
//!   insert(f) into [a b c d e]          after the split
//!
//!   RootLeaf [a b c d e f]   ──▶          Root [d]
//!                                        /        \
//!                                 Leaf [a b c] ─▶ Leaf [d e f]
//! ```

use tracing::{debug, trace};

use crate::common::{Error, NodeId, Result, TreeConfig};

use super::arena::NodeArena;
use super::node::{route, Node, NodeBody, NodeRole, Record};
use super::stats::TreeStats;

/// An in-memory B+Tree mapping unique string keys to string values.
///
/// # Example
/// ```
/// use bptindex::BPlusTree;
///
/// let mut tree = BPlusTree::new();
/// tree.insert("b", "2").unwrap();
/// tree.insert("a", "1").unwrap();
///
/// assert_eq!(tree.find("a").unwrap().map(|r| r.value()), Some("1"));
/// assert!(tree.find("z").unwrap().is_none());
/// assert!(tree.insert("a", "again").unwrap_err().is_duplicate_key());
/// ```
#[derive(Debug)]
pub struct BPlusTree {
    pub(super) config: TreeConfig,
    pub(super) arena: NodeArena,
    pub(super) root: NodeId,
    pub(super) len: usize,
    pub(super) height: usize,
    pub(super) stats: TreeStats,
}

impl BPlusTree {
    /// Create an empty tree with the default capacity of 5 entries per node.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree with a custom node capacity.
    pub fn with_config(config: TreeConfig) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::root_leaf());
        Self {
            config,
            arena,
            root,
            len: 0,
            height: 1,
            stats: TreeStats::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Number of records stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels; 1 while the root is still a `RootLeaf`.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Nodes allocated so far, across all levels.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    /// Borrow a node by id.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.arena.get(id)
    }

    pub fn role_of(&self, id: NodeId) -> Result<NodeRole> {
        Ok(self.arena.get(id)?.role())
    }

    /// The leaf holding the smallest keys.
    pub fn leftmost_leaf(&self) -> Result<NodeId> {
        let mut current = self.root;
        loop {
            match self.arena.get(current)?.body() {
                NodeBody::Leaf { .. } => return Ok(current),
                NodeBody::Branch { children, .. } => {
                    current = *children
                        .first()
                        .ok_or_else(|| Error::corrupt(format!("{} has no children", current)))?;
                }
            }
        }
    }

    /// The right sibling of a leaf, or `None` for the last leaf.
    pub fn next_leaf(&self, leaf: NodeId) -> Result<Option<NodeId>> {
        match self.arena.get(leaf)?.body() {
            NodeBody::Leaf { next, .. } => Ok(*next),
            NodeBody::Branch { .. } => Err(Error::corrupt(format!("{} is not a leaf", leaf))),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look up the record stored under `key`.
    ///
    /// Returns `Ok(None)` for keys never inserted. Never mutates the tree.
    ///
    /// # Errors
    /// `Error::InvariantViolation` only if the tree is corrupted.
    pub fn find(&self, key: &str) -> Result<Option<&Record>> {
        TreeStats::bump(&self.stats.lookups);

        let leaf = self.descend(key, None)?;
        let found = match self.arena.get(leaf)?.body() {
            NodeBody::Leaf { records, .. } => records
                .binary_search_by(|r| r.key().cmp(key))
                .ok()
                .map(|idx| &records[idx]),
            NodeBody::Branch { .. } => {
                return Err(Error::corrupt(format!("descent ended at branch {}", leaf)))
            }
        };

        if found.is_some() {
            TreeStats::bump(&self.stats.lookup_hits);
        }
        Ok(found)
    }

    /// Whether `key` is stored in the tree.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.find(key)?.is_some())
    }

    /// Walk from the root to the leaf responsible for `key`.
    ///
    /// When `path` is given, every branch node passed through is pushed onto
    /// it, so on return `path.last()` is the leaf's parent.
    fn descend(&self, key: &str, mut path: Option<&mut Vec<NodeId>>) -> Result<NodeId> {
        let mut current = self.root;
        loop {
            match self.arena.get(current)?.body() {
                NodeBody::Leaf { .. } => {
                    trace!(target: "bptindex::btree", key, leaf = current.0, "descent reached leaf");
                    return Ok(current);
                }
                NodeBody::Branch {
                    separators,
                    children,
                } => {
                    let idx = route(separators, key);
                    let child = *children.get(idx).ok_or_else(|| {
                        Error::corrupt(format!("{} has no child at index {}", current, idx))
                    })?;
                    if let Some(path) = path.as_deref_mut() {
                        path.push(current);
                    }
                    current = child;
                }
            }
        }
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert a new key/value pair.
    ///
    /// # Errors
    /// - `Error::DuplicateKey` if `key` is already present; the tree is unchanged
    /// - `Error::InvariantViolation` only if the tree is corrupted
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.insert_record(Record::new(key, value))
    }

    /// Insert an already-built record. See [`BPlusTree::insert`].
    pub fn insert_record(&mut self, record: Record) -> Result<()> {
        let mut path = Vec::with_capacity(self.height);
        let leaf_id = self.descend(record.key(), Some(&mut path))?;
        let max_entries = self.config.max_entries();

        let overflowing = {
            let records = match self.arena.get_mut(leaf_id)?.body_mut() {
                NodeBody::Leaf { records, .. } => records,
                NodeBody::Branch { .. } => {
                    return Err(Error::corrupt(format!("descent ended at branch {}", leaf_id)))
                }
            };
            match records.binary_search_by(|r| r.key().cmp(record.key())) {
                Ok(_) => {
                    TreeStats::bump(&self.stats.duplicate_rejections);
                    trace!(target: "bptindex::btree", key = record.key(), "rejected duplicate key");
                    let (key, _) = record.into_parts();
                    return Err(Error::DuplicateKey(key));
                }
                Err(pos) => records.insert(pos, record),
            }
            records.len() > max_entries
        };

        self.len += 1;
        TreeStats::bump(&self.stats.inserts);

        if overflowing {
            let (separator, right) = self.split_leaf(leaf_id)?;
            self.propagate_split(path, leaf_id, separator, right)?;
        }
        Ok(())
    }

    /// Move the upper half of an overflowing leaf into a new right sibling.
    ///
    /// Returns the separator (the right half's first key) and the new leaf.
    /// The new leaf inherits the old `next`, keeping the chain complete.
    fn split_leaf(&mut self, leaf_id: NodeId) -> Result<(String, NodeId)> {
        let at = self.config.leaf_split();

        let (upper, old_next) = match self.arena.get_mut(leaf_id)?.body_mut() {
            NodeBody::Leaf { records, next } => (records.split_off(at), next.take()),
            NodeBody::Branch { .. } => {
                return Err(Error::corrupt(format!("leaf split on branch {}", leaf_id)))
            }
        };
        let separator = upper
            .first()
            .map(|r| r.key().to_string())
            .ok_or_else(|| Error::corrupt(format!("leaf split of {} left no upper half", leaf_id)))?;

        let right = self.arena.alloc(Node::leaf(upper, old_next));
        if let NodeBody::Leaf { next, .. } = self.arena.get_mut(leaf_id)?.body_mut() {
            *next = Some(right);
        }

        TreeStats::bump(&self.stats.leaf_splits);
        debug!(
            target: "bptindex::btree",
            left = leaf_id.0,
            right = right.0,
            separator = %separator,
            "split leaf"
        );
        Ok((separator, right))
    }

    /// Push `(separator, right)` into successive ancestors until one absorbs
    /// it without overflowing, or a new root is installed.
    ///
    /// `path` is the root-to-parent chain recorded during descent; `left` is
    /// the node that just split.
    fn propagate_split(
        &mut self,
        mut path: Vec<NodeId>,
        mut left: NodeId,
        mut separator: String,
        mut right: NodeId,
    ) -> Result<()> {
        let max_entries = self.config.max_entries();

        loop {
            let parent = match path.pop() {
                Some(parent) => parent,
                None => return self.grow_root(left, separator, right),
            };

            let overflowing = match self.arena.get_mut(parent)?.body_mut() {
                NodeBody::Branch {
                    separators,
                    children,
                } => {
                    // New child always sits right of its separator.
                    let idx = route(separators, &separator);
                    separators.insert(idx, separator);
                    children.insert(idx + 1, right);
                    separators.len() > max_entries
                }
                NodeBody::Leaf { .. } => {
                    return Err(Error::corrupt(format!(
                        "ancestor {} on the descent path is a leaf",
                        parent
                    )))
                }
            };
            if !overflowing {
                return Ok(());
            }

            let (promoted, new_right) = self.split_branch(parent)?;
            left = parent;
            separator = promoted;
            right = new_right;
        }
    }

    /// Split an overflowing branch node around its promoted separator.
    ///
    /// The promoted key leaves both halves; the new right node is `Internal`.
    fn split_branch(&mut self, node_id: NodeId) -> Result<(String, NodeId)> {
        let p = self.config.promote_index();

        let (promoted, upper_seps, upper_children) = match self.arena.get_mut(node_id)?.body_mut() {
            NodeBody::Branch {
                separators,
                children,
            } => {
                let upper_seps = separators.split_off(p + 1);
                let promoted = separators.pop().ok_or_else(|| {
                    Error::corrupt(format!("branch split of {} has nothing to promote", node_id))
                })?;
                let upper_children = children.split_off(p + 1);
                (promoted, upper_seps, upper_children)
            }
            NodeBody::Leaf { .. } => {
                return Err(Error::corrupt(format!("branch split on leaf {}", node_id)))
            }
        };

        let right = self
            .arena
            .alloc(Node::branch(NodeRole::Internal, upper_seps, upper_children));

        TreeStats::bump(&self.stats.internal_splits);
        debug!(
            target: "bptindex::btree",
            left = node_id.0,
            right = right.0,
            promoted = %promoted,
            "split branch"
        );
        Ok((promoted, right))
    }

    /// Install a new root above the old root `left` and its new sibling.
    fn grow_root(&mut self, left: NodeId, separator: String, right: NodeId) -> Result<()> {
        if left != self.root {
            return Err(Error::corrupt(format!(
                "{} ran out of ancestors but the root is {}",
                left, self.root
            )));
        }

        self.arena.get_mut(left)?.demote()?;
        let new_root = self.arena.alloc(Node::new_root(separator, left, right));
        self.root = new_root;
        self.height += 1;

        TreeStats::bump(&self.stats.root_promotions);
        debug!(
            target: "bptindex::btree",
            root = new_root.0,
            height = self.height,
            "installed new root"
        );
        Ok(())
    }

    // ========================================================================
    // Ancestor resolution
    // ========================================================================

    /// Re-derive the parent of `target` by searching down from the root.
    ///
    /// Routes on the target's first key. Returns `Ok(None)` for the root.
    ///
    /// # Errors
    /// `Error::InvariantViolation` if the descent bottoms out at a leaf
    /// without meeting `target`, i.e. `target` is unreachable from the root.
    pub fn find_parent(&self, target: NodeId) -> Result<Option<NodeId>> {
        if target == self.root {
            return Ok(None);
        }

        let key = self
            .arena
            .get(target)?
            .first_key()
            .ok_or_else(|| Error::corrupt(format!("{} is empty and not the root", target)))?;

        let mut current = self.root;
        loop {
            match self.arena.get(current)?.body() {
                NodeBody::Leaf { .. } => {
                    return Err(Error::corrupt(format!(
                        "reached leaf {} without finding the parent of {}",
                        current, target
                    )))
                }
                NodeBody::Branch {
                    separators,
                    children,
                } => {
                    let idx = route(separators, key);
                    let child = *children.get(idx).ok_or_else(|| {
                        Error::corrupt(format!("{} has no child at index {}", current, idx))
                    })?;
                    if child == target {
                        return Ok(Some(current));
                    }
                    current = child;
                }
            }
        }
    }
}

impl Default for BPlusTree {
    fn default() -> Self {
        Self::new()
    }
}
