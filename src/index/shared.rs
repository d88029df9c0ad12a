//! Externally synchronised tree handle.
//!
//! [`BPlusTree`] itself is single-threaded. [`SharedTree`] wraps it in a
//! reader/writer lock so many threads may look keys up concurrently while
//! inserts take exclusive access, one writer at a time.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{Result, TreeConfig};
use crate::index::btree::{BPlusTree, Record, StatsSnapshot, TreeShape};

/// Cloneable, thread-safe handle to a [`BPlusTree`].
///
/// # Thread Safety
/// - `find`, `len`, `check_invariants`: shared read lock
/// - `insert`: exclusive write lock for the whole insert, splits included
///
/// # Example
/// ```
/// use bptindex::SharedTree;
///
/// let tree = SharedTree::new();
/// let writer = tree.clone();
/// std::thread::spawn(move || writer.insert("k", "v").unwrap())
///     .join()
///     .unwrap();
///
/// assert_eq!(tree.find("k").unwrap().unwrap().value(), "v");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedTree {
    inner: Arc<RwLock<BPlusTree>>,
}

impl SharedTree {
    pub fn new() -> Self {
        Self::from_tree(BPlusTree::new())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self::from_tree(BPlusTree::with_config(config))
    }

    /// Take ownership of an existing tree.
    pub fn from_tree(tree: BPlusTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Insert under the write lock. See [`BPlusTree::insert`].
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.inner.write().insert(key, value)
    }

    /// Look up under the read lock, returning an owned copy.
    pub fn find(&self, key: &str) -> Result<Option<Record>> {
        Ok(self.inner.read().find(key)?.cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn height(&self) -> usize {
        self.inner.read().height()
    }

    pub fn check_invariants(&self) -> Result<TreeShape> {
        self.inner.read().check_invariants()
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.inner.read().stats().snapshot()
    }

    /// Run `f` with shared access to the underlying tree.
    pub fn with_read<T>(&self, f: impl FnOnce(&BPlusTree) -> T) -> T {
        f(&self.inner.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_one_tree() {
        let a = SharedTree::new();
        let b = a.clone();

        a.insert("x", "1").unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b.find("x").unwrap(), Some(Record::new("x", "1")));
    }

    #[test]
    fn test_duplicate_through_handle() {
        let tree = SharedTree::new();
        tree.insert("x", "1").unwrap();
        assert!(tree.insert("x", "2").unwrap_err().is_duplicate_key());
        assert_eq!(tree.find("x").unwrap().unwrap().value(), "1");
    }

    #[test]
    fn test_concurrent_writers_disjoint_keys() {
        let tree = SharedTree::with_config(TreeConfig::new(4).unwrap());
        let mut handles = vec![];

        for t in 0..8 {
            let tree = tree.clone();
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    tree.insert(format!("{}-{:03}", t, i), "v").unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tree.len(), 800);
        let shape = tree.check_invariants().unwrap();
        assert_eq!(shape.records, 800);
        assert_eq!(tree.with_read(|t| t.height()), shape.height);
    }
}
