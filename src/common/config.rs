//! Configuration for bptindex.

use crate::common::{Error, Result};

/// Default maximum number of entries a node may hold.
///
/// Inserting the sixth entry into any node splits it immediately.
pub const DEFAULT_MAX_ENTRIES: usize = 5;

/// Smallest usable capacity.
///
/// With `max_entries = 3` an overflowing internal node (4 separators)
/// promotes one and still leaves at least one separator on each side.
/// Anything smaller produces separator-less internal nodes.
pub const MIN_MAX_ENTRIES: usize = 3;

/// Tree construction parameters.
///
/// Split points are derived from `max_entries`:
///
/// ```text
/// overflow = max_entries + 1 entries
///
/// leaf:      [0, leaf_split)            | [leaf_split, overflow)
///                                         ^ first key is the separator
///
/// internal:  [0, p) | p (promoted) | (p, overflow)
///            children [0, p + 1)     children [p + 1, overflow + 1)
/// ```
///
/// # Example
/// ```
/// use bptindex::TreeConfig;
///
/// let config = TreeConfig::default();
/// assert_eq!(config.max_entries(), 5);
/// assert_eq!(config.leaf_split(), 3);
/// assert_eq!(config.promote_index(), 2);
///
/// assert!(TreeConfig::new(2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    max_entries: usize,
}

impl TreeConfig {
    /// Create a config with the given node capacity.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if `max_entries < MIN_MAX_ENTRIES`.
    pub fn new(max_entries: usize) -> Result<Self> {
        if max_entries < MIN_MAX_ENTRIES {
            return Err(Error::InvalidConfig {
                max_entries,
                min: MIN_MAX_ENTRIES,
            });
        }
        Ok(Self { max_entries })
    }

    /// Maximum entries per node before a split.
    #[inline]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Number of records the left half keeps when a leaf splits.
    #[inline]
    pub fn leaf_split(&self) -> usize {
        (self.max_entries + 1) / 2
    }

    /// Index of the separator promoted out of an overflowing internal node.
    #[inline]
    pub fn promote_index(&self) -> usize {
        (self.max_entries + 1) / 2 - 1
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}
