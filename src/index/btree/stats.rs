//! Tree operation statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracked by a [`BPlusTree`](super::BPlusTree).
///
/// All fields are atomic so that `find`, which only borrows the tree
/// immutably, can still count lookups.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations because:
/// - We only need atomicity (no partial updates)
/// - We don't need synchronization between different counters
///
/// # Example
/// ```
/// use bptindex::TreeStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = TreeStats::new();
/// stats.lookups.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.lookups.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug)]
pub struct TreeStats {
    /// Records successfully inserted.
    pub inserts: AtomicU64,

    /// Inserts rejected because the key already existed.
    pub duplicate_rejections: AtomicU64,

    /// Calls to `find`.
    pub lookups: AtomicU64,

    /// Lookups that found their key.
    pub lookup_hits: AtomicU64,

    /// Leaf splits.
    pub leaf_splits: AtomicU64,

    /// Internal (and root) branch splits.
    pub internal_splits: AtomicU64,

    /// Times a new root was installed (tree height grew by one).
    pub root_promotions: AtomicU64,
}

impl TreeStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            inserts: AtomicU64::new(0),
            duplicate_rejections: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            lookup_hits: AtomicU64::new(0),
            leaf_splits: AtomicU64::new(0),
            internal_splits: AtomicU64::new(0),
            root_promotions: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            duplicate_rejections: self.duplicate_rejections.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            lookup_hits: self.lookup_hits.load(Ordering::Relaxed),
            leaf_splits: self.leaf_splits.load(Ordering::Relaxed),
            internal_splits: self.internal_splits.load(Ordering::Relaxed),
            root_promotions: self.root_promotions.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inserts.store(0, Ordering::Relaxed);
        self.duplicate_rejections.store(0, Ordering::Relaxed);
        self.lookups.store(0, Ordering::Relaxed);
        self.lookup_hits.store(0, Ordering::Relaxed);
        self.leaf_splits.store(0, Ordering::Relaxed);
        self.internal_splits.store(0, Ordering::Relaxed);
        self.root_promotions.store(0, Ordering::Relaxed);
    }

    /// Emit the current counters as a single `info` event.
    pub fn emit_tracing(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            target: "bptindex::btree::stats",
            inserts = snapshot.inserts,
            duplicate_rejections = snapshot.duplicate_rejections,
            lookups = snapshot.lookups,
            lookup_hits = snapshot.lookup_hits,
            leaf_splits = snapshot.leaf_splits,
            internal_splits = snapshot.internal_splits,
            root_promotions = snapshot.root_promotions,
            "btree stats snapshot"
        );
    }
}

impl Default for TreeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`TreeStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub inserts: u64,
    pub duplicate_rejections: u64,
    pub lookups: u64,
    pub lookup_hits: u64,
    pub leaf_splits: u64,
    pub internal_splits: u64,
    pub root_promotions: u64,
}

impl StatsSnapshot {
    /// Fraction of lookups that found their key (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.lookup_hits as f64 / self.lookups as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ inserts: {}, duplicates: {}, lookups: {}, hit_rate: {:.2}%, splits: {}/{}, root_promotions: {} }}",
            self.inserts,
            self.duplicate_rejections,
            self.lookups,
            self.hit_rate() * 100.0,
            self.leaf_splits,
            self.internal_splits,
            self.root_promotions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = TreeStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert_eq!(stats.snapshot().hit_rate(), 0.0);
    }

    #[test]
    fn test_stats_hit_rate() {
        let stats = TreeStats::new();
        stats.lookups.fetch_add(4, Ordering::Relaxed);
        stats.lookup_hits.fetch_add(3, Ordering::Relaxed);

        assert_eq!(stats.snapshot().hit_rate(), 0.75);
    }

    #[test]
    fn test_stats_reset() {
        let stats = TreeStats::new();
        TreeStats::bump(&stats.inserts);
        TreeStats::bump(&stats.leaf_splits);

        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_stats_display() {
        let stats = TreeStats::new();
        stats.inserts.fetch_add(12, Ordering::Relaxed);
        stats.lookups.fetch_add(10, Ordering::Relaxed);
        stats.lookup_hits.fetch_add(8, Ordering::Relaxed);
        stats.leaf_splits.fetch_add(3, Ordering::Relaxed);

        let display = format!("{}", stats.snapshot());

        assert!(display.contains("inserts: 12"));
        assert!(display.contains("80.00%"));
        assert!(display.contains("splits: 3/0"));
    }
}
