//! bptindex - An in-memory B+Tree index that grows upward.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            bptindex                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Collaborators (fixture/, index::SharedTree)       │   │
//! │  │     CSV fixture loader   |   RwLock-guarded handle       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              B+Tree core (index/btree/)                  │   │
//! │  │   BPlusTree: find → descend → leaf                       │   │
//! │  │              insert → leaf split → branch splits → root  │   │
//! │  │   TreeStats + Layout / check_invariants                  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │             Node arena (index/btree/arena)               │   │
//! │  │      Vec<Node> addressed by NodeId, roles + bodies       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, config)
//! - [`index`] - The B+Tree and its thread-safe handle
//! - [`fixture`] - CSV fixture loading
//!
//! # Quick Start
//! ```
//! use bptindex::BPlusTree;
//!
//! let mut tree = BPlusTree::new();
//! for key in ["b", "a", "c", "d", "e", "f"] {
//!     tree.insert(key, key.to_uppercase()).unwrap();
//! }
//!
//! // Six keys overflow the first node: the tree is now two levels deep.
//! assert_eq!(tree.height(), 2);
//! assert_eq!(tree.find("d").unwrap().unwrap().value(), "D");
//! assert!(tree.find("z").unwrap().is_none());
//! ```

pub mod common;
pub mod fixture;
pub mod index;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_MAX_ENTRIES, MIN_MAX_ENTRIES};
pub use common::{Error, NodeId, Result, TreeConfig};

pub use index::btree::{
    BPlusTree, Layout, Node, NodeBody, NodeRole, Record, StatsSnapshot, TreeShape, TreeStats,
};
pub use index::SharedTree;
