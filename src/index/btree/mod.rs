//! B+Tree index implementation.
//!
//! # Components
//! - [`BPlusTree`] - The tree facade (find, insert, ancestor resolution)
//! - [`Node`] / [`NodeRole`] / [`Record`] - Node data model
//! - [`TreeStats`] - Operation counters
//! - [`Layout`] / [`TreeShape`] - Structural snapshots and invariant audit

mod arena;
mod inspect;
mod node;
mod stats;
mod tree;

pub use inspect::{Layout, TreeShape};
pub use node::{Node, NodeBody, NodeRole, Record};
pub use stats::{StatsSnapshot, TreeStats};
pub use tree::BPlusTree;
