//! Common types and utilities shared across bptindex.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration (node capacity and derived split points)
//! - Error types
//! - Identifiers (NodeId)

pub mod config;
pub mod error;
mod node_id;

pub use config::TreeConfig;
pub use error::{Error, Result};
pub use node_id::NodeId;
