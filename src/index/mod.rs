//! Index structures.
//!
//! - [`btree`] - The single-threaded B+Tree core
//! - [`SharedTree`] - Reader/writer-locked handle for multi-threaded callers

pub mod btree;
mod shared;

pub use shared::SharedTree;
