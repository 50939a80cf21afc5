//! Document Model - tree store for host documents
//!
//! This crate provides the tree the table engine works on: an arena of
//! element and text nodes with stable ids, integer path addressing, a
//! selection model, write primitives, and the normalization loop that runs
//! the handler pipeline after every write.

mod editor;
mod error;
mod fragment;
mod node;
mod node_id;
mod path;
mod pipeline;
mod selection;
mod tree;

pub use editor::*;
pub use error::*;
pub use fragment::*;
pub use node::*;
pub use node_id::*;
pub use path::*;
pub use pipeline::*;
pub use selection::*;
pub use tree::*;
