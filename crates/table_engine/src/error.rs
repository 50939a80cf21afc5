//! Error types for table operations
//!
//! Unmet preconditions are not errors: commands report them as `Ok(false)`.
//! An `Err` means the stored tree violates an invariant the engine relies on.

use doc_model::{NodeId, Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Invalid {key} on cell {cell}: {value}")]
    InvalidSpan {
        cell: NodeId,
        key: String,
        value: serde_json::Value,
    },

    #[error("Expected a table node at {0}")]
    NotATable(Path),

    #[error("Invalid table configuration: {0}")]
    Config(String),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),
}

pub type Result<T> = std::result::Result<T, TableError>;
