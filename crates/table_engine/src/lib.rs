//! Table Engine - span-aware tables over a document tree
//!
//! This crate gives a `doc_model::Editor` table semantics:
//! - Grid building: the logical occupancy grid behind rowSpan/colSpan
//! - Normalization: rules that keep every table well-formed after any write
//! - Merge and split of rectangular cell regions
//! - Row and column insertion/removal that keeps spans consistent
//! - Cursor movement between cells and selection handling around tables
//!
//! The tags a document uses for each table role come from `TableConfig`.

mod columns;
mod config;
mod cursor;
mod editor;
mod error;
pub mod grid;
mod merge;
mod normalize;
mod plugin;
mod rows;
mod selection;
mod split;
mod table;

#[cfg(test)]
mod fixtures;

pub use columns::InsertColumnOptions;
pub use config::*;
pub use cursor::{Edge, TableCursor};
pub use editor::TableEditor;
pub use error::*;
pub use grid::{filled_matrix, matrix, CellEntry, CellRect, EdgeDistances, Grid, GridRow, GridSlot};
pub use plugin::TableHandler;
pub use rows::InsertRowOptions;
pub use split::SplitOptions;
pub use table::InsertTableOptions;
