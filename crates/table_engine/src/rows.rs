//! Row editing
//!
//! Rows are added and removed one logical row at a time. Cells that span
//! across the affected boundary have their `rowSpan` adjusted instead of
//! being duplicated or cut.

use crate::config::CellKind;
use crate::editor::{empty_cell_of_kind, path_of, set_span, TableEditor};
use crate::grid::CellEntry;
use crate::Result;
use doc_model::{Fragment, Path};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct InsertRowOptions {
    /// Cell whose row is the reference (defaults to the selection anchor)
    pub at: Option<Path>,
    /// Insert above the reference row instead of below
    pub above: bool,
}

impl InsertRowOptions {
    pub fn above() -> Self {
        Self { at: None, above: true }
    }

    pub fn below() -> Self {
        Self::default()
    }

    pub fn at(mut self, path: Path) -> Self {
        self.at = Some(path);
        self
    }
}

impl TableEditor {
    /// Insert a row above or below the row holding the target cell
    pub fn insert_row(&mut self, options: InsertRowOptions) -> Result<bool> {
        let Some((cell, table_path)) = self.locate_target(options.at.as_ref()) else {
            debug!("insert_row: target is not inside a table");
            return Ok(false);
        };
        let grid = self.grid(&table_path)?;
        let Some((x, _)) = grid.position_of(cell.id) else {
            return Ok(false);
        };
        let Some(row) = grid.row(x).cloned() else {
            return Ok(false);
        };

        // Cells crossing the new row's boundary grow; every other column
        // gets a fresh cell
        let mut grow: Vec<CellEntry> = Vec::new();
        let mut fresh = 0;
        for y in 0..grid.width() {
            match grid.slot(x, y) {
                Some(slot)
                    if (options.above && slot.edges.top > 0)
                        || (!options.above && slot.edges.bottom > 0) =>
                {
                    if !grow.iter().any(|c| c.id == slot.cell.id) {
                        grow.push(slot.cell.clone());
                    }
                }
                _ => fresh += 1,
            }
        }
        let mut spans = Vec::with_capacity(grow.len());
        for cell in &grow {
            spans.push((cell.id, self.spans(cell.id)?.0 + 1));
        }

        let kind = CellKind::for_section(Some(row.section_kind));
        let new_row = Fragment::element(self.config().blocks.row.as_str())
            .with_children((0..fresh).map(|_| empty_cell_of_kind(self.config(), kind)));
        let target = if options.above {
            row.path.clone()
        } else {
            row.path.next_sibling().unwrap_or_else(|| row.path.clone())
        };
        let key = self.config().row_span_key.clone();
        debug!(row = x, above = options.above, grown = grow.len(), fresh, "inserting row");

        self.editor_mut().without_normalizing(|editor| {
            for (id, span) in spans {
                set_span(editor, id, &key, span)?;
            }
            editor.insert_node(&target, new_row)?;
            Ok::<_, crate::TableError>(())
        })?;
        Ok(true)
    }

    /// Remove the row holding the target cell.
    ///
    /// Removing the last row of a section removes the section; removing the
    /// last row of the table removes the table.
    pub fn remove_row(&mut self, at: Option<&Path>) -> Result<bool> {
        let Some((cell, table_path)) = self.locate_target(at) else {
            debug!("remove_row: target is not inside a table");
            return Ok(false);
        };
        let grid = self.grid(&table_path)?;
        let Some((x, _)) = grid.position_of(cell.id) else {
            return Ok(false);
        };
        let Some(row) = grid.row(x).cloned() else {
            return Ok(false);
        };

        if grid.height() == 1 {
            debug!(%table_path, "removing last row removes the table");
            self.editor_mut().remove_node(&table_path)?;
            return Ok(true);
        }
        let section_rows = grid.rows().iter().filter(|r| r.section == row.section).count();
        if section_rows == 1 {
            let section_path = row.path.parent().unwrap_or_else(|| row.path.clone());
            debug!(%section_path, "removing last row removes its section");
            self.editor_mut().remove_node(&section_path)?;
            return Ok(true);
        }

        // Spans opened above shrink; spans opened here continue in the next row
        let mut shrink: Vec<(CellEntry, usize)> = Vec::new();
        let mut carry: Vec<(CellEntry, usize, usize)> = Vec::new();
        for y in 0..grid.width() {
            let Some(slot) = grid.slot(x, y) else {
                continue;
            };
            if slot.edges.left > 0 {
                continue;
            }
            let rs = self.spans(slot.cell.id)?.0.min(slot.edges.top + slot.edges.bottom + 1);
            if slot.edges.top > 0 {
                shrink.push((slot.cell.clone(), rs - 1));
            } else if slot.edges.bottom > 0 {
                carry.push((slot.cell.clone(), y, rs - 1));
            }
        }
        let next_row = grid.row(x + 1).map(|r| r.id);
        let insert_at: Vec<usize> = carry
            .iter()
            .enumerate()
            .map(|(moved, (_, y, _))| grid.anchors_before(x + 1, *y) + moved)
            .collect();
        let key = self.config().row_span_key.clone();
        debug!(row = x, shrunk = shrink.len(), carried = carry.len(), "removing row");

        self.editor_mut().without_normalizing(|editor| {
            for (cell, span) in &shrink {
                set_span(editor, cell.id, &key, *span)?;
            }
            if let Some(next_row) = next_row {
                for ((cell, _, span), index) in carry.iter().zip(insert_at) {
                    let from = path_of(editor, cell.id)?;
                    let to = path_of(editor, next_row)?;
                    editor.move_node(&from, &to, index)?;
                    set_span(editor, cell.id, &key, *span)?;
                }
            }
            let row_path = path_of(editor, row.id)?;
            editor.remove_node(&row_path)?;
            Ok::<_, crate::TableError>(())
        })?;
        Ok(true)
    }
}
