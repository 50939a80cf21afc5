//! Split engine
//!
//! Splitting replaces a spanning cell by unit cells over the same
//! rectangle. The original cell keeps its content and takes the top-left
//! slot; every other slot gets a fresh empty cell of the same tag.

use crate::editor::{empty_cell, path_of, set_span, TableEditor};
use crate::grid::{CellEntry, Grid};
use crate::{Result, TableConfig};
use doc_model::{Editor, Path};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Cell to split (defaults to the one holding the selection anchor)
    pub at: Option<Path>,
    /// Split every spanning cell of the table instead
    pub all: bool,
}

impl SplitOptions {
    pub fn cell() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self { at: None, all: true }
    }

    pub fn at(mut self, path: Path) -> Self {
        self.at = Some(path);
        self
    }
}

fn is_spanning(grid: &Grid, cell: &CellEntry) -> bool {
    grid.rect_of(cell.id)
        .is_some_and(|rect| rect.height() > 1 || rect.width() > 1)
}

/// Split one cell against a grid computed before any change
fn split_cell(
    editor: &mut Editor,
    config: &TableConfig,
    grid: &Grid,
    cell: &CellEntry,
) -> Result<()> {
    let Some(rect) = grid.rect_of(cell.id) else {
        return Ok(());
    };
    let tag = editor.tree().tag(cell.id).unwrap_or(config.blocks.data_cell.as_str()).to_string();
    debug!(cell = %cell.id, ?rect, "splitting cell");

    set_span(editor, cell.id, &config.row_span_key, 1)?;
    set_span(editor, cell.id, &config.col_span_key, 1)?;

    for x in rect.top..=rect.bottom {
        let Some(row) = grid.row(x) else {
            continue;
        };
        // The original cell already fills the first slot of its own row
        let (count, index) = if x == rect.top {
            (rect.width() - 1, grid.anchors_before(x, rect.left) + 1)
        } else {
            (rect.width(), grid.anchors_before(x, rect.left))
        };
        for offset in 0..count {
            editor.insert_node(&row.path.child(index + offset), empty_cell(config, &tag))?;
        }
    }
    Ok(())
}

impl TableEditor {
    /// Split the target cell, or with `all` every spanning cell of its table
    pub fn split(&mut self, options: SplitOptions) -> Result<bool> {
        let Some((cell, table_path)) = self.locate_target(options.at.as_ref()) else {
            debug!("split: target is not inside a table");
            return Ok(false);
        };
        let config = self.config().clone();
        let table_id = self.grid(&table_path)?.table();

        if !options.all {
            let grid = self.grid(&table_path)?;
            if !is_spanning(&grid, &cell) {
                return Ok(false);
            }
            self.editor_mut()
                .without_normalizing(|editor| split_cell(editor, &config, &grid, &cell))?;
            return Ok(true);
        }

        self.editor_mut().without_normalizing(|editor| {
            let mut split_any = false;
            loop {
                let table_path = path_of(editor, table_id)?;
                let grid = crate::grid::filled_matrix(editor.tree(), &config, &table_path, None)?;
                let spanning = grid.distinct_cells().into_iter().find(|c| is_spanning(&grid, c));
                let Some(next) = spanning else {
                    return Ok::<_, crate::TableError>(split_any);
                };
                split_cell(editor, &config, &grid, &next)?;
                split_any = true;
            }
        })
    }
}
