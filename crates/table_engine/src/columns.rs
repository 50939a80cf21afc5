//! Column editing
//!
//! Columns are logical: a column command walks every row of the table (all
//! sections) and either adjusts the `colSpan` of a cell crossing the column
//! or adds/removes one cell in that row.

use crate::config::CellKind;
use crate::editor::{empty_cell_of_kind, path_of, set_span, TableEditor};
use crate::Result;
use doc_model::{NodeId, Path};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct InsertColumnOptions {
    /// Reference cell (defaults to the selection anchor)
    pub at: Option<Path>,
    /// Insert left of the reference cell instead of right
    pub left: bool,
}

impl InsertColumnOptions {
    pub fn left() -> Self {
        Self { at: None, left: true }
    }

    pub fn right() -> Self {
        Self::default()
    }

    pub fn at(mut self, path: Path) -> Self {
        self.at = Some(path);
        self
    }
}

impl TableEditor {
    /// Insert a column left or right of the target cell
    pub fn insert_column(&mut self, options: InsertColumnOptions) -> Result<bool> {
        let Some((cell, table_path)) = self.locate_target(options.at.as_ref()) else {
            debug!("insert_column: target is not inside a table");
            return Ok(false);
        };
        let grid = self.grid(&table_path)?;
        let Some(rect) = grid.rect_of(cell.id) else {
            return Ok(false);
        };
        // New column lands at logical index `boundary`
        let boundary = if options.left { rect.left } else { rect.right + 1 };

        let mut grow: Vec<(NodeId, usize)> = Vec::new();
        let mut inserts: Vec<(Path, CellKind)> = Vec::new();
        for (x, row) in grid.rows().iter().enumerate() {
            match grid.slot(x, boundary) {
                Some(slot) if slot.edges.left > 0 => {
                    if !grow.iter().any(|(id, _)| *id == slot.cell.id) {
                        let cs = self.spans(slot.cell.id)?.1;
                        grow.push((slot.cell.id, cs + 1));
                    }
                }
                _ => {
                    let index = grid.anchors_before(x, boundary);
                    let kind = CellKind::for_section(Some(row.section_kind));
                    inserts.push((row.path.child(index), kind));
                }
            }
        }
        let key = self.config().col_span_key.clone();
        let config = self.config().clone();
        debug!(column = boundary, grown = grow.len(), inserted = inserts.len(), "inserting column");

        self.editor_mut().without_normalizing(|editor| {
            for (id, span) in grow {
                set_span(editor, id, &key, span)?;
            }
            for (path, kind) in inserts {
                editor.insert_node(&path, empty_cell_of_kind(&config, kind))?;
            }
            Ok::<_, crate::TableError>(())
        })?;
        Ok(true)
    }

    /// Remove the logical column of the target cell; removing the only
    /// column removes the table
    pub fn remove_column(&mut self, at: Option<&Path>) -> Result<bool> {
        let Some((cell, table_path)) = self.locate_target(at) else {
            debug!("remove_column: target is not inside a table");
            return Ok(false);
        };
        let grid = self.grid(&table_path)?;
        let Some((_, column)) = grid.position_of(cell.id) else {
            return Ok(false);
        };
        if grid.width() == 1 {
            debug!(%table_path, "removing last column removes the table");
            self.editor_mut().remove_node(&table_path)?;
            return Ok(true);
        }

        let mut shrink: Vec<(NodeId, usize)> = Vec::new();
        let mut remove: Vec<NodeId> = Vec::new();
        for x in 0..grid.height() {
            let Some(slot) = grid.slot(x, column) else {
                continue;
            };
            let id = slot.cell.id;
            if shrink.iter().any(|(s, _)| *s == id) || remove.contains(&id) {
                continue;
            }
            let cs = slot.edges.left + slot.edges.right + 1;
            if cs > 1 {
                shrink.push((id, cs - 1));
            } else {
                remove.push(id);
            }
        }
        let key = self.config().col_span_key.clone();
        debug!(column, shrunk = shrink.len(), removed = remove.len(), "removing column");

        self.editor_mut().without_normalizing(|editor| {
            for (id, span) in shrink {
                set_span(editor, id, &key, span)?;
            }
            for id in remove {
                let path = path_of(editor, id)?;
                editor.remove_node(&path)?;
            }
            Ok::<_, crate::TableError>(())
        })?;
        Ok(true)
    }
}
