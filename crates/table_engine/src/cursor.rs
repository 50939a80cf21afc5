//! Cursor navigation between cells
//!
//! A collapsed caret moves to the neighbouring cell only when it sits on the
//! matching edge of its cell's content (end for `next`, start for `previous`,
//! first/last text for `above`/`below`). Neighbours are looked up in the
//! logical grid so covered slots of a spanning cell never count as a
//! separate stop. Past the table edge the caret leaves the table when there
//! is text to land on.

use crate::editor::{locate, TableEditor};
use crate::grid::{CellEntry, CellRect, Grid};
use crate::Result;
use doc_model::{Path, Position, Selection};
use tracing::debug;

/// Edge of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

struct Caret {
    position: Position,
    cell: CellEntry,
    table_path: Path,
    grid: Grid,
    rect: CellRect,
}

/// Cursor commands over a borrowed `TableEditor`
pub struct TableCursor<'a> {
    table: &'a mut TableEditor,
}

impl TableEditor {
    pub fn cursor(&mut self) -> TableCursor<'_> {
        TableCursor { table: self }
    }

    /// Cell rectangles of every selection endpoint; `None` if any endpoint
    /// is outside a table
    fn endpoint_rects(&self) -> Result<Option<Vec<(Grid, CellRect)>>> {
        let Some(selection) = self.editor().selection() else {
            return Ok(None);
        };
        let points = if selection.is_collapsed() {
            vec![selection.focus]
        } else {
            vec![selection.anchor, selection.focus]
        };
        let mut out = Vec::with_capacity(points.len());
        for pos in &points {
            let Some((cell, table_path)) = self
                .editor()
                .position_path(pos)
                .and_then(|path| locate(self.tree(), self.config(), &path))
            else {
                return Ok(None);
            };
            let grid = self.grid(&table_path)?;
            let Some(rect) = grid.rect_of(cell.id) else {
                return Ok(None);
            };
            out.push((grid, rect));
        }
        Ok(Some(out))
    }

    fn all_endpoints(&self, pred: impl Fn(&Grid, &CellRect) -> bool) -> Result<bool> {
        Ok(self
            .endpoint_rects()?
            .is_some_and(|rects| rects.iter().all(|(grid, rect)| pred(grid, rect))))
    }

    pub fn is_in_first_cell(&self) -> Result<bool> {
        self.all_endpoints(|_, rect| rect.top == 0 && rect.left == 0)
    }

    /// The cell covering the bottom-right slot
    pub fn is_in_last_cell(&self) -> Result<bool> {
        self.all_endpoints(|grid, rect| {
            grid.height() > 0
                && grid.width() > 0
                && rect.contains(grid.height() - 1, grid.width() - 1)
        })
    }

    pub fn is_in_first_row(&self) -> Result<bool> {
        self.is_on_edge(Edge::Top)
    }

    pub fn is_in_last_row(&self) -> Result<bool> {
        self.is_on_edge(Edge::Bottom)
    }

    pub fn is_on_edge(&self, edge: Edge) -> Result<bool> {
        self.all_endpoints(|grid, rect| match edge {
            Edge::Top => rect.top == 0,
            Edge::Left => rect.left == 0,
            Edge::Bottom => rect.bottom + 1 == grid.height(),
            Edge::Right => rect.right + 1 == grid.width(),
        })
    }

    fn caret(&self) -> Result<Option<Caret>> {
        let Some(selection) = self.editor().selection() else {
            return Ok(None);
        };
        if !selection.is_collapsed() {
            return Ok(None);
        }
        let position = selection.focus;
        let Some((cell, table_path)) = self
            .editor()
            .position_path(&position)
            .and_then(|path| locate(self.tree(), self.config(), &path))
        else {
            return Ok(None);
        };
        let grid = self.grid(&table_path)?;
        let Some(rect) = grid.rect_of(cell.id) else {
            return Ok(None);
        };
        Ok(Some(Caret {
            position,
            cell,
            table_path,
            grid,
            rect,
        }))
    }
}

impl TableCursor<'_> {
    fn move_to(&mut self, position: Option<Position>) -> Result<bool> {
        match position {
            Some(position) => {
                self.table
                    .editor_mut()
                    .select(Selection::collapsed(position))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn leave_forward(&mut self, table_path: &Path) -> Result<bool> {
        let after = self
            .table
            .tree()
            .text_after(table_path)
            .map(Position::start_of);
        debug!(%table_path, found = after.is_some(), "leaving table forwards");
        self.move_to(after)
    }

    fn leave_backward(&mut self, table_path: &Path) -> Result<bool> {
        let tree = self.table.tree();
        let before = tree
            .text_before(table_path)
            .map(|text| Position::new(text, tree.text_len(text)));
        debug!(%table_path, found = before.is_some(), "leaving table backwards");
        self.move_to(before)
    }

    /// Move to the start of the next cell in reading order
    pub fn next(&mut self) -> Result<bool> {
        let Some(caret) = self.table.caret()? else {
            return Ok(false);
        };
        if !self.table.editor().is_end_of(&caret.position, &caret.cell.path) {
            return Ok(false);
        }
        let (x, y) = (caret.rect.top, caret.rect.left);
        let width = caret.grid.width();
        let target = (x..caret.grid.height())
            .flat_map(|r| (0..width).map(move |c| (r, c)))
            .skip_while(|&(r, c)| r == x && c <= y)
            .filter_map(|(r, c)| caret.grid.slot(r, c))
            .find(|slot| slot.is_anchor() && slot.cell.id != caret.cell.id);
        match target {
            Some(slot) => {
                let start = self.table.editor().start_of(&slot.cell.path);
                self.move_to(start)
            }
            None => self.leave_forward(&caret.table_path),
        }
    }

    /// Move to the end of the previous cell in reading order
    pub fn previous(&mut self) -> Result<bool> {
        let Some(caret) = self.table.caret()? else {
            return Ok(false);
        };
        if !self.table.editor().is_start_of(&caret.position, &caret.cell.path) {
            return Ok(false);
        }
        let (x, y) = (caret.rect.top, caret.rect.left);
        let width = caret.grid.width();
        let target = (0..=x)
            .rev()
            .flat_map(|r| (0..width).rev().map(move |c| (r, c)))
            .skip_while(|&(r, c)| r == x && c >= y)
            .filter_map(|(r, c)| caret.grid.slot(r, c))
            .find(|slot| slot.is_anchor() && slot.cell.id != caret.cell.id);
        match target {
            Some(slot) => {
                let end = self.table.editor().end_of(&slot.cell.path);
                self.move_to(end)
            }
            None => self.leave_backward(&caret.table_path),
        }
    }

    /// Move to the start of the cell below
    pub fn below(&mut self) -> Result<bool> {
        let Some(caret) = self.table.caret()? else {
            return Ok(false);
        };
        if self.table.tree().last_text(&caret.cell.path) != Some(caret.position.node_id) {
            return Ok(false);
        }
        let column = caret.rect.left;
        let target = (caret.rect.bottom + 1..caret.grid.height())
            .filter_map(|r| caret.grid.slot(r, column))
            .find(|slot| slot.cell.id != caret.cell.id);
        match target {
            Some(slot) => {
                let start = self.table.editor().start_of(&slot.cell.path);
                self.move_to(start)
            }
            None => self.leave_forward(&caret.table_path),
        }
    }

    /// Move to the end of the cell above
    pub fn above(&mut self) -> Result<bool> {
        let Some(caret) = self.table.caret()? else {
            return Ok(false);
        };
        if self.table.tree().first_text(&caret.cell.path) != Some(caret.position.node_id) {
            return Ok(false);
        }
        let column = caret.rect.left;
        let target = (0..caret.rect.top)
            .rev()
            .filter_map(|r| caret.grid.slot(r, column))
            .find(|slot| slot.cell.id != caret.cell.id);
        match target {
            Some(slot) => {
                let end = self.table.editor().end_of(&slot.cell.path);
                self.move_to(end)
            }
            None => self.leave_backward(&caret.table_path),
        }
    }

    pub fn is_in_first_cell(&self) -> Result<bool> {
        self.table.is_in_first_cell()
    }

    pub fn is_in_last_cell(&self) -> Result<bool> {
        self.table.is_in_last_cell()
    }

    pub fn is_in_first_row(&self) -> Result<bool> {
        self.table.is_in_first_row()
    }

    pub fn is_in_last_row(&self) -> Result<bool> {
        self.table.is_in_last_row()
    }

    pub fn is_on_edge(&self, edge: Edge) -> Result<bool> {
        self.table.is_on_edge(edge)
    }
}
