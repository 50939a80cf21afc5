//! Merge engine
//!
//! Merging collapses the span-closed rectangle under the selection into its
//! top-left cell. The other cells' content blocks are moved (not copied) so
//! node ids, and with them the selection, survive.

use crate::editor::{path_of, set_span, TableEditor};
use crate::grid::{CellEntry, CellRect};
use crate::selection::SelectionRect;
use crate::Result;
use tracing::debug;

#[derive(Debug)]
struct MergePlan {
    rect: CellRect,
    survivor: CellEntry,
    others: Vec<CellEntry>,
}

impl TableEditor {
    fn merge_plan(&self) -> Result<Option<MergePlan>> {
        let Some(SelectionRect { grid, rect }) = self.selection_rect()? else {
            return Ok(None);
        };
        // Merges never cross a section boundary
        let mut sections = (rect.top..=rect.bottom).filter_map(|x| grid.row(x).map(|r| r.section));
        let Some(first) = sections.next() else {
            return Ok(None);
        };
        if sections.any(|s| s != first) {
            return Ok(None);
        }
        let mut cells = grid.cells_in(rect).into_iter().flatten();
        let Some(survivor) = cells.next() else {
            return Ok(None);
        };
        let others: Vec<CellEntry> = cells.collect();
        if others.is_empty() {
            return Ok(None);
        }
        Ok(Some(MergePlan { rect, survivor, others }))
    }

    /// Whether the selection spans two or more cells of one table section
    pub fn can_merge(&self) -> Result<bool> {
        Ok(self.merge_plan()?.is_some())
    }

    /// Merge the selected cells into the top-left one
    pub fn merge(&mut self) -> Result<bool> {
        let Some(plan) = self.merge_plan()? else {
            debug!("merge: selection does not cover mergeable cells");
            return Ok(false);
        };
        let row_key = self.config().row_span_key.clone();
        let col_key = self.config().col_span_key.clone();
        debug!(rect = ?plan.rect, cells = plan.others.len() + 1, "merging cells");

        self.editor_mut().without_normalizing(|editor| {
            for other in &plan.others {
                let children = editor.tree().children(other.id).to_vec();
                for child in children {
                    let from = path_of(editor, child)?;
                    let target = path_of(editor, plan.survivor.id)?;
                    let index = editor.tree().children(plan.survivor.id).len();
                    editor.move_node(&from, &target, index)?;
                }
                let other_path = path_of(editor, other.id)?;
                editor.remove_node(&other_path)?;
            }
            set_span(editor, plan.survivor.id, &row_key, plan.rect.height())?;
            set_span(editor, plan.survivor.id, &col_key, plan.rect.width())?;
            Ok::<_, crate::TableError>(())
        })?;
        Ok(true)
    }
}
