//! Selection resolver
//!
//! Two concerns: keeping a range from ending halfway into a table it does
//! not fully enclose, and turning a range between two cells into the set of
//! cells it covers.

use crate::config::TableConfig;
use crate::editor::{locate, TableEditor};
use crate::grid::{CellEntry, CellRect, Grid};
use crate::Result;
use doc_model::{DocumentTree, Editor, NodeId, Path, Position, Selection};
use tracing::trace;

/// Table paths around `path`, outermost first
fn tables_around(tree: &DocumentTree, config: &TableConfig, path: &Path) -> Vec<Path> {
    let mut tables: Vec<Path> = path
        .ancestors()
        .filter(|p| tree.element_at(p).is_some_and(|el| config.is_table(&el.tag)))
        .collect();
    tables.reverse();
    tables
}

/// Position just outside `table` on the side facing `other`
fn pull_out(editor: &Editor, table: &Path, other: &Path) -> Option<Position> {
    let tree = editor.tree();
    if other < table {
        let text = tree.text_before(table)?;
        Some(Position::new(text, tree.text_len(text)))
    } else {
        tree.text_after(table).map(Position::start_of)
    }
}

/// Pull each endpoint out of any table that does not also contain the other
/// endpoint, landing on the side facing the other endpoint. Repeats until no
/// endpoint sits in such a table.
pub(crate) fn adjust_boundaries(
    editor: &Editor,
    config: &TableConfig,
    selection: Selection,
) -> Selection {
    let mut current = selection;
    let tree = editor.tree();
    loop {
        if current.is_collapsed() {
            return current;
        }
        let (Some(anchor_path), Some(focus_path)) = (
            editor.position_path(&current.anchor),
            editor.position_path(&current.focus),
        ) else {
            return current;
        };
        let escape = |inside: &Path, other: &Path| {
            tables_around(tree, config, inside)
                .into_iter()
                .find(|table| !table.is_ancestor_of(other))
        };
        let next = if let Some(table) = escape(&focus_path, &anchor_path) {
            pull_out(editor, &table, &anchor_path)
                .map(|focus| Selection::new(current.anchor, focus))
        } else if let Some(table) = escape(&anchor_path, &focus_path) {
            pull_out(editor, &table, &focus_path)
                .map(|anchor| Selection::new(anchor, current.focus))
        } else {
            return current;
        };
        match next {
            Some(next) if next != current => {
                trace!(?current, ?next, "moving selection endpoint out of table");
                current = next;
            }
            _ => return current,
        }
    }
}

/// Rectangle spanned by a range whose endpoints sit in two cells of one table
#[derive(Debug, Clone)]
pub(crate) struct SelectionRect {
    pub grid: Grid,
    pub rect: CellRect,
}

impl TableEditor {
    pub(crate) fn selection_rect(&self) -> Result<Option<SelectionRect>> {
        let Some(selection) = self.editor().selection() else {
            return Ok(None);
        };
        if selection.is_collapsed() {
            return Ok(None);
        }
        let endpoint = |pos: &Position| {
            let path = self.editor().position_path(pos)?;
            locate(self.tree(), self.config(), &path)
        };
        let (Some((anchor, anchor_table)), Some((focus, focus_table))) =
            (endpoint(&selection.anchor), endpoint(&selection.focus))
        else {
            return Ok(None);
        };
        if anchor.id == focus.id || anchor_table != focus_table {
            return Ok(None);
        }
        let grid = self.grid(&anchor_table)?;
        let (Some(a), Some(f)) = (grid.rect_of(anchor.id), grid.rect_of(focus.id)) else {
            return Ok(None);
        };
        let rect = grid.expand_to_spans(a.union(&f));
        Ok(Some(SelectionRect { grid, rect }))
    }

    /// Cells covered by the selection, row-major, when it runs between two
    /// cells of the same table
    pub fn selected_cells(&self) -> Result<Option<Vec<Vec<CellEntry>>>> {
        Ok(self
            .selection_rect()?
            .map(|SelectionRect { grid, rect }| grid.cells_in(rect)))
    }

    /// Whether `cell` is one of the selected cells
    pub fn is_selected(&self, cell: NodeId) -> Result<bool> {
        Ok(self
            .selected_cells()?
            .is_some_and(|rows| rows.iter().flatten().any(|entry| entry.id == cell)))
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use crate::{TableConfig, TableEditor};
    use doc_model::{Editor, Position, Selection};

    fn text_at(t: &TableEditor, indices: &[usize]) -> doc_model::NodeId {
        t.tree().node_at(&indices.into()).unwrap()
    }

    fn editor(children: Vec<doc_model::Fragment>) -> TableEditor {
        TableEditor::new(Editor::new(doc(children)), TableConfig::default()).unwrap()
    }

    #[test]
    fn test_focus_pulled_out_of_table() {
        let mut t = editor(vec![para("before"), body_table(2, 2), para("after")]);
        let anchor = Position::new(text_at(&t, &[0, 0]), 2);
        let inside = Position::start_of(text_at(&t, &[1, 0, 1, 1, 0, 0]));
        t.editor_mut().select(Selection::new(anchor, inside)).unwrap();
        let selection = t.editor().selection().unwrap();
        assert_eq!(selection.anchor, anchor);
        // focus lands at the end of the text before the table
        assert_eq!(selection.focus, Position::new(text_at(&t, &[0, 0]), 6));
    }

    #[test]
    fn test_anchor_pulled_out_backwards() {
        let mut t = editor(vec![para("before"), body_table(2, 2), para("after")]);
        let inside = Position::start_of(text_at(&t, &[1, 0, 0, 0, 0, 0]));
        let focus = Position::start_of(text_at(&t, &[0, 0]));
        t.editor_mut().select(Selection::new(inside, focus)).unwrap();
        let selection = t.editor().selection().unwrap();
        assert_eq!(selection.focus, focus);
        assert_eq!(selection.anchor, Position::new(text_at(&t, &[0, 0]), 6));
    }

    #[test]
    fn test_range_within_table_untouched() {
        let mut t = editor(vec![body_table(2, 2)]);
        let a = Position::start_of(text_at(&t, &[0, 0, 0, 0, 0, 0]));
        let b = Position::start_of(text_at(&t, &[0, 0, 1, 1, 0, 0]));
        t.editor_mut().select(Selection::new(a, b)).unwrap();
        assert_eq!(t.editor().selection(), Some(Selection::new(a, b)));
    }

    #[test]
    fn test_selected_cells_expand_over_spans() {
        // a b(rs=2) c
        // d         e
        let mut t = editor(vec![table(vec![body(vec![
            row(vec![cell("a"), span_cell("b", 2, 1), cell("c")]),
            row(vec![cell("d"), cell("e")]),
        ])])]);
        let a = Position::start_of(text_at(&t, &[0, 0, 0, 0, 0, 0]));
        let b = Position::start_of(text_at(&t, &[0, 0, 0, 1, 0, 0]));
        t.editor_mut().select(Selection::new(a, b)).unwrap();
        let cells = t.selected_cells().unwrap().unwrap();
        let texts: Vec<Vec<String>> = cells
            .iter()
            .map(|row| row.iter().map(|c| t.tree().text_content(&c.path)).collect())
            .collect();
        assert_eq!(texts, vec![vec!["a", "b"], vec!["d"]]);
        let e = t.tree().node_at(&path([0, 0, 1, 1])).unwrap();
        assert!(!t.is_selected(e).unwrap());
        let d = t.tree().node_at(&path([0, 0, 1, 0])).unwrap();
        assert!(t.is_selected(d).unwrap());
    }

    #[test]
    fn test_no_cells_for_collapsed_or_single_cell() {
        let mut t = editor(vec![body_table(2, 2)]);
        let text = text_at(&t, &[0, 0, 0, 0, 0, 0]);
        t.editor_mut()
            .select(Selection::new(Position::new(text, 0), Position::new(text, 3)))
            .unwrap();
        assert_eq!(t.selected_cells().unwrap(), None);
        t.editor_mut().deselect().unwrap();
        assert_eq!(t.selected_cells().unwrap(), None);
    }
}
