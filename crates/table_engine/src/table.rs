//! Whole-table commands

use crate::config::CellKind;
use crate::editor::{empty_cell_of_kind, table_above, TableEditor};
use crate::Result;
use doc_model::{Fragment, Path, Selection};
use tracing::debug;

/// Options for `TableEditor::insert_table`
#[derive(Debug, Clone)]
pub struct InsertTableOptions {
    pub rows: usize,
    pub cols: usize,
    /// Where the table node goes; defaults to after the top-level block
    /// holding the selection, or the end of the document
    pub at: Option<Path>,
}

impl InsertTableOptions {
    /// Counts below 1 are raised to 1
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
            at: None,
        }
    }

    pub fn at(mut self, path: Path) -> Self {
        self.at = Some(path);
        self
    }
}

impl Default for InsertTableOptions {
    fn default() -> Self {
        Self::new(2, 2)
    }
}

impl TableEditor {
    fn new_table(&self, rows: usize, cols: usize) -> Fragment {
        let config = self.config();
        let row = || {
            Fragment::element(config.blocks.row.as_str())
                .with_children((0..cols).map(|_| empty_cell_of_kind(config, CellKind::Data)))
        };
        Fragment::element(config.blocks.table.as_str()).with_child(
            Fragment::element(config.blocks.body.as_str()).with_children((0..rows).map(|_| row())),
        )
    }

    /// Insert a body-only table of empty cells and put the cursor in its
    /// last cell. Does nothing when the target is already inside a table.
    pub fn insert_table(&mut self, options: InsertTableOptions) -> Result<bool> {
        let rows = options.rows.max(1);
        let cols = options.cols.max(1);

        let target = match options.at {
            Some(at) => {
                let inside = at.parent().is_some_and(|parent| {
                    table_above(self.tree(), self.config(), &parent).is_some()
                });
                if inside {
                    debug!(%at, "insert_table: target is inside a table");
                    return Ok(false);
                }
                at
            }
            None => {
                if self.is_in_table(None) {
                    debug!("insert_table: selection is inside a table");
                    return Ok(false);
                }
                let after_selection = self
                    .target_path(None)
                    .filter(|path| !path.is_root())
                    .and_then(|path| path.prefix(1).next_sibling());
                match after_selection {
                    Some(path) => path,
                    None => {
                        let end = self.tree().children(self.tree().root_id()).len();
                        Path::root().child(end)
                    }
                }
            }
        };

        debug!(rows, cols, at = %target, "inserting table");
        let fragment = self.new_table(rows, cols);
        self.editor_mut().insert_node(&target, fragment)?;

        let last_cell = target.child(0).child(rows - 1).child(cols - 1);
        if let Some(start) = self.editor().start_of(&last_cell) {
            self.editor_mut().select(Selection::collapsed(start))?;
        }
        Ok(true)
    }

    /// Remove the table around `at` (or the selection anchor)
    pub fn remove_table(&mut self, at: Option<&Path>) -> Result<bool> {
        let Some(path) = self.target_path(at) else {
            return Ok(false);
        };
        let Some((_, table_path)) = table_above(self.tree(), self.config(), &path) else {
            debug!("remove_table: target is not inside a table");
            return Ok(false);
        };
        debug!(%table_path, "removing table");
        self.editor_mut().remove_node(&table_path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::InsertTableOptions;
    use crate::fixtures::*;
    use crate::{TableConfig, TableEditor};
    use doc_model::{Editor, Position, Selection};

    fn editor(children: Vec<doc_model::Fragment>) -> TableEditor {
        TableEditor::new(Editor::new(doc(children)), TableConfig::default()).unwrap()
    }

    #[test]
    fn test_insert_table_after_selected_block() {
        let mut t = editor(vec![para("one"), para("two")]);
        let text = t.tree().first_text(&path([0])).unwrap();
        t.editor_mut().select(Selection::collapsed(Position::start_of(text))).unwrap();
        assert!(t.insert_table(InsertTableOptions::new(2, 3)).unwrap());

        let table = t.tree().node_at(&path([1])).unwrap();
        assert_eq!(t.tree().tag(table), Some("table"));
        let grid = t.table_grid(Some(&path([1]))).unwrap().unwrap();
        assert_eq!((grid.height(), grid.width()), (2, 3));

        let selection = t.editor().selection().unwrap();
        assert!(selection.is_collapsed());
        let focus = t.editor().position_path(&selection.focus).unwrap();
        assert!(path([1, 0, 1, 2]).is_ancestor_of(&focus));
    }

    #[test]
    fn test_insert_table_clamps_counts_and_appends() {
        let mut t = editor(vec![para("one")]);
        assert!(t.insert_table(InsertTableOptions::new(0, 0)).unwrap());
        let grid = t.table_grid(Some(&path([1]))).unwrap().unwrap();
        assert_eq!((grid.height(), grid.width()), (1, 1));
    }

    #[test]
    fn test_insert_table_at_explicit_path() {
        let mut t = editor(vec![para("one"), para("two")]);
        assert!(t.insert_table(InsertTableOptions::new(1, 2).at(path([1]))).unwrap());

        assert_eq!(t.tree().text_content(&path([0])), "one");
        assert_eq!(t.tree().text_content(&path([2])), "two");
        let grid = t.table_grid(Some(&path([1]))).unwrap().unwrap();
        assert_eq!((grid.height(), grid.width()), (1, 2));

        let focus = t.editor().selection().unwrap().focus;
        let focus = t.editor().position_path(&focus).unwrap();
        assert!(path([1, 0, 0, 1]).is_ancestor_of(&focus));
    }

    #[test]
    fn test_insert_table_refused_inside_table() {
        let mut t = editor(vec![body_table(1, 1)]);
        let text = t.tree().first_text(&path([0])).unwrap();
        t.editor_mut().select(Selection::collapsed(Position::start_of(text))).unwrap();
        assert!(!t.insert_table(InsertTableOptions::default()).unwrap());
        assert!(!t.insert_table(InsertTableOptions::default().at(path([0, 0, 0, 0, 1]))).unwrap());
    }

    #[test]
    fn test_remove_table() {
        let mut t = editor(vec![para("p"), body_table(2, 2)]);
        assert!(!t.remove_table(Some(&path([0, 0]))).unwrap());
        assert!(t.remove_table(Some(&path([1, 0, 0, 0]))).unwrap());
        assert_eq!(t.tree().children_at(&path([])).unwrap().len(), 1);
    }
}
