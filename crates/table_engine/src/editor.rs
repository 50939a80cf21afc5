//! The table-aware editor and shared lookups

use crate::config::{CellKind, TableConfig};
use crate::grid::{cell_spans, filled_matrix, CellEntry, Grid};
use crate::plugin::TableHandler;
use crate::Result;
use doc_model::{DocumentTree, Editor, Fragment, NodeId, Path, Props};
use serde_json::Value;
use std::rc::Rc;

/// Nearest table at or above `path`
pub(crate) fn table_above(
    tree: &DocumentTree,
    config: &TableConfig,
    path: &Path,
) -> Option<(NodeId, Path)> {
    tree.above(path, |el| config.is_table(&el.tag))
}

/// Nearest cell at or above `path`
pub(crate) fn cell_above(
    tree: &DocumentTree,
    config: &TableConfig,
    path: &Path,
) -> Option<CellEntry> {
    tree.above(path, |el| config.is_cell(&el.tag))
        .map(|(id, path)| CellEntry { id, path })
}

/// The cell around `path` and the path of the table owning it
pub(crate) fn locate(
    tree: &DocumentTree,
    config: &TableConfig,
    path: &Path,
) -> Option<(CellEntry, Path)> {
    let cell = cell_above(tree, config, path)?;
    let (_, table_path) = table_above(tree, config, &cell.path.parent()?)?;
    Some((cell, table_path))
}

/// An empty content block
pub(crate) fn empty_content(config: &TableConfig) -> Fragment {
    Fragment::element(config.blocks.content.as_str()).with_child(Fragment::text(""))
}

/// A unit cell holding one empty content block
pub(crate) fn empty_cell(config: &TableConfig, tag: &str) -> Fragment {
    Fragment::element(tag).with_child(empty_content(config))
}

pub(crate) fn empty_cell_of_kind(config: &TableConfig, kind: CellKind) -> Fragment {
    empty_cell(config, config.cell_tag(kind))
}

/// Write a span attribute; a span of 1 is stored as "absent"
pub(crate) fn set_span(editor: &mut Editor, cell: NodeId, key: &str, span: usize) -> Result<()> {
    let path = editor
        .tree()
        .path_of(cell)
        .ok_or(doc_model::DocModelError::NodeNotFound(cell))?;
    if span <= 1 {
        if editor.tree().prop(cell, key).is_some() {
            editor.unset_props(&path, &[key])?;
        }
        return Ok(());
    }
    let mut props = Props::new();
    props.insert(key.to_string(), Value::from(span as u64));
    editor.set_props(&path, props)?;
    Ok(())
}

/// Current path of a node that must exist
pub(crate) fn path_of(editor: &Editor, id: NodeId) -> Result<Path> {
    Ok(editor
        .tree()
        .path_of(id)
        .ok_or(doc_model::DocModelError::NodeNotFound(id))?)
}

/// Editor with table semantics
///
/// Owns the document editor and the table configuration. Construction
/// registers the table handler in the editor's pipeline and normalizes the
/// whole tree once.
#[derive(Debug)]
pub struct TableEditor {
    editor: Editor,
    config: TableConfig,
}

impl TableEditor {
    pub fn new(mut editor: Editor, config: TableConfig) -> Result<Self> {
        config.validate()?;
        editor.register(Rc::new(TableHandler::new(config.clone())));
        editor.normalize()?;
        Ok(Self { editor, config })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn into_editor(self) -> Editor {
        self.editor
    }

    pub fn tree(&self) -> &DocumentTree {
        self.editor.tree()
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// `at`, or the path of the selection anchor
    pub(crate) fn target_path(&self, at: Option<&Path>) -> Option<Path> {
        match at {
            Some(path) => Some(path.clone()),
            None => {
                let selection = self.editor.selection()?;
                self.editor.position_path(&selection.anchor)
            }
        }
    }

    /// Cell and table around `at` (or the selection anchor)
    pub(crate) fn locate_target(&self, at: Option<&Path>) -> Option<(CellEntry, Path)> {
        let path = self.target_path(at)?;
        locate(self.tree(), &self.config, &path)
    }

    pub(crate) fn grid(&self, table_path: &Path) -> Result<Grid> {
        filled_matrix(self.tree(), &self.config, table_path, None)
    }

    pub(crate) fn spans(&self, cell: NodeId) -> Result<(usize, usize)> {
        cell_spans(self.tree(), &self.config, cell)
    }

    /// Whether `at` (or the selection anchor) is inside a table
    pub fn is_in_table(&self, at: Option<&Path>) -> bool {
        self.target_path(at)
            .is_some_and(|path| table_above(self.tree(), &self.config, &path).is_some())
    }

    /// Grid of the table around `at` (or the selection anchor)
    pub fn table_grid(&self, at: Option<&Path>) -> Result<Option<Grid>> {
        let Some(path) = self.target_path(at) else {
            return Ok(None);
        };
        match table_above(self.tree(), &self.config, &path) {
            Some((_, table_path)) => Ok(Some(self.grid(&table_path)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use doc_model::{Position, Selection};

    fn editor() -> TableEditor {
        TableEditor::new(
            Editor::new(doc(vec![para("intro"), body_table(2, 2)])),
            TableConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_is_in_table() {
        let table = editor();
        assert!(table.is_in_table(Some(&path([1, 0, 1, 0, 0, 0]))));
        assert!(!table.is_in_table(Some(&path([0, 0]))));
        assert!(!table.is_in_table(None));
    }

    #[test]
    fn test_locate_from_selection() {
        let mut table = editor();
        let text = table.tree().node_at(&path([1, 0, 1, 1, 0, 0])).unwrap();
        table
            .editor_mut()
            .select(Selection::collapsed(Position::start_of(text)))
            .unwrap();
        let (cell, table_path) = table.locate_target(None).unwrap();
        assert_eq!(cell.path, path([1, 0, 1, 1]));
        assert_eq!(table_path, path([1]));
        let grid = table.table_grid(None).unwrap().unwrap();
        assert_eq!(grid.position_of(cell.id), Some((1, 1)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = TableConfig::default();
        config.blocks.row = "td".into();
        assert!(TableEditor::new(Editor::new(DocumentTree::new()), config).is_err());
    }
}
