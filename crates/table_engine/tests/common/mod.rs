//! Shared harness for the table engine integration tests

#![allow(dead_code)]

use doc_model::{DocumentTree, Editor, Fragment, Path, Position, Selection};
use table_engine::{TableConfig, TableEditor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route engine logs to the test output; filter with `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn para(text: &str) -> Fragment {
    Fragment::element("paragraph").with_child(Fragment::text(text))
}

pub fn cell(text: &str) -> Fragment {
    Fragment::element("td").with_child(para(text))
}

pub fn span_cell(text: &str, row_span: u64, col_span: u64) -> Fragment {
    let mut cell = cell(text);
    if row_span != 1 {
        cell = cell.with_prop("rowSpan", row_span);
    }
    if col_span != 1 {
        cell = cell.with_prop("colSpan", col_span);
    }
    cell
}

pub fn row(cells: Vec<Fragment>) -> Fragment {
    Fragment::element("tr").with_children(cells)
}

pub fn body(rows: Vec<Fragment>) -> Fragment {
    Fragment::element("tbody").with_children(rows)
}

pub fn table(sections: Vec<Fragment>) -> Fragment {
    Fragment::element("table").with_children(sections)
}

/// Body-only table whose cells read "r,c"
pub fn body_table(rows: usize, cols: usize) -> Fragment {
    table(vec![body(
        (0..rows)
            .map(|r| row((0..cols).map(|c| cell(&format!("{r},{c}"))).collect()))
            .collect(),
    )])
}

/// Normalized table editor over `children`
pub fn editor(children: Vec<Fragment>) -> TableEditor {
    init_tracing();
    let tree = DocumentTree::from_fragments(children).unwrap();
    TableEditor::new(Editor::new(tree), TableConfig::default()).unwrap()
}

pub fn path<const N: usize>(indices: [usize; N]) -> Path {
    Path::from(indices)
}

pub fn start_of(t: &TableEditor, at: Path) -> Position {
    t.editor().start_of(&at).unwrap()
}

pub fn end_of(t: &TableEditor, at: Path) -> Position {
    t.editor().end_of(&at).unwrap()
}

pub fn select(t: &mut TableEditor, anchor: Position, focus: Position) {
    t.editor_mut().select(Selection::new(anchor, focus)).unwrap();
}

/// Text of the cell covering each slot of the table at `table_path`
pub fn grid_texts(t: &TableEditor, table_path: Path) -> Vec<Vec<String>> {
    let grid = t.table_grid(Some(&table_path)).unwrap().unwrap();
    grid.slot_rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|slot| {
                    slot.as_ref()
                        .map(|s| t.tree().text_content(&s.cell.path))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}
