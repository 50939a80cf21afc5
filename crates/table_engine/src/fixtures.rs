//! Tree builders shared by unit tests

use crate::grid::Grid;
use doc_model::{DocumentTree, Fragment, Path};

pub fn para(text: &str) -> Fragment {
    Fragment::element("paragraph").with_child(Fragment::text(text))
}

pub fn cell(text: &str) -> Fragment {
    Fragment::element("td").with_child(para(text))
}

pub fn header_cell(text: &str) -> Fragment {
    Fragment::element("th").with_child(para(text))
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

pub fn head(rows: Vec<Fragment>) -> Fragment {
    Fragment::element("thead").with_children(rows)
}

pub fn body(rows: Vec<Fragment>) -> Fragment {
    Fragment::element("tbody").with_children(rows)
}

pub fn foot(rows: Vec<Fragment>) -> Fragment {
    Fragment::element("tfoot").with_children(rows)
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

pub fn doc(children: Vec<Fragment>) -> DocumentTree {
    DocumentTree::from_fragments(children).expect("fixture tree")
}

/// Text of the cell covering each slot ("" for holes)
pub fn grid_texts(tree: &DocumentTree, grid: &Grid) -> Vec<Vec<String>> {
    grid.slot_rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|slot| {
                    slot.as_ref()
                        .map(|s| tree.text_content(&s.cell.path))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

pub fn path<const N: usize>(indices: [usize; N]) -> Path {
    Path::from(indices)
}
