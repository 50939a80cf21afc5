//! End-to-end scenarios over a normalized document

mod common;

use common::*;
use serde_json::json;
use table_engine::{InsertRowOptions, InsertTableOptions, SplitOptions};

#[test]
fn insert_table_then_next_from_last_cell_is_noop() {
    let mut t = editor(vec![]);
    assert!(t.insert_table(InsertTableOptions::new(3, 3)).unwrap());

    let caret = t.editor().selection().unwrap();
    assert!(caret.is_collapsed());
    let last_cell = path([0, 0, 2, 2]);
    assert!(t.editor().is_start_of(&caret.focus, &last_cell));
    assert!(t.is_in_last_cell().unwrap());

    assert!(!t.cursor().next().unwrap());
    assert_eq!(t.editor().selection(), Some(caret));
}

#[test]
fn merge_over_clamped_row_span() {
    // The rowSpan=2 on (1,0) runs past the end of the body and is clamped
    let mut t = editor(vec![table(vec![body(vec![
        row(vec![cell("0,0"), cell("0,1"), cell("0,2")]),
        row(vec![span_cell("1,0", 2, 1), cell("1,1"), cell("1,2")]),
    ])])]);
    let clamped = t.tree().node_at(&path([0, 0, 1, 0])).unwrap();
    assert_eq!(t.tree().prop(clamped, "rowSpan"), None);

    let anchor = start_of(&t, path([0, 0, 0, 0]));
    let focus = end_of(&t, path([0, 0, 1, 1]));
    select(&mut t, anchor, focus);
    assert!(t.can_merge().unwrap());
    assert!(t.merge().unwrap());

    let merged = t.tree().node_at(&path([0, 0, 0, 0])).unwrap();
    assert_eq!(t.tree().prop(merged, "rowSpan"), Some(&json!(2)));
    assert_eq!(t.tree().prop(merged, "colSpan"), Some(&json!(2)));
    assert_eq!(t.tree().text_content(&path([0, 0, 0, 0])), "0,00,11,01,1");
    assert_eq!(
        grid_texts(&t, path([0])),
        vec![
            vec!["0,00,11,01,1", "0,00,11,01,1", "0,2"],
            vec!["0,00,11,01,1", "0,00,11,01,1", "1,2"],
        ]
    );
}

#[test]
fn removing_only_row_removes_table() {
    let mut t = editor(vec![para("before"), body_table(1, 3), para("after")]);
    assert!(t.remove_row(Some(&path([1, 0, 0, 1]))).unwrap());
    let root = t.tree().children_at(&path([])).unwrap().to_vec();
    assert_eq!(root.len(), 2);
    assert_eq!(t.tree().text_content(&path([0])), "before");
    assert_eq!(t.tree().text_content(&path([1])), "after");
}

#[test]
fn range_into_table_is_pulled_outside() {
    let mut t = editor(vec![para("before"), body_table(2, 2)]);
    let anchor = start_of(&t, path([0]));
    let inside = start_of(&t, path([1, 0, 1, 1]));
    select(&mut t, anchor, inside);

    let selection = t.editor().selection().unwrap();
    assert_eq!(selection.anchor, anchor);
    assert_eq!(selection.focus, end_of(&t, path([0])));
    assert!(!t.is_in_table(None));
    assert_eq!(t.selected_cells().unwrap(), None);
}

#[test]
fn range_out_of_leading_table_is_pulled_outside() {
    let mut t = editor(vec![body_table(2, 2), para("after")]);
    let inside = end_of(&t, path([0, 0, 0, 0]));
    let focus = end_of(&t, path([1]));
    select(&mut t, inside, focus);

    let selection = t.editor().selection().unwrap();
    assert_eq!(selection.anchor, start_of(&t, path([1])));
    assert_eq!(selection.focus, focus);
}

#[test]
fn range_spanning_whole_table_is_kept() {
    let mut t = editor(vec![para("before"), body_table(2, 2), para("after")]);
    let anchor = start_of(&t, path([0]));
    let focus = end_of(&t, path([2]));
    select(&mut t, anchor, focus);
    let selection = t.editor().selection().unwrap();
    assert_eq!((selection.anchor, selection.focus), (anchor, focus));
}

#[test]
fn merge_then_split_keeps_content_in_survivor() {
    let mut t = editor(vec![body_table(2, 2)]);
    let anchor = start_of(&t, path([0, 0, 0, 0]));
    let focus = start_of(&t, path([0, 0, 1, 1]));
    select(&mut t, anchor, focus);
    assert!(t.merge().unwrap());

    assert!(t.split(SplitOptions::cell().at(path([0, 0, 0, 0]))).unwrap());
    assert_eq!(
        grid_texts(&t, path([0])),
        vec![vec!["0,00,11,01,1", ""], vec!["", ""]]
    );
    let grid = t.table_grid(Some(&path([0]))).unwrap().unwrap();
    assert_eq!(grid.first_hole(), None);
    // the selection still points into the surviving content
    let selection = t.editor().selection().unwrap();
    assert!(t.tree().path_of(selection.focus.node_id).is_some());
}

#[test]
fn insert_then_remove_row_around_spanning_cell() {
    // a(rs=2) b
    //         c
    let mut t = editor(vec![table(vec![body(vec![
        row(vec![span_cell("a", 2, 1), cell("b")]),
        row(vec![cell("c")]),
    ])])]);
    assert!(t.insert_row(InsertRowOptions::above().at(path([0, 0, 1, 0]))).unwrap());
    assert_eq!(
        grid_texts(&t, path([0])),
        vec![vec!["a", "b"], vec!["a", ""], vec!["a", "c"]]
    );

    // removing the anchor row hands the span to the next row
    assert!(t.remove_row(Some(&path([0, 0, 0, 0]))).unwrap());
    assert_eq!(grid_texts(&t, path([0])), vec![vec!["a", ""], vec!["a", "c"]]);
    let a = t.tree().node_at(&path([0, 0, 0, 0])).unwrap();
    assert_eq!(t.tree().prop(a, "rowSpan"), Some(&json!(2)));
}
