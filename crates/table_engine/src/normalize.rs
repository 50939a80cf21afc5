//! Structural normalizer
//!
//! One rule set per structural role. Each call inspects the node at a path
//! and performs at most one write; the editor's normalization loop restarts
//! after every write, so repeated application converges on a well-formed
//! table.
//!
//! - table: only section children; rows are rectangular
//! - section: only row children
//! - row: only cell children
//! - cell: content blocks only (plus an allowed nested table); never empty
//! - content block: no structural descendants
//! - cell attributes: spans of 1 are stored as absent

use crate::config::{CellKind, SectionKind, TableConfig};
use crate::editor::{empty_cell_of_kind, empty_content, set_span};
use crate::grid::{cell_span, cell_spans, filled_matrix};
use crate::Result;
use doc_model::{DocumentTree, Editor, Fragment, NodeId, NodeType, Path};
use tracing::debug;

/// Apply the rule for the node at `path`; returns whether it wrote
pub(crate) fn normalize_node(
    editor: &mut Editor,
    config: &TableConfig,
    path: &Path,
) -> Result<bool> {
    let Some(tag) = editor.tree().element_at(path).map(|el| el.tag.clone()) else {
        return Ok(false);
    };
    if config.is_table(&tag) {
        normalize_table(editor, config, path)
    } else if config.is_section(&tag) {
        normalize_section(editor, config, path)
    } else if config.is_row(&tag) {
        normalize_row(editor, config, path)
    } else if let Some(kind) = config.cell_kind(&tag) {
        normalize_cell(editor, config, path, kind)
    } else if config.is_content(&tag) {
        unwrap_forbidden(editor, config, path, None)
    } else {
        Ok(false)
    }
}

/// Range of the first run of consecutive children failing `keep`
fn first_run(
    tree: &DocumentTree,
    children: &[NodeId],
    keep: impl Fn(&DocumentTree, NodeId) -> bool,
) -> Option<std::ops::Range<usize>> {
    let start = children.iter().position(|&c| !keep(tree, c))?;
    let len = children[start..]
        .iter()
        .take_while(|&&c| !keep(tree, c))
        .count();
    Some(start..start + len)
}

fn has_tag(tree: &DocumentTree, id: NodeId, pred: impl Fn(&str) -> bool) -> bool {
    tree.tag(id).is_some_and(pred)
}

// =============================================================================
// Table
// =============================================================================

fn normalize_table(editor: &mut Editor, config: &TableConfig, path: &Path) -> Result<bool> {
    let tree = editor.tree();
    let children = tree.children_at(path)?.to_vec();
    if children.is_empty() {
        debug!(%path, "removing table without sections");
        editor.remove_node(path)?;
        return Ok(true);
    }
    let is_section = |tree: &DocumentTree, id| has_tag(tree, id, |t| config.is_section(t));

    let Some(orphans) = first_run(tree, &children, is_section) else {
        return normalize_grid(editor, config, path);
    };

    // A body buried inside the orphan is dissolved before anything is reused
    let orphan_path = path.child(orphans.start);
    let body_tag = config.section_tag(SectionKind::Body);
    let nested = find_below(tree, &orphan_path, |tag| tag == body_tag, |tag| config.is_table(tag));
    if let Some(nested) = nested {
        debug!(%nested, "unwrapping nested table body");
        editor.unwrap_node(&nested)?;
        return Ok(true);
    }

    let body_index = children
        .iter()
        .position(|&c| has_tag(tree, c, |t| t == body_tag));
    match body_index {
        Some(body_index) => {
            let body_path = path.child(body_index);
            // Orphans before the body go to its start, nearest first, so
            // their order is kept; orphans after it are appended
            let before = children[..body_index]
                .iter()
                .rposition(|&c| !is_section(tree, c));
            let (from, index) = match before {
                Some(before) => (path.child(before), 0),
                None => (orphan_path, tree.children(children[body_index]).len()),
            };
            debug!(%from, %body_path, "moving orphan into table body");
            editor.move_node(&from, &body_path, index)?;
        }
        None => {
            debug!(%path, ?orphans, "wrapping orphans in a new table body");
            editor.wrap_nodes(path, orphans, Fragment::element(body_tag))?;
        }
    }
    Ok(true)
}

/// First element strictly below `path` (pre-order) whose tag matches `find`,
/// not descending into elements matching `stop`
fn find_below(
    tree: &DocumentTree,
    path: &Path,
    find: impl Fn(&str) -> bool + Copy,
    stop: impl Fn(&str) -> bool + Copy,
) -> Option<Path> {
    let id = tree.node_at(path)?;
    for (index, &child) in tree.children(id).iter().enumerate() {
        let Some(tag) = tree.tag(child) else {
            continue;
        };
        let child_path = path.child(index);
        if find(tag) {
            return Some(child_path);
        }
        if stop(tag) {
            continue;
        }
        if let Some(found) = find_below(tree, &child_path, find, stop) {
            return Some(found);
        }
    }
    None
}

/// Clamp spans to the slots their cells actually cover, then fill the first
/// hole
fn normalize_grid(editor: &mut Editor, config: &TableConfig, path: &Path) -> Result<bool> {
    let grid = filled_matrix(editor.tree(), config, path, None)?;

    for cell in grid.distinct_cells() {
        let Some(rect) = grid.rect_of(cell.id) else {
            continue;
        };
        let (rows, cols) = cell_spans(editor.tree(), config, cell.id)?;
        if rows > rect.height() {
            debug!(cell = %cell.id, rows, effective = rect.height(), "clamping row span");
            set_span(editor, cell.id, &config.row_span_key, rect.height())?;
            return Ok(true);
        }
        if cols > rect.width() {
            debug!(cell = %cell.id, cols, effective = rect.width(), "clamping column span");
            set_span(editor, cell.id, &config.col_span_key, rect.width())?;
            return Ok(true);
        }
    }

    if let Some((x, y)) = grid.first_hole() {
        let Some(row) = grid.row(x) else {
            return Ok(false);
        };
        let index = grid.anchors_before(x, y);
        debug!(row = x, col = y, "filling hole in table grid");
        let cell = empty_cell_of_kind(config, CellKind::for_section(Some(row.section_kind)));
        editor.insert_node(&row.path.child(index), cell)?;
        return Ok(true);
    }
    Ok(false)
}

// =============================================================================
// Sections and rows
// =============================================================================

fn normalize_section(editor: &mut Editor, config: &TableConfig, path: &Path) -> Result<bool> {
    let tree = editor.tree();
    let children = tree.children_at(path)?.to_vec();
    if children.is_empty() {
        debug!(%path, "removing empty table section");
        editor.remove_node(path)?;
        return Ok(true);
    }
    let is_row = |tree: &DocumentTree, id| has_tag(tree, id, |t| config.is_row(t));
    let Some(run) = first_run(tree, &children, is_row) else {
        return Ok(false);
    };
    debug!(%path, ?run, "wrapping section children in a row");
    editor.wrap_nodes(path, run, Fragment::element(config.blocks.row.as_str()))?;
    Ok(true)
}

fn normalize_row(editor: &mut Editor, config: &TableConfig, path: &Path) -> Result<bool> {
    let tree = editor.tree();
    let children = tree.children_at(path)?.to_vec();
    let is_cell = |tree: &DocumentTree, id| has_tag(tree, id, |t| config.is_cell(t));
    let Some(run) = first_run(tree, &children, is_cell) else {
        return Ok(false);
    };
    let section = path
        .parent()
        .and_then(|p| tree.element_at(&p))
        .and_then(|el| config.section_kind(&el.tag));
    let tag = config.cell_tag(CellKind::for_section(section)).to_string();
    debug!(%path, ?run, %tag, "wrapping row children in a cell");
    editor.wrap_nodes(path, run, Fragment::element(tag))?;
    Ok(true)
}

// =============================================================================
// Cells and content
// =============================================================================

fn normalize_cell(
    editor: &mut Editor,
    config: &TableConfig,
    path: &Path,
    kind: CellKind,
) -> Result<bool> {
    if canonicalize_spans(editor, config, path)? {
        return Ok(true);
    }
    if unwrap_forbidden(editor, config, path, Some(kind))? {
        return Ok(true);
    }

    let tree = editor.tree();
    let children = tree.children_at(path)?.to_vec();
    if children.is_empty() {
        debug!(%path, "filling empty cell");
        editor.insert_node(&path.child(0), empty_content(config))?;
        return Ok(true);
    }
    let is_block = |tree: &DocumentTree, id| match tree.node_type(id) {
        Some(NodeType::Text) => false,
        _ => !has_tag(tree, id, |t| config.is_inline(t)),
    };
    if let Some(run) = first_run(tree, &children, is_block) {
        debug!(%path, ?run, "wrapping loose cell content in a block");
        editor.wrap_nodes(path, run, Fragment::element(config.blocks.content.as_str()))?;
        return Ok(true);
    }
    Ok(false)
}

/// Drop span attributes equal to 1; reject malformed spans
fn canonicalize_spans(editor: &mut Editor, config: &TableConfig, path: &Path) -> Result<bool> {
    let Some(id) = editor.tree().node_at(path) else {
        return Ok(false);
    };
    for key in [&config.row_span_key, &config.col_span_key] {
        let present = editor.tree().prop(id, key).is_some();
        if present && cell_span(editor.tree(), id, key)? == 1 {
            editor.unset_props(path, &[key.as_str()])?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Unwrap the first structural descendant that may not live under `path`.
///
/// Inside a cell whose kind allows nested tables, a `table` is left alone and
/// not searched; everything else structural is dissolved.
fn unwrap_forbidden(
    editor: &mut Editor,
    config: &TableConfig,
    path: &Path,
    cell: Option<CellKind>,
) -> Result<bool> {
    let tables_allowed = cell.is_some_and(|kind| config.allows_nested_tables(kind));
    let found = find_below(
        editor.tree(),
        path,
        |tag| config.is_structural(tag) && !(tables_allowed && config.is_table(tag)),
        |tag| config.is_table(tag),
    );
    match found {
        Some(forbidden) => {
            debug!(%path, %forbidden, "unwrapping structural node");
            editor.unwrap_node(&forbidden)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
