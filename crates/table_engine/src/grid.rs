//! Grid builder
//!
//! Turns the section → row → cell tree of one table into its logical
//! occupancy grid. Nothing here is cached: callers build a grid, use it for
//! one operation and drop it.

use crate::config::{SectionKind, TableConfig};
use crate::{Result, TableError};
use doc_model::{DocumentTree, Node, NodeId, Path};

/// A cell node and where it currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEntry {
    pub id: NodeId,
    pub path: Path,
}

/// Distances from a grid slot to the edges of the cell covering it
/// (`0` means the slot lies on that edge)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDistances {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSlot {
    pub cell: CellEntry,
    pub edges: EdgeDistances,
}

impl GridSlot {
    /// Top-left slot of its cell
    pub fn is_anchor(&self) -> bool {
        self.edges.top == 0 && self.edges.left == 0
    }
}

/// Inclusive rectangle of grid positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl CellRect {
    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.top..=self.bottom).contains(&row) && (self.left..=self.right).contains(&col)
    }

    pub fn union(&self, other: &CellRect) -> CellRect {
        CellRect {
            top: self.top.min(other.top),
            left: self.left.min(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.max(other.right),
        }
    }
}

/// A row node of the table with its section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub id: NodeId,
    pub path: Path,
    pub section: NodeId,
    pub section_kind: SectionKind,
}

/// Read a span attribute; absent means 1
pub fn cell_span(tree: &DocumentTree, cell: NodeId, key: &str) -> Result<usize> {
    let Some(value) = tree.prop(cell, key) else {
        return Ok(1);
    };
    match value.as_u64() {
        Some(n) if n >= 1 => Ok(n as usize),
        _ => Err(TableError::InvalidSpan {
            cell,
            key: key.to_string(),
            value: value.clone(),
        }),
    }
}

/// (rowSpan, colSpan) of a cell
pub fn cell_spans(
    tree: &DocumentTree,
    config: &TableConfig,
    cell: NodeId,
) -> Result<(usize, usize)> {
    Ok((
        cell_span(tree, cell, &config.row_span_key)?,
        cell_span(tree, cell, &config.col_span_key)?,
    ))
}

fn table_rows(
    tree: &DocumentTree,
    config: &TableConfig,
    table_path: &Path,
) -> Result<Vec<GridRow>> {
    let table = tree
        .element_at(table_path)
        .filter(|el| config.is_table(&el.tag))
        .ok_or_else(|| TableError::NotATable(table_path.clone()))?;
    let mut rows = Vec::new();
    for (s, &section) in table.children().iter().enumerate() {
        let Some(section_kind) = tree.tag(section).and_then(|t| config.section_kind(t)) else {
            continue;
        };
        let section_path = table_path.child(s);
        for (r, &row) in tree.children(section).iter().enumerate() {
            if tree.tag(row).is_some_and(|t| config.is_row(t)) {
                rows.push(GridRow {
                    id: row,
                    path: section_path.child(r),
                    section,
                    section_kind,
                });
            }
        }
    }
    Ok(rows)
}

/// Whether a row path falls between the row-level prefixes of two bounds
fn row_in_range(row: &Path, range: (&Path, &Path)) -> bool {
    let depth = row.len();
    let (a, b) = (range.0.prefix(depth), range.1.prefix(depth));
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    (lo <= *row || lo.contains(row)) && (*row <= hi || hi.contains(row))
}

/// Restartable sequence of anchor cells per row node
#[derive(Debug, Clone)]
pub struct Matrix<'a> {
    tree: &'a DocumentTree,
    config: &'a TableConfig,
    rows: Vec<GridRow>,
    next: usize,
}

impl<'a> Matrix<'a> {
    /// Row nodes the sequence walks over
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }
}

impl Iterator for Matrix<'_> {
    type Item = Vec<CellEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.get(self.next)?;
        self.next += 1;
        let cells = self
            .tree
            .children(row.id)
            .iter()
            .enumerate()
            .filter(|(_, id)| self.tree.tag(**id).is_some_and(|t| self.config.is_cell(t)))
            .map(|(i, &id)| CellEntry {
                id,
                path: row.path.child(i),
            })
            .collect();
        Some(cells)
    }
}

/// Anchor cells of each row of the table at `table_path`, optionally limited
/// to the rows between two paths (in either order)
pub fn matrix<'a>(
    tree: &'a DocumentTree,
    config: &'a TableConfig,
    table_path: &Path,
    range: Option<(&Path, &Path)>,
) -> Result<Matrix<'a>> {
    let mut rows = table_rows(tree, config, table_path)?;
    if let Some(range) = range {
        rows.retain(|row| row_in_range(&row.path, range));
    }
    Ok(Matrix {
        tree,
        config,
        rows,
        next: 0,
    })
}

/// Occupancy grid of the table at `table_path`.
///
/// The grid is always computed over the whole table so spans opened above a
/// range are honoured; with a range only the logical rows inside it are kept.
pub fn filled_matrix(
    tree: &DocumentTree,
    config: &TableConfig,
    table_path: &Path,
    range: Option<(&Path, &Path)>,
) -> Result<Grid> {
    let table = tree
        .node_at(table_path)
        .ok_or_else(|| TableError::NotATable(table_path.clone()))?;
    let matrix = matrix(tree, config, table_path, None)?;
    let rows = matrix.rows().to_vec();
    let n = rows.len();
    let mut slots: Vec<Vec<Option<GridSlot>>> = vec![Vec::new(); n];

    for (x, anchors) in matrix.enumerate() {
        // Spans stop at the end of the row's own section
        let section_end = (x..n)
            .take_while(|&i| rows[i].section == rows[x].section)
            .last()
            .unwrap_or(x);
        let mut y = 0;
        for entry in anchors {
            let (rs, cs) = cell_spans(tree, config, entry.id)?;
            while slots[x].get(y).is_some_and(Option::is_some) {
                y += 1;
            }
            let rs = rs.min(section_end - x + 1);
            // A column span stops at the first slot an earlier span already
            // holds; the cell keeps only the rectangle it actually won
            let cs = (0..cs)
                .take_while(|&j| !slots[x].get(y + j).is_some_and(Option::is_some))
                .count();
            for i in 0..rs {
                let row = &mut slots[x + i];
                if row.len() < y + cs {
                    row.resize(y + cs, None);
                }
                for j in 0..cs {
                    row[y + j] = Some(GridSlot {
                        cell: entry.clone(),
                        edges: EdgeDistances {
                            top: i,
                            right: cs - 1 - j,
                            bottom: rs - 1 - i,
                            left: j,
                        },
                    });
                }
            }
            y += cs;
        }
    }

    let mut grid = Grid {
        table,
        table_path: table_path.clone(),
        rows,
        slots,
        offset: 0,
    };
    if let Some(range) = range {
        // Rows in range form one contiguous run in document order
        let kept: Vec<usize> = (0..n)
            .filter(|&x| row_in_range(&grid.rows[x].path, range))
            .collect();
        let start = kept.first().copied().unwrap_or(0);
        let end = kept.last().map_or(0, |last| last + 1);
        grid.slots = grid.slots.drain(start..end).collect();
        grid.rows = grid.rows.drain(start..end).collect();
        grid.offset = start;
    }
    Ok(grid)
}

/// Logical grid of one table.
///
/// A grid built for a range holds only the rows of that range. Its row
/// indices start at the first kept row, and rectangles of cells that reach
/// outside the range are clipped to the kept rows.
#[derive(Debug, Clone)]
pub struct Grid {
    table: NodeId,
    table_path: Path,
    rows: Vec<GridRow>,
    slots: Vec<Vec<Option<GridSlot>>>,
    offset: usize,
}

impl Grid {
    pub fn table(&self) -> NodeId {
        self.table
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    /// Number of logical rows
    pub fn height(&self) -> usize {
        self.slots.len()
    }

    /// Number of logical columns (length of the longest row)
    pub fn width(&self) -> usize {
        self.slots.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// Logical index, within the whole table, of this grid's first row
    pub fn row_offset(&self) -> usize {
        self.offset
    }

    pub fn row(&self, x: usize) -> Option<&GridRow> {
        self.rows.get(x)
    }

    /// Slots of every logical row; `None` marks a hole
    pub fn slot_rows(&self) -> &[Vec<Option<GridSlot>>] {
        &self.slots
    }

    pub fn slot(&self, row: usize, col: usize) -> Option<&GridSlot> {
        self.slots.get(row)?.get(col)?.as_ref()
    }

    /// First position (row-major) not covered by any cell, within `width()`
    pub fn first_hole(&self) -> Option<(usize, usize)> {
        let width = self.width();
        (0..self.height()).find_map(|x| {
            (0..width)
                .find(|&y| self.slot(x, y).is_none())
                .map(|y| (x, y))
        })
    }

    /// Top-left position of a cell (its anchor, unless the cell starts
    /// above a ranged grid)
    pub fn position_of(&self, cell: NodeId) -> Option<(usize, usize)> {
        self.slots.iter().enumerate().find_map(|(x, row)| {
            row.iter().enumerate().find_map(|(y, slot)| {
                slot.as_ref()
                    .filter(|s| s.cell.id == cell)
                    .map(|_| (x, y))
            })
        })
    }

    /// Region covered by a cell
    pub fn rect_of(&self, cell: NodeId) -> Option<CellRect> {
        let (x, y) = self.position_of(cell)?;
        Some(self.clipped_rect(x, y, self.slot(x, y)?.edges))
    }

    /// Rectangle of the cell covering slot (x, y), limited to this grid's rows
    fn clipped_rect(&self, x: usize, y: usize, edges: EdgeDistances) -> CellRect {
        CellRect {
            top: x.saturating_sub(edges.top),
            left: y - edges.left,
            bottom: (x + edges.bottom).min(self.height().saturating_sub(1)),
            right: y + edges.right,
        }
    }

    /// Grow `rect` until no cell inside it sticks out
    pub fn expand_to_spans(&self, rect: CellRect) -> CellRect {
        let mut rect = rect;
        loop {
            let mut grown = rect;
            for x in rect.top..=rect.bottom {
                for y in rect.left..=rect.right {
                    if let Some(slot) = self.slot(x, y) {
                        grown = grown.union(&self.clipped_rect(x, y, slot.edges));
                    }
                }
            }
            if grown == rect {
                return rect;
            }
            rect = grown;
        }
    }

    /// Distinct cells of `rect` grouped by the row they first appear in,
    /// row-major; rows contributing no new cell are omitted
    pub fn cells_in(&self, rect: CellRect) -> Vec<Vec<CellEntry>> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for x in rect.top..=rect.bottom {
            let row: Vec<CellEntry> = (rect.left..=rect.right)
                .filter_map(|y| self.slot(x, y))
                .filter(|slot| seen.insert(slot.cell.id))
                .map(|slot| slot.cell.clone())
                .collect();
            if !row.is_empty() {
                out.push(row);
            }
        }
        out
    }

    /// Every distinct cell, row-major
    pub fn distinct_cells(&self) -> Vec<CellEntry> {
        if self.height() == 0 || self.width() == 0 {
            return Vec::new();
        }
        self.cells_in(CellRect {
            top: 0,
            left: 0,
            bottom: self.height() - 1,
            right: self.width() - 1,
        })
        .into_iter()
        .flatten()
        .collect()
    }

    /// Number of cells anchored in logical row `row` left of column `col`,
    /// i.e. the child index a new cell at `col` gets in that row's node
    pub fn anchors_before(&self, row: usize, col: usize) -> usize {
        self.slots
            .get(row)
            .map(|slots| {
                slots
                    .iter()
                    .take(col)
                    .flatten()
                    .filter(|slot| slot.is_anchor())
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use serde_json::json;

    #[test]
    fn test_unit_grid() {
        let tree = doc(vec![body_table(3, 2)]);
        let config = TableConfig::default();
        let grid = filled_matrix(&tree, &config, &Path::from([0]), None).unwrap();
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid_texts(&tree, &grid)[2], vec!["2,0", "2,1"]);
        assert!(grid.first_hole().is_none());
    }

    #[test]
    fn test_row_span_shifts_later_rows() {
        // a(rs=2) b
        //         c
        let tree = doc(vec![table(vec![body(vec![
            row(vec![span_cell("a", 2, 1), cell("b")]),
            row(vec![cell("c")]),
        ])])]);
        let config = TableConfig::default();
        let grid = filled_matrix(&tree, &config, &Path::from([0]), None).unwrap();
        assert_eq!(grid_texts(&tree, &grid), vec![vec!["a", "b"], vec!["a", "c"]]);
        let covered = grid.slot(1, 0).unwrap();
        assert_eq!(covered.edges, EdgeDistances { top: 1, right: 0, bottom: 0, left: 0 });
        assert!(!covered.is_anchor());
        assert_eq!(grid.position_of(covered.cell.id), Some((0, 0)));
        assert_eq!(grid.anchors_before(1, 1), 0);
    }

    #[test]
    fn test_first_filled_wins() {
        // a(cs=2) over a row whose first cell would collide with b(rs=2)
        let tree = doc(vec![table(vec![body(vec![
            row(vec![cell("x"), span_cell("b", 2, 1)]),
            row(vec![span_cell("c", 1, 2)]),
        ])])]);
        let config = TableConfig::default();
        let grid = filled_matrix(&tree, &config, &Path::from([0]), None).unwrap();
        let texts = grid_texts(&tree, &grid);
        assert_eq!(texts[1], vec!["c", "b"]);
        assert_eq!(grid.width(), 2);

        // c keeps only the slot it won
        let c = grid.slot(1, 0).unwrap();
        assert_eq!(c.edges, EdgeDistances::default());
        assert_eq!(
            grid.rect_of(c.cell.id),
            Some(CellRect { top: 1, left: 0, bottom: 1, right: 0 })
        );
    }

    #[test]
    fn test_span_clamped_to_section() {
        let tree = doc(vec![table(vec![
            head(vec![row(vec![span_cell("h", 3, 1), cell("h2")])]),
            body(vec![row(vec![cell("b1"), cell("b2")])]),
        ])]);
        let config = TableConfig::default();
        let grid = filled_matrix(&tree, &config, &Path::from([0]), None).unwrap();
        assert_eq!(grid.height(), 2);
        assert_eq!(grid_texts(&tree, &grid)[1], vec!["b1", "b2"]);
        assert_eq!(grid.slot(0, 0).unwrap().edges.bottom, 0);
    }

    #[test]
    fn test_expand_to_spans_and_cells_in() {
        // a  b(rs=2)
        // c
        let tree = doc(vec![table(vec![body(vec![
            row(vec![cell("a"), span_cell("b", 2, 1)]),
            row(vec![cell("c")]),
        ])])]);
        let config = TableConfig::default();
        let grid = filled_matrix(&tree, &config, &Path::from([0]), None).unwrap();
        let rect = grid.expand_to_spans(CellRect { top: 0, left: 0, bottom: 0, right: 1 });
        assert_eq!(rect, CellRect { top: 0, left: 0, bottom: 1, right: 1 });
        let cells = grid.cells_in(rect);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].len(), 2);
        assert_eq!(cells[1].len(), 1);
    }

    #[test]
    fn test_matrix_range_and_restart() {
        let tree = doc(vec![body_table(4, 2)]);
        let config = TableConfig::default();
        let from = Path::from([0, 0, 1, 0, 0, 0]);
        let to = Path::from([0, 0, 2, 1]);
        let rows = matrix(&tree, &config, &Path::from([0]), Some((&to, &from))).unwrap();
        let again = rows.clone();
        assert_eq!(rows.count(), 2);
        assert_eq!(again.flatten().count(), 4);
    }

    #[test]
    fn test_filled_matrix_range_keeps_open_spans() {
        let tree = doc(vec![table(vec![body(vec![
            row(vec![span_cell("a", 2, 1), cell("b")]),
            row(vec![cell("c")]),
        ])])]);
        let config = TableConfig::default();
        let second = Path::from([0, 0, 1]);
        let grid =
            filled_matrix(&tree, &config, &Path::from([0]), Some((&second, &second))).unwrap();
        assert_eq!(grid_texts(&tree, &grid), vec![vec!["a", "c"]]);
        assert_eq!(grid.row_offset(), 1);
    }

    #[test]
    fn test_ranged_grid_clips_cells_opened_above() {
        // a(rs=2) b
        //         c
        //  d      e
        let tree = doc(vec![table(vec![body(vec![
            row(vec![span_cell("a", 2, 1), cell("b")]),
            row(vec![cell("c")]),
            row(vec![cell("d"), cell("e")]),
        ])])]);
        let config = TableConfig::default();
        let second = Path::from([0, 0, 1]);
        let grid =
            filled_matrix(&tree, &config, &Path::from([0]), Some((&second, &second))).unwrap();

        let whole_row = CellRect { top: 0, left: 0, bottom: 0, right: 1 };
        assert_eq!(grid.expand_to_spans(whole_row), whole_row);

        let a = grid.slot(0, 0).unwrap().cell.id;
        assert_eq!(grid.position_of(a), Some((0, 0)));
        assert_eq!(grid.rect_of(a), Some(CellRect { top: 0, left: 0, bottom: 0, right: 0 }));
    }

    #[test]
    fn test_invalid_span_fails_fast() {
        let tree = doc(vec![table(vec![body(vec![row(vec![
            cell("a").with_prop("colSpan", json!(1.5)),
        ])])])]);
        let config = TableConfig::default();
        let err = filled_matrix(&tree, &config, &Path::from([0]), None).unwrap_err();
        assert!(matches!(err, TableError::InvalidSpan { .. }));
    }

    #[test]
    fn test_not_a_table() {
        let tree = doc(vec![para("x")]);
        let config = TableConfig::default();
        assert!(matches!(
            filled_matrix(&tree, &config, &Path::from([0]), None),
            Err(TableError::NotATable(_))
        ));
    }
}
