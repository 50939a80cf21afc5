//! Editor: tree + selection + normalization
//!
//! Every write goes through the editor. Outside a batch, a write is followed
//! by normalization: each element is offered to the handler pipeline as a
//! `NormalizeNode` operation, restarting from the top after any handler
//! writes, until a full pass leaves the tree untouched.

use crate::{
    DocModelError, DocumentTree, Flow, Fragment, Handler, Operation, Path, Position, Props, Result,
    Selection,
};
use std::cmp::Ordering;
use std::ops::Range;
use std::rc::Rc;
use tracing::trace;

pub struct Editor {
    tree: DocumentTree,
    selection: Option<Selection>,
    handlers: Vec<Rc<dyn Handler>>,
    /// Open `without_normalizing` scopes (normalization itself counts as one)
    batch_depth: usize,
    needs_normalize: bool,
    /// Incremented on every write
    version: u64,
}

impl Editor {
    pub fn new(tree: DocumentTree) -> Self {
        Self {
            tree,
            selection: None,
            handlers: Vec::new(),
            batch_depth: 0,
            needs_normalize: false,
            version: 0,
        }
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Append a handler to the pipeline
    pub fn register(&mut self, handler: Rc<dyn Handler>) {
        self.handlers.push(handler);
    }

    /// Offer an operation to the pipeline, falling back to the default
    pub fn dispatch(&mut self, mut operation: Operation) -> Result<()> {
        let handlers = self.handlers.clone();
        for handler in &handlers {
            if handler.handle(self, &mut operation)? == Flow::Handled {
                trace!(handler = handler.name(), ?operation, "operation handled");
                return Ok(());
            }
        }
        match operation {
            Operation::NormalizeNode { .. } => {}
            Operation::SetSelection { selection } => self.selection = selection,
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transactions and normalization
    // ------------------------------------------------------------------

    /// Run `f` with normalization deferred until it returns
    pub fn without_normalizing<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<DocModelError>,
    {
        self.batch_depth += 1;
        let outcome = f(self);
        self.batch_depth -= 1;
        let value = outcome?;
        if self.batch_depth == 0 && self.needs_normalize {
            self.normalize()?;
        }
        Ok(value)
    }

    /// Normalize the whole tree to a fixpoint (deferred inside a batch)
    pub fn normalize(&mut self) -> Result<()> {
        if self.batch_depth > 0 {
            self.needs_normalize = true;
            return Ok(());
        }
        self.batch_depth += 1;
        let outcome = self.normalize_until_stable();
        self.batch_depth -= 1;
        self.needs_normalize = false;
        outcome
    }

    fn normalize_until_stable(&mut self) -> Result<()> {
        'pass: loop {
            for path in self.tree.element_paths() {
                let before = self.version;
                self.dispatch(Operation::NormalizeNode { path })?;
                if self.version != before {
                    continue 'pass;
                }
            }
            return Ok(());
        }
    }

    fn after_write(&mut self) -> Result<()> {
        self.version += 1;
        if self.batch_depth > 0 {
            self.needs_normalize = true;
            return Ok(());
        }
        self.normalize()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    pub fn insert_node(&mut self, path: &Path, fragment: Fragment) -> Result<crate::NodeId> {
        let id = self.tree.insert_node(path, fragment)?;
        self.after_write()?;
        Ok(id)
    }

    /// Remove a subtree. Selection endpoints inside it move to the end of
    /// the preceding text (or the start of the following one).
    pub fn remove_node(&mut self, path: &Path) -> Result<Fragment> {
        let relocated = self.selection_outside(path);
        let fragment = self.tree.remove_node(path)?;
        if let Some(selection) = relocated {
            self.selection = selection;
        }
        self.after_write()?;
        Ok(fragment)
    }

    pub fn move_node(&mut self, from: &Path, to_parent: &Path, index: usize) -> Result<()> {
        self.tree.move_node(from, to_parent, index)?;
        self.after_write()
    }

    pub fn set_props(&mut self, path: &Path, props: Props) -> Result<()> {
        self.tree.set_props(path, props)?;
        self.after_write()
    }

    pub fn unset_props(&mut self, path: &Path, keys: &[&str]) -> Result<()> {
        self.tree.unset_props(path, keys)?;
        self.after_write()
    }

    pub fn unwrap_node(&mut self, path: &Path) -> Result<()> {
        self.tree.unwrap_node(path)?;
        self.after_write()
    }

    pub fn wrap_nodes(
        &mut self,
        parent: &Path,
        range: Range<usize>,
        wrapper: Fragment,
    ) -> Result<crate::NodeId> {
        let id = self.tree.wrap_nodes(parent, range, wrapper)?;
        self.after_write()?;
        Ok(id)
    }

    /// `None` when the selection is unaffected by removing `path`,
    /// `Some(new)` otherwise
    fn selection_outside(&self, path: &Path) -> Option<Option<Selection>> {
        let selection = self.selection?;
        let inside = |pos: &Position| {
            self.tree
                .path_of(pos.node_id)
                .is_some_and(|p| path.contains(&p))
        };
        if !inside(&selection.anchor) && !inside(&selection.focus) {
            return None;
        }
        let fallback = self
            .tree
            .text_before(path)
            .map(|id| Position::new(id, self.tree.text_len(id)))
            .or_else(|| self.tree.text_after(path).map(Position::start_of));
        let Some(fallback) = fallback else {
            return Some(None);
        };
        let pick = |pos: Position| if inside(&pos) { fallback } else { pos };
        Some(Some(Selection::new(pick(selection.anchor), pick(selection.focus))))
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Replace the selection through the handler pipeline
    pub fn set_selection(&mut self, selection: Option<Selection>) -> Result<()> {
        if let Some(selection) = &selection {
            for pos in selection.points() {
                self.check_position(&pos)?;
            }
        }
        self.dispatch(Operation::SetSelection { selection })
    }

    pub fn select(&mut self, selection: Selection) -> Result<()> {
        self.set_selection(Some(selection))
    }

    pub fn deselect(&mut self) -> Result<()> {
        self.set_selection(None)
    }

    pub fn collapse_to_start(&mut self) -> Result<()> {
        match self.selection.and_then(|s| self.selection_edges(&s)) {
            Some((start, _)) => self.select(Selection::collapsed(start)),
            None => Ok(()),
        }
    }

    pub fn collapse_to_end(&mut self) -> Result<()> {
        match self.selection.and_then(|s| self.selection_edges(&s)) {
            Some((_, end)) => self.select(Selection::collapsed(end)),
            None => Ok(()),
        }
    }

    fn check_position(&self, pos: &Position) -> Result<()> {
        let valid = self
            .tree
            .get_text(pos.node_id)
            .is_some_and(|t| pos.offset <= t.len());
        if valid {
            Ok(())
        } else {
            Err(DocModelError::InvalidPosition {
                node_id: pos.node_id,
                offset: pos.offset,
            })
        }
    }

    pub fn position_path(&self, pos: &Position) -> Option<Path> {
        self.tree.path_of(pos.node_id)
    }

    /// Document-order comparison of two positions
    pub fn compare_positions(&self, a: &Position, b: &Position) -> Option<Ordering> {
        let pa = self.position_path(a)?;
        let pb = self.position_path(b)?;
        Some(pa.cmp(&pb).then(a.offset.cmp(&b.offset)))
    }

    /// (start, end) of a selection in document order
    pub fn selection_edges(&self, selection: &Selection) -> Option<(Position, Position)> {
        match self.compare_positions(&selection.anchor, &selection.focus)? {
            Ordering::Greater => Some((selection.focus, selection.anchor)),
            _ => Some((selection.anchor, selection.focus)),
        }
    }

    /// First text position inside the subtree at `path`
    pub fn start_of(&self, path: &Path) -> Option<Position> {
        self.tree.first_text(path).map(Position::start_of)
    }

    /// Last text position inside the subtree at `path`
    pub fn end_of(&self, path: &Path) -> Option<Position> {
        self.tree
            .last_text(path)
            .map(|id| Position::new(id, self.tree.text_len(id)))
    }

    pub fn is_start_of(&self, pos: &Position, path: &Path) -> bool {
        self.start_of(path) == Some(*pos)
    }

    pub fn is_end_of(&self, pos: &Position, path: &Path) -> bool {
        self.end_of(path) == Some(*pos)
    }

    /// One grapheme back; crossing into the previous text node lands at its end
    pub fn position_before(&self, pos: &Position) -> Option<Position> {
        if pos.offset > 0 {
            return Some(Position::new(pos.node_id, pos.offset - 1));
        }
        let path = self.position_path(pos)?;
        let prev = self.tree.text_before(&path)?;
        Some(Position::new(prev, self.tree.text_len(prev)))
    }

    /// One grapheme forward; crossing into the next text node lands at its start
    pub fn position_after(&self, pos: &Position) -> Option<Position> {
        if pos.offset < self.tree.text_len(pos.node_id) {
            return Some(Position::new(pos.node_id, pos.offset + 1));
        }
        let path = self.position_path(pos)?;
        self.tree.text_after(&path).map(Position::start_of)
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("selection", &self.selection)
            .field("handlers", &self.handlers)
            .field("version", &self.version)
            .finish()
    }
}
