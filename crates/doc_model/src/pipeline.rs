//! Ordered handler pipeline
//!
//! Behaviour that depends on the host's node vocabulary (normalization
//! rules, selection adjustments) is contributed by handlers. The editor
//! offers each operation to its handlers in registration order; a handler
//! either handles it completely or forwards it, possibly after rewriting it.
//! Operations nobody handled reach the editor's default behaviour.

use crate::{Editor, Path, Result, Selection};

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Check one element and apply at most one corrective write
    NormalizeNode { path: Path },
    /// Replace the selection
    SetSelection { selection: Option<Selection> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Stop here; later handlers and the default do not run
    Handled,
    /// Pass the (possibly rewritten) operation on
    Forward,
}

pub trait Handler: std::fmt::Debug {
    /// Short name used in trace output
    fn name(&self) -> &str;

    fn handle(&self, editor: &mut Editor, operation: &mut Operation) -> Result<Flow>;
}
