//! Pipeline handler contributing the table rules to an `Editor`

use crate::config::TableConfig;
use crate::normalize::normalize_node;
use crate::selection::adjust_boundaries;
use crate::TableError;
use doc_model::{DocModelError, Editor, Flow, Handler, Operation};

#[derive(Debug)]
pub struct TableHandler {
    config: TableConfig,
}

impl TableHandler {
    pub fn new(config: TableConfig) -> Self {
        Self { config }
    }
}

impl Handler for TableHandler {
    fn name(&self) -> &str {
        "tables"
    }

    fn handle(&self, editor: &mut Editor, operation: &mut Operation) -> doc_model::Result<Flow> {
        match operation {
            Operation::NormalizeNode { path } => {
                let path = path.clone();
                let wrote = normalize_node(editor, &self.config, &path).map_err(into_doc_error)?;
                Ok(if wrote { Flow::Handled } else { Flow::Forward })
            }
            Operation::SetSelection { selection } => {
                if let Some(requested) = selection.as_mut() {
                    *requested = adjust_boundaries(editor, &self.config, *requested);
                }
                Ok(Flow::Forward)
            }
        }
    }
}

fn into_doc_error(err: TableError) -> DocModelError {
    match err {
        TableError::DocModel(inner) => inner,
        other => DocModelError::TreeStructureError(other.to_string()),
    }
}
