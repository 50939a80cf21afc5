//! Table configuration
//!
//! Maps the logical table roles to the tags a particular document uses.
//! The value is owned by the caller and handed to `TableEditor::new`; the
//! engine never hard-codes a tag.

use crate::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of a table section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Head,
    Body,
    Foot,
}

/// Kind of a table cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Header,
    Data,
}

impl CellKind {
    /// Cells created inside a head section are header cells
    pub fn for_section(section: Option<SectionKind>) -> Self {
        match section {
            Some(SectionKind::Head) => CellKind::Header,
            _ => CellKind::Data,
        }
    }
}

/// Tags for each structural role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableBlocks {
    pub table: String,
    pub head: String,
    pub body: String,
    pub foot: String,
    pub row: String,
    pub header_cell: String,
    pub data_cell: String,
    /// Block holding a cell's rich text
    pub content: String,
}

impl Default for TableBlocks {
    fn default() -> Self {
        Self {
            table: "table".to_string(),
            head: "thead".to_string(),
            body: "tbody".to_string(),
            foot: "tfoot".to_string(),
            row: "tr".to_string(),
            header_cell: "th".to_string(),
            data_cell: "td".to_string(),
            content: "paragraph".to_string(),
        }
    }
}

/// Whether a cell kind may hold a nested table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedTables {
    pub header_cell: bool,
    pub data_cell: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub blocks: TableBlocks,
    /// Element tags that are inline content (wrapped into a content block
    /// when found directly inside a cell)
    pub inline: Vec<String>,
    pub nested_tables: NestedTables,
    pub row_span_key: String,
    pub col_span_key: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            blocks: TableBlocks::default(),
            inline: vec!["link".to_string(), "span".to_string()],
            nested_tables: NestedTables::default(),
            row_span_key: "rowSpan".to_string(),
            col_span_key: "colSpan".to_string(),
        }
    }
}

impl TableConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TableConfig =
            serde_json::from_str(json).map_err(|e| TableError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Like `from_json`, falling back to the defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse table configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Structural tags must be non-empty and pairwise distinct
    pub fn validate(&self) -> Result<()> {
        let b = &self.blocks;
        let tags = [
            &b.table,
            &b.head,
            &b.body,
            &b.foot,
            &b.row,
            &b.header_cell,
            &b.data_cell,
            &b.content,
        ];
        let mut seen = HashSet::new();
        for tag in tags {
            if tag.is_empty() {
                return Err(TableError::Config("empty tag".into()));
            }
            if !seen.insert(tag.as_str()) {
                return Err(TableError::Config(format!("tag {tag:?} used for two roles")));
            }
        }
        if let Some(tag) = self.inline.iter().find(|t| seen.contains(t.as_str())) {
            return Err(TableError::Config(format!("inline tag {tag:?} is also structural")));
        }
        if self.row_span_key.is_empty() || self.row_span_key == self.col_span_key {
            return Err(TableError::Config("span keys must be distinct and non-empty".into()));
        }
        Ok(())
    }

    pub fn is_table(&self, tag: &str) -> bool {
        tag == self.blocks.table
    }

    pub fn section_kind(&self, tag: &str) -> Option<SectionKind> {
        let b = &self.blocks;
        if tag == b.head {
            Some(SectionKind::Head)
        } else if tag == b.body {
            Some(SectionKind::Body)
        } else if tag == b.foot {
            Some(SectionKind::Foot)
        } else {
            None
        }
    }

    pub fn is_section(&self, tag: &str) -> bool {
        self.section_kind(tag).is_some()
    }

    pub fn is_row(&self, tag: &str) -> bool {
        tag == self.blocks.row
    }

    pub fn cell_kind(&self, tag: &str) -> Option<CellKind> {
        if tag == self.blocks.header_cell {
            Some(CellKind::Header)
        } else if tag == self.blocks.data_cell {
            Some(CellKind::Data)
        } else {
            None
        }
    }

    pub fn is_cell(&self, tag: &str) -> bool {
        self.cell_kind(tag).is_some()
    }

    pub fn is_content(&self, tag: &str) -> bool {
        tag == self.blocks.content
    }

    pub fn is_inline(&self, tag: &str) -> bool {
        self.inline.iter().any(|t| t == tag)
    }

    /// Table, section, row or cell
    pub fn is_structural(&self, tag: &str) -> bool {
        self.is_table(tag) || self.is_section(tag) || self.is_row(tag) || self.is_cell(tag)
    }

    pub fn section_tag(&self, kind: SectionKind) -> &str {
        match kind {
            SectionKind::Head => &self.blocks.head,
            SectionKind::Body => &self.blocks.body,
            SectionKind::Foot => &self.blocks.foot,
        }
    }

    pub fn cell_tag(&self, kind: CellKind) -> &str {
        match kind {
            CellKind::Header => &self.blocks.header_cell,
            CellKind::Data => &self.blocks.data_cell,
        }
    }

    pub fn allows_nested_tables(&self, kind: CellKind) -> bool {
        match kind {
            CellKind::Header => self.nested_tables.header_cell,
            CellKind::Data => self.nested_tables.data_cell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.section_kind("thead"), Some(SectionKind::Head));
        assert_eq!(config.cell_kind("th"), Some(CellKind::Header));
        assert!(config.is_structural("tr"));
        assert!(!config.is_structural("paragraph"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = TableConfig::from_json(
            r#"{ "blocks": { "data_cell": "table-cell" }, "nested_tables": { "data_cell": true } }"#,
        )
        .unwrap();
        assert_eq!(config.blocks.data_cell, "table-cell");
        assert_eq!(config.blocks.row, "tr");
        assert!(config.allows_nested_tables(CellKind::Data));
        assert!(!config.allows_nested_tables(CellKind::Header));
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let err = TableConfig::from_json(r#"{ "blocks": { "head": "tbody" } }"#);
        assert!(matches!(err, Err(TableError::Config(_))));
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let config = TableConfig::from_json_or_default("{ not json");
        assert_eq!(config, TableConfig::default());
    }

    #[test]
    fn test_cell_kind_for_section() {
        assert_eq!(CellKind::for_section(Some(SectionKind::Head)), CellKind::Header);
        assert_eq!(CellKind::for_section(Some(SectionKind::Foot)), CellKind::Data);
        assert_eq!(CellKind::for_section(None), CellKind::Data);
    }
}
