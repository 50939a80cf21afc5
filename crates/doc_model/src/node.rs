//! Core node trait and the two stored node kinds

use crate::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use unicode_segmentation::UnicodeSegmentation;

/// Enumeration of the stored node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    Element,
    Text,
}

/// Element attributes. Absent keys mean "default".
pub type Props = BTreeMap<String, Value>;

/// Common interface for all document nodes
pub trait Node: std::fmt::Debug {
    /// Get the unique ID of this node
    fn id(&self) -> NodeId;

    /// Get the type of this node
    fn node_type(&self) -> NodeType;

    /// Get the IDs of child nodes
    fn children(&self) -> &[NodeId];

    /// Get the ID of the parent node (None for root)
    fn parent(&self) -> Option<NodeId>;

    /// Set the parent node ID
    fn set_parent(&mut self, parent: Option<NodeId>);

    /// Check if this node can have children
    fn can_have_children(&self) -> bool;

    /// Get the text content of this node (if any)
    fn text_content(&self) -> Option<&str> {
        None
    }
}

/// A tagged element. The tag vocabulary belongs to the host document; this
/// crate never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Node-kind tag, e.g. "td" or "paragraph"
    pub tag: String,
    /// Attributes
    pub props: Props,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
            tag: tag.into(),
            props: Props::new(),
        }
    }

    pub fn with_props(tag: impl Into<String>, props: Props) -> Self {
        Self {
            props,
            ..Self::new(tag)
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }
}

impl Node for Element {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Element
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn can_have_children(&self) -> bool {
        true
    }
}

/// A leaf holding text. Offsets into it count grapheme clusters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    id: NodeId,
    parent: Option<NodeId>,
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            text: text.into(),
        }
    }

    /// Length in grapheme clusters
    pub fn len(&self) -> usize {
        self.text.graphemes(true).count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Node for Text {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Text
    }

    fn children(&self) -> &[NodeId] {
        &[]
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn can_have_children(&self) -> bool {
        false
    }

    fn text_content(&self) -> Option<&str> {
        Some(&self.text)
    }
}
