//! Detached subtrees
//!
//! A `Fragment` is an owned, id-less description of a subtree. It is what
//! gets inserted into the tree and what comes back out of a removal; tests
//! also use it to compare structure independently of node ids.

use crate::Props;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "Props::is_empty")]
        props: Props,
        #[serde(default)]
        children: Vec<Fragment>,
    },
    Text {
        text: String,
    },
}

impl Fragment {
    pub fn element(tag: impl Into<String>) -> Self {
        Fragment::Element {
            tag: tag.into(),
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text { text: text.into() }
    }

    /// Set an attribute. No-op on text fragments.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Fragment::Element { props, .. } = &mut self {
            props.insert(key.into(), value.into());
        }
        self
    }

    /// Append a child. No-op on text fragments.
    pub fn with_child(mut self, child: Fragment) -> Self {
        if let Fragment::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, iter: impl IntoIterator<Item = Fragment>) -> Self {
        if let Fragment::Element { children, .. } = &mut self {
            children.extend(iter);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Fragment::Element { tag, .. } => Some(tag),
            Fragment::Text { .. } => None,
        }
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        match self {
            Fragment::Element { props, .. } => props.get(key),
            Fragment::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[Fragment] {
        match self {
            Fragment::Element { children, .. } => children,
            Fragment::Text { .. } => &[],
        }
    }

    /// Concatenated text of all descendant text fragments
    pub fn text_content(&self) -> String {
        match self {
            Fragment::Text { text } => text.clone(),
            Fragment::Element { children, .. } => {
                children.iter().map(Fragment::text_content).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let cell = Fragment::element("td")
            .with_prop("colSpan", 2)
            .with_child(Fragment::element("paragraph").with_child(Fragment::text("hi")));
        assert_eq!(cell.tag(), Some("td"));
        assert_eq!(cell.prop("colSpan"), Some(&json!(2)));
        assert_eq!(cell.text_content(), "hi");
        assert_eq!(Fragment::text("x").with_child(Fragment::text("y")), Fragment::text("x"));
    }

    #[test]
    fn test_deserialize_from_json() {
        let fragment: Fragment = serde_json::from_value(json!({
            "tag": "tr",
            "children": [{ "tag": "td", "props": { "rowSpan": 2 }, "children": [{ "text": "a" }] }]
        }))
        .unwrap();
        assert_eq!(fragment.children().len(), 1);
        assert_eq!(fragment.children()[0].prop("rowSpan"), Some(&json!(2)));
        assert_eq!(fragment.text_content(), "a");
    }
}
