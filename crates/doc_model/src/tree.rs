//! Document tree storage and path-addressed operations

use crate::{DocModelError, Element, Fragment, Node, NodeId, NodeType, Path, Props, Result, Text};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Range;

/// Tag of the root element every tree starts with
pub const ROOT_TAG: &str = "document";

/// Storage for the two node kinds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStorage {
    pub elements: HashMap<NodeId, Element>,
    pub texts: HashMap<NodeId, Text>,
}

/// The complete document tree structure
///
/// Nodes live in an id-keyed arena; parent/child links are ids. All public
/// addressing is by `Path`, resolved by walking child indices from the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTree {
    root: NodeId,
    nodes: NodeStorage,
}

impl DocumentTree {
    /// Create a new tree holding only the root element
    pub fn new() -> Self {
        let root = Element::new(ROOT_TAG);
        let root_id = root.id();
        let mut nodes = NodeStorage::default();
        nodes.elements.insert(root_id, root);
        Self {
            root: root_id,
            nodes,
        }
    }

    /// Create a tree whose root holds the given top-level fragments
    pub fn from_fragments(children: impl IntoIterator<Item = Fragment>) -> Result<Self> {
        let mut tree = Self::new();
        for (index, fragment) in children.into_iter().enumerate() {
            tree.insert_node(&Path::from([index]), fragment)?;
        }
        Ok(tree)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        if self.nodes.elements.contains_key(&id) {
            Some(NodeType::Element)
        } else if self.nodes.texts.contains_key(&id) {
            Some(NodeType::Text)
        } else {
            None
        }
    }

    pub fn get_element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.elements.get(&id)
    }

    pub fn get_text(&self, id: NodeId) -> Option<&Text> {
        self.nodes.texts.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        match self.get_element(id) {
            Some(el) => Some(el as &dyn Node),
            None => self.get_text(id).map(|t| t as &dyn Node),
        }
    }

    /// Children of a node; empty for text nodes and unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get_element(id).map(|el| el.children()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent())
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get_element(id).map(|el| el.tag.as_str())
    }

    pub fn prop(&self, id: NodeId, key: &str) -> Option<&Value> {
        self.get_element(id).and_then(|el| el.prop(key))
    }

    // ------------------------------------------------------------------
    // Path addressing
    // ------------------------------------------------------------------

    pub fn node_at(&self, path: &Path) -> Option<NodeId> {
        let mut current = self.root;
        for &index in path.as_slice() {
            current = *self.get_element(current)?.children().get(index)?;
        }
        Some(current)
    }

    pub fn element_at(&self, path: &Path) -> Option<&Element> {
        self.node_at(path).and_then(|id| self.get_element(id))
    }

    pub fn path_of(&self, id: NodeId) -> Option<Path> {
        let mut indices = Vec::new();
        let mut current = id;
        while current != self.root {
            let parent = self.parent(current)?;
            let index = self.children(parent).iter().position(|&c| c == current)?;
            indices.push(index);
            current = parent;
        }
        indices.reverse();
        Some(Path::new(indices))
    }

    pub fn children_at(&self, path: &Path) -> Result<&[NodeId]> {
        let id = self
            .node_at(path)
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        Ok(self.children(id))
    }

    /// Deepest element at or above `path` matching the predicate
    pub fn above(
        &self,
        path: &Path,
        predicate: impl Fn(&Element) -> bool,
    ) -> Option<(NodeId, Path)> {
        std::iter::once(path.clone())
            .chain(path.ancestors())
            .find_map(|candidate| {
                let el = self.element_at(&candidate)?;
                predicate(el).then(|| (el.id(), candidate))
            })
    }

    /// Common ancestor of two paths; purely index arithmetic
    pub fn common_ancestor(&self, a: &Path, b: &Path) -> Path {
        a.common_ancestor(b)
    }

    /// Paths of all elements in pre-order, root included
    pub fn element_paths(&self) -> Vec<Path> {
        let mut out = Vec::new();
        self.collect_element_paths(self.root, Path::root(), &mut out);
        out
    }

    fn collect_element_paths(&self, id: NodeId, path: Path, out: &mut Vec<Path>) {
        let Some(el) = self.get_element(id) else {
            return;
        };
        out.push(path.clone());
        for (index, &child) in el.children().iter().enumerate() {
            self.collect_element_paths(child, path.child(index), out);
        }
    }

    // ------------------------------------------------------------------
    // Text traversal
    // ------------------------------------------------------------------

    /// Length of a text node in grapheme clusters (0 for non-text)
    pub fn text_len(&self, id: NodeId) -> usize {
        self.get_text(id).map(|t| t.len()).unwrap_or(0)
    }

    /// Text nodes under `path` (inclusive) in document order
    pub fn texts_under(&self, path: &Path) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(id) = self.node_at(path) {
            self.collect_texts(id, &mut out);
        }
        out
    }

    fn collect_texts(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.nodes.texts.contains_key(&id) {
            out.push(id);
            return;
        }
        for &child in self.children(id) {
            self.collect_texts(child, out);
        }
    }

    pub fn first_text(&self, path: &Path) -> Option<NodeId> {
        self.texts_under(path).first().copied()
    }

    pub fn last_text(&self, path: &Path) -> Option<NodeId> {
        self.texts_under(path).last().copied()
    }

    /// Last text node ending before the subtree at `path` starts
    pub fn text_before(&self, path: &Path) -> Option<NodeId> {
        self.texts_under(&Path::root())
            .into_iter()
            .filter(|&id| self.path_of(id).is_some_and(|p| p.is_before(path)))
            .last()
    }

    /// First text node starting after the subtree at `path` ends
    pub fn text_after(&self, path: &Path) -> Option<NodeId> {
        self.texts_under(&Path::root())
            .into_iter()
            .find(|&id| self.path_of(id).is_some_and(|p| p > *path && !path.contains(&p)))
    }

    /// Concatenated text under `path`
    pub fn text_content(&self, path: &Path) -> String {
        self.texts_under(path)
            .into_iter()
            .filter_map(|id| self.get_text(id))
            .map(|t| t.text.as_str())
            .collect()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn to_fragment(&self, path: &Path) -> Result<Fragment> {
        let id = self
            .node_at(path)
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        Ok(self.fragment_of(id))
    }

    /// Top-level children of the root as fragments
    pub fn to_fragments(&self) -> Vec<Fragment> {
        self.children(self.root)
            .iter()
            .map(|&id| self.fragment_of(id))
            .collect()
    }

    fn fragment_of(&self, id: NodeId) -> Fragment {
        if let Some(text) = self.get_text(id) {
            return Fragment::text(text.text.clone());
        }
        match self.get_element(id) {
            Some(el) => Fragment::Element {
                tag: el.tag.clone(),
                props: el.props.clone(),
                children: el.children().iter().map(|&c| self.fragment_of(c)).collect(),
            },
            None => Fragment::text(String::new()),
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.nodes
            .elements
            .get_mut(&id)
            .ok_or(DocModelError::NodeNotFound(id))
    }

    fn set_parent_of(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(el) = self.nodes.elements.get_mut(&id) {
            el.set_parent(parent);
        } else if let Some(text) = self.nodes.texts.get_mut(&id) {
            text.set_parent(parent);
        }
    }

    /// Resolve the parent element id and child index addressed by `path`
    fn slot(&self, path: &Path) -> Result<(NodeId, usize)> {
        let parent_path = path
            .parent()
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        let index = path.last().ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        let parent = self
            .element_at(&parent_path)
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        Ok((parent.id(), index))
    }

    fn build(&mut self, fragment: Fragment, parent: NodeId) -> NodeId {
        match fragment {
            Fragment::Text { text } => {
                let mut node = Text::new(text);
                node.set_parent(Some(parent));
                let id = node.id();
                self.nodes.texts.insert(id, node);
                id
            }
            Fragment::Element {
                tag,
                props,
                children,
            } => {
                let mut node = Element::with_props(tag, props);
                node.set_parent(Some(parent));
                let id = node.id();
                self.nodes.elements.insert(id, node);
                let child_ids: Vec<NodeId> =
                    children.into_iter().map(|c| self.build(c, id)).collect();
                if let Some(el) = self.nodes.elements.get_mut(&id) {
                    *el.children_mut() = child_ids;
                }
                id
            }
        }
    }

    fn extract(&mut self, id: NodeId) -> Fragment {
        if let Some(text) = self.nodes.texts.remove(&id) {
            return Fragment::text(text.text);
        }
        match self.nodes.elements.remove(&id) {
            Some(el) => Fragment::Element {
                children: el.children().iter().map(|&c| self.extract(c)).collect(),
                tag: el.tag,
                props: el.props,
            },
            None => Fragment::text(String::new()),
        }
    }

    /// Insert a subtree so that it ends up at `path`
    pub fn insert_node(&mut self, path: &Path, fragment: Fragment) -> Result<NodeId> {
        let (parent, index) = self.slot(path)?;
        if index > self.children(parent).len() {
            return Err(DocModelError::InvalidPath(path.clone()));
        }
        let id = self.build(fragment, parent);
        self.element_mut(parent)?.children_mut().insert(index, id);
        Ok(id)
    }

    /// Remove the subtree at `path`, returning it detached
    pub fn remove_node(&mut self, path: &Path) -> Result<Fragment> {
        let (parent, index) = self.slot(path)?;
        let children = self.element_mut(parent)?.children_mut();
        if index >= children.len() {
            return Err(DocModelError::InvalidPath(path.clone()));
        }
        let id = children.remove(index);
        Ok(self.extract(id))
    }

    /// Move the node at `from` under the element at `to_parent`.
    ///
    /// `to_parent` is resolved before the node is detached; `index` is the
    /// position among the new parent's children after detaching.
    pub fn move_node(&mut self, from: &Path, to_parent: &Path, index: usize) -> Result<()> {
        if from.contains(to_parent) {
            return Err(DocModelError::InvalidOperation(format!(
                "cannot move {from} into its own subtree {to_parent}"
            )));
        }
        let (old_parent, old_index) = self.slot(from)?;
        let new_parent = self
            .element_at(to_parent)
            .map(|el| el.id())
            .ok_or_else(|| DocModelError::InvalidPath(to_parent.clone()))?;
        if old_index >= self.children(old_parent).len() {
            return Err(DocModelError::InvalidPath(from.clone()));
        }
        let len_after_detach =
            self.children(new_parent).len() - usize::from(old_parent == new_parent);
        if index > len_after_detach {
            return Err(DocModelError::InvalidPath(to_parent.child(index)));
        }
        let id = self.element_mut(old_parent)?.children_mut().remove(old_index);
        self.element_mut(new_parent)?.children_mut().insert(index, id);
        self.set_parent_of(id, Some(new_parent));
        Ok(())
    }

    /// Merge `props` into the element's attributes
    pub fn set_props(&mut self, path: &Path, props: Props) -> Result<()> {
        let id = self
            .node_at(path)
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        self.element_mut(id)?.props.extend(props);
        Ok(())
    }

    pub fn unset_props(&mut self, path: &Path, keys: &[&str]) -> Result<()> {
        let id = self
            .node_at(path)
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        let el = self.element_mut(id)?;
        for key in keys {
            el.props.remove(*key);
        }
        Ok(())
    }

    /// Replace the element at `path` by its children
    pub fn unwrap_node(&mut self, path: &Path) -> Result<()> {
        let (parent, index) = self.slot(path)?;
        let id = *self
            .children(parent)
            .get(index)
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        let el = self
            .nodes
            .elements
            .remove(&id)
            .ok_or_else(|| {
                DocModelError::InvalidOperation(format!("cannot unwrap text at {path}"))
            })?;
        let hoisted = el.children().to_vec();
        for &child in &hoisted {
            self.set_parent_of(child, Some(parent));
        }
        self.element_mut(parent)?
            .children_mut()
            .splice(index..=index, hoisted);
        Ok(())
    }

    /// Wrap the children `range` of the element at `parent` in a new element
    /// built from `wrapper` (its own children are ignored).
    pub fn wrap_nodes(
        &mut self,
        parent: &Path,
        range: Range<usize>,
        wrapper: Fragment,
    ) -> Result<NodeId> {
        let parent_id = self
            .element_at(parent)
            .map(|el| el.id())
            .ok_or_else(|| DocModelError::InvalidPath(parent.clone()))?;
        if range.is_empty() || range.end > self.children(parent_id).len() {
            return Err(DocModelError::InvalidOperation(format!(
                "cannot wrap children {range:?} of {parent}"
            )));
        }
        let Fragment::Element { tag, props, .. } = wrapper else {
            return Err(DocModelError::InvalidOperation("wrapper must be an element".into()));
        };
        let mut wrapper = Element::with_props(tag, props);
        wrapper.set_parent(Some(parent_id));
        let wrapper_id = wrapper.id();
        let start = range.start;
        let moved: Vec<NodeId> = self.element_mut(parent_id)?.children_mut().drain(range).collect();
        for &child in &moved {
            self.set_parent_of(child, Some(wrapper_id));
        }
        *wrapper.children_mut() = moved;
        self.nodes.elements.insert(wrapper_id, wrapper);
        self.element_mut(parent_id)?
            .children_mut()
            .insert(start, wrapper_id);
        Ok(wrapper_id)
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}
