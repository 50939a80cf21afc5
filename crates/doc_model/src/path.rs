//! Integer paths addressing nodes from the root
//!
//! A path is the sequence of child indices leading from the root to a node.
//! Ancestry and ordering are pure functions of the indices: the derived
//! lexicographic order is document (pre-)order, and `a` is an ancestor of `b`
//! exactly when `a` is a strict prefix of `b`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path(Vec<usize>);

impl Path {
    /// The root path (empty index sequence)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Depth of the addressed node (root is 0)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A path of length 0 addresses the root
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Index of the node within its parent
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn next_sibling(&self) -> Option<Path> {
        let last = self.last()?;
        self.parent().map(|parent| parent.child(last + 1))
    }

    pub fn previous_sibling(&self) -> Option<Path> {
        let last = self.last()?;
        if last == 0 {
            return None;
        }
        self.parent().map(|parent| parent.child(last - 1))
    }

    /// The ancestor-or-self at `depth`
    pub fn prefix(&self, depth: usize) -> Path {
        Self(self.0[..depth.min(self.0.len())].to_vec())
    }

    /// Strict ancestry
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Ancestor-or-equal
    pub fn contains(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    pub fn common_ancestor(&self, other: &Path) -> Path {
        let shared = self
            .0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count();
        self.prefix(shared)
    }

    /// True when `self` ends before `other` starts in document order
    pub fn is_before(&self, other: &Path) -> bool {
        self < other && !self.contains(other)
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (0..self.0.len()).rev().map(move |depth| self.prefix(depth))
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
