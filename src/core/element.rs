//! Triangular elements and boundary edges.
//!
//! Elements reference nodes by global index; they own no geometry. Both
//! kinds are soft-deletable, like nodes, and are compacted away by the
//! mesh's reindex pass.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// A triangular element: three node indices, counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    index: usize,
    nodes: [usize; 3],
    is_deleted: bool,
}

impl Element {
    /// Creates a live element over the given node indices.
    #[must_use]
    pub const fn new(index: usize, nodes: [usize; 3]) -> Self {
        Self {
            index,
            nodes,
            is_deleted: false,
        }
    }

    /// The element's index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// The three node indices.
    #[must_use]
    pub const fn nodes(&self) -> [usize; 3] {
        self.nodes
    }

    /// The global index of the element's `i`-th node.
    ///
    /// # Panics
    ///
    /// Panics if `i > 2`.
    #[must_use]
    pub fn node(&self, i: usize) -> usize {
        self.nodes[i]
    }

    pub(crate) fn set_nodes(&mut self, nodes: [usize; 3]) {
        self.nodes = nodes;
    }

    /// Whether the element references the given node.
    #[must_use]
    pub fn contains_node(&self, node_index: usize) -> bool {
        self.nodes.contains(&node_index)
    }

    /// Replaces every reference to `old` with `new`. Returns whether any
    /// reference was replaced.
    pub(crate) fn replace_node(&mut self, old: usize, new: usize) -> bool {
        let mut replaced = false;
        for node in &mut self.nodes {
            if *node == old {
                *node = new;
                replaced = true;
            }
        }
        replaced
    }

    /// Whether the element has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Marks the element as deleted. Idempotent.
    pub(crate) fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// A boundary edge: two node indices on the mesh boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryElement {
    index: usize,
    nodes: [usize; 2],
    is_deleted: bool,
}

impl BoundaryElement {
    /// Creates a live boundary edge over the given node indices.
    #[must_use]
    pub const fn new(index: usize, nodes: [usize; 2]) -> Self {
        Self {
            index,
            nodes,
            is_deleted: false,
        }
    }

    /// The boundary edge's index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// The two node indices.
    #[must_use]
    pub const fn nodes(&self) -> [usize; 2] {
        self.nodes
    }

    pub(crate) fn set_nodes(&mut self, nodes: [usize; 2]) {
        self.nodes = nodes;
    }

    /// Whether the edge references the given node.
    #[must_use]
    pub fn contains_node(&self, node_index: usize) -> bool {
        self.nodes.contains(&node_index)
    }

    /// Replaces every reference to `old` with `new`. Returns whether any
    /// reference was replaced.
    pub(crate) fn replace_node(&mut self, old: usize, new: usize) -> bool {
        let mut replaced = false;
        for node in &mut self.nodes {
            if *node == old {
                *node = new;
                replaced = true;
            }
        }
        replaced
    }

    /// Whether the edge has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Marks the edge as deleted. Idempotent.
    pub(crate) fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}
