//! Mesh nodes: a 2D position with a stable integer index.
//!
//! Nodes are soft-deletable: deletion marks the node and pushes its index
//! onto the owning mesh's free list for later reuse, matching the
//! arena-with-tombstones storage of [`crate::core::mutable_mesh`].

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::geometry::point::Point2;

/// A mesh node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    index: usize,
    point: Point2,
    is_deleted: bool,
    is_boundary: bool,
}

impl Node {
    /// Creates a live, non-boundary node.
    #[must_use]
    pub const fn new(index: usize, point: Point2) -> Self {
        Self {
            index,
            point,
            is_deleted: false,
            is_boundary: false,
        }
    }

    /// The node's global index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// The node's position.
    #[must_use]
    pub const fn point(&self) -> Point2 {
        self.point
    }

    pub(crate) fn set_point(&mut self, point: Point2) {
        self.point = point;
    }

    /// Whether the node has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Marks the node as deleted. Idempotent.
    pub(crate) fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }

    /// Whether the node lies on the mesh boundary (set by the remesher).
    #[must_use]
    pub const fn is_boundary(&self) -> bool {
        self.is_boundary
    }

    pub(crate) fn set_boundary(&mut self, is_boundary: bool) {
        self.is_boundary = is_boundary;
    }
}
