//! Old-index → new-index translation maps.
//!
//! Both the remesher and the reindex step renumber nodes; a [`NodeMap`]
//! records where each old node index went, or that the node no longer
//! exists. The periodic remesh composes two of these maps into the one it
//! hands back to the caller, so external references (e.g. cell-to-node
//! associations in a tissue simulation) can be translated after the call.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur when querying a [`NodeMap`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NodeMapError {
    /// The queried node is marked as deleted in the map.
    #[error("Node {index} is marked as deleted in the map")]
    Deleted {
        /// The queried old index.
        index: usize,
    },
    /// The queried index is outside the map's range.
    #[error("Index {index} out of range for a map of size {len}")]
    OutOfRange {
        /// The queried old index.
        index: usize,
        /// The size of the map.
        len: usize,
    },
}

// =============================================================================
// NODE MAP
// =============================================================================

/// One entry of a [`NodeMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum MapEntry {
    /// The node survives under the given new index.
    Mapped(usize),
    /// The node was deleted.
    Deleted,
}

/// An injective partial map from old node indices to new node indices,
/// with deleted-node marking.
///
/// # Examples
///
/// ```rust
/// use cylmesh::core::node_map::NodeMap;
///
/// let mut map = NodeMap::new(3);
/// assert!(map.is_identity_map());
/// map.set_deleted(1);
/// map.set_new_index(2, 1);
/// assert!(map.is_deleted(1));
/// assert_eq!(map.get_new_index(2).unwrap(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMap {
    entries: Vec<MapEntry>,
}

impl NodeMap {
    /// Creates an identity map of the given size.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            entries: (0..size).map(MapEntry::Mapped).collect(),
        }
    }

    /// Resizes the map to `size` entries, resetting it to the identity.
    pub fn resize(&mut self, size: usize) {
        self.entries.clear();
        self.entries.extend((0..size).map(MapEntry::Mapped));
    }

    /// Resets every entry to map to itself.
    pub fn reset_to_identity(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            *entry = MapEntry::Mapped(i);
        }
    }

    /// Marks the node at `index` as deleted.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_deleted(&mut self, index: usize) {
        self.entries[index] = MapEntry::Deleted;
    }

    /// Whether the node at `index` is marked as deleted.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn is_deleted(&self, index: usize) -> bool {
        matches!(self.entries[index], MapEntry::Deleted)
    }

    /// Records that old index `old_index` maps to `new_index`.
    ///
    /// # Panics
    ///
    /// Panics if `old_index` is out of range.
    pub fn set_new_index(&mut self, old_index: usize, new_index: usize) {
        self.entries[old_index] = MapEntry::Mapped(new_index);
    }

    /// Returns the new index for `old_index`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeMapError::Deleted`] if the node is marked deleted, or
    /// [`NodeMapError::OutOfRange`] if `old_index` is beyond the map.
    pub fn get_new_index(&self, old_index: usize) -> Result<usize, NodeMapError> {
        match self.entries.get(old_index) {
            Some(MapEntry::Mapped(new_index)) => Ok(*new_index),
            Some(MapEntry::Deleted) => Err(NodeMapError::Deleted { index: old_index }),
            None => Err(NodeMapError::OutOfRange {
                index: old_index,
                len: self.entries.len(),
            }),
        }
    }

    /// Whether every entry maps to itself (no deletions, no moves).
    #[must_use]
    pub fn is_identity_map(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, entry)| matches!(entry, MapEntry::Mapped(j) if *j == i))
    }

    /// Number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
