//! A mutable 2D triangular mesh with soft deletion and index reuse.
//!
//! Nodes, elements, and boundary elements live in arena-style vectors
//! indexed by stable integer handles. Deletion marks an entity and parks
//! its index on a free list for reuse; [`MutableMesh::reindex`] compacts
//! the arenas and reports the old→new translation through a
//! [`NodeMap`](crate::core::node_map::NodeMap).
//!
//! Remeshing delegates to the generic Delaunay remesher in
//! [`crate::core::algorithms::bowyer_watson`]: elements and boundary
//! elements are rebuilt wholesale from the live node set, node indices are
//! left untouched. Callers must still treat the remesh map as
//! authoritative rather than assuming the identity.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::bowyer_watson::{triangulate, TriangulationError};
use crate::core::collections::{FastHashMap, FastHashSet};
use crate::core::element::{BoundaryElement, Element};
use crate::core::node::Node;
use crate::core::node_map::NodeMap;
use crate::geometry::point::{Point2, PointValidationError};
use crate::geometry::predicates::{circumcircle, orientation, Orientation};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during mesh mutation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MeshError {
    /// The supplied point has a non-finite coordinate.
    #[error("Invalid point: {source}")]
    InvalidPoint {
        /// The underlying validation error.
        #[source]
        source: PointValidationError,
    },
    /// The targeted node is marked as deleted.
    #[error("Node {index} is deleted")]
    NodeIsDeleted {
        /// The targeted node index.
        index: usize,
    },
    /// A dry-run node move would invert or degenerate a containing element.
    #[error("Moving node {node} would invert element {element}")]
    ElementWouldInvert {
        /// The element that would lose positive orientation.
        element: usize,
        /// The node being moved.
        node: usize,
    },
    /// An extent query was made on a mesh with no live nodes.
    #[error("Mesh has no live nodes")]
    NoLiveNodes,
    /// A live element references a deleted node (internal corruption).
    #[error("Live element {element} references deleted node {node}")]
    DanglingNodeReference {
        /// The corrupt element index.
        element: usize,
        /// The deleted node it references.
        node: usize,
    },
}

impl From<PointValidationError> for MeshError {
    fn from(source: PointValidationError) -> Self {
        Self::InvalidPoint { source }
    }
}

// =============================================================================
// MUTABLE MESH
// =============================================================================

/// A mutable triangular mesh over 2D nodes.
///
/// # Examples
///
/// ```rust
/// use cylmesh::core::mutable_mesh::MutableMesh;
/// use cylmesh::core::node_map::NodeMap;
/// use cylmesh::geometry::point::Point2;
///
/// let mut mesh = MutableMesh::new();
/// mesh.add_node(Point2::new(0.0, 0.0));
/// mesh.add_node(Point2::new(1.0, 0.0));
/// mesh.add_node(Point2::new(0.5, 1.0));
///
/// let mut map = NodeMap::new(0);
/// mesh.remesh(&mut map).unwrap();
/// assert_eq!(mesh.num_elements(), 1);
/// assert_eq!(mesh.num_boundary_elements(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MutableMesh {
    nodes: Vec<Node>,
    elements: Vec<Element>,
    boundary_elements: Vec<BoundaryElement>,
    deleted_node_indices: Vec<usize>,
    deleted_element_indices: Vec<usize>,
    deleted_boundary_element_indices: Vec<usize>,
}

impl MutableMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Counts and accessors
    // -------------------------------------------------------------------------

    /// Total node slots, including deleted ones.
    #[must_use]
    pub fn num_all_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_deleted()).count()
    }

    /// Total element slots, including deleted ones.
    #[must_use]
    pub fn num_all_elements(&self) -> usize {
        self.elements.len()
    }

    /// Number of live elements.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.elements.iter().filter(|e| !e.is_deleted()).count()
    }

    /// Total boundary-element slots, including deleted ones.
    #[must_use]
    pub fn num_all_boundary_elements(&self) -> usize {
        self.boundary_elements.len()
    }

    /// Number of live boundary elements.
    #[must_use]
    pub fn num_boundary_elements(&self) -> usize {
        self.boundary_elements
            .iter()
            .filter(|b| !b.is_deleted())
            .count()
    }

    /// The node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// The element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn element(&self, index: usize) -> &Element {
        &self.elements[index]
    }

    /// The boundary element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn boundary_element(&self, index: usize) -> &BoundaryElement {
        &self.boundary_elements[index]
    }

    /// All node slots, deleted ones included.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All element slots, deleted ones included.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// All boundary-element slots, deleted ones included.
    #[must_use]
    pub fn boundary_elements(&self) -> &[BoundaryElement] {
        &self.boundary_elements
    }

    /// Iterator over live nodes.
    pub fn live_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.is_deleted())
    }

    /// Iterator over live elements.
    pub fn live_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| !e.is_deleted())
    }

    /// Iterator over live boundary elements.
    pub fn live_boundary_elements(&self) -> impl Iterator<Item = &BoundaryElement> {
        self.boundary_elements.iter().filter(|b| !b.is_deleted())
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Adds a node, reusing a deleted slot when one is available. Returns
    /// the node's index.
    pub fn add_node(&mut self, point: Point2) -> usize {
        if let Some(index) = self.deleted_node_indices.pop() {
            self.nodes[index] = Node::new(index, point);
            index
        } else {
            let index = self.nodes.len();
            self.nodes.push(Node::new(index, point));
            index
        }
    }

    /// Adds an element over the given nodes, reusing a deleted slot when
    /// one is available. Returns the element's index.
    pub fn add_element(&mut self, nodes: [usize; 3]) -> usize {
        if let Some(index) = self.deleted_element_indices.pop() {
            self.elements[index] = Element::new(index, nodes);
            index
        } else {
            let index = self.elements.len();
            self.elements.push(Element::new(index, nodes));
            index
        }
    }

    /// Adds a boundary element over the given nodes, reusing a deleted
    /// slot when one is available. Returns its index.
    pub fn add_boundary_element(&mut self, nodes: [usize; 2]) -> usize {
        if let Some(index) = self.deleted_boundary_element_indices.pop() {
            self.boundary_elements[index] = BoundaryElement::new(index, nodes);
            index
        } else {
            let index = self.boundary_elements.len();
            self.boundary_elements.push(BoundaryElement::new(index, nodes));
            index
        }
    }

    /// Moves the node at `index` to `point`.
    ///
    /// With `concrete_move == false` this is a dry run: the move is
    /// checked for validity (no containing element may lose positive
    /// orientation) and nothing is mutated. With `concrete_move == true`
    /// the position is committed unchecked; callers wanting the check run
    /// the dry run first.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidPoint`] for non-finite coordinates,
    /// [`MeshError::NodeIsDeleted`] for a deleted target, and
    /// [`MeshError::ElementWouldInvert`] when the dry run detects an
    /// element inversion.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_node(
        &mut self,
        index: usize,
        point: Point2,
        concrete_move: bool,
    ) -> Result<(), MeshError> {
        point.validate()?;
        if self.nodes[index].is_deleted() {
            return Err(MeshError::NodeIsDeleted { index });
        }

        if concrete_move {
            self.nodes[index].set_point(point);
            return Ok(());
        }

        for element in self.live_elements() {
            if !element.contains_node(index) {
                continue;
            }
            let positions = element.nodes().map(|n| {
                if n == index {
                    point
                } else {
                    self.nodes[n].point()
                }
            });
            if orientation(&positions[0], &positions[1], &positions[2]) != Orientation::Positive {
                return Err(MeshError::ElementWouldInvert {
                    element: element.index(),
                    node: index,
                });
            }
        }
        Ok(())
    }

    /// Soft-deletes the node at `index` together with every live element
    /// and boundary element containing it. Idempotent: deleting an
    /// already-deleted node is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn delete_node(&mut self, index: usize) {
        if self.nodes[index].is_deleted() {
            return;
        }
        self.nodes[index].mark_deleted();
        self.deleted_node_indices.push(index);

        for element in &mut self.elements {
            if !element.is_deleted() && element.contains_node(index) {
                element.mark_deleted();
                self.deleted_element_indices.push(element.index());
            }
        }
        for boundary_element in &mut self.boundary_elements {
            if !boundary_element.is_deleted() && boundary_element.contains_node(index) {
                boundary_element.mark_deleted();
                self.deleted_boundary_element_indices
                    .push(boundary_element.index());
            }
        }
    }

    /// Soft-deletes an element. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn delete_element(&mut self, index: usize) {
        if !self.elements[index].is_deleted() {
            self.elements[index].mark_deleted();
            self.deleted_element_indices.push(index);
        }
    }

    /// Soft-deletes a boundary element. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn delete_boundary_element(&mut self, index: usize) {
        if !self.boundary_elements[index].is_deleted() {
            self.boundary_elements[index].mark_deleted();
            self.deleted_boundary_element_indices.push(index);
        }
    }

    pub(crate) fn element_mut(&mut self, index: usize) -> &mut Element {
        &mut self.elements[index]
    }

    pub(crate) fn boundary_element_mut(&mut self, index: usize) -> &mut BoundaryElement {
        &mut self.boundary_elements[index]
    }

    // -------------------------------------------------------------------------
    // Extents
    // -------------------------------------------------------------------------

    /// Minimum and maximum live-node coordinate on the given axis.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NoLiveNodes`] on a mesh without live nodes.
    ///
    /// # Panics
    ///
    /// Panics if `axis > 1`.
    pub fn extremes(&self, axis: usize) -> Result<(f64, f64), MeshError> {
        let mut result: Option<(f64, f64)> = None;
        for node in self.live_nodes() {
            let value = node.point().coord(axis);
            result = Some(match result {
                Some((lo, hi)) => (lo.min(value), hi.max(value)),
                None => (value, value),
            });
        }
        result.ok_or(MeshError::NoLiveNodes)
    }

    /// Extent (max minus min) of live nodes on the given axis; `0` for an
    /// empty mesh.
    #[must_use]
    pub fn width(&self, axis: usize) -> f64 {
        self.extremes(axis).map_or(0.0, |(lo, hi)| hi - lo)
    }

    // -------------------------------------------------------------------------
    // Remeshing and reindexing
    // -------------------------------------------------------------------------

    /// Rebuilds elements and boundary elements from the live node set via
    /// Delaunay triangulation.
    ///
    /// `map` is resized to the current node-slot count and populated:
    /// identity for live nodes (this remesher preserves node indices),
    /// deleted marks for tombstoned slots.
    ///
    /// # Errors
    ///
    /// Propagates [`TriangulationError`] from the remesher.
    pub fn remesh(&mut self, map: &mut NodeMap) -> Result<(), TriangulationError> {
        map.resize(self.nodes.len());
        for node in &self.nodes {
            if node.is_deleted() {
                map.set_deleted(node.index());
            }
        }

        let live: Vec<(usize, Point2)> = self
            .live_nodes()
            .map(|n| (n.index(), n.point()))
            .collect();
        let triangulation = triangulate(&live)?;

        self.elements.clear();
        self.deleted_element_indices.clear();
        for (index, nodes) in triangulation.elements.iter().enumerate() {
            self.elements.push(Element::new(index, *nodes));
        }

        self.boundary_elements.clear();
        self.deleted_boundary_element_indices.clear();
        for node in &mut self.nodes {
            node.set_boundary(false);
        }
        for (index, nodes) in triangulation.boundary_edges.iter().enumerate() {
            self.boundary_elements
                .push(BoundaryElement::new(index, *nodes));
            self.nodes[nodes[0]].set_boundary(true);
            self.nodes[nodes[1]].set_boundary(true);
        }
        Ok(())
    }

    /// Compacts away soft-deleted nodes, elements, and boundary elements,
    /// renumbering everything densely. `map` receives the old→new node
    /// translation with deleted marks.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DanglingNodeReference`] if a live element
    /// references a deleted node, which indicates internal corruption.
    pub fn reindex(&mut self, map: &mut NodeMap) -> Result<(), MeshError> {
        map.resize(self.nodes.len());
        let mut next = 0;
        for node in &self.nodes {
            if node.is_deleted() {
                map.set_deleted(node.index());
            } else {
                map.set_new_index(node.index(), next);
                next += 1;
            }
        }

        self.nodes.retain(|n| !n.is_deleted());
        for (new_index, node) in self.nodes.iter_mut().enumerate() {
            node.set_index(new_index);
        }
        self.deleted_node_indices.clear();

        self.elements.retain(|e| !e.is_deleted());
        for (new_index, element) in self.elements.iter_mut().enumerate() {
            let old_nodes = element.nodes();
            let mut new_nodes = [0usize; 3];
            for (slot, &old) in new_nodes.iter_mut().zip(&old_nodes) {
                *slot = map
                    .get_new_index(old)
                    .map_err(|_| MeshError::DanglingNodeReference {
                        element: element.index(),
                        node: old,
                    })?;
            }
            element.set_nodes(new_nodes);
            element.set_index(new_index);
        }
        self.deleted_element_indices.clear();

        self.boundary_elements.retain(|b| !b.is_deleted());
        for (new_index, boundary_element) in self.boundary_elements.iter_mut().enumerate() {
            let old_nodes = boundary_element.nodes();
            let mut new_nodes = [0usize; 2];
            for (slot, &old) in new_nodes.iter_mut().zip(&old_nodes) {
                *slot = map
                    .get_new_index(old)
                    .map_err(|_| MeshError::DanglingNodeReference {
                        element: boundary_element.index(),
                        node: old,
                    })?;
            }
            boundary_element.set_nodes(new_nodes);
            boundary_element.set_index(new_index);
        }
        self.deleted_boundary_element_indices.clear();

        Ok(())
    }

    /// Compacts only elements and boundary elements, leaving node slots
    /// and indices untouched.
    ///
    /// Used mid-remesh to flush elements deleted by the seam repair:
    /// node compaction at that point would invalidate the remesh
    /// session's node bookkeeping.
    pub(crate) fn flush_deleted_elements(&mut self) {
        self.elements.retain(|e| !e.is_deleted());
        for (new_index, element) in self.elements.iter_mut().enumerate() {
            element.set_index(new_index);
        }
        self.deleted_element_indices.clear();

        self.boundary_elements.retain(|b| !b.is_deleted());
        for (new_index, boundary_element) in self.boundary_elements.iter_mut().enumerate() {
            boundary_element.set_index(new_index);
        }
        self.deleted_boundary_element_indices.clear();
    }

    /// Recomputes node boundary flags from the live elements: a node is
    /// on the boundary when it touches an edge used by exactly one live
    /// element.
    ///
    /// The remesher sets the flags as a side effect, but surgery that
    /// rewires or deletes elements afterwards leaves them stale.
    pub(crate) fn refresh_boundary_flags(&mut self) {
        let mut edge_counts: FastHashMap<[usize; 2], usize> = FastHashMap::default();
        for element in self.elements.iter().filter(|e| !e.is_deleted()) {
            let [a, b, c] = element.nodes();
            for mut edge in [[a, b], [b, c], [c, a]] {
                edge.sort_unstable();
                *edge_counts.entry(edge).or_insert(0) += 1;
            }
        }

        let mut boundary_nodes: FastHashSet<usize> = FastHashSet::default();
        for (edge, count) in &edge_counts {
            if *count == 1 {
                boundary_nodes.insert(edge[0]);
                boundary_nodes.insert(edge[1]);
            }
        }

        for node in &mut self.nodes {
            if !node.is_deleted() {
                let index = node.index();
                node.set_boundary(boundary_nodes.contains(&index));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Validity
    // -------------------------------------------------------------------------

    /// Checks the empty-circumcircle property with plain Euclidean
    /// geometry: no live node may sit inside any live element's
    /// circumcircle by more than `tolerance`.
    #[must_use]
    pub fn check_voronoi(&self, tolerance: f64) -> bool {
        self.check_voronoi_with(|a, b| [b.x() - a.x(), b.y() - a.y()], tolerance)
    }

    /// Checks the empty-circumcircle property using the supplied
    /// displacement function, so a periodic mesh can run the same check
    /// with wraparound-aware geometry.
    ///
    /// Each element is measured in a local frame anchored at its first
    /// node; every other node is placed in that frame through
    /// `displacement` before the containment test.
    pub fn check_voronoi_with<F>(&self, displacement: F, tolerance: f64) -> bool
    where
        F: Fn(&Point2, &Point2) -> [f64; 2],
    {
        for element in self.live_elements() {
            let [n0, n1, n2] = element.nodes();
            let anchor = self.nodes[n0].point();
            let a = Point2::new(0.0, 0.0);
            let b = Point2::from(displacement(&anchor, &self.nodes[n1].point()));
            let c = Point2::from(displacement(&anchor, &self.nodes[n2].point()));

            let Ok((center, radius_squared)) = circumcircle(&a, &b, &c) else {
                return false;
            };
            let radius = radius_squared.sqrt();

            for node in self.live_nodes() {
                if element.contains_node(node.index()) {
                    continue;
                }
                let q = Point2::from(displacement(&anchor, &node.point()));
                if q.distance_to(&center) < radius - tolerance {
                    return false;
                }
            }
        }
        true
    }
}
