//! Voronoi dual of a triangulated mesh.
//!
//! The Voronoi cell of an interior node is the polygon whose vertices
//! are the circumcenters of the elements containing the node, ordered by
//! angle around it. The dual edge between two adjacent nodes joins the
//! circumcenters of the two elements sharing the connecting edge.
//!
//! All geometry is evaluated in a local frame anchored at the node of
//! interest, with element vertices placed by a caller-supplied
//! displacement function. Passing the plain Euclidean difference gives
//! the ordinary planar dual; passing a periodic displacement gives the
//! dual on the cylinder, where cells straddling the seam come out with
//! the same shape as any other cell.

#![forbid(unsafe_code)]

use thiserror::Error;

use crate::core::mutable_mesh::MutableMesh;
use crate::geometry::point::Point2;
use crate::geometry::predicates::{circumcircle, CircumcircleError};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while evaluating the Voronoi dual.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum VoronoiError {
    /// Boundary nodes have unbounded cells; only interior nodes may be
    /// queried.
    #[error("Node {index} is on the mesh boundary; its Voronoi cell is unbounded")]
    BoundaryNode {
        /// The queried node index.
        index: usize,
    },
    /// The queried node is deleted or contained in no live element.
    #[error("Node {index} is deleted or belongs to no live element")]
    IsolatedNode {
        /// The queried node index.
        index: usize,
    },
    /// The two nodes are not joined by an interior mesh edge (an
    /// interior edge is shared by exactly two live elements).
    #[error("Nodes {a} and {b} are not joined by an interior edge ({shared} shared elements)")]
    NotAnInteriorEdge {
        /// First node index.
        a: usize,
        /// Second node index.
        b: usize,
        /// Live elements containing both nodes.
        shared: usize,
    },
    /// A containing element is degenerate and has no circumcenter.
    #[error(transparent)]
    Circumcircle(#[from] CircumcircleError),
}

// =============================================================================
// DUAL CONSTRUCTION
// =============================================================================

/// Circumcenter of a live element, in the local frame anchored at
/// `origin` under `displacement`.
fn local_circumcenter<F>(
    mesh: &MutableMesh,
    element_index: usize,
    origin: &Point2,
    displacement: &F,
) -> Result<Point2, VoronoiError>
where
    F: Fn(&Point2, &Point2) -> [f64; 2],
{
    let nodes = mesh.element(element_index).nodes();
    let local = nodes.map(|n| {
        let d = displacement(origin, &mesh.node(n).point());
        Point2::new(d[0], d[1])
    });
    let (center, _radius_squared) = circumcircle(&local[0], &local[1], &local[2])?;
    Ok(center)
}

/// The Voronoi cell of an interior node: circumcenters of its containing
/// elements, sorted counter-clockwise by angle, in the local frame
/// anchored at the node.
///
/// # Errors
///
/// [`VoronoiError::BoundaryNode`] for boundary nodes,
/// [`VoronoiError::IsolatedNode`] for deleted or element-free nodes, and
/// [`VoronoiError::Circumcircle`] if a containing element is degenerate.
pub fn voronoi_cell<F>(
    mesh: &MutableMesh,
    node_index: usize,
    displacement: F,
) -> Result<Vec<Point2>, VoronoiError>
where
    F: Fn(&Point2, &Point2) -> [f64; 2],
{
    let node = mesh.node(node_index);
    if node.is_deleted() {
        return Err(VoronoiError::IsolatedNode { index: node_index });
    }
    if node.is_boundary() {
        return Err(VoronoiError::BoundaryNode { index: node_index });
    }
    let origin = node.point();

    let mut vertices = Vec::new();
    for element in mesh.live_elements() {
        if element.contains_node(node_index) {
            vertices.push(local_circumcenter(
                mesh,
                element.index(),
                &origin,
                &displacement,
            )?);
        }
    }
    if vertices.is_empty() {
        return Err(VoronoiError::IsolatedNode { index: node_index });
    }

    vertices.sort_by(|a, b| a.y().atan2(a.x()).total_cmp(&b.y().atan2(b.x())));
    Ok(vertices)
}

/// Area of the Voronoi cell of an interior node (shoelace formula over
/// the angle-sorted circumcenters).
///
/// # Errors
///
/// As for [`voronoi_cell`].
pub fn voronoi_area<F>(
    mesh: &MutableMesh,
    node_index: usize,
    displacement: F,
) -> Result<f64, VoronoiError>
where
    F: Fn(&Point2, &Point2) -> [f64; 2],
{
    let cell = voronoi_cell(mesh, node_index, displacement)?;
    let mut twice_area = 0.0;
    for i in 0..cell.len() {
        let a = &cell[i];
        let b = &cell[(i + 1) % cell.len()];
        twice_area += a.x() * b.y() - b.x() * a.y();
    }
    Ok(twice_area.abs() / 2.0)
}

/// Perimeter of the Voronoi cell of an interior node.
///
/// # Errors
///
/// As for [`voronoi_cell`].
pub fn voronoi_perimeter<F>(
    mesh: &MutableMesh,
    node_index: usize,
    displacement: F,
) -> Result<f64, VoronoiError>
where
    F: Fn(&Point2, &Point2) -> [f64; 2],
{
    let cell = voronoi_cell(mesh, node_index, displacement)?;
    let mut perimeter = 0.0;
    for i in 0..cell.len() {
        let a = &cell[i];
        let b = &cell[(i + 1) % cell.len()];
        perimeter += a.distance_to(b);
    }
    Ok(perimeter)
}

/// Length of the Voronoi edge dual to the mesh edge `a`-`b`: the
/// distance between the circumcenters of the two elements sharing the
/// edge, evaluated in the frame anchored at `a`.
///
/// # Errors
///
/// [`VoronoiError::NotAnInteriorEdge`] unless exactly two live elements
/// contain both nodes; [`VoronoiError::Circumcircle`] if either is
/// degenerate.
pub fn voronoi_edge_length<F>(
    mesh: &MutableMesh,
    a: usize,
    b: usize,
    displacement: F,
) -> Result<f64, VoronoiError>
where
    F: Fn(&Point2, &Point2) -> [f64; 2],
{
    let shared: Vec<usize> = mesh
        .live_elements()
        .filter(|e| e.contains_node(a) && e.contains_node(b))
        .map(|e| e.index())
        .collect();
    if shared.len() != 2 {
        return Err(VoronoiError::NotAnInteriorEdge {
            a,
            b,
            shared: shared.len(),
        });
    }

    let origin = mesh.node(a).point();
    let first = local_circumcenter(mesh, shared[0], &origin, &displacement)?;
    let second = local_circumcenter(mesh, shared[1], &origin, &displacement)?;
    Ok(first.distance_to(&second))
}
