//! Incremental Bowyer-Watson algorithm for 2D Delaunay triangulation.
//!
//! This is the generic (non-periodic) remesher the mutable mesh delegates
//! to: it consumes an indexed node set and returns a conforming
//! triangulation plus its boundary edges, with no notion of periodicity.
//! The periodic controller makes it produce seam-consistent output by
//! feeding it mirrored and halo nodes.
//!
//! # Algorithm Overview
//!
//! 1. **Super-triangle**: enclose the input bounding box in one large
//!    triangle whose vertices lie far outside the input.
//! 2. **Incremental insertion**: for each input point, excavate the cavity
//!    of triangles whose circumcircle contains it, then refill the cavity
//!    with a fan from the point to the cavity boundary.
//! 3. **Cleanup**: drop every triangle incident to a super-triangle vertex;
//!    boundary edges are the edges used by exactly one surviving triangle.
//!
//! Co-circular degeneracies are resolved with a symbolic perturbation
//! ([`cocircular_tie_break`]) instead of by insertion order, so degenerate
//! configurations triangulate the same way wherever they sit in the input
//! and wherever they sit in the plane. The periodic controller depends on
//! the latter: a degenerate quadrilateral and its mirror copy, a full
//! period apart, must pick corresponding diagonals or the seam cannot be
//! reconciled.
//!
//! # References
//!
//! - Bowyer, A. "Computing Dirichlet tessellations." *The Computer
//!   Journal* 24.2 (1981): 162-166.
//! - Watson, D.F. "Computing the n-dimensional Delaunay tessellation with
//!   application to Voronoi polytopes." *The Computer Journal* 24.2
//!   (1981): 167-172.
//! - de Berg, M., et al. *Computational Geometry: Algorithms and
//!   Applications.* 3rd ed. Springer-Verlag, 2008. Chapter 9.

#![forbid(unsafe_code)]

use thiserror::Error;

use crate::core::collections::{CavityBoundaryBuffer, CavityBuffer, FastHashMap};
use crate::geometry::point::Point2;
use crate::geometry::predicates::{
    cocircular_tie_break, in_circle, orientation, InCircle, Orientation,
};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during triangulation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TriangulationError {
    /// Fewer than three nodes were supplied.
    #[error("Cannot triangulate {found} nodes; at least 3 are required")]
    TooFewNodes {
        /// Number of nodes supplied.
        found: usize,
    },
    /// All supplied nodes are collinear, so no triangle exists.
    #[error("Cannot triangulate: all nodes are collinear")]
    AllNodesCollinear,
}

// =============================================================================
// OUTPUT TYPE
// =============================================================================

/// A conforming triangulation of an indexed point set.
///
/// Node references are the *input* indices (the first tuple component
/// passed to [`triangulate`]), not positions in the input slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Triangulation {
    /// Triangles, counter-clockwise.
    pub elements: Vec<[usize; 3]>,
    /// Edges of the convex hull, each used by exactly one triangle.
    pub boundary_edges: Vec<[usize; 2]>,
}

// =============================================================================
// TRIANGULATION
// =============================================================================

/// Triangulates the given indexed points.
///
/// # Errors
///
/// Returns [`TriangulationError::TooFewNodes`] for fewer than three input
/// points and [`TriangulationError::AllNodesCollinear`] when no
/// non-degenerate triangle can be formed.
pub fn triangulate(points: &[(usize, Point2)]) -> Result<Triangulation, TriangulationError> {
    let n = points.len();
    if n < 3 {
        return Err(TriangulationError::TooFewNodes { found: n });
    }

    // Local working copy; super-triangle vertices are appended at local
    // indices n, n+1, n+2.
    let mut coords: Vec<Point2> = points.iter().map(|(_, p)| *p).collect();

    let (min_x, max_x) = min_max(coords.iter().map(Point2::x));
    let (min_y, max_y) = min_max(coords.iter().map(Point2::y));
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let cx = (min_x + max_x) / 2.0;
    let cy = (min_y + max_y) / 2.0;

    coords.push(Point2::new(cx - 20.0 * span, cy - 10.0 * span));
    coords.push(Point2::new(cx + 20.0 * span, cy - 10.0 * span));
    coords.push(Point2::new(cx, cy + 20.0 * span));

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

    for local in 0..n {
        let point = coords[local];

        let mut cavity = find_cavity(&triangles, &coords, &point, false);
        if cavity.is_empty() {
            // Only a duplicate of an existing vertex survives the perturbed
            // test with an empty cavity; widen to every co-circular triangle
            // so the point still lands inside some cavity.
            cavity = find_cavity(&triangles, &coords, &point, true);
        }
        debug_assert!(!cavity.is_empty(), "inserted point lies in no circumcircle");

        let boundary = cavity_boundary(&triangles, &cavity);

        // Excavate, then refill with a fan from the new point.
        let mut removed = vec![false; triangles.len()];
        for &t in &cavity {
            removed[t] = true;
        }
        let mut kept: Vec<[usize; 3]> = triangles
            .iter()
            .zip(&removed)
            .filter(|(_, &r)| !r)
            .map(|(t, _)| *t)
            .collect();
        for [a, b] in boundary {
            let mut tri = [a, b, local];
            if orientation(&coords[tri[0]], &coords[tri[1]], &coords[tri[2]])
                == Orientation::Negative
            {
                tri.swap(1, 2);
            }
            kept.push(tri);
        }
        triangles = kept;
    }

    // Drop super-triangle-incident triangles and translate to input indices.
    let elements: Vec<[usize; 3]> = triangles
        .iter()
        .filter(|tri| tri.iter().all(|&v| v < n))
        .map(|tri| [points[tri[0]].0, points[tri[1]].0, points[tri[2]].0])
        .collect();
    if elements.is_empty() {
        return Err(TriangulationError::AllNodesCollinear);
    }

    // Hull edges are used by exactly one surviving triangle.
    let mut edge_use: FastHashMap<(usize, usize), ([usize; 2], usize)> = FastHashMap::default();
    for tri in triangles.iter().filter(|tri| tri.iter().all(|&v| v < n)) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = (a.min(b), a.max(b));
            let entry = edge_use.entry(key).or_insert(([a, b], 0));
            entry.1 += 1;
        }
    }
    let mut boundary_edges: Vec<[usize; 2]> = edge_use
        .values()
        .filter(|(_, count)| *count == 1)
        .map(|([a, b], _)| [points[*a].0, points[*b].0])
        .collect();
    boundary_edges.sort_unstable();

    Ok(Triangulation {
        elements,
        boundary_edges,
    })
}

/// Collects the indices of all triangles whose circumcircle contains the
/// point. Exact co-circularity is resolved by [`cocircular_tie_break`];
/// with `include_boundary`, every co-circular triangle counts instead.
fn find_cavity(
    triangles: &[[usize; 3]],
    coords: &[Point2],
    point: &Point2,
    include_boundary: bool,
) -> CavityBuffer {
    let mut cavity = CavityBuffer::new();
    for (t, tri) in triangles.iter().enumerate() {
        let (a, b, c) = (&coords[tri[0]], &coords[tri[1]], &coords[tri[2]]);
        let take = match in_circle(a, b, c, point) {
            InCircle::Inside => true,
            InCircle::Outside => false,
            InCircle::Boundary => include_boundary || cocircular_tie_break(a, b, c, point),
        };
        if take {
            cavity.push(t);
        }
    }
    cavity
}

/// Directed edges bounding the cavity: edges of cavity triangles not
/// shared with another cavity triangle. Directed CCW because the
/// triangles are, so the refill fan comes out CCW as well.
fn cavity_boundary(triangles: &[[usize; 3]], cavity: &CavityBuffer) -> CavityBoundaryBuffer {
    let mut boundary = CavityBoundaryBuffer::new();
    for &t in cavity {
        let tri = triangles[t];
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let shared = cavity.iter().any(|&other| {
                other != t && {
                    let o = triangles[other];
                    o.contains(&a) && o.contains(&b)
                }
            });
            if !shared {
                boundary.push([a, b]);
            }
        }
    }
    boundary
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
