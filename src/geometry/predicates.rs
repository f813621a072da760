//! Geometric predicates for planar triangulation.
//!
//! This module contains the two fundamental predicates the remesher relies
//! on — triangle orientation and the in-circle test — plus the circumcircle
//! computation shared by the Voronoi dual and the mesh validity check.
//!
//! Determinants are written out directly for the 2D case. Degeneracy is
//! decided against a tolerance scaled by the magnitude of the determinant's
//! terms, so the predicates behave sensibly across coordinate scales.
//!
//! # References
//!
//! - Guibas, L. and Stolfi, J. "Primitives for the manipulation of general
//!   subdivisions and the computation of Voronoi diagrams." *ACM
//!   Transactions on Graphics* 4.2 (1985): 74-123.
//! - Shewchuk, J.R. "Adaptive precision floating-point arithmetic and fast
//!   robust geometric predicates." *Discrete & Computational Geometry* 18.3
//!   (1997): 305-363.
//! - Edelsbrunner, H. and Mücke, E.P. "Simulation of simplicity: a technique
//!   to cope with degenerate cases in geometric algorithms." *ACM
//!   Transactions on Graphics* 9.1 (1990): 66-104.

#![forbid(unsafe_code)]

use thiserror::Error;

use crate::geometry::point::Point2;

/// Relative tolerance for classifying a predicate determinant as zero.
pub const PREDICATE_TOLERANCE: f64 = 1e-12;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during circumcircle computation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CircumcircleError {
    /// The three points are collinear (or nearly so) and define no circle.
    #[error("Degenerate triangle: points are collinear (determinant {determinant})")]
    DegenerateTriangle {
        /// The near-zero orientation determinant.
        determinant: f64,
    },
}

// =============================================================================
// PREDICATE RESULT TYPES
// =============================================================================

/// Represents the orientation of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise winding (determinant < 0).
    Negative,
    /// Collinear points (determinant ≈ 0).
    Degenerate,
    /// Counter-clockwise winding (determinant > 0).
    Positive,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negative => write!(f, "NEGATIVE"),
            Self::Degenerate => write!(f, "DEGENERATE"),
            Self::Positive => write!(f, "POSITIVE"),
        }
    }
}

/// Represents the position of a point relative to a circumcircle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InCircle {
    /// The point is outside the circumcircle.
    Outside,
    /// The point is on the circumcircle (within numerical tolerance).
    Boundary,
    /// The point is strictly inside the circumcircle.
    Inside,
}

impl std::fmt::Display for InCircle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outside => write!(f, "OUTSIDE"),
            Self::Boundary => write!(f, "BOUNDARY"),
            Self::Inside => write!(f, "INSIDE"),
        }
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Computes the orientation of the triangle `(a, b, c)`.
///
/// Positive means counter-clockwise winding. The underlying determinant is
/// `(b - a) × (c - a)`, i.e. twice the signed area of the triangle.
#[must_use]
pub fn orientation(a: &Point2, b: &Point2, c: &Point2) -> Orientation {
    let t1 = (b.x() - a.x()) * (c.y() - a.y());
    let t2 = (b.y() - a.y()) * (c.x() - a.x());
    let det = t1 - t2;
    let scale = t1.abs() + t2.abs();

    if det.abs() <= PREDICATE_TOLERANCE * scale.max(1.0) {
        Orientation::Degenerate
    } else if det > 0.0 {
        Orientation::Positive
    } else {
        Orientation::Negative
    }
}

/// Classifies point `p` against the circumcircle of the triangle `(a, b, c)`.
///
/// The triangle must be counter-clockwise; for a clockwise triangle the
/// inside/outside classification is flipped. Uses the lifted 3×3
/// determinant form of the in-circle test.
#[must_use]
pub fn in_circle(a: &Point2, b: &Point2, c: &Point2, p: &Point2) -> InCircle {
    let (ax, ay) = (a.x() - p.x(), a.y() - p.y());
    let (bx, by) = (b.x() - p.x(), b.y() - p.y());
    let (cx, cy) = (c.x() - p.x(), c.y() - p.y());

    let a_lift = ax.mul_add(ax, ay * ay);
    let b_lift = bx.mul_add(bx, by * by);
    let c_lift = cx.mul_add(cx, cy * cy);

    let t1 = ax * (by * c_lift - cy * b_lift);
    let t2 = ay * (bx * c_lift - cx * b_lift);
    let t3 = a_lift * (bx * cy - cx * by);
    let det = t1 - t2 + t3;
    let scale = t1.abs() + t2.abs() + t3.abs();

    if det.abs() <= PREDICATE_TOLERANCE * scale.max(1.0) {
        InCircle::Boundary
    } else if det > 0.0 {
        InCircle::Inside
    } else {
        InCircle::Outside
    }
}

/// Breaks a co-circular [`in_circle`] tie by symbolic perturbation.
///
/// Conceptually the lifted weight of the lexicographically smallest of the
/// four points (ordered by `x`, then `y`) is lowered infinitesimally,
/// making the point set non-degenerate; the sign of the perturbed in-circle
/// determinant is then carried by the orientation cofactor of that point's
/// row. For a co-circular quadrilateral this selects the diagonal incident
/// to its lexicographically smallest vertex.
///
/// The decision depends only on the relative coordinate order of the four
/// points and on orientations of point triples, both of which are preserved
/// when all four points are translated by the same vector. The remesher
/// relies on that: mirrored copies of a degenerate configuration must
/// triangulate identically up to the translation.
///
/// Returns `true` when the perturbed `p` counts as strictly inside the
/// circumcircle of the counter-clockwise triangle `(a, b, c)`.
#[must_use]
pub fn cocircular_tie_break(a: &Point2, b: &Point2, c: &Point2, p: &Point2) -> bool {
    let points = [a, b, c, p];
    let mut smallest = 0;
    for (i, point) in points.iter().enumerate().skip(1) {
        let current = points[smallest];
        let ordering = point
            .x()
            .total_cmp(&current.x())
            .then(point.y().total_cmp(&current.y()));
        if ordering == std::cmp::Ordering::Less {
            smallest = i;
        }
    }

    match smallest {
        0 => orientation(b, c, p) == Orientation::Negative,
        1 => orientation(a, c, p) == Orientation::Positive,
        2 => orientation(a, b, p) == Orientation::Negative,
        _ => orientation(a, b, c) == Orientation::Positive,
    }
}

/// Computes the circumcircle of the triangle `(a, b, c)`.
///
/// Returns the circumcenter and the squared circumradius.
///
/// # Errors
///
/// Returns [`CircumcircleError::DegenerateTriangle`] if the points are
/// (nearly) collinear.
pub fn circumcircle(a: &Point2, b: &Point2, c: &Point2) -> Result<(Point2, f64), CircumcircleError> {
    // Solve in a frame anchored at `a` for numerical stability.
    let (bx, by) = (b.x() - a.x(), b.y() - a.y());
    let (cx, cy) = (c.x() - a.x(), c.y() - a.y());

    let d = 2.0 * (bx * cy - by * cx);
    let scale = (bx * cy).abs() + (by * cx).abs();
    if d.abs() <= PREDICATE_TOLERANCE * scale.max(1.0) {
        return Err(CircumcircleError::DegenerateTriangle { determinant: d });
    }

    let b_norm = bx.mul_add(bx, by * by);
    let c_norm = cx.mul_add(cx, cy * cy);
    let ux = (cy * b_norm - by * c_norm) / d;
    let uy = (bx * c_norm - cx * b_norm) / d;

    let center = Point2::new(a.x() + ux, a.y() + uy);
    let radius_squared = ux.mul_add(ux, uy * uy);
    Ok((center, radius_squared))
}
