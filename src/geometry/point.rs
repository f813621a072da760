//! A concrete 2D point type used throughout the mesh.
//!
//! The mesh domain is two-dimensional by construction (a cylinder is a
//! one-periodic 2D surface), so coordinates are plain `f64` pairs rather
//! than generic scalars. Points carry no identity; node identity lives in
//! [`crate::core::node::Node`].

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during point validation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PointValidationError {
    /// A coordinate value is not finite (NaN or infinite).
    #[error("Invalid coordinate on axis {axis}: {value}")]
    InvalidCoordinate {
        /// Axis of the offending coordinate (0 = x, 1 = y).
        axis: usize,
        /// The offending value.
        value: f64,
    },
}

// =============================================================================
// POINT TYPE
// =============================================================================

/// A point in 2D Euclidean space.
///
/// # Examples
///
/// ```rust
/// use cylmesh::geometry::point::Point2;
///
/// let p = Point2::new(1.0, 2.0);
/// assert_eq!(p.x(), 1.0);
/// assert_eq!(p.coords(), [1.0, 2.0]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    x: f64,
    y: f64,
}

impl Point2 {
    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The x-coordinate (axis 0, the periodic axis by convention).
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// The y-coordinate (axis 1).
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Coordinates as an array indexed by axis.
    #[must_use]
    pub const fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Returns the coordinate on the given axis.
    ///
    /// # Panics
    ///
    /// Panics if `axis > 1`.
    #[must_use]
    pub fn coord(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => panic!("axis {axis} out of range for a 2D point"),
        }
    }

    /// Returns this point translated by `(dx, dy)`.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point (no periodic wrap; see
    /// [`crate::geometry::periodic`] for the wrap-aware version).
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Checks that both coordinates are finite.
    ///
    /// # Errors
    ///
    /// Returns [`PointValidationError::InvalidCoordinate`] naming the first
    /// non-finite axis.
    pub fn validate(&self) -> Result<(), PointValidationError> {
        for (axis, value) in self.coords().into_iter().enumerate() {
            if !value.is_finite() {
                return Err(PointValidationError::InvalidCoordinate { axis, value });
            }
        }
        Ok(())
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(coords: [f64; 2]) -> Self {
        Self::new(coords[0], coords[1])
    }
}

impl From<Point2> for [f64; 2] {
    fn from(point: Point2) -> Self {
        point.coords()
    }
}
