//! Periodic coordinate helpers for the cylindrical domain.
//!
//! The domain is periodic along axis 0 with period `width`: the line
//! `x = 0` is identified with `x = width` (the seam). These helpers keep
//! coordinates inside the fundamental domain `[0, width)` and compute
//! shortest-path displacements across the seam.
//!
//! Displacements must be exact to floating-point precision: physical
//! forces in a simulation layered on this mesh derive directly from them.

#![forbid(unsafe_code)]

use crate::geometry::point::Point2;

/// Reduces `x` into the fundamental domain `[0, width)`.
///
/// Handles arbitrarily far out-of-domain values. `rem_euclid` can return
/// exactly `width` when `x` is a tiny negative value, so that case is
/// folded back to `0`.
#[must_use]
pub fn wrap_coordinate(x: f64, width: f64) -> f64 {
    debug_assert!(width > 0.0);
    let wrapped = x.rem_euclid(width);
    if wrapped >= width { 0.0 } else { wrapped }
}

/// Applies a single-period shift to `x`: subtract `width` if `x >= width`,
/// add `width` if `x < 0`.
///
/// This is the incremental variant used when repositioning a node: a node
/// move is at most one period out of range, and a single shift preserves
/// the exact fractional coordinate.
#[must_use]
pub fn shift_into_domain(x: f64, width: f64) -> f64 {
    debug_assert!(width > 0.0);
    let shifted = if x >= width {
        x - width
    } else if x < 0.0 {
        // Can round to exactly `width` for tiny negative x.
        x + width
    } else {
        return x;
    };
    if shifted >= width { 0.0 } else { shifted }
}

/// Computes the shortest displacement vector from `a` to `b`, accounting
/// for the periodic wraparound on axis 0.
///
/// Both x-coordinates are first reduced into `[0, width)`; if the naive
/// difference exceeds half the period in either direction, the
/// measurement is taken the other way around the cylinder. The
/// y-component is the ordinary difference.
///
/// The returned x-component always lies in `[-width/2, width/2]`.
#[must_use]
pub fn periodic_displacement(a: &Point2, b: &Point2, width: f64) -> [f64; 2] {
    debug_assert!(width > 0.0);

    let ax = wrap_coordinate(a.x(), width);
    let bx = wrap_coordinate(b.x(), width);

    let mut dx = bx - ax;
    if dx > width / 2.0 {
        dx -= width;
    }
    if dx < -width / 2.0 {
        dx += width;
    }

    [dx, b.y() - a.y()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_coordinate() {
        assert_relative_eq!(wrap_coordinate(0.5, 2.0), 0.5);
        assert_relative_eq!(wrap_coordinate(2.5, 2.0), 0.5);
        assert_relative_eq!(wrap_coordinate(-0.5, 2.0), 1.5);
        assert_relative_eq!(wrap_coordinate(-4.0, 2.0), 0.0);
        assert_relative_eq!(wrap_coordinate(2.0, 2.0), 0.0);
    }

    #[test]
    fn test_wrap_coordinate_tiny_negative() {
        // rem_euclid(-1e-18, 1.0) rounds to 1.0; the result must still be
        // strictly less than the period.
        let wrapped = wrap_coordinate(-1e-18, 1.0);
        assert!((0.0..1.0).contains(&wrapped));
    }

    #[test]
    fn test_shift_into_domain() {
        assert_relative_eq!(shift_into_domain(2.5, 2.0), 0.5);
        assert_relative_eq!(shift_into_domain(-0.25, 2.0), 1.75);
        assert_relative_eq!(shift_into_domain(1.0, 2.0), 1.0);
        assert_relative_eq!(shift_into_domain(0.0, 2.0), 0.0);
    }

    #[test]
    fn test_shift_into_domain_tiny_negative() {
        let shifted = shift_into_domain(-1e-18, 1.0);
        assert!((0.0..1.0).contains(&shifted));
    }

    #[test]
    fn test_displacement_straight() {
        let a = Point2::new(1.0, 0.0);
        let b = Point2::new(2.0, 3.0);
        let d = periodic_displacement(&a, &b, 6.0);
        assert_relative_eq!(d[0], 1.0);
        assert_relative_eq!(d[1], 3.0);
    }

    #[test]
    fn test_displacement_wraps_across_seam() {
        // Short way from x=5.5 to x=0.5 on a width-6 cylinder is +1, not -5.
        let a = Point2::new(5.5, 0.0);
        let b = Point2::new(0.5, 0.0);
        let d = periodic_displacement(&a, &b, 6.0);
        assert_relative_eq!(d[0], 1.0);

        let back = periodic_displacement(&b, &a, 6.0);
        assert_relative_eq!(back[0], -1.0);
    }

    #[test]
    fn test_displacement_out_of_domain_inputs() {
        // Inputs are reduced into the domain before differencing.
        let a = Point2::new(6.5, 1.0);
        let b = Point2::new(-5.5, 2.0);
        let d = periodic_displacement(&a, &b, 6.0);
        assert_relative_eq!(d[0], 0.0);
        assert_relative_eq!(d[1], 1.0);
    }

    #[test]
    fn test_displacement_halfway_in_range() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 0.0);
        let d = periodic_displacement(&a, &b, 6.0);
        assert!(d[0].abs() <= 3.0);
    }
}
