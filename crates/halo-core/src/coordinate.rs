//! Numeric coordinate abstraction shared by discrete and continuous spaces.
//!
//! One implementation of the bounds, partitioning, and buffer-zone logic
//! serves both integer grids (`i32`) and real-valued spaces (`f64`).

use std::fmt;
use std::ops::{Add, Sub};

/// A scalar coordinate component.
///
/// Implemented for `i32` (discrete grids) and `f64` (continuous spaces).
pub trait Coordinate:
    Copy
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
{
    /// The additive identity.
    const ZERO: Self;

    /// `true` for integer cell coordinates.
    const DISCRETE: bool;

    /// Convert a non-negative count (e.g. a buffer depth).
    fn from_usize(v: usize) -> Self;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow from `f64`. Integer coordinates round to nearest.
    fn from_f64(v: f64) -> Self;

    /// Boundary `index` of `parts` equal slices of `[origin, origin + extent)`.
    ///
    /// `partition(o, e, 0, p) == o` and `partition(o, e, p, p) == o + e`
    /// exactly, and every interior boundary is computed by the same
    /// expression from both neighboring slices, so slices tile the box
    /// without gaps or overlaps.
    fn partition(origin: Self, extent: Self, index: usize, parts: usize) -> Self;

    /// Map `self` periodically into `[origin, origin + extent)`.
    fn wrap(self, origin: Self, extent: Self) -> Self;

    /// Largest value still inside the half-open `[origin, origin + extent)`.
    fn last_inside(origin: Self, extent: Self) -> Self;
}

impl Coordinate for i32 {
    const ZERO: Self = 0;
    const DISCRETE: bool = true;

    fn from_usize(v: usize) -> Self {
        i32::try_from(v).unwrap_or(i32::MAX)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Self {
        v.round() as i32
    }

    fn partition(origin: Self, extent: Self, index: usize, parts: usize) -> Self {
        if parts == 0 {
            return origin;
        }
        let num = i64::from(extent) * index as i64;
        origin + num.div_euclid(parts as i64) as i32
    }

    fn wrap(self, origin: Self, extent: Self) -> Self {
        if extent <= 0 {
            return self;
        }
        origin + (self - origin).rem_euclid(extent)
    }

    fn last_inside(origin: Self, extent: Self) -> Self {
        origin + extent - 1
    }
}

impl Coordinate for f64 {
    const ZERO: Self = 0.0;
    const DISCRETE: bool = false;

    fn from_usize(v: usize) -> Self {
        v as f64
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn partition(origin: Self, extent: Self, index: usize, parts: usize) -> Self {
        if parts == 0 || index == 0 {
            return origin;
        }
        if index >= parts {
            return origin + extent;
        }
        origin + (index as f64 / parts as f64) * extent
    }

    fn wrap(self, origin: Self, extent: Self) -> Self {
        if extent <= 0.0 {
            return self;
        }
        let v = origin + (self - origin).rem_euclid(extent);
        // rem_euclid can round up to exactly `extent` for tiny negatives.
        if v >= origin + extent {
            Self::last_inside(origin, extent)
        } else {
            v
        }
    }

    fn last_inside(origin: Self, extent: Self) -> Self {
        (origin + extent).next_down()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ── Partition tests ─────────────────────────────────────────

    #[test]
    fn integer_partition_uneven_extent() {
        let bounds: Vec<i32> = (0..=3).map(|i| i32::partition(0, 10, i, 3)).collect();
        assert_eq!(bounds, vec![0, 3, 6, 10]);
    }

    #[test]
    fn real_partition_endpoints_exact() {
        assert_eq!(f64::partition(-1.5, 7.0, 0, 3), -1.5);
        assert_eq!(f64::partition(-1.5, 7.0, 3, 3), 5.5);
    }

    // ── Wrap tests ──────────────────────────────────────────────

    #[test]
    fn integer_wrap() {
        assert_eq!((-1i32).wrap(0, 10), 9);
        assert_eq!(10i32.wrap(0, 10), 0);
        assert_eq!(23i32.wrap(5, 10), 13);
        assert_eq!(4i32.wrap(0, 10), 4);
    }

    #[test]
    fn real_wrap_stays_half_open() {
        assert_eq!((-0.5f64).wrap(0.0, 10.0), 9.5);
        assert_eq!(10.0f64.wrap(0.0, 10.0), 0.0);
        let tiny = (-1e-20f64).wrap(0.0, 10.0);
        assert!(tiny < 10.0);
    }

    #[test]
    fn last_inside_is_contained() {
        assert_eq!(i32::last_inside(2, 5), 6);
        let v = f64::last_inside(0.0, 1.0);
        assert!(v < 1.0 && v > 0.999);
    }

    proptest! {
        #[test]
        fn integer_partition_is_monotone(
            origin in -50i32..50,
            extent in 0i32..200,
            parts in 1usize..12,
        ) {
            let mut prev = i32::partition(origin, extent, 0, parts);
            prop_assert_eq!(prev, origin);
            for i in 1..=parts {
                let b = i32::partition(origin, extent, i, parts);
                prop_assert!(b >= prev);
                prev = b;
            }
            prop_assert_eq!(prev, origin + extent);
        }

        #[test]
        fn integer_wrap_lands_inside(v in -1000i32..1000, origin in -20i32..20, extent in 1i32..50) {
            let w = v.wrap(origin, extent);
            prop_assert!(w >= origin && w < origin + extent);
        }
    }
}
