//! Axis-aligned boxes described by an origin and an extent.

use crate::coordinate::Coordinate;
use crate::error::ConfigError;
use crate::id::Point;
use std::fmt;

/// An axis-aligned N-dimensional box: `origin[i] <= x[i] < origin[i] + extent[i]`.
///
/// Immutable once built. Every extent is non-negative. Containment is
/// half-open so that adjacent boxes produced by a partition never both
/// claim a point on their shared face.
///
/// # Examples
///
/// ```
/// use halo_core::GridDimensions;
///
/// let dims = GridDimensions::new([0, 0], [10, 5]).unwrap();
/// assert!(dims.contains(&[9, 4]));
/// assert!(!dims.contains(&[10, 4]));
/// assert_eq!(dims.volume(), 50.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GridDimensions<C: Coordinate> {
    origin: Point<C>,
    extents: Point<C>,
}

impl<C: Coordinate> GridDimensions<C> {
    /// Build a box from its origin and extent vectors.
    ///
    /// Returns `Err(ConfigError::DimensionMismatch)` if the vectors differ in
    /// length and `Err(ConfigError::NegativeExtent)` for a negative extent.
    pub fn new(
        origin: impl IntoIterator<Item = C>,
        extents: impl IntoIterator<Item = C>,
    ) -> Result<Self, ConfigError> {
        let origin: Point<C> = origin.into_iter().collect();
        let extents: Point<C> = extents.into_iter().collect();
        if origin.len() != extents.len() {
            return Err(ConfigError::DimensionMismatch {
                what: "extents",
                expected: origin.len(),
                got: extents.len(),
            });
        }
        for (dim, &e) in extents.iter().enumerate() {
            if e < C::ZERO {
                return Err(ConfigError::NegativeExtent {
                    dim,
                    extent: e.to_string(),
                });
            }
        }
        Ok(Self { origin, extents })
    }

    /// Number of dimensions.
    pub fn dimension_count(&self) -> usize {
        self.origin.len()
    }

    /// Origin vector.
    pub fn origin(&self) -> &[C] {
        &self.origin
    }

    /// Extent vector.
    pub fn extents(&self) -> &[C] {
        &self.extents
    }

    /// Origin in dimension `i`.
    pub fn origin_at(&self, i: usize) -> C {
        self.origin[i]
    }

    /// Extent in dimension `i`.
    pub fn extent_at(&self, i: usize) -> C {
        self.extents[i]
    }

    /// Exclusive upper bound `origin + extent` in dimension `i`.
    pub fn upper_at(&self, i: usize) -> C {
        self.origin[i] + self.extents[i]
    }

    /// Whether `pt` lies in the half-open box.
    ///
    /// A point with the wrong number of components is never contained.
    pub fn contains(&self, pt: &[C]) -> bool {
        pt.len() == self.dimension_count()
            && pt
                .iter()
                .enumerate()
                .all(|(i, &v)| v >= self.origin[i] && v < self.upper_at(i))
    }

    /// Product of the extents.
    pub fn volume(&self) -> f64 {
        self.extents.iter().map(|e| e.to_f64()).product()
    }
}

impl<C: Coordinate> fmt::Display for GridDimensions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "origin: [")?;
        for (i, v) in self.origin.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "], extents: [")?;
        for (i, v) in self.extents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}
