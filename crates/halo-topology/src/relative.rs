//! Enumeration of integer offset vectors within an N-D box.

use halo_core::{ConfigError, Offset};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// A cursor over every integer vector in `[minima[i], maxima[i]]` per dimension.
///
/// The same type serves as a neighbor-direction enumerator (the default
/// `[-1, 1]^N` box) and as a general N-D loop counter. The cursor starts
/// at `minima` and advances odometer-style with dimension 0 fastest, so
/// the enumeration position of a vector equals its mixed-radix
/// [`index`](Self::index):
///
/// ```text
/// index(v) = Σ (v[i] - minima[i]) * places[i]
/// places[0] = 1, places[i] = places[i-1] * (maxima[i-1] - minima[i-1] + 1)
/// ```
///
/// # Examples
///
/// ```
/// use halo_topology::RelativeLocation;
///
/// let mut rel = RelativeLocation::new(2);
/// let mut visited = 1;
/// while rel.increment() {
///     visited += 1;
/// }
/// assert_eq!(visited, 9);
/// assert_eq!(rel.current(), &[-1, -1]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelativeLocation {
    minima: Offset,
    maxima: Offset,
    current: Offset,
    places: SmallVec<[usize; 4]>,
    max_index: usize,
}

impl RelativeLocation {
    /// The `[-1, 1]^dims` box of neighbor directions, center included.
    pub fn new(dims: usize) -> Self {
        Self::uniform(dims, 1)
    }

    /// The `[-radius, radius]^dims` box.
    pub fn uniform(dims: usize, radius: usize) -> Self {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        let minima: Offset = smallvec![-r; dims];
        let maxima: Offset = smallvec![r; dims];
        Self::build(minima, maxima)
    }

    /// A box with explicit inclusive bounds.
    ///
    /// A maximum below its minimum is raised to the minimum. Returns
    /// `Err(ConfigError::DimensionMismatch)` if the two slices differ in
    /// length.
    pub fn with_bounds(minima: &[i32], maxima: &[i32]) -> Result<Self, ConfigError> {
        if minima.len() != maxima.len() {
            return Err(ConfigError::DimensionMismatch {
                what: "maxima",
                expected: minima.len(),
                got: maxima.len(),
            });
        }
        let maxima: Offset = minima
            .iter()
            .zip(maxima)
            .map(|(&lo, &hi)| hi.max(lo))
            .collect();
        Ok(Self::build(minima.iter().copied().collect(), maxima))
    }

    fn build(minima: Offset, maxima: Offset) -> Self {
        let mut places: SmallVec<[usize; 4]> = SmallVec::with_capacity(minima.len());
        let mut running = 1usize;
        for (lo, hi) in minima.iter().zip(&maxima) {
            places.push(running);
            running = running.saturating_mul(span(*lo, *hi).saturating_add(1));
        }
        Self {
            current: minima.clone(),
            minima,
            maxima,
            places,
            max_index: running - 1,
        }
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.minima.len()
    }

    /// Inclusive lower bounds.
    pub fn minima(&self) -> &[i32] {
        &self.minima
    }

    /// Inclusive upper bounds.
    pub fn maxima(&self) -> &[i32] {
        &self.maxima
    }

    /// Lower bound in dimension `i`.
    pub fn minimum(&self, i: usize) -> i32 {
        self.minima[i]
    }

    /// Upper bound in dimension `i`.
    pub fn maximum(&self, i: usize) -> i32 {
        self.maxima[i]
    }

    /// The cursor's current vector.
    pub fn current(&self) -> &[i32] {
        &self.current
    }

    /// Component `i` of the current vector.
    pub fn value_at(&self, i: usize) -> i32 {
        self.current[i]
    }

    /// Mixed-radix place values, dimension 0 first.
    pub fn places(&self) -> &[usize] {
        &self.places
    }

    /// Advance to the next vector.
    ///
    /// Returns `false`, with the cursor reset to `minima`, when the
    /// whole box has been traversed.
    pub fn increment(&mut self) -> bool {
        for i in 0..self.current.len() {
            if self.current[i] < self.maxima[i] {
                self.current[i] += 1;
                return true;
            }
            self.current[i] = self.minima[i];
        }
        false
    }

    /// Like [`increment`](Self::increment) but steps over the all-zero
    /// center vector.
    pub fn increment_skip_center(&mut self) -> bool {
        if !self.increment() {
            return false;
        }
        self.is_valid_non_center() || self.increment()
    }

    /// Move the cursor to `values`.
    ///
    /// Returns `false` and leaves the cursor unchanged if `values` has the
    /// wrong length or lies outside the box.
    pub fn set(&mut self, values: &[i32]) -> bool {
        if !self.in_box(values) {
            return false;
        }
        self.current.clear();
        self.current.extend_from_slice(values);
        true
    }

    /// Move the cursor back to `minima`.
    pub fn reset(&mut self) {
        self.current.clone_from(&self.minima);
    }

    fn in_box(&self, values: &[i32]) -> bool {
        values.len() == self.dimensions()
            && values
                .iter()
                .enumerate()
                .all(|(i, &v)| v >= self.minima[i] && v <= self.maxima[i])
    }

    /// Index of the current vector.
    pub fn index(&self) -> usize {
        self.current
            .iter()
            .enumerate()
            .map(|(i, &v)| span(self.minima[i], v).saturating_mul(self.places[i]))
            .fold(0, usize::saturating_add)
    }

    /// Index of `values`, or `None` if it has the wrong length or lies
    /// outside the box.
    pub fn index_of(&self, values: &[i32]) -> Option<usize> {
        if !self.in_box(values) {
            return None;
        }
        Some(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| span(self.minima[i], v).saturating_mul(self.places[i]))
                .fold(0, usize::saturating_add),
        )
    }

    /// Index of the all-zero vector, if the box contains it.
    pub fn index_of_center(&self) -> Option<usize> {
        let zero: Offset = smallvec![0; self.dimensions()];
        self.index_of(&zero)
    }

    /// Largest valid index.
    pub fn max_index(&self) -> usize {
        self.max_index
    }

    /// Number of vectors in the box.
    pub fn total_values(&self) -> usize {
        self.max_index.saturating_add(1)
    }

    /// Whether some component of the current vector is non-zero.
    pub fn is_valid_non_center(&self) -> bool {
        self.current.iter().any(|&v| v != 0)
    }

    /// `base + current`, componentwise.
    pub fn translate(&self, base: &[i32]) -> Offset {
        base.iter().zip(&self.current).map(|(b, c)| b + c).collect()
    }

    /// Intersection of this box with `other`'s.
    ///
    /// The result's cursor sits at its minima. Returns `None` if the boxes
    /// differ in dimensionality or are disjoint in any dimension.
    pub fn trim(&self, other: &RelativeLocation) -> Option<RelativeLocation> {
        if self.dimensions() != other.dimensions() {
            return None;
        }
        let mut lo = Offset::with_capacity(self.dimensions());
        let mut hi = Offset::with_capacity(self.dimensions());
        for i in 0..self.dimensions() {
            let a = self.minima[i].max(other.minima[i]);
            let b = self.maxima[i].min(other.maxima[i]);
            if a > b {
                return None;
            }
            lo.push(a);
            hi.push(b);
        }
        Some(Self::build(lo, hi))
    }

    /// Iterate over every vector of the box in enumeration order.
    ///
    /// Starts from `minima` regardless of the cursor's position.
    pub fn values(&self) -> Values {
        let mut cursor = self.clone();
        cursor.reset();
        Values {
            cursor,
            done: false,
        }
    }

    /// Index of `displacement`'s direction in the canonical `[-1, 1]^N` box.
    ///
    /// Each component is reduced to its sign first, so any displacement
    /// maps to one of the `3^N` direction slots.
    pub fn direction_index(displacement: &[i32]) -> usize {
        let mut place = 1usize;
        let mut index = 0usize;
        for &d in displacement {
            index += (d.signum() + 1) as usize * place;
            place *= 3;
        }
        index
    }

    /// Index of the direction opposite to `displacement`.
    pub fn reverse_direction_index(displacement: &[i32]) -> usize {
        let reversed: Offset = displacement.iter().map(|d| -d.signum()).collect();
        Self::direction_index(&reversed)
    }
}

impl fmt::Display for RelativeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.current.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Distance from `lo` up to `hi`, which must not be below `lo`.
fn span(lo: i32, hi: i32) -> usize {
    usize::try_from(i64::from(hi) - i64::from(lo)).unwrap_or(usize::MAX)
}

/// Iterator returned by [`RelativeLocation::values`].
#[derive(Clone, Debug)]
pub struct Values {
    cursor: RelativeLocation,
    done: bool,
}

impl Iterator for Values {
    type Item = Offset;

    fn next(&mut self) -> Option<Offset> {
        if self.done {
            return None;
        }
        let v = self.cursor.current.clone();
        self.done = !self.cursor.increment();
        Some(v)
    }
}
