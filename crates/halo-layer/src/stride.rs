//! Strided descriptions of halo slabs inside a flat N-D array.
//!
//! A slab is the sub-box of a rank's local array that travels to (or
//! arrives from) one neighbor. Dimension 0 varies fastest in memory, so a
//! slab is a run of `block_len` contiguous cells repeated over a nest of
//! `(count, stride)` levels, one per remaining dimension.

use crate::datum::DimensionDatum;
use halo_core::{CommError, Offset};
use halo_topology::RelativeLocation;
use smallvec::SmallVec;

/// One nesting level of a [`StridedLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrideLevel {
    /// Number of repetitions at this level.
    pub count: usize,
    /// Distance, in cells, between consecutive repetitions.
    pub stride: usize,
}

/// Shape of a halo slab: a contiguous block repeated over nested levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StridedLayout {
    block_len: usize,
    levels: SmallVec<[StrideLevel; 4]>,
}

impl StridedLayout {
    /// Layout of the slab whose per-dimension extent is
    /// `dims[i].send_receive_size(rel[i])`, inside an array with place
    /// values `places`.
    ///
    /// Levels that continue a contiguous run are folded into the block.
    pub fn for_direction(dims: &[DimensionDatum], places: &[usize], rel: &[i32]) -> Self {
        let mut sides = dims.iter().zip(rel).map(|(d, &r)| d.send_receive_size(r));
        let block_len = sides.next().unwrap_or(1);
        let levels = sides
            .zip(places.iter().skip(1))
            .map(|(count, &stride)| StrideLevel { count, stride })
            .collect();
        let mut layout = Self { block_len, levels };
        layout.simplify();
        layout
    }

    /// Build a layout from explicit parts.
    pub fn from_parts(block_len: usize, levels: &[StrideLevel]) -> Self {
        let mut layout = Self {
            block_len,
            levels: levels.iter().copied().collect(),
        };
        layout.simplify();
        layout
    }

    fn simplify(&mut self) {
        while let Some(first) = self.levels.first().copied() {
            if first.stride != self.block_len && first.count > 1 {
                break;
            }
            self.block_len *= first.count;
            self.levels.remove(0);
        }
    }

    /// Length of the innermost contiguous run.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Outer levels, innermost first.
    pub fn levels(&self) -> &[StrideLevel] {
        &self.levels
    }

    /// Total number of cells in the slab.
    pub fn element_count(&self) -> usize {
        self.levels
            .iter()
            .fold(self.block_len, |acc, l| acc * l.count)
    }

    /// Start offsets of every contiguous block, relative to the slab base.
    fn block_offsets(&self) -> Vec<usize> {
        if self.element_count() == 0 {
            return Vec::new();
        }
        if self.levels.is_empty() {
            return vec![0];
        }
        let lo: Offset = self.levels.iter().map(|_| 0).collect();
        let hi: Offset = self.levels.iter().map(|l| l.count as i32 - 1).collect();
        let Ok(counter) = RelativeLocation::with_bounds(&lo, &hi) else {
            return Vec::new();
        };
        counter
            .values()
            .map(|v| {
                v.iter()
                    .zip(&self.levels)
                    .map(|(&i, l)| i as usize * l.stride)
                    .sum()
            })
            .collect()
    }

    /// Append the slab starting at `base` in `data` to `out`.
    pub fn gather(&self, data: &[f64], base: usize, out: &mut Vec<f64>) {
        out.reserve(self.element_count());
        for off in self.block_offsets() {
            let start = base + off;
            out.extend_from_slice(&data[start..start + self.block_len]);
        }
    }

    /// Write `values` into the slab starting at `base` in `data`.
    ///
    /// Returns `Err(CommError::LengthMismatch)` without writing anything if
    /// `values` does not hold exactly one slab.
    pub fn scatter(&self, data: &mut [f64], base: usize, values: &[f64]) -> Result<(), CommError> {
        if values.len() != self.element_count() {
            return Err(CommError::LengthMismatch {
                expected: self.element_count(),
                got: values.len(),
            });
        }
        for (chunk, off) in values.chunks(self.block_len.max(1)).zip(self.block_offsets()) {
            let start = base + off;
            data[start..start + self.block_len].copy_from_slice(chunk);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2-D array of widths [6, 5] (local 4x3 with buffer 1).
    fn dims() -> Vec<DimensionDatum> {
        vec![
            DimensionDatum::new(0, (0, 8), (0, 4), 1, false).unwrap(),
            DimensionDatum::new(1, (0, 6), (0, 3), 1, false).unwrap(),
        ]
    }

    const PLACES: [usize; 2] = [1, 6];

    #[test]
    fn corner_slab_is_single_cell() {
        let l = StridedLayout::for_direction(&dims(), &PLACES, &[1, 1]);
        assert_eq!(l.element_count(), 1);
        assert_eq!(l.block_len(), 1);
        assert!(l.levels().is_empty());
    }

    #[test]
    fn column_slab_repeats_over_rows() {
        let l = StridedLayout::for_direction(&dims(), &PLACES, &[-1, 0]);
        assert_eq!(l.block_len(), 1);
        assert_eq!(l.levels(), &[StrideLevel { count: 3, stride: 6 }]);
        assert_eq!(l.element_count(), 3);
    }

    #[test]
    fn row_slab_is_contiguous() {
        let l = StridedLayout::for_direction(&dims(), &PLACES, &[0, 1]);
        assert_eq!(l.block_len(), 4);
        assert!(l.levels().is_empty());
    }

    #[test]
    fn contiguous_levels_collapse() {
        let l = StridedLayout::from_parts(
            4,
            &[
                StrideLevel { count: 3, stride: 4 },
                StrideLevel { count: 2, stride: 20 },
            ],
        );
        assert_eq!(l.block_len(), 12);
        assert_eq!(l.levels(), &[StrideLevel { count: 2, stride: 20 }]);
        assert_eq!(l.element_count(), 24);
    }

    #[test]
    fn gather_then_scatter_moves_slab() {
        let src: Vec<f64> = (0..30).map(f64::from).collect();
        let l = StridedLayout::for_direction(&dims(), &PLACES, &[-1, 0]);
        let mut out = Vec::new();
        // Column x=1, rows y=1..4.
        l.gather(&src, 1 + 6, &mut out);
        assert_eq!(out, vec![7.0, 13.0, 19.0]);

        let mut dst = vec![0.0; 30];
        l.scatter(&mut dst, 6, &out).unwrap();
        assert_eq!(dst[6], 7.0);
        assert_eq!(dst[12], 13.0);
        assert_eq!(dst[18], 19.0);
        assert_eq!(dst.iter().filter(|&&v| v != 0.0).count(), 3);
    }

    #[test]
    fn scatter_length_checked() {
        let l = StridedLayout::for_direction(&dims(), &PLACES, &[0, -1]);
        let mut dst = vec![0.0; 30];
        assert!(matches!(
            l.scatter(&mut dst, 0, &[1.0]),
            Err(CommError::LengthMismatch {
                expected: 4,
                got: 1
            })
        ));
        assert!(dst.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_buffer_slab_is_empty() {
        let d = vec![DimensionDatum::new(0, (0, 8), (0, 4), 0, false).unwrap()];
        let l = StridedLayout::for_direction(&d, &[1], &[1]);
        assert_eq!(l.element_count(), 0);
        let mut out = Vec::new();
        l.gather(&[1.0; 4], 0, &mut out);
        assert!(out.is_empty());
    }
}
