//! Virtual N-D Cartesian process mesh.

use crate::relative::RelativeLocation;
use halo_core::{ConfigError, Coordinate, GridDimensions, Offset, Rank};
use smallvec::SmallVec;

/// A virtual N-dimensional mesh laid over the process set.
///
/// Ranks are numbered row-major over mesh coordinates: the last
/// dimension varies fastest, as in MPI Cartesian communicators. One
/// periodicity flag applies to every dimension.
///
/// Read-only after construction; share it between the value layers and
/// grids of one process by reference or `Arc`.
///
/// # Examples
///
/// ```
/// use halo_core::Rank;
/// use halo_topology::CartesianTopology;
///
/// let topo = CartesianTopology::new(&[2, 3], false, 6).unwrap();
/// assert_eq!(topo.coordinates(Rank(4)).unwrap().as_slice(), &[1, 1]);
/// assert_eq!(topo.rank_of(&[1, 1], &[0, 1]), Some(Rank(5)));
/// assert_eq!(topo.rank_of(&[1, 1], &[1, 0]), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartesianTopology {
    procs_per_dim: SmallVec<[usize; 4]>,
    strides: SmallVec<[usize; 4]>,
    periodic: bool,
    size: usize,
}

impl CartesianTopology {
    /// Lay a mesh of `procs_per_dim` processes over `world_size` ranks.
    ///
    /// Returns `Err(ConfigError::ZeroProcesses)` if a dimension has no
    /// processes and `Err(ConfigError::ProcessCountMismatch)` unless the
    /// product of `procs_per_dim` equals `world_size`.
    pub fn new(
        procs_per_dim: &[usize],
        periodic: bool,
        world_size: usize,
    ) -> Result<Self, ConfigError> {
        if let Some(dim) = procs_per_dim.iter().position(|&p| p == 0) {
            return Err(ConfigError::ZeroProcesses { dim });
        }
        let product = procs_per_dim
            .iter()
            .try_fold(1usize, |acc, &p| acc.checked_mul(p))
            .ok_or_else(|| ConfigError::InvalidParameter {
                reason: "process mesh size overflows usize".to_string(),
            })?;
        if product != world_size {
            return Err(ConfigError::ProcessCountMismatch {
                product,
                world_size,
            });
        }

        let n = procs_per_dim.len();
        let mut strides: SmallVec<[usize; 4]> = SmallVec::from_elem(1, n);
        for i in (0..n.saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * procs_per_dim[i + 1];
        }

        log::debug!(
            "cartesian topology {:?} over {} ranks (periodic: {})",
            procs_per_dim,
            world_size,
            periodic
        );

        Ok(Self {
            procs_per_dim: procs_per_dim.iter().copied().collect(),
            strides,
            periodic,
            size: world_size,
        })
    }

    /// Number of mesh dimensions.
    pub fn dimensions(&self) -> usize {
        self.procs_per_dim.len()
    }

    /// Processes per mesh dimension.
    pub fn procs_per_dim(&self) -> &[usize] {
        &self.procs_per_dim
    }

    /// Whether the mesh wraps around in every dimension.
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Number of ranks in the mesh.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this mesh was built from `procs_per_dim` and `periodic`.
    pub fn matches(&self, procs_per_dim: &[usize], periodic: bool) -> bool {
        self.periodic == periodic && self.procs_per_dim.as_slice() == procs_per_dim
    }

    /// Rank at mesh position `coords + offset`.
    ///
    /// In a periodic mesh the position wraps. Otherwise `None` is returned
    /// when the position falls off the mesh in any dimension. Inputs of the
    /// wrong dimensionality also yield `None`.
    pub fn rank_of(&self, coords: &[i32], offset: &[i32]) -> Option<Rank> {
        if coords.len() != self.dimensions() || offset.len() != self.dimensions() {
            return None;
        }
        let mut rank = 0usize;
        for i in 0..self.dimensions() {
            let p = self.procs_per_dim[i] as i64;
            let mut c = i64::from(coords[i]) + i64::from(offset[i]);
            if self.periodic {
                c = c.rem_euclid(p);
            } else if c < 0 || c >= p {
                return None;
            }
            rank += c as usize * self.strides[i];
        }
        Some(Rank(rank))
    }

    /// Mesh coordinates of `rank`, or `None` if it is not in the mesh.
    pub fn coordinates(&self, rank: Rank) -> Option<Offset> {
        if rank.0 >= self.size {
            return None;
        }
        Some(
            self.procs_per_dim
                .iter()
                .zip(&self.strides)
                .map(|(&p, &s)| ((rank.0 / s) % p) as i32)
                .collect(),
        )
    }

    /// The sub-box of `global` owned by `rank`.
    pub fn local_bounds<C: Coordinate>(
        &self,
        rank: Rank,
        global: &GridDimensions<C>,
    ) -> Result<GridDimensions<C>, ConfigError> {
        let coords = self.coordinates(rank).ok_or(ConfigError::RankOutOfRange {
            rank,
            size: self.size,
        })?;
        self.bounds_at(&coords, global)
    }

    /// The sub-box of `global` owned by the process at mesh `coords`.
    ///
    /// Dimension `i` is split into `procs_per_dim[i]` proportional slices:
    /// `lower = origin + (c / p) * extent`, `upper` likewise with `c + 1`.
    /// Slices tile the global box exactly even when `p` does not divide the
    /// extent.
    pub fn bounds_at<C: Coordinate>(
        &self,
        coords: &[i32],
        global: &GridDimensions<C>,
    ) -> Result<GridDimensions<C>, ConfigError> {
        if global.dimension_count() != self.dimensions() {
            return Err(ConfigError::DimensionMismatch {
                what: "global bounds",
                expected: self.dimensions(),
                got: global.dimension_count(),
            });
        }
        if coords.len() != self.dimensions() {
            return Err(ConfigError::DimensionMismatch {
                what: "mesh coordinates",
                expected: self.dimensions(),
                got: coords.len(),
            });
        }
        let mut origin: SmallVec<[C; 4]> = SmallVec::new();
        let mut extents: SmallVec<[C; 4]> = SmallVec::new();
        for (i, &c) in coords.iter().enumerate() {
            let p = self.procs_per_dim[i];
            if c < 0 || c as usize >= p {
                return Err(ConfigError::InvalidParameter {
                    reason: format!("mesh coordinate {c} outside [0, {p}) in dimension {i}"),
                });
            }
            let o = global.origin_at(i);
            let e = global.extent_at(i);
            let lower = C::partition(o, e, c as usize, p);
            let upper = C::partition(o, e, c as usize + 1, p);
            origin.push(lower);
            extents.push(upper - lower);
        }
        GridDimensions::new(origin, extents)
    }

    /// The part of `volume` whose offsets lead to a real neighbor of `rank`.
    ///
    /// Probes every offset in `volume` and spans the observed range of the
    /// valid ones; in a Cartesian mesh that range contains only valid
    /// offsets. A periodic mesh has a neighbor in every direction, so the
    /// input comes back unchanged. Returns `None` when `rank` is not in the
    /// mesh, the dimensionality differs, or no offset is valid.
    pub fn trim(&self, rank: Rank, volume: &RelativeLocation) -> Option<RelativeLocation> {
        let coords = self.coordinates(rank)?;
        if volume.dimensions() != self.dimensions() {
            return None;
        }
        if self.periodic {
            let mut whole = volume.clone();
            whole.reset();
            return Some(whole);
        }
        let n = self.dimensions();
        let mut lo: Offset = SmallVec::from_elem(i32::MAX, n);
        let mut hi: Offset = SmallVec::from_elem(i32::MIN, n);
        let mut any = false;
        for offset in volume.values() {
            if self.rank_of(&coords, &offset).is_some() {
                any = true;
                for i in 0..n {
                    lo[i] = lo[i].min(offset[i]);
                    hi[i] = hi[i].max(offset[i]);
                }
            }
        }
        if !any {
            return None;
        }
        RelativeLocation::with_bounds(&lo, &hi).ok()
    }

    /// Distinct ranks adjacent to `rank` in any non-center direction,
    /// excluding `rank` itself, in ascending order.
    pub fn neighbor_ranks(&self, rank: Rank) -> Vec<Rank> {
        let Some(coords) = self.coordinates(rank) else {
            return Vec::new();
        };
        let mut out: Vec<Rank> = RelativeLocation::new(self.dimensions())
            .values()
            .filter(|d| d.iter().any(|&v| v != 0))
            .filter_map(|d| self.rank_of(&coords, &d))
            .filter(|&r| r != rank)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance;
    use proptest::prelude::*;

    // ── Construction tests ──────────────────────────────────────

    #[test]
    fn product_must_match_world() {
        let r = CartesianTopology::new(&[2, 3], false, 5);
        assert!(matches!(
            r,
            Err(ConfigError::ProcessCountMismatch {
                product: 6,
                world_size: 5
            })
        ));
    }

    #[test]
    fn zero_processes_rejected() {
        let r = CartesianTopology::new(&[2, 0], true, 0);
        assert!(matches!(r, Err(ConfigError::ZeroProcesses { dim: 1 })));
    }

    #[test]
    fn matches_inputs() {
        let t = CartesianTopology::new(&[2, 2], true, 4).unwrap();
        assert!(t.matches(&[2, 2], true));
        assert!(!t.matches(&[2, 2], false));
        assert!(!t.matches(&[4, 1], true));
    }

    // ── Rank lookup tests ───────────────────────────────────────

    #[test]
    fn last_dimension_fastest() {
        let t = CartesianTopology::new(&[3, 2], false, 6).unwrap();
        assert_eq!(t.rank_of(&[0, 0], &[0, 0]), Some(Rank(0)));
        assert_eq!(t.rank_of(&[0, 1], &[0, 0]), Some(Rank(1)));
        assert_eq!(t.rank_of(&[1, 0], &[0, 0]), Some(Rank(2)));
        assert_eq!(t.coordinates(Rank(5)).unwrap().as_slice(), &[2, 1]);
        assert_eq!(t.coordinates(Rank(6)), None);
    }

    #[test]
    fn periodic_wraps() {
        let t = CartesianTopology::new(&[3, 3], true, 9).unwrap();
        assert_eq!(t.rank_of(&[0, 0], &[-1, -1]), Some(Rank(8)));
        assert_eq!(t.rank_of(&[2, 2], &[1, 0]), Some(Rank(2)));
    }

    #[test]
    fn bounded_off_mesh_is_none() {
        let t = CartesianTopology::new(&[3, 3], false, 9).unwrap();
        assert_eq!(t.rank_of(&[0, 1], &[-1, 0]), None);
        assert_eq!(t.rank_of(&[2, 2], &[1, 1]), None);
        assert_eq!(t.rank_of(&[1, 1], &[1, -1]), Some(Rank(6)));
        assert_eq!(t.rank_of(&[1], &[0]), None);
    }

    #[test]
    fn roundtrip_holds() {
        for procs in [vec![1], vec![4], vec![2, 3], vec![3, 1, 2]] {
            let n: usize = procs.iter().product();
            compliance::assert_rank_roundtrip(&CartesianTopology::new(&procs, false, n).unwrap());
        }
    }

    // ── Partition tests ─────────────────────────────────────────

    #[test]
    fn uneven_integer_split() {
        let t = CartesianTopology::new(&[3], false, 3).unwrap();
        let g = GridDimensions::new([0], [10]).unwrap();
        let b: Vec<_> = (0..3)
            .map(|r| t.local_bounds(Rank(r), &g).unwrap())
            .map(|d| (d.origin_at(0), d.extent_at(0)))
            .collect();
        assert_eq!(b, vec![(0, 3), (3, 3), (6, 4)]);
    }

    #[test]
    fn real_split_tiles() {
        let t = CartesianTopology::new(&[3, 2], true, 6).unwrap();
        let g = GridDimensions::new([-1.0, 0.5], [10.0, 3.0]).unwrap();
        compliance::assert_partitions_tile(&t, &g);
    }

    #[test]
    fn local_bounds_rejects_bad_rank_and_dims() {
        let t = CartesianTopology::new(&[2], false, 2).unwrap();
        let g = GridDimensions::new([0], [10]).unwrap();
        assert!(matches!(
            t.local_bounds(Rank(2), &g),
            Err(ConfigError::RankOutOfRange { .. })
        ));
        let g2 = GridDimensions::new([0, 0], [10, 10]).unwrap();
        assert!(matches!(
            t.local_bounds(Rank(0), &g2),
            Err(ConfigError::DimensionMismatch { .. })
        ));
    }

    // ── Trim tests ──────────────────────────────────────────────

    #[test]
    fn trim_corner_of_bounded_mesh() {
        let t = CartesianTopology::new(&[3, 3], false, 9).unwrap();
        let trimmed = t.trim(Rank(0), &RelativeLocation::new(2)).unwrap();
        assert_eq!(trimmed.minima(), &[0, 0]);
        assert_eq!(trimmed.maxima(), &[1, 1]);
        assert_eq!(trimmed.total_values(), 4);
        let center = t.trim(Rank(4), &RelativeLocation::new(2)).unwrap();
        assert_eq!(center.total_values(), 9);
    }

    #[test]
    fn trim_single_process_dimension() {
        let t = CartesianTopology::new(&[1, 4], false, 4).unwrap();
        let trimmed = t.trim(Rank(1), &RelativeLocation::new(2)).unwrap();
        assert_eq!(trimmed.minima(), &[0, -1]);
        assert_eq!(trimmed.maxima(), &[0, 1]);
    }

    #[test]
    fn trim_periodic_is_identity() {
        let t = CartesianTopology::new(&[2, 2], true, 4).unwrap();
        let v = RelativeLocation::new(2);
        assert_eq!(t.trim(Rank(3), &v), Some(v));
    }

    #[test]
    fn trim_without_valid_offsets_is_none() {
        let t = CartesianTopology::new(&[2], false, 2).unwrap();
        let far = RelativeLocation::with_bounds(&[2], &[3]).unwrap();
        assert_eq!(t.trim(Rank(0), &far), None);
    }

    // ── Neighbor tests ──────────────────────────────────────────

    #[test]
    fn neighbor_ranks_bounded_and_periodic() {
        let bounded = CartesianTopology::new(&[3, 3], false, 9).unwrap();
        assert_eq!(bounded.neighbor_ranks(Rank(0)), vec![Rank(1), Rank(3), Rank(4)]);
        assert_eq!(bounded.neighbor_ranks(Rank(4)).len(), 8);

        let two = CartesianTopology::new(&[2], true, 2).unwrap();
        assert_eq!(two.neighbor_ranks(Rank(0)), vec![Rank(1)]);

        let one = CartesianTopology::new(&[1], true, 1).unwrap();
        assert!(one.neighbor_ranks(Rank(0)).is_empty());
    }

    fn arb_mesh() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..4, 1..4)
    }

    proptest! {
        #[test]
        fn periodic_rank_of_is_total(
            procs in arb_mesh(),
            offsets in prop::collection::vec(-5i32..5, 3),
            seed in 0usize..64,
        ) {
            let n: usize = procs.iter().product();
            let t = CartesianTopology::new(&procs, true, n).unwrap();
            let coords = t.coordinates(Rank(seed % n)).unwrap();
            let off = &offsets[..procs.len()];
            prop_assert!(t.rank_of(&coords, off).is_some());
        }

        #[test]
        fn bounded_rank_of_none_iff_off_mesh(
            procs in arb_mesh(),
            offsets in prop::collection::vec(-3i32..3, 3),
            seed in 0usize..64,
        ) {
            let n: usize = procs.iter().product();
            let t = CartesianTopology::new(&procs, false, n).unwrap();
            let coords = t.coordinates(Rank(seed % n)).unwrap();
            let off = &offsets[..procs.len()];
            let off_mesh = (0..procs.len()).any(|i| {
                let c = coords[i] + off[i];
                c < 0 || c >= procs[i] as i32
            });
            prop_assert_eq!(t.rank_of(&coords, off).is_none(), off_mesh);
        }

        #[test]
        fn integer_partitions_tile(
            procs in arb_mesh(),
            extents in prop::collection::vec(0i32..40, 3),
            origins in prop::collection::vec(-10i32..10, 3),
            periodic in any::<bool>(),
        ) {
            let n: usize = procs.iter().product();
            let t = CartesianTopology::new(&procs, periodic, n).unwrap();
            let d = procs.len();
            let g = GridDimensions::new(origins[..d].to_vec(), extents[..d].to_vec()).unwrap();
            compliance::assert_partitions_tile(&t, &g);
        }
    }
}
