//! Decomposition inputs and their validation.

use crate::cartesian::CartesianTopology;
use halo_core::{ConfigError, Coordinate, GridDimensions, Rank};

/// Everything needed to decompose a global domain over a process mesh.
///
/// [`validate()`](Self::validate) checks the structural invariants up
/// front so that a bad configuration fails before any layer or grid
/// allocates or exchanges anything.
#[derive(Clone, Debug, PartialEq)]
pub struct DecompositionConfig<C: Coordinate> {
    /// Processes per mesh dimension. Their product must equal the
    /// number of processes.
    pub procs_per_dim: Vec<usize>,
    /// Whether the mesh (and the domain) wraps in every dimension.
    pub periodic: bool,
    /// The global domain.
    pub global: GridDimensions<C>,
    /// Halo depth, in cells (or coordinate units for continuous spaces).
    pub buffer: usize,
}

impl<C: Coordinate> DecompositionConfig<C> {
    /// Check the configuration against a computation of `world_size` ranks.
    ///
    /// Fails if the mesh and the global box disagree on dimensionality, if
    /// the mesh does not hold exactly `world_size` processes, or if the
    /// buffer is wider than any rank's local sub-box.
    pub fn validate(&self, world_size: usize) -> Result<(), ConfigError> {
        self.topology(world_size).map(|_| ())
    }

    /// Validate and build the shared [`CartesianTopology`].
    pub fn topology(&self, world_size: usize) -> Result<CartesianTopology, ConfigError> {
        if self.procs_per_dim.len() != self.global.dimension_count() {
            return Err(ConfigError::DimensionMismatch {
                what: "procs_per_dim",
                expected: self.global.dimension_count(),
                got: self.procs_per_dim.len(),
            });
        }
        let topo = CartesianTopology::new(&self.procs_per_dim, self.periodic, world_size)?;
        if self.buffer > 0 {
            let buffer = C::from_usize(self.buffer);
            for r in 0..topo.size() {
                let local = topo.local_bounds(Rank(r), &self.global)?;
                for dim in 0..local.dimension_count() {
                    if buffer > local.extent_at(dim) {
                        return Err(ConfigError::BufferTooLarge {
                            dim,
                            buffer: self.buffer,
                            local_width: local.extent_at(dim).to_string(),
                        });
                    }
                }
            }
        }
        Ok(topo)
    }
}
