//! Decomposition fixtures.

use halo_core::GridDimensions;
use halo_topology::DecompositionConfig;

/// Integer domain `[0, extent)^d` split over `procs` with the given buffer.
pub fn grid_config(
    procs: &[usize],
    extent: i32,
    buffer: usize,
    periodic: bool,
) -> DecompositionConfig<i32> {
    let d = procs.len();
    DecompositionConfig {
        procs_per_dim: procs.to_vec(),
        periodic,
        global: GridDimensions::new(vec![0; d], vec![extent; d]).expect("non-negative extent"),
        buffer,
    }
}

/// Real domain `[0, extent)^d` split over `procs` with the given buffer.
pub fn space_config(
    procs: &[usize],
    extent: f64,
    buffer: usize,
    periodic: bool,
) -> DecompositionConfig<f64> {
    let d = procs.len();
    DecompositionConfig {
        procs_per_dim: procs.to_vec(),
        periodic,
        global: GridDimensions::new(vec![0.0; d], vec![extent; d]).expect("non-negative extent"),
        buffer,
    }
}

/// Mean of a slice; the reference diffusion rule in tests.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
