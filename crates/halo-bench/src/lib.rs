//! Benchmark profiles and utilities for the Halo decomposition toolkit.
//!
//! - [`square_config`]: square integer domain over a given mesh
//! - [`single_rank_layer`]: a periodic diffusion layer on one rank
//! - [`scatter_agents`]: deterministic agent placement via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use halo_core::{AgentId, GridDimensions};
use halo_grid::SharedSpace;
use halo_layer::DiffusionLayer;
use halo_topology::{DecompositionConfig, LocalCluster};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Square domain `[0, extent)^d` over `procs`, `d = procs.len()`.
pub fn square_config(
    procs: &[usize],
    extent: i32,
    buffer: usize,
    periodic: bool,
) -> DecompositionConfig<i32> {
    let d = procs.len();
    DecompositionConfig {
        procs_per_dim: procs.to_vec(),
        periodic,
        global: GridDimensions::new(vec![0; d], vec![extent; d]).unwrap(),
        buffer,
    }
}

/// A periodic `extent^dims` diffusion layer owned by a single rank,
/// seeded with a deterministic ramp.
pub fn single_rank_layer(dims: usize, extent: i32, buffer: usize) -> DiffusionLayer {
    let comm = Arc::new(LocalCluster::new(1).unwrap().into_endpoints().remove(0));
    let mut layer =
        DiffusionLayer::from_config(comm, &square_config(&vec![1; dims], extent, buffer, true), 0.0)
            .unwrap();
    for (c, _) in layer.local_values().unwrap() {
        let v: i32 = c.iter().enumerate().map(|(i, &x)| x * (i as i32 + 1)).sum();
        layer.set_value_at(&c, f64::from(v % 7)).unwrap();
    }
    layer.synchronize().unwrap();
    layer
}

/// Place `n` local agents at seeded positions inside the owned box.
/// Returns the placed ids.
pub fn scatter_agents<S: SharedSpace<Coord = i32>>(space: &mut S, n: u64, seed: u64) -> Vec<AgentId> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let me = space.grid().rank();
    let local = space.grid().local().clone();
    (0..n)
        .map(|i| {
            let pt: Vec<i32> = (0..local.dimension_count())
                .map(|d| local.origin_at(d) + (rng.next_u32() % local.extent_at(d) as u32) as i32)
                .collect();
            let id = AgentId::new(i, me, 0);
            space.place_agent(id, &pt).unwrap();
            id
        })
        .collect()
}
