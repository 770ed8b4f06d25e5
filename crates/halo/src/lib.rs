//! Halo: domain decomposition and halo exchange for distributed agent
//! simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Halo sub-crates. For most users, adding `halo` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use halo::prelude::*;
//! use halo::topology::LocalCluster;
//! use std::sync::Arc;
//!
//! // One rank owning a periodic 8x8 domain with a one-cell halo.
//! let comm = Arc::new(LocalCluster::new(1).unwrap().into_endpoints().remove(0));
//! let config = DecompositionConfig {
//!     procs_per_dim: vec![1, 1],
//!     periodic: true,
//!     global: GridDimensions::new(vec![0, 0], vec![8, 8]).unwrap(),
//!     buffer: 1,
//! };
//!
//! let mut heat = DiffusionLayer::from_config(comm, &config, 1.0).unwrap();
//! heat.set_value_at(&[3, 3], 10.0).unwrap();
//! heat.synchronize().unwrap();
//! heat.diffuse(&MeanDiffusor::default()).unwrap();
//! assert_eq!(heat.value_at(&[3, 3]).unwrap(), 2.0);
//! assert_eq!(heat.value_at(&[4, 4]).unwrap(), 2.0);
//! assert_eq!(heat.value_at(&[5, 5]).unwrap(), 1.0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`halo-core`).
///
/// Ranks, agent ids, coordinates, bounding boxes, error types, and the
/// [`types::Communicator`] and [`types::AgentTransfer`] collaborator traits.
pub use halo_core as types;

/// Process meshes and neighborhood enumeration (`halo-topology`).
///
/// [`topology::RelativeLocation`], [`topology::CartesianTopology`], and the
/// in-process [`topology::LocalCluster`] communicator.
pub use halo_topology as topology;

/// Distributed value layers and diffusion (`halo-layer`).
pub use halo_layer as layer;

/// Distributed agent grids and spaces (`halo-grid`).
///
/// [`grid::SharedGrid`], [`grid::SharedDiscreteSpace`],
/// [`grid::SharedContinuousSpace`], and the [`grid::exchange`] rounds.
pub use halo_grid as grid;

/// Common imports for typical Halo usage.
///
/// ```rust
/// use halo::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use halo_core::{
        AgentId, AgentTransfer, Communicator, Coordinate, GridDimensions, Point, Rank,
    };

    // Errors
    pub use halo_core::{CommError, ConfigError};
    pub use halo_grid::GridError;
    pub use halo_layer::LayerError;

    // Topology
    pub use halo_topology::{CartesianTopology, DecompositionConfig, RelativeLocation};

    // Layers
    pub use halo_layer::{DiffusionLayer, Diffusor, MeanDiffusor, ValueLayer, WeightedDiffusor};

    // Grids
    pub use halo_grid::exchange::{migrate, synchronize_buffers};
    pub use halo_grid::{
        BorderPolicy, SharedContinuousSpace, SharedDiscreteSpace, SharedGrid, SharedSpace,
    };
}
