//! Process-mesh topology for Halo.
//!
//! This crate answers the static questions every distributed component
//! asks once at construction: which sub-box of the global domain does a
//! rank own, which ranks surround it, and in which directions.
//!
//! - [`RelativeLocation`]: enumerates every integer offset in an N-D box;
//!   used both to walk neighbor directions and as an N-D loop cursor
//! - [`CartesianTopology`]: rank ↔ mesh-coordinate mapping, proportional
//!   partitioning of the global box, and trimming of direction boxes at
//!   non-periodic mesh edges
//! - [`DecompositionConfig`]: validated inputs from which a topology and
//!   its layers and grids are built
//! - [`LocalCluster`]: an in-process [`Communicator`](halo_core::Communicator)
//!   with one endpoint per rank, for running a mesh on threads

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cartesian;
pub mod cluster;
pub mod config;
pub mod relative;

#[cfg(test)]
pub(crate) mod compliance;

pub use cartesian::CartesianTopology;
pub use cluster::{LocalCluster, LocalClusterConfig, LocalComm};
pub use config::DecompositionConfig;
pub use relative::RelativeLocation;
