//! N-dimensional scalar value layers for Halo.
//!
//! A [`ValueLayer`] owns one process's slice of a global integer grid plus
//! a halo of `buffer` cells on every side, stored twice in a
//! [`DoubleBuffer`]. Construction derives per-dimension bounds
//! ([`DimensionDatum`]) and one [`StridedLayout`] per neighbor direction
//! describing exactly which cells travel in
//! [`synchronize`](ValueLayer::synchronize).
//!
//! A [`DiffusionLayer`] adds a Jacobi-style update: every owned cell is
//! recomputed by a [`Diffusor`] from its `(2r+1)^N` neighborhood in the
//! current bank, written to the other bank, and the banks are swapped
//! before the halo is refreshed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod datum;
pub mod diffusion;
pub mod error;
pub mod stride;
pub mod value_layer;

pub use buffer::DoubleBuffer;
pub use datum::DimensionDatum;
pub use diffusion::{DiffusionLayer, Diffusor, MeanDiffusor, WeightedDiffusor, WeightedDiffusorBuilder};
pub use error::LayerError;
pub use stride::{StrideLevel, StridedLayout};
pub use value_layer::{HaloNeighbor, ValueLayer};
