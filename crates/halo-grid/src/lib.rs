//! Agent-holding grids and spaces for Halo.
//!
//! A [`SharedGrid`] holds the agents whose positions fall in one rank's
//! owned box or in the `buffer`-deep strip around it. Owned ("local")
//! agents are the rank's own; the rest are ghost copies pushed by the
//! neighbors that own them. The grid answers two per-step questions:
//!
//! - which local agents have left the owned box and must change owner
//!   ([`SharedGrid::balance`])
//! - which local agents sit in a neighbor's buffer strip and must be
//!   copied there ([`SharedSpace::agents_to_push`])
//!
//! [`SharedDiscreteSpace`] and [`SharedContinuousSpace`] specialize the
//! grid for integer cells and real coordinates. The [`exchange`] helpers
//! run the ghost refresh and migration rounds over a
//! [`Communicator`](halo_core::Communicator).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod borders;
pub mod continuous;
pub mod discrete;
pub mod error;
pub mod exchange;
pub mod grid;
pub mod neighbors;
pub mod space;

pub use borders::BorderPolicy;
pub use continuous::SharedContinuousSpace;
pub use discrete::SharedDiscreteSpace;
pub use error::GridError;
pub use grid::{ProjectionInfo, PushSets, SharedGrid};
pub use neighbors::{Neighbor, Neighbors};
pub use space::SharedSpace;
