//! Core types and traits for the Halo domain-decomposition toolkit.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: rank and
//! agent identities, the numeric [`Coordinate`] abstraction, axis-aligned
//! [`GridDimensions`], error types, and the collaborator traits through
//! which a process talks to its peers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod coordinate;
pub mod dimensions;
pub mod error;
pub mod id;
pub mod traits;

pub use coordinate::Coordinate;
pub use dimensions::GridDimensions;
pub use error::{CommError, ConfigError};
pub use id::{AgentId, Offset, Point, Rank, Tag};
pub use traits::{AgentTransfer, Communicator, Payload, Placement};
