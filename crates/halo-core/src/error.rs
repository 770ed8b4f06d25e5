//! Error types shared across the Halo workspace.
//!
//! [`ConfigError`] covers setup failures detected while building a
//! topology, layer, or grid. [`CommError`] covers point-to-point
//! messaging failures; these are fail-stop for the whole computation.

use crate::id::{Rank, Tag};
use std::error::Error;
use std::fmt;

/// Invalid configuration detected at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Two vectors that must describe the same number of dimensions do not.
    DimensionMismatch {
        /// Which input disagreed (e.g. `"procs_per_dim"`).
        what: &'static str,
        /// Expected dimension count.
        expected: usize,
        /// Dimension count actually supplied.
        got: usize,
    },
    /// The process mesh does not partition the process set exactly.
    ProcessCountMismatch {
        /// Product of processes per dimension.
        product: usize,
        /// Number of processes in the computation.
        world_size: usize,
    },
    /// A mesh dimension was given zero processes.
    ZeroProcesses {
        /// Offending dimension.
        dim: usize,
    },
    /// A global extent is negative.
    NegativeExtent {
        /// Offending dimension.
        dim: usize,
        /// The extent, formatted.
        extent: String,
    },
    /// The buffer depth is wider than a process's local sub-box.
    BufferTooLarge {
        /// Offending dimension.
        dim: usize,
        /// Requested buffer depth.
        buffer: usize,
        /// Local width in that dimension, formatted.
        local_width: String,
    },
    /// A rank outside `[0, size)` was supplied.
    RankOutOfRange {
        /// The offending rank.
        rank: Rank,
        /// Number of processes.
        size: usize,
    },
    /// Any other invalid parameter.
    InvalidParameter {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch {
                what,
                expected,
                got,
            } => write!(f, "{what} has {got} dimensions, expected {expected}"),
            Self::ProcessCountMismatch {
                product,
                world_size,
            } => write!(
                f,
                "process mesh holds {product} processes but the computation has {world_size}"
            ),
            Self::ZeroProcesses { dim } => {
                write!(f, "dimension {dim} of the process mesh has zero processes")
            }
            Self::NegativeExtent { dim, extent } => {
                write!(f, "extent {extent} in dimension {dim} is negative")
            }
            Self::BufferTooLarge {
                dim,
                buffer,
                local_width,
            } => write!(
                f,
                "buffer {buffer} exceeds local width {local_width} in dimension {dim}"
            ),
            Self::RankOutOfRange { rank, size } => {
                write!(f, "rank {rank} out of range for {size} processes")
            }
            Self::InvalidParameter { reason } => write!(f, "invalid parameter: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Point-to-point messaging failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommError {
    /// A receive did not complete within the configured timeout.
    Timeout {
        /// Receiving rank.
        rank: Rank,
        /// Rank the message was expected from.
        peer: Rank,
        /// Expected tag.
        tag: Tag,
    },
    /// The peer endpoint has gone away.
    Disconnected {
        /// Local rank.
        rank: Rank,
        /// Peer rank.
        peer: Rank,
    },
    /// A message arrived with a payload of the wrong kind.
    UnexpectedPayload {
        /// Receiving rank.
        rank: Rank,
        /// Sending rank.
        peer: Rank,
        /// Message tag.
        tag: Tag,
        /// Payload kind the receiver wanted.
        expected: &'static str,
    },
    /// A send or receive named a rank that does not exist.
    RankOutOfRange {
        /// The offending rank.
        rank: Rank,
        /// Number of processes.
        size: usize,
    },
    /// A received slab has the wrong number of elements.
    LengthMismatch {
        /// Elements the receiving descriptor covers.
        expected: usize,
        /// Elements received.
        got: usize,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { rank, peer, tag } => {
                write!(f, "rank {rank} timed out waiting for tag {tag} from {peer}")
            }
            Self::Disconnected { rank, peer } => {
                write!(f, "rank {rank} lost its channel to {peer}")
            }
            Self::UnexpectedPayload {
                rank,
                peer,
                tag,
                expected,
            } => write!(
                f,
                "rank {rank} expected {expected} from {peer} with tag {tag}"
            ),
            Self::RankOutOfRange { rank, size } => {
                write!(f, "rank {rank} out of range for {size} processes")
            }
            Self::LengthMismatch { expected, got } => {
                write!(f, "received {got} values, expected {expected}")
            }
        }
    }
}

impl Error for CommError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_dimension() {
        let e = ConfigError::BufferTooLarge {
            dim: 1,
            buffer: 4,
            local_width: "3".into(),
        };
        assert_eq!(e.to_string(), "buffer 4 exceeds local width 3 in dimension 1");
    }

    #[test]
    fn comm_error_names_ranks() {
        let e = CommError::Timeout {
            rank: Rank(0),
            peer: Rank(3),
            tag: Tag(21),
        };
        assert_eq!(e.to_string(), "rank 0 timed out waiting for tag 21 from 3");
    }
}
