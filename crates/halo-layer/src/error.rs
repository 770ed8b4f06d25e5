//! Error types for value-layer operations.

use halo_core::{CommError, ConfigError, Offset, Rank};
use std::error::Error;
use std::fmt;

/// Errors from value-layer construction, access, diffusion, or exchange.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerError {
    /// The layer could not be built from the given configuration.
    Config(ConfigError),
    /// The layer was closed before this operation.
    Closed {
        /// The operation attempted.
        op: &'static str,
    },
    /// A coordinate is not addressable on this rank (neither owned nor halo).
    CoordOutOfRange {
        /// The offending coordinate.
        coord: Offset,
    },
    /// A diffusor reads further than the halo reaches.
    RadiusExceedsBuffer {
        /// The diffusor's radius.
        radius: usize,
        /// The layer's buffer depth.
        buffer: usize,
    },
    /// A halo exchange failed. Fatal for the whole computation.
    Exchange {
        /// The local rank.
        rank: Rank,
        /// The operation in progress.
        op: &'static str,
        /// The underlying messaging error.
        source: CommError,
    },
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid layer configuration: {e}"),
            Self::Closed { op } => write!(f, "{op} called on a closed layer"),
            Self::CoordOutOfRange { coord } => {
                write!(f, "coordinate {coord:?} is not addressable on this rank")
            }
            Self::RadiusExceedsBuffer { radius, buffer } => write!(
                f,
                "diffusion radius {radius} exceeds buffer depth {buffer}"
            ),
            Self::Exchange { rank, op, source } => {
                write!(f, "rank {rank} failed during {op}: {source}")
            }
        }
    }
}

impl Error for LayerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Exchange { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LayerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
