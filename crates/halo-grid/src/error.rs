//! Error types for grid and space operations.

use halo_core::{AgentId, CommError, ConfigError, Rank};
use std::error::Error;
use std::fmt;

/// Errors from grid construction, placement, balancing, or exchange.
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// The grid could not be built from the given configuration.
    Config(ConfigError),
    /// The agent is not on this grid.
    AgentNotFound {
        /// The missing agent.
        id: AgentId,
    },
    /// A point or displacement has the wrong number of components.
    DimensionMismatch {
        /// The grid's dimension count.
        expected: usize,
        /// Components supplied.
        got: usize,
    },
    /// A strict border rejected a point outside the global box.
    OutOfBounds {
        /// The point, formatted.
        point: String,
        /// The global box, formatted.
        bounds: String,
    },
    /// A local agent left the owned box but no neighbor owns its position.
    NoOwner {
        /// The agent.
        id: AgentId,
        /// Its position, formatted.
        point: String,
    },
    /// An agent exchange failed. Fatal for the whole computation.
    Exchange {
        /// The local rank.
        rank: Rank,
        /// The operation in progress.
        op: &'static str,
        /// The underlying messaging error.
        source: CommError,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid grid configuration: {e}"),
            Self::AgentNotFound { id } => write!(f, "agent {id} is not on this grid"),
            Self::DimensionMismatch { expected, got } => write!(
                f,
                "expected {expected} coordinate components, got {got}"
            ),
            Self::OutOfBounds { point, bounds } => {
                write!(f, "point {point} lies outside {bounds}")
            }
            Self::NoOwner { id, point } => {
                write!(f, "no neighbor owns {point}, the position of agent {id}")
            }
            Self::Exchange { rank, op, source } => {
                write!(f, "rank {rank} failed during {op}: {source}")
            }
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Exchange { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for GridError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
