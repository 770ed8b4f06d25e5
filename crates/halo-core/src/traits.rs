//! Collaborator traits: message passing and agent ownership transfer.
//!
//! Components never reach for a global process singleton. They receive a
//! [`Communicator`] (and, for grids, an [`AgentTransfer`]) at construction
//! or call time.

use crate::error::CommError;
use crate::id::{AgentId, Point, Rank, Tag};

/// One agent's identity and position, as carried between processes.
///
/// Positions travel as `f64` components whatever the space's coordinate
/// type; integer grids round back on receipt.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// The agent.
    pub id: AgentId,
    /// Its position.
    pub point: Point<f64>,
}

/// Message body exchanged between ranks.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// A packed slab of scalar field values.
    Values(Vec<f64>),
    /// Agent placements (ghost copies or migrating agents).
    Placements(Vec<Placement>),
}

impl Payload {
    /// Short name of the payload kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Values(_) => "values",
            Self::Placements(_) => "placements",
        }
    }
}

/// Rank/communicator context injected into every distributed component.
///
/// Semantics follow MPI point-to-point messaging: `send` does not block,
/// `recv` blocks until a message from `source` carrying `tag` has arrived,
/// and messages between one ordered pair of ranks with one tag are
/// delivered in the order they were sent.
pub trait Communicator: Send + Sync {
    /// This process's rank.
    fn rank(&self) -> Rank;

    /// Number of processes.
    fn size(&self) -> usize;

    /// Post a message to `dest`.
    fn send(&self, dest: Rank, tag: Tag, payload: Payload) -> Result<(), CommError>;

    /// Wait for the next message from `source` with `tag`.
    fn recv(&self, source: Rank, tag: Tag) -> Result<Payload, CommError>;

    /// Receive a [`Payload::Values`] message.
    fn recv_values(&self, source: Rank, tag: Tag) -> Result<Vec<f64>, CommError> {
        match self.recv(source, tag)? {
            Payload::Values(v) => Ok(v),
            _ => Err(CommError::UnexpectedPayload {
                rank: self.rank(),
                peer: source,
                tag,
                expected: "values",
            }),
        }
    }

    /// Receive a [`Payload::Placements`] message.
    fn recv_placements(&self, source: Rank, tag: Tag) -> Result<Vec<Placement>, CommError> {
        match self.recv(source, tag)? {
            Payload::Placements(p) => Ok(p),
            _ => Err(CommError::UnexpectedPayload {
                rank: self.rank(),
                peer: source,
                tag,
                expected: "placements",
            }),
        }
    }
}

/// Process-coordination collaborator that moves agent ownership.
///
/// A grid's `balance` pass reports each local agent that has left the
/// local bounds together with the rank that now owns its position; the
/// implementor is responsible for actually shipping the agent.
pub trait AgentTransfer {
    /// Request that `id` be handed to `dest`.
    fn request_move(&mut self, id: AgentId, dest: Rank);
}

impl AgentTransfer for Vec<(AgentId, Rank)> {
    fn request_move(&mut self, id: AgentId, dest: Rank) {
        self.push((id, dest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_collects_move_requests() {
        let mut moves: Vec<(AgentId, Rank)> = Vec::new();
        let id = AgentId::new(1, Rank(0), 0);
        moves.request_move(id, Rank(4));
        assert_eq!(moves, vec![(id, Rank(4))]);
    }

    #[test]
    fn payload_kind() {
        assert_eq!(Payload::Values(vec![]).kind(), "values");
        assert_eq!(Payload::Placements(vec![]).kind(), "placements");
    }
}
