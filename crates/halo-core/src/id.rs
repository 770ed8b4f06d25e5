//! Strongly-typed identifiers and the [`Point`] / [`Offset`] aliases.

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A point in an N-dimensional space, one component per dimension.
///
/// Stored inline for up to four dimensions.
pub type Point<C> = SmallVec<[C; 4]>;

/// An integer offset vector: a neighbor direction, a process-mesh
/// coordinate, or a cursor position within an offset box.
pub type Offset = SmallVec<[i32; 4]>;

/// Identifies one process of the distributed computation.
///
/// Ranks are dense: a computation of `n` processes uses `Rank(0)` to
/// `Rank(n - 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub usize);

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Rank {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Message tag used to match a receive with its send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a simulated agent.
///
/// The triple `(id, starting_rank, agent_type)` is the agent's identity
/// and is what equality, ordering, and hashing use. `current_rank` names
/// the process that currently owns the agent; it changes when the agent
/// migrates and is what every local/non-local decision reads.
#[derive(Clone, Copy, Debug)]
pub struct AgentId {
    id: u64,
    starting_rank: Rank,
    agent_type: u32,
    current_rank: Rank,
}

impl AgentId {
    /// Create an id for an agent born on `starting_rank`, which also
    /// owns it initially.
    pub fn new(id: u64, starting_rank: Rank, agent_type: u32) -> Self {
        Self {
            id,
            starting_rank,
            agent_type,
            current_rank: starting_rank,
        }
    }

    /// Numeric id, unique among agents born on the same rank.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Rank the agent was created on.
    pub fn starting_rank(&self) -> Rank {
        self.starting_rank
    }

    /// User-defined agent type discriminator.
    pub fn agent_type(&self) -> u32 {
        self.agent_type
    }

    /// Rank that currently owns the agent.
    pub fn current_rank(&self) -> Rank {
        self.current_rank
    }

    /// Record a change of ownership.
    pub fn set_current_rank(&mut self, rank: Rank) {
        self.current_rank = rank;
    }

    /// Copy of this id owned by `rank`.
    pub fn with_current_rank(mut self, rank: Rank) -> Self {
        self.current_rank = rank;
        self
    }

    /// Whether `rank` owns this agent.
    pub fn is_local_to(&self, rank: Rank) -> bool {
        self.current_rank == rank
    }

    fn key(&self) -> (u64, Rank, u32) {
        (self.id, self.starting_rank, self.agent_type)
    }
}

impl PartialEq for AgentId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for AgentId {}

impl Hash for AgentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for AgentId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AgentId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AgentId({}, {}, {}) @ {}",
            self.id, self.starting_rank, self.agent_type, self.current_rank
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_ignores_current_rank() {
        let a = AgentId::new(7, Rank(2), 1);
        let moved = a.with_current_rank(Rank(5));
        assert_eq!(a, moved);
        assert_eq!(moved.current_rank(), Rank(5));
        assert_eq!(moved.starting_rank(), Rank(2));

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&moved));
    }

    #[test]
    fn distinct_type_is_distinct_agent() {
        let a = AgentId::new(7, Rank(2), 1);
        let b = AgentId::new(7, Rank(2), 2);
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn locality_follows_current_rank() {
        let mut a = AgentId::new(1, Rank(0), 0);
        assert!(a.is_local_to(Rank(0)));
        a.set_current_rank(Rank(3));
        assert!(!a.is_local_to(Rank(0)));
        assert!(a.is_local_to(Rank(3)));
    }

    #[test]
    fn display_formats() {
        let a = AgentId::new(4, Rank(1), 0).with_current_rank(Rank(2));
        assert_eq!(a.to_string(), "AgentId(4, 1, 0) @ 2");
        assert_eq!(Rank(3).to_string(), "3");
        assert_eq!(Tag(12).to_string(), "12");
    }
}
