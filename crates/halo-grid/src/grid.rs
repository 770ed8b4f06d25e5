//! The generic agent grid shared by discrete and continuous spaces.

use crate::borders::BorderPolicy;
use crate::error::GridError;
use crate::neighbors::{Neighbor, Neighbors};
use halo_core::{AgentId, AgentTransfer, ConfigError, Coordinate, GridDimensions, Point, Rank};
use halo_topology::{CartesianTopology, DecompositionConfig, RelativeLocation};
use indexmap::{IndexMap, IndexSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Agents to copy to each neighbor rank.
pub type PushSets = BTreeMap<Rank, BTreeSet<AgentId>>;

/// An agent's position as reported to the ranks holding its ghost copies.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionInfo<C: Coordinate> {
    /// The agent.
    pub id: AgentId,
    /// Its position.
    pub point: Point<C>,
}

/// One rank's view of a distributed agent grid.
///
/// Holds every agent whose position lies in the owned box or in the
/// surrounding buffer strip, keyed by [`AgentId`]. Whether an agent is
/// local or a ghost is read from its
/// [`current_rank`](AgentId::current_rank). Owned boxes are half-open, so
/// a point on a shared boundary belongs to exactly one rank.
#[derive(Clone, Debug)]
pub struct SharedGrid<C: Coordinate> {
    rank: Rank,
    topology: Arc<CartesianTopology>,
    global: GridDimensions<C>,
    local: GridDimensions<C>,
    buffer: usize,
    border: BorderPolicy,
    neighbors: Neighbors<C>,
    locations: IndexMap<AgentId, Point<C>>,
}

impl<C: Coordinate> SharedGrid<C> {
    /// Build `rank`'s grid over `global`.
    ///
    /// The border policy follows the mesh: [`BorderPolicy::Wrap`] when
    /// periodic, [`BorderPolicy::Strict`] otherwise. Fails if `rank` is not
    /// in the mesh, if `global` does not match the mesh's dimensionality,
    /// or if `buffer` is wider than the owned box in some dimension.
    pub fn new(
        rank: Rank,
        topology: Arc<CartesianTopology>,
        global: GridDimensions<C>,
        buffer: usize,
    ) -> Result<Self, GridError> {
        let local = topology.local_bounds(rank, &global)?;
        if buffer > 0 {
            let b = C::from_usize(buffer);
            for dim in 0..local.dimension_count() {
                if b > local.extent_at(dim) {
                    return Err(ConfigError::BufferTooLarge {
                        dim,
                        buffer,
                        local_width: local.extent_at(dim).to_string(),
                    }
                    .into());
                }
            }
        }
        let neighbors = build_neighbors(&topology, rank, &global)?;
        log::debug!(
            "grid on rank {rank}: local {local}, buffer {buffer}, {} neighbors",
            neighbors.len()
        );
        Ok(Self {
            rank,
            border: BorderPolicy::for_mesh(topology.is_periodic()),
            topology,
            global,
            local,
            buffer,
            neighbors,
            locations: IndexMap::new(),
        })
    }

    /// Validate `config` for `world_size` ranks and build `rank`'s grid.
    pub fn from_config(
        rank: Rank,
        config: &DecompositionConfig<C>,
        world_size: usize,
    ) -> Result<Self, GridError> {
        let topology = Arc::new(config.topology(world_size)?);
        Self::new(rank, topology, config.global.clone(), config.buffer)
    }

    /// Replace the border policy.
    pub fn with_border(mut self, border: BorderPolicy) -> Self {
        self.border = border;
        self
    }

    // ── Geometry ────────────────────────────────────────────────

    /// This rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The shared process mesh.
    pub fn topology(&self) -> &Arc<CartesianTopology> {
        &self.topology
    }

    /// The global box.
    pub fn global(&self) -> &GridDimensions<C> {
        &self.global
    }

    /// The owned box.
    pub fn local(&self) -> &GridDimensions<C> {
        &self.local
    }

    /// Buffer depth.
    pub fn buffer(&self) -> usize {
        self.buffer
    }

    /// Border policy in force.
    pub fn border(&self) -> BorderPolicy {
        self.border
    }

    /// Neighbor table.
    pub fn neighbors(&self) -> &Neighbors<C> {
        &self.neighbors
    }

    /// Ranks that receive this grid's ghost copies and position updates.
    pub fn info_exchange_partners(&self) -> Vec<Rank> {
        self.neighbors.ranks_except(self.rank)
    }

    /// Ranks that agents may migrate to or from.
    pub fn agent_status_exchange_partners(&self) -> Vec<Rank> {
        self.neighbors.ranks_except(self.rank)
    }

    // ── Placement ───────────────────────────────────────────────

    fn check_dims(&self, pt: &[C]) -> Result<(), GridError> {
        if pt.len() != self.global.dimension_count() {
            return Err(GridError::DimensionMismatch {
                expected: self.global.dimension_count(),
                got: pt.len(),
            });
        }
        Ok(())
    }

    /// Put `id` at `pt` (after the border policy), replacing any previous
    /// entry for the same agent. Returns the stored point.
    pub fn place_agent(&mut self, id: AgentId, pt: &[C]) -> Result<Point<C>, GridError> {
        let at = self.border.transform(pt, &self.global)?;
        // Re-key so a changed current rank is stored.
        self.locations.shift_remove(&id);
        self.locations.insert(id, at.clone());
        Ok(at)
    }

    /// Move a present agent to `pt`. Ownership does not change.
    pub fn move_to(&mut self, id: &AgentId, pt: &[C]) -> Result<Point<C>, GridError> {
        self.check_dims(pt)?;
        if !self.locations.contains_key(id) {
            return Err(GridError::AgentNotFound { id: *id });
        }
        let at = self.border.transform(pt, &self.global)?;
        if let Some(slot) = self.locations.get_mut(id) {
            *slot = at.clone();
        }
        Ok(at)
    }

    /// Target of moving `id` by `displacement`, before the border policy.
    pub fn displaced(&self, id: &AgentId, displacement: &[C]) -> Result<Point<C>, GridError> {
        self.check_dims(displacement)?;
        let from = self
            .locations
            .get(id)
            .ok_or(GridError::AgentNotFound { id: *id })?;
        Ok(from.iter().zip(displacement).map(|(&p, &d)| p + d).collect())
    }

    /// Move a present agent by `displacement`. Returns the new point.
    pub fn move_by_displacement(
        &mut self,
        id: &AgentId,
        displacement: &[C],
    ) -> Result<Point<C>, GridError> {
        let target = self.displaced(id, displacement)?;
        self.move_to(id, &target)
    }

    /// Remove an agent, returning its last position.
    pub fn remove_agent(&mut self, id: &AgentId) -> Option<Point<C>> {
        self.locations.shift_remove(id)
    }

    /// Apply a position update from the agent's owner.
    ///
    /// A no-op returning `false` when the agent is no longer here.
    pub fn sync_move_to(&mut self, id: &AgentId, pt: &[C]) -> bool {
        match self.locations.get_mut(id) {
            Some(slot) if slot.len() == pt.len() => {
                *slot = pt.iter().copied().collect();
                true
            }
            _ => false,
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Position of `id`.
    pub fn location(&self, id: &AgentId) -> Option<&[C]> {
        self.locations.get(id).map(|p| p.as_slice())
    }

    /// Whether `id` is on this grid (local or ghost).
    pub fn contains(&self, id: &AgentId) -> bool {
        self.locations.contains_key(id)
    }

    /// Every agent and its position, in insertion order.
    pub fn agents(&self) -> impl Iterator<Item = (&AgentId, &[C])> {
        self.locations.iter().map(|(id, p)| (id, p.as_slice()))
    }

    /// Number of agents held, ghosts included.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the grid holds no agents.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Agents this rank owns.
    pub fn local_agents(&self) -> Vec<AgentId> {
        self.locations
            .keys()
            .filter(|id| id.is_local_to(self.rank))
            .copied()
            .collect()
    }

    /// Ghost copies of other ranks' agents.
    pub fn ghost_agents(&self) -> Vec<AgentId> {
        self.locations
            .keys()
            .filter(|id| !id.is_local_to(self.rank))
            .copied()
            .collect()
    }

    /// The stored id for `id`, with its current rank as last placed.
    pub fn stored_id(&self, id: &AgentId) -> Option<AgentId> {
        self.locations.get_key_value(id).map(|(k, _)| *k)
    }

    // ── Ghost bookkeeping ───────────────────────────────────────

    /// Drop every ghost copy. Returns how many were dropped.
    pub fn init_sync_buffer(&mut self) -> usize {
        let me = self.rank;
        let before = self.locations.len();
        self.locations.retain(|id, _| id.is_local_to(me));
        before - self.locations.len()
    }

    /// Current position report for a local agent.
    pub fn projection_info(&self, id: &AgentId) -> Option<ProjectionInfo<C>> {
        self.locations.get_key_value(id).map(|(k, p)| ProjectionInfo {
            id: *k,
            point: p.clone(),
        })
    }

    // ── Ownership ───────────────────────────────────────────────

    /// Request a transfer for every local agent outside the owned box.
    ///
    /// The destination is the neighbor whose box contains the agent's
    /// point. Returns the number of requests made, or
    /// [`GridError::NoOwner`] for an agent no neighbor claims.
    pub fn balance(&self, transfer: &mut dyn AgentTransfer) -> Result<usize, GridError> {
        let mut requested = 0;
        for (id, pt) in &self.locations {
            if !id.is_local_to(self.rank) || self.local.contains(pt) {
                continue;
            }
            match self.neighbors.find(pt) {
                Some(n) if n.rank() != self.rank => {
                    transfer.request_move(*id, n.rank());
                    requested += 1;
                }
                _ => {
                    log::warn!(
                        "rank {}: agent {id} at {:?} has no owning neighbor",
                        self.rank,
                        pt.as_slice()
                    );
                    return Err(GridError::NoOwner {
                        id: *id,
                        point: format!("{:?}", pt.as_slice()),
                    });
                }
            }
        }
        Ok(requested)
    }

    // ── Buffer zones ────────────────────────────────────────────

    /// Whether a non-self neighbor lies in direction `direction`.
    pub(crate) fn has_remote_neighbor(&self, direction: &[i32]) -> bool {
        self.neighbors
            .get(direction)
            .is_some_and(|n| n.rank() != self.rank)
    }

    /// Owned box shrunk by the buffer on every side facing a remote neighbor.
    pub fn unbuffered_bounds(&self) -> GridDimensions<C> {
        let n = self.local.dimension_count();
        let b = C::from_usize(self.buffer);
        let mut origin: Point<C> = Point::new();
        let mut extents: Point<C> = Point::new();
        for i in 0..n {
            let mut axis = vec![0i32; n];
            axis[i] = -1;
            let lo = if self.has_remote_neighbor(&axis) {
                self.local.origin_at(i) + b
            } else {
                self.local.origin_at(i)
            };
            axis[i] = 1;
            let hi = if self.has_remote_neighbor(&axis) {
                self.local.upper_at(i) - b
            } else {
                self.local.upper_at(i)
            };
            origin.push(lo);
            extents.push(if hi > lo { hi - lo } else { C::ZERO });
        }
        GridDimensions::new(origin, extents).unwrap_or_else(|_| self.local.clone())
    }

    /// The strip of the owned box that neighbor `direction` keeps ghosts of.
    ///
    /// Per dimension: `-1` selects `[lo, lo + buffer)`, `+1` selects
    /// `[hi - buffer, hi)`, and `0` the whole owned range.
    pub fn send_buffer_bounds(&self, direction: &[i32]) -> GridDimensions<C> {
        let b = C::from_usize(self.buffer);
        let mut origin: Point<C> = Point::new();
        let mut extents: Point<C> = Point::new();
        for (i, &d) in direction.iter().enumerate() {
            let lo = self.local.origin_at(i);
            let hi = self.local.upper_at(i);
            let (o, e) = match d.signum() {
                -1 => (lo, b),
                1 => (hi - b, b),
                _ => (lo, hi - lo),
            };
            origin.push(o);
            extents.push(e);
        }
        GridDimensions::new(origin, extents).unwrap_or_else(|_| self.local.clone())
    }

    /// Assign local agents from `to_test` to the neighbors whose buffer
    /// strip they occupy.
    ///
    /// An agent in a corner strip goes to every neighbor sharing that
    /// corner. Matched agents are removed from `to_test`. A zero buffer
    /// pushes nothing, and no agent is ever pushed to this rank itself.
    pub fn agents_to_push(&self, to_test: &mut IndexSet<AgentId>, to_push: &mut PushSets) {
        if self.buffer == 0 {
            return;
        }
        let interior = self.unbuffered_bounds();
        let zones: Vec<(Rank, GridDimensions<C>)> = RelativeLocation::new(self.local.dimension_count())
            .values()
            .filter(|d| d.iter().any(|&v| v != 0))
            .filter_map(|d| {
                let n = self.neighbors.get(&d)?;
                (n.rank() != self.rank).then(|| (n.rank(), self.send_buffer_bounds(&d)))
            })
            .collect();
        let mut matched = Vec::new();
        for id in to_test.iter() {
            if !id.is_local_to(self.rank) {
                continue;
            }
            let Some(pt) = self.locations.get(id) else {
                continue;
            };
            if interior.contains(pt) {
                continue;
            }
            let mut hit = false;
            for (rank, zone) in &zones {
                if zone.contains(pt) {
                    to_push.entry(*rank).or_default().insert(*id);
                    hit = true;
                }
            }
            if hit {
                matched.push(*id);
            }
        }
        for id in &matched {
            to_test.shift_remove(id);
        }
        log::trace!(
            "rank {}: {} agents pushed to {} ranks",
            self.rank,
            matched.len(),
            to_push.len()
        );
    }
}

fn build_neighbors<C: Coordinate>(
    topology: &CartesianTopology,
    rank: Rank,
    global: &GridDimensions<C>,
) -> Result<Neighbors<C>, GridError> {
    let n = topology.dimensions();
    let mut table = Neighbors::new(n);
    let coords = topology.coordinates(rank).ok_or(ConfigError::RankOutOfRange {
        rank,
        size: topology.size(),
    })?;
    let Some(directions) = topology.trim(rank, &RelativeLocation::new(n)) else {
        return Ok(table);
    };
    for dir in directions.values() {
        if dir.iter().all(|&v| v == 0) {
            continue;
        }
        let Some(peer) = topology.rank_of(&coords, &dir) else {
            continue;
        };
        let bounds = topology.local_bounds(peer, global)?;
        table.add(&dir, Neighbor::new(peer, bounds));
    }
    Ok(table)
}
