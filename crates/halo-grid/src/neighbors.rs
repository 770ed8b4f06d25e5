//! Neighbor ranks of a grid and the territory each one owns.

use halo_core::{Coordinate, GridDimensions, Rank};
use halo_topology::RelativeLocation;

/// A neighboring rank and its owned box.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor<C: Coordinate> {
    rank: Rank,
    bounds: GridDimensions<C>,
}

impl<C: Coordinate> Neighbor<C> {
    /// Pair a rank with its owned box.
    pub fn new(rank: Rank, bounds: GridDimensions<C>) -> Self {
        Self { rank, bounds }
    }

    /// The neighbor's rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The neighbor's owned box.
    pub fn bounds(&self) -> &GridDimensions<C> {
        &self.bounds
    }
}

/// Neighbor table with one slot per direction of the `[-1, 1]^N` box.
///
/// Slots are indexed by [`RelativeLocation::direction_index`]. Directions
/// with no neighbor (off a non-periodic mesh edge) stay empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbors<C: Coordinate> {
    slots: Vec<Option<Neighbor<C>>>,
}

impl<C: Coordinate> Neighbors<C> {
    /// An empty table for `dims` dimensions.
    pub fn new(dims: usize) -> Self {
        Self {
            slots: vec![None; RelativeLocation::new(dims).total_values()],
        }
    }

    /// Register `neighbor` in direction `direction`.
    pub fn add(&mut self, direction: &[i32], neighbor: Neighbor<C>) {
        let i = RelativeLocation::direction_index(direction);
        if let Some(slot) = self.slots.get_mut(i) {
            *slot = Some(neighbor);
        }
    }

    /// Neighbor in direction `direction`, if any.
    pub fn get(&self, direction: &[i32]) -> Option<&Neighbor<C>> {
        self.slots
            .get(RelativeLocation::direction_index(direction))
            .and_then(Option::as_ref)
    }

    /// First registered neighbor whose box contains `pt`.
    pub fn find(&self, pt: &[C]) -> Option<&Neighbor<C>> {
        self.iter().find(|n| n.bounds.contains(pt))
    }

    /// Registered neighbors in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Neighbor<C>> {
        self.slots.iter().flatten()
    }

    /// Number of registered directions.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no direction has a neighbor.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct neighbor ranks other than `me`, ascending.
    pub fn ranks_except(&self, me: Rank) -> Vec<Rank> {
        let mut out: Vec<Rank> = self.iter().map(|n| n.rank).filter(|&r| r != me).collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
