//! The capability interface shared by grids and spaces.

use crate::error::GridError;
use crate::grid::{ProjectionInfo, PushSets, SharedGrid};
use halo_core::{AgentId, AgentTransfer, Coordinate, Point};
use indexmap::IndexSet;

/// A distributed container of positioned agents.
///
/// Implementors own a [`SharedGrid`] and may keep extra indexes over it,
/// so every mutation goes through the trait. Read-only decisions
/// (pushing, balancing) default to the grid's.
pub trait SharedSpace {
    /// Coordinate type of positions.
    type Coord: Coordinate;

    /// The underlying grid.
    fn grid(&self) -> &SharedGrid<Self::Coord>;

    /// Put `id` at `pt`, replacing any previous entry for the same agent.
    fn place_agent(
        &mut self,
        id: AgentId,
        pt: &[Self::Coord],
    ) -> Result<Point<Self::Coord>, GridError>;

    /// Move a present agent to `pt`.
    fn move_to(
        &mut self,
        id: &AgentId,
        pt: &[Self::Coord],
    ) -> Result<Point<Self::Coord>, GridError>;

    /// Remove an agent, returning its last position.
    fn remove_agent(&mut self, id: &AgentId) -> Option<Point<Self::Coord>>;

    /// Apply an owner's position update; `false` if the agent is absent.
    fn sync_move_to(&mut self, id: &AgentId, pt: &[Self::Coord]) -> bool;

    /// Drop every ghost copy, returning how many were dropped.
    fn init_sync_buffer(&mut self) -> usize;

    /// Move a present agent by `displacement`.
    fn move_by_displacement(
        &mut self,
        id: &AgentId,
        displacement: &[Self::Coord],
    ) -> Result<Point<Self::Coord>, GridError> {
        let target = self.grid().displaced(id, displacement)?;
        self.move_to(id, &target)
    }

    /// See [`SharedGrid::agents_to_push`].
    fn agents_to_push(&self, to_test: &mut IndexSet<AgentId>, to_push: &mut PushSets) {
        self.grid().agents_to_push(to_test, to_push);
    }

    /// See [`SharedGrid::balance`].
    fn balance(&self, transfer: &mut dyn AgentTransfer) -> Result<usize, GridError> {
        self.grid().balance(transfer)
    }

    /// Apply a position report from the agent's owner.
    fn update_projection_info(&mut self, info: &ProjectionInfo<Self::Coord>) -> bool {
        let applied = self.sync_move_to(&info.id, &info.point);
        if !applied {
            log::warn!(
                "rank {}: projection update for absent agent {}",
                self.grid().rank(),
                info.id
            );
        }
        applied
    }
}

impl<C: Coordinate> SharedSpace for SharedGrid<C> {
    type Coord = C;

    fn grid(&self) -> &SharedGrid<C> {
        self
    }

    fn place_agent(&mut self, id: AgentId, pt: &[C]) -> Result<Point<C>, GridError> {
        SharedGrid::place_agent(self, id, pt)
    }

    fn move_to(&mut self, id: &AgentId, pt: &[C]) -> Result<Point<C>, GridError> {
        SharedGrid::move_to(self, id, pt)
    }

    fn remove_agent(&mut self, id: &AgentId) -> Option<Point<C>> {
        SharedGrid::remove_agent(self, id)
    }

    fn sync_move_to(&mut self, id: &AgentId, pt: &[C]) -> bool {
        SharedGrid::sync_move_to(self, id, pt)
    }

    fn init_sync_buffer(&mut self) -> usize {
        SharedGrid::init_sync_buffer(self)
    }
}
