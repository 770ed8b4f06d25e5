//! Real-coordinate space.

use crate::borders::BorderPolicy;
use crate::error::GridError;
use crate::grid::SharedGrid;
use crate::space::SharedSpace;
use halo_core::{AgentId, GridDimensions, Point, Rank};
use halo_topology::{CartesianTopology, DecompositionConfig};
use std::sync::Arc;

/// A [`SharedGrid`] over `f64` positions.
#[derive(Clone, Debug)]
pub struct SharedContinuousSpace {
    grid: SharedGrid<f64>,
}

impl SharedContinuousSpace {
    /// Build `rank`'s space over `global`. See [`SharedGrid::new`].
    pub fn new(
        rank: Rank,
        topology: Arc<CartesianTopology>,
        global: GridDimensions<f64>,
        buffer: usize,
    ) -> Result<Self, GridError> {
        Ok(Self {
            grid: SharedGrid::new(rank, topology, global, buffer)?,
        })
    }

    /// Validate `config` and build `rank`'s space.
    pub fn from_config(
        rank: Rank,
        config: &DecompositionConfig<f64>,
        world_size: usize,
    ) -> Result<Self, GridError> {
        Ok(Self {
            grid: SharedGrid::from_config(rank, config, world_size)?,
        })
    }

    /// Replace the border policy.
    pub fn with_border(self, border: BorderPolicy) -> Self {
        Self {
            grid: self.grid.with_border(border),
        }
    }

    /// Agents positioned exactly at `pt`.
    pub fn agents_at(&self, pt: &[f64]) -> Vec<AgentId> {
        self.grid
            .agents()
            .filter(|(_, at)| *at == pt)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Euclidean distance between two points.
    ///
    /// Under [`BorderPolicy::Wrap`] each component takes the shorter way
    /// around the global box.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let wrap = self.grid.border() == BorderPolicy::Wrap;
        let global = self.grid.global();
        a.iter()
            .zip(b)
            .enumerate()
            .map(|(i, (&x, &y))| {
                let mut d = (x - y).abs();
                if wrap {
                    d = d.min(global.extent_at(i) - d);
                }
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

impl From<SharedGrid<f64>> for SharedContinuousSpace {
    fn from(grid: SharedGrid<f64>) -> Self {
        Self { grid }
    }
}

impl SharedSpace for SharedContinuousSpace {
    type Coord = f64;

    fn grid(&self) -> &SharedGrid<f64> {
        &self.grid
    }

    fn place_agent(&mut self, id: AgentId, pt: &[f64]) -> Result<Point<f64>, GridError> {
        self.grid.place_agent(id, pt)
    }

    fn move_to(&mut self, id: &AgentId, pt: &[f64]) -> Result<Point<f64>, GridError> {
        self.grid.move_to(id, pt)
    }

    fn remove_agent(&mut self, id: &AgentId) -> Option<Point<f64>> {
        self.grid.remove_agent(id)
    }

    fn sync_move_to(&mut self, id: &AgentId, pt: &[f64]) -> bool {
        self.grid.sync_move_to(id, pt)
    }

    fn init_sync_buffer(&mut self) -> usize {
        self.grid.init_sync_buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo_test_utils::agent;
    use halo_test_utils::fixtures::space_config;

    fn space(periodic: bool) -> SharedContinuousSpace {
        SharedContinuousSpace::from_config(Rank(0), &space_config(&[1, 1], 10.0, 1, periodic), 1)
            .unwrap()
    }

    #[test]
    fn distance_wraps_on_a_torus() {
        let torus = space(true);
        assert!((torus.distance(&[0.5, 0.0], &[9.5, 0.0]) - 1.0).abs() < 1e-12);
        assert!((torus.distance(&[1.0, 1.0], &[4.0, 5.0]) - 5.0).abs() < 1e-12);
        let flat = space(false);
        assert!((flat.distance(&[0.5, 0.0], &[9.5, 0.0]) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn agents_at_matches_exact_points() {
        let mut s = space(false);
        s.place_agent(agent(1, 0), &[1.5, 2.5]).unwrap();
        s.place_agent(agent(2, 0), &[1.5, 2.5]).unwrap();
        s.place_agent(agent(3, 0), &[1.5, 2.50001]).unwrap();
        assert_eq!(s.agents_at(&[1.5, 2.5]), vec![agent(1, 0), agent(2, 0)]);
    }

    #[test]
    fn moves_wrap_through_the_trait() {
        let mut s = space(true);
        let a = agent(1, 0);
        s.place_agent(a, &[9.0, 9.0]).unwrap();
        let at = s.move_by_displacement(&a, &[2.0, -10.0]).unwrap();
        assert!((at[0] - 1.0).abs() < 1e-12);
        assert!((at[1] - 9.0).abs() < 1e-12);
    }

    #[test]
    fn sticky_space_clamps() {
        let mut s = space(false).with_border(BorderPolicy::Sticky);
        let at = s.place_agent(agent(1, 0), &[-2.0, 11.0]).unwrap();
        assert_eq!(at[0], 0.0);
        assert!(at[1] < 10.0 && at[1] > 9.99);
    }
}
