//! Integer-cell space with a per-cell agent index.

use crate::error::GridError;
use crate::grid::{PushSets, SharedGrid};
use crate::space::SharedSpace;
use halo_core::{AgentId, GridDimensions, Point, Rank};
use halo_topology::{CartesianTopology, DecompositionConfig};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// A [`SharedGrid`] over integer cells, indexed by cell.
///
/// Several agents may share a cell. In two dimensions the buffer-zone
/// push decision scans the eight boundary sectors cell by cell instead
/// of testing every agent against every zone box.
#[derive(Clone, Debug)]
pub struct SharedDiscreteSpace {
    grid: SharedGrid<i32>,
    cells: IndexMap<Point<i32>, Vec<AgentId>>,
}

impl SharedDiscreteSpace {
    /// Build `rank`'s space over `global`. See [`SharedGrid::new`].
    pub fn new(
        rank: Rank,
        topology: Arc<CartesianTopology>,
        global: GridDimensions<i32>,
        buffer: usize,
    ) -> Result<Self, GridError> {
        Ok(Self::from(SharedGrid::new(rank, topology, global, buffer)?))
    }

    /// Validate `config` and build `rank`'s space.
    pub fn from_config(
        rank: Rank,
        config: &DecompositionConfig<i32>,
        world_size: usize,
    ) -> Result<Self, GridError> {
        Ok(Self::from(SharedGrid::from_config(rank, config, world_size)?))
    }

    /// Agents in `cell`, local and ghost.
    pub fn agents_at(&self, cell: &[i32]) -> &[AgentId] {
        self.cells.get(cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn unindex(&mut self, id: &AgentId, cell: &[i32]) {
        if let Some(list) = self.cells.get_mut(cell) {
            list.retain(|a| a != id);
            if list.is_empty() {
                self.cells.shift_remove(cell);
            }
        }
    }

    fn index(&mut self, id: AgentId, cell: Point<i32>) {
        self.cells.entry(cell).or_default().push(id);
    }

    fn rebuild_index(&mut self) {
        self.cells.clear();
        let placed: Vec<(AgentId, Point<i32>)> = self
            .grid
            .agents()
            .map(|(id, pt)| (*id, Point::from_slice(pt)))
            .collect();
        for (id, cell) in placed {
            self.index(id, cell);
        }
    }

    /// Row range of sector `s` along dimension `dim`, or `None` if empty.
    fn sector_range(&self, dim: usize, s: i32) -> Option<(i32, i32)> {
        let local = self.grid.local();
        let b = self.grid.buffer() as i32;
        let lo = local.origin_at(dim);
        let hi = local.upper_at(dim);
        let range = match s {
            -1 => (lo, lo + b),
            1 => (hi - b, hi),
            _ => (lo + b, hi - b),
        };
        (range.0 < range.1).then_some(range)
    }

    fn push_by_sectors(&self, to_test: &mut IndexSet<AgentId>, to_push: &mut PushSets) {
        let me = self.grid.rank();
        let mut matched = Vec::new();
        for sx in -1..=1 {
            for sy in -1..=1 {
                if sx == 0 && sy == 0 {
                    continue;
                }
                let (Some((x0, x1)), Some((y0, y1))) =
                    (self.sector_range(0, sx), self.sector_range(1, sy))
                else {
                    continue;
                };
                let targets: Vec<Rank> = [(sx, 0), (0, sy), (sx, sy)]
                    .into_iter()
                    .filter(|&(dx, dy)| dx != 0 || dy != 0)
                    .filter_map(|(dx, dy)| self.grid.neighbors().get(&[dx, dy]))
                    .map(|n| n.rank())
                    .filter(|&r| r != me)
                    .collect();
                if targets.is_empty() {
                    continue;
                }
                for x in x0..x1 {
                    for y in y0..y1 {
                        for id in self.agents_at(&[x, y]) {
                            if !id.is_local_to(me) || !to_test.contains(id) {
                                continue;
                            }
                            for &r in &targets {
                                to_push.entry(r).or_default().insert(*id);
                            }
                            matched.push(*id);
                        }
                    }
                }
            }
        }
        for id in &matched {
            to_test.shift_remove(id);
        }
    }
}

impl From<SharedGrid<i32>> for SharedDiscreteSpace {
    fn from(grid: SharedGrid<i32>) -> Self {
        let mut space = Self {
            grid,
            cells: IndexMap::new(),
        };
        space.rebuild_index();
        space
    }
}

impl SharedSpace for SharedDiscreteSpace {
    type Coord = i32;

    fn grid(&self) -> &SharedGrid<i32> {
        &self.grid
    }

    fn place_agent(&mut self, id: AgentId, pt: &[i32]) -> Result<Point<i32>, GridError> {
        let old = self.grid.location(&id).map(Point::from_slice);
        let at = self.grid.place_agent(id, pt)?;
        if let Some(old) = old {
            self.unindex(&id, &old);
        }
        self.index(id, at.clone());
        Ok(at)
    }

    fn move_to(&mut self, id: &AgentId, pt: &[i32]) -> Result<Point<i32>, GridError> {
        let old = self
            .grid
            .location(id)
            .map(Point::from_slice)
            .ok_or(GridError::AgentNotFound { id: *id })?;
        let at = self.grid.move_to(id, pt)?;
        let stored = self.grid.stored_id(id).unwrap_or(*id);
        self.unindex(id, &old);
        self.index(stored, at.clone());
        Ok(at)
    }

    fn remove_agent(&mut self, id: &AgentId) -> Option<Point<i32>> {
        let at = self.grid.remove_agent(id)?;
        self.unindex(id, &at);
        Some(at)
    }

    fn sync_move_to(&mut self, id: &AgentId, pt: &[i32]) -> bool {
        let Some(old) = self.grid.location(id).map(Point::from_slice) else {
            return false;
        };
        if !self.grid.sync_move_to(id, pt) {
            return false;
        }
        let stored = self.grid.stored_id(id).unwrap_or(*id);
        self.unindex(id, &old);
        self.index(stored, Point::from_slice(pt));
        true
    }

    fn init_sync_buffer(&mut self) -> usize {
        let dropped = self.grid.init_sync_buffer();
        if dropped > 0 {
            self.rebuild_index();
        }
        dropped
    }

    /// Two-dimensional spaces whose owned box is at least two buffers wide
    /// in both dimensions scan sectors. Anything else uses the grid's
    /// zone test. Both give the same push sets.
    fn agents_to_push(&self, to_test: &mut IndexSet<AgentId>, to_push: &mut PushSets) {
        let b = self.grid.buffer() as i32;
        let local = self.grid.local();
        let sectored = b > 0
            && local.dimension_count() == 2
            && local.extent_at(0) >= 2 * b
            && local.extent_at(1) >= 2 * b;
        if sectored {
            self.push_by_sectors(to_test, to_push);
        } else {
            self.grid.agents_to_push(to_test, to_push);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo_test_utils::agent;
    use halo_test_utils::fixtures::grid_config;
    use proptest::prelude::*;

    fn space(procs: &[usize], extent: i32, buffer: usize, periodic: bool, rank: usize) -> SharedDiscreteSpace {
        let world = procs.iter().product();
        SharedDiscreteSpace::from_config(
            Rank(rank),
            &grid_config(procs, extent, buffer, periodic),
            world,
        )
        .unwrap()
    }

    fn both_ways(s: &SharedDiscreteSpace) -> (PushSets, PushSets) {
        let all: IndexSet<AgentId> = s.grid().local_agents().into_iter().collect();
        let mut by_sector = PushSets::new();
        let mut rest = all.clone();
        s.agents_to_push(&mut rest, &mut by_sector);
        let mut by_zone = PushSets::new();
        let mut rest_zone = all;
        s.grid().agents_to_push(&mut rest_zone, &mut by_zone);
        assert_eq!(rest, rest_zone);
        (by_sector, by_zone)
    }

    // ── Cell index tests ────────────────────────────────────────

    #[test]
    fn cell_index_follows_moves() {
        let mut s = space(&[1, 1], 10, 1, false, 0);
        let a = agent(1, 0);
        let b = agent(2, 0);
        s.place_agent(a, &[2, 2]).unwrap();
        s.place_agent(b, &[2, 2]).unwrap();
        assert_eq!(s.agents_at(&[2, 2]), &[a, b]);
        s.move_to(&a, &[3, 2]).unwrap();
        assert_eq!(s.agents_at(&[2, 2]), &[b]);
        assert_eq!(s.agents_at(&[3, 2]), &[a]);
        s.move_by_displacement(&b, &[0, 5]).unwrap();
        assert!(s.agents_at(&[2, 2]).is_empty());
        assert_eq!(s.occupied_cells(), 2);
        s.remove_agent(&a);
        assert!(s.agents_at(&[3, 2]).is_empty());
        assert_eq!(s.occupied_cells(), 1);
    }

    #[test]
    fn failed_move_keeps_index() {
        let mut s = space(&[1, 1], 10, 1, false, 0);
        let a = agent(1, 0);
        s.place_agent(a, &[0, 0]).unwrap();
        assert!(s.move_to(&a, &[-1, 0]).is_err());
        assert_eq!(s.agents_at(&[0, 0]), &[a]);
    }

    #[test]
    fn ghosts_leave_the_index() {
        let mut s = space(&[3, 3], 9, 1, false, 4);
        s.place_agent(agent(1, 4), &[4, 4]).unwrap();
        s.place_agent(agent(2, 3), &[4, 4]).unwrap();
        assert!(s.sync_move_to(&agent(2, 3), &[3, 3]));
        assert_eq!(s.agents_at(&[3, 3]), &[agent(2, 3)]);
        assert_eq!(s.init_sync_buffer(), 1);
        assert!(s.agents_at(&[3, 3]).is_empty());
        assert_eq!(s.agents_at(&[4, 4]), &[agent(1, 4)]);
    }

    // ── Push tests ──────────────────────────────────────────────

    #[test]
    fn center_of_three_by_three_mesh() {
        let mut s = space(&[3, 3], 9, 1, false, 4);
        // One agent per buffer sector of [3, 6)^2, plus an interior one.
        let cells = [
            [3, 3], [3, 4], [3, 5],
            [4, 3], [4, 5],
            [5, 3], [5, 4], [5, 5],
            [4, 4],
        ];
        for (i, c) in cells.iter().enumerate() {
            s.place_agent(agent(i as u64, 4), c).unwrap();
        }
        let (sector, zone) = both_ways(&s);
        assert_eq!(sector, zone);
        let targets = |id: AgentId| sector.iter().filter(|(_, ids)| ids.contains(&id)).count();
        for (i, c) in cells.iter().enumerate().take(8) {
            let corner = c[0] != 4 && c[1] != 4;
            assert_eq!(targets(agent(i as u64, 4)), if corner { 3 } else { 1 });
        }
        assert_eq!(targets(agent(8, 4)), 0);
        let low_corner: Vec<Rank> = sector
            .iter()
            .filter(|(_, ids)| ids.contains(&agent(0, 4)))
            .map(|(r, _)| *r)
            .collect();
        assert_eq!(low_corner, vec![Rank(0), Rank(1), Rank(3)]);
    }

    #[test]
    fn narrow_box_falls_back_to_zones() {
        // Owned boxes one cell wide cannot hold two buffer strips.
        let mut s = space(&[4, 1], 4, 1, true, 1);
        s.place_agent(agent(1, 1), &[1, 2]).unwrap();
        let mut test: IndexSet<AgentId> = [agent(1, 1)].into_iter().collect();
        let mut push = PushSets::new();
        s.agents_to_push(&mut test, &mut push);
        assert_eq!(push.keys().copied().collect::<Vec<_>>(), vec![Rank(0), Rank(2)]);
    }

    proptest! {
        #[test]
        fn sectors_match_zones(
            procs in prop::sample::select(vec![[1usize, 1], [2, 2], [3, 3], [2, 3], [3, 1]]),
            buffer in 0usize..3,
            periodic in any::<bool>(),
            rank_pick in 0usize..9,
            cells in prop::collection::vec((0i32..12, 0i32..12), 0..40),
        ) {
            let world = procs[0] * procs[1];
            let rank = rank_pick % world;
            let mut s = space(&procs, 12, buffer, periodic, rank);
            let me = Rank(rank);
            let mut n = 0;
            for (x, y) in cells {
                if s.grid().local().contains(&[x, y]) {
                    s.place_agent(AgentId::new(n, me, 0), &[x, y]).unwrap();
                    n += 1;
                }
            }
            let (sector, zone) = both_ways(&s);
            prop_assert_eq!(sector, zone);
        }
    }
}
