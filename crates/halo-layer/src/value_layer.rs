//! One rank's slice of a distributed N-D value layer.

use crate::buffer::DoubleBuffer;
use crate::datum::DimensionDatum;
use crate::error::LayerError;
use crate::stride::StridedLayout;
use halo_core::{
    CommError, Communicator, ConfigError, GridDimensions, Offset, Payload, Rank, Tag,
};
use halo_topology::{CartesianTopology, DecompositionConfig, RelativeLocation};
use smallvec::SmallVec;
use std::sync::Arc;

/// Halo exchange rounds cycle through this many tag slots.
const SYNC_ROUNDS: u32 = 10;

/// One registered exchange direction of a [`ValueLayer`].
///
/// The outgoing slab starts at `send_offset` and the incoming one lands at
/// `receive_offset`; both have the shape described by `layout`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HaloNeighbor {
    rank: Rank,
    direction: Offset,
    layout: StridedLayout,
    send_offset: usize,
    receive_offset: usize,
    send_slot: u32,
    receive_slot: u32,
}

impl HaloNeighbor {
    /// Rank on the other side.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Direction from this rank, each component in `{-1, 0, 1}`.
    pub fn direction(&self) -> &[i32] {
        &self.direction
    }

    /// Shape of the exchanged slab.
    pub fn layout(&self) -> &StridedLayout {
        &self.layout
    }

    /// Flat index where the outgoing slab starts.
    pub fn send_offset(&self) -> usize {
        self.send_offset
    }

    /// Flat index where the incoming slab lands.
    pub fn receive_offset(&self) -> usize {
        self.receive_offset
    }

    fn send_tag(&self, round: u32) -> Tag {
        Tag(SYNC_ROUNDS * (self.send_slot + 1) + round)
    }

    fn receive_tag(&self, round: u32) -> Tag {
        Tag(SYNC_ROUNDS * (self.receive_slot + 1) + round)
    }
}

/// A rank's owned cells of a global integer grid plus a `buffer`-deep halo.
///
/// Cells are stored flat with dimension 0 fastest. Accessors take global
/// coordinates; in a periodic mesh they are first reduced into the global
/// box and then remapped across the boundary when they name the far side.
///
/// # Examples
///
/// ```
/// use halo_core::GridDimensions;
/// use halo_layer::ValueLayer;
/// use halo_topology::{CartesianTopology, LocalCluster};
/// use std::sync::Arc;
///
/// let comm = Arc::new(LocalCluster::new(1).unwrap().into_endpoints().remove(0));
/// let topo = Arc::new(CartesianTopology::new(&[1], true, 1).unwrap());
/// let global = GridDimensions::new(vec![0], vec![6]).unwrap();
/// let mut layer = ValueLayer::new(comm, topo, global, 1, 0.0).unwrap();
/// layer.set_value_at(&[5], 2.5).unwrap();
/// layer.synchronize().unwrap();
/// assert_eq!(layer.value_at(&[-1]).unwrap(), 2.5);
/// ```
pub struct ValueLayer {
    comm: Arc<dyn Communicator>,
    topology: Arc<CartesianTopology>,
    rank: Rank,
    global: GridDimensions<i32>,
    local: GridDimensions<i32>,
    buffer: usize,
    dims: Vec<DimensionDatum>,
    places: SmallVec<[usize; 4]>,
    banks: DoubleBuffer,
    neighbors: Vec<HaloNeighbor>,
    round: u32,
    closed: bool,
}

impl std::fmt::Debug for ValueLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueLayer")
            .field("rank", &self.rank)
            .field("global", &self.global)
            .field("local", &self.local)
            .field("buffer", &self.buffer)
            .field("neighbors", &self.neighbors.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl ValueLayer {
    /// Build this rank's slice and fill every cell of both banks with `initial`.
    ///
    /// Fails if the communicator and the mesh disagree on the number of
    /// ranks, if `global` does not match the mesh's dimensionality, or if
    /// `buffer` is wider than the local slice in some dimension.
    pub fn new(
        comm: Arc<dyn Communicator>,
        topology: Arc<CartesianTopology>,
        global: GridDimensions<i32>,
        buffer: usize,
        initial: f64,
    ) -> Result<Self, LayerError> {
        if comm.size() != topology.size() {
            return Err(ConfigError::ProcessCountMismatch {
                product: topology.size(),
                world_size: comm.size(),
            }
            .into());
        }
        let rank = comm.rank();
        let local = topology.local_bounds(rank, &global)?;
        let n = global.dimension_count();
        let periodic = topology.is_periodic();

        let mut dims = Vec::with_capacity(n);
        for i in 0..n {
            dims.push(DimensionDatum::new(
                i,
                (global.origin_at(i), global.extent_at(i)),
                (local.origin_at(i), local.extent_at(i)),
                buffer,
                periodic,
            )?);
        }
        let mut places: SmallVec<[usize; 4]> = SmallVec::with_capacity(n);
        let mut length = 1usize;
        for d in &dims {
            places.push(length);
            length *= d.width();
        }

        let neighbors = build_neighbors(&topology, rank, &dims, &places);
        log::debug!(
            "value layer on rank {rank}: local {local}, buffer {buffer}, {} cells, {} neighbors",
            length,
            neighbors.len()
        );

        Ok(Self {
            comm,
            topology,
            rank,
            global,
            local,
            buffer,
            dims,
            places,
            banks: DoubleBuffer::new(length, initial),
            neighbors,
            round: 0,
            closed: false,
        })
    }

    /// Validate `config` against the communicator and build the layer.
    pub fn from_config(
        comm: Arc<dyn Communicator>,
        config: &DecompositionConfig<i32>,
        initial: f64,
    ) -> Result<Self, LayerError> {
        let topology = Arc::new(config.topology(comm.size())?);
        Self::new(comm, topology, config.global.clone(), config.buffer, initial)
    }

    pub(crate) fn ensure_open(&self, op: &'static str) -> Result<(), LayerError> {
        if self.closed {
            return Err(LayerError::Closed { op });
        }
        Ok(())
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

    /// The global grid.
    pub fn global(&self) -> &GridDimensions<i32> {
        &self.global
    }

    /// The cells this rank owns.
    pub fn local(&self) -> &GridDimensions<i32> {
        &self.local
    }

    /// Halo depth.
    pub fn buffer(&self) -> usize {
        self.buffer
    }

    /// Per-dimension bounds.
    pub fn dimensions(&self) -> &[DimensionDatum] {
        &self.dims
    }

    /// Flat-index place values, dimension 0 first.
    pub fn places(&self) -> &[usize] {
        &self.places
    }

    /// Cells per bank, halo included.
    pub fn len(&self) -> usize {
        self.banks.len()
    }

    /// Whether the layer holds no cells.
    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Registered exchange directions.
    pub fn neighbors(&self) -> &[HaloNeighbor] {
        &self.neighbors
    }

    /// The current bank, halo included.
    pub fn current_bank(&self) -> &[f64] {
        self.banks.current()
    }

    pub(crate) fn banks_mut(&mut self) -> &mut DoubleBuffer {
        &mut self.banks
    }

    /// Flat index of a global coordinate.
    pub fn flat_index(&self, coord: &[i32]) -> Result<usize, LayerError> {
        if coord.len() != self.dims.len() {
            return Err(LayerError::CoordOutOfRange {
                coord: coord.iter().copied().collect(),
            });
        }
        let mut idx = 0;
        for ((d, &c), &p) in self.dims.iter().zip(coord).zip(&self.places) {
            let i = d.indexed_coord(c).ok_or_else(|| LayerError::CoordOutOfRange {
                coord: coord.iter().copied().collect(),
            })?;
            idx += i * p;
        }
        Ok(idx)
    }

    /// Whether `coord` is a cell this rank owns.
    pub fn is_in_local_bounds(&self, coord: &[i32]) -> bool {
        coord.len() == self.dims.len()
            && self.dims.iter().zip(coord).all(|(d, &c)| d.in_local_bounds(c))
    }

    /// Flat index of an owned coordinate, without any remap.
    pub(crate) fn owned_index(&self, coord: &[i32]) -> usize {
        self.dims
            .iter()
            .zip(coord)
            .zip(&self.places)
            .map(|((d, &c), &p)| (c - d.simplified_min()) as usize * p)
            .sum()
    }

    /// Cursor over owned coordinates, or `None` if the rank owns no cells.
    pub(crate) fn owned_cells(&self) -> Option<RelativeLocation> {
        if self.dims.iter().any(|d| d.local_width() == 0) {
            return None;
        }
        let lo: Offset = self.dims.iter().map(|d| d.local_min()).collect();
        let hi: Offset = self.dims.iter().map(|d| d.local_max() - 1).collect();
        RelativeLocation::with_bounds(&lo, &hi).ok()
    }

    fn is_owned_flat(&self, flat: usize) -> bool {
        self.dims
            .iter()
            .zip(&self.places)
            .all(|(d, &p)| d.is_local_index((flat / p) % d.width()))
    }

    // ── Access ──────────────────────────────────────────────────

    /// Value at a global coordinate in the current bank.
    pub fn value_at(&self, coord: &[i32]) -> Result<f64, LayerError> {
        self.ensure_open("value_at")?;
        let i = self.flat_index(coord)?;
        Ok(self.banks.current()[i])
    }

    /// Overwrite a cell of the current bank. Returns the new value.
    pub fn set_value_at(&mut self, coord: &[i32], value: f64) -> Result<f64, LayerError> {
        self.ensure_open("set_value_at")?;
        let i = self.flat_index(coord)?;
        self.banks.current_mut()[i] = value;
        Ok(value)
    }

    /// Add to a cell of the current bank. Returns the new value.
    pub fn add_value_at(&mut self, coord: &[i32], delta: f64) -> Result<f64, LayerError> {
        self.ensure_open("add_value_at")?;
        let i = self.flat_index(coord)?;
        let cell = &mut self.banks.current_mut()[i];
        *cell += delta;
        Ok(*cell)
    }

    /// Write a cell of the other bank; visible after [`commit`](Self::commit).
    pub fn stage_value_at(&mut self, coord: &[i32], value: f64) -> Result<f64, LayerError> {
        self.ensure_open("stage_value_at")?;
        let i = self.flat_index(coord)?;
        self.banks.other_mut()[i] = value;
        Ok(value)
    }

    /// Make the other bank current.
    pub fn commit(&mut self) -> Result<(), LayerError> {
        self.ensure_open("commit")?;
        self.banks.swap();
        Ok(())
    }

    /// Every owned cell as `(global coordinate, value)`, dimension 0 fastest.
    pub fn local_values(&self) -> Result<Vec<(Offset, f64)>, LayerError> {
        self.ensure_open("local_values")?;
        let Some(cells) = self.owned_cells() else {
            return Ok(Vec::new());
        };
        let bank = self.banks.current();
        Ok(cells
            .values()
            .map(|c| {
                let v = bank[self.owned_index(&c)];
                (c, v)
            })
            .collect())
    }

    // ── Initialization ──────────────────────────────────────────

    /// Fill every cell of both banks, halo included.
    pub fn initialize(&mut self, value: f64) -> Result<(), LayerError> {
        self.ensure_open("initialize")?;
        self.banks.fill_both(value);
        Ok(())
    }

    /// Fill owned cells with `local` and halo cells with `buffer`, in both banks.
    pub fn initialize_split(&mut self, local: f64, buffer: f64) -> Result<(), LayerError> {
        self.ensure_open("initialize_split")?;
        self.fill_where(|owned| Some(if owned { local } else { buffer }));
        Ok(())
    }

    /// Fill the selected regions of both banks with `value`.
    pub fn initialize_with(
        &mut self,
        value: f64,
        fill_buffer: bool,
        fill_local: bool,
    ) -> Result<(), LayerError> {
        self.ensure_open("initialize_with")?;
        self.fill_where(|owned| ((owned && fill_local) || (!owned && fill_buffer)).then_some(value));
        Ok(())
    }

    fn fill_where(&mut self, pick: impl Fn(bool) -> Option<f64>) {
        let owned: Vec<bool> = (0..self.banks.len())
            .map(|i| self.is_owned_flat(i))
            .collect();
        let (a, b) = self.banks.banks_mut();
        for (i, &o) in owned.iter().enumerate() {
            if let Some(v) = pick(o) {
                a[i] = v;
                b[i] = v;
            }
        }
    }

    // ── Exchange ────────────────────────────────────────────────

    /// Refresh the halo of the current bank from every registered neighbor.
    ///
    /// Sends every outgoing slab first, then receives every incoming one.
    /// Halo cells with no registered neighbor are left untouched.
    pub fn synchronize(&mut self) -> Result<(), LayerError> {
        self.ensure_open("synchronize")?;
        self.exchange("synchronize")
    }

    pub(crate) fn exchange(&mut self, op: &'static str) -> Result<(), LayerError> {
        let round = self.round;
        let rank = self.rank;
        let wrap = |source: CommError| LayerError::Exchange { rank, op, source };

        for n in &self.neighbors {
            let mut slab = Vec::new();
            n.layout.gather(self.banks.current(), n.send_offset, &mut slab);
            log::trace!(
                "rank {rank} {op}: {} cells -> rank {} dir {:?}",
                slab.len(),
                n.rank,
                n.direction.as_slice()
            );
            self.comm
                .send(n.rank, n.send_tag(round), Payload::Values(slab))
                .map_err(wrap)?;
        }
        for n in &self.neighbors {
            let slab = self
                .comm
                .recv_values(n.rank, n.receive_tag(round))
                .map_err(wrap)?;
            n.layout
                .scatter(self.banks.current_mut(), n.receive_offset, &slab)
                .map_err(wrap)?;
        }
        self.round = (round + 1) % SYNC_ROUNDS;
        Ok(())
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Release both banks. Every later operation returns [`LayerError::Closed`].
    pub fn close(&mut self) {
        if !self.closed {
            log::debug!("value layer on rank {} closed", self.rank);
        }
        self.closed = true;
        self.banks = DoubleBuffer::new(0, 0.0);
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn build_neighbors(
    topology: &CartesianTopology,
    rank: Rank,
    dims: &[DimensionDatum],
    places: &[usize],
) -> Vec<HaloNeighbor> {
    let Some(coords) = topology.coordinates(rank) else {
        return Vec::new();
    };
    let Some(directions) = topology.trim(rank, &RelativeLocation::new(dims.len())) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for dir in directions.values() {
        if dir.iter().all(|&v| v == 0) {
            continue;
        }
        let Some(peer) = topology.rank_of(&coords, &dir) else {
            continue;
        };
        let layout = StridedLayout::for_direction(dims, places, &dir);
        if layout.element_count() == 0 {
            continue;
        }
        let offset = |f: &dyn Fn(&DimensionDatum, i32) -> usize| -> usize {
            dims.iter()
                .zip(dir.iter())
                .zip(places)
                .map(|((d, &r), &p)| f(d, r) * p)
                .sum()
        };
        out.push(HaloNeighbor {
            rank: peer,
            send_offset: offset(&|d, r| d.send_offset(r)),
            receive_offset: offset(&|d, r| d.receive_offset(r)),
            send_slot: RelativeLocation::direction_index(&dir) as u32,
            receive_slot: RelativeLocation::reverse_direction_index(&dir) as u32,
            direction: dir,
            layout,
        });
    }
    out
}
