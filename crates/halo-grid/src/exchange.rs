//! Ghost refresh and migration rounds over a [`Communicator`].
//!
//! Both rounds are collective among neighbors: every rank sends exactly
//! one message to each partner, empty when it has nothing to say, then
//! receives one from each. A rank that skips a round stalls its
//! neighbors.

use crate::error::GridError;
use crate::grid::PushSets;
use crate::space::SharedSpace;
use halo_core::{AgentId, CommError, Communicator, Coordinate, Payload, Placement, Point, Rank, Tag};
use indexmap::IndexSet;

/// Tag carrying ghost copies.
pub const GHOST_TAG: Tag = Tag(0x0010_0000);

/// Tag carrying migrating agents.
pub const MIGRATE_TAG: Tag = Tag(0x0010_0001);

fn to_wire<C: Coordinate>(pt: &[C]) -> Point<f64> {
    pt.iter().map(|c| c.to_f64()).collect()
}

fn from_wire<C: Coordinate>(pt: &[f64]) -> Point<C> {
    pt.iter().map(|&v| C::from_f64(v)).collect()
}

/// Replace every ghost copy on `space` with fresh copies from its owners.
///
/// Drops the current ghosts, sends each partner the local agents in its
/// buffer strip, and installs what the partners send back. Returns the
/// number of ghosts installed.
pub fn synchronize_buffers<S: SharedSpace>(
    space: &mut S,
    comm: &dyn Communicator,
) -> Result<usize, GridError> {
    let rank = space.grid().rank();
    let wrap = |source: CommError| GridError::Exchange {
        rank,
        op: "synchronize_buffers",
        source,
    };
    space.init_sync_buffer();

    let mut to_test: IndexSet<AgentId> = space.grid().local_agents().into_iter().collect();
    let mut to_push = PushSets::new();
    space.agents_to_push(&mut to_test, &mut to_push);

    let partners = space.grid().info_exchange_partners();
    for &peer in &partners {
        let outgoing: Vec<Placement> = to_push
            .get(&peer)
            .into_iter()
            .flatten()
            .filter_map(|id| {
                let info = space.grid().projection_info(id)?;
                Some(Placement {
                    id: info.id,
                    point: to_wire(&info.point),
                })
            })
            .collect();
        log::trace!("rank {rank}: {} ghosts -> rank {peer}", outgoing.len());
        comm.send(peer, GHOST_TAG, Payload::Placements(outgoing))
            .map_err(wrap)?;
    }

    let mut installed = 0;
    for &peer in &partners {
        for p in comm.recv_placements(peer, GHOST_TAG).map_err(wrap)? {
            if p.id.is_local_to(rank) {
                log::warn!("rank {rank}: rank {peer} sent a ghost of local agent {}", p.id);
                continue;
            }
            space.place_agent(p.id, &from_wire::<S::Coord>(&p.point))?;
            installed += 1;
        }
    }
    Ok(installed)
}

/// Hand every local agent outside the owned box to its new owner.
///
/// Departing agents are removed here and arrive at their destination
/// with `current_rank` rewritten. Agents arriving from partners are
/// placed as local. Returns `(sent, received)`.
pub fn migrate<S: SharedSpace>(
    space: &mut S,
    comm: &dyn Communicator,
) -> Result<(usize, usize), GridError> {
    let rank = space.grid().rank();
    let wrap = |source: CommError| GridError::Exchange {
        rank,
        op: "migrate",
        source,
    };
    let mut moves: Vec<(AgentId, Rank)> = Vec::new();
    space.balance(&mut moves)?;

    let partners = space.grid().agent_status_exchange_partners();
    let mut sent = 0;
    for &peer in &partners {
        let mut outgoing = Vec::new();
        for (id, _) in moves.iter().filter(|(_, dest)| *dest == peer) {
            if let Some(pt) = space.remove_agent(id) {
                outgoing.push(Placement {
                    id: id.with_current_rank(peer),
                    point: to_wire(&pt),
                });
            }
        }
        sent += outgoing.len();
        log::trace!("rank {rank}: {} agents -> rank {peer}", outgoing.len());
        comm.send(peer, MIGRATE_TAG, Payload::Placements(outgoing))
            .map_err(wrap)?;
    }

    let mut received = 0;
    for &peer in &partners {
        for p in comm.recv_placements(peer, MIGRATE_TAG).map_err(wrap)? {
            space.place_agent(p.id.with_current_rank(rank), &from_wire::<S::Coord>(&p.point))?;
            received += 1;
        }
    }
    if sent + received > 0 {
        log::debug!("rank {rank}: migrated {sent} out, {received} in");
    }
    Ok((sent, received))
}
