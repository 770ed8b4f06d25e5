//! Test utilities and mock collaborators for Halo development.
//!
//! Provides a multi-rank harness ([`run_ranks`]) that runs one thread per
//! rank over a [`LocalCluster`], a recording [`AgentTransfer`] mock, and
//! small decomposition fixtures.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use halo_core::{AgentId, AgentTransfer, Rank};
use halo_topology::{LocalCluster, LocalClusterConfig, LocalComm};
use indexmap::IndexMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Receive timeout used by [`run_ranks`], so a deadlocked exchange fails
/// the test instead of hanging it.
pub const TEST_RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `f` once per rank, each on its own thread, and collect the results
/// in rank order.
///
/// A panic on any rank is re-raised on the calling thread.
pub fn run_ranks<F, R>(size: usize, f: F) -> Vec<R>
where
    F: Fn(Arc<LocalComm>) -> R + Sync,
    R: Send,
{
    let cluster = LocalCluster::with_config(&LocalClusterConfig {
        size,
        recv_timeout: Some(TEST_RECV_TIMEOUT),
    })
    .expect("cluster size must be positive");
    thread::scope(|s| {
        let f = &f;
        let handles: Vec<_> = cluster
            .into_iter()
            .map(|comm| s.spawn(move || f(Arc::new(comm))))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}

/// [`AgentTransfer`] mock that records every request, keyed by agent.
#[derive(Debug, Default)]
pub struct RecordingTransfer {
    pub requests: IndexMap<AgentId, Rank>,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination requested for `id`, if any.
    pub fn destination(&self, id: &AgentId) -> Option<Rank> {
        self.requests.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl AgentTransfer for RecordingTransfer {
    fn request_move(&mut self, id: AgentId, dest: Rank) {
        self.requests.insert(id, dest);
    }
}

/// Agent `id` of type 0, born on and owned by `rank`.
pub fn agent(id: u64, rank: usize) -> AgentId {
    AgentId::new(id, Rank(rank), 0)
}
