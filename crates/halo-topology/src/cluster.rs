//! In-process [`Communicator`] backend.
//!
//! [`LocalCluster`] wires `size` endpoints together with unbounded
//! crossbeam channels, one inbox per rank. Each [`LocalComm`] endpoint is
//! `Send` and is meant to be moved onto its own thread, so a whole process
//! mesh can run inside one OS process. Receives match on `(source, tag)`:
//! messages that arrive ahead of the one being waited for are parked in a
//! per-endpoint stash and handed out by later receives.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use halo_core::{CommError, Communicator, ConfigError, Payload, Rank, Tag};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Configuration for a [`LocalCluster`].
#[derive(Clone, Debug)]
pub struct LocalClusterConfig {
    /// Number of ranks. Must be at least 1.
    pub size: usize,
    /// How long a receive waits before failing with
    /// [`CommError::Timeout`]. `None` blocks indefinitely.
    pub recv_timeout: Option<Duration>,
}

impl Default for LocalClusterConfig {
    fn default() -> Self {
        Self {
            size: 1,
            recv_timeout: None,
        }
    }
}

#[derive(Debug)]
struct Envelope {
    source: Rank,
    tag: Tag,
    payload: Payload,
}

/// A set of connected in-process endpoints, one per rank.
///
/// # Examples
///
/// ```
/// use halo_core::{Communicator, Payload, Rank, Tag};
/// use halo_topology::LocalCluster;
///
/// let mut ends = LocalCluster::new(2).unwrap().into_endpoints();
/// let b = ends.pop().unwrap();
/// let a = ends.pop().unwrap();
/// a.send(Rank(1), Tag(7), Payload::Values(vec![1.0, 2.0])).unwrap();
/// assert_eq!(b.recv_values(Rank(0), Tag(7)).unwrap(), vec![1.0, 2.0]);
/// ```
#[derive(Debug)]
pub struct LocalCluster {
    endpoints: Vec<LocalComm>,
}

impl LocalCluster {
    /// Connect `size` ranks with blocking receives.
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        Self::with_config(&LocalClusterConfig {
            size,
            ..LocalClusterConfig::default()
        })
    }

    /// Connect ranks as described by `config`.
    ///
    /// Returns `Err(ConfigError::InvalidParameter)` for a zero-size cluster.
    pub fn with_config(config: &LocalClusterConfig) -> Result<Self, ConfigError> {
        if config.size == 0 {
            return Err(ConfigError::InvalidParameter {
                reason: "cluster size must be at least 1".to_string(),
            });
        }
        let (senders, receivers): (Vec<Sender<Envelope>>, Vec<Receiver<Envelope>>) =
            (0..config.size).map(|_| crossbeam_channel::unbounded()).unzip();
        let endpoints = receivers
            .into_iter()
            .enumerate()
            .map(|(r, inbox)| LocalComm {
                rank: Rank(r),
                outboxes: senders.clone(),
                inbox,
                stash: Mutex::new(VecDeque::new()),
                recv_timeout: config.recv_timeout,
            })
            .collect();
        Ok(Self { endpoints })
    }

    /// Number of ranks.
    pub fn size(&self) -> usize {
        self.endpoints.len()
    }

    /// Hand out the endpoints, ordered by rank.
    pub fn into_endpoints(self) -> Vec<LocalComm> {
        self.endpoints
    }
}

impl IntoIterator for LocalCluster {
    type Item = LocalComm;
    type IntoIter = std::vec::IntoIter<LocalComm>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.into_iter()
    }
}

/// One rank's endpoint in a [`LocalCluster`].
#[derive(Debug)]
pub struct LocalComm {
    rank: Rank,
    outboxes: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    stash: Mutex<VecDeque<Envelope>>,
    recv_timeout: Option<Duration>,
}

impl LocalComm {
    fn check_rank(&self, peer: Rank) -> Result<(), CommError> {
        if peer.0 >= self.outboxes.len() {
            return Err(CommError::RankOutOfRange {
                rank: peer,
                size: self.outboxes.len(),
            });
        }
        Ok(())
    }

    /// Number of messages received but not yet claimed.
    pub fn pending(&self) -> usize {
        let stash = self.stash.lock().unwrap_or_else(|e| e.into_inner());
        stash.len() + self.inbox.len()
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, dest: Rank, tag: Tag, payload: Payload) -> Result<(), CommError> {
        self.check_rank(dest)?;
        log::trace!(
            "rank {} -> {} tag {} ({})",
            self.rank,
            dest,
            tag,
            payload.kind()
        );
        self.outboxes[dest.0]
            .send(Envelope {
                source: self.rank,
                tag,
                payload,
            })
            .map_err(|_| CommError::Disconnected {
                rank: self.rank,
                peer: dest,
            })
    }

    fn recv(&self, source: Rank, tag: Tag) -> Result<Payload, CommError> {
        self.check_rank(source)?;
        let mut stash = self.stash.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pos) = stash
            .iter()
            .position(|m| m.source == source && m.tag == tag)
        {
            if let Some(env) = stash.remove(pos) {
                return Ok(env.payload);
            }
        }
        loop {
            let env = match self.recv_timeout {
                Some(limit) => self.inbox.recv_timeout(limit).map_err(|e| match e {
                    RecvTimeoutError::Timeout => CommError::Timeout {
                        rank: self.rank,
                        peer: source,
                        tag,
                    },
                    RecvTimeoutError::Disconnected => CommError::Disconnected {
                        rank: self.rank,
                        peer: source,
                    },
                })?,
                None => self.inbox.recv().map_err(|_| CommError::Disconnected {
                    rank: self.rank,
                    peer: source,
                })?,
            };
            if env.source == source && env.tag == tag {
                log::trace!("rank {} <- {} tag {}", self.rank, source, tag);
                return Ok(env.payload);
            }
            stash.push_back(env);
        }
    }
}
