//! Mapping keys to partitions and servers.

use crate::config::Distribution;
use crate::hash::{ketama_hash, vbucket_for_key};
use crate::Config;

/// Where a key lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMapping {
    /// Partition id; always 0 for consistent-hash configs.
    pub vbid: usize,
    /// Owning data server, `None` if the partition has no primary.
    pub server: Option<usize>,
}

impl Config {
    /// Maps a key to its partition and owning server.
    ///
    /// Deterministic for a given config and key.
    pub fn map_key(&self, key: impl AsRef<[u8]>) -> KeyMapping {
        let key = key.as_ref();
        match &self.distribution {
            Distribution::Partitioned { map, .. } => {
                let vbid = vbucket_for_key(key, map.len());
                KeyMapping {
                    vbid,
                    server: map.master(vbid),
                }
            }
            Distribution::ConsistentHash(ring) => KeyMapping {
                vbid: 0,
                server: ring.server_for_hash(ketama_hash(key)),
            },
        }
    }

    /// Returns only the partition id for a key.
    pub fn key_to_partition(&self, key: impl AsRef<[u8]>) -> usize {
        match &self.distribution {
            Distribution::Partitioned { map, .. } => vbucket_for_key(key.as_ref(), map.len()),
            Distribution::ConsistentHash(_) => 0,
        }
    }
}
