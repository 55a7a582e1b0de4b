//! The cluster configuration model.
//!
//! A [`Config`] is built once, by parsing a JSON document or by the
//! generator, and is immutable afterwards. Every query is a pure read, so
//! a `Config` can be shared across threads (e.g. behind an `Arc`) without
//! locking.
//!
//! Servers are stored with data nodes first: indices `[0, ndatasrv)` are
//! data nodes and `[ndatasrv, nservers)` are nodes exposing only other
//! services. Partition tables and the ketama ring only ever refer to the
//! data prefix.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rand::prelude::IndexedRandom;
use tracing::debug;

use crate::error::ConfigError;
use crate::ketama::KetamaRing;
use crate::server::{Server, ServiceKind, ServiceMode};
use crate::vbucket::VbucketMap;

/// How keys are distributed across servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionType {
    /// Keys hash (CRC16) to a fixed set of partitions, each with an owner.
    Partitioned,
    /// Keys hash (MD5) onto a ketama ring of data servers.
    ConsistentHash,
}

impl fmt::Display for DistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionType::Partitioned => write!(f, "vbucket"),
            DistributionType::ConsistentHash => write!(f, "ketama"),
        }
    }
}

/// The distribution scheme together with its lookup structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distribution {
    Partitioned {
        map: VbucketMap,
        /// Ownership the cluster is moving towards during a rebalance.
        forward: Option<VbucketMap>,
    },
    ConsistentHash(KetamaRing),
}

impl Distribution {
    pub fn kind(&self) -> DistributionType {
        match self {
            Distribution::Partitioned { .. } => DistributionType::Partitioned,
            Distribution::ConsistentHash(_) => DistributionType::ConsistentHash,
        }
    }
}

/// A parsed or generated cluster configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) name: String,
    pub(crate) bucket_uuid: Option<String>,
    pub(crate) revision: Option<u64>,
    pub(crate) capabilities: Vec<String>,
    pub(crate) servers: Vec<Server>,
    pub(crate) ndatasrv: usize,
    pub(crate) nreplica: usize,
    pub(crate) distribution: Distribution,
}

/// Bucket-level attributes carried alongside the topology.
#[derive(Debug, Clone, Default)]
pub(crate) struct BucketInfo {
    pub name: String,
    pub uuid: Option<String>,
    pub revision: Option<u64>,
    pub capabilities: Vec<String>,
}

/// Ownership layout, with server indices into the caller's server order.
pub(crate) enum Layout {
    Partitioned {
        nreplica: usize,
        map: VbucketMap,
        forward: Option<VbucketMap>,
    },
    ConsistentHash {
        nreplica: usize,
    },
}

impl Config {
    /// Builds a validated config.
    ///
    /// Moves data nodes to the front (stable within each class), rewrites
    /// partition tables to the new order, and builds the ketama ring when
    /// needed.
    pub(crate) fn assemble(
        info: BucketInfo,
        servers: Vec<Server>,
        layout: Layout,
    ) -> Result<Self, ConfigError> {
        if servers.is_empty() {
            return Err(ConfigError::malformed("config has no servers"));
        }

        if let Some(dup) = duplicate_data_authority(&servers) {
            return Err(ConfigError::malformed(format!(
                "data server {dup} is listed more than once"
            )));
        }

        let nservers = servers.len();
        let mut new_index = vec![0usize; nservers];
        let (data, other): (Vec<_>, Vec<_>) = servers
            .into_iter()
            .enumerate()
            .partition(|(_, s)| s.is_data_node());
        let ndatasrv = data.len();
        let mut ordered = Vec::with_capacity(nservers);
        for (new_ix, (old_ix, server)) in data.into_iter().chain(other).enumerate() {
            new_index[old_ix] = new_ix;
            ordered.push(server);
        }

        let (nreplica, distribution) = match layout {
            Layout::Partitioned {
                nreplica,
                mut map,
                mut forward,
            } => {
                if map.is_empty() {
                    return Err(ConfigError::malformed("vbucket map is empty"));
                }
                let reorder = |ix: usize| new_index.get(ix).copied();
                map.remap_servers(reorder);
                check_data_owners(&map, ndatasrv, "vBucketMap")?;
                if let Some(fwd) = forward.as_mut() {
                    fwd.remap_servers(reorder);
                    check_data_owners(fwd, ndatasrv, "vBucketMapForward")?;
                }
                (nreplica, Distribution::Partitioned { map, forward })
            }
            Layout::ConsistentHash { nreplica } => {
                if ndatasrv == 0 {
                    return Err(ConfigError::malformed(
                        "consistent-hash config has no data servers",
                    ));
                }
                let ring = KetamaRing::build(&ordered[..ndatasrv]);
                (nreplica, Distribution::ConsistentHash(ring))
            }
        };

        debug!(
            name = %info.name,
            nservers,
            ndatasrv,
            nreplica,
            distribution = %distribution.kind(),
            "assembled cluster config"
        );

        Ok(Self {
            name: info.name,
            bucket_uuid: info.uuid,
            revision: info.revision,
            capabilities: info.capabilities,
            servers: ordered,
            ndatasrv,
            nreplica,
            distribution,
        })
    }

    /// Bucket name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bucket UUID, present on newer configs.
    pub fn bucket_uuid(&self) -> Option<&str> {
        self.bucket_uuid.as_deref()
    }

    /// Config revision, present on newer configs.
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    /// Returns true if this config carries a higher revision than `other`.
    /// Configs without a revision are never newer.
    pub fn is_newer_than(&self, other: &Config) -> bool {
        match (self.revision, other.revision) {
            (Some(mine), Some(theirs)) => mine > theirs,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Bucket capability flags advertised by the cluster.
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c == name)
    }

    /// The distribution scheme and its lookup structure.
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn dist_type(&self) -> DistributionType {
        self.distribution.kind()
    }

    /// Total number of servers, data and non-data.
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Number of data servers; they occupy indices `[0, ndatasrv)`.
    pub fn data_server_count(&self) -> usize {
        self.ndatasrv
    }

    /// Number of replicas per partition.
    pub fn replica_count(&self) -> usize {
        self.nreplica
    }

    /// Number of partitions; zero for consistent-hash configs.
    pub fn vbucket_count(&self) -> usize {
        self.vbucket_map().map_or(0, VbucketMap::len)
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// The data servers, in index order.
    pub fn data_servers(&self) -> &[Server] {
        &self.servers[..self.ndatasrv]
    }

    /// Returns the server at `ix`.
    pub fn get_server(&self, ix: usize) -> Result<&Server, ConfigError> {
        self.servers
            .get(ix)
            .ok_or_else(|| ConfigError::server_out_of_range(ix, self.servers.len()))
    }

    pub fn server(&self, ix: usize) -> Option<&Server> {
        self.servers.get(ix)
    }

    /// Returns true if `ix` is a data node index.
    pub fn is_data_node(&self, ix: usize) -> bool {
        ix < self.ndatasrv
    }

    /// The partition table, for partitioned configs.
    pub fn vbucket_map(&self) -> Option<&VbucketMap> {
        match &self.distribution {
            Distribution::Partitioned { map, .. } => Some(map),
            Distribution::ConsistentHash(_) => None,
        }
    }

    /// The fast-forward partition table, if a rebalance is in progress.
    pub fn forward_map(&self) -> Option<&VbucketMap> {
        match &self.distribution {
            Distribution::Partitioned { forward, .. } => forward.as_ref(),
            Distribution::ConsistentHash(_) => None,
        }
    }

    /// The ketama ring, for consistent-hash configs.
    pub fn ring(&self) -> Option<&KetamaRing> {
        match &self.distribution {
            Distribution::ConsistentHash(ring) => Some(ring),
            Distribution::Partitioned { .. } => None,
        }
    }

    /// Primary server of a partition. `None` if unassigned or if `vbid`
    /// is out of range.
    pub fn vbmaster(&self, vbid: usize) -> Option<usize> {
        self.vbucket_map()?.master(vbid)
    }

    /// The `index`-th replica of a partition. `None` if unassigned, if
    /// `index >= nreplica`, or if `vbid` is out of range.
    pub fn vbreplica(&self, vbid: usize, index: usize) -> Option<usize> {
        self.vbucket_map()?.replica(vbid, index)
    }

    /// Primary of a partition in the fast-forward map.
    pub fn vbmaster_forward(&self, vbid: usize) -> Option<usize> {
        self.forward_map()?.master(vbid)
    }

    /// Partitions whose primary is server `ix`.
    pub fn vbuckets_for_server(&self, ix: usize) -> Vec<usize> {
        self.vbucket_map()
            .map(|m| m.vbuckets_for_server(ix))
            .unwrap_or_default()
    }

    /// Number of partitions each data server is primary for. Servers that
    /// own nothing are absent; consistent-hash configs return an empty map.
    pub fn primary_counts(&self) -> HashMap<usize, usize> {
        self.vbucket_map()
            .map(VbucketMap::primary_counts)
            .unwrap_or_default()
    }

    /// `host:port` of a service on server `ix`.
    pub fn hostport(&self, ix: usize, kind: ServiceKind, mode: ServiceMode) -> Option<String> {
        self.servers.get(ix)?.hostport(kind, mode)
    }

    /// Picks a random server exposing the given service.
    pub fn random_server(&self, kind: ServiceKind, mode: ServiceMode) -> Option<usize> {
        let candidates: Vec<usize> = self
            .servers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.port(kind, mode).is_some())
            .map(|(ix, _)| ix)
            .collect();
        candidates.choose(&mut rand::rng()).copied()
    }
}

/// Returns the first data-node authority that appears more than once.
///
/// Non-data nodes may share an authority since nothing routes to them by it.
pub(crate) fn duplicate_data_authority<'a>(
    servers: impl IntoIterator<Item = &'a Server>,
) -> Option<&'a str> {
    let mut seen = HashSet::new();
    servers
        .into_iter()
        .filter(|s| s.is_data_node())
        .map(|s| s.authority.as_str())
        .find(|a| !seen.insert(*a))
}

fn check_data_owners(map: &VbucketMap, ndatasrv: usize, field: &str) -> Result<(), ConfigError> {
    match map.assigned().find(|&ix| ix >= ndatasrv) {
        Some(ix) => Err(ConfigError::malformed(format!(
            "{field} references server {ix}, which is not a data node"
        ))),
        None => Ok(()),
    }
}
