//! Synthesizing configs for tests and tooling.

use tracing::debug;

use crate::config::{duplicate_data_authority, BucketInfo, Distribution, Layout};
use crate::error::ConfigError;
use crate::ketama::KetamaRing;
use crate::server::{Server, Services};
use crate::vbucket::{VbucketMap, MAX_VBUCKETS};
use crate::Config;

/// Inputs for [`Config::generate_with`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Bucket name.
    pub name: String,
    /// Bucket UUID, if the config should carry one.
    pub uuid: Option<String>,
    /// Servers in any order; data nodes are moved to the front. Two data
    /// servers may not share a hostname and data port.
    pub servers: Vec<Server>,
    /// Replicas per partition. Must be below the number of data servers.
    pub nreplica: usize,
    /// Number of partitions, between 1 and [`MAX_VBUCKETS`].
    pub nvbuckets: usize,
}

/// Builds the synthetic server used for slot `ix` by [`Config::generate`].
pub fn synthetic_server(ix: usize) -> Server {
    Server::new(
        format!("node{ix}.vbroute.test"),
        Services {
            data: 11210,
            mgmt: 8091,
            views: 8092,
            ..Services::default()
        },
    )
    .with_ssl(Services {
        data: 11207,
        mgmt: 18091,
        views: 18092,
        ..Services::default()
    })
}

impl Config {
    /// Generates a partitioned config over `nservers` synthetic data servers.
    ///
    /// Replica `j` of partition `i` lives on server `(i + j) % nservers`, so
    /// every server is primary for `nvbuckets / nservers` (±1) partitions.
    pub fn generate(nservers: usize, nreplica: usize, nvbuckets: usize) -> Result<Self, ConfigError> {
        if nservers < 1 {
            return Err(ConfigError::InvalidGeneratorArgs(
                "need at least one server".into(),
            ));
        }
        Self::generate_with(GenerateOptions {
            name: "default".into(),
            uuid: None,
            servers: (0..nservers).map(synthetic_server).collect(),
            nreplica,
            nvbuckets,
        })
    }

    /// Generates a partitioned config over caller-supplied servers.
    ///
    /// Only data servers receive partitions; the others are kept at the end
    /// of the server list.
    pub fn generate_with(opts: GenerateOptions) -> Result<Self, ConfigError> {
        let data_ix: Vec<usize> = opts
            .servers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_data_node())
            .map(|(ix, _)| ix)
            .collect();
        let ndatasrv = data_ix.len();

        if ndatasrv < 1 {
            return Err(ConfigError::InvalidGeneratorArgs(
                "need at least one data server".into(),
            ));
        }
        if opts.nreplica >= ndatasrv {
            return Err(ConfigError::InvalidGeneratorArgs(format!(
                "{} replicas need more than {ndatasrv} data servers",
                opts.nreplica
            )));
        }
        if opts.nvbuckets < 1 {
            return Err(ConfigError::InvalidGeneratorArgs(
                "need at least one vbucket".into(),
            ));
        }
        if opts.nvbuckets > MAX_VBUCKETS {
            return Err(ConfigError::InvalidGeneratorArgs(format!(
                "{} vbuckets exceed the limit of {MAX_VBUCKETS}",
                opts.nvbuckets
            )));
        }
        if let Some(dup) = duplicate_data_authority(&opts.servers) {
            return Err(ConfigError::InvalidGeneratorArgs(format!(
                "data server {dup} is listed more than once"
            )));
        }

        let mut map = VbucketMap::new(opts.nvbuckets, opts.nreplica).ok_or_else(|| {
            ConfigError::InvalidGeneratorArgs(format!(
                "{} vbuckets with {} replicas is too large",
                opts.nvbuckets, opts.nreplica
            ))
        })?;
        for vb in 0..opts.nvbuckets {
            for col in 0..=opts.nreplica {
                map.assign(vb, col, Some(data_ix[(vb + col) % ndatasrv]));
            }
        }

        debug!(
            servers = opts.servers.len(),
            ndatasrv,
            nreplica = opts.nreplica,
            nvbuckets = opts.nvbuckets,
            "generating config"
        );

        let info = BucketInfo {
            name: opts.name,
            uuid: opts.uuid,
            ..BucketInfo::default()
        };
        Config::assemble(
            info,
            opts.servers,
            Layout::Partitioned {
                nreplica: opts.nreplica,
                map,
                forward: None,
            },
        )
    }

    /// Converts this config to consistent hashing in place.
    ///
    /// Drops the partition tables and builds a ketama ring over the data
    /// servers. Ketama configs carry no replicas, so the replica count is
    /// reset to 0. A config that is already consistent-hash is rebuilt the
    /// same way.
    pub fn make_ketama(&mut self) {
        let ring = KetamaRing::build(self.data_servers());
        debug!(points = ring.len(), "converted config to ketama");
        self.nreplica = 0;
        self.distribution = Distribution::ConsistentHash(ring);
    }
}
