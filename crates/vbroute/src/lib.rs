//! vbroute: cluster topology and key routing.
//!
//! This crate parses cluster configuration documents published by a
//! partitioned key-value store and answers the questions a client asks
//! before every request: which partition a key belongs to, which server
//! owns it, and where to go next when that server says "not my vbucket".
//!
//! # Distribution schemes
//!
//! - **Partitioned**: keys hash (CRC16) into a fixed number of vbuckets, and
//!   a table maps every vbucket to a primary plus replicas
//! - **Consistent hash**: keys hash (MD5) onto a ketama ring of 160 points
//!   per data server
//!
//! # Quick Start
//!
//! ```rust
//! use vbroute::Config;
//!
//! let cfg = Config::generate(4, 1, 1024).unwrap();
//! let m = cfg.map_key("Hello");
//! assert_eq!(m.vbid, 982);
//!
//! // the primary refused the request; try the next owner
//! let primary = m.server.unwrap();
//! let next = cfg.remap(m.vbid, primary).unwrap();
//! assert_ne!(next, primary);
//!
//! // configs round-trip through their JSON form
//! let again = Config::from_json(cfg.to_json()).unwrap();
//! assert_eq!(again, cfg);
//! ```
//!
//! A parsed [`Config`] is immutable and `Send + Sync`; share it behind an
//! `Arc` and swap in a new one when the cluster publishes a new revision.

mod config;
mod diff;
mod emit;
mod error;
mod generate;
pub mod hash;
mod ketama;
mod parse;
mod partition;
mod remap;
mod server;
mod vbucket;
mod wire;

pub use config::{Config, Distribution, DistributionType};
pub use diff::{ChangeKind, ConfigDiff};
pub use error::{ConfigError, IndexKind};
pub use generate::{synthetic_server, GenerateOptions};
pub use hash::{crc16, ketama_hash, vbucket_for_key, KETAMA_POINTS_PER_SERVER};
pub use ketama::{KetamaRing, RingPoint};
pub use parse::DEFAULT_SOURCE_HOST;
pub use partition::KeyMapping;
pub use remap::Alternatives;
pub use server::{Server, ServiceKind, ServiceMode, Services};
pub use vbucket::{VbucketMap, MAX_VBUCKETS};
