//! Decoding JSON configuration documents.

use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{BucketInfo, Layout};
use crate::error::ConfigError;
use crate::server::{make_authority, split_hostport, Server, Services};
use crate::vbucket::{VbucketMap, MAX_VBUCKETS};
use crate::wire::{ConfigDoc, LegacyNode, NodeExt, ServicePorts, VbucketServerMap};
use crate::Config;

/// Hostname used for `nodesExt` entries that omit one, when the caller
/// did not say which host the document came from.
pub const DEFAULT_SOURCE_HOST: &str = "localhost";

impl Config {
    /// Parses a configuration document.
    ///
    /// Returns [`ConfigError::MalformedJson`] if the input is not a JSON
    /// object and [`ConfigError::MalformedConfig`] if it does not describe
    /// a valid cluster.
    pub fn from_json(input: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        Self::from_json_with_source(input, DEFAULT_SOURCE_HOST)
    }

    /// Parses a configuration document fetched from `source_host`.
    ///
    /// Nodes that do not report their own hostname are assumed to be
    /// `source_host`, which is how a node describes itself.
    pub fn from_json_with_source(
        input: impl AsRef<[u8]>,
        source_host: &str,
    ) -> Result<Self, ConfigError> {
        let tree: Value = serde_json::from_slice(input.as_ref())
            .map_err(|e| ConfigError::MalformedJson(e.to_string()))?;
        if !tree.is_object() {
            return Err(ConfigError::MalformedJson(
                "document root is not an object".into(),
            ));
        }
        let doc: ConfigDoc =
            serde_json::from_value(tree).map_err(|e| ConfigError::malformed(e.to_string()))?;
        from_doc(doc, source_host)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Config::from_json(s)
    }
}

fn from_doc(doc: ConfigDoc, source_host: &str) -> Result<Config, ConfigError> {
    let servers = read_servers(&doc, source_host)?;

    let is_ketama = doc.node_locator.as_deref() == Some("ketama");
    let layout = match doc.vbucket_server_map {
        Some(ref vbsm) if !is_ketama => read_vbucket_layout(vbsm, &servers)?,
        _ => {
            if doc.node_locator.as_deref() == Some("vbucket") {
                return Err(ConfigError::malformed(
                    "vbucket locator without vBucketServerMap",
                ));
            }
            Layout::ConsistentHash { nreplica: 0 }
        }
    };

    debug!(
        rev = ?doc.rev,
        nodes = servers.len(),
        "parsed cluster config document"
    );

    let info = BucketInfo {
        name: doc.name.unwrap_or_default(),
        uuid: doc.uuid,
        revision: doc.rev,
        capabilities: doc.bucket_capabilities,
    };
    Config::assemble(info, servers, layout)
}

fn read_servers(doc: &ConfigDoc, source_host: &str) -> Result<Vec<Server>, ConfigError> {
    let legacy = doc.nodes.as_deref().unwrap_or_default();
    match doc.nodes_ext.as_deref() {
        Some(ext) if !ext.is_empty() => ext
            .iter()
            .enumerate()
            .map(|(i, node)| server_from_ext(node, legacy.get(i), source_host))
            .collect(),
        _ if !legacy.is_empty() => legacy.iter().map(server_from_legacy).collect(),
        _ => Err(ConfigError::malformed("config has no nodesExt or nodes")),
    }
}

fn server_from_ext(
    node: &NodeExt,
    legacy: Option<&LegacyNode>,
    source_host: &str,
) -> Result<Server, ConfigError> {
    let hostname = match node.hostname.as_deref() {
        Some(h) => strip_brackets(h).to_string(),
        None => legacy
            .and_then(|l| l.hostname.as_deref())
            .and_then(split_hostport)
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| source_host.to_string()),
    };
    if hostname.is_empty() {
        return Err(ConfigError::malformed("node has an empty hostname"));
    }

    let svc = &node.services;
    let services = Services {
        data: svc.kv.unwrap_or(0),
        mgmt: svc.mgmt.unwrap_or(0),
        views: svc.capi.unwrap_or(0),
        query: svc.n1ql.unwrap_or(0),
        search: svc.fts.unwrap_or(0),
        analytics: svc.cbas.unwrap_or(0),
        eventing: svc.eventing.unwrap_or(0),
    };
    let mut services_ssl = Services {
        data: svc.kv_ssl.unwrap_or(0),
        mgmt: svc.mgmt_ssl.unwrap_or(0),
        views: svc.capi_ssl.unwrap_or(0),
        query: svc.n1ql_ssl.unwrap_or(0),
        search: svc.fts_ssl.unwrap_or(0),
        analytics: svc.cbas_ssl.unwrap_or(0),
        eventing: svc.eventing_ssl.unwrap_or(0),
    };
    if let Some(ssl) = svc.ssl.as_deref() {
        overlay(&mut services_ssl, ssl);
    }

    Ok(Server {
        authority: make_authority(&hostname, &services),
        hostname,
        services,
        services_ssl,
    })
}

/// Applies a nested `ssl` map (plain service names) onto the TLS ports.
fn overlay(target: &mut Services, ssl: &ServicePorts) {
    let pairs = [
        (&mut target.data, ssl.kv),
        (&mut target.mgmt, ssl.mgmt),
        (&mut target.views, ssl.capi),
        (&mut target.query, ssl.n1ql),
        (&mut target.search, ssl.fts),
        (&mut target.analytics, ssl.cbas),
        (&mut target.eventing, ssl.eventing),
    ];
    for (slot, port) in pairs {
        if let Some(port) = port {
            *slot = port;
        }
    }
}

fn server_from_legacy(node: &LegacyNode) -> Result<Server, ConfigError> {
    let raw = node
        .hostname
        .as_deref()
        .ok_or_else(|| ConfigError::malformed("node is missing a hostname"))?;
    let (host, mgmt) = split_hostport(raw)
        .ok_or_else(|| ConfigError::malformed(format!("bad node hostname '{raw}'")))?;

    let services = Services {
        data: node.ports.direct.unwrap_or(0),
        mgmt,
        views: node.couch_api_base.as_deref().and_then(url_port).unwrap_or(0),
        ..Services::default()
    };
    let services_ssl = Services {
        mgmt: node.ports.https_mgmt.unwrap_or(0),
        views: node
            .ports
            .https_capi
            .or_else(|| node.couch_api_base_https.as_deref().and_then(url_port))
            .unwrap_or(0),
        ..Services::default()
    };

    Ok(Server {
        hostname: host.to_string(),
        authority: make_authority(host, &services),
        services,
        services_ssl,
    })
}

/// Extracts the port from `scheme://host:port/path`.
fn url_port(url: &str) -> Option<u16> {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let authority = rest.split('/').next()?;
    split_hostport(authority).map(|(_, port)| port)
}

fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

fn read_vbucket_layout(vbsm: &VbucketServerMap, servers: &[Server]) -> Result<Layout, ConfigError> {
    let resolved = vbsm
        .server_list
        .iter()
        .map(|entry| resolve_server(entry, servers))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(algo) = vbsm.hash_algorithm.as_deref() {
        debug!(hash_algorithm = algo, "reading vBucketServerMap");
    }

    let nreplica = vbsm.num_replicas;
    let map = read_table(&vbsm.vbucket_map, nreplica, &resolved, "vBucketMap")?;
    let forward = match vbsm.vbucket_map_forward.as_deref() {
        Some(rows) => {
            if rows.len() != vbsm.vbucket_map.len() {
                return Err(ConfigError::malformed(format!(
                    "vBucketMapForward has {} entries, vBucketMap has {}",
                    rows.len(),
                    vbsm.vbucket_map.len()
                )));
            }
            Some(read_table(rows, nreplica, &resolved, "vBucketMapForward")?)
        }
        None => None,
    };

    Ok(Layout::Partitioned {
        nreplica,
        map,
        forward,
    })
}

/// Finds the node a `serverList` entry refers to.
///
/// Matches on hostname and data port; when no hostname matches (nodes
/// that inherited the source host), falls back to a unique data port.
fn resolve_server(entry: &str, servers: &[Server]) -> Result<usize, ConfigError> {
    let (host, port) = split_hostport(entry)
        .ok_or_else(|| ConfigError::malformed(format!("bad serverList entry '{entry}'")))?;

    if let Some(ix) = servers
        .iter()
        .position(|s| s.hostname == host && s.services.data == port)
    {
        return Ok(ix);
    }

    let mut by_port = servers
        .iter()
        .enumerate()
        .filter(|(_, s)| s.services.data == port);
    match (by_port.next(), by_port.next()) {
        (Some((ix, srv)), None) => {
            warn!(
                entry,
                node = %srv.authority,
                "serverList entry matched by data port only"
            );
            Ok(ix)
        }
        _ => Err(ConfigError::malformed(format!(
            "serverList entry '{entry}' does not match any node"
        ))),
    }
}

fn read_table(
    rows: &[Vec<i64>],
    nreplica: usize,
    resolved: &[usize],
    field: &str,
) -> Result<VbucketMap, ConfigError> {
    if rows.is_empty() {
        return Err(ConfigError::malformed(format!("{field} is empty")));
    }
    if rows.len() > MAX_VBUCKETS {
        return Err(ConfigError::malformed(format!(
            "{field} has {} entries, at most {MAX_VBUCKETS} are allowed",
            rows.len()
        )));
    }
    let width = nreplica
        .checked_add(1)
        .ok_or_else(|| ConfigError::malformed(format!("numReplicas {nreplica} is out of range")))?;
    // widths are checked before allocating, so the table is bounded by the input
    if let Some((vb, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(ConfigError::malformed(format!(
            "{field}[{vb}] has {} entries, expected {width}",
            row.len()
        )));
    }
    let mut map = VbucketMap::new(rows.len(), nreplica)
        .ok_or_else(|| ConfigError::malformed(format!("{field} is too large")))?;
    for (vb, row) in rows.iter().enumerate() {
        for (col, &raw) in row.iter().enumerate() {
            let server = match raw {
                -1 => None,
                ix if ix >= 0 && (ix as usize) < resolved.len() => Some(resolved[ix as usize]),
                ix => {
                    return Err(ConfigError::malformed(format!(
                        "{field}[{vb}] references server {ix}, serverList has {}",
                        resolved.len()
                    )))
                }
            };
            map.assign(vb, col, server);
        }
    }
    Ok(map)
}
