//! Serde shapes of the JSON configuration document.
//!
//! Every field is optional at this layer; structural rules are enforced
//! when the document is turned into a [`Config`](crate::Config). Unknown
//! fields are ignored.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ConfigDoc {
    pub rev: Option<u64>,
    pub name: Option<String>,
    pub uuid: Option<String>,
    pub node_locator: Option<String>,
    pub bucket_capabilities: Vec<String>,
    pub nodes_ext: Option<Vec<NodeExt>>,
    pub nodes: Option<Vec<LegacyNode>>,
    #[serde(rename = "vBucketServerMap")]
    pub vbucket_server_map: Option<VbucketServerMap>,
}

/// An entry of `nodesExt`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NodeExt {
    pub hostname: Option<String>,
    pub services: ServicePorts,
}

/// The `services` object of a `nodesExt` entry.
///
/// TLS ports come either as `*SSL` siblings or as a nested `ssl` object
/// using the plain names.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ServicePorts {
    pub kv: Option<u16>,
    #[serde(rename = "kvSSL")]
    pub kv_ssl: Option<u16>,
    pub mgmt: Option<u16>,
    #[serde(rename = "mgmtSSL")]
    pub mgmt_ssl: Option<u16>,
    pub capi: Option<u16>,
    #[serde(rename = "capiSSL")]
    pub capi_ssl: Option<u16>,
    pub n1ql: Option<u16>,
    #[serde(rename = "n1qlSSL")]
    pub n1ql_ssl: Option<u16>,
    pub fts: Option<u16>,
    #[serde(rename = "ftsSSL")]
    pub fts_ssl: Option<u16>,
    pub cbas: Option<u16>,
    #[serde(rename = "cbasSSL")]
    pub cbas_ssl: Option<u16>,
    #[serde(rename = "eventingAdminPort")]
    pub eventing: Option<u16>,
    #[serde(rename = "eventingSSL")]
    pub eventing_ssl: Option<u16>,
    pub ssl: Option<Box<ServicePorts>>,
}

/// An entry of the legacy `nodes` array.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct LegacyNode {
    /// `host:mgmtport`.
    pub hostname: Option<String>,
    pub ports: LegacyPorts,
    pub couch_api_base: Option<String>,
    #[serde(rename = "couchApiBaseHTTPS")]
    pub couch_api_base_https: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LegacyPorts {
    pub direct: Option<u16>,
    #[serde(rename = "httpsMgmt")]
    pub https_mgmt: Option<u16>,
    #[serde(rename = "httpsCAPI")]
    pub https_capi: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VbucketServerMap {
    #[serde(rename = "hashAlgorithm")]
    pub hash_algorithm: Option<String>,
    #[serde(rename = "numReplicas")]
    pub num_replicas: usize,
    #[serde(rename = "serverList")]
    pub server_list: Vec<String>,
    #[serde(rename = "vBucketMap")]
    pub vbucket_map: Vec<Vec<i64>>,
    #[serde(rename = "vBucketMapForward")]
    pub vbucket_map_forward: Option<Vec<Vec<i64>>>,
}
