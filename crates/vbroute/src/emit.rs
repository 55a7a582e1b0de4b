//! Encoding a [`Config`] back into a configuration document.
//!
//! The output uses the `nodesExt` node format and is accepted by
//! [`Config::from_json`]; parsing it yields an equal config.

use serde_json::{json, Map, Value};

use crate::server::Services;
use crate::vbucket::VbucketMap;
use crate::{Config, DistributionType, Server};

impl Config {
    /// Encodes this config as a JSON value.
    pub fn to_json_value(&self) -> Value {
        let mut doc = Map::new();
        if let Some(rev) = self.revision {
            doc.insert("rev".into(), json!(rev));
        }
        doc.insert("name".into(), json!(self.name));
        if let Some(uuid) = &self.bucket_uuid {
            doc.insert("uuid".into(), json!(uuid));
        }
        doc.insert("nodeLocator".into(), json!(self.dist_type().to_string()));
        if !self.capabilities.is_empty() {
            doc.insert("bucketCapabilities".into(), json!(self.capabilities));
        }
        doc.insert(
            "nodesExt".into(),
            Value::Array(self.servers.iter().map(node_ext).collect()),
        );

        if let (DistributionType::Partitioned, Some(map)) = (self.dist_type(), self.vbucket_map()) {
            let server_list: Vec<&str> = self
                .data_servers()
                .iter()
                .map(|s| s.authority.as_str())
                .collect();
            let mut vbsm = Map::new();
            vbsm.insert("hashAlgorithm".into(), json!("CRC"));
            vbsm.insert("numReplicas".into(), json!(self.nreplica));
            vbsm.insert("serverList".into(), json!(server_list));
            vbsm.insert("vBucketMap".into(), table(map));
            if let Some(forward) = self.forward_map() {
                vbsm.insert("vBucketMapForward".into(), table(forward));
            }
            doc.insert("vBucketServerMap".into(), Value::Object(vbsm));
        }

        Value::Object(doc)
    }

    /// Encodes this config as a compact JSON string.
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }
}

fn node_ext(server: &Server) -> Value {
    let mut services = Map::new();
    put_ports(&mut services, &server.services, "");
    put_ports(&mut services, &server.services_ssl, "SSL");
    json!({
        "hostname": server.hostname,
        "services": services,
    })
}

fn put_ports(out: &mut Map<String, Value>, svc: &Services, suffix: &str) {
    let eventing = if suffix.is_empty() {
        "eventingAdminPort"
    } else {
        "eventing"
    };
    let ports = [
        ("kv", svc.data),
        ("mgmt", svc.mgmt),
        ("capi", svc.views),
        ("n1ql", svc.query),
        ("fts", svc.search),
        ("cbas", svc.analytics),
        (eventing, svc.eventing),
    ];
    for (name, port) in ports {
        if port > 0 {
            out.insert(format!("{name}{suffix}"), json!(port));
        }
    }
}

fn table(map: &VbucketMap) -> Value {
    let rows: Vec<Value> = (0..map.len())
        .filter_map(|vb| map.row(vb))
        .map(|row| {
            Value::Array(
                row.iter()
                    .map(|ix| json!(ix.map_or(-1, |ix| ix as i64)))
                    .collect(),
            )
        })
        .collect();
    Value::Array(rows)
}
