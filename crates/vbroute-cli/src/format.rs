//! Rendering configs and routing answers for the terminal.
//!
//! Every renderer has a text form (colorized with `colored`) and a JSON
//! form for scripting. Hostnames and bucket names come from untrusted
//! documents, so text output strips control sequences before printing.

use colored::Colorize;
use serde_json::{json, Value};
use vbroute::{Config, ConfigDiff, KeyMapping};

/// How command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colorized text.
    Text,
    /// One JSON document per command.
    Json,
}

/// Strips ANSI escape sequences and other control characters so a hostile
/// document cannot drive the terminal. Keeps printable text and tabs.
fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if let Some('[') = chars.next() {
                // CSI sequence, consume until the final letter
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else if ch == '\t' || !ch.is_control() {
            out.push(ch);
        }
    }
    out
}

fn or_none(value: Option<String>) -> String {
    value.unwrap_or_else(|| "(none)".dimmed().to_string())
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

/// `ix (authority)`, or a dimmed placeholder for an unassigned slot.
fn server_label(cfg: &Config, ix: Option<usize>) -> String {
    match ix.and_then(|ix| cfg.server(ix).map(|s| (ix, s))) {
        Some((ix, s)) => format!(
            "{} ({})",
            ix.to_string().yellow(),
            sanitize(&s.authority).green()
        ),
        None => "(unassigned)".dimmed().to_string(),
    }
}

fn authority(cfg: &Config, ix: Option<usize>) -> Value {
    ix.and_then(|ix| cfg.server(ix))
        .map_or(Value::Null, |s| json!(s.authority))
}

pub fn info_text(cfg: &Config) -> String {
    let caps = if cfg.capabilities().is_empty() {
        "-".to_string()
    } else {
        sanitize(&cfg.capabilities().join(","))
    };
    let rows = [
        ("name", sanitize(cfg.name()).bold().to_string()),
        ("uuid", or_none(cfg.bucket_uuid().map(sanitize))),
        ("revision", or_none(cfg.revision().map(|r| r.to_string()))),
        ("distribution", cfg.dist_type().to_string().cyan().to_string()),
        (
            "servers",
            format!("{} ({} data)", cfg.server_count(), cfg.data_server_count()),
        ),
        ("replicas", cfg.replica_count().to_string()),
        ("vbuckets", cfg.vbucket_count().to_string()),
        ("forward map", yes_no(cfg.forward_map().is_some()).to_string()),
        ("capabilities", caps),
    ];
    rows.iter()
        .map(|(label, value)| format!("{:<14}{value}", format!("{label}:")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn info_json(cfg: &Config) -> Value {
    json!({
        "name": cfg.name(),
        "uuid": cfg.bucket_uuid(),
        "rev": cfg.revision(),
        "distribution": cfg.dist_type().to_string(),
        "servers": cfg.server_count(),
        "dataServers": cfg.data_server_count(),
        "replicas": cfg.replica_count(),
        "vbuckets": cfg.vbucket_count(),
        "forwardMap": cfg.forward_map().is_some(),
        "capabilities": cfg.capabilities(),
    })
}

pub fn servers_text(cfg: &Config) -> String {
    let counts = cfg.primary_counts();
    let mut lines = Vec::with_capacity(cfg.server_count());
    for (ix, s) in cfg.servers().iter().enumerate() {
        let role = if s.is_data_node() {
            "data".green()
        } else {
            "other".dimmed()
        };
        let mut line = format!(
            "{}) {} {role} {}",
            ix,
            sanitize(&s.authority).bold(),
            s.services
        );
        if !s.services_ssl.is_empty() {
            line.push_str(&format!(" tls: {}", s.services_ssl));
        }
        if let Some(n) = counts.get(&ix) {
            line.push_str(&format!(" primary for {}", n.to_string().yellow()));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn servers_json(cfg: &Config) -> Value {
    let counts = cfg.primary_counts();
    let servers: Vec<Value> = cfg
        .servers()
        .iter()
        .enumerate()
        .map(|(ix, s)| {
            json!({
                "index": ix,
                "hostname": s.hostname,
                "authority": s.authority,
                "data": s.is_data_node(),
                "services": s.services.to_string(),
                "servicesTls": s.services_ssl.to_string(),
                "primaryFor": counts.get(&ix).copied().unwrap_or(0),
            })
        })
        .collect();
    Value::Array(servers)
}

pub fn mapping_text(cfg: &Config, key: &str, m: &KeyMapping) -> String {
    let key = format!("\"{}\"", sanitize(key));
    match cfg.dist_type() {
        vbroute::DistributionType::Partitioned => format!(
            "{key} -> vbucket {}, server {}",
            m.vbid.to_string().cyan(),
            server_label(cfg, m.server)
        ),
        vbroute::DistributionType::ConsistentHash => {
            format!("{key} -> server {}", server_label(cfg, m.server))
        }
    }
}

pub fn mapping_json(cfg: &Config, key: &str, m: &KeyMapping) -> Value {
    json!({
        "key": key,
        "vbucket": m.vbid,
        "server": m.server,
        "authority": authority(cfg, m.server),
    })
}

pub fn remap_text(cfg: &Config, vbid: usize, rejected: usize, next: Option<usize>) -> String {
    match next {
        Some(_) => format!(
            "vbucket {}: server {rejected} rejected, try server {}",
            vbid.to_string().cyan(),
            server_label(cfg, next)
        ),
        None => format!(
            "vbucket {}: {}",
            vbid.to_string().cyan(),
            format!("no alternative to server {rejected}").red()
        ),
    }
}

pub fn remap_json(cfg: &Config, vbid: usize, rejected: usize, next: Option<usize>) -> Value {
    json!({
        "vbucket": vbid,
        "rejected": rejected,
        "next": next,
        "authority": authority(cfg, next),
    })
}

pub fn replicas_text(cfg: &Config, vbid: usize) -> String {
    let mut lines = vec![
        format!("vbucket {}", vbid.to_string().cyan()),
        format!("  master: {}", server_label(cfg, cfg.vbmaster(vbid))),
    ];
    for i in 0..cfg.replica_count() {
        lines.push(format!(
            "  replica {}: {}",
            i + 1,
            server_label(cfg, cfg.vbreplica(vbid, i))
        ));
    }
    if cfg.forward_map().is_some() {
        lines.push(format!(
            "  forward master: {}",
            server_label(cfg, cfg.vbmaster_forward(vbid))
        ));
    }
    lines.join("\n")
}

pub fn replicas_json(cfg: &Config, vbid: usize) -> Value {
    let replicas: Vec<Option<usize>> = (0..cfg.replica_count())
        .map(|i| cfg.vbreplica(vbid, i))
        .collect();
    json!({
        "vbucket": vbid,
        "master": cfg.vbmaster(vbid),
        "replicas": replicas,
        "forwardMaster": cfg.vbmaster_forward(vbid),
    })
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        sanitize(&items.join(", "))
    }
}

pub fn diff_text(diff: &ConfigDiff) -> String {
    let kind = diff.change_kind().to_string();
    let kind = match diff.change_kind() {
        vbroute::ChangeKind::NoChange => kind.green(),
        vbroute::ChangeKind::MapChange => kind.yellow(),
        vbroute::ChangeKind::TopologyChange => kind.red(),
    };
    [
        format!("change:               {kind}"),
        format!("added:                {}", list(&diff.servers_added)),
        format!("removed:              {}", list(&diff.servers_removed)),
        format!("vbuckets moved:       {}", diff.vbuckets_moved),
        format!("sequence changed:     {}", yes_no(diff.sequence_changed)),
        format!("distribution changed: {}", yes_no(diff.distribution_changed)),
    ]
    .join("\n")
}

pub fn diff_json(diff: &ConfigDiff) -> Value {
    json!({
        "change": diff.change_kind().to_string(),
        "added": diff.servers_added,
        "removed": diff.servers_removed,
        "vbucketsMoved": diff.vbuckets_moved,
        "sequenceChanged": diff.sequence_changed,
        "distributionChanged": diff.distribution_changed,
    })
}
