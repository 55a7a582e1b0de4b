//! Subcommands and their execution.
//!
//! Each command loads the documents it needs, asks the engine, and returns
//! the rendered output. Printing and exit codes are left to `main`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use thiserror::Error;
use tracing::debug;
use vbroute::{Config, ConfigError, IndexKind};

use crate::format::{self, OutputFormat};

/// Inspection and generation actions.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarize a config: bucket, distribution, dimensions.
    Info {
        /// Path to a cluster config document.
        file: PathBuf,
    },

    /// List servers with their services and ownership.
    Servers {
        /// Path to a cluster config document.
        file: PathBuf,
    },

    /// Show which partition and server own each key.
    Map {
        /// Path to a cluster config document.
        file: PathBuf,
        /// Keys to map.
        #[arg(required = true, num_args = 1..)]
        keys: Vec<String>,
    },

    /// Pick the server to try after a "not my vbucket" rejection.
    Remap {
        /// Path to a cluster config document.
        file: PathBuf,
        /// Partition the request was for (0 on ketama configs).
        vbid: usize,
        /// Index of the server that rejected it.
        rejected: usize,
    },

    /// Show the master, replicas, and forward master of a partition.
    Replicas {
        /// Path to a cluster config document.
        file: PathBuf,
        /// Partition id.
        vbid: usize,
    },

    /// Generate a synthetic config and print it as JSON.
    Generate {
        /// Number of data servers.
        #[arg(long, default_value_t = 4)]
        servers: usize,
        /// Replicas per partition.
        #[arg(long, default_value_t = 1)]
        replicas: usize,
        /// Number of partitions.
        #[arg(long, default_value_t = 1024)]
        vbuckets: usize,
        /// Bucket name.
        #[arg(long, default_value = "default")]
        name: String,
        /// Emit a consistent-hash (ketama) config instead.
        #[arg(long)]
        ketama: bool,
    },

    /// Compare two configs of the same bucket.
    Diff {
        /// The config currently in use.
        old: PathBuf,
        /// The newly received config.
        new: PathBuf,
    },
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    /// Host assumed for nodes that do not report a hostname.
    pub source_host: String,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Load { path: PathBuf, source: ConfigError },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Command {
    /// Runs the command and returns what should be printed.
    pub fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let json = ctx.format == OutputFormat::Json;
        let out = match self {
            Command::Info { file } => {
                let cfg = load(file, ctx)?;
                render(json, format::info_text(&cfg), || format::info_json(&cfg))
            }
            Command::Servers { file } => {
                let cfg = load(file, ctx)?;
                render(json, format::servers_text(&cfg), || {
                    format::servers_json(&cfg)
                })
            }
            Command::Map { file, keys } => {
                let cfg = load(file, ctx)?;
                map_keys(&cfg, keys, json)
            }
            Command::Remap {
                file,
                vbid,
                rejected,
            } => {
                let cfg = load(file, ctx)?;
                remap(&cfg, *vbid, *rejected, json)?
            }
            Command::Replicas { file, vbid } => {
                let cfg = load(file, ctx)?;
                replicas(&cfg, *vbid, json)?
            }
            Command::Generate {
                servers,
                replicas,
                vbuckets,
                name,
                ketama,
            } => generate(*servers, *replicas, *vbuckets, name, *ketama, json)?,
            Command::Diff { old, new } => {
                let old = load(old, ctx)?;
                let new = load(new, ctx)?;
                let diff = old.diff(&new);
                render(json, format::diff_text(&diff), || format::diff_json(&diff))
            }
        };
        Ok(out)
    }
}

fn load(path: &Path, ctx: &Context) -> Result<Config, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = Config::from_json_with_source(&bytes, &ctx.source_host).map_err(|source| {
        CliError::Load {
            path: path.to_path_buf(),
            source,
        }
    })?;
    debug!(path = %path.display(), servers = cfg.server_count(), "loaded config");
    Ok(cfg)
}

fn render(json: bool, text: String, doc: impl FnOnce() -> serde_json::Value) -> String {
    if json {
        doc().to_string()
    } else {
        text
    }
}

fn map_keys(cfg: &Config, keys: &[String], json: bool) -> String {
    if json {
        let docs: Vec<serde_json::Value> = keys
            .iter()
            .map(|k| format::mapping_json(cfg, k, &cfg.map_key(k)))
            .collect();
        serde_json::Value::Array(docs).to_string()
    } else {
        keys.iter()
            .map(|k| format::mapping_text(cfg, k, &cfg.map_key(k)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn remap(cfg: &Config, vbid: usize, rejected: usize, json: bool) -> Result<String, CliError> {
    cfg.get_server(rejected)?;
    let next = cfg.remap(vbid, rejected);
    Ok(render(
        json,
        format::remap_text(cfg, vbid, rejected, next),
        || format::remap_json(cfg, vbid, rejected, next),
    ))
}

fn replicas(cfg: &Config, vbid: usize, json: bool) -> Result<String, CliError> {
    if vbid >= cfg.vbucket_count() {
        return Err(ConfigError::IndexOutOfRange {
            kind: IndexKind::Vbucket,
            index: vbid,
            len: cfg.vbucket_count(),
        }
        .into());
    }
    Ok(render(json, format::replicas_text(cfg, vbid), || {
        format::replicas_json(cfg, vbid)
    }))
}

fn generate(
    servers: usize,
    replicas: usize,
    vbuckets: usize,
    name: &str,
    ketama: bool,
    json: bool,
) -> Result<String, CliError> {
    let mut cfg = Config::generate_with(vbroute::GenerateOptions {
        name: name.to_string(),
        uuid: None,
        servers: (0..servers).map(vbroute::synthetic_server).collect(),
        nreplica: replicas,
        nvbuckets: vbuckets,
    })?;
    if ketama {
        cfg.make_ketama();
    }
    let doc = cfg.to_json_value();
    // text mode pretty-prints; json mode stays on one line for piping
    Ok(if json {
        doc.to_string()
    } else {
        format!("{doc:#}")
    })
}
