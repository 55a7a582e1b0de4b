//! Comparing two configs of the same bucket.
//!
//! Clients receive new configs as the cluster changes; the diff tells them
//! whether connections need to be rebuilt or only routing tables swapped.

use std::collections::BTreeSet;
use std::fmt;

use crate::Config;

/// How much changed between two configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    /// Nothing the router cares about.
    NoChange,
    /// Same servers, different partition ownership.
    MapChange,
    /// Servers were added, removed, or reordered, or the distribution
    /// scheme changed.
    TopologyChange,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::NoChange => write!(f, "no change"),
            ChangeKind::MapChange => write!(f, "map change"),
            ChangeKind::TopologyChange => write!(f, "topology change"),
        }
    }
}

/// Differences between an old and a new config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiff {
    /// Authorities present only in the new config.
    pub servers_added: Vec<String>,
    /// Authorities present only in the old config.
    pub servers_removed: Vec<String>,
    /// Partitions whose primary changed (compared by authority). Partitions
    /// that exist in only one of the configs count as changed.
    pub vbuckets_moved: usize,
    /// The server list has a different order or length.
    pub sequence_changed: bool,
    /// The distribution scheme changed.
    pub distribution_changed: bool,
}

impl ConfigDiff {
    /// Computes the differences from `old` to `new`.
    pub fn between(old: &Config, new: &Config) -> Self {
        let old_set: BTreeSet<&str> = old.servers().iter().map(|s| s.authority.as_str()).collect();
        let new_set: BTreeSet<&str> = new.servers().iter().map(|s| s.authority.as_str()).collect();

        let servers_added = new_set
            .difference(&old_set)
            .map(|s| s.to_string())
            .collect();
        let servers_removed = old_set
            .difference(&new_set)
            .map(|s| s.to_string())
            .collect();

        let sequence_changed = old.server_count() != new.server_count()
            || old
                .servers()
                .iter()
                .zip(new.servers())
                .any(|(a, b)| a.authority != b.authority);

        let shared = old.vbucket_count().min(new.vbucket_count());
        let resized = old.vbucket_count().abs_diff(new.vbucket_count());
        let vbuckets_moved = (0..shared)
            .filter(|&vb| primary_authority(old, vb) != primary_authority(new, vb))
            .count()
            + resized;

        Self {
            servers_added,
            servers_removed,
            vbuckets_moved,
            sequence_changed,
            distribution_changed: old.dist_type() != new.dist_type(),
        }
    }

    /// Classifies the diff.
    pub fn change_kind(&self) -> ChangeKind {
        if self.sequence_changed
            || self.distribution_changed
            || !self.servers_added.is_empty()
            || !self.servers_removed.is_empty()
        {
            ChangeKind::TopologyChange
        } else if self.vbuckets_moved > 0 {
            ChangeKind::MapChange
        } else {
            ChangeKind::NoChange
        }
    }
}

fn primary_authority(cfg: &Config, vb: usize) -> Option<&str> {
    cfg.vbmaster(vb)
        .and_then(|ix| cfg.server(ix))
        .map(|s| s.authority.as_str())
}

impl Config {
    /// Shorthand for [`ConfigDiff::between`]`(self, newer)`.
    pub fn diff(&self, newer: &Config) -> ConfigDiff {
        ConfigDiff::between(self, newer)
    }
}
