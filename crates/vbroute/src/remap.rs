//! Choosing an alternative server after a "not my vbucket" rejection.
//!
//! Remapping is a pure function of `(partition, rejected server)`: callers
//! keep no state between attempts, and a duplicated retry with the same
//! rejected index gets the same answer. Feeding each answer back in as
//! the next rejected index walks every data server holding a copy of the
//! partition, and never proposes a non-data node.

use tracing::trace;

use crate::config::Distribution;
use crate::hash::ketama_hash;
use crate::Config;

impl Config {
    /// Proposes the server to try after `rejected` refused partition `vbid`.
    ///
    /// For partitioned configs the candidates, in order, are the current
    /// primary, the fast-forward primary, the current replicas, then the
    /// fast-forward replicas (unassigned slots, duplicates and non-data
    /// nodes skipped). The answer is the candidate following `rejected` in
    /// that cycle, or the first candidate if `rejected` is not one of them.
    ///
    /// For consistent-hash configs (`vbid` must be 0) the ring is walked
    /// forward from the rejected server's first point.
    ///
    /// Returns `None` when there is no other server to try.
    pub fn remap(&self, vbid: usize, rejected: usize) -> Option<usize> {
        let next = match &self.distribution {
            Distribution::Partitioned { .. } => {
                let candidates = self.remap_candidates(vbid);
                let start = candidates
                    .iter()
                    .position(|&ix| ix == rejected)
                    .map_or(0, |pos| pos + 1);
                let n = candidates.len();
                (0..n)
                    .map(|step| candidates[(start + step) % n])
                    .find(|&ix| ix != rejected)
            }
            Distribution::ConsistentHash(ring) => {
                if vbid != 0 {
                    return None;
                }
                let from = ring.first_point_of(rejected).unwrap_or(0);
                ring.next_server(from, rejected, self.ndatasrv)
            }
        };
        trace!(vbid, rejected, next = ?next, "remap");
        next
    }

    /// Like [`remap`](Self::remap), but for a specific key.
    ///
    /// On consistent-hash configs the ring walk starts at the key's own
    /// hash, so the answer is the key's next owner on the ring.
    pub fn remap_key(&self, key: impl AsRef<[u8]>, rejected: usize) -> Option<usize> {
        match &self.distribution {
            Distribution::Partitioned { .. } => self.remap(self.key_to_partition(key), rejected),
            Distribution::ConsistentHash(ring) => {
                ring.next_server(ketama_hash(key.as_ref()), rejected, self.ndatasrv)
            }
        }
    }

    /// Iterates the remap chain starting from `start`.
    ///
    /// Yields each proposed server once and stops when the chain runs dry
    /// or comes back to a server already seen (including `start`).
    pub fn alternatives(&self, vbid: usize, start: usize) -> Alternatives<'_> {
        Alternatives {
            config: self,
            vbid,
            current: Some(start),
            seen: vec![start],
        }
    }

    /// Ordered, de-duplicated data-node owners of a partition.
    fn remap_candidates(&self, vbid: usize) -> Vec<usize> {
        let current = self.vbucket_map().and_then(|m| m.row(vbid)).unwrap_or_default();
        let forward = self.forward_map().and_then(|m| m.row(vbid)).unwrap_or_default();

        let primaries = current.first().into_iter().chain(forward.first());
        let replicas = current.iter().skip(1).chain(forward.iter().skip(1));

        let mut out = Vec::with_capacity(current.len() + forward.len());
        for ix in primaries.chain(replicas).flatten() {
            // non-data nodes never own partitions in a valid config, but
            // must not be proposed even if one slipped through
            if self.is_data_node(*ix) && !out.contains(ix) {
                out.push(*ix);
            }
        }
        out
    }
}

/// Iterator returned by [`Config::alternatives`].
#[derive(Debug)]
pub struct Alternatives<'a> {
    config: &'a Config,
    vbid: usize,
    current: Option<usize>,
    seen: Vec<usize>,
}

impl Iterator for Alternatives<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let rejected = self.current?;
        match self.config.remap(self.vbid, rejected) {
            Some(next) if !self.seen.contains(&next) => {
                self.seen.push(next);
                self.current = Some(next);
                Some(next)
            }
            _ => {
                self.current = None;
                None
            }
        }
    }
}
