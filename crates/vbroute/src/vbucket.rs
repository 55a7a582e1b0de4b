//! The partition (vbucket) ownership table.

use std::collections::HashMap;

/// Largest number of partitions a table may hold. Partition ids travel as
/// 16-bit values on the wire.
pub const MAX_VBUCKETS: usize = 1 << 16;

/// Maps each partition to its primary and replica servers.
///
/// Stored as a flat `nvbuckets × (1 + nreplica)` table. Column 0 is the
/// primary, columns `1..` are replicas. `None` means no owner is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VbucketMap {
    nreplica: usize,
    table: Box<[Option<usize>]>,
}

impl VbucketMap {
    /// Creates a table with every slot unassigned.
    ///
    /// Returns `None` if `nvbuckets` exceeds [`MAX_VBUCKETS`] or the table
    /// size does not fit in a `usize`.
    pub fn new(nvbuckets: usize, nreplica: usize) -> Option<Self> {
        if nvbuckets > MAX_VBUCKETS {
            return None;
        }
        let size = nreplica.checked_add(1)?.checked_mul(nvbuckets)?;
        Some(Self {
            nreplica,
            table: vec![None; size].into_boxed_slice(),
        })
    }

    /// Number of replica columns.
    pub fn nreplica(&self) -> usize {
        self.nreplica
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.table.len() / self.width()
    }

    /// Returns true if the table has no partitions.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn width(&self) -> usize {
        self.nreplica + 1
    }

    /// Returns the owner row for a partition: primary first, then replicas.
    pub fn row(&self, vbid: usize) -> Option<&[Option<usize>]> {
        if vbid >= self.len() {
            return None;
        }
        let w = self.width();
        self.table.get(vbid * w..(vbid + 1) * w)
    }

    /// Returns the primary of a partition, if assigned.
    pub fn master(&self, vbid: usize) -> Option<usize> {
        self.row(vbid)?[0]
    }

    /// Returns the `index`-th replica of a partition, if assigned.
    pub fn replica(&self, vbid: usize, index: usize) -> Option<usize> {
        if index >= self.nreplica {
            return None;
        }
        self.row(vbid)?[index + 1]
    }

    /// Assigns one slot of a partition's row. Out-of-range positions are
    /// ignored.
    pub fn assign(&mut self, vbid: usize, column: usize, server: Option<usize>) {
        if column > self.nreplica || vbid >= self.len() {
            return;
        }
        let w = self.width();
        if let Some(entry) = self.table.get_mut(vbid * w + column) {
            *entry = server;
        }
    }

    /// Rewrites every assigned server index through `f`.
    pub(crate) fn remap_servers(&mut self, f: impl Fn(usize) -> Option<usize>) {
        for entry in self.table.iter_mut() {
            *entry = entry.and_then(&f);
        }
    }

    /// Iterates over every assigned server index in the table.
    pub(crate) fn assigned(&self) -> impl Iterator<Item = usize> + '_ {
        self.table.iter().flatten().copied()
    }

    /// Returns all partitions whose primary is `server`.
    pub fn vbuckets_for_server(&self, server: usize) -> Vec<usize> {
        (0..self.len())
            .filter(|&vb| self.master(vb) == Some(server))
            .collect()
    }

    /// Returns a count of primary partitions per server.
    pub fn primary_counts(&self) -> HashMap<usize, usize> {
        let mut counts = HashMap::new();
        for vb in 0..self.len() {
            if let Some(master) = self.master(vb) {
                *counts.entry(master).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Returns the number of partitions without a primary.
    pub fn unassigned_count(&self) -> usize {
        (0..self.len()).filter(|&vb| self.master(vb).is_none()).count()
    }
}
