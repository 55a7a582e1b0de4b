//! Consistent-hash (ketama) ring.

use tracing::trace;

use crate::hash::{ketama_points, KETAMA_POINTS_PER_SERVER};
use crate::Server;

/// One point on the ring.
///
/// Field order matters: the derived `Ord` sorts by hash, then by server
/// index, which is the ring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RingPoint {
    pub hash: u32,
    pub server: usize,
}

/// A sorted, immutable ketama ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KetamaRing {
    points: Box<[RingPoint]>,
}

impl KetamaRing {
    /// Builds the ring for a list of data servers. Server `i` of the slice
    /// becomes server index `i` on the ring.
    pub fn build(data_servers: &[Server]) -> Self {
        let mut points = Vec::with_capacity(data_servers.len() * KETAMA_POINTS_PER_SERVER);
        for (ix, server) in data_servers.iter().enumerate() {
            points.extend(
                ketama_points(&server.authority).map(|hash| RingPoint { hash, server: ix }),
            );
        }
        points.sort_unstable();
        trace!(
            points = points.len(),
            servers = data_servers.len(),
            "built ketama ring"
        );
        Self {
            points: points.into_boxed_slice(),
        }
    }

    /// Number of points on the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the ring has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points, in ring order.
    pub fn points(&self) -> &[RingPoint] {
        &self.points
    }

    /// Index of the first point with `hash >= h`, wrapping to 0.
    fn position(&self, h: u32) -> usize {
        let pos = self.points.partition_point(|p| p.hash < h);
        if pos == self.points.len() {
            0
        } else {
            pos
        }
    }

    /// Returns the server owning hash `h`.
    pub fn server_for_hash(&self, h: u32) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points[self.position(h)].server)
    }

    /// Walks the ring once, starting at the point owning `h`, and returns
    /// the first server that is not `skip` and is below `limit`.
    pub fn next_server(&self, h: u32, skip: usize, limit: usize) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        let start = self.position(h);
        let n = self.points.len();
        (0..n)
            .map(|step| self.points[(start + step) % n].server)
            .find(|&srv| srv != skip && srv < limit)
    }

    /// Hash of the first (lowest) point owned by `server`, if any.
    pub fn first_point_of(&self, server: usize) -> Option<u32> {
        self.points
            .iter()
            .find(|p| p.server == server)
            .map(|p| p.hash)
    }
}
