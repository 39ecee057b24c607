//! Edge records.
//!
//! Edges are stored undirected: the transfers A→B and B→A accumulate into
//! the same record. Like vertices, records persist for the process lifetime
//! and only the `live` subset is rendered. An edge is live exactly while
//! both of its endpoints are live.

use crate::vertex::VertexId;
use serde::{Deserialize, Serialize};

/// Unique identifier for an edge in the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// The arena slot this id refers to.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The identity of an edge: its endpoint pair, order-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(VertexId, VertexId);

impl PairKey {
    /// Normalizes the pair so that (a, b) and (b, a) collide.
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// Accumulated history for one unordered address pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// First-seen source endpoint. Display direction only; the identity
    /// of the edge is the unordered pair.
    pub source: VertexId,

    /// First-seen target endpoint.
    pub target: VertexId,

    /// Total value accumulated across all occurrences of this pair,
    /// including occurrences received while the edge was not live.
    pub weight: f64,

    /// Highest block number seen for this pair.
    pub last_block: u64,

    /// Whether this edge currently occupies a rendering slot.
    pub live: bool,
}

impl EdgeRecord {
    /// Creates a fresh non-live record between two endpoints.
    pub(crate) fn new(source: VertexId, target: VertexId) -> Self {
        Self {
            source,
            target,
            weight: 0.0,
            last_block: 0,
            live: false,
        }
    }
}
