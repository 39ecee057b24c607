//! Vertex records.
//!
//! A vertex is created the first time an address appears in the stream and
//! is kept for the lifetime of the process, so accumulated history survives
//! eviction and re-admission. Only vertices with `live = true` occupy a
//! rendering slot.

use serde::{Deserialize, Serialize};

/// Unique identifier for a vertex in the registry.
///
/// A dense index into the vertex arena. Records are never removed, so an
/// id stays valid for the process lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VertexId(pub(crate) u32);

impl VertexId {
    /// The arena slot this id refers to.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One address ever seen in the transfer stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    /// The address this vertex stands for.
    pub id: String,

    /// Accumulated relevance: sum of incident edge weights while live.
    pub score: f64,

    /// Number of currently-live incident edges.
    pub connections: u32,

    /// Highest block number of any transfer that touched this vertex.
    pub last_block: u64,

    /// The live neighbor with the most connections, as a registry index.
    /// A lookup, never an owning reference; cleared on eviction.
    pub biggest_neighbor: Option<VertexId>,

    /// Whether this vertex currently occupies a rendering slot.
    pub live: bool,

    /// Horizontal position, owned by the rendering layer once live.
    pub x: f64,

    /// Vertical position, owned by the rendering layer once live.
    pub y: f64,
}

impl Vertex {
    /// Creates a fresh non-live record for an address.
    pub(crate) fn new(id: String) -> Self {
        Self {
            id,
            score: 0.0,
            connections: 0,
            last_block: 0,
            biggest_neighbor: None,
            live: false,
            x: 0.0,
            y: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vertex_is_inert() {
        let v = Vertex::new("0xaa".to_string());
        assert!(!v.live);
        assert_eq!(v.score, 0.0);
        assert_eq!(v.connections, 0);
        assert_eq!(v.biggest_neighbor, None);
    }
}
