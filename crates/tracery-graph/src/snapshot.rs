//! Read-only views for the rendering collaborator.
//!
//! The renderer never touches the registries; after each ingest it takes a
//! snapshot of the live sets and diffs against the previous one using the
//! stable identities (vertex address, unordered address pair).

use crate::graph::TraceryGraph;
use serde::{Deserialize, Serialize};

/// A live vertex as exposed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexView {
    /// Stable identity for diffing across updates.
    pub id: String,
    pub score: f64,
    pub connections: u32,
    pub last_block: u64,
    pub x: f64,
    pub y: f64,
}

/// A live edge as exposed downstream.
///
/// `source`/`target` carry the first-seen direction; consumers match
/// edges across updates by the pair, order-independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub last_block: u64,
}

/// A point-in-time copy of the live sets.
///
/// Transient and rebuilt on demand; nothing here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    /// Live vertices, best-ranked first.
    pub vertices: Vec<VertexView>,
    /// Live edges in admission order.
    pub edges: Vec<EdgeView>,
    /// Highest block number observed so far.
    pub watermark: u64,
    /// The capacity in force when the snapshot was taken.
    pub capacity: usize,
}

impl TraceryGraph {
    /// Builds a snapshot of the current live sets.
    pub fn snapshot(&self) -> GraphSnapshot {
        let vertices = self
            .live_vertices()
            .map(|v| VertexView {
                id: v.id.clone(),
                score: v.score,
                connections: v.connections,
                last_block: v.last_block,
                x: v.x,
                y: v.y,
            })
            .collect();

        let edges = self
            .live_edges()
            .map(|e| EdgeView {
                source: self.vertices[e.source.index()].id.clone(),
                target: self.vertices[e.target.index()].id.clone(),
                weight: e.weight,
                last_block: e.last_block,
            })
            .collect();

        GraphSnapshot {
            vertices,
            edges,
            watermark: self.watermark(),
            capacity: self.capacity().get(),
        }
    }
}
