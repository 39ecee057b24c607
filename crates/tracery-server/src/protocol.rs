//! Wire messages between the server and renderer clients.
//!
//! Everything is JSON text frames. Server messages are tagged unions so a
//! renderer can switch on `type`; clients match graph elements across
//! updates by their stable identities (vertex address, address pair).

use serde::{Deserialize, Serialize};
use tracery_graph::{EdgeView, GraphSnapshot, VertexView};

/// Server-to-client messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// The current live sets, sent on the render cadence.
    GraphUpdate(GraphUpdatePayload),
    /// Acknowledges a capacity adjustment, echoed to every client so
    /// multiple controls stay in sync.
    CapacityChanged(CapacityChangedPayload),
}

/// A full live-set update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUpdatePayload {
    /// Live vertex count, for quick HUD display.
    pub vertex_count: usize,
    /// Live edge count.
    pub edge_count: usize,
    /// Highest block number observed upstream.
    pub watermark: u64,
    /// Capacity in force when the update was built.
    pub capacity: usize,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// Live vertices, best-ranked first.
    pub vertices: Vec<VertexView>,
    /// Live edges in admission order.
    pub edges: Vec<EdgeView>,
}

impl GraphUpdatePayload {
    /// Wraps a snapshot for the wire.
    pub fn from_snapshot(snapshot: GraphSnapshot, timestamp: i64) -> Self {
        Self {
            vertex_count: snapshot.vertices.len(),
            edge_count: snapshot.edges.len(),
            watermark: snapshot.watermark,
            capacity: snapshot.capacity,
            timestamp,
            vertices: snapshot.vertices,
            edges: snapshot.edges,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityChangedPayload {
    pub capacity: usize,
}

/// Client-to-server messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Adjust the live-vertex capacity. Takes effect on the next ingest.
    SetCapacity { capacity: usize },
}
