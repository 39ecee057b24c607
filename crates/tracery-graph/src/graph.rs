//! The graph maintainer.
//!
//! TraceryGraph owns the canonical vertex and edge registries and keeps a
//! bounded, prioritized live subset of them for rendering. It's the central
//! data structure everything else works with.
//!
//! Registries are append-only arenas with a string-id index in front of
//! them. Records are created lazily on first mention and never removed, so
//! accumulated history (edge weights, block numbers) survives eviction;
//! eviction only flips `live` flags and undoes live-set statistics.

use crate::capacity::Capacity;
use crate::edge::{EdgeId, EdgeRecord, PairKey};
use crate::layout::{Layout, LayoutEdge, LayoutVertex, Viewport};
use crate::vertex::{Vertex, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracery_core::{Transfer, TransferError};

/// The bounded streaming transfer graph.
///
/// One `ingest` call per transfer event: it deduplicates vertices and
/// edges, accumulates weights and connection counts, then re-ranks the
/// live set and evicts past the configured capacity. Callers must
/// serialize `ingest` calls; all work is synchronous and in-memory.
#[derive(Debug)]
pub struct TraceryGraph {
    /// Vertex arena. Slot = VertexId.
    pub(crate) vertices: Vec<Vertex>,

    /// Edge arena. Slot = EdgeId.
    pub(crate) edges: Vec<EdgeRecord>,

    /// Maps addresses to arena slots.
    vertex_index: HashMap<String, VertexId>,

    /// Maps unordered endpoint pairs to arena slots.
    edge_index: HashMap<PairKey, EdgeId>,

    /// Live vertices, best-ranked first after every rebalance.
    pub(crate) live_vertices: Vec<VertexId>,

    /// Live edges, in admission order.
    pub(crate) live_edges: Vec<EdgeId>,

    /// Live-vertex bound, read fresh on every rebalance.
    capacity: Capacity,

    /// Render area used for initial placement.
    viewport: Viewport,

    /// Highest block number ever observed. Reporting only.
    watermark: u64,
}

impl TraceryGraph {
    /// Creates an empty graph with the given capacity handle and viewport.
    pub fn new(capacity: Capacity, viewport: Viewport) -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            vertex_index: HashMap::new(),
            edge_index: HashMap::new(),
            live_vertices: Vec::new(),
            live_edges: Vec::new(),
            capacity,
            viewport,
            watermark: 0,
        }
    }

    /// Ingests one transfer event. The single mutating entry point.
    ///
    /// Refuses malformed input before touching any state. Self-transfers
    /// advance the watermark but otherwise leave the graph unchanged.
    pub fn ingest(&mut self, transfer: &Transfer) -> Result<(), TransferError> {
        transfer.validate()?;

        self.watermark = self.watermark.max(transfer.block_number);

        if transfer.is_self_transfer() {
            return Ok(());
        }

        let from = self.resolve_vertex(&transfer.from);
        let to = self.resolve_vertex(&transfer.to);

        self.place_new(from, to);

        // Fixed from-then-to order; each endpoint is compared against the
        // other's connection count before this edge is applied.
        self.touch_vertex(from, to, transfer.block_number);
        self.touch_vertex(to, from, transfer.block_number);

        let edge = self.resolve_edge(from, to, transfer.value);
        {
            let edge = &mut self.edges[edge.index()];
            edge.last_block = edge.last_block.max(transfer.block_number);
        }

        self.rebalance();
        Ok(())
    }

    /// Returns the registry entry for an address, creating a default
    /// non-live record if the address is new. Idempotent.
    pub(crate) fn resolve_vertex(&mut self, address: &str) -> VertexId {
        if let Some(&id) = self.vertex_index.get(address) {
            return id;
        }
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex::new(address.to_string()));
        self.vertex_index.insert(address.to_string(), id);
        id
    }

    /// Looks up or creates the edge for an unordered pair and accumulates
    /// `weight` into it.
    ///
    /// A not-live-to-live transition appends the edge to the live set and
    /// credits both endpoints with one connection and the weight delta.
    /// The edge's own accumulated weight grows on every call, live or not.
    pub(crate) fn resolve_edge(&mut self, from: VertexId, to: VertexId, weight: f64) -> EdgeId {
        let key = PairKey::new(from, to);
        let id = match self.edge_index.get(&key) {
            Some(&id) => id,
            None => {
                let id = EdgeId(self.edges.len() as u32);
                self.edges.push(EdgeRecord::new(from, to));
                self.edge_index.insert(key, id);
                id
            }
        };

        let admitted = {
            let edge = &mut self.edges[id.index()];
            let admitted = !edge.live;
            edge.live = true;
            edge.weight += weight;
            admitted
        };

        if admitted {
            self.live_edges.push(id);
            for endpoint in [from, to] {
                let vertex = &mut self.vertices[endpoint.index()];
                vertex.connections += 1;
                vertex.score += weight;
            }
        }

        id
    }

    /// Seeds positions for endpoints that are not yet live.
    ///
    /// A lone new pair starts at the viewport center; a vertex joining an
    /// already-live neighbor starts on top of it, so new growth anchors to
    /// existing structure. Positions of live vertices are never touched.
    fn place_new(&mut self, from: VertexId, to: VertexId) {
        let (cx, cy) = self.viewport.center();
        let from_live = self.vertices[from.index()].live;
        let to_live = self.vertices[to.index()].live;

        match (from_live, to_live) {
            (false, false) => {
                let v = &mut self.vertices[from.index()];
                v.x = cx;
                v.y = cy;
                let v = &mut self.vertices[to.index()];
                v.x = cx;
                v.y = cy;
            }
            (false, true) => {
                let (x, y) = {
                    let v = &self.vertices[to.index()];
                    (v.x, v.y)
                };
                let v = &mut self.vertices[from.index()];
                v.x = x;
                v.y = y;
            }
            (true, false) => {
                let (x, y) = {
                    let v = &self.vertices[from.index()];
                    (v.x, v.y)
                };
                let v = &mut self.vertices[to.index()];
                v.x = x;
                v.y = y;
            }
            (true, true) => {}
        }
    }

    /// Stamps a vertex with the current block, admits it if needed, and
    /// re-evaluates its biggest neighbor against the other endpoint.
    ///
    /// The comparison reads `neighbor`'s connection count as it stands
    /// right now, before the current edge increments either side.
    fn touch_vertex(&mut self, id: VertexId, neighbor: VertexId, block: u64) {
        let neighbor_connections = self.vertices[neighbor.index()].connections;
        let best_connections = self.vertices[id.index()]
            .biggest_neighbor
            .map(|n| self.vertices[n.index()].connections);

        let vertex = &mut self.vertices[id.index()];
        // Highest-seen, so late low-block delivery cannot roll it back.
        vertex.last_block = vertex.last_block.max(block);

        let admit = !vertex.live;
        if admit {
            vertex.live = true;
        }

        match best_connections {
            None => vertex.biggest_neighbor = Some(neighbor),
            Some(best) if neighbor_connections > best => {
                vertex.biggest_neighbor = Some(neighbor)
            }
            _ => {}
        }

        if admit {
            self.live_vertices.push(id);
        }
    }

    /// Copies the live sets into layout slices, runs one placement step,
    /// and writes the resulting positions back.
    pub fn run_layout<L: Layout + ?Sized>(&mut self, layout: &mut L) {
        let mut vertices: Vec<LayoutVertex> = self
            .live_vertices
            .iter()
            .map(|&id| {
                let v = &self.vertices[id.index()];
                LayoutVertex {
                    id: v.id.clone(),
                    x: v.x,
                    y: v.y,
                    connections: v.connections,
                }
            })
            .collect();

        let slot_of: HashMap<VertexId, usize> = self
            .live_vertices
            .iter()
            .enumerate()
            .map(|(slot, &id)| (id, slot))
            .collect();

        let edges: Vec<LayoutEdge> = self
            .live_edges
            .iter()
            .map(|&eid| {
                let e = &self.edges[eid.index()];
                LayoutEdge {
                    source: slot_of[&e.source],
                    target: slot_of[&e.target],
                    weight: e.weight,
                }
            })
            .collect();

        layout.place(&mut vertices, &edges);

        for (slot, &id) in self.live_vertices.iter().enumerate() {
            let v = &mut self.vertices[id.index()];
            v.x = vertices[slot].x;
            v.y = vertices[slot].y;
        }
    }

    /// Gets a vertex record by address.
    pub fn vertex(&self, address: &str) -> Option<&Vertex> {
        let id = self.vertex_index.get(address)?;
        self.vertices.get(id.index())
    }

    /// Gets the edge record between two addresses, in either order.
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&EdgeRecord> {
        let a = *self.vertex_index.get(a)?;
        let b = *self.vertex_index.get(b)?;
        let id = self.edge_index.get(&PairKey::new(a, b))?;
        self.edges.get(id.index())
    }

    /// Iterates over live vertices, best-ranked first.
    pub fn live_vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.live_vertices
            .iter()
            .map(move |&id| &self.vertices[id.index()])
    }

    /// Iterates over live edges in admission order.
    pub fn live_edges(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.live_edges
            .iter()
            .map(move |&id| &self.edges[id.index()])
    }

    /// Number of live vertices.
    pub fn live_vertex_count(&self) -> usize {
        self.live_vertices.len()
    }

    /// Number of live edges.
    pub fn live_edge_count(&self) -> usize {
        self.live_edges.len()
    }

    /// Total vertex records ever created.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Total edge records ever created.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Highest block number observed so far.
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// The shared capacity handle.
    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    /// The configured render area.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

/// Graph statistics for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub live_vertices: usize,
    pub live_edges: usize,
    pub total_vertices: usize,
    pub total_edges: usize,
    pub watermark: u64,
}

impl TraceryGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            live_vertices: self.live_vertex_count(),
            live_edges: self.live_edge_count(),
            total_vertices: self.vertex_count(),
            total_edges: self.edge_count(),
            watermark: self.watermark,
        }
    }
}
