//! Tracery Graph - Bounded streaming graph maintenance
//!
//! This crate is the core of Tracery. It ingests a stream of transfer
//! events, deduplicates vertices and edges, accumulates weights and
//! connection counts, and keeps the live set bounded by ranking vertices
//! with a composite relevance key and evicting the lowest-ranked ones,
//! cascading the removal to their incident edges.
//!
//! # Architecture
//!
//! Registries are append-only arenas fronted by identity indexes:
//! - Address → vertex record (history survives eviction)
//! - Unordered address pair → edge record
//!
//! Only the `live` subsets are exposed downstream, as [`GraphSnapshot`]s.
//! Placement of live vertices is delegated to a [`Layout`] strategy; the
//! maintainer only seeds initial positions.
//!
//! # Example
//!
//! ```
//! use tracery_core::Transfer;
//! use tracery_graph::{Capacity, TraceryGraph, Viewport};
//!
//! let mut graph = TraceryGraph::new(Capacity::new(300), Viewport::default());
//!
//! graph.ingest(&Transfer::new("0xaa", "0xbb", 1.5, 100)).unwrap();
//!
//! let snapshot = graph.snapshot();
//! assert_eq!(snapshot.vertices.len(), 2);
//! ```

mod capacity;
mod edge;
mod graph;
mod layout;
mod ranking;
mod snapshot;
mod vertex;

pub use capacity::Capacity;
pub use edge::{EdgeId, EdgeRecord, PairKey};
pub use graph::{GraphStats, TraceryGraph};
pub use layout::{Layout, LayoutEdge, LayoutVertex, Viewport};
pub use snapshot::{EdgeView, GraphSnapshot, VertexView};
pub use vertex::{Vertex, VertexId};
