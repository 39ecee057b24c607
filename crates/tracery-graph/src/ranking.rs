//! Vertex ranking and eviction.
//!
//! After every ingest the live vertex set is re-ranked by a composite
//! relevance key and truncated to the configured capacity; edges that lose
//! an endpoint are swept out in the same pass, with their statistics undone
//! on both endpoints so a later re-admission starts from the right
//! baseline.

use crate::graph::TraceryGraph;
use crate::vertex::VertexId;
use tracing::debug;

impl TraceryGraph {
    /// Composite relevance key, higher is better:
    ///
    /// `score − 100·(connections == 0) + last_block + 0.2·connections(biggest_neighbor)`
    ///
    /// Accumulated weight dominates, recent activity breaks ties, and
    /// adjacency to a well-connected hub nudges a vertex up. The flat −100
    /// pushes zero-connection vertices (a transient degenerate state) to
    /// the bottom regardless of score. The formula is kept literally as
    /// the renderer depends on its exact ordering, including the sharp
    /// edge where large score or block terms can straddle the ±100 bonus.
    ///
    /// The neighbor term reads the referenced vertex's current connection
    /// count whether or not it is still live.
    pub(crate) fn rank_key(&self, id: VertexId) -> f64 {
        let v = &self.vertices[id.index()];
        let zero_penalty = if v.connections == 0 { 100.0 } else { 0.0 };
        let neighbor_connections = v
            .biggest_neighbor
            .map(|n| self.vertices[n.index()].connections as f64)
            .unwrap_or(0.0);
        v.score - zero_penalty + v.last_block as f64 + 0.2 * neighbor_connections
    }

    /// Re-ranks the live set, truncates it to the capacity read fresh from
    /// the shared handle, and cascade-evicts edges that lost an endpoint.
    ///
    /// Runs after every ingest. A capacity lowered at runtime simply causes
    /// a larger-than-usual truncation here.
    pub(crate) fn rebalance(&mut self) {
        let limit = self.capacity().get();

        // Best-ranked first. The sort is stable, so equal keys keep their
        // current relative order across calls.
        let mut keyed: Vec<(VertexId, f64)> = self
            .live_vertices
            .iter()
            .map(|&id| (id, self.rank_key(id)))
            .collect();
        keyed.sort_by(|a, b| b.1.total_cmp(&a.1));
        self.live_vertices.clear();
        self.live_vertices.extend(keyed.iter().map(|&(id, _)| id));

        // Demote everything past the capacity. Connection counts and
        // scores are settled by the edge sweep below, not here.
        for &id in self.live_vertices.iter().skip(limit) {
            let vertex = &mut self.vertices[id.index()];
            vertex.live = false;
            vertex.biggest_neighbor = None;
        }
        let evicted = self.live_vertices.len().saturating_sub(limit);
        self.live_vertices.truncate(limit);

        // Single stable in-place pass: an edge survives only while both
        // endpoints are live. Removal undoes the admission effect on both
        // endpoints, clamped so malformed input order cannot drive the
        // statistics negative.
        let mut live_edges = std::mem::take(&mut self.live_edges);
        live_edges.retain(|&id| {
            let (source, target, weight) = {
                let edge = &self.edges[id.index()];
                (edge.source, edge.target, edge.weight)
            };
            if self.vertices[source.index()].live && self.vertices[target.index()].live {
                return true;
            }
            for endpoint in [source, target] {
                let vertex = &mut self.vertices[endpoint.index()];
                vertex.connections = vertex.connections.saturating_sub(1);
                vertex.score = (vertex.score - weight).max(0.0);
            }
            self.edges[id.index()].live = false;
            false
        });
        self.live_edges = live_edges;

        if evicted > 0 {
            debug!(
                "Evicted {} vertices, {} live remain",
                evicted,
                self.live_vertices.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::capacity::Capacity;
    use crate::graph::TraceryGraph;
    use crate::layout::Viewport;
    use tracery_core::Transfer;

    fn graph(capacity: usize) -> TraceryGraph {
        TraceryGraph::new(Capacity::new(capacity), Viewport::new(800.0, 600.0))
    }

    fn transfer(from: &str, to: &str, value: f64, block: u64) -> Transfer {
        Transfer::new(from, to, value, block)
    }

    /// Every live edge must have two live endpoints.
    fn assert_live_invariant(g: &TraceryGraph) {
        for edge in g.live_edges() {
            assert!(g.vertices[edge.source.index()].live);
            assert!(g.vertices[edge.target.index()].live);
        }
    }

    #[test]
    fn test_rank_key_values() {
        let mut g = graph(10);
        g.ingest(&transfer("a", "b", 10.0, 1)).unwrap();

        // score 10 + block 1 + 0.2 * (neighbor with 1 connection)
        let a = g.vertices.iter().position(|v| v.id == "a").unwrap();
        let key = g.rank_key(crate::vertex::VertexId(a as u32));
        assert!((key - 11.2).abs() < 1e-9);
    }

    #[test]
    fn test_zero_connection_penalty_dominates_score() {
        let mut g = graph(10);
        g.ingest(&transfer("a", "b", 1.0, 5)).unwrap();

        // Fabricate the transient degenerate state: high score but no
        // connections. It must rank far below a connected vertex with a
        // fraction of the score.
        let a = crate::vertex::VertexId(0);
        let b = crate::vertex::VertexId(1);
        g.vertices[a.index()].connections = 0;
        g.vertices[a.index()].score = 50.0;

        let key_a = g.rank_key(a); // 50 - 100 + 5 + 0.2·connections(b)
        let key_b = g.rank_key(b); // 1 + 5 + 0.2·connections(a)
        assert!(key_a < key_b);
        assert!((key_a - (-44.8)).abs() < 1e-9);
    }

    #[test]
    fn test_rank_key_with_no_neighbor() {
        let mut g = graph(2);
        g.ingest(&transfer("a", "b", 10.0, 1)).unwrap();
        g.ingest(&transfer("c", "d", 100.0, 2)).unwrap();

        // "a" was evicted: connections and score zeroed, neighbor cleared.
        let a = crate::vertex::VertexId(0);
        assert!(!g.vertices[a.index()].live);
        assert_eq!(g.rank_key(a), -100.0 + 1.0);
    }

    #[test]
    fn test_capacity_bounds_live_set() {
        let mut g = graph(3);
        for (i, pair) in [("a", "b"), ("c", "d"), ("e", "f"), ("g", "h")]
            .iter()
            .enumerate()
        {
            g.ingest(&transfer(pair.0, pair.1, 1.0, i as u64 + 1)).unwrap();
            assert!(g.live_vertex_count() <= 3);
            assert_live_invariant(&g);
        }
    }

    #[test]
    fn test_capacity_zero_empties_the_live_set() {
        let mut g = graph(0);
        g.ingest(&transfer("a", "b", 10.0, 1)).unwrap();

        assert_eq!(g.live_vertex_count(), 0);
        assert_eq!(g.live_edge_count(), 0);
        // Registries still accumulate history.
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_between("a", "b").unwrap().weight, 10.0);
        assert_live_invariant(&g);
    }

    #[test]
    fn test_runtime_capacity_shrink_truncates_on_next_ingest() {
        let mut g = graph(10);
        g.ingest(&transfer("a", "b", 5.0, 1)).unwrap();
        g.ingest(&transfer("c", "d", 4.0, 2)).unwrap();
        g.ingest(&transfer("e", "f", 3.0, 3)).unwrap();
        assert_eq!(g.live_vertex_count(), 6);

        // The external control turns the knob down; nothing happens until
        // the next ingest drives a rebalance.
        g.capacity().set(2);
        assert_eq!(g.live_vertex_count(), 6);

        g.ingest(&transfer("a", "b", 1.0, 4)).unwrap();
        assert_eq!(g.live_vertex_count(), 2);
        assert_live_invariant(&g);
    }

    #[test]
    fn test_eviction_undoes_statistics_exactly() {
        let mut g = graph(10);
        g.ingest(&transfer("x", "y", 3.0, 1)).unwrap();
        g.ingest(&transfer("x", "z", 4.0, 2)).unwrap();

        let x = g.vertex("x").unwrap();
        assert_eq!(x.connections, 2);
        assert_eq!(x.score, 7.0);

        // Evict everything.
        g.capacity().set(0);
        g.ingest(&transfer("p", "q", 1.0, 3)).unwrap();

        for address in ["x", "y", "z", "p", "q"] {
            let v = g.vertex(address).unwrap();
            assert!(!v.live);
            assert_eq!(v.connections, 0, "{} connections", address);
            assert_eq!(v.score, 0.0, "{} score", address);
            assert_eq!(v.biggest_neighbor, None);
        }

        // Re-admitting the same edges reproduces the pre-eviction state.
        g.capacity().set(10);
        g.ingest(&transfer("x", "y", 3.0, 4)).unwrap();
        g.ingest(&transfer("x", "z", 4.0, 5)).unwrap();

        let x = g.vertex("x").unwrap();
        assert_eq!(x.connections, 2);
        assert_eq!(x.score, 7.0);
        assert!(x.live);
    }

    #[test]
    fn test_surviving_edges_keep_admission_order() {
        let mut g = graph(3);
        g.ingest(&transfer("a", "b", 10.0, 1)).unwrap();
        g.ingest(&transfer("a", "c", 8.0, 2)).unwrap();
        // "d" joins and immediately loses the ranking.
        g.ingest(&transfer("a", "d", 1.0, 3)).unwrap();

        assert_eq!(g.live_vertex_count(), 3);
        let pairs: Vec<(String, String)> = g
            .live_edges()
            .map(|e| {
                (
                    g.vertices[e.source.index()].id.clone(),
                    g.vertices[e.target.index()].id.clone(),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "b".to_string()),
                ("a".to_string(), "c".to_string()),
            ]
        );

        // The survivor lost exactly the evicted edge's contribution.
        let a = g.vertex("a").unwrap();
        assert_eq!(a.connections, 2);
        assert_eq!(a.score, 18.0);
    }

    #[test]
    fn test_bounded_stream_scenario() {
        let mut g = graph(2);

        g.ingest(&transfer("a", "b", 10.0, 1)).unwrap();
        g.ingest(&transfer("c", "d", 5.0, 2)).unwrap();

        // a/b (key 10 + 1 + 0.2) outrank c/d (key 5 + 2 + 0.2), so the
        // second pair is evicted immediately and its edge swept.
        assert_eq!(g.live_vertex_count(), 2);
        assert!(g.vertex("a").unwrap().live);
        assert!(g.vertex("b").unwrap().live);
        assert!(!g.vertex("c").unwrap().live);
        assert!(!g.vertex("d").unwrap().live);
        assert!(!g.edge_between("c", "d").unwrap().live);

        g.ingest(&transfer("a", "c", 1.0, 3)).unwrap();

        // "c" was re-admitted for the duration of the call but loses the
        // rebalance: at sort time a (11 + 3 + 0.2·1 = 14.2) and
        // b (10 + 1 + 0.2·2 = 11.4) stay, c (1 + 3 + 0.4 = 4.4) and
        // d (−100 + 2 = −98) are out.
        assert_eq!(g.live_vertex_count(), 2);
        assert!(g.vertex("a").unwrap().live);
        assert!(g.vertex("b").unwrap().live);
        assert!(!g.vertex("c").unwrap().live);
        assert!(!g.vertex("d").unwrap().live);

        // Cascade: a→c was admitted then swept, so "a" is back to its
        // a–b baseline and "c" is fully zeroed.
        let a = g.vertex("a").unwrap();
        assert_eq!(a.connections, 1);
        assert_eq!(a.score, 10.0);
        let c = g.vertex("c").unwrap();
        assert_eq!(c.connections, 0);
        assert_eq!(c.score, 0.0);
        assert_eq!(c.biggest_neighbor, None);

        // Only the a–b edge is live; history for the others persists.
        assert_eq!(g.live_edge_count(), 1);
        assert_eq!(g.edge_between("c", "d").unwrap().weight, 5.0);
        assert_eq!(g.edge_between("a", "c").unwrap().weight, 1.0);
        assert_eq!(g.watermark(), 3);
        assert_live_invariant(&g);
    }

    #[test]
    fn test_out_of_order_blocks_do_not_corrupt_state() {
        let mut g = graph(2);
        g.ingest(&transfer("a", "b", 10.0, 100)).unwrap();
        // Late, low-block transfers degrade ranking quality but must not
        // underflow any statistic.
        g.ingest(&transfer("c", "d", 1.0, 3)).unwrap();
        g.ingest(&transfer("c", "d", 1.0, 2)).unwrap();
        g.ingest(&transfer("a", "c", 1.0, 1)).unwrap();

        assert_eq!(g.watermark(), 100);
        for v in &g.vertices {
            assert!(v.score >= 0.0);
        }
        assert_live_invariant(&g);
    }
}
