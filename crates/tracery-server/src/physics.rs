//! Force-directed placement for the live subgraph.
//!
//! Implements the core's [`Layout`] seam with a small velocity-Verlet
//! style simulation: pairwise charge repulsion, spring forces along live
//! edges, and a weak pull toward the viewport center. One `place` call is
//! one simulation step; the renderer's update cadence drives convergence.

use std::collections::HashMap;
use tracery_graph::{Layout, LayoutEdge, LayoutVertex, Viewport};

/// Charge applied between every vertex pair. Negative repels.
const CHARGE_STRENGTH: f64 = -15.0;

/// Pull toward the viewport center on each axis.
const CENTER_STRENGTH: f64 = 0.10;

/// Velocity retained between steps.
const VELOCITY_DECAY: f64 = 0.9;

/// Spring stiffness along edges.
const SPRING_STRENGTH: f64 = 0.3;

/// Resting length of an edge between two vertices with the given live
/// connection counts. Hub-to-hub edges rest longer so clusters spread.
fn link_distance(source_connections: u32, target_connections: u32) -> f64 {
    10.0 + 7.0 * (1.0 + (source_connections as f64) * (target_connections as f64)).ln()
}

/// A reusable force simulation.
///
/// Keeps per-vertex velocities between steps, keyed by the stable vertex
/// id, so eviction and re-admission of other vertices does not disturb
/// survivors. State for departed vertices is dropped each step.
pub struct ForceLayout {
    viewport: Viewport,
    velocities: HashMap<String, (f64, f64)>,
}

impl ForceLayout {
    /// Creates a simulation centered on the given viewport.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            velocities: HashMap::new(),
        }
    }
}

impl Layout for ForceLayout {
    fn place(&mut self, vertices: &mut [LayoutVertex], edges: &[LayoutEdge]) {
        let n = vertices.len();
        if n == 0 {
            self.velocities.clear();
            return;
        }

        let mut forces = vec![(0.0f64, 0.0f64); n];

        // Pairwise repulsion. Coincident vertices (newcomers start on top
        // of their anchor) get a deterministic nudge so they can separate.
        for i in 0..n {
            for j in (i + 1)..n {
                let mut dx = vertices[i].x - vertices[j].x;
                let mut dy = vertices[i].y - vertices[j].y;
                if dx.abs() < 1e-6 && dy.abs() < 1e-6 {
                    dx = 0.1 * (i as f64 + 1.0);
                    dy = 0.1 * (j as f64 + 1.0);
                }
                let dist2 = (dx * dx + dy * dy).max(1.0);
                let dist = dist2.sqrt();
                let push = -CHARGE_STRENGTH / dist2;
                let (fx, fy) = (dx / dist * push, dy / dist * push);
                forces[i].0 += fx;
                forces[i].1 += fy;
                forces[j].0 -= fx;
                forces[j].1 -= fy;
            }
        }

        // Springs along live edges, resting at a connection-scaled length.
        for edge in edges {
            let (s, t) = (edge.source, edge.target);
            let rest = link_distance(vertices[s].connections, vertices[t].connections);
            let dx = vertices[t].x - vertices[s].x;
            let dy = vertices[t].y - vertices[s].y;
            let dist = (dx * dx + dy * dy).sqrt().max(1.0);
            let pull = (dist - rest) / dist * SPRING_STRENGTH * 0.5;
            forces[s].0 += dx * pull;
            forces[s].1 += dy * pull;
            forces[t].0 -= dx * pull;
            forces[t].1 -= dy * pull;
        }

        // Centering.
        let (cx, cy) = self.viewport.center();
        for (i, v) in vertices.iter().enumerate() {
            forces[i].0 += (cx - v.x) * CENTER_STRENGTH;
            forces[i].1 += (cy - v.y) * CENTER_STRENGTH;
        }

        // Integrate and refresh the velocity table.
        let mut next_velocities = HashMap::with_capacity(n);
        for (i, v) in vertices.iter_mut().enumerate() {
            let (vx, vy) = self
                .velocities
                .get(&v.id)
                .copied()
                .unwrap_or((0.0, 0.0));
            let vx = (vx + forces[i].0) * VELOCITY_DECAY;
            let vy = (vy + forces[i].1) * VELOCITY_DECAY;
            v.x += vx;
            v.y += vy;
            next_velocities.insert(v.id.clone(), (vx, vy));
        }
        self.velocities = next_velocities;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(id: &str, x: f64, y: f64, connections: u32) -> LayoutVertex {
        LayoutVertex {
            id: id.to_string(),
            x,
            y,
            connections,
        }
    }

    #[test]
    fn test_coincident_vertices_separate() {
        let mut layout = ForceLayout::new(Viewport::new(800.0, 600.0));
        let mut vertices = vec![vertex("a", 400.0, 300.0, 1), vertex("b", 400.0, 300.0, 1)];
        let edges = vec![LayoutEdge {
            source: 0,
            target: 1,
            weight: 1.0,
        }];

        for _ in 0..20 {
            layout.place(&mut vertices, &edges);
        }

        let dx = vertices[0].x - vertices[1].x;
        let dy = vertices[0].y - vertices[1].y;
        assert!(dx.hypot(dy) > 1.0, "vertices should have separated");
    }

    #[test]
    fn test_lone_vertex_drifts_to_center() {
        let mut layout = ForceLayout::new(Viewport::new(800.0, 600.0));
        let mut vertices = vec![vertex("a", 0.0, 0.0, 0)];

        for _ in 0..200 {
            layout.place(&mut vertices, &[]);
        }

        let (cx, cy) = (400.0, 300.0);
        assert!((vertices[0].x - cx).abs() < 50.0);
        assert!((vertices[0].y - cy).abs() < 50.0);
    }

    #[test]
    fn test_departed_vertex_state_is_dropped() {
        let mut layout = ForceLayout::new(Viewport::default());
        let mut both = vec![vertex("a", 10.0, 10.0, 1), vertex("b", 20.0, 20.0, 1)];
        layout.place(&mut both, &[]);
        assert_eq!(layout.velocities.len(), 2);

        let mut only_a = vec![vertex("a", 10.0, 10.0, 1)];
        layout.place(&mut only_a, &[]);
        assert_eq!(layout.velocities.len(), 1);
        assert!(layout.velocities.contains_key("a"));
    }

    #[test]
    fn test_link_distance_grows_with_connectivity() {
        assert!(link_distance(8, 8) > link_distance(1, 1));
        assert_eq!(link_distance(0, 5), 10.0); // product is zero
    }
}
