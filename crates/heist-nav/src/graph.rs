use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use heist_core::config::NavConfig;
use heist_core::math::rotate_about;
use heist_core::types::BodyId;

use crate::geometry::{point_in_polygon, segments_cross, walkable_edges};

/// Distance below which a node counts as lying on an obstacle boundary.
const BOUNDARY_TOLERANCE: f32 = 1e-3;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One body's world-space outline offered to [`NavGraph::rebuild_from_geometry`].
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub owner: BodyId,
    pub outline: Vec<Vec2>,
    /// Member of the rotating stage.
    pub on_stage: bool,
}

// ---------------------------------------------------------------------------
// Nodes and edges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavNode {
    pub position: Vec2,
    /// Body whose surface the node was sampled from.
    pub owner: BodyId,
    pub on_stage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavEdge {
    pub from: usize,
    pub to: usize,
    pub cost: f32,
}

// ---------------------------------------------------------------------------
// NavGraph
// ---------------------------------------------------------------------------

/// Directed walkability graph over sampled standing positions.
#[derive(Debug, Clone, Default, Resource)]
pub struct NavGraph {
    config: NavConfig,
    nodes: Vec<NavNode>,
    edges: Vec<NavEdge>,
    /// Outgoing edge indices per node.
    outgoing: Vec<Vec<usize>>,
    obstacles: Vec<Surface>,
}

impl NavGraph {
    pub fn new(config: NavConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub const fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[NavEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop all nodes, edges and obstacles.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.obstacles.clear();
    }

    /// Insert a node directly. Returns its index.
    pub fn add_node(&mut self, node: NavNode) -> usize {
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.nodes.len() - 1
    }

    /// Insert a directed edge; `cost` defaults to the node distance.
    ///
    /// Returns `false` for out-of-range or self-referencing indices.
    pub fn add_edge(&mut self, from: usize, to: usize, cost: Option<f32>) -> bool {
        if from == to || from >= self.nodes.len() || to >= self.nodes.len() {
            return false;
        }
        let cost = cost.unwrap_or_else(|| self.nodes[from].position.distance(self.nodes[to].position));
        self.outgoing[from].push(self.edges.len());
        self.edges.push(NavEdge { from, to, cost });
        true
    }

    /// Recompute nodes and edges from world-space surfaces.
    pub fn rebuild_from_geometry(&mut self, surfaces: &[Surface]) {
        self.clear();
        self.obstacles = surfaces.to_vec();

        let max_slope = self.config.max_slope_degrees.to_radians();
        let spacing = self.config.sample_spacing.max(1e-3);
        let clearance = self.config.clearance;

        for surface in surfaces {
            for edge in walkable_edges(&surface.outline, max_slope) {
                let length = edge.start.distance(edge.end);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let samples = ((length / spacing).floor() as usize).max(1);
                for i in 0..samples {
                    let t = (i as f32 + 0.5) / samples as f32;
                    let position = edge.start.lerp(edge.end, t) + edge.normal * clearance;
                    if self.is_buried(position) {
                        continue;
                    }
                    self.add_node(NavNode {
                        position,
                        owner: surface.owner,
                        on_stage: surface.on_stage,
                    });
                }
            }
        }

        let n = self.nodes.len();
        for from in 0..n {
            for to in 0..n {
                if from != to && self.reachable(from, to) {
                    self.add_edge(from, to, None);
                }
            }
        }
        tracing::debug!(nodes = self.nodes.len(), edges = self.edges.len(), "nav graph rebuilt");
    }

    fn is_buried(&self, p: Vec2) -> bool {
        self.obstacles
            .iter()
            .any(|o| point_in_polygon(p, &o.outline, BOUNDARY_TOLERANCE))
    }

    fn reachable(&self, from: usize, to: usize) -> bool {
        let a = self.nodes[from].position;
        let b = self.nodes[to].position;
        let dx = (b.x - a.x).abs();
        let dy = b.y - a.y;
        if dx > self.config.step_distance || dy > self.config.max_climb || -dy > self.config.max_drop {
            return false;
        }
        !self.blocked(a, b)
    }

    /// Whether any obstacle edge cuts the segment `a`–`b`.
    pub fn blocked(&self, a: Vec2, b: Vec2) -> bool {
        self.obstacles.iter().any(|o| {
            let n = o.outline.len();
            (0..n).any(|i| segments_cross(a, b, o.outline[i], o.outline[(i + 1) % n]))
        })
    }

    /// Rotate every stage-owned node (and stage obstacle) about `pivot`.
    ///
    /// Uses the same transform as the stage bodies so the graph tracks the
    /// geometry exactly. Edges joining stage and fixed nodes are re-checked
    /// against the build rules; those that no longer hold are dropped and the
    /// rest are re-costed. Edges are not added back until the next rebuild.
    pub fn apply_rigid_transform(&mut self, pivot: Vec2, signed_delta: f64) {
        for node in self.nodes.iter_mut().filter(|n| n.on_stage) {
            node.position = rotate_about(node.position, pivot, signed_delta);
        }
        for obstacle in self.obstacles.iter_mut().filter(|o| o.on_stage) {
            for p in &mut obstacle.outline {
                *p = rotate_about(*p, pivot, signed_delta);
            }
        }

        let keep: Vec<bool> = self
            .edges
            .iter()
            .map(|e| !self.is_mixed(e) || self.reachable(e.from, e.to))
            .collect();
        let before = self.edges.len();
        let mut keep = keep.into_iter();
        self.edges.retain(|_| keep.next().unwrap_or(true));
        if self.edges.len() != before {
            tracing::trace!(dropped = before - self.edges.len(), "stale stage edges dropped");
            self.reindex();
        }

        let nodes = &self.nodes;
        for edge in &mut self.edges {
            let (a, b) = (nodes[edge.from], nodes[edge.to]);
            if a.on_stage != b.on_stage {
                edge.cost = a.position.distance(b.position);
            }
        }
    }

    fn is_mixed(&self, edge: &NavEdge) -> bool {
        self.nodes[edge.from].on_stage != self.nodes[edge.to].on_stage
    }

    fn reindex(&mut self) {
        for list in &mut self.outgoing {
            list.clear();
        }
        for (i, edge) in self.edges.iter().enumerate() {
            self.outgoing[edge.from].push(i);
        }
    }

    /// Index of the node closest to `p`; ties go to the smaller index.
    pub fn nearest_node(&self, p: Vec2) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, node) in self.nodes.iter().enumerate() {
            let d = node.position.distance_squared(p);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Cheapest path from node `start` to node `goal`, inclusive.
    ///
    /// Equal-cost alternatives resolve towards smaller node indices.
    pub fn shortest_path(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let n = self.nodes.len();
        if start >= n || goal >= n {
            return None;
        }
        let mut dist = vec![f32::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        dist[start] = 0.0;
        heap.push(Frontier {
            cost: 0.0,
            node: start,
        });

        while let Some(Frontier { cost, node }) = heap.pop() {
            if cost > dist[node] {
                continue;
            }
            if node == goal {
                break;
            }
            for &e in &self.outgoing[node] {
                let edge = self.edges[e];
                let next = cost + edge.cost;
                let better = next < dist[edge.to]
                    || (next == dist[edge.to] && prev[edge.to].is_some_and(|p| node < p));
                if better {
                    dist[edge.to] = next;
                    prev[edge.to] = Some(node);
                    heap.push(Frontier {
                        cost: next,
                        node: edge.to,
                    });
                }
            }
        }

        if !dist[goal].is_finite() {
            return None;
        }
        let mut path = vec![goal];
        let mut cur = goal;
        while let Some(p) = prev[cur] {
            path.push(p);
            cur = p;
        }
        path.reverse();
        Some(path)
    }

    /// Horizontal direction of the first step from the node nearest
    /// `character` towards the node nearest `target`.
    ///
    /// Returns -1, 0 or 1; 0 when there is no path or the character is
    /// already at the target node.
    pub fn query_next_step(&self, character: Vec2, target: Vec2) -> i8 {
        let (Some(start), Some(goal)) = (self.nearest_node(character), self.nearest_node(target)) else {
            return 0;
        };
        if start == goal {
            return 0;
        }
        let Some(path) = self.shortest_path(start, goal) else {
            return 0;
        };
        let dx = self.nodes[path[1]].position.x - self.nodes[start].position.x;
        if dx > 0.0 {
            1
        } else if dx < 0.0 {
            -1
        } else {
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Frontier
// ---------------------------------------------------------------------------

/// Min-heap entry ordered by cost, then node index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f32,
    node: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
