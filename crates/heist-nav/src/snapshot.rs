//! Read-only export of the graph for tooling and visualization.

use serde::{Deserialize, Serialize};

use crate::graph::NavGraph;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub owner: u32,
    pub on_stage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub from: usize,
    pub to: usize,
    pub cost: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

impl NavGraph {
    /// Copy out nodes and edges. Never mutates the graph.
    pub fn snapshot(&self) -> NavSnapshot {
        NavSnapshot {
            nodes: self
                .nodes()
                .iter()
                .enumerate()
                .map(|(index, n)| NodeSnapshot {
                    index,
                    x: n.position.x,
                    y: n.position.y,
                    owner: n.owner.0,
                    on_stage: n.on_stage,
                })
                .collect(),
            edges: self
                .edges()
                .iter()
                .map(|e| EdgeSnapshot {
                    from: e.from,
                    to: e.to,
                    cost: e.cost,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use heist_core::config::NavConfig;
    use heist_core::types::BodyId;

    use super::*;
    use crate::graph::Surface;

    fn graph() -> NavGraph {
        let mut g = NavGraph::new(NavConfig::default());
        g.rebuild_from_geometry(&[Surface {
            owner: BodyId(3),
            outline: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(2.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            on_stage: true,
        }]);
        g
    }

    #[test]
    fn snapshot_mirrors_graph() {
        let g = graph();
        let snap = g.snapshot();
        assert_eq!(snap.nodes.len(), g.node_count());
        assert_eq!(snap.edges.len(), g.edge_count());
        assert!(snap.nodes.iter().all(|n| n.owner == 3 && n.on_stage));
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let g = graph();
        let before = g.clone();
        let _ = g.snapshot();
        assert_eq!(g.nodes(), before.nodes());
        assert_eq!(g.edges(), before.edges());
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let snap = graph().snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"on_stage\":true"));
        let back: NavSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
