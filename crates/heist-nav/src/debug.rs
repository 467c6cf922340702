//! Debug rendering of the graph and stage pivot onto a caller-supplied canvas.

use glam::Vec2;

use crate::graph::NavGraph;

/// What a primitive represents, so the canvas can pick colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugStyle {
    Node,
    StageNode,
    Edge,
    Pivot,
}

/// A render target accepting pixel-space primitives.
pub trait DebugCanvas {
    fn line(&mut self, from: Vec2, to: Vec2, style: DebugStyle);
    fn circle(&mut self, center: Vec2, radius: f32, style: DebugStyle);
}

const NODE_RADIUS: f32 = 0.1;
const PIVOT_RADIUS: f32 = 0.2;

/// Draw nodes, edges and `pivot`, scaling world units by `pixels_per_unit`.
pub fn draw_debug(
    graph: &NavGraph,
    pivot: Option<Vec2>,
    canvas: &mut dyn DebugCanvas,
    pixels_per_unit: f32,
) {
    let nodes = graph.nodes();
    for edge in graph.edges() {
        canvas.line(
            nodes[edge.from].position * pixels_per_unit,
            nodes[edge.to].position * pixels_per_unit,
            DebugStyle::Edge,
        );
    }
    for node in nodes {
        let style = if node.on_stage {
            DebugStyle::StageNode
        } else {
            DebugStyle::Node
        };
        canvas.circle(node.position * pixels_per_unit, NODE_RADIUS * pixels_per_unit, style);
    }
    if let Some(pivot) = pivot {
        let p = pivot * pixels_per_unit;
        let r = PIVOT_RADIUS * pixels_per_unit;
        canvas.circle(p, r, DebugStyle::Pivot);
        canvas.line(p - Vec2::new(r, 0.0), p + Vec2::new(r, 0.0), DebugStyle::Pivot);
        canvas.line(p - Vec2::new(0.0, r), p + Vec2::new(0.0, r), DebugStyle::Pivot);
    }
}
