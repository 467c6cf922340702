//! Polygon predicates used to place nodes and test edge visibility.

use glam::Vec2;

/// Even-odd point containment, boundary excluded within `tolerance`.
pub fn point_in_polygon(p: Vec2, polygon: &[Vec2], tolerance: f32) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if distance_to_segment(p, a, b) <= tolerance {
            return false;
        }
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Whether segments `p1p2` and `q1q2` cross at a point interior to both.
///
/// Touching at endpoints or running collinear does not count.
pub fn segments_cross(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = (p2 - p1).perp_dot(q1 - p1);
    let d2 = (p2 - p1).perp_dot(q2 - p1);
    let d3 = (q2 - q1).perp_dot(p1 - q1);
    let d4 = (q2 - q1).perp_dot(p2 - q1);
    let eps = 1e-6;
    ((d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps))
        && ((d3 > eps && d4 < -eps) || (d3 < -eps && d4 > eps))
}

/// Signed shoelace area; positive for counter-clockwise winding.
pub fn signed_area(polygon: &[Vec2]) -> f32 {
    let n = polygon.len();
    (0..n)
        .map(|i| polygon[i].perp_dot(polygon[(i + 1) % n]))
        .sum::<f32>()
        / 2.0
}

/// A polygon edge whose outward normal points up within the slope limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkableEdge {
    pub start: Vec2,
    pub end: Vec2,
    pub normal: Vec2,
}

/// Edges of `polygon` a character can stand on.
pub fn walkable_edges(polygon: &[Vec2], max_slope: f32) -> Vec<WalkableEdge> {
    let n = polygon.len();
    if n < 3 {
        return Vec::new();
    }
    let winding = signed_area(polygon).signum();
    let min_up = max_slope.cos();
    (0..n)
        .filter_map(|i| {
            let start = polygon[i];
            let end = polygon[(i + 1) % n];
            let dir = end - start;
            if dir.length_squared() <= f32::EPSILON {
                return None;
            }
            // outward normal is the right-hand perpendicular for ccw winding
            let normal = (Vec2::new(dir.y, -dir.x) * winding).normalize();
            (normal.y >= min_up).then_some(WalkableEdge { start, end, normal })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(x0, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1),
            Vec2::new(x0, y1),
        ]
    }

    #[test]
    fn containment() {
        let sq = square(0.0, 0.0, 2.0, 2.0);
        assert!(point_in_polygon(Vec2::ONE, &sq, 1e-4));
        assert!(!point_in_polygon(Vec2::new(3.0, 1.0), &sq, 1e-4));
        assert!(!point_in_polygon(Vec2::new(2.0, 1.0), &sq, 1e-4));
    }

    #[test]
    fn crossing_segments() {
        assert!(segments_cross(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 0.0)
        ));
        assert!(!segments_cross(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0)
        ));
        assert!(!segments_cross(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, -1.0),
            Vec2::new(2.0, 1.0)
        ));
    }

    #[test]
    fn only_top_edge_is_walkable() {
        let edges = walkable_edges(&square(0.0, 0.0, 4.0, 1.0), 45f32.to_radians());
        assert_eq!(edges.len(), 1);
        assert!((edges[0].start.y - 1.0).abs() < 1e-6);
        assert!((edges[0].normal - Vec2::Y).length() < 1e-6);
    }

    #[test]
    fn winding_does_not_matter() {
        let mut cw = square(0.0, 0.0, 4.0, 1.0);
        cw.reverse();
        let edges = walkable_edges(&cw, 45f32.to_radians());
        assert_eq!(edges.len(), 1);
        assert!((edges[0].normal - Vec2::Y).length() < 1e-6);
    }

    #[test]
    fn steep_slope_rejected() {
        let ramp = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 3.0)];
        assert!(walkable_edges(&ramp, 45f32.to_radians()).is_empty());
        let gentle = vec![Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, 1.0)];
        assert_eq!(walkable_edges(&gentle, 45f32.to_radians()).len(), 1);
    }
}
