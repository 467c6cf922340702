//! Planar rigid-rotation helpers shared by the stage and the navigation graph.
//!
//! Both must apply the identical transform so geometry and graph never drift
//! apart; keep every rotation about a pivot going through these functions.

use glam::Vec2;

use crate::types::Pose;

/// Rotate `point` about `pivot` by `angle` radians (counter-clockwise positive).
///
/// Evaluated in `f64` so repeated small steps keep the pivot-relative radius
/// stable.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn rotate_about(point: Vec2, pivot: Vec2, angle: f64) -> Vec2 {
    let px = f64::from(point.x) - f64::from(pivot.x);
    let py = f64::from(point.y) - f64::from(pivot.y);
    let (s, c) = angle.sin_cos();
    let x = px * c - py * s;
    let y = px * s + py * c;
    Vec2::new(
        (x + f64::from(pivot.x)) as f32,
        (y + f64::from(pivot.y)) as f32,
    )
}

/// Rotate a whole pose about `pivot`: the position orbits the pivot and the
/// body's own orientation advances by the same angle.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn rotate_pose_about(pose: Pose, pivot: Vec2, angle: f64) -> Pose {
    Pose {
        position: rotate_about(pose.position, pivot, angle),
        angle: (f64::from(pose.angle) + angle) as f32,
    }
}

/// Convert degrees to radians in `f64`.
#[must_use]
pub fn deg_to_rad(degrees: f32) -> f64 {
    f64::from(degrees).to_radians()
}
