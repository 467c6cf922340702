use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identifier of a rigid body for the lifetime of one level instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of one collision shape attached to a body.
///
/// Contact callbacks deliver pairs of these; the registry resolves them to
/// their owning body and role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FixtureId(pub u32);

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fixture#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BodyKind
// ---------------------------------------------------------------------------

/// Gameplay classification of a body. All dispatch on body kind goes through
/// this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Static boundary geometry that never rotates.
    Wall,
    /// Static polygon belonging to the rotating stage.
    Platform,
    /// The player-controlled character.
    Avatar,
    /// An AI-driven character.
    Agent,
    /// A bullet; removed on its first qualifying contact.
    Projectile,
    /// Static sensor that completes the level on avatar contact.
    Goal,
}

impl BodyKind {
    /// Whether bodies of this kind are driven by the solver.
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Avatar | Self::Agent | Self::Projectile)
    }

    /// Whether bodies of this kind are walkable surfaces.
    pub const fn is_surface(self) -> bool {
        matches!(self, Self::Wall | Self::Platform)
    }

    /// Short lowercase label used for body names and logs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Platform => "platform",
            Self::Avatar => "avatar",
            Self::Agent => "agent",
            Self::Projectile => "bullet",
            Self::Goal => "goal",
        }
    }
}

// ---------------------------------------------------------------------------
// FixtureRole
// ---------------------------------------------------------------------------

/// What a fixture is for, independent of its owner's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixtureRole {
    /// The body's collision shape.
    Solid,
    /// Non-solid shape under a character's feet used for ground detection.
    FootSensor,
    /// Non-solid trigger volume (e.g. the goal).
    Trigger,
}

impl FixtureRole {
    pub const fn is_sensor(self) -> bool {
        !matches!(self, Self::Solid)
    }
}

// ---------------------------------------------------------------------------
// BodyMode
// ---------------------------------------------------------------------------

/// How the physics engine drives a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyMode {
    /// Never moves under simulation; only direct transform assignment.
    #[default]
    Fixed,
    /// Integrated by the solver (forces, gravity, contacts).
    Dynamic,
    /// Driven by direct transform assignment while still pushing dynamics.
    Kinematic,
}

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// Surface/mass properties applied to every fixture of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub density: f32,
    #[serde(default)]
    pub friction: f32,
    #[serde(default)]
    pub restitution: f32,
}

impl Material {
    pub const ZERO: Self = Self {
        density: 0.0,
        friction: 0.0,
        restitution: 0.0,
    };

    #[must_use]
    pub const fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self {
            density,
            friction,
            restitution,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::ZERO
    }
}

// ---------------------------------------------------------------------------
// ShapeDesc
// ---------------------------------------------------------------------------

/// Collision geometry in body-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDesc {
    /// Simple (possibly concave) polygon, counter-clockwise or clockwise.
    Polygon(Vec<Vec2>),
    /// Axis-aligned box given by half extents.
    Box { half_extents: Vec2 },
    Circle { radius: f32 },
}

impl ShapeDesc {
    /// Build a polygon from a flat `[x0, y0, x1, y1, ...]` coordinate list.
    ///
    /// A trailing odd coordinate is ignored.
    pub fn polygon_from_flat(coords: &[f32]) -> Self {
        Self::Polygon(
            coords
                .chunks_exact(2)
                .map(|c| Vec2::new(c[0], c[1]))
                .collect(),
        )
    }

    /// Outline of the shape as a closed vertex loop in local coordinates.
    ///
    /// Circles are approximated by `segments` vertices.
    pub fn outline(&self, segments: usize) -> Vec<Vec2> {
        match self {
            Self::Polygon(points) => points.clone(),
            Self::Box { half_extents: h } => vec![
                Vec2::new(-h.x, -h.y),
                Vec2::new(h.x, -h.y),
                Vec2::new(h.x, h.y),
                Vec2::new(-h.x, h.y),
            ],
            Self::Circle { radius } => {
                let n = segments.max(3);
                (0..n)
                    .map(|i| {
                        let a = std::f32::consts::TAU * i as f32 / n as f32;
                        Vec2::new(radius * a.cos(), radius * a.sin())
                    })
                    .collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// World transform of a body: position plus orientation angle in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub angle: f32,
}

impl Pose {
    #[must_use]
    pub const fn new(position: Vec2, angle: f32) -> Self {
        Self { position, angle }
    }

    #[must_use]
    pub const fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            angle: 0.0,
        }
    }

    /// Map a body-local point into world space.
    #[must_use]
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.angle).rotate(local)
    }
}

// ---------------------------------------------------------------------------
// RotationDirection
// ---------------------------------------------------------------------------

/// Commanded stage rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

impl RotationDirection {
    /// Sign applied to an unsigned angle step.
    ///
    /// Positive angles are counter-clockwise, so clockwise rotation
    /// decreases orientation.
    pub const fn sign(self) -> f64 {
        match self {
            Self::Clockwise => -1.0,
            Self::CounterClockwise => 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn body_id_display() {
        assert_eq!(BodyId(3).to_string(), "#3");
        assert_eq!(FixtureId(7).to_string(), "fixture#7");
    }

    #[test]
    fn kind_classification() {
        assert!(BodyKind::Avatar.is_dynamic());
        assert!(BodyKind::Projectile.is_dynamic());
        assert!(!BodyKind::Platform.is_dynamic());
        assert!(BodyKind::Wall.is_surface());
        assert!(BodyKind::Platform.is_surface());
        assert!(!BodyKind::Goal.is_surface());
    }

    #[test]
    fn fixture_role_sensor() {
        assert!(!FixtureRole::Solid.is_sensor());
        assert!(FixtureRole::FootSensor.is_sensor());
        assert!(FixtureRole::Trigger.is_sensor());
    }

    #[test]
    fn polygon_from_flat_pairs_coordinates() {
        let shape = ShapeDesc::polygon_from_flat(&[0.0, 0.0, 2.0, 0.0, 2.0, 1.0, 9.0]);
        let ShapeDesc::Polygon(points) = shape else {
            panic!("expected polygon");
        };
        assert_eq!(points, vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0)
        ]);
    }

    #[test]
    fn box_outline_has_four_corners() {
        let outline = ShapeDesc::Box {
            half_extents: Vec2::new(1.0, 0.5),
        }
        .outline(8);
        assert_eq!(outline.len(), 4);
        assert!(outline.contains(&Vec2::new(1.0, 0.5)));
    }

    #[test]
    fn circle_outline_uses_radius() {
        let outline = ShapeDesc::Circle { radius: 2.0 }.outline(12);
        assert_eq!(outline.len(), 12);
        assert!(outline.iter().all(|p| (p.length() - 2.0).abs() < EPS));
    }

    #[test]
    fn pose_transforms_local_points() {
        let pose = Pose::new(Vec2::new(1.0, 1.0), std::f32::consts::FRAC_PI_2);
        let p = pose.transform_point(Vec2::new(1.0, 0.0));
        assert!((p - Vec2::new(1.0, 2.0)).length() < EPS);
    }

    #[test]
    fn clockwise_is_negative() {
        assert!(RotationDirection::Clockwise.sign() < 0.0);
        assert!(RotationDirection::CounterClockwise.sign() > 0.0);
    }
}
