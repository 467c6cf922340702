//! Engine-agnostic physics backend trait.
//!
//! Any 2D physics engine implements [`PhysicsBackend`] and is handed to
//! [`HeistPhysicsPlugin::new`](super::HeistPhysicsPlugin::new). The rest of
//! the simulation only ever talks to the boxed trait object held by
//! [`PhysicsWorld`](crate::PhysicsWorld).

use glam::Vec2;
use heist_core::error::PhysicsError;
use heist_core::types::{BodyId, BodyMode, FixtureId, Material, Pose, ShapeDesc};

// ---------------------------------------------------------------------------
// BodyHandle
// ---------------------------------------------------------------------------

/// Opaque engine handle for a body. Only meaningful to the backend that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

// ---------------------------------------------------------------------------
// Specs
// ---------------------------------------------------------------------------

/// One collision shape to attach to a new body.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSpec {
    pub id: FixtureId,
    pub shape: ShapeDesc,
    /// Offset from the body origin in body-local coordinates.
    pub offset: Vec2,
    pub sensor: bool,
    pub material: Material,
}

/// Everything a backend needs to create a body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub id: BodyId,
    pub mode: BodyMode,
    pub pose: Pose,
    pub velocity: Vec2,
    pub fixed_rotation: bool,
    pub gravity_scale: f32,
    /// Continuous collision detection for fast movers.
    pub bullet: bool,
    pub fixtures: Vec<FixtureSpec>,
}

impl BodySpec {
    /// Reject specs no engine can build.
    pub fn check(&self) -> Result<(), PhysicsError> {
        if self.fixtures.is_empty() {
            return Err(PhysicsError::NoFixtures(self.id));
        }
        for fixture in &self.fixtures {
            if let ShapeDesc::Polygon(points) = &fixture.shape {
                if points.len() < 3 {
                    return Err(PhysicsError::DegenerateShape(self.id));
                }
                if polygon_area(points).abs() <= f32::EPSILON {
                    return Err(PhysicsError::DecompositionFailed(self.id));
                }
            }
        }
        Ok(())
    }
}

/// Signed shoelace area; positive for counter-clockwise winding.
pub fn polygon_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        / 2.0
}

// ---------------------------------------------------------------------------
// ContactListener
// ---------------------------------------------------------------------------

/// Receives begin/end contact pairs from [`PhysicsBackend::step`].
///
/// Called synchronously on the stepping thread. Implementations must not
/// step the world again.
pub trait ContactListener {
    fn begin_contact(&mut self, a: FixtureId, b: FixtureId);
    fn end_contact(&mut self, a: FixtureId, b: FixtureId);
}

/// Listener that drops every event.
pub struct IgnoreContacts;

impl ContactListener for IgnoreContacts {
    fn begin_contact(&mut self, _a: FixtureId, _b: FixtureId) {}
    fn end_contact(&mut self, _a: FixtureId, _b: FixtureId) {}
}

// ---------------------------------------------------------------------------
// PhysicsBackend
// ---------------------------------------------------------------------------

/// Trait that concrete physics engines must implement.
///
/// Unknown or stale handles are ignored by setters and yield `None` from
/// getters; they never panic.
pub trait PhysicsBackend: Send + Sync + 'static {
    /// Human-readable engine name (e.g., "rapier2d").
    fn name(&self) -> &str;

    fn set_gravity(&mut self, gravity: Vec2);

    fn create_body(&mut self, spec: &BodySpec) -> Result<BodyHandle, PhysicsError>;

    /// Remove a body and its fixtures. Returns `false` if the handle is stale.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    fn pose(&self, handle: BodyHandle) -> Option<Pose>;

    fn set_pose(&mut self, handle: BodyHandle, pose: Pose);

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2>;

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2);

    fn set_mode(&mut self, handle: BodyHandle, mode: BodyMode);

    /// Force applied during the next step only.
    fn apply_force(&mut self, handle: BodyHandle, force: Vec2);

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2);

    /// Advance by `dt` seconds, reporting contact changes to `listener`
    /// before returning.
    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener);

    /// Remove every body.
    fn clear(&mut self);

    fn body_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
