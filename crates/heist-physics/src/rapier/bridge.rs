//! Conversions from engine-agnostic specs into rapier2d builders.

use glam::Vec2;
use heist_core::error::PhysicsError;
use heist_core::types::{BodyId, BodyMode, Pose, ShapeDesc};
use rapier2d::prelude::{
    ActiveCollisionTypes, ActiveEvents, Collider, ColliderBuilder, Isometry, LockedAxes, Point,
    Real, RigidBody, RigidBodyBuilder, RigidBodyType, Vector,
};

use crate::backend::{BodySpec, FixtureSpec, polygon_area};

pub fn to_na(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

pub fn to_glam(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

pub fn isometry(pose: Pose) -> Isometry<Real> {
    Isometry::new(to_na(pose.position), pose.angle)
}

pub const fn body_type(mode: BodyMode) -> RigidBodyType {
    match mode {
        BodyMode::Fixed => RigidBodyType::Fixed,
        BodyMode::Dynamic => RigidBodyType::Dynamic,
        BodyMode::Kinematic => RigidBodyType::KinematicPositionBased,
    }
}

/// Build the rigid body for `spec`. Fixtures are attached separately.
pub fn body_from_spec(spec: &BodySpec) -> RigidBody {
    RigidBodyBuilder::new(body_type(spec.mode))
        .position(isometry(spec.pose))
        .linvel(to_na(spec.velocity))
        .gravity_scale(spec.gravity_scale)
        .locked_axes(if spec.fixed_rotation {
            LockedAxes::ROTATION_LOCKED
        } else {
            LockedAxes::empty()
        })
        .ccd_enabled(spec.bullet)
        .can_sleep(false)
        .user_data(u128::from(spec.id.0))
        .build()
}

/// Build one collider. Polygons go through convex decomposition so concave
/// outlines are supported.
pub fn collider_from_fixture(owner: BodyId, fixture: &FixtureSpec) -> Result<Collider, PhysicsError> {
    let builder = match &fixture.shape {
        ShapeDesc::Circle { radius } => ColliderBuilder::ball(*radius),
        ShapeDesc::Box { half_extents } => ColliderBuilder::cuboid(half_extents.x, half_extents.y),
        ShapeDesc::Polygon(points) => {
            if points.len() < 3 {
                return Err(PhysicsError::DegenerateShape(owner));
            }
            if polygon_area(points).abs() <= f32::EPSILON {
                return Err(PhysicsError::DecompositionFailed(owner));
            }
            let vertices: Vec<Point<Real>> = points.iter().map(|p| Point::new(p.x, p.y)).collect();
            #[allow(clippy::cast_possible_truncation)]
            let n = vertices.len() as u32;
            let indices: Vec<[u32; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();
            ColliderBuilder::convex_decomposition(&vertices, &indices)
        }
    };

    Ok(builder
        .translation(to_na(fixture.offset))
        .sensor(fixture.sensor)
        .density(fixture.material.density)
        .friction(fixture.material.friction)
        .restitution(fixture.material.restitution)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        // kinematic riders and sensors on static geometry still report contacts
        .active_collision_types(ActiveCollisionTypes::default() | ActiveCollisionTypes::KINEMATIC_FIXED)
        .user_data(u128::from(fixture.id.0))
        .build())
}
