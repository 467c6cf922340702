//! Per-tick level systems, one group per [`HeistSet`](heist_core::HeistSet) phase.

use bevy_ecs::prelude::{Res, ResMut};
use glam::Vec2;
use heist_ai::AiCoordinator;
use heist_core::config::LevelConfig;
use heist_core::time::TickClock;
use heist_core::types::{BodyKind, Material, Pose, ShapeDesc};
use heist_nav::{NavGraph, collect_surfaces};
use heist_physics::PhysicsWorld;
use heist_physics::contact::{ContactEvent, ContactStateMachine};
use heist_physics::registry::{BodyTemplate, RigidBodyRegistry};
use heist_stage::{BackendTarget, Rider, RotationEngine};

use crate::actuation::drive_force;
use crate::input::InputState;
use crate::level::LevelHandles;
use crate::outcome::{LevelStatus, SoundKind, SoundQueue};
use crate::roster::{Characters, RosterView};

// ---------------------------------------------------------------------------
// Decide
// ---------------------------------------------------------------------------

/// Copy the input axis into the avatar's intent; zero once the level is over.
#[allow(clippy::needless_pass_by_value)]
pub fn player_intent_system(
    input: Res<'_, InputState>,
    status: Res<'_, LevelStatus>,
    handles: Res<'_, LevelHandles>,
    mut characters: ResMut<'_, Characters>,
) {
    let Some(avatar) = handles.avatar else {
        return;
    };
    let intent = if status.is_over() { 0.0 } else { input.axis() };
    characters.set_intent(avatar, intent);
}

/// Let every AI controller pick its character's intent.
#[allow(clippy::needless_pass_by_value)]
pub fn ai_decision_system(
    mut ai: ResMut<'_, AiCoordinator>,
    nav: Res<'_, NavGraph>,
    registry: Res<'_, RigidBodyRegistry>,
    physics: Res<'_, PhysicsWorld>,
    mut characters: ResMut<'_, Characters>,
) {
    if ai.is_empty() {
        return;
    }
    let mut view = RosterView {
        characters: &mut characters,
        registry: &registry,
        backend: &**physics,
    };
    ai.tick(&nav, &mut view);
}

// ---------------------------------------------------------------------------
// Act
// ---------------------------------------------------------------------------

/// Turn intents into horizontal forces. Carried riders are skipped.
#[allow(clippy::needless_pass_by_value)]
pub fn actuation_system(
    characters: Res<'_, Characters>,
    registry: Res<'_, RigidBodyRegistry>,
    rotation: Res<'_, RotationEngine>,
    mut physics: ResMut<'_, PhysicsWorld>,
) {
    for character in characters.iter() {
        if rotation.attached() == Some(character.id) {
            continue;
        }
        let Some(handle) = registry.handle(character.id) else {
            continue;
        };
        let Some(velocity) = physics.velocity(handle) else {
            continue;
        };
        let fx = drive_force(
            character.intent,
            velocity.x,
            character.force,
            character.damping,
            character.max_speed,
        );
        if fx != 0.0 {
            physics.apply_force(handle, Vec2::new(fx, 0.0));
        }
    }
}

/// Consume fire and jump presses for the avatar.
///
/// Both are inactive unless enabled in the level configuration; presses are
/// consumed either way.
#[allow(clippy::needless_pass_by_value)]
#[allow(clippy::too_many_arguments)]
pub fn avatar_action_system(
    config: Res<'_, LevelConfig>,
    handles: Res<'_, LevelHandles>,
    status: Res<'_, LevelStatus>,
    contacts: Res<'_, ContactStateMachine>,
    characters: Res<'_, Characters>,
    mut input: ResMut<'_, InputState>,
    mut registry: ResMut<'_, RigidBodyRegistry>,
    mut physics: ResMut<'_, PhysicsWorld>,
    mut sounds: ResMut<'_, SoundQueue>,
) {
    let fire = input.take_fire();
    let jump = input.take_jump();
    if status.is_over() {
        return;
    }
    let Some(avatar) = handles.avatar else {
        return;
    };
    let Some(handle) = registry.handle(avatar) else {
        return;
    };

    if jump && config.avatar.jump_enabled && contacts.is_grounded() {
        physics.apply_impulse(handle, Vec2::new(0.0, config.avatar.jump_force));
        sounds.push(SoundKind::Jump);
    }

    if fire && config.projectile.enabled {
        let Some(pose) = physics.pose(handle) else {
            return;
        };
        let facing = characters.get(avatar).map_or(1.0, |c| c.facing);
        let p = &config.projectile;
        let template = BodyTemplate::new("projectile", BodyKind::Projectile, ShapeDesc::Circle {
            radius: p.radius,
        })
        .with_pose(Pose::new(pose.position + Vec2::new(facing * p.offset, 0.0), 0.0))
        .with_velocity(Vec2::new(facing * p.speed, 0.0))
        .with_material(Material::new(p.density, 0.0, 0.0))
        .with_gravity_scale(0.0)
        .as_bullet();
        match registry.spawn(&mut **physics, template) {
            Ok(id) => {
                tracing::debug!(body = %id, "projectile fired");
                sounds.push(SoundKind::Fire);
            }
            Err(e) => tracing::warn!(error = %e, "projectile spawn failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rotate
// ---------------------------------------------------------------------------

/// Start a stage rotation on a rotate press, carrying the avatar if it stands
/// on the stage.
#[allow(clippy::needless_pass_by_value)]
pub fn rotation_request_system(
    mut input: ResMut<'_, InputState>,
    status: Res<'_, LevelStatus>,
    handles: Res<'_, LevelHandles>,
    contacts: Res<'_, ContactStateMachine>,
    registry: Res<'_, RigidBodyRegistry>,
    mut physics: ResMut<'_, PhysicsWorld>,
    mut rotation: ResMut<'_, RotationEngine>,
) {
    let Some(direction) = input.take_rotate() else {
        return;
    };
    if status.is_over() {
        return;
    }
    if handles.avatar.is_none() {
        tracing::warn!("rotation requested without an avatar");
    }
    let rider = handles.avatar.map(|id| Rider {
        id,
        grounded: contacts
            .is_grounded_on(&registry, |body| rotation.stage().is_some_and(|stage| stage.contains(body))),
    });
    let mut target = BackendTarget {
        registry: &registry,
        backend: &mut **physics,
    };
    rotation.request_rotation(direction, rider, &mut target);
}

/// Advance the rotation and keep the nav graph on the moving geometry.
///
/// Stage nodes follow each partial step rigidly; when the command finishes
/// the graph is rebuilt so walkability reflects the new orientation.
#[allow(clippy::needless_pass_by_value)]
pub fn rotation_tick_system(
    clock: Res<'_, TickClock>,
    handles: Res<'_, LevelHandles>,
    registry: Res<'_, RigidBodyRegistry>,
    mut physics: ResMut<'_, PhysicsWorld>,
    mut rotation: ResMut<'_, RotationEngine>,
    mut nav: ResMut<'_, NavGraph>,
) {
    let step = {
        let mut target = BackendTarget {
            registry: &registry,
            backend: &mut **physics,
        };
        rotation.tick(clock.dt(), &mut target)
    };
    let Some(step) = step else {
        return;
    };
    if step.finished {
        let surfaces = collect_surfaces(&registry, &**physics, &handles.platforms);
        nav.rebuild_from_geometry(&surfaces);
    } else {
        nav.apply_rigid_transform(step.pivot, step.signed_delta);
    }
}

// ---------------------------------------------------------------------------
// Evaluate
// ---------------------------------------------------------------------------

/// Latch completion from the contact machine and failure from the avatar's
/// height.
#[allow(clippy::needless_pass_by_value)]
pub fn outcome_system(
    config: Res<'_, LevelConfig>,
    handles: Res<'_, LevelHandles>,
    contacts: Res<'_, ContactStateMachine>,
    registry: Res<'_, RigidBodyRegistry>,
    physics: Res<'_, PhysicsWorld>,
    mut status: ResMut<'_, LevelStatus>,
) {
    if status.is_over() {
        return;
    }
    if contacts.is_complete() && status.latch_complete() {
        tracing::info!("level complete");
        return;
    }
    let Some(pose) = handles
        .avatar
        .and_then(|id| registry.handle(id))
        .and_then(|h| physics.pose(h))
    else {
        return;
    };
    if pose.position.y < config.world.failure_height && status.latch_failure() {
        tracing::info!(y = pose.position.y, "avatar fell; level failed");
    }
}

/// Forward contact facts to the sound queue.
pub fn contact_sound_system(
    mut contacts: ResMut<'_, ContactStateMachine>,
    mut sounds: ResMut<'_, SoundQueue>,
) {
    for event in contacts.drain_events() {
        match event {
            ContactEvent::ProjectileImpact { .. } => sounds.push(SoundKind::Impact),
            ContactEvent::GoalReached => {}
        }
    }
}

pub fn advance_clock_system(mut clock: ResMut<'_, TickClock>) {
    clock.advance();
}
