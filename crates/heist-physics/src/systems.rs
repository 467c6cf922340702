//! Physics-phase systems.

use bevy_ecs::prelude::{Res, ResMut};
use heist_core::time::TickClock;

use crate::contact::ContactStateMachine;
use crate::plugin::PhysicsWorld;
use crate::registry::RigidBodyRegistry;

/// Step the backend once, feeding contacts into the state machine.
#[allow(clippy::needless_pass_by_value)]
pub fn physics_step_system(
    mut physics: ResMut<'_, PhysicsWorld>,
    mut registry: ResMut<'_, RigidBodyRegistry>,
    mut machine: ResMut<'_, ContactStateMachine>,
    clock: Res<'_, TickClock>,
) {
    {
        let mut listener = machine.dispatch(&registry);
        physics.step(clock.dt(), &mut listener);
    }
    registry.flush_retired();
}

/// Remove projectiles the contact machine queued during the step.
pub fn projectile_removal_system(
    mut physics: ResMut<'_, PhysicsWorld>,
    mut registry: ResMut<'_, RigidBodyRegistry>,
    mut machine: ResMut<'_, ContactStateMachine>,
) {
    for id in machine.take_removals() {
        if let Some(record) = registry.despawn(&mut **physics, id) {
            machine.forget_fixtures(&record.fixtures);
            tracing::debug!(body = %id, "projectile removed");
        }
    }
}
