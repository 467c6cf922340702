//! The physics plugin: inserts the backend as [`PhysicsWorld`] and registers
//! the step and removal systems.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use bevy_app::{App, Plugin, Update};
use bevy_ecs::prelude::{IntoScheduleConfigs, Resource};
use heist_core::HeistSet;
use heist_core::time::TickClock;

use crate::backend::PhysicsBackend;
use crate::contact::ContactStateMachine;
use crate::registry::RigidBodyRegistry;
use crate::systems::{physics_step_system, projectile_removal_system};

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// The active backend as an ECS resource.
#[derive(Resource)]
pub struct PhysicsWorld {
    backend: Box<dyn PhysicsBackend>,
}

impl PhysicsWorld {
    pub fn new(backend: impl PhysicsBackend) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn from_boxed(backend: Box<dyn PhysicsBackend>) -> Self {
        Self { backend }
    }
}

impl Deref for PhysicsWorld {
    type Target = dyn PhysicsBackend;

    fn deref(&self) -> &Self::Target {
        self.backend.as_ref()
    }
}

impl DerefMut for PhysicsWorld {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.backend.as_mut()
    }
}

// ---------------------------------------------------------------------------
// HeistPhysicsPlugin
// ---------------------------------------------------------------------------

/// Plugin that wires a [`PhysicsBackend`] into the app.
///
/// ```ignore
/// app.add_plugins(HeistPhysicsPlugin::new(RapierContext::new(Vec2::new(0.0, -14.7))));
/// ```
///
/// The backend is moved into the [`PhysicsWorld`] resource when the plugin
/// builds, so a plugin instance can be built once.
pub struct HeistPhysicsPlugin {
    backend: Mutex<Option<Box<dyn PhysicsBackend>>>,
    name: String,
}

impl HeistPhysicsPlugin {
    pub fn new(backend: impl PhysicsBackend) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn PhysicsBackend>) -> Self {
        Self {
            name: backend.name().to_owned(),
            backend: Mutex::new(Some(backend)),
        }
    }

    /// The name of the active physics backend.
    pub fn backend_name(&self) -> &str {
        &self.name
    }
}

impl Plugin for HeistPhysicsPlugin {
    fn build(&self, app: &mut App) {
        let backend = self
            .backend
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match backend {
            Some(backend) => {
                app.insert_resource(PhysicsWorld::from_boxed(backend));
            }
            None => tracing::warn!(backend = %self.name, "physics plugin built twice; keeping first world"),
        }
        app.init_resource::<TickClock>()
            .init_resource::<RigidBodyRegistry>()
            .init_resource::<ContactStateMachine>()
            .add_systems(Update, physics_step_system.in_set(HeistSet::Simulate))
            .add_systems(Update, projectile_removal_system.in_set(HeistSet::Evaluate));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
