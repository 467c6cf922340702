//! Building a level from its configuration, and tearing it down again.
//!
//! [`LevelState`] bundles every resource a level owns. [`reset_level`] is the
//! only way a level comes into existence: it clears all of them and
//! repopulates from the canonical [`LevelConfig`], so no state from a
//! previous instance survives.

use bevy_ecs::prelude::{Res, ResMut, Resource, World};
use bevy_ecs::system::{SystemParam, SystemState};
use glam::Vec2;
use heist_ai::AiCoordinator;
use heist_core::config::LevelConfig;
use heist_core::error::{HeistError, LevelError};
use heist_core::time::TickClock;
use heist_core::types::{BodyId, BodyKind, Material, Pose, ShapeDesc};
use heist_nav::{NavGraph, collect_surfaces};
use heist_physics::PhysicsWorld;
use heist_physics::backend::PhysicsBackend;
use heist_physics::contact::ContactStateMachine;
use heist_physics::registry::{BodyTemplate, RigidBodyRegistry};
use heist_stage::{RotationEngine, Stage};

use crate::input::InputState;
use crate::outcome::{LevelStatus, SoundQueue};
use crate::roster::{Character, Characters};

// ---------------------------------------------------------------------------
// LevelHandles
// ---------------------------------------------------------------------------

/// Ids of the bodies the current level instance spawned.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelHandles {
    pub avatar: Option<BodyId>,
    pub goal: Option<BodyId>,
    pub walls: Vec<BodyId>,
    /// Platform segments, i.e. the stage members.
    pub platforms: Vec<BodyId>,
    pub agents: Vec<BodyId>,
}

impl LevelHandles {
    pub fn avatar(&self) -> Result<BodyId, LevelError> {
        self.avatar.ok_or(LevelError::MissingAvatar)
    }
}

// ---------------------------------------------------------------------------
// LevelState
// ---------------------------------------------------------------------------

/// Every resource a level instance owns.
#[derive(SystemParam)]
pub struct LevelState<'w> {
    pub config: Res<'w, LevelConfig>,
    pub physics: ResMut<'w, PhysicsWorld>,
    pub registry: ResMut<'w, RigidBodyRegistry>,
    pub contacts: ResMut<'w, ContactStateMachine>,
    pub rotation: ResMut<'w, RotationEngine>,
    pub nav: ResMut<'w, NavGraph>,
    pub ai: ResMut<'w, AiCoordinator>,
    pub characters: ResMut<'w, Characters>,
    pub input: ResMut<'w, InputState>,
    pub status: ResMut<'w, LevelStatus>,
    pub sounds: ResMut<'w, SoundQueue>,
    pub handles: ResMut<'w, LevelHandles>,
    pub clock: ResMut<'w, TickClock>,
}

impl LevelState<'_> {
    /// Tear everything down and rebuild from the configuration.
    pub fn reset(&mut self) -> Result<(), HeistError> {
        self.teardown();
        self.populate()
    }

    /// Remove every body and clear every owned resource.
    pub fn teardown(&mut self) {
        self.physics.clear();
        self.registry.clear();
        self.contacts.reset();
        self.rotation.clear();
        self.nav.clear();
        self.ai.clear();
        self.characters.clear();
        self.input.clear();
        self.status.reset();
        self.sounds.clear();
        *self.handles = LevelHandles::default();
        self.clock.reset();
    }

    /// Spawn the configured level into empty resources.
    pub fn populate(&mut self) -> Result<(), HeistError> {
        let config = &*self.config;
        let backend: &mut dyn PhysicsBackend = &mut **self.physics;
        let registry = &mut *self.registry;
        let mut handles = LevelHandles::default();

        backend.set_gravity(Vec2::new(0.0, config.defaults.gravity));
        *self.clock = TickClock::new(config.world.dt);
        self.sounds.set_volume(config.volume);

        let goal = &config.goal;
        handles.goal = Some(spawn(
            registry,
            backend,
            BodyTemplate::new("goal", BodyKind::Goal, ShapeDesc::Box {
                half_extents: Vec2::from_array(goal.size) / 2.0,
            })
            .with_pose(Pose::new(Vec2::from_array(goal.pos), 0.0))
            .with_material(goal.material())
            .as_sensor(goal.sensor),
        )?);

        for (i, flat) in config.walls.iter().enumerate() {
            handles.walls.push(spawn(
                registry,
                backend,
                BodyTemplate::new(format!("wall{i}"), BodyKind::Wall, ShapeDesc::polygon_from_flat(flat))
                    .with_material(config.defaults.material()),
            )?);
        }

        let platform_material = config.platform_material();
        for (i, flat) in config.platforms.polygons.iter().enumerate() {
            handles.platforms.push(spawn(
                registry,
                backend,
                BodyTemplate::new(
                    format!("platform{i}"),
                    BodyKind::Platform,
                    ShapeDesc::polygon_from_flat(flat),
                )
                .with_material(platform_material),
            )?);
        }

        let a = &config.avatar;
        let avatar = spawn(
            registry,
            backend,
            BodyTemplate::new("avatar", BodyKind::Avatar, ShapeDesc::Box {
                half_extents: Vec2::new(a.width, a.height) / 2.0,
            })
            .with_pose(Pose::new(Vec2::from_array(a.pos), 0.0))
            .with_material(Material::new(a.density, a.friction, 0.0))
            .with_fixed_rotation()
            .with_foot_sensor(
                Vec2::new(a.width * a.sensor_shrink, a.sensor_height) / 2.0,
                Vec2::new(0.0, -a.height / 2.0),
                a.sensor_name.clone(),
            ),
        )?;
        handles.avatar = Some(avatar);
        self.contacts.set_avatar(Some(avatar));
        self.characters.insert(Character::player(avatar, a));

        for (i, agent) in config.agents.iter().enumerate() {
            let name = agent.name.clone().unwrap_or_else(|| format!("agent{i}"));
            let id = spawn(
                registry,
                backend,
                BodyTemplate::new(name, BodyKind::Agent, ShapeDesc::Box {
                    half_extents: Vec2::new(agent.width, agent.height) / 2.0,
                })
                .with_pose(Pose::new(Vec2::from_array(agent.pos), 0.0))
                .with_material(Material::new(agent.density, agent.friction, 0.0))
                .with_fixed_rotation(),
            )?;
            handles.agents.push(id);
            self.characters.insert(Character::agent(id, agent));
            self.ai.register_character(id, &agent.behavior);
        }

        self.rotation.load(Stage::new(
            config.pivot(),
            handles.platforms.clone(),
            config.stage.increment(),
            config.stage.angular_speed(),
        ));

        *self.nav = NavGraph::new(config.nav.clone());
        self.nav
            .rebuild_from_geometry(&collect_surfaces(registry, backend, &handles.platforms));

        tracing::info!(
            walls = handles.walls.len(),
            platforms = handles.platforms.len(),
            agents = handles.agents.len(),
            nav_nodes = self.nav.node_count(),
            nav_edges = self.nav.edge_count(),
            "level populated"
        );
        *self.handles = handles;
        Ok(())
    }

    /// Current pose of a level body.
    pub fn pose_of(&self, id: BodyId) -> Result<Pose, LevelError> {
        self.registry
            .handle(id)
            .and_then(|h| self.physics.pose(h))
            .ok_or(LevelError::UnknownBody(id))
    }
}

fn spawn(
    registry: &mut RigidBodyRegistry,
    backend: &mut dyn PhysicsBackend,
    template: BodyTemplate,
) -> Result<BodyId, LevelError> {
    let name = template.name.clone();
    registry
        .spawn(backend, template)
        .map_err(|e| LevelError::PopulationFailed(format!("{name}: {e}")))
}

// ---------------------------------------------------------------------------
// World entry points
// ---------------------------------------------------------------------------

/// Reset the level living in `world`: full teardown, then a fresh build.
///
/// Requires the physics and level plugins to have been added.
pub fn reset_level(world: &mut World) -> Result<(), HeistError> {
    let mut state: SystemState<LevelState<'_>> = SystemState::new(world);
    let mut level = state.get_mut(world);
    level.reset()
}

/// Current pose of the avatar in `world`.
pub fn avatar_pose(world: &mut World) -> Result<Pose, LevelError> {
    let mut state: SystemState<LevelState<'_>> = SystemState::new(world);
    let level = state.get_mut(world);
    level.pose_of(level.handles.avatar()?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_avatar_is_an_error() {
        let handles = LevelHandles::default();
        assert!(matches!(handles.avatar(), Err(LevelError::MissingAvatar)));
    }

    #[test]
    fn avatar_handle_is_returned() {
        let handles = LevelHandles {
            avatar: Some(BodyId(3)),
            ..LevelHandles::default()
        };
        assert_eq!(handles.avatar().ok(), Some(BodyId(3)));
    }
}
