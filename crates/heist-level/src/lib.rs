// heist-level: one playable level instance on top of the physics, stage,
// nav and AI crates.
//
// The plugin owns the level's resources and registers the per-tick systems
// in their phases: intents in Decide, forces and spawns in Act, rotation in
// Rotate, outcome and sounds in Evaluate. Physics stepping comes from
// `HeistPhysicsPlugin`, which must be added as well. Levels are created and
// recreated with [`reset_level`].

pub mod actuation;
pub mod input;
pub mod level;
pub mod outcome;
pub mod roster;
pub mod systems;

use bevy_app::{App, Plugin, Update};
use bevy_ecs::prelude::IntoScheduleConfigs;
use heist_ai::AiCoordinator;
use heist_core::HeistSet;
use heist_core::config::LevelConfig;
use heist_core::time::TickClock;
use heist_nav::NavGraph;
use heist_stage::RotationEngine;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use input::InputState;
pub use level::{LevelHandles, LevelState, avatar_pose, reset_level};
pub use outcome::{LevelStatus, SoundEvent, SoundKind, SoundQueue};
pub use roster::{Character, Characters, Driver};

// ---------------------------------------------------------------------------
// HeistLevelPlugin
// ---------------------------------------------------------------------------

/// Inserts the level's resources and systems for one [`LevelConfig`].
pub struct HeistLevelPlugin {
    config: LevelConfig,
}

impl HeistLevelPlugin {
    pub const fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &LevelConfig {
        &self.config
    }
}

impl Plugin for HeistLevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(TickClock::new(self.config.world.dt))
            .insert_resource(NavGraph::new(self.config.nav.clone()))
            .insert_resource(SoundQueue::new(self.config.volume))
            .init_resource::<RotationEngine>()
            .init_resource::<AiCoordinator>()
            .init_resource::<Characters>()
            .init_resource::<InputState>()
            .init_resource::<LevelStatus>()
            .init_resource::<LevelHandles>()
            .add_systems(
                Update,
                (systems::player_intent_system, systems::ai_decision_system)
                    .chain()
                    .in_set(HeistSet::Decide),
            )
            .add_systems(
                Update,
                (systems::actuation_system, systems::avatar_action_system)
                    .chain()
                    .in_set(HeistSet::Act),
            )
            .add_systems(
                Update,
                (systems::rotation_request_system, systems::rotation_tick_system)
                    .chain()
                    .in_set(HeistSet::Rotate),
            )
            .add_systems(
                Update,
                (
                    systems::outcome_system,
                    systems::contact_sound_system,
                    systems::advance_clock_system,
                )
                    .chain()
                    .in_set(HeistSet::Evaluate),
            );
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Character, Characters, HeistLevelPlugin, InputState, LevelHandles, LevelStatus, SoundEvent,
        SoundKind, SoundQueue, avatar_pose, reset_level,
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use heist_core::HeistCorePlugin;
    use heist_core::types::BodyKind;
    use heist_physics::HeistPhysicsPlugin;
    use heist_physics::rapier::RapierContext;
    use heist_physics::registry::RigidBodyRegistry;

    use super::*;

    fn config() -> LevelConfig {
        LevelConfig::from_toml_str(
            r"
            walls = [[0.0, 0.0, 32.0, 0.0, 32.0, 1.0, 0.0, 1.0]]

            [world]
            dt = 0.02

            [platforms]
            polygons = [[10.0, 4.0, 14.0, 4.0, 14.0, 5.0, 10.0, 5.0]]

            [goal]
            pos = [30.0, 2.0]
            ",
        )
        .unwrap()
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(HeistCorePlugin);
        app.add_plugins(HeistPhysicsPlugin::new(RapierContext::new(Vec2::ZERO)));
        app.add_plugins(HeistLevelPlugin::new(config()));
        app.finish();
        app.cleanup();
        app
    }

    #[test]
    fn plugin_uses_level_timestep() {
        let app = app();
        assert!((app.world().resource::<TickClock>().dt() - 0.02).abs() < f32::EPSILON);
        assert!(app.world().get_resource::<LevelStatus>().is_some());
        assert!(app.world().get_resource::<RotationEngine>().is_some());
    }

    #[test]
    fn reset_populates_every_body() {
        let mut app = app();
        reset_level(app.world_mut()).unwrap();
        let registry = app.world().resource::<RigidBodyRegistry>();
        assert_eq!(registry.count_of_kind(BodyKind::Wall), 1);
        assert_eq!(registry.count_of_kind(BodyKind::Platform), 1);
        assert_eq!(registry.count_of_kind(BodyKind::Goal), 1);
        assert_eq!(registry.count_of_kind(BodyKind::Avatar), 1);
        let handles = app.world().resource::<LevelHandles>();
        assert_eq!(handles.platforms.len(), 1);
        let engine = app.world().resource::<RotationEngine>();
        assert_eq!(engine.stage().map(|s| s.members.clone()), Some(handles.platforms.clone()));
        assert!(!app.world().resource::<NavGraph>().is_empty());
    }

    #[test]
    fn update_advances_clock() {
        let mut app = app();
        reset_level(app.world_mut()).unwrap();
        app.update();
        app.update();
        assert_eq!(app.world().resource::<TickClock>().tick(), 2);
    }
}
