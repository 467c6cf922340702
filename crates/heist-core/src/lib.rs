// heist-core: shared types, config, math, time and errors for the rotating-stage platformer.

pub mod config;
pub mod error;
pub mod math;
pub mod time;
pub mod types;

use bevy_app::{App, Plugin, Update};
use bevy_ecs::prelude::{IntoScheduleConfigs, SystemSet};

use crate::time::TickClock;

// ---------------------------------------------------------------------------
// HeistSet
// ---------------------------------------------------------------------------

/// Per-tick phases, chained in declaration order on `Update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum HeistSet {
    /// Read input and AI decisions into movement intents.
    Decide,
    /// Turn intents into forces, impulses and spawned projectiles.
    Act,
    /// Step the physics world and dispatch contacts.
    Simulate,
    /// Advance an in-progress stage rotation.
    Rotate,
    /// Latch completion/failure, flush removals, advance the clock.
    Evaluate,
}

// ---------------------------------------------------------------------------
// HeistCorePlugin
// ---------------------------------------------------------------------------

/// Configures the [`HeistSet`] chain and inserts the [`TickClock`].
pub struct HeistCorePlugin;

impl Plugin for HeistCorePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                HeistSet::Decide,
                HeistSet::Act,
                HeistSet::Simulate,
                HeistSet::Rotate,
                HeistSet::Evaluate,
            )
                .chain(),
        );
        if !app.world().contains_resource::<TickClock>() {
            app.insert_resource(TickClock::default());
        }
    }
}

pub mod prelude {
    pub use crate::HeistCorePlugin;
    pub use crate::HeistSet;
    pub use crate::config::{
        AgentConfig, AvatarConfig, BehaviorConfig, BehaviorMode, LevelConfig, NavConfig,
        StageConfig, TargetRule,
    };
    pub use crate::error::{ConfigError, HeistError, LevelError, PhysicsError};
    pub use crate::math::{rotate_about, rotate_pose_about};
    pub use crate::time::TickClock;
    pub use crate::types::{
        BodyId, BodyKind, BodyMode, FixtureId, FixtureRole, Material, Pose, RotationDirection,
        ShapeDesc,
    };
}

#[cfg(test)]
mod tests {
    use bevy_ecs::prelude::{ResMut, Resource};

    use super::*;

    #[derive(Resource, Default)]
    struct Trace(Vec<HeistSet>);

    #[test]
    fn plugin_inserts_clock() {
        let mut app = App::new();
        app.add_plugins(HeistCorePlugin);
        assert!(app.world().get_resource::<TickClock>().is_some());
    }

    #[test]
    fn plugin_keeps_existing_clock() {
        let mut app = App::new();
        app.insert_resource(TickClock::new(0.1));
        app.add_plugins(HeistCorePlugin);
        assert!((app.world().resource::<TickClock>().dt() - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn sets_run_in_order() {
        let mut app = App::new();
        app.add_plugins(HeistCorePlugin);
        app.init_resource::<Trace>();
        // registered in reverse to prove ordering comes from the chain
        app.add_systems(
            Update,
            (
                (|mut t: ResMut<'_, Trace>| t.0.push(HeistSet::Evaluate))
                    .in_set(HeistSet::Evaluate),
                (|mut t: ResMut<'_, Trace>| t.0.push(HeistSet::Rotate)).in_set(HeistSet::Rotate),
                (|mut t: ResMut<'_, Trace>| t.0.push(HeistSet::Simulate))
                    .in_set(HeistSet::Simulate),
                (|mut t: ResMut<'_, Trace>| t.0.push(HeistSet::Act)).in_set(HeistSet::Act),
                (|mut t: ResMut<'_, Trace>| t.0.push(HeistSet::Decide)).in_set(HeistSet::Decide),
            ),
        );
        app.update();
        assert_eq!(
            app.world().resource::<Trace>().0,
            vec![
                HeistSet::Decide,
                HeistSet::Act,
                HeistSet::Simulate,
                HeistSet::Rotate,
                HeistSet::Evaluate
            ]
        );
    }
}
