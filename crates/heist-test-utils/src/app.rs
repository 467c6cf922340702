//! Level app builders.

use bevy_app::App;
use glam::Vec2;
use heist_core::HeistCorePlugin;
use heist_core::config::LevelConfig;
use heist_core::error::HeistError;
use heist_level::{HeistLevelPlugin, reset_level};
use heist_physics::HeistPhysicsPlugin;
use heist_physics::backend::PhysicsBackend;
use heist_physics::rapier::RapierContext;

use crate::mock::MockBackend;

/// Core, physics and level plugins over `backend`, with the level populated.
pub fn level_app(config: LevelConfig, backend: impl PhysicsBackend) -> Result<App, HeistError> {
    let mut app = App::new();
    app.add_plugins(HeistCorePlugin);
    app.add_plugins(HeistPhysicsPlugin::new(backend));
    app.add_plugins(HeistLevelPlugin::new(config));
    app.finish();
    app.cleanup();
    reset_level(app.world_mut())?;
    Ok(app)
}

/// A populated level on a [`MockBackend`], plus a clone sharing its state.
pub fn mock_level_app(config: LevelConfig) -> (App, MockBackend) {
    let backend = MockBackend::new();
    let mock = backend.clone();
    match level_app(config, backend) {
        Ok(app) => (app, mock),
        Err(e) => panic!("mock level failed to populate: {e}"),
    }
}

/// A populated level on rapier2d.
pub fn rapier_level_app(config: LevelConfig) -> App {
    match level_app(config, RapierContext::new(Vec2::ZERO)) {
        Ok(app) => app,
        Err(e) => panic!("rapier level failed to populate: {e}"),
    }
}
