use thiserror::Error;

use crate::types::BodyId;

/// Top-level error type for the simulation core.
#[derive(Debug, Error)]
pub enum HeistError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("Level error: {0}")]
    Level(#[from] LevelError),
}

/// Level-configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid timestep: {0} (must be > 0)")]
    InvalidTimestep(f32),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Degenerate polygon {name}: {message}")]
    DegeneratePolygon { name: String, message: String },
}

/// Errors raised by a physics backend.
///
/// Copy + static payloads so backends can return them from hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhysicsError {
    #[error("Shape for body {0} has fewer than 3 vertices")]
    DegenerateShape(BodyId),

    #[error("Shape for body {0} could not be decomposed into convex pieces")]
    DecompositionFailed(BodyId),

    #[error("Body {0} has no fixtures")]
    NoFixtures(BodyId),
}

/// Level lifecycle errors.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("Level has no avatar")]
    MissingAvatar,

    #[error("Body not registered: {0}")]
    UnknownBody(BodyId),

    #[error("Population failed: {0}")]
    PopulationFailed(String),
}
