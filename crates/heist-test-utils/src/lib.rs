//! Shared test fixtures and utilities for the heist crates.
//!
//! Provides a scriptable mock physics backend, canonical level
//! configurations and builders for fully populated level apps.

pub mod app;
pub mod fixtures;
pub mod mock;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use app::{level_app, mock_level_app, rapier_level_app};
pub use fixtures::{CANONICAL_LEVEL_TOML, canonical_level, chase_level, flat_level, quarter_turn_level};
pub use mock::{MockBackend, MockBody, ScriptedContact};
