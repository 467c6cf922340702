// heist-ai: per-character controllers and the coordinator that runs them.
//
// Controllers pick a target (nearest player, fixed point or patrol
// waypoint), ask the nav graph for the next horizontal step and emit a
// movement intent. Actuation is left to the level.

pub mod controllers;
pub mod coordinator;

pub use controllers::{ChaseController, Controller, DecisionContext, PatrolController, controller_for};
pub use coordinator::{AiCoordinator, CharacterView};
