//! The character roster: who moves, how hard, and where they want to go.

use std::collections::BTreeMap;

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use heist_ai::CharacterView;
use heist_core::config::{AgentConfig, AvatarConfig};
use heist_core::types::BodyId;
use heist_physics::backend::PhysicsBackend;
use heist_physics::registry::RigidBodyRegistry;

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// Who decides a character's intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Player,
    Ai,
}

/// Per-character actuation parameters and the current intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: BodyId,
    pub driver: Driver,
    /// Horizontal force at full intent.
    pub force: f32,
    /// Braking coefficient used when the intent is zero.
    pub damping: f32,
    pub max_speed: f32,
    /// Horizontal movement intent in [-1, 1].
    pub intent: f32,
    /// +1 facing right, -1 facing left.
    pub facing: f32,
}

impl Character {
    pub const fn player(id: BodyId, config: &AvatarConfig) -> Self {
        Self {
            id,
            driver: Driver::Player,
            force: config.force,
            damping: config.damping,
            max_speed: config.max_speed,
            intent: 0.0,
            facing: 1.0,
        }
    }

    pub const fn agent(id: BodyId, config: &AgentConfig) -> Self {
        Self {
            id,
            driver: Driver::Ai,
            force: config.force,
            damping: config.damping,
            max_speed: config.max_speed,
            intent: 0.0,
            facing: 1.0,
        }
    }

    /// Store a new intent; a non-zero intent also turns the character.
    pub fn set_intent(&mut self, intent: f32) {
        self.intent = if intent.is_nan() {
            0.0
        } else {
            intent.clamp(-1.0, 1.0)
        };
        if self.intent != 0.0 {
            self.facing = self.intent.signum();
        }
    }
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// Every actuated character, keyed by body id.
#[derive(Resource, Debug, Default)]
pub struct Characters {
    by_id: BTreeMap<BodyId, Character>,
}

impl Characters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, character: Character) {
        self.by_id.insert(character.id, character);
    }

    pub fn remove(&mut self, id: BodyId) -> Option<Character> {
        self.by_id.remove(&id)
    }

    pub fn get(&self, id: BodyId) -> Option<&Character> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Character> {
        self.by_id.get_mut(&id)
    }

    /// Set a character's intent; unknown ids are ignored.
    pub fn set_intent(&mut self, id: BodyId, intent: f32) {
        if let Some(character) = self.by_id.get_mut(&id) {
            character.set_intent(intent);
        }
    }

    pub fn intent(&self, id: BodyId) -> Option<f32> {
        self.by_id.get(&id).map(|c| c.intent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.by_id.values()
    }

    pub fn players(&self) -> impl Iterator<Item = &Character> {
        self.by_id.values().filter(|c| c.driver == Driver::Player)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
    }
}

// ---------------------------------------------------------------------------
// RosterView
// ---------------------------------------------------------------------------

/// Live view handed to the AI coordinator: positions from the backend,
/// intents into the roster.
pub struct RosterView<'a> {
    pub characters: &'a mut Characters,
    pub registry: &'a RigidBodyRegistry,
    pub backend: &'a dyn PhysicsBackend,
}

impl CharacterView for RosterView<'_> {
    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.backend
            .pose(self.registry.handle(id)?)
            .map(|p| p.position)
    }

    fn player_positions(&self) -> Vec<Vec2> {
        self.characters
            .players()
            .filter_map(|c| self.position(c.id))
            .collect()
    }

    fn set_intent(&mut self, id: BodyId, intent: f32) {
        self.characters.set_intent(id, intent);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
