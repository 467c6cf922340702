use bevy_ecs::prelude::Resource;
use glam::Vec2;
use heist_core::config::BehaviorConfig;
use heist_core::types::BodyId;
use heist_nav::NavGraph;

use crate::controllers::{Controller, DecisionContext, controller_for};

/// Character state the coordinator reads positions from and writes intents to.
pub trait CharacterView {
    fn position(&self, id: BodyId) -> Option<Vec2>;

    /// Positions of all player-controlled characters.
    fn player_positions(&self) -> Vec<Vec2>;

    fn set_intent(&mut self, id: BodyId, intent: f32);
}

struct Entry {
    character: BodyId,
    controller: Box<dyn Controller>,
}

/// One controller per AI character. Only sets intents; never touches physics.
#[derive(Default, Resource)]
pub struct AiCoordinator {
    entries: Vec<Entry>,
}

impl AiCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a character with a behavior.
    pub fn register_character(&mut self, character: BodyId, config: &BehaviorConfig) {
        self.register_controller(character, controller_for(config));
    }

    pub fn register_controller(&mut self, character: BodyId, controller: Box<dyn Controller>) {
        self.entries.retain(|e| e.character != character);
        self.entries.push(Entry {
            character,
            controller,
        });
    }

    pub fn unregister(&mut self, character: BodyId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.character != character);
        before != self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn characters(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.entries.iter().map(|e| e.character)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Decide every registered character's intent for this tick.
    pub fn tick(&mut self, graph: &NavGraph, view: &mut dyn CharacterView) {
        let players = view.player_positions();
        for entry in &mut self.entries {
            let Some(position) = view.position(entry.character) else {
                tracing::debug!(body = %entry.character, "AI character has no position; skipped");
                continue;
            };
            let ctx = DecisionContext {
                position,
                players: &players,
                graph,
            };
            let intent = entry.controller.decide(&ctx);
            view.set_intent(entry.character, intent);
        }
    }
}

impl std::fmt::Debug for AiCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.character, e.controller.name())))
            .finish()
    }
}
