//! Contact-driven gameplay state: grounding, goal completion and projectile
//! lifetime.
//!
//! The [`ContactStateMachine`] only records facts. Removals and sound cues are
//! queued and acted on after the solver step by the level systems.

use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::Resource;
use heist_core::types::{BodyId, BodyKind, FixtureId, FixtureRole};

use crate::backend::ContactListener;
use crate::registry::{Resolved, RigidBodyRegistry};

// ---------------------------------------------------------------------------
// SensorOwnership
// ---------------------------------------------------------------------------

/// Multiset of fixtures currently touching the avatar's foot sensor.
///
/// Grounded exactly when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorOwnership {
    counts: HashMap<FixtureId, u32>,
    total: usize,
}

impl SensorOwnership {
    pub fn add(&mut self, fixture: FixtureId) {
        *self.counts.entry(fixture).or_insert(0) += 1;
        self.total += 1;
    }

    /// Remove one occurrence. Returns `false` (and changes nothing) if absent.
    pub fn remove(&mut self, fixture: FixtureId) -> bool {
        let Some(count) = self.counts.get_mut(&fixture) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&fixture);
        }
        self.total -= 1;
        true
    }

    /// Remove every occurrence of `fixture`. Returns how many were dropped.
    pub fn purge(&mut self, fixture: FixtureId) -> usize {
        let dropped = self.counts.remove(&fixture).unwrap_or(0) as usize;
        self.total -= dropped;
        dropped
    }

    pub fn contains(&self, fixture: FixtureId) -> bool {
        self.counts.contains_key(&fixture)
    }

    pub const fn len(&self) -> usize {
        self.total
    }

    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub const fn is_grounded(&self) -> bool {
        self.total > 0
    }

    /// Distinct fixtures currently under the sensor.
    pub fn fixtures(&self) -> impl Iterator<Item = FixtureId> + '_ {
        self.counts.keys().copied()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
    }
}

// ---------------------------------------------------------------------------
// ContactEvent
// ---------------------------------------------------------------------------

/// Facts produced by contact handling for the post-step phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    /// A projectile hit something and is queued for removal.
    ProjectileImpact { projectile: BodyId },
    /// The avatar reached the goal for the first time.
    GoalReached,
}

// ---------------------------------------------------------------------------
// ContactStateMachine
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Resource)]
pub struct ContactStateMachine {
    avatar: Option<BodyId>,
    sensors: SensorOwnership,
    complete: bool,
    removed: HashSet<BodyId>,
    pending_removals: Vec<BodyId>,
    events: Vec<ContactEvent>,
}

impl ContactStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set which body's foot sensor drives grounding.
    pub const fn set_avatar(&mut self, avatar: Option<BodyId>) {
        self.avatar = avatar;
    }

    pub const fn avatar(&self) -> Option<BodyId> {
        self.avatar
    }

    pub const fn is_grounded(&self) -> bool {
        self.sensors.is_grounded()
    }

    /// Whether the foot sensor touches a fixture owned by a body accepted by
    /// `on`. Fixtures the registry cannot resolve never count.
    pub fn is_grounded_on(&self, registry: &RigidBodyRegistry, on: impl Fn(BodyId) -> bool) -> bool {
        self.sensors
            .fixtures()
            .filter_map(|f| registry.resolve(f))
            .any(|r| on(r.owner))
    }

    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    pub const fn sensors(&self) -> &SensorOwnership {
        &self.sensors
    }

    /// Queue a projectile for removal.
    ///
    /// Returns `false` if it was already queued or removed; no second event
    /// is emitted in that case.
    pub fn request_removal(&mut self, projectile: BodyId) -> bool {
        if !self.removed.insert(projectile) {
            tracing::trace!(body = %projectile, "projectile already removed");
            return false;
        }
        self.pending_removals.push(projectile);
        self.events.push(ContactEvent::ProjectileImpact { projectile });
        true
    }

    /// Removals queued since the last call, in request order.
    pub fn take_removals(&mut self) -> Vec<BodyId> {
        std::mem::take(&mut self.pending_removals)
    }

    pub fn drain_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop a removed body's fixtures from the grounding multiset.
    pub fn forget_fixtures(&mut self, fixtures: &[FixtureId]) {
        for fixture in fixtures {
            self.sensors.purge(*fixture);
        }
    }

    /// Back to a fresh level instance.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn is_avatar_foot(&self, fixture: &Resolved) -> bool {
        fixture.role == FixtureRole::FootSensor && Some(fixture.owner) == self.avatar
    }

    pub fn on_begin_contact(&mut self, a: Resolved, b: Resolved) {
        if a.role.is_sensor() && b.role.is_sensor() {
            return;
        }
        for (x, y) in [(a, b), (b, a)] {
            if x.kind == BodyKind::Projectile && y.kind != BodyKind::Avatar {
                self.request_removal(x.owner);
            }
            if self.is_avatar_foot(&x) && y.owner != x.owner {
                self.sensors.add(y.fixture);
            }
        }
        let avatar_goal = |x: &Resolved, y: &Resolved| {
            x.kind == BodyKind::Avatar && Some(x.owner) == self.avatar && y.kind == BodyKind::Goal
        };
        if (avatar_goal(&a, &b) || avatar_goal(&b, &a)) && !self.complete {
            self.complete = true;
            self.events.push(ContactEvent::GoalReached);
            tracing::info!("goal reached");
        }
    }

    pub fn on_end_contact(&mut self, a: Resolved, b: Resolved) {
        if a.role.is_sensor() && b.role.is_sensor() {
            return;
        }
        for (x, y) in [(a, b), (b, a)] {
            if self.is_avatar_foot(&x) && y.owner != x.owner {
                self.sensors.remove(y.fixture);
            }
        }
    }

    /// Listener view resolving fixtures through `registry`.
    pub const fn dispatch<'a>(&'a mut self, registry: &'a RigidBodyRegistry) -> ContactDispatch<'a> {
        ContactDispatch {
            machine: self,
            registry,
        }
    }
}

// ---------------------------------------------------------------------------
// ContactDispatch
// ---------------------------------------------------------------------------

/// Adapts [`ContactStateMachine`] to the backend's [`ContactListener`].
pub struct ContactDispatch<'a> {
    machine: &'a mut ContactStateMachine,
    registry: &'a RigidBodyRegistry,
}

impl ContactDispatch<'_> {
    fn resolve_pair(&self, a: FixtureId, b: FixtureId, phase: &str) -> Option<(Resolved, Resolved)> {
        match (self.registry.resolve(a), self.registry.resolve(b)) {
            (Some(ra), Some(rb)) => Some((ra, rb)),
            _ => {
                tracing::warn!(%a, %b, phase, "ignoring contact with unknown fixture");
                None
            }
        }
    }
}

impl ContactListener for ContactDispatch<'_> {
    fn begin_contact(&mut self, a: FixtureId, b: FixtureId) {
        if let Some((ra, rb)) = self.resolve_pair(a, b, "begin") {
            self.machine.on_begin_contact(ra, rb);
        }
    }

    fn end_contact(&mut self, a: FixtureId, b: FixtureId) {
        if let Some((ra, rb)) = self.resolve_pair(a, b, "end") {
            self.machine.on_end_contact(ra, rb);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
