//! An in-memory [`PhysicsBackend`] with scripted contacts.
//!
//! Integration is deliberately crude (unit mass, explicit Euler, no
//! collision response): tests drive contacts by hand with
//! [`MockBackend::script_begin`] / [`MockBackend::script_end`]. Clones share
//! state, so a test can keep a handle on it after moving the backend into an app.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec2;
use heist_core::error::PhysicsError;
use heist_core::types::{BodyMode, FixtureId, Pose};
use heist_physics::backend::{BodyHandle, BodySpec, ContactListener, PhysicsBackend};

/// A contact event queued for delivery during a future step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedContact {
    Begin(FixtureId, FixtureId),
    End(FixtureId, FixtureId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockBody {
    pub pose: Pose,
    pub velocity: Vec2,
    pub mode: BodyMode,
    pub gravity_scale: f32,
    pub fixtures: Vec<FixtureId>,
    /// Force accumulated since the last step.
    pub force: Vec2,
}

#[derive(Debug, Default)]
struct MockState {
    gravity: Vec2,
    bodies: BTreeMap<u64, MockBody>,
    next_handle: u64,
    script: VecDeque<ScriptedContact>,
    /// Forces applied before the most recent step, per handle.
    last_forces: HashMap<BodyHandle, Vec2>,
    impulses: Vec<(BodyHandle, Vec2)>,
    mode_changes: Vec<(BodyHandle, BodyMode)>,
    removed: Vec<BodyHandle>,
    steps: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver a begin-contact during the next step.
    pub fn script_begin(&self, a: FixtureId, b: FixtureId) {
        self.lock().script.push_back(ScriptedContact::Begin(a, b));
    }

    /// Deliver an end-contact during the next step.
    pub fn script_end(&self, a: FixtureId, b: FixtureId) {
        self.lock().script.push_back(ScriptedContact::End(a, b));
    }

    pub fn body(&self, handle: BodyHandle) -> Option<MockBody> {
        self.lock().bodies.get(&handle.0).cloned()
    }

    /// Total force applied to `handle` before the most recent step.
    pub fn last_force(&self, handle: BodyHandle) -> Vec2 {
        self.lock().last_forces.get(&handle).copied().unwrap_or(Vec2::ZERO)
    }

    pub fn impulses(&self) -> Vec<(BodyHandle, Vec2)> {
        self.lock().impulses.clone()
    }

    pub fn mode_changes(&self) -> Vec<(BodyHandle, BodyMode)> {
        self.lock().mode_changes.clone()
    }

    pub fn removed(&self) -> Vec<BodyHandle> {
        self.lock().removed.clone()
    }

    pub fn steps(&self) -> u64 {
        self.lock().steps
    }

    pub fn gravity(&self) -> Vec2 {
        self.lock().gravity
    }
}

impl PhysicsBackend for MockBackend {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.lock().gravity = gravity;
    }

    fn create_body(&mut self, spec: &BodySpec) -> Result<BodyHandle, PhysicsError> {
        let mut state = self.lock();
        let handle = state.next_handle;
        state.next_handle += 1;
        state.bodies.insert(handle, MockBody {
            pose: spec.pose,
            velocity: spec.velocity,
            mode: spec.mode,
            gravity_scale: spec.gravity_scale,
            fixtures: spec.fixtures.iter().map(|f| f.id).collect(),
            force: Vec2::ZERO,
        });
        Ok(BodyHandle(handle))
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let mut state = self.lock();
        let removed = state.bodies.remove(&handle.0).is_some();
        if removed {
            state.removed.push(handle);
        }
        removed
    }

    fn pose(&self, handle: BodyHandle) -> Option<Pose> {
        self.lock().bodies.get(&handle.0).map(|b| b.pose)
    }

    fn set_pose(&mut self, handle: BodyHandle, pose: Pose) {
        if let Some(body) = self.lock().bodies.get_mut(&handle.0) {
            body.pose = pose;
        }
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.lock().bodies.get(&handle.0).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.lock().bodies.get_mut(&handle.0) {
            body.velocity = velocity;
        }
    }

    fn set_mode(&mut self, handle: BodyHandle, mode: BodyMode) {
        let mut state = self.lock();
        if let Some(body) = state.bodies.get_mut(&handle.0) {
            body.mode = mode;
            if mode != BodyMode::Dynamic {
                body.velocity = Vec2::ZERO;
            }
            state.mode_changes.push((handle, mode));
        }
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.lock().bodies.get_mut(&handle.0) {
            body.force += force;
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        let mut state = self.lock();
        if let Some(body) = state.bodies.get_mut(&handle.0) {
            body.velocity += impulse;
            state.impulses.push((handle, impulse));
        }
    }

    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener) {
        let script: Vec<ScriptedContact> = {
            let mut state = self.lock();
            let gravity = state.gravity;
            let mut forces = HashMap::new();
            for (&handle, body) in &mut state.bodies {
                forces.insert(BodyHandle(handle), body.force);
                if body.mode == BodyMode::Dynamic {
                    body.velocity += (gravity * body.gravity_scale + body.force) * dt;
                    body.pose.position += body.velocity * dt;
                }
                body.force = Vec2::ZERO;
            }
            state.last_forces = forces;
            state.steps += 1;
            state.script.drain(..).collect()
        };
        // the lock is released so listeners may query the backend
        for contact in script {
            match contact {
                ScriptedContact::Begin(a, b) => listener.begin_contact(a, b),
                ScriptedContact::End(a, b) => listener.end_contact(a, b),
            }
        }
    }

    fn clear(&mut self) {
        let mut state = self.lock();
        let gravity = state.gravity;
        *state = MockState {
            gravity,
            ..MockState::default()
        };
    }

    fn body_count(&self) -> usize {
        self.lock().bodies.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
