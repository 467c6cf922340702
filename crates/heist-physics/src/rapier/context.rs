//! All rapier2d pipeline state behind the [`PhysicsBackend`] trait.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use glam::Vec2;
use heist_core::error::PhysicsError;
use heist_core::types::{BodyMode, FixtureId, Pose};
use rapier2d::prelude::{
    CCDSolver, ColliderHandle, ColliderSet, CollisionEvent, ContactPair, DefaultBroadPhase,
    EventHandler, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
    NarrowPhase, PhysicsPipeline, QueryPipeline, Real, RigidBodyHandle, RigidBodySet,
    Vector,
};

use crate::backend::{BodyHandle, BodySpec, ContactListener, PhysicsBackend};

use super::bridge::{body_from_spec, body_type, collider_from_fixture, isometry, to_glam, to_na};

// ---------------------------------------------------------------------------
// EventCollector
// ---------------------------------------------------------------------------

/// Buffers collision events raised inside `PhysicsPipeline::step`.
#[derive(Default)]
struct EventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl EventCollector {
    fn drain(&self) -> Vec<CollisionEvent> {
        std::mem::take(
            &mut *self
                .collisions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl EventHandler for EventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

// ---------------------------------------------------------------------------
// Handle packing
// ---------------------------------------------------------------------------

fn pack(handle: RigidBodyHandle) -> BodyHandle {
    let (index, generation) = handle.into_raw_parts();
    BodyHandle((u64::from(generation) << 32) | u64::from(index))
}

#[allow(clippy::cast_possible_truncation)]
fn unpack(handle: BodyHandle) -> RigidBodyHandle {
    RigidBodyHandle::from_raw_parts(handle.0 as u32, (handle.0 >> 32) as u32)
}

// ---------------------------------------------------------------------------
// RapierContext
// ---------------------------------------------------------------------------

/// rapier2d world implementing [`PhysicsBackend`].
///
/// `PhysicsPipeline::step()` requires mutable access to every set
/// simultaneously, so they all live together.
pub struct RapierContext {
    // -- Rapier sets --
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,

    // -- Pipeline objects --
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    // -- Parameters --
    pub integration_parameters: IntegrationParameters,
    pub gravity: Vector<Real>,

    // -- Collider ↔ fixture mappings --
    fixtures: HashMap<ColliderHandle, FixtureId>,
    /// Colliders removed since the last step; their stop events arrive
    /// during the next one.
    retired: HashMap<ColliderHandle, FixtureId>,

    events: EventCollector,
}

impl RapierContext {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            gravity: to_na(gravity),
            fixtures: HashMap::new(),
            retired: HashMap::new(),
            events: EventCollector::default(),
        }
    }

    fn fixture_of(&self, collider: ColliderHandle) -> Option<FixtureId> {
        self.fixtures
            .get(&collider)
            .or_else(|| self.retired.get(&collider))
            .copied()
    }

    fn dispatch(&self, listener: &mut dyn ContactListener) {
        for event in self.events.drain() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };
            let (Some(a), Some(b)) = (self.fixture_of(h1), self.fixture_of(h2)) else {
                tracing::debug!(?h1, ?h2, "collision on untracked collider");
                continue;
            };
            if started {
                listener.begin_contact(a, b);
            } else {
                listener.end_contact(a, b);
            }
        }
    }
}

impl PhysicsBackend for RapierContext {
    fn name(&self) -> &str {
        "rapier2d"
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = to_na(gravity);
    }

    fn create_body(&mut self, spec: &BodySpec) -> Result<BodyHandle, PhysicsError> {
        spec.check()?;
        let colliders = spec
            .fixtures
            .iter()
            .map(|f| collider_from_fixture(spec.id, f).map(|c| (f.id, c)))
            .collect::<Result<Vec<_>, _>>()?;

        let handle = self.rigid_body_set.insert(body_from_spec(spec));
        for (fixture, collider) in colliders {
            let ch = self
                .collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);
            self.fixtures.insert(ch, fixture);
        }
        Ok(pack(handle))
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let rh = unpack(handle);
        let Some(body) = self.rigid_body_set.get(rh) else {
            return false;
        };
        for ch in body.colliders() {
            if let Some(fixture) = self.fixtures.remove(ch) {
                self.retired.insert(*ch, fixture);
            }
        }
        self.rigid_body_set
            .remove(
                rh,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    fn pose(&self, handle: BodyHandle) -> Option<Pose> {
        self.rigid_body_set.get(unpack(handle)).map(|b| {
            let iso = b.position();
            Pose::new(
                Vec2::new(iso.translation.x, iso.translation.y),
                iso.rotation.angle(),
            )
        })
    }

    fn set_pose(&mut self, handle: BodyHandle, pose: Pose) {
        if let Some(body) = self.rigid_body_set.get_mut(unpack(handle)) {
            body.set_position(isometry(pose), true);
        }
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.rigid_body_set
            .get(unpack(handle))
            .map(|b| to_glam(b.linvel()))
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.rigid_body_set.get_mut(unpack(handle)) {
            body.set_linvel(to_na(velocity), true);
        }
    }

    fn set_mode(&mut self, handle: BodyHandle, mode: BodyMode) {
        if let Some(body) = self.rigid_body_set.get_mut(unpack(handle)) {
            body.set_body_type(body_type(mode), true);
            if mode != BodyMode::Dynamic {
                body.set_linvel(Vector::zeros(), false);
                body.set_angvel(0.0, false);
            }
        }
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.rigid_body_set.get_mut(unpack(handle)) {
            body.add_force(to_na(force), true);
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(body) = self.rigid_body_set.get_mut(unpack(handle)) {
            body.apply_impulse(to_na(impulse), true);
        }
    }

    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.events,
        );

        // user forces persist in rapier until cleared
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
        }

        self.dispatch(listener);
        self.retired.clear();
    }

    fn clear(&mut self) {
        let gravity = to_glam(&self.gravity);
        *self = Self::new(gravity);
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use heist_core::types::{BodyId, Material, ShapeDesc};

    use super::*;
    use crate::backend::{FixtureSpec, IgnoreContacts};

    #[derive(Default)]
    struct Recorder {
        begins: Vec<(FixtureId, FixtureId)>,
        ends: Vec<(FixtureId, FixtureId)>,
    }

    impl ContactListener for Recorder {
        fn begin_contact(&mut self, a: FixtureId, b: FixtureId) {
            self.begins.push((a, b));
        }
        fn end_contact(&mut self, a: FixtureId, b: FixtureId) {
            self.ends.push((a, b));
        }
    }

    fn ground_spec() -> BodySpec {
        BodySpec {
            id: BodyId(0),
            mode: BodyMode::Fixed,
            pose: Pose::default(),
            velocity: Vec2::ZERO,
            fixed_rotation: false,
            gravity_scale: 1.0,
            bullet: false,
            fixtures: vec![FixtureSpec {
                id: FixtureId(0),
                shape: ShapeDesc::polygon_from_flat(&[0.0, 0.0, 20.0, 0.0, 20.0, 1.0, 0.0, 1.0]),
                offset: Vec2::ZERO,
                sensor: false,
                material: Material::new(0.0, 0.6, 0.0),
            }],
        }
    }

    fn box_spec(id: u32, fixture: u32, at: Vec2) -> BodySpec {
        BodySpec {
            id: BodyId(id),
            mode: BodyMode::Dynamic,
            pose: Pose::new(at, 0.0),
            velocity: Vec2::ZERO,
            fixed_rotation: true,
            gravity_scale: 1.0,
            bullet: false,
            fixtures: vec![FixtureSpec {
                id: FixtureId(fixture),
                shape: ShapeDesc::Box {
                    half_extents: Vec2::splat(0.5),
                },
                offset: Vec2::ZERO,
                sensor: false,
                material: Material::new(1.0, 0.0, 0.0),
            }],
        }
    }

    #[test]
    fn handle_round_trip() {
        let mut ctx = RapierContext::new(Vec2::ZERO);
        let h = ctx.create_body(&box_spec(1, 1, Vec2::new(2.0, 3.0))).unwrap();
        let pose = ctx.pose(h).unwrap();
        assert!((pose.position - Vec2::new(2.0, 3.0)).length() < 1e-5);
        assert_eq!(ctx.body_count(), 1);
    }

    #[test]
    fn gravity_pulls_dynamic_body() {
        let mut ctx = RapierContext::new(Vec2::new(0.0, -10.0));
        let h = ctx.create_body(&box_spec(1, 1, Vec2::new(0.0, 10.0))).unwrap();
        for _ in 0..30 {
            ctx.step(1.0 / 60.0, &mut IgnoreContacts);
        }
        assert!(ctx.pose(h).unwrap().position.y < 10.0);
        assert!(ctx.velocity(h).unwrap().y < 0.0);
    }

    #[test]
    fn force_lasts_one_step() {
        let mut ctx = RapierContext::new(Vec2::ZERO);
        let h = ctx.create_body(&box_spec(1, 1, Vec2::ZERO)).unwrap();
        ctx.apply_force(h, Vec2::new(10.0, 0.0));
        ctx.step(1.0 / 60.0, &mut IgnoreContacts);
        let v1 = ctx.velocity(h).unwrap().x;
        assert!(v1 > 0.0);
        ctx.step(1.0 / 60.0, &mut IgnoreContacts);
        let v2 = ctx.velocity(h).unwrap().x;
        assert!((v2 - v1).abs() < 1e-4);
    }

    #[test]
    fn falling_box_reports_contact() {
        let mut ctx = RapierContext::new(Vec2::new(0.0, -10.0));
        ctx.create_body(&ground_spec()).unwrap();
        ctx.create_body(&box_spec(1, 1, Vec2::new(5.0, 2.0))).unwrap();
        let mut rec = Recorder::default();
        for _ in 0..120 {
            ctx.step(1.0 / 60.0, &mut rec);
        }
        assert!(rec.begins.iter().any(|&(a, b)| {
            (a, b) == (FixtureId(0), FixtureId(1)) || (a, b) == (FixtureId(1), FixtureId(0))
        }));
    }

    #[test]
    fn removal_reports_end_contact() {
        let mut ctx = RapierContext::new(Vec2::new(0.0, -10.0));
        ctx.create_body(&ground_spec()).unwrap();
        let h = ctx.create_body(&box_spec(1, 1, Vec2::new(5.0, 1.6))).unwrap();
        let mut rec = Recorder::default();
        for _ in 0..60 {
            ctx.step(1.0 / 60.0, &mut rec);
        }
        assert!(!rec.begins.is_empty());
        assert!(ctx.remove_body(h));
        assert!(!ctx.remove_body(h));
        ctx.step(1.0 / 60.0, &mut rec);
        assert!(!rec.ends.is_empty());
        assert_eq!(ctx.body_count(), 1);
    }

    #[test]
    fn set_pose_moves_fixed_body() {
        let mut ctx = RapierContext::new(Vec2::ZERO);
        let h = ctx.create_body(&ground_spec()).unwrap();
        ctx.set_pose(h, Pose::new(Vec2::new(1.0, -1.0), 0.5));
        let pose = ctx.pose(h).unwrap();
        assert!((pose.position - Vec2::new(1.0, -1.0)).length() < 1e-5);
        assert!((pose.angle - 0.5).abs() < 1e-5);
    }

    #[test]
    fn kinematic_body_ignores_gravity() {
        let mut ctx = RapierContext::new(Vec2::new(0.0, -10.0));
        let h = ctx.create_body(&box_spec(1, 1, Vec2::new(0.0, 5.0))).unwrap();
        ctx.set_mode(h, BodyMode::Kinematic);
        for _ in 0..30 {
            ctx.step(1.0 / 60.0, &mut IgnoreContacts);
        }
        assert!((ctx.pose(h).unwrap().position.y - 5.0).abs() < 1e-4);
        ctx.set_mode(h, BodyMode::Dynamic);
        for _ in 0..30 {
            ctx.step(1.0 / 60.0, &mut IgnoreContacts);
        }
        assert!(ctx.pose(h).unwrap().position.y < 5.0);
    }

    #[test]
    fn concave_polygon_builds() {
        let mut ctx = RapierContext::new(Vec2::ZERO);
        let mut spec = ground_spec();
        spec.fixtures[0].shape = ShapeDesc::polygon_from_flat(&[
            0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 3.0, 4.0, 3.0, 1.0, 1.0, 1.0, 1.0, 4.0, 0.0, 4.0,
        ]);
        assert!(ctx.create_body(&spec).is_ok());
    }

    #[test]
    fn degenerate_polygon_rejected() {
        let mut ctx = RapierContext::new(Vec2::ZERO);
        let mut spec = ground_spec();
        spec.fixtures[0].shape = ShapeDesc::polygon_from_flat(&[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(
            ctx.create_body(&spec),
            Err(PhysicsError::DegenerateShape(BodyId(0)))
        );
        assert_eq!(ctx.body_count(), 0);
    }

    #[test]
    fn clear_keeps_gravity() {
        let mut ctx = RapierContext::new(Vec2::new(0.0, -3.0));
        ctx.create_body(&ground_spec()).unwrap();
        ctx.clear();
        assert_eq!(ctx.body_count(), 0);
        assert!((ctx.gravity.y + 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn stale_handle_is_harmless() {
        let mut ctx = RapierContext::new(Vec2::ZERO);
        let h = ctx.create_body(&box_spec(1, 1, Vec2::ZERO)).unwrap();
        ctx.remove_body(h);
        assert!(ctx.pose(h).is_none());
        ctx.set_pose(h, Pose::default());
        ctx.apply_force(h, Vec2::X);
    }
}
