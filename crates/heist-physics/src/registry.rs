//! Bookkeeping from stable [`BodyId`]s to engine handles, shapes and kinds.
//!
//! All dispatch on body kind goes through [`RigidBodyRegistry::resolve`];
//! engine user data is never inspected.

use std::collections::{BTreeMap, HashMap};

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use heist_core::error::PhysicsError;
use heist_core::types::{BodyId, BodyKind, BodyMode, FixtureId, FixtureRole, Material, Pose, ShapeDesc};

use crate::backend::{BodyHandle, BodySpec, FixtureSpec, PhysicsBackend};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BodyRecord {
    pub id: BodyId,
    pub name: String,
    pub kind: BodyKind,
    pub handle: BodyHandle,
    /// Primary shape in body-local coordinates.
    pub shape: ShapeDesc,
    pub material: Material,
    pub fixtures: Vec<FixtureId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRecord {
    pub owner: BodyId,
    pub kind: BodyKind,
    pub role: FixtureRole,
    pub tag: Option<String>,
}

/// A fixture resolved to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub fixture: FixtureId,
    pub owner: BodyId,
    pub kind: BodyKind,
    pub role: FixtureRole,
}

// ---------------------------------------------------------------------------
// BodyTemplate
// ---------------------------------------------------------------------------

/// An additional fixture attached alongside the primary shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraFixture {
    pub shape: ShapeDesc,
    pub offset: Vec2,
    pub role: FixtureRole,
    pub tag: Option<String>,
}

/// Description of a body to spawn through [`RigidBodyRegistry::spawn`].
#[derive(Debug, Clone, PartialEq)]
pub struct BodyTemplate {
    pub name: String,
    pub kind: BodyKind,
    pub shape: ShapeDesc,
    pub mode: BodyMode,
    pub pose: Pose,
    pub velocity: Vec2,
    pub material: Material,
    pub sensor: bool,
    pub fixed_rotation: bool,
    pub gravity_scale: f32,
    pub bullet: bool,
    pub extras: Vec<ExtraFixture>,
}

impl BodyTemplate {
    /// A body with mode derived from its kind, at the origin.
    pub fn new(name: impl Into<String>, kind: BodyKind, shape: ShapeDesc) -> Self {
        Self {
            name: name.into(),
            kind,
            shape,
            mode: if kind.is_dynamic() {
                BodyMode::Dynamic
            } else {
                BodyMode::Fixed
            },
            pose: Pose::default(),
            velocity: Vec2::ZERO,
            material: Material::ZERO,
            sensor: false,
            fixed_rotation: false,
            gravity_scale: 1.0,
            bullet: false,
            extras: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub const fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: BodyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Make the primary shape a trigger sensor.
    #[must_use]
    pub const fn as_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    #[must_use]
    pub const fn with_fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    #[must_use]
    pub const fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    #[must_use]
    pub const fn as_bullet(mut self) -> Self {
        self.bullet = true;
        self
    }

    /// Attach a foot sensor box of `half_extents` at `offset`.
    #[must_use]
    pub fn with_foot_sensor(mut self, half_extents: Vec2, offset: Vec2, tag: impl Into<String>) -> Self {
        self.extras.push(ExtraFixture {
            shape: ShapeDesc::Box { half_extents },
            offset,
            role: FixtureRole::FootSensor,
            tag: Some(tag.into()),
        });
        self
    }
}

// ---------------------------------------------------------------------------
// RigidBodyRegistry
// ---------------------------------------------------------------------------

/// Owns every live body's record and the fixture → owner table.
///
/// Fixtures of removed bodies stay resolvable until
/// [`flush_retired`](Self::flush_retired) so end-contact events the engine
/// reports for them after removal still resolve.
#[derive(Debug, Default, Resource)]
pub struct RigidBodyRegistry {
    bodies: BTreeMap<BodyId, BodyRecord>,
    fixtures: HashMap<FixtureId, FixtureRecord>,
    retired: HashMap<FixtureId, FixtureRecord>,
    names: HashMap<String, BodyId>,
    next_body: u32,
    next_fixture: u32,
}

impl RigidBodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    const fn allocate_body(&mut self) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;
        id
    }

    const fn allocate_fixture(&mut self) -> FixtureId {
        let id = FixtureId(self.next_fixture);
        self.next_fixture += 1;
        id
    }

    /// Create the body in `backend` and record it.
    ///
    /// Nothing is recorded if the backend rejects the spec.
    pub fn spawn(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        template: BodyTemplate,
    ) -> Result<BodyId, PhysicsError> {
        let id = self.allocate_body();
        let primary_role = if template.sensor {
            FixtureRole::Trigger
        } else {
            FixtureRole::Solid
        };

        let mut fixture_specs = Vec::with_capacity(1 + template.extras.len());
        let mut fixture_records = Vec::with_capacity(1 + template.extras.len());

        let primary = self.allocate_fixture();
        fixture_specs.push(FixtureSpec {
            id: primary,
            shape: template.shape.clone(),
            offset: Vec2::ZERO,
            sensor: template.sensor,
            material: template.material,
        });
        fixture_records.push((primary, primary_role, None));

        for extra in template.extras {
            let fid = self.allocate_fixture();
            fixture_specs.push(FixtureSpec {
                id: fid,
                shape: extra.shape,
                offset: extra.offset,
                sensor: extra.role.is_sensor(),
                material: Material::ZERO,
            });
            fixture_records.push((fid, extra.role, extra.tag));
        }

        let spec = BodySpec {
            id,
            mode: template.mode,
            pose: template.pose,
            velocity: template.velocity,
            fixed_rotation: template.fixed_rotation,
            gravity_scale: template.gravity_scale,
            bullet: template.bullet,
            fixtures: fixture_specs,
        };
        spec.check()?;
        let handle = backend.create_body(&spec)?;

        let fixtures: Vec<FixtureId> = fixture_records.iter().map(|(f, _, _)| *f).collect();
        for (fid, role, tag) in fixture_records {
            self.fixtures.insert(fid, FixtureRecord {
                owner: id,
                kind: template.kind,
                role,
                tag,
            });
        }
        if template.kind != BodyKind::Projectile {
            self.names.insert(template.name.clone(), id);
        }
        self.bodies.insert(id, BodyRecord {
            id,
            name: template.name,
            kind: template.kind,
            handle,
            shape: template.shape,
            material: template.material,
            fixtures,
        });
        tracing::trace!(body = %id, kind = template.kind.label(), "spawned body");
        Ok(id)
    }

    /// Remove from `backend` and the registry. Returns the record if it was live.
    pub fn despawn(&mut self, backend: &mut dyn PhysicsBackend, id: BodyId) -> Option<BodyRecord> {
        let record = self.bodies.remove(&id)?;
        backend.remove_body(record.handle);
        if self.names.get(&record.name) == Some(&id) {
            self.names.remove(&record.name);
        }
        for fid in &record.fixtures {
            if let Some(fixture) = self.fixtures.remove(fid) {
                self.retired.insert(*fid, fixture);
            }
        }
        Some(record)
    }

    /// Forget fixtures of bodies removed before the last step.
    pub fn flush_retired(&mut self) {
        self.retired.clear();
    }

    /// Drop every record and restart id allocation.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, id: BodyId) -> Option<&BodyRecord> {
        self.bodies.get(&id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn handle(&self, id: BodyId) -> Option<BodyHandle> {
        self.bodies.get(&id).map(|r| r.handle)
    }

    pub fn kind(&self, id: BodyId) -> Option<BodyKind> {
        self.bodies.get(&id).map(|r| r.kind)
    }

    /// Named lookup. Projectiles share a name and are never indexed.
    pub fn by_name(&self, name: &str) -> Option<BodyId> {
        self.names.get(name).copied()
    }

    /// Resolve a fixture handle from a contact callback.
    pub fn resolve(&self, fixture: FixtureId) -> Option<Resolved> {
        self.fixtures
            .get(&fixture)
            .or_else(|| self.retired.get(&fixture))
            .map(|r| Resolved {
                fixture,
                owner: r.owner,
                kind: r.kind,
                role: r.role,
            })
    }

    pub fn fixture(&self, fixture: FixtureId) -> Option<&FixtureRecord> {
        self.fixtures.get(&fixture)
    }

    /// Live bodies in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BodyRecord> {
        self.bodies.values()
    }

    /// Ids of live bodies of `kind`, in id order.
    pub fn ids_of_kind(&self, kind: BodyKind) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies
            .values()
            .filter(move |r| r.kind == kind)
            .map(|r| r.id)
    }

    pub fn count_of_kind(&self, kind: BodyKind) -> usize {
        self.ids_of_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// World-space outline of a body's primary shape at `pose`.
    pub fn world_outline(&self, id: BodyId, pose: Pose) -> Option<Vec<Vec2>> {
        let record = self.bodies.get(&id)?;
        Some(
            record
                .shape
                .outline(16)
                .into_iter()
                .map(|p| pose.transform_point(p))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::ContactListener;

    /// Backend that only hands out handles.
    #[derive(Default)]
    pub(crate) struct Counter {
        live: Vec<u64>,
        next: u64,
    }

    impl PhysicsBackend for Counter {
        fn name(&self) -> &str {
            "counter"
        }
        fn set_gravity(&mut self, _gravity: Vec2) {}
        fn create_body(&mut self, _spec: &BodySpec) -> Result<BodyHandle, PhysicsError> {
            self.next += 1;
            self.live.push(self.next);
            Ok(BodyHandle(self.next))
        }
        fn remove_body(&mut self, handle: BodyHandle) -> bool {
            let before = self.live.len();
            self.live.retain(|h| *h != handle.0);
            before != self.live.len()
        }
        fn pose(&self, _handle: BodyHandle) -> Option<Pose> {
            Some(Pose::default())
        }
        fn set_pose(&mut self, _handle: BodyHandle, _pose: Pose) {}
        fn velocity(&self, _handle: BodyHandle) -> Option<Vec2> {
            None
        }
        fn set_velocity(&mut self, _handle: BodyHandle, _velocity: Vec2) {}
        fn set_mode(&mut self, _handle: BodyHandle, _mode: BodyMode) {}
        fn apply_force(&mut self, _handle: BodyHandle, _force: Vec2) {}
        fn apply_impulse(&mut self, _handle: BodyHandle, _impulse: Vec2) {}
        fn step(&mut self, _dt: f32, _listener: &mut dyn ContactListener) {}
        fn clear(&mut self) {
            self.live.clear();
        }
        fn body_count(&self) -> usize {
            self.live.len()
        }
    }

    fn square() -> ShapeDesc {
        ShapeDesc::polygon_from_flat(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0])
    }

    #[test]
    fn spawn_records_kind_and_name() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let id = reg
            .spawn(&mut backend, BodyTemplate::new("wall0", BodyKind::Wall, square()))
            .unwrap();
        assert_eq!(reg.kind(id), Some(BodyKind::Wall));
        assert_eq!(reg.by_name("wall0"), Some(id));
        assert_eq!(reg.len(), 1);
        assert_eq!(backend.body_count(), 1);
    }

    #[test]
    fn projectiles_do_not_disturb_named_lookup() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let circle = || ShapeDesc::Circle { radius: 0.1 };
        let first = reg
            .spawn(&mut backend, BodyTemplate::new("projectile", BodyKind::Projectile, circle()))
            .unwrap();
        let second = reg
            .spawn(&mut backend, BodyTemplate::new("projectile", BodyKind::Projectile, circle()))
            .unwrap();
        assert_eq!(reg.by_name("projectile"), None);

        reg.despawn(&mut backend, first).unwrap();
        assert!(reg.contains(second));
        assert_eq!(reg.by_name("projectile"), None);
    }

    #[test]
    fn despawn_keeps_name_of_later_holder() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let old = reg
            .spawn(&mut backend, BodyTemplate::new("ledge", BodyKind::Wall, square()))
            .unwrap();
        let new = reg
            .spawn(&mut backend, BodyTemplate::new("ledge", BodyKind::Wall, square()))
            .unwrap();
        assert_eq!(reg.by_name("ledge"), Some(new));
        reg.despawn(&mut backend, old).unwrap();
        assert_eq!(reg.by_name("ledge"), Some(new));
    }

    #[test]
    fn foot_sensor_resolves_to_owner() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let template = BodyTemplate::new("avatar", BodyKind::Avatar, ShapeDesc::Box {
            half_extents: Vec2::new(0.3, 0.45),
        })
        .with_foot_sensor(Vec2::new(0.2, 0.025), Vec2::new(0.0, -0.45), "AntGroundSensor");
        let id = reg.spawn(&mut backend, template).unwrap();
        let fixtures = reg.get(id).unwrap().fixtures.clone();
        assert_eq!(fixtures.len(), 2);

        let body = reg.resolve(fixtures[0]).unwrap();
        assert_eq!(body.role, FixtureRole::Solid);
        let foot = reg.resolve(fixtures[1]).unwrap();
        assert_eq!(foot.owner, id);
        assert_eq!(foot.kind, BodyKind::Avatar);
        assert_eq!(foot.role, FixtureRole::FootSensor);
        assert_eq!(reg.fixture(fixtures[1]).unwrap().tag.as_deref(), Some("AntGroundSensor"));
    }

    #[test]
    fn sensor_template_marks_trigger() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let id = reg
            .spawn(
                &mut backend,
                BodyTemplate::new("goal", BodyKind::Goal, square()).as_sensor(true),
            )
            .unwrap();
        let fid = reg.get(id).unwrap().fixtures[0];
        assert_eq!(reg.resolve(fid).unwrap().role, FixtureRole::Trigger);
    }

    #[test]
    fn degenerate_polygon_is_not_recorded() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let err = reg
            .spawn(
                &mut backend,
                BodyTemplate::new("bad", BodyKind::Wall, ShapeDesc::polygon_from_flat(&[0.0, 0.0, 1.0, 1.0])),
            )
            .unwrap_err();
        assert!(matches!(err, PhysicsError::DegenerateShape(_)));
        assert!(reg.is_empty());
        assert_eq!(backend.body_count(), 0);
    }

    #[test]
    fn despawn_retires_fixtures_until_flush() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let id = reg
            .spawn(
                &mut backend,
                BodyTemplate::new("bullet", BodyKind::Projectile, ShapeDesc::Circle { radius: 0.25 }),
            )
            .unwrap();
        let fid = reg.get(id).unwrap().fixtures[0];

        assert!(reg.despawn(&mut backend, id).is_some());
        assert!(!reg.contains(id));
        assert_eq!(backend.body_count(), 0);
        assert_eq!(reg.resolve(fid).map(|r| r.owner), Some(id));

        reg.flush_retired();
        assert!(reg.resolve(fid).is_none());
        assert!(reg.despawn(&mut backend, id).is_none());
    }

    #[test]
    fn kind_queries() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        for i in 0..3 {
            reg.spawn(&mut backend, BodyTemplate::new(format!("platform{i}"), BodyKind::Platform, square()))
                .unwrap();
        }
        reg.spawn(&mut backend, BodyTemplate::new("wall0", BodyKind::Wall, square()))
            .unwrap();
        assert_eq!(reg.count_of_kind(BodyKind::Platform), 3);
        assert_eq!(reg.count_of_kind(BodyKind::Wall), 1);
        let ids: Vec<_> = reg.ids_of_kind(BodyKind::Platform).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn clear_restarts_ids() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let first = reg
            .spawn(&mut backend, BodyTemplate::new("wall0", BodyKind::Wall, square()))
            .unwrap();
        reg.clear();
        let again = reg
            .spawn(&mut backend, BodyTemplate::new("wall0", BodyKind::Wall, square()))
            .unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn world_outline_follows_pose() {
        let mut backend = Counter::default();
        let mut reg = RigidBodyRegistry::new();
        let id = reg
            .spawn(&mut backend, BodyTemplate::new("wall0", BodyKind::Wall, square()))
            .unwrap();
        let outline = reg.world_outline(id, Pose::at(10.0, 0.0)).unwrap();
        assert_eq!(outline[2], Vec2::new(11.0, 1.0));
    }
}
