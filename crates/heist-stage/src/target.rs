//! What the rotation engine moves.

use std::collections::HashMap;

use heist_core::types::{BodyId, BodyMode, Pose};
use heist_physics::backend::PhysicsBackend;
use heist_physics::registry::RigidBodyRegistry;

/// Pose and mode access by body id.
pub trait TransformTarget {
    fn pose(&self, id: BodyId) -> Option<Pose>;
    fn set_pose(&mut self, id: BodyId, pose: Pose);
    fn set_mode(&mut self, id: BodyId, mode: BodyMode);
}

/// Live bodies: ids resolved through the registry, poses owned by the backend.
pub struct BackendTarget<'a> {
    pub registry: &'a RigidBodyRegistry,
    pub backend: &'a mut dyn PhysicsBackend,
}

impl TransformTarget for BackendTarget<'_> {
    fn pose(&self, id: BodyId) -> Option<Pose> {
        self.backend.pose(self.registry.handle(id)?)
    }

    fn set_pose(&mut self, id: BodyId, pose: Pose) {
        if let Some(handle) = self.registry.handle(id) {
            self.backend.set_pose(handle, pose);
        }
    }

    fn set_mode(&mut self, id: BodyId, mode: BodyMode) {
        if let Some(handle) = self.registry.handle(id) {
            self.backend.set_mode(handle, mode);
        }
    }
}

/// In-memory poses, for tests and offline previews.
#[derive(Debug, Clone, Default)]
pub struct PoseMap {
    pub poses: HashMap<BodyId, Pose>,
    pub modes: HashMap<BodyId, BodyMode>,
}

impl PoseMap {
    #[must_use]
    pub fn with(mut self, id: BodyId, pose: Pose) -> Self {
        self.poses.insert(id, pose);
        self
    }
}

impl TransformTarget for PoseMap {
    fn pose(&self, id: BodyId) -> Option<Pose> {
        self.poses.get(&id).copied()
    }

    fn set_pose(&mut self, id: BodyId, pose: Pose) {
        if let Some(slot) = self.poses.get_mut(&id) {
            *slot = pose;
        }
    }

    fn set_mode(&mut self, id: BodyId, mode: BodyMode) {
        self.modes.insert(id, mode);
    }
}
