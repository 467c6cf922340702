//! Gathering nav surfaces from live physics bodies.

use heist_core::types::BodyId;
use heist_physics::backend::PhysicsBackend;
use heist_physics::registry::RigidBodyRegistry;

use crate::graph::Surface;

/// World-space outlines of every wall and platform, in registry order.
///
/// Bodies listed in `stage_members` are flagged as rotating with the stage.
pub fn collect_surfaces(
    registry: &RigidBodyRegistry,
    backend: &dyn PhysicsBackend,
    stage_members: &[BodyId],
) -> Vec<Surface> {
    registry
        .iter()
        .filter(|r| r.kind.is_surface())
        .filter_map(|r| {
            let pose = backend.pose(r.handle)?;
            Some(Surface {
                owner: r.id,
                outline: registry.world_outline(r.id, pose)?,
                on_stage: stage_members.contains(&r.id),
            })
        })
        .collect()
}
