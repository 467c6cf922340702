// heist-stage: the rotating stage.
//
// A `Stage` is a plain record (pivot, member bodies, increment, speed). The
// `RotationEngine` resource advances one commanded rotation at a time and
// reports each tick's rigid transform so dependents (the nav graph) can
// apply the identical transform.

pub mod rotation;
pub mod target;

pub use rotation::{RotationEngine, RotationState, RotationStep, Rider, Stage};
pub use target::{BackendTarget, PoseMap, TransformTarget};
