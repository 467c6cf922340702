// heist-physics: engine-agnostic physics layer for the rotating-stage simulation.
//
// The `PhysicsBackend` trait hides the concrete engine (rapier2d here, an
// in-memory mock in tests). The registry maps stable body ids to engine
// handles and kinds; the contact state machine turns begin/end callbacks
// into grounding, goal completion and projectile removal.

pub mod backend;
pub mod contact;
pub mod plugin;
pub mod rapier;
pub mod registry;
pub mod systems;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        backend::{BodyHandle, BodySpec, ContactListener, FixtureSpec, PhysicsBackend},
        contact::{ContactEvent, ContactStateMachine, SensorOwnership},
        plugin::{HeistPhysicsPlugin, PhysicsWorld},
        rapier::RapierContext,
        registry::{BodyRecord, BodyTemplate, Resolved, RigidBodyRegistry},
    };
}

pub use plugin::{HeistPhysicsPlugin, PhysicsWorld};
