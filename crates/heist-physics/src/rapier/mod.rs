//! Raw `rapier2d` physics backend.
//!
//! [`RapierContext`] owns the [`PhysicsPipeline`](rapier2d::pipeline::PhysicsPipeline),
//! calls `step()` itself and translates collider handles back to
//! [`FixtureId`](heist_core::types::FixtureId)s for the contact listener.

pub mod bridge;
pub mod context;

pub use context::RapierContext;
