use bevy_ecs::prelude::Resource;
use glam::Vec2;
use heist_core::math::rotate_pose_about;
use heist_core::types::{BodyId, BodyMode, RotationDirection};

use crate::target::TransformTarget;

/// Fraction of the increment below which a remainder is folded into the
/// current tick. Covers the rounding of an `f32` tick length.
pub const REMAINDER_FRACTION: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The group of bodies that rotate together, and how they rotate.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub pivot: Vec2,
    /// Member bodies in rotation order.
    pub members: Vec<BodyId>,
    /// Angle turned per command, radians.
    pub increment: f64,
    /// Radians per second.
    pub angular_speed: f64,
}

impl Stage {
    pub const fn new(pivot: Vec2, members: Vec<BodyId>, increment: f64, angular_speed: f64) -> Self {
        Self {
            pivot,
            members,
            increment,
            angular_speed,
        }
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.members.contains(&id)
    }
}

// ---------------------------------------------------------------------------
// RotationState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum RotationState {
    #[default]
    Idle,
    Rotating {
        direction: RotationDirection,
        /// Unsigned radians still to turn.
        remaining: f64,
    },
}

/// A character offered for attachment with a rotation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rider {
    pub id: BodyId,
    /// Whether the character currently stands on a stage member.
    pub grounded: bool,
}

/// The transform applied by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationStep {
    pub pivot: Vec2,
    /// Radians applied this tick, counter-clockwise positive.
    pub signed_delta: f64,
    /// This tick finished the command.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// RotationEngine
// ---------------------------------------------------------------------------

/// Applies commanded rotations to the [`Stage`], one tick at a time.
///
/// At most one command is in flight; requests while busy are dropped.
#[derive(Debug, Default, Resource)]
pub struct RotationEngine {
    stage: Option<Stage>,
    state: RotationState,
    attached: Option<BodyId>,
}

impl RotationEngine {
    pub const fn new(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            state: RotationState::Idle,
            attached: None,
        }
    }

    /// Replace the stage. Any in-flight rotation is abandoned.
    pub fn load(&mut self, stage: Stage) {
        *self = Self::new(stage);
    }

    /// Forget the stage entirely.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub const fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    pub fn pivot(&self) -> Option<Vec2> {
        self.stage.as_ref().map(|s| s.pivot)
    }

    pub const fn state(&self) -> RotationState {
        self.state
    }

    pub const fn is_rotating(&self) -> bool {
        matches!(self.state, RotationState::Rotating { .. })
    }

    /// Unsigned radians left in the current command; zero when idle.
    pub const fn remaining(&self) -> f64 {
        match self.state {
            RotationState::Idle => 0.0,
            RotationState::Rotating { remaining, .. } => remaining,
        }
    }

    pub const fn direction(&self) -> Option<RotationDirection> {
        match self.state {
            RotationState::Idle => None,
            RotationState::Rotating { direction, .. } => Some(direction),
        }
    }

    /// Character being carried by the current rotation.
    pub const fn attached(&self) -> Option<BodyId> {
        self.attached
    }

    /// Start a rotation if idle.
    ///
    /// A grounded `rider` is switched to kinematic mode and carried along
    /// until the rotation completes. Returns whether a rotation started.
    pub fn request_rotation(
        &mut self,
        direction: RotationDirection,
        rider: Option<Rider>,
        bodies: &mut dyn TransformTarget,
    ) -> bool {
        let Some(stage) = &self.stage else {
            tracing::debug!("rotation requested with no stage loaded");
            return false;
        };
        if self.is_rotating() {
            tracing::debug!(?direction, "rotation already in flight; request ignored");
            return false;
        }
        self.state = RotationState::Rotating {
            direction,
            remaining: stage.increment,
        };
        self.attached = rider.filter(|r| r.grounded && !stage.contains(r.id)).map(|r| r.id);
        if let Some(id) = self.attached {
            bodies.set_mode(id, BodyMode::Kinematic);
        }
        tracing::debug!(?direction, attached = ?self.attached, "rotation started");
        true
    }

    /// Advance the in-flight rotation by `dt` seconds.
    ///
    /// Returns the transform applied, or `None` when idle.
    pub fn tick(&mut self, dt: f32, bodies: &mut dyn TransformTarget) -> Option<RotationStep> {
        let RotationState::Rotating {
            direction,
            remaining,
        } = self.state
        else {
            return None;
        };
        let stage = self.stage.as_ref()?;

        let mut delta = (stage.angular_speed * f64::from(dt)).min(remaining);
        let mut left = remaining - delta;
        if left <= stage.increment * REMAINDER_FRACTION {
            delta = remaining;
            left = 0.0;
        }
        let signed_delta = direction.sign() * delta;

        for &id in stage.members.iter().chain(self.attached.as_ref()) {
            match bodies.pose(id) {
                Some(pose) => bodies.set_pose(id, rotate_pose_about(pose, stage.pivot, signed_delta)),
                None => tracing::warn!(body = %id, "stage member has no pose; skipped"),
            }
        }

        let step = RotationStep {
            pivot: stage.pivot,
            signed_delta,
            finished: left == 0.0,
        };

        if step.finished {
            self.state = RotationState::Idle;
            if let Some(id) = self.attached.take() {
                bodies.set_mode(id, BodyMode::Dynamic);
            }
            tracing::debug!("rotation complete");
        } else {
            self.state = RotationState::Rotating {
                direction,
                remaining: left,
            };
        }
        Some(step)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_3};

    use heist_core::types::Pose;

    use super::*;
    use crate::target::PoseMap;

    fn engine(pivot: Vec2, members: Vec<BodyId>, increment: f64) -> RotationEngine {
        RotationEngine::new(Stage::new(pivot, members, increment, FRAC_PI_3))
    }

    #[test]
    fn idle_request_sets_full_increment() {
        let mut e = engine(Vec2::ZERO, vec![], FRAC_PI_3);
        let mut bodies = PoseMap::default();
        assert!(e.request_rotation(RotationDirection::Clockwise, None, &mut bodies));
        assert!(e.remaining().to_bits() == FRAC_PI_3.to_bits());
        assert_eq!(e.direction(), Some(RotationDirection::Clockwise));
    }

    #[test]
    fn busy_request_is_noop() {
        let mut e = engine(Vec2::ZERO, vec![], FRAC_PI_3);
        let mut bodies = PoseMap::default();
        e.request_rotation(RotationDirection::CounterClockwise, None, &mut bodies);
        e.tick(0.1, &mut bodies);
        let before = e.state();
        assert!(!e.request_rotation(RotationDirection::Clockwise, None, &mut bodies));
        assert_eq!(e.state(), before);
    }

    #[test]
    fn idle_tick_does_nothing() {
        let mut e = engine(Vec2::ZERO, vec![BodyId(0)], FRAC_PI_3);
        let mut bodies = PoseMap::default().with(BodyId(0), Pose::at(1.0, 0.0));
        assert!(e.tick(1.0 / 60.0, &mut bodies).is_none());
        assert_eq!(bodies.poses[&BodyId(0)], Pose::at(1.0, 0.0));
    }

    #[test]
    fn sixty_ticks_complete_sixty_degrees() {
        let mut e = engine(Vec2::new(16.0, 9.0), vec![], FRAC_PI_3);
        let mut bodies = PoseMap::default();
        e.request_rotation(RotationDirection::CounterClockwise, None, &mut bodies);
        let mut prev = e.remaining();
        let mut sum = 0.0;
        for tick in 1..=60 {
            let step = e.tick(1.0 / 60.0, &mut bodies).unwrap();
            sum += step.signed_delta;
            assert!(e.remaining() < prev, "tick {tick} did not decrease");
            prev = e.remaining();
            if tick < 60 {
                assert!(e.remaining() > 0.0);
                assert!(!step.finished);
            } else {
                assert!(step.finished);
            }
        }
        assert_eq!(e.remaining(), 0.0);
        assert!(!e.is_rotating());
        assert!((sum - FRAC_PI_3).abs() < 1e-12);
    }

    #[test]
    fn exact_partition_has_no_sliver_tick() {
        for (dt, expected) in [(0.02_f32, 50), (0.01, 100), (1.0 / 60.0, 60), (0.05, 20)] {
            let mut e = engine(Vec2::ZERO, vec![], FRAC_PI_3);
            let mut bodies = PoseMap::default();
            e.request_rotation(RotationDirection::CounterClockwise, None, &mut bodies);
            let mut ticks = 0;
            let mut sum = 0.0;
            while let Some(step) = e.tick(dt, &mut bodies) {
                ticks += 1;
                sum += step.signed_delta;
                assert!(step.signed_delta > FRAC_PI_3 / 200.0, "dt {dt}: sliver {}", step.signed_delta);
            }
            assert_eq!(ticks, expected, "dt {dt}");
            assert!((sum - FRAC_PI_3).abs() < 1e-12);
        }
    }

    #[test]
    fn uneven_partition_never_overshoots() {
        for dt in [0.007_f32, 0.05, 0.3, 1.0 / 60.0, 2.0] {
            let mut e = engine(Vec2::ZERO, vec![], FRAC_PI_3);
            let mut bodies = PoseMap::default();
            e.request_rotation(RotationDirection::Clockwise, None, &mut bodies);
            let mut sum = 0.0;
            while let Some(step) = e.tick(dt, &mut bodies) {
                assert!(step.signed_delta <= 0.0);
                sum += step.signed_delta;
            }
            assert!((sum + FRAC_PI_3).abs() < 1e-12, "dt {dt}: sum {sum}");
            assert_eq!(e.remaining(), 0.0);
        }
    }

    #[test]
    fn clockwise_quarter_turn_about_origin() {
        let id = BodyId(4);
        let mut e = RotationEngine::new(Stage::new(Vec2::ZERO, vec![id], FRAC_PI_2, FRAC_PI_2));
        let mut bodies = PoseMap::default().with(id, Pose::at(5.0, 0.0));
        e.request_rotation(RotationDirection::Clockwise, None, &mut bodies);
        while e.tick(1.0 / 60.0, &mut bodies).is_some() {}
        let pose = bodies.poses[&id];
        assert!((pose.position - Vec2::new(0.0, -5.0)).length() < 1e-4);
        assert!((pose.angle + std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn members_keep_pivot_distance() {
        let pivot = Vec2::new(16.0, 9.0);
        let ids = [BodyId(0), BodyId(1), BodyId(2)];
        let starts = [Vec2::new(3.0, 1.0), Vec2::new(30.0, 17.5), Vec2::new(16.0, 2.0)];
        let mut bodies = PoseMap::default();
        for (id, p) in ids.iter().zip(starts) {
            bodies = bodies.with(*id, Pose::new(p, 0.0));
        }
        let mut e = engine(pivot, ids.to_vec(), FRAC_PI_3);
        e.request_rotation(RotationDirection::CounterClockwise, None, &mut bodies);
        while e.tick(1.0 / 60.0, &mut bodies).is_some() {
            for (id, p) in ids.iter().zip(starts) {
                let r = (bodies.poses[id].position - pivot).length();
                assert!((r - (p - pivot).length()).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn grounded_rider_is_carried_and_restored() {
        let rider = BodyId(9);
        let mut bodies = PoseMap::default().with(rider, Pose::at(2.0, 0.0));
        let mut e = engine(Vec2::ZERO, vec![], FRAC_PI_2);
        e.request_rotation(
            RotationDirection::CounterClockwise,
            Some(Rider {
                id: rider,
                grounded: true,
            }),
            &mut bodies,
        );
        assert_eq!(e.attached(), Some(rider));
        assert_eq!(bodies.modes[&rider], BodyMode::Kinematic);
        while e.tick(0.1, &mut bodies).is_some() {}
        assert_eq!(bodies.modes[&rider], BodyMode::Dynamic);
        assert_eq!(e.attached(), None);
        assert!((bodies.poses[&rider].position - Vec2::new(0.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn airborne_rider_is_left_alone() {
        let rider = BodyId(9);
        let mut bodies = PoseMap::default().with(rider, Pose::at(2.0, 0.0));
        let mut e = engine(Vec2::ZERO, vec![], FRAC_PI_2);
        assert!(e.request_rotation(
            RotationDirection::Clockwise,
            Some(Rider {
                id: rider,
                grounded: false,
            }),
            &mut bodies,
        ));
        assert!(e.is_rotating());
        assert_eq!(e.attached(), None);
        while e.tick(0.1, &mut bodies).is_some() {}
        assert_eq!(bodies.poses[&rider], Pose::at(2.0, 0.0));
        assert!(bodies.modes.is_empty());
    }

    #[test]
    fn no_stage_rejects_requests() {
        let mut e = RotationEngine::default();
        let mut bodies = PoseMap::default();
        assert!(!e.request_rotation(RotationDirection::Clockwise, None, &mut bodies));
        assert!(e.pivot().is_none());
    }

    #[test]
    fn load_abandons_rotation() {
        let mut e = engine(Vec2::ZERO, vec![], FRAC_PI_3);
        let mut bodies = PoseMap::default();
        e.request_rotation(RotationDirection::Clockwise, None, &mut bodies);
        e.load(Stage::new(Vec2::ONE, vec![], FRAC_PI_3, FRAC_PI_3));
        assert!(!e.is_rotating());
        assert_eq!(e.pivot(), Some(Vec2::ONE));
    }
}
