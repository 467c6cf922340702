//! Input buffer.
//!
//! [`InputState`] stores what the input collaborator reported since the last
//! tick: a held horizontal axis plus edge-triggered presses. Systems consume
//! the edges, so each press acts at most once.

use bevy_ecs::prelude::Resource;
use heist_core::types::RotationDirection;

// ---------------------------------------------------------------------------
// InputState
// ---------------------------------------------------------------------------

/// Buffered player input.
///
/// ```
/// use heist_level::InputState;
/// use heist_core::types::RotationDirection;
///
/// let mut input = InputState::new();
/// input.set_axis(2.0);
/// input.press_rotate(RotationDirection::Clockwise);
///
/// assert!((input.axis() - 1.0).abs() < f32::EPSILON);
/// assert_eq!(input.take_rotate(), Some(RotationDirection::Clockwise));
/// assert_eq!(input.take_rotate(), None);
/// ```
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct InputState {
    axis: f32,
    rotate_cw: bool,
    rotate_ccw: bool,
    fire: bool,
    jump: bool,
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the held horizontal axis, clamped to [-1, 1]. NaN reads as 0.
    pub fn set_axis(&mut self, value: f32) {
        self.axis = if value.is_nan() {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        };
    }

    pub const fn axis(&self) -> f32 {
        self.axis
    }

    pub const fn press_rotate(&mut self, direction: RotationDirection) {
        match direction {
            RotationDirection::Clockwise => self.rotate_cw = true,
            RotationDirection::CounterClockwise => self.rotate_ccw = true,
        }
    }

    pub const fn press_fire(&mut self) {
        self.fire = true;
    }

    pub const fn press_jump(&mut self) {
        self.jump = true;
    }

    /// Consume pending rotation presses. Clockwise wins when both arrived.
    pub const fn take_rotate(&mut self) -> Option<RotationDirection> {
        let direction = if self.rotate_cw {
            Some(RotationDirection::Clockwise)
        } else if self.rotate_ccw {
            Some(RotationDirection::CounterClockwise)
        } else {
            None
        };
        self.rotate_cw = false;
        self.rotate_ccw = false;
        direction
    }

    pub const fn take_fire(&mut self) -> bool {
        std::mem::replace(&mut self.fire, false)
    }

    pub const fn take_jump(&mut self) -> bool {
        std::mem::replace(&mut self.jump, false)
    }

    /// Release the axis and drop every pending press.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
