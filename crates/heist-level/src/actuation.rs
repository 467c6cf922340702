//! Intent to force.

/// Horizontal force for one tick.
///
/// With an intent, pushes at `intent * force` until the body already moves
/// at `max_speed` in that direction. Without one, brakes with
/// `-damping * velocity_x`.
pub fn drive_force(intent: f32, velocity_x: f32, force: f32, damping: f32, max_speed: f32) -> f32 {
    if intent == 0.0 {
        return -damping * velocity_x;
    }
    if velocity_x * intent.signum() >= max_speed {
        return 0.0;
    }
    intent * force
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_intent_pushes() {
        assert!((drive_force(1.0, 0.0, 20.0, 10.0, 5.0) - 20.0).abs() < f32::EPSILON);
        assert!((drive_force(-0.5, 0.0, 20.0, 10.0, 5.0) + 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn no_push_past_max_speed() {
        assert!(drive_force(1.0, 5.0, 20.0, 10.0, 5.0).abs() < f32::EPSILON);
        assert!(drive_force(-1.0, -6.0, 20.0, 10.0, 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn reversing_is_allowed_at_speed() {
        assert!((drive_force(-1.0, 5.0, 20.0, 10.0, 5.0) + 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn idle_brakes() {
        assert!((drive_force(0.0, 2.0, 20.0, 10.0, 5.0) + 20.0).abs() < f32::EPSILON);
        assert!(drive_force(0.0, 0.0, 20.0, 10.0, 5.0).abs() < f32::EPSILON);
    }
}
