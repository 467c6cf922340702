use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TickClock
// ---------------------------------------------------------------------------

/// Fixed-step simulation clock.
///
/// One `App::update()` advances the level by exactly one tick of `dt`
/// seconds; systems read `dt` from here rather than from wall time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
pub struct TickClock {
    dt: f32,
    tick: u64,
}

impl TickClock {
    #[must_use]
    pub const fn new(dt: f32) -> Self {
        Self { dt, tick: 0 }
    }

    /// Timestep in seconds.
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Number of completed ticks.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed.
    pub fn elapsed_secs(&self) -> f64 {
        f64::from(self.dt) * self.tick as f64
    }

    pub const fn advance(&mut self) {
        self.tick += 1;
    }

    pub const fn reset(&mut self) {
        self.tick = 0;
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = TickClock::new(0.5);
        assert_eq!(clock.tick(), 0);
        assert!((clock.dt() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn advance_and_elapsed() {
        let mut clock = TickClock::new(0.25);
        for _ in 0..8 {
            clock.advance();
        }
        assert_eq!(clock.tick(), 8);
        assert!((clock.elapsed_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_ticks() {
        let mut clock = TickClock::default();
        clock.advance();
        clock.reset();
        assert_eq!(clock.tick(), 0);
        assert!((clock.dt() - 1.0 / 60.0).abs() < f32::EPSILON);
    }
}
