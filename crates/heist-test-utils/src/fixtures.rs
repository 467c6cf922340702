//! Canonical level configurations.

use heist_core::config::{AgentConfig, LevelConfig, StageConfig};

/// Flat floor spanning the world, one stage platform above it and the goal
/// at the far right. The avatar spawns standing height above the floor.
pub fn flat_level() -> LevelConfig {
    let mut config = LevelConfig {
        walls: vec![vec![0.0, 0.0, 32.0, 0.0, 32.0, 1.0, 0.0, 1.0]],
        ..LevelConfig::default()
    };
    config.platforms.polygons = vec![vec![10.0, 4.0, 14.0, 4.0, 14.0, 5.0, 10.0, 5.0]];
    config.goal.pos = [30.0, 1.5];
    config.avatar.pos = [2.5, 1.5];
    config
}

/// Same as [`flat_level`] with a square stage pivot at `(12, 4.5)` and a
/// 90 degree increment.
pub fn quarter_turn_level() -> LevelConfig {
    LevelConfig {
        stage: StageConfig {
            pivot: Some([12.0, 4.5]),
            increment_degrees: 90.0,
            speed_degrees: 90.0,
        },
        ..flat_level()
    }
}

/// [`flat_level`] plus one chasing agent on the floor.
pub fn chase_level() -> LevelConfig {
    let mut config = flat_level();
    config.agents.push(AgentConfig {
        name: Some("guard".into()),
        pos: [20.0, 1.5],
        ..AgentConfig::default()
    });
    config
}

/// A TOML level exercising every section.
pub const CANONICAL_LEVEL_TOML: &str = r#"
walls = [
    [0.0, 0.0, 32.0, 0.0, 32.0, 1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0, 1.0, 1.0, 18.0, 0.0, 18.0],
]
volume = 0.5

[world]
width = 32.0
height = 18.0
failure_height = -1.0

[goal]
pos = [30.0, 1.5]
size = [1.0, 1.0]

[defaults]
friction = 0.6
gravity = -14.7

[platforms]
polygons = [
    [8.0, 6.0, 16.0, 6.0, 16.0, 7.0, 8.0, 7.0],
    [18.0, 9.0, 24.0, 9.0, 24.0, 10.0, 18.0, 10.0],
]

[stage]
pivot = [16.0, 9.0]
increment_degrees = 60.0
speed_degrees = 60.0

[avatar]
pos = [2.5, 1.5]
sensor_name = "AntGroundSensor"

[projectile]
enabled = true

[[agents]]
name = "guard"
pos = [20.0, 1.5]

[agents.behavior]
speed_scale = 0.5

[agents.behavior.mode]
kind = "patrol"
waypoints = [[18.0, 1.5], [26.0, 1.5]]
"#;

/// [`CANONICAL_LEVEL_TOML`], parsed.
pub fn canonical_level() -> LevelConfig {
    match LevelConfig::from_toml_str(CANONICAL_LEVEL_TOML) {
        Ok(config) => config,
        Err(e) => panic!("canonical level fixture is invalid: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use heist_core::config::BehaviorMode;

    use super::*;

    #[test]
    fn fixtures_validate() {
        for config in [flat_level(), quarter_turn_level(), chase_level()] {
            config.validate().unwrap();
        }
    }

    #[test]
    fn canonical_level_parses_every_section() {
        let config = canonical_level();
        assert_eq!(config.walls.len(), 2);
        assert_eq!(config.platforms.polygons.len(), 2);
        assert!(config.projectile.enabled);
        assert!((config.volume - 0.5).abs() < f32::EPSILON);
        assert!(matches!(
            config.agents[0].behavior.mode,
            BehaviorMode::Patrol { ref waypoints, .. } if waypoints.len() == 2
        ));
    }
}
