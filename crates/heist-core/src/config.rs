use bevy_ecs::prelude::Resource;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::deg_to_rad;
use crate::types::Material;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_width() -> f32 {
    32.0
}
const fn default_height() -> f32 {
    18.0
}
const fn default_failure_height() -> f32 {
    -1.0
}
const fn default_dt() -> f32 {
    1.0 / 60.0
}
const fn default_goal_size() -> [f32; 2] {
    [1.0, 1.0]
}
const fn default_true() -> bool {
    true
}
const fn default_friction() -> f32 {
    0.6
}
const fn default_gravity() -> f32 {
    -14.7
}
const fn default_increment_degrees() -> f32 {
    60.0
}
const fn default_speed_degrees() -> f32 {
    60.0
}
const fn default_avatar_pos() -> [f32; 2] {
    [2.5, 5.0]
}
const fn default_avatar_width() -> f32 {
    0.6
}
const fn default_avatar_height() -> f32 {
    0.9
}
const fn default_force() -> f32 {
    20.0
}
const fn default_damping() -> f32 {
    10.0
}
const fn default_max_speed() -> f32 {
    5.0
}
const fn default_density() -> f32 {
    1.0
}
const fn default_jump_force() -> f32 {
    5.5
}
fn default_sensor_name() -> String {
    "AntGroundSensor".into()
}
const fn default_sensor_height() -> f32 {
    0.05
}
const fn default_sensor_shrink() -> f32 {
    0.6
}
const fn default_bullet_offset() -> f32 {
    1.5
}
const fn default_bullet_speed() -> f32 {
    20.0
}
const fn default_bullet_radius() -> f32 {
    0.25
}
const fn default_sample_spacing() -> f32 {
    0.5
}
const fn default_step_distance() -> f32 {
    1.0
}
const fn default_max_climb() -> f32 {
    0.75
}
const fn default_max_drop() -> f32 {
    3.0
}
const fn default_clearance() -> f32 {
    0.25
}
const fn default_max_slope_degrees() -> f32 {
    45.0
}
const fn default_speed_scale() -> f32 {
    1.0
}
const fn default_arrive_radius() -> f32 {
    0.5
}
const fn default_volume() -> f32 {
    1.0
}

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Level bounds, timestep and the failure threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// World width in physics units (default: 32).
    #[serde(default = "default_width")]
    pub width: f32,
    /// World height in physics units (default: 18).
    #[serde(default = "default_height")]
    pub height: f32,
    /// The avatar fails the level below this y (default: -1).
    #[serde(default = "default_failure_height")]
    pub failure_height: f32,
    /// Fixed simulation timestep in seconds (default: 1/60).
    #[serde(default = "default_dt")]
    pub dt: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            failure_height: default_failure_height(),
            dt: default_dt(),
        }
    }
}

// ---------------------------------------------------------------------------
// GoalConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalConfig {
    #[serde(default)]
    pub pos: [f32; 2],
    #[serde(default = "default_goal_size")]
    pub size: [f32; 2],
    #[serde(default)]
    pub density: f32,
    #[serde(default)]
    pub friction: f32,
    #[serde(default)]
    pub restitution: f32,
    #[serde(default = "default_true")]
    pub sensor: bool,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            pos: [0.0; 2],
            size: default_goal_size(),
            density: 0.0,
            friction: 0.0,
            restitution: 0.0,
            sensor: true,
        }
    }
}

impl GoalConfig {
    pub const fn material(&self) -> Material {
        Material::new(self.density, self.friction, self.restitution)
    }
}

// ---------------------------------------------------------------------------
// DefaultsConfig
// ---------------------------------------------------------------------------

/// Material values for walls (and platforms without their own) plus gravity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub density: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    #[serde(default)]
    pub restitution: f32,
    /// Vertical gravity in units/s^2 (default: -14.7).
    #[serde(default = "default_gravity")]
    pub gravity: f32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            density: 0.0,
            friction: default_friction(),
            restitution: 0.0,
            gravity: default_gravity(),
        }
    }
}

impl DefaultsConfig {
    pub const fn material(&self) -> Material {
        Material::new(self.density, self.friction, self.restitution)
    }
}

// ---------------------------------------------------------------------------
// PlatformsConfig
// ---------------------------------------------------------------------------

/// Polygons forming the rotating stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformsConfig {
    /// Flat `[x0, y0, x1, y1, ...]` vertex lists in world coordinates.
    #[serde(default)]
    pub polygons: Vec<Vec<f32>>,
    /// Overrides [`DefaultsConfig`] material when present.
    #[serde(default)]
    pub material: Option<Material>,
}

// ---------------------------------------------------------------------------
// StageConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Rotation pivot; defaults to the centre of the world bounds.
    #[serde(default)]
    pub pivot: Option<[f32; 2]>,
    /// Angle turned by one rotation command (default: 60).
    #[serde(default = "default_increment_degrees")]
    pub increment_degrees: f32,
    /// Angular speed while rotating (default: 60 deg/s).
    #[serde(default = "default_speed_degrees")]
    pub speed_degrees: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            pivot: None,
            increment_degrees: default_increment_degrees(),
            speed_degrees: default_speed_degrees(),
        }
    }
}

impl StageConfig {
    /// Per-command increment in radians.
    pub fn increment(&self) -> f64 {
        deg_to_rad(self.increment_degrees)
    }

    /// Angular speed in radians per second.
    pub fn angular_speed(&self) -> f64 {
        deg_to_rad(self.speed_degrees)
    }
}

// ---------------------------------------------------------------------------
// AvatarConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarConfig {
    #[serde(default = "default_avatar_pos")]
    pub pos: [f32; 2],
    #[serde(default = "default_avatar_width")]
    pub width: f32,
    #[serde(default = "default_avatar_height")]
    pub height: f32,
    /// Horizontal force at full intent.
    #[serde(default = "default_force")]
    pub force: f32,
    /// Braking coefficient applied when there is no intent.
    #[serde(default = "default_damping")]
    pub damping: f32,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default)]
    pub friction: f32,
    #[serde(default)]
    pub jump_enabled: bool,
    #[serde(default = "default_jump_force")]
    pub jump_force: f32,
    /// Tag name of the foot sensor fixture.
    #[serde(default = "default_sensor_name")]
    pub sensor_name: String,
    #[serde(default = "default_sensor_height")]
    pub sensor_height: f32,
    /// Fraction of the body width covered by the foot sensor.
    #[serde(default = "default_sensor_shrink")]
    pub sensor_shrink: f32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            pos: default_avatar_pos(),
            width: default_avatar_width(),
            height: default_avatar_height(),
            force: default_force(),
            damping: default_damping(),
            max_speed: default_max_speed(),
            density: default_density(),
            friction: 0.0,
            jump_enabled: false,
            jump_force: default_jump_force(),
            sensor_name: default_sensor_name(),
            sensor_height: default_sensor_height(),
            sensor_shrink: default_sensor_shrink(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectileConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileConfig {
    /// Whether the fire input spawns bullets.
    #[serde(default)]
    pub enabled: bool,
    /// Horizontal spawn offset from the avatar, mirrored by facing.
    #[serde(default = "default_bullet_offset")]
    pub offset: f32,
    #[serde(default)]
    pub density: f32,
    #[serde(default = "default_bullet_speed")]
    pub speed: f32,
    #[serde(default = "default_bullet_radius")]
    pub radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            offset: default_bullet_offset(),
            density: 0.0,
            speed: default_bullet_speed(),
            radius: default_bullet_radius(),
        }
    }
}

// ---------------------------------------------------------------------------
// NavConfig
// ---------------------------------------------------------------------------

/// Sampling and connectivity parameters for the navigation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavConfig {
    /// Distance between sampled nodes along a walkable edge.
    #[serde(default = "default_sample_spacing")]
    pub sample_spacing: f32,
    /// Maximum horizontal gap an edge may span.
    #[serde(default = "default_step_distance")]
    pub step_distance: f32,
    /// Maximum upward height change of an edge.
    #[serde(default = "default_max_climb")]
    pub max_climb: f32,
    /// Maximum downward height change of an edge.
    #[serde(default = "default_max_drop")]
    pub max_drop: f32,
    /// Height above the surface at which nodes are placed.
    #[serde(default = "default_clearance")]
    pub clearance: f32,
    /// Steepest surface still considered walkable.
    #[serde(default = "default_max_slope_degrees")]
    pub max_slope_degrees: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            sample_spacing: default_sample_spacing(),
            step_distance: default_step_distance(),
            max_climb: default_max_climb(),
            max_drop: default_max_drop(),
            clearance: default_clearance(),
            max_slope_degrees: default_max_slope_degrees(),
        }
    }
}

// ---------------------------------------------------------------------------
// BehaviorConfig
// ---------------------------------------------------------------------------

/// How an AI controller picks where to go.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BehaviorMode {
    /// Pursue the target chosen by the [`TargetRule`].
    #[default]
    Chase,
    /// Cycle through waypoints, advancing within `arrive_radius`.
    Patrol {
        waypoints: Vec<[f32; 2]>,
        #[serde(default = "default_arrive_radius")]
        arrive_radius: f32,
    },
}

/// Target selection for chasing controllers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TargetRule {
    /// The closest player-controlled character.
    #[default]
    NearestPlayer,
    /// A fixed world point.
    Fixed { point: [f32; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    #[serde(default)]
    pub mode: BehaviorMode,
    #[serde(default)]
    pub target: TargetRule,
    /// Multiplier on the unit movement intent (default: 1).
    #[serde(default = "default_speed_scale")]
    pub speed_scale: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            mode: BehaviorMode::default(),
            target: TargetRule::default(),
            speed_scale: default_speed_scale(),
        }
    }
}

// ---------------------------------------------------------------------------
// AgentConfig
// ---------------------------------------------------------------------------

/// An AI-driven character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pos: [f32; 2],
    #[serde(default = "default_avatar_width")]
    pub width: f32,
    #[serde(default = "default_avatar_height")]
    pub height: f32,
    #[serde(default = "default_force")]
    pub force: f32,
    #[serde(default = "default_damping")]
    pub damping: f32,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default)]
    pub friction: f32,
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: None,
            pos: [0.0; 2],
            width: default_avatar_width(),
            height: default_avatar_height(),
            force: default_force(),
            damping: default_damping(),
            max_speed: default_max_speed(),
            density: default_density(),
            friction: 0.0,
            behavior: BehaviorConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// LevelConfig
// ---------------------------------------------------------------------------

/// Complete level description loaded from TOML.
///
/// Every field falls back to a documented default so partial level files
/// still produce a playable level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Resource)]
pub struct LevelConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub goal: GoalConfig,
    /// Static wall polygons as flat vertex lists.
    #[serde(default)]
    pub walls: Vec<Vec<f32>>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
    #[serde(default)]
    pub stage: StageConfig,
    #[serde(default)]
    pub avatar: AvatarConfig,
    #[serde(default)]
    pub projectile: ProjectileConfig,
    #[serde(default)]
    pub nav: NavConfig,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    /// Default sound volume (default: 1).
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl LevelConfig {
    /// Parse and validate a level from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Stage pivot, falling back to the centre of the world bounds.
    pub fn pivot(&self) -> Vec2 {
        self.stage.pivot.map_or_else(
            || Vec2::new(self.world.width / 2.0, self.world.height / 2.0),
            Vec2::from_array,
        )
    }

    /// Material for platform polygons.
    pub fn platform_material(&self) -> Material {
        self.platforms
            .material
            .unwrap_or_else(|| self.defaults.material())
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world.dt > 0.0 && self.world.dt.is_finite()) {
            return Err(ConfigError::InvalidTimestep(self.world.dt));
        }
        positive("stage.increment_degrees", self.stage.increment_degrees)?;
        positive("stage.speed_degrees", self.stage.speed_degrees)?;
        positive("avatar.width", self.avatar.width)?;
        positive("avatar.height", self.avatar.height)?;
        positive("projectile.radius", self.projectile.radius)?;
        positive("nav.sample_spacing", self.nav.sample_spacing)?;
        positive("nav.step_distance", self.nav.step_distance)?;
        finite("defaults.gravity", self.defaults.gravity)?;
        finite("world.failure_height", self.world.failure_height)?;
        finite("volume", self.volume)?;

        for (i, wall) in self.walls.iter().enumerate() {
            check_polygon(&format!("wall{i}"), wall)?;
        }
        for (i, platform) in self.platforms.polygons.iter().enumerate() {
            check_polygon(&format!("platform{i}"), platform)?;
        }
        for (i, agent) in self.agents.iter().enumerate() {
            positive(&format!("agents[{i}].width"), agent.width)?;
            positive(&format!("agents[{i}].height"), agent.height)?;
            finite(&format!("agents[{i}].behavior.speed_scale"), agent.behavior.speed_scale)?;
            if let BehaviorMode::Patrol { waypoints, .. } = &agent.behavior.mode {
                if waypoints.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("agents[{i}].behavior.mode.waypoints"),
                        message: "patrol needs at least one waypoint".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.into(),
            message: format!("{value} (must be > 0)"),
        })
    }
}

fn finite(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.into(),
            message: format!("{value} (must be finite)"),
        })
    }
}

fn check_polygon(name: &str, coords: &[f32]) -> Result<(), ConfigError> {
    if coords.len() % 2 != 0 {
        return Err(ConfigError::DegeneratePolygon {
            name: name.into(),
            message: "odd coordinate count".into(),
        });
    }
    if coords.len() < 6 {
        return Err(ConfigError::DegeneratePolygon {
            name: name.into(),
            message: format!("{} vertices (need at least 3)", coords.len() / 2),
        });
    }
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(ConfigError::DegeneratePolygon {
            name: name.into(),
            message: "non-finite coordinate".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = LevelConfig::default();
        assert!((cfg.world.dt - 1.0 / 60.0).abs() < f32::EPSILON);
        assert!((cfg.world.failure_height + 1.0).abs() < f32::EPSILON);
        assert!((cfg.stage.increment_degrees - 60.0).abs() < f32::EPSILON);
        assert_eq!(cfg.avatar.sensor_name, "AntGroundSensor");
        assert!(!cfg.projectile.enabled);
        assert!(cfg.goal.sensor);
        // serde default and Default agree on volume
        let parsed: LevelConfig = toml::from_str("").unwrap();
        assert!((parsed.volume - 1.0).abs() < f32::EPSILON);
        assert_eq!(parsed.world, cfg.world);
    }

    #[test]
    fn default_validates() {
        assert!(LevelConfig::default().validate().is_ok());
    }

    #[test]
    fn pivot_defaults_to_world_centre() {
        let cfg = LevelConfig::default();
        assert_eq!(cfg.pivot(), Vec2::new(16.0, 9.0));

        let mut cfg = LevelConfig::default();
        cfg.stage.pivot = Some([1.0, 2.0]);
        assert_eq!(cfg.pivot(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn increment_in_radians() {
        let stage = StageConfig::default();
        assert!((stage.increment() - std::f64::consts::FRAC_PI_3).abs() < 1e-12);
        assert!((stage.angular_speed() - std::f64::consts::FRAC_PI_3).abs() < 1e-12);
    }

    #[test]
    fn platform_material_falls_back_to_defaults() {
        let mut cfg = LevelConfig::default();
        assert_eq!(cfg.platform_material(), cfg.defaults.material());
        cfg.platforms.material = Some(Material::new(2.0, 0.1, 0.3));
        assert_eq!(cfg.platform_material(), Material::new(2.0, 0.1, 0.3));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let text = r"
            walls = [[0.0, 0.0, 32.0, 0.0, 32.0, 1.0, 0.0, 1.0]]

            [goal]
            pos = [29.0, 2.0]

            [defaults]
            gravity = -9.8

            [platforms]
            polygons = [[10.0, 5.0, 14.0, 5.0, 14.0, 5.5, 10.0, 5.5]]
        ";
        let cfg = LevelConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.walls.len(), 1);
        assert_eq!(cfg.goal.pos, [29.0, 2.0]);
        assert_eq!(cfg.goal.size, [1.0, 1.0]);
        assert!((cfg.defaults.gravity + 9.8).abs() < f32::EPSILON);
        assert!((cfg.defaults.friction - 0.6).abs() < f32::EPSILON);
        assert_eq!(cfg.platforms.polygons.len(), 1);
        assert!((cfg.avatar.force - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn agent_behaviors_parse() {
        let text = r#"
            [[agents]]
            pos = [5.0, 3.0]
            [agents.behavior]
            speed_scale = 0.5
            mode = { kind = "patrol", waypoints = [[1.0, 1.0], [8.0, 1.0]] }

            [[agents]]
            name = "bee"
            [agents.behavior]
            target = { kind = "fixed", point = [3.0, 4.0] }
        "#;
        let cfg = LevelConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.agents.len(), 2);
        let BehaviorMode::Patrol {
            waypoints,
            arrive_radius,
        } = &cfg.agents[0].behavior.mode
        else {
            panic!("expected patrol");
        };
        assert_eq!(waypoints.len(), 2);
        assert!((arrive_radius - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.agents[1].behavior.mode, BehaviorMode::Chase);
        assert_eq!(
            cfg.agents[1].behavior.target,
            TargetRule::Fixed { point: [3.0, 4.0] }
        );
        assert_eq!(cfg.agents[1].name.as_deref(), Some("bee"));
    }

    #[test]
    fn rejects_zero_timestep() {
        let mut cfg = LevelConfig::default();
        cfg.world.dt = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTimestep(_))
        ));
    }

    #[test]
    fn rejects_non_positive_increment() {
        let mut cfg = LevelConfig::default();
        cfg.stage.increment_degrees = 0.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("stage.increment_degrees"));
    }

    #[test]
    fn rejects_odd_polygon() {
        let mut cfg = LevelConfig::default();
        cfg.walls.push(vec![0.0, 0.0, 1.0, 0.0, 1.0]);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DegeneratePolygon { .. }));
        assert!(err.to_string().contains("wall0"));
    }

    #[test]
    fn rejects_two_vertex_platform() {
        let mut cfg = LevelConfig::default();
        cfg.platforms.polygons.push(vec![0.0, 0.0, 1.0, 0.0]);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("platform0"));
    }

    #[test]
    fn rejects_empty_patrol() {
        let mut cfg = LevelConfig::default();
        cfg.agents.push(AgentConfig {
            behavior: BehaviorConfig {
                mode: BehaviorMode::Patrol {
                    waypoints: vec![],
                    arrive_radius: 0.5,
                },
                ..BehaviorConfig::default()
            },
            ..AgentConfig::default()
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = LevelConfig::from_toml_str("walls = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn from_file_missing() {
        let err = LevelConfig::from_file("/nonexistent/level.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
