//! Per-character decision makers.
//!
//! Every controller implements [`Controller`]; [`controller_for`] builds the
//! right one from a [`BehaviorConfig`].

use glam::Vec2;
use heist_core::config::{BehaviorConfig, BehaviorMode, TargetRule};
use heist_nav::NavGraph;

/// What a controller may look at when deciding.
pub struct DecisionContext<'a> {
    /// The controlled character's position.
    pub position: Vec2,
    /// Positions of player-controlled characters.
    pub players: &'a [Vec2],
    pub graph: &'a NavGraph,
}

/// Produces a horizontal movement intent in [-1, 1] each tick.
pub trait Controller: Send + Sync {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> f32;

    fn name(&self) -> &str;

    /// Where the controller is currently heading, if anywhere.
    fn target(&self, ctx: &DecisionContext<'_>) -> Option<Vec2>;
}

fn steer(ctx: &DecisionContext<'_>, target: Option<Vec2>, speed_scale: f32) -> f32 {
    target.map_or(0.0, |t| {
        (f32::from(ctx.graph.query_next_step(ctx.position, t)) * speed_scale).clamp(-1.0, 1.0)
    })
}

// ---------------------------------------------------------------------------
// ChaseController
// ---------------------------------------------------------------------------

/// Heads for the target chosen by a [`TargetRule`].
pub struct ChaseController {
    rule: TargetRule,
    speed_scale: f32,
}

impl ChaseController {
    pub const fn new(rule: TargetRule, speed_scale: f32) -> Self {
        Self { rule, speed_scale }
    }
}

impl Controller for ChaseController {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> f32 {
        steer(ctx, self.target(ctx), self.speed_scale)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ChaseController"
    }

    fn target(&self, ctx: &DecisionContext<'_>) -> Option<Vec2> {
        match &self.rule {
            TargetRule::Fixed { point } => Some(Vec2::from_array(*point)),
            TargetRule::NearestPlayer => ctx
                .players
                .iter()
                .copied()
                .min_by(|a, b| {
                    a.distance_squared(ctx.position)
                        .total_cmp(&b.distance_squared(ctx.position))
                }),
        }
    }
}

// ---------------------------------------------------------------------------
// PatrolController
// ---------------------------------------------------------------------------

/// Cycles through waypoints, advancing on arrival.
pub struct PatrolController {
    waypoints: Vec<Vec2>,
    arrive_radius: f32,
    speed_scale: f32,
    current: usize,
}

impl PatrolController {
    pub fn new(waypoints: &[[f32; 2]], arrive_radius: f32, speed_scale: f32) -> Self {
        Self {
            waypoints: waypoints.iter().copied().map(Vec2::from_array).collect(),
            arrive_radius,
            speed_scale,
            current: 0,
        }
    }

    /// Index of the waypoint being approached.
    pub const fn current(&self) -> usize {
        self.current
    }
}

impl Controller for PatrolController {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> f32 {
        if self.waypoints.is_empty() {
            return 0.0;
        }
        if ctx.position.distance(self.waypoints[self.current]) <= self.arrive_radius {
            self.current = (self.current + 1) % self.waypoints.len();
        }
        steer(ctx, self.target(ctx), self.speed_scale)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "PatrolController"
    }

    fn target(&self, _ctx: &DecisionContext<'_>) -> Option<Vec2> {
        self.waypoints.get(self.current).copied()
    }
}

/// Build the controller a behavior config asks for.
pub fn controller_for(config: &BehaviorConfig) -> Box<dyn Controller> {
    match &config.mode {
        BehaviorMode::Chase => Box::new(ChaseController::new(config.target.clone(), config.speed_scale)),
        BehaviorMode::Patrol {
            waypoints,
            arrive_radius,
        } => Box::new(PatrolController::new(waypoints, *arrive_radius, config.speed_scale)),
    }
}
