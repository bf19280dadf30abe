//! Lead solver for firing at a moving tank.
//!
//! Iteratively moves an aim point toward where the target will be when a
//! round fired at that point arrives. Bounded; falls back to the raw target
//! position when the refinement stops helping.

use glam::DVec2;
use tracing::trace;

use tankstrike_core::constants::*;
use tankstrike_core::enums::SolveOutcome;
use tankstrike_core::types::{Position, Velocity};

/// Solver tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptParams {
    /// Effective projectile speed (units/s).
    pub projectile_speed: f64,
    pub acceptable_miss: f64,
    pub max_iterations: u32,
    /// Consecutive iterations of growing miss treated as divergence.
    pub divergence_streak: u32,
}

impl Default for InterceptParams {
    fn default() -> Self {
        Self {
            projectile_speed: PROJECTILE_SPEED,
            acceptable_miss: ACCEPTABLE_MISS,
            max_iterations: MAX_INTERCEPT_ITERATIONS,
            divergence_streak: DIVERGENCE_STREAK,
        }
    }
}

/// Aim point plus how it was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptSolution {
    pub aim: Position,
    /// Heading from own position to `aim` (degrees).
    pub heading: f64,
    pub iterations: u32,
    /// Predicted miss at `aim` (units).
    pub miss: f64,
    pub outcome: SolveOutcome,
}

impl InterceptSolution {
    pub fn converged(&self) -> bool {
        self.outcome == SolveOutcome::Converged
    }
}

/// Solve for an aim point from `own` at a target at `target` moving with
/// `velocity`. Pass a zero velocity when no estimate exists.
pub fn solve(
    own: &Position,
    target: &Position,
    velocity: &Velocity,
    params: &InterceptParams,
) -> InterceptSolution {
    let origin = own.as_dvec2();
    let raw = target.as_dvec2();
    let vel = velocity.as_dvec2();

    if !(params.projectile_speed > 0.0) {
        return fallback(own, target, 0, f64::INFINITY);
    }

    // Where the target will be when a round aimed at `aim` gets there.
    let predicted = |aim: DVec2| raw + vel * (aim.distance(origin) / params.projectile_speed);
    let miss_at = |aim: DVec2| predicted(aim).distance(aim);

    let converged = |aim: DVec2, iterations: u32, miss: f64| {
        let aim = Position::from(aim);
        InterceptSolution {
            aim,
            heading: own.heading_to(&aim),
            iterations,
            miss,
            outcome: SolveOutcome::Converged,
        }
    };

    let mut aim = raw;
    let mut miss = miss_at(aim);
    let mut growing = 0;
    let mut iterations = 0;

    while iterations < params.max_iterations {
        iterations += 1;
        if miss < params.acceptable_miss {
            return converged(aim, iterations, miss);
        }

        let correction = (predicted(aim) - aim) * 0.5;
        let toward = aim + correction;
        let away = aim - correction;
        let (toward_miss, away_miss) = (miss_at(toward), miss_at(away));
        let (next, next_miss) = if toward_miss <= away_miss {
            (toward, toward_miss)
        } else {
            (away, away_miss)
        };
        trace!(iterations, miss, next_miss, "intercept step");

        growing = if next_miss > miss { growing + 1 } else { 0 };
        aim = next;
        miss = next_miss;
        if miss < params.acceptable_miss {
            return converged(aim, iterations, miss);
        }
        if growing >= params.divergence_streak {
            break;
        }
    }

    fallback(own, target, iterations, miss_at(raw))
}

fn fallback(own: &Position, target: &Position, iterations: u32, miss: f64) -> InterceptSolution {
    InterceptSolution {
        aim: *target,
        heading: own.heading_to(target),
        iterations,
        miss,
        outcome: SolveOutcome::Fallback,
    }
}
