//! Reposition loop thread — drift toward a camp waypoint while idle.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::debug;

use tankstrike_core::commands::Command;
use tankstrike_core::enums::EngagementPhase;
use tankstrike_core::error::ActuatorError;
use tankstrike_core::state::OwnState;
use tankstrike_core::types::Position;
use tankstrike_tactics::actuator::Actuator;
use tankstrike_tactics::context::Wake;
use tankstrike_tactics::TacticalContext;

use crate::config::LoopTiming;

/// Commands that drive toward the nearest waypoint, or nothing when we are
/// already within `arrival` of it.
pub fn reposition_commands(own: &OwnState, waypoints: &[Position], arrival: f64) -> Vec<Command> {
    let Some(nearest) = waypoints.iter().min_by(|a, b| {
        own.position
            .range_to(a)
            .total_cmp(&own.position.range_to(b))
    }) else {
        return Vec::new();
    };

    let distance = own.position.range_to(nearest);
    if distance <= arrival {
        return Vec::new();
    }
    vec![
        Command::turn_to(own.position.heading_to(nearest)),
        Command::move_forward(distance),
    ]
}

/// Run until shutdown, moving only while nothing is being engaged.
pub fn run_reposition<A: Actuator + ?Sized>(
    ctx: &TacticalContext,
    actuator: &A,
    waypoints: &[Position],
    timing: &LoopTiming,
) -> Result<(), ActuatorError> {
    loop {
        if ctx.pause(timing.reposition_interval) == Wake::Shutdown {
            return Ok(());
        }
        let phase = ctx.engagement_snapshot().phase;
        if !matches!(phase, EngagementPhase::Idle | EngagementPhase::Scanning) {
            continue;
        }
        let Some(own) = ctx.own_snapshot() else {
            continue;
        };
        let commands = reposition_commands(&own, waypoints, timing.waypoint_arrival);
        if !commands.is_empty() {
            debug!(?commands, "repositioning");
            actuator.send_all(&commands)?;
        }
    }
}

/// Start the reposition loop on its own named thread.
pub fn spawn_reposition<A>(
    ctx: Arc<TacticalContext>,
    actuator: A,
    waypoints: Vec<Position>,
    timing: LoopTiming,
) -> io::Result<JoinHandle<Result<(), ActuatorError>>>
where
    A: Actuator + Send + 'static,
{
    std::thread::Builder::new()
        .name("tankstrike-reposition".into())
        .spawn(move || {
            let result = run_reposition(&ctx, &actuator, &waypoints, &timing);
            ctx.request_shutdown();
            result
        })
}
