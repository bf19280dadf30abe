//! Engagement loop thread — scan, decide, act, repeat.
//!
//! Owns the engagement controller. Each cycle: react to a pending hit, fold
//! in kills, evict stale tracks, run the scan the phase asks for, hand the
//! sweep to the controller and forward its commands. The wait between
//! cycles is skipped after an emergency and cut short by incoming fire.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info};

use tankstrike_core::constants::TRACK_EVICT_SECS;
use tankstrike_core::enums::EngagementPhase;
use tankstrike_core::error::ActuatorError;
use tankstrike_tactics::actuator::Actuator;
use tankstrike_tactics::context::Wake;
use tankstrike_tactics::scan::{self, ContextSweep};
use tankstrike_tactics::{EngagementController, TacticalContext};

use crate::config::LoopTiming;

/// Run until shutdown. Fails only when the command channel is gone.
pub fn run_engagement<A: Actuator + ?Sized>(
    ctx: &TacticalContext,
    actuator: &A,
    mut controller: EngagementController,
    timing: &LoopTiming,
) -> Result<(), ActuatorError> {
    loop {
        if ctx.is_shutdown() {
            return Ok(());
        }

        let Some(own) = ctx.own_snapshot() else {
            if controller.phase() != EngagementPhase::Idle {
                controller.on_destroyed();
                ctx.publish_engagement(controller.state());
            }
            ctx.wait_for_own(timing.own_wait);
            continue;
        };

        if controller.activate() {
            info!(id = own.id, "own tank online");
            ctx.publish_engagement(controller.state());
        }

        if ctx.take_hit() {
            let decision = controller.on_hit(&own, ctx.now());
            actuator.send_all(&decision.commands)?;
            ctx.publish_engagement(controller.state());
            if ctx.pause(timing.evade_pause) == Wake::Shutdown {
                return Ok(());
            }
            controller.resume();
            ctx.publish_engagement(controller.state());
            continue;
        }

        if ctx.take_kill() {
            controller.on_kill();
        }

        let now = ctx.now();
        let evicted = ctx.tracker().evict_stale(now);
        let pruned = ctx.world().prune_objects(now - TRACK_EVICT_SECS);
        if !evicted.is_empty() || pruned > 0 {
            debug!(?evicted, pruned, "forgot stale objects");
        }

        let Some(plan) = controller.next_scan(&own) else {
            ctx.pause_unless_hit(timing.cycle);
            continue;
        };
        ctx.publish_engagement(controller.state());

        let mut source = ContextSweep::new(ctx);
        let outcome = scan::run(plan, &own, &mut source, actuator)?;

        // The turret moved during the sweep; decide on fresh state.
        let own = ctx.own_snapshot().unwrap_or(own);
        let decision = {
            let tracker = ctx.tracker();
            controller.on_sweep(&own, &outcome, &tracker, ctx.now())
        };
        actuator.send_all(&decision.commands)?;
        ctx.publish_engagement(controller.state());

        if !controller.is_emergency() && ctx.pause_unless_hit(timing.cycle) == Wake::Shutdown {
            return Ok(());
        }
    }
}

/// Start the engagement loop on its own named thread.
pub fn spawn_engagement<A>(
    ctx: Arc<TacticalContext>,
    actuator: A,
    controller: EngagementController,
    timing: LoopTiming,
) -> io::Result<JoinHandle<Result<(), ActuatorError>>>
where
    A: Actuator + Send + 'static,
{
    std::thread::Builder::new()
        .name("tankstrike-engagement".into())
        .spawn(move || {
            let result = run_engagement(&ctx, &actuator, controller, &timing);
            ctx.request_shutdown();
            result
        })
}
