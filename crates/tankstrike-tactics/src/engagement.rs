//! Engagement controller — the phase machine that turns sweeps into orders.
//!
//! Context in, decision out: the controller never touches the socket or the
//! shared context. The engagement loop feeds it scan outcomes and hit/kill
//! notifications and forwards the returned commands to the actuator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use tankstrike_core::commands::Command;
use tankstrike_core::constants::*;
use tankstrike_core::enums::{EngagementPhase, ObjectCategory, ScanExit, ScanMode};
use tankstrike_core::state::{EngagementState, ObservedObject, OwnState};
use tankstrike_core::types::{angle_diff, ObjectId};

use crate::intercept::{self, InterceptParams, InterceptSolution};
use crate::scan::{ScanOutcome, ScanParams, ScanPlan};
use crate::selector::select_target;
use crate::tracker::TargetTracker;

/// Engagement tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementParams {
    pub intercept: InterceptParams,
    pub scan: ScanParams,
    pub fire_tolerance_deg: f64,
    pub chase_fraction: f64,
    pub chase_standoff: f64,
    pub min_move_distance: f64,
    pub target_lost_sweeps: u32,
    pub low_own_health: i32,
    pub health_pickup_range: f64,
    pub evade_turn: (f64, f64),
    pub evade_distance: (f64, f64),
    pub full_scan_every: u64,
}

impl Default for EngagementParams {
    fn default() -> Self {
        Self {
            intercept: InterceptParams::default(),
            scan: ScanParams::default(),
            fire_tolerance_deg: FIRE_TOLERANCE_DEG,
            chase_fraction: CHASE_FRACTION,
            chase_standoff: CHASE_STANDOFF,
            min_move_distance: MIN_MOVE_DISTANCE,
            target_lost_sweeps: TARGET_LOST_SWEEPS,
            low_own_health: LOW_OWN_HEALTH,
            health_pickup_range: HEALTH_PICKUP_RANGE,
            evade_turn: (EVADE_TURN_MIN, EVADE_TURN_MAX),
            evade_distance: (EVADE_DISTANCE_MIN, EVADE_DISTANCE_MAX),
            full_scan_every: FULL_SCAN_EVERY,
        }
    }
}

/// Output of one controller step.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub phase: EngagementPhase,
    pub phase_changed: bool,
    /// Commands to send, in order.
    pub commands: Vec<Command>,
    /// Lead solution used this step, if a target was engaged.
    pub solution: Option<InterceptSolution>,
}

impl Decision {
    pub fn fired(&self) -> bool {
        self.commands.contains(&Command::Fire)
    }
}

/// Phase machine for one tank.
pub struct EngagementController {
    params: EngagementParams,
    phase: EngagementPhase,
    target: Option<ObjectId>,
    /// Heading from us to where the target was last seen.
    target_heading: Option<f64>,
    missed_sweeps: u32,
    scan_cycle: u64,
    scan_mode: ScanMode,
    emergency: bool,
    last_damage_at: Option<f64>,
    rng: ChaCha8Rng,
}

impl EngagementController {
    pub fn new(params: EngagementParams, seed: u64) -> Self {
        Self {
            params,
            phase: EngagementPhase::Idle,
            target: None,
            target_heading: None,
            missed_sweeps: 0,
            scan_cycle: 0,
            scan_mode: ScanMode::Full,
            emergency: false,
            last_damage_at: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> EngagementPhase {
        self.phase
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    /// Whether the last sweep ended on an emergency.
    pub fn is_emergency(&self) -> bool {
        self.emergency
    }

    pub fn params(&self) -> &EngagementParams {
        &self.params
    }

    /// Status snapshot for publishing to the shared context.
    pub fn state(&self) -> EngagementState {
        EngagementState {
            phase: self.phase,
            target: self.target,
            scan_mode: self.scan_mode,
            emergency: self.emergency,
            last_damage_at: self.last_damage_at,
        }
    }

    /// Leave Idle once own state is known. Returns true on transition.
    pub fn activate(&mut self) -> bool {
        if self.phase == EngagementPhase::Idle {
            self.transition(EngagementPhase::Scanning);
            true
        } else {
            false
        }
    }

    /// Scan plan for the current phase, or `None` when the phase does not
    /// scan (Idle, Evading).
    pub fn next_scan(&mut self, own: &OwnState) -> Option<ScanPlan> {
        let scan = &self.params.scan;
        let plan = match self.phase {
            EngagementPhase::Idle | EngagementPhase::Evading => return None,
            EngagementPhase::Scanning => {
                let cycle = self.scan_cycle;
                self.scan_cycle += 1;
                if cycle % self.params.full_scan_every.max(1) == 0 {
                    ScanPlan::full(own.turret_heading, scan)
                } else {
                    ScanPlan::fast(own.turret_heading, scan)
                }
            }
            EngagementPhase::Tracking | EngagementPhase::Chasing => {
                let heading = self.target_heading.unwrap_or(own.turret_heading);
                ScanPlan::directed(heading, self.target, scan)
            }
            EngagementPhase::SeekingHealth => ScanPlan::full(own.turret_heading, scan),
        };
        self.scan_mode = plan.mode();
        Some(plan)
    }

    /// Digest one sweep and decide what to do.
    pub fn on_sweep(
        &mut self,
        own: &OwnState,
        outcome: &ScanOutcome,
        tracker: &TargetTracker,
        now: f64,
    ) -> Decision {
        let before = self.phase;
        self.emergency = false;

        if matches!(before, EngagementPhase::Idle | EngagementPhase::Evading) {
            return self.decision(before, Vec::new(), None);
        }

        if let ScanExit::Emergency(id) = outcome.exit {
            if let Some(object) = outcome.sweep.get(id) {
                info!(id, "emergency engagement");
                self.emergency = true;
                self.target = Some(id);
                self.missed_sweeps = 0;
                self.transition(EngagementPhase::Tracking);
                let (commands, solution) = self.engage(own, object, tracker, now);
                return self.decision(before, commands, Some(solution));
            }
        }

        if outcome.exit == ScanExit::Cancelled {
            return self.decision(before, Vec::new(), None);
        }

        if self.phase == EngagementPhase::SeekingHealth {
            let commands = self.seek_health(own, outcome);
            return self.decision(before, commands, None);
        }

        if self.phase.is_engaging() && own.health < self.params.low_own_health {
            if let Some(pickup) = self.pickup_in_range(own, outcome) {
                info!(pickup = pickup.id, health = own.health, "low health, seeking pickup");
                let commands = self.drive_to(own, pickup);
                self.target = None;
                self.target_heading = None;
                self.transition(EngagementPhase::SeekingHealth);
                return self.decision(before, commands, None);
            }
        }

        let Some(object) = self.reselect(own, outcome) else {
            return self.decision(before, Vec::new(), None);
        };
        let (commands, solution) = self.engage(own, &object, tracker, now);
        self.decision(before, commands, Some(solution))
    }

    /// React to incoming fire: turn away by a random offset and drive off.
    pub fn on_hit(&mut self, own: &OwnState, now: f64) -> Decision {
        let before = self.phase;
        self.last_damage_at = Some(now);
        self.emergency = false;
        self.target = None;
        self.target_heading = None;
        self.missed_sweeps = 0;

        let (turn_min, turn_max) = self.params.evade_turn;
        let (dist_min, dist_max) = self.params.evade_distance;
        let turn = self.rng.gen_range(turn_min..=turn_max);
        let distance = self.rng.gen_range(dist_min..=dist_max);
        debug!(turn, distance, "evading");

        self.transition(EngagementPhase::Evading);
        let commands = vec![
            Command::turn_to(own.heading + turn),
            Command::move_forward(distance),
        ];
        self.decision(before, commands, None)
    }

    /// Evasion pause is over.
    pub fn resume(&mut self) {
        if self.phase == EngagementPhase::Evading {
            self.transition(EngagementPhase::Scanning);
        }
    }

    /// One of our shots destroyed a tank; assume it was the target.
    pub fn on_kill(&mut self) {
        if let Some(id) = self.target.take() {
            info!(id, "target destroyed");
        }
        self.target_heading = None;
        self.missed_sweeps = 0;
        if self.phase.is_engaging() {
            self.transition(EngagementPhase::Scanning);
        }
    }

    /// Our tank is gone; wait for the next self-observation.
    pub fn on_destroyed(&mut self) {
        self.target = None;
        self.target_heading = None;
        self.missed_sweeps = 0;
        self.scan_cycle = 0;
        self.emergency = false;
        self.transition(EngagementPhase::Idle);
    }

    fn transition(&mut self, to: EngagementPhase) {
        if self.phase != to {
            info!(from = ?self.phase, to = ?to, target = ?self.target, "phase transition");
            self.phase = to;
        }
    }

    fn decision(
        &self,
        before: EngagementPhase,
        commands: Vec<Command>,
        solution: Option<InterceptSolution>,
    ) -> Decision {
        Decision {
            phase: self.phase,
            phase_changed: self.phase != before,
            commands,
            solution,
        }
    }

    /// Keep, replace or drop the target based on this sweep. Returns the
    /// object to engage, if any.
    fn reselect(&mut self, own: &OwnState, outcome: &ScanOutcome) -> Option<ObservedObject> {
        let sweep = &outcome.sweep;

        if let Some(current) = self.target {
            match sweep.get(current) {
                Some(seen) if seen.health.is_some_and(|h| h <= 0) => {
                    info!(id = current, "target observed dead");
                    self.drop_target();
                }
                Some(seen) => {
                    self.missed_sweeps = 0;
                    self.transition(EngagementPhase::Chasing);
                    return Some(seen.clone());
                }
                None => {
                    self.missed_sweeps += 1;
                    debug!(id = current, missed = self.missed_sweeps, "target not in sweep");
                    let others = sweep
                        .tanks()
                        .any(|o| o.health.is_some_and(|h| h > 0));
                    if others {
                        self.drop_target();
                    } else {
                        if self.missed_sweeps >= self.params.target_lost_sweeps {
                            info!(id = current, "target lost");
                            self.drop_target();
                        }
                        return None;
                    }
                }
            }
        }

        let selection = select_target(sweep.tanks(), &own.position, None)?;
        info!(
            id = selection.id,
            health = selection.health,
            distance = selection.distance,
            "target selected"
        );
        self.target = Some(selection.id);
        self.missed_sweeps = 0;
        self.transition(EngagementPhase::Tracking);
        sweep.get(selection.id).cloned()
    }

    fn drop_target(&mut self) {
        self.target = None;
        self.target_heading = None;
        self.missed_sweeps = 0;
        self.transition(EngagementPhase::Scanning);
    }

    /// Lead, aim, close in, and fire if the turret is already on target.
    fn engage(
        &mut self,
        own: &OwnState,
        target: &ObservedObject,
        tracker: &TargetTracker,
        now: f64,
    ) -> (Vec<Command>, InterceptSolution) {
        let velocity = tracker
            .velocity_estimate_at(target.id, now)
            .unwrap_or_default();
        let solution = intercept::solve(&own.position, &target.position, &velocity, &self.params.intercept);
        self.target_heading = Some(own.position.heading_to(&target.position));

        let mut commands = Vec::with_capacity(4);
        let error = angle_diff(own.turret_heading, solution.heading).abs();
        if error <= self.params.fire_tolerance_deg && own.has_ammo() {
            commands.push(Command::Fire);
        }
        commands.push(Command::turn_turret_to(solution.heading));
        commands.push(Command::turn_to(solution.heading));

        let distance = own.position.range_to(&target.position);
        let advance = (distance - self.params.chase_standoff).max(0.0) * self.params.chase_fraction;
        if advance >= self.params.min_move_distance {
            commands.push(Command::move_forward(advance));
        }

        debug!(
            id = target.id,
            aim_heading = solution.heading,
            turret_error = error,
            outcome = ?solution.outcome,
            iterations = solution.iterations,
            "engaging"
        );
        (commands, solution)
    }

    fn pickup_in_range<'a>(&self, own: &OwnState, outcome: &'a ScanOutcome) -> Option<&'a ObservedObject> {
        outcome
            .sweep
            .nearest(ObjectCategory::HealthPickup, &own.position)
            .filter(|p| own.position.range_to(&p.position) <= self.params.health_pickup_range)
    }

    fn seek_health(&mut self, own: &OwnState, outcome: &ScanOutcome) -> Vec<Command> {
        if own.health >= self.params.low_own_health {
            info!(health = own.health, "health restored");
            self.transition(EngagementPhase::Scanning);
            return Vec::new();
        }
        match self.pickup_in_range(own, outcome) {
            Some(pickup) => self.drive_to(own, pickup),
            None => {
                info!("no health pickup in range");
                self.transition(EngagementPhase::Scanning);
                Vec::new()
            }
        }
    }

    fn drive_to(&self, own: &OwnState, pickup: &ObservedObject) -> Vec<Command> {
        vec![
            Command::turn_to(own.position.heading_to(&pickup.position)),
            Command::move_forward(own.position.range_to(&pickup.position)),
        ]
    }

    #[cfg(test)]
    pub(crate) fn set_phase(&mut self, phase: EngagementPhase) {
        self.phase = phase;
    }
}
