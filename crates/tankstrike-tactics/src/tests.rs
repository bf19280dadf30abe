//! Tests for scanning, engagement decisions and the pieces working together.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use serde_json::json;

use tankstrike_core::commands::Command;
use tankstrike_core::enums::*;
use tankstrike_core::error::ActuatorError;
use tankstrike_core::messages::{MessageType, ServerMessage};
use tankstrike_core::state::{ObservedObject, OwnState};
use tankstrike_core::types::{ObjectId, Position};

use crate::actuator::Actuator;
use crate::context::TacticalContext;
use crate::engagement::{EngagementController, EngagementParams};
use crate::ingest::FeedIngestor;
use crate::scan::{self, ContextSweep, ScanOutcome, ScanParams, ScanPlan, Sweep, SweepPoll, SweepSource};
use crate::tracker::TargetTracker;

// ---- Helpers ----

#[derive(Default)]
struct RecordingActuator {
    sent: RefCell<Vec<Command>>,
}

impl RecordingActuator {
    fn turret_turns(&self) -> Vec<f64> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Command::TurnTurretToHeading { amount } => Some(*amount),
                _ => None,
            })
            .collect()
    }
}

impl Actuator for RecordingActuator {
    fn send(&self, command: Command) -> Result<(), ActuatorError> {
        self.sent.borrow_mut().push(command);
        Ok(())
    }
}

struct ClosedActuator;

impl Actuator for ClosedActuator {
    fn send(&self, _command: Command) -> Result<(), ActuatorError> {
        Err(ActuatorError::Disconnected)
    }
}

/// Replays one canned window per poll, then reports nothing.
#[derive(Default)]
struct ScriptedSource {
    windows: VecDeque<SweepPoll>,
    polls: usize,
}

impl ScriptedSource {
    fn new(windows: Vec<SweepPoll>) -> Self {
        Self {
            windows: windows.into(),
            polls: 0,
        }
    }
}

impl SweepSource for ScriptedSource {
    fn poll(&mut self, _wait: Duration) -> SweepPoll {
        self.polls += 1;
        self.windows
            .pop_front()
            .unwrap_or(SweepPoll::Observed(Vec::new()))
    }
}

fn own_at(turret_heading: f64) -> OwnState {
    OwnState {
        id: 1,
        position: Position::new(0.0, 0.0),
        heading: 0.0,
        turret_heading,
        health: 5,
        ammo: Some(5),
    }
}

fn tank(id: ObjectId, x: f64, y: f64, health: i32) -> ObservedObject {
    ObservedObject {
        id,
        category: ObjectCategory::Tank,
        position: Position::new(x, y),
        name: None,
        health: Some(health),
        seen_at: 0.0,
    }
}

fn pickup(id: ObjectId, x: f64, y: f64) -> ObservedObject {
    ObservedObject {
        id,
        category: ObjectCategory::HealthPickup,
        position: Position::new(x, y),
        name: None,
        health: None,
        seen_at: 0.0,
    }
}

fn outcome(exit: ScanExit, objects: Vec<ObservedObject>) -> ScanOutcome {
    let mut sweep = Sweep::default();
    for o in objects {
        sweep.insert(o);
    }
    ScanOutcome {
        mode: ScanMode::Full,
        exit,
        sweep,
        turns: 0,
    }
}

fn scanning_controller() -> EngagementController {
    let mut ctl = EngagementController::new(EngagementParams::default(), 9);
    ctl.activate();
    ctl
}

// ---- Scan runner ----

#[test]
fn test_full_scan_issues_eighteen_turns() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::default();

    let result = scan::run(ScanPlan::full(0.0, &ScanParams::default()), &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Exhausted);
    assert_eq!(result.turns, 18);
    assert_eq!(source.polls, 18);
    let turns = actuator.turret_turns();
    assert_eq!(turns.len(), 18);
    assert!(turns.iter().all(|h| (0.0..360.0).contains(h)));
}

#[test]
fn test_full_scan_collects_without_early_exit() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::new(vec![SweepPoll::Observed(vec![tank(5, 20.0, 0.0, 1)])]);

    let result = scan::run(ScanPlan::full(0.0, &ScanParams::default()), &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Exhausted);
    assert!(result.sweep.contains(5));
}

#[test]
fn test_emergency_cuts_any_scan_short() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::new(vec![
        SweepPoll::Observed(vec![tank(5, 40.0, 0.0, 3)]),
        SweepPoll::Observed(vec![]),
        SweepPoll::Observed(vec![tank(6, 0.0, 12.0, 3)]),
    ]);

    let result = scan::run(ScanPlan::full(0.0, &ScanParams::default()), &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Emergency(6));
    assert_eq!(result.turns, 3);
    assert_eq!(result.sweep.len(), 2);
}

#[test]
fn test_emergency_distance_is_inclusive() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::new(vec![SweepPoll::Observed(vec![tank(9, 15.0, 0.0, 3)])]);

    let result = scan::run(ScanPlan::full(0.0, &ScanParams::default()), &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Emergency(9));
    assert_eq!(result.turns, 1);
}

#[test]
fn test_own_tank_never_triggers_emergency() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::new(vec![SweepPoll::Observed(vec![tank(1, 0.0, 0.0, 5)])]);

    let result = scan::run(ScanPlan::fast(0.0, &ScanParams::default()), &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Exhausted);
    assert!(result.sweep.is_empty());
}

#[test]
fn test_fast_scan_stops_on_weak_tank_in_range() {
    let own = own_at(90.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::new(vec![
        // Healthy tank in range, weak tank out of range: keep going
        SweepPoll::Observed(vec![tank(5, 20.0, 0.0, 3), tank(6, 50.0, 0.0, 1)]),
        SweepPoll::Observed(vec![tank(7, 0.0, 25.0, 2)]),
    ]);

    let result = scan::run(ScanPlan::fast(90.0, &ScanParams::default()), &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Found(7));
    assert_eq!(actuator.turret_turns(), vec![105.0, 75.0]);
}

#[test]
fn test_directed_scan_waits_for_its_target() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::new(vec![
        SweepPoll::Observed(vec![tank(5, 20.0, 0.0, 1)]),
        SweepPoll::Observed(vec![]),
        SweepPoll::Observed(vec![]),
        SweepPoll::Observed(vec![]),
        SweepPoll::Observed(vec![tank(9, -20.0, 0.0, 4)]),
    ]);

    let plan = ScanPlan::directed(0.0, Some(9), &ScanParams::default());
    let result = scan::run(plan, &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Found(9));
    // Four holds, then the first widening step
    assert_eq!(actuator.turret_turns(), vec![0.0, 0.0, 0.0, 0.0, 45.0]);
}

#[test]
fn test_directed_scan_falls_back_to_wide_sweep() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::default();

    let plan = ScanPlan::directed(10.0, Some(9), &ScanParams::default());
    let result = scan::run(plan, &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Exhausted);
    let turns = actuator.turret_turns();
    assert_eq!(turns.len(), 11);
    assert!(turns.iter().all(|h| (0.0..360.0).contains(h)));
    assert_eq!(turns[10], 190.0);
}

#[test]
fn test_directed_scan_without_target_takes_any_tank() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::new(vec![SweepPoll::Observed(vec![tank(3, 25.0, 0.0, 5)])]);

    let plan = ScanPlan::directed(0.0, None, &ScanParams::default());
    let result = scan::run(plan, &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Found(3));
}

#[test]
fn test_cancelled_scan() {
    let own = own_at(0.0);
    let actuator = RecordingActuator::default();
    let mut source = ScriptedSource::new(vec![SweepPoll::Cancelled]);

    let result = scan::run(ScanPlan::full(0.0, &ScanParams::default()), &own, &mut source, &actuator).unwrap();

    assert_eq!(result.exit, ScanExit::Cancelled);
    assert_eq!(result.turns, 1);
}

#[test]
fn test_scan_fails_when_actuator_is_gone() {
    let own = own_at(0.0);
    let mut source = ScriptedSource::default();
    let result = scan::run(ScanPlan::fast(0.0, &ScanParams::default()), &own, &mut source, &ClosedActuator);
    assert_eq!(result.unwrap_err(), ActuatorError::Disconnected);
    assert_eq!(source.polls, 0);
}

#[test]
fn test_context_sweep_sees_new_observations() {
    let ctx = TacticalContext::new();
    let mut ingestor = FeedIngestor::with_own_id(1);
    let old = ServerMessage::new(
        MessageType::ObjectUpdate,
        Some(json!({"Id": 4, "Type": "Tank", "X": 50.0, "Y": 0.0, "Health": 3})),
    );
    ingestor.ingest(&ctx, &old, ctx.now()).unwrap();

    let mut source = ContextSweep::new(&ctx);
    let fresh = ServerMessage::new(
        MessageType::ObjectUpdate,
        Some(json!({"Id": 5, "Type": "Tank", "X": 20.0, "Y": 0.0, "Health": 2})),
    );
    ingestor.ingest(&ctx, &fresh, ctx.now()).unwrap();

    let SweepPoll::Observed(objects) = source.poll(Duration::from_millis(5)) else {
        panic!("sweep should not be cancelled");
    };
    let ids: Vec<ObjectId> = objects.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![5]);

    // Reported again mid-sweep: now it counts
    ingestor.ingest(&ctx, &old, ctx.now()).unwrap();
    let SweepPoll::Observed(objects) = source.poll(Duration::from_millis(5)) else {
        panic!("sweep should not be cancelled");
    };
    let ids: Vec<ObjectId> = objects.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![4]);

    ctx.raise_hit();
    assert_eq!(source.poll(Duration::from_secs(5)), SweepPoll::Cancelled);
    assert!(ctx.hit_pending());
}

// ---- Engagement ----

#[test]
fn test_end_to_end_lead_and_fire_gate() {
    let mut tracker = TargetTracker::new();
    tracker.record(2, Position::new(10.0, -1.0), Some(3), 0.0);
    tracker.record(2, Position::new(10.0, 0.0), Some(3), 0.2);
    let seen = outcome(ScanExit::Exhausted, vec![tank(2, 10.0, 0.0, 3)]);

    let mut ctl = scanning_controller();
    let first = ctl.on_sweep(&own_at(0.0), &seen, &tracker, 0.2);

    assert_eq!(first.phase, EngagementPhase::Tracking);
    assert!(first.phase_changed);
    let solution = first.solution.unwrap();
    assert!(solution.aim.y > 0.0);
    assert!(solution.heading > 10.0 && solution.heading < 12.0);
    assert!(!first.fired());
    assert_eq!(first.commands[0], Command::turn_turret_to(solution.heading));
    assert_eq!(first.commands[1], Command::turn_to(solution.heading));
    assert_eq!(first.commands[2], Command::move_forward(0.6));

    // Turret now within the tolerance: fire first
    let second = ctl.on_sweep(&own_at(5.0), &seen, &tracker, 0.2);
    assert_eq!(second.phase, EngagementPhase::Chasing);
    assert_eq!(second.commands[0], Command::Fire);
}

#[test]
fn test_no_fire_without_ammo() {
    let tracker = TargetTracker::new();
    let seen = outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 3)]);
    let mut own = own_at(0.0);
    own.ammo = Some(0);

    let mut ctl = scanning_controller();
    let decision = ctl.on_sweep(&own, &seen, &tracker, 0.0);
    assert_eq!(decision.phase, EngagementPhase::Tracking);
    assert!(!decision.fired());
}

#[test]
fn test_stale_track_aims_at_last_position() {
    let mut tracker = TargetTracker::new();
    tracker.record(2, Position::new(10.0, -1.0), Some(3), 0.0);
    tracker.record(2, Position::new(10.0, 0.0), Some(3), 0.2);
    let seen = outcome(ScanExit::Exhausted, vec![tank(2, 10.0, 0.0, 3)]);

    let mut ctl = scanning_controller();
    let decision = ctl.on_sweep(&own_at(0.0), &seen, &tracker, 5.0);
    let solution = decision.solution.unwrap();
    assert_eq!(solution.aim, Position::new(10.0, 0.0));
    assert!(decision.fired());
}

#[test]
fn test_selection_prefers_weak_then_near() {
    let tracker = TargetTracker::new();
    let mut ctl = scanning_controller();
    let seen = outcome(
        ScanExit::Exhausted,
        vec![tank(2, 10.0, 0.0, 4), tank(3, 0.0, 40.0, 2)],
    );
    ctl.on_sweep(&own_at(0.0), &seen, &tracker, 0.0);
    assert_eq!(ctl.target(), Some(3));

    let mut ctl = scanning_controller();
    let seen = outcome(
        ScanExit::Exhausted,
        vec![tank(2, 25.0, 0.0, 3), tank(3, 10.0, 0.0, 3)],
    );
    ctl.on_sweep(&own_at(0.0), &seen, &tracker, 0.0);
    assert_eq!(ctl.target(), Some(3));
}

#[test]
fn test_target_lost_after_three_empty_sweeps() {
    let tracker = TargetTracker::new();
    let own = own_at(0.0);
    let mut ctl = scanning_controller();
    ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 3)]), &tracker, 0.0);
    assert_eq!(ctl.phase(), EngagementPhase::Tracking);

    let empty = outcome(ScanExit::Exhausted, vec![]);
    for _ in 0..2 {
        let d = ctl.on_sweep(&own, &empty, &tracker, 1.0);
        assert_eq!(d.phase, EngagementPhase::Tracking);
        assert!(d.commands.is_empty());
        assert_eq!(ctl.target(), Some(2));
    }
    let d = ctl.on_sweep(&own, &empty, &tracker, 1.0);
    assert_eq!(d.phase, EngagementPhase::Scanning);
    assert_eq!(ctl.target(), None);
}

#[test]
fn test_missing_target_with_others_reselects_immediately() {
    let tracker = TargetTracker::new();
    let own = own_at(0.0);
    let mut ctl = scanning_controller();
    ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 3)]), &tracker, 0.0);
    ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 3)]), &tracker, 0.1);
    assert_eq!(ctl.phase(), EngagementPhase::Chasing);

    let d = ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(3, 25.0, 0.0, 5)]), &tracker, 0.2);
    assert_eq!(ctl.target(), Some(3));
    assert_eq!(d.phase, EngagementPhase::Tracking);
    assert!(d.solution.is_some());
}

#[test]
fn test_dead_target_and_kill_end_the_chase() {
    let tracker = TargetTracker::new();
    let own = own_at(0.0);

    let mut ctl = scanning_controller();
    ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 1)]), &tracker, 0.0);
    let d = ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 0)]), &tracker, 0.1);
    assert_eq!(d.phase, EngagementPhase::Scanning);
    assert_eq!(ctl.target(), None);

    let mut ctl = scanning_controller();
    ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 1)]), &tracker, 0.0);
    ctl.on_kill();
    assert_eq!(ctl.phase(), EngagementPhase::Scanning);
    assert_eq!(ctl.target(), None);
}

#[test]
fn test_emergency_forces_tracking() {
    let tracker = TargetTracker::new();
    let own = own_at(0.0);
    for phase in [
        EngagementPhase::Scanning,
        EngagementPhase::Chasing,
        EngagementPhase::SeekingHealth,
    ] {
        let mut ctl = scanning_controller();
        ctl.set_phase(phase);
        let seen = outcome(ScanExit::Emergency(8), vec![tank(8, 5.0, 5.0, 5)]);
        let d = ctl.on_sweep(&own, &seen, &tracker, 0.0);
        assert_eq!(d.phase, EngagementPhase::Tracking);
        assert_eq!(ctl.target(), Some(8));
        assert!(ctl.is_emergency());
        assert!(ctl.state().emergency);
    }
}

#[test]
fn test_hit_evades_from_every_phase() {
    let own = own_at(0.0);
    for phase in [
        EngagementPhase::Idle,
        EngagementPhase::Scanning,
        EngagementPhase::Tracking,
        EngagementPhase::Chasing,
        EngagementPhase::Evading,
        EngagementPhase::SeekingHealth,
    ] {
        let mut ctl = scanning_controller();
        ctl.set_phase(phase);
        let d = ctl.on_hit(&own, 3.0);
        assert_eq!(d.phase, EngagementPhase::Evading);
        assert_eq!(d.commands.len(), 2);
        assert!(ctl.next_scan(&own).is_none());

        ctl.resume();
        assert_eq!(ctl.phase(), EngagementPhase::Scanning);
    }
}

#[test]
fn test_low_health_seeks_pickup_then_returns() {
    let tracker = TargetTracker::new();
    let mut own = own_at(0.0);
    let mut ctl = scanning_controller();
    ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 3)]), &tracker, 0.0);

    own.health = 2;
    let seen = outcome(
        ScanExit::Exhausted,
        vec![tank(2, 20.0, 0.0, 3), pickup(30, 0.0, 30.0)],
    );
    let d = ctl.on_sweep(&own, &seen, &tracker, 0.5);
    assert_eq!(d.phase, EngagementPhase::SeekingHealth);
    assert_eq!(d.commands, vec![Command::turn_to(90.0), Command::move_forward(30.0)]);
    assert_eq!(ctl.next_scan(&own).map(|p| p.mode()), Some(ScanMode::Full));

    own.health = 5;
    let d = ctl.on_sweep(&own, &seen, &tracker, 1.0);
    assert_eq!(d.phase, EngagementPhase::Scanning);
}

#[test]
fn test_far_pickup_does_not_interrupt_chase() {
    let tracker = TargetTracker::new();
    let mut own = own_at(0.0);
    own.health = 1;
    let mut ctl = scanning_controller();
    ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 3)]), &tracker, 0.0);

    let seen = outcome(
        ScanExit::Exhausted,
        vec![tank(2, 20.0, 0.0, 3), pickup(30, 0.0, 90.0)],
    );
    let d = ctl.on_sweep(&own, &seen, &tracker, 0.5);
    assert_eq!(d.phase, EngagementPhase::Chasing);
}

#[test]
fn test_directed_scan_follows_target_heading() {
    let tracker = TargetTracker::new();
    let own = own_at(0.0);
    let mut ctl = scanning_controller();
    ctl.on_sweep(&own, &outcome(ScanExit::Exhausted, vec![tank(2, 0.0, 20.0, 3)]), &tracker, 0.0);

    let plan = ctl.next_scan(&own).unwrap();
    assert_eq!(plan.mode(), ScanMode::Directed);
    assert_eq!(plan.target(), Some(2));
    assert_eq!(plan.headings()[0], 90.0);
    assert_eq!(ctl.state().scan_mode, ScanMode::Directed);
}

#[test]
fn test_sweeps_ignored_while_idle_or_evading() {
    let tracker = TargetTracker::new();
    let own = own_at(0.0);
    let seen = outcome(ScanExit::Exhausted, vec![tank(2, 20.0, 0.0, 3)]);

    let mut ctl = EngagementController::new(EngagementParams::default(), 0);
    let d = ctl.on_sweep(&own, &seen, &tracker, 0.0);
    assert_eq!(d.phase, EngagementPhase::Idle);
    assert!(d.commands.is_empty());

    ctl.activate();
    ctl.on_hit(&own, 0.0);
    let d = ctl.on_sweep(&own, &seen, &tracker, 0.0);
    assert_eq!(d.phase, EngagementPhase::Evading);
    assert!(!d.phase_changed);
}
