//! Turret scan patterns and the sweep runner.
//!
//! A [`ScanPlan`] is a finite sequence of turret headings with a wait after
//! each. [`run`] walks a plan, turning the turret and polling a
//! [`SweepSource`] for whatever the server reported during the wait, and
//! stops early on an emergency or when the plan's exit predicate matches.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use tankstrike_core::constants::*;
use tankstrike_core::enums::{ObjectCategory, ScanExit, ScanMode};
use tankstrike_core::error::ActuatorError;
use tankstrike_core::state::{ObservedObject, OwnState};
use tankstrike_core::types::{normalize_heading, ObjectId, Position};

use crate::actuator::Actuator;
use crate::context::{TacticalContext, Wake};

/// Scan geometry, timing and exit thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanParams {
    pub full_increment: f64,
    pub full_steps: usize,
    pub full_step: Duration,
    pub fast_increment: f64,
    pub fast_steps: usize,
    pub fast_step: Duration,
    pub directed_hold_steps: usize,
    pub directed_wide_increment: f64,
    pub directed_wide_steps: usize,
    pub directed_step: Duration,
    pub emergency_distance: f64,
    pub engagement_distance: f64,
    pub low_health_target: i32,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            full_increment: FULL_SCAN_INCREMENT,
            full_steps: FULL_SCAN_STEPS,
            full_step: Duration::from_millis(FULL_SCAN_STEP_MS),
            fast_increment: FAST_SCAN_INCREMENT,
            fast_steps: FAST_SCAN_STEPS,
            fast_step: Duration::from_millis(FAST_SCAN_STEP_MS),
            directed_hold_steps: DIRECTED_HOLD_STEPS,
            directed_wide_increment: DIRECTED_WIDE_INCREMENT,
            directed_wide_steps: DIRECTED_WIDE_STEPS,
            directed_step: Duration::from_millis(DIRECTED_SCAN_STEP_MS),
            emergency_distance: EMERGENCY_DISTANCE,
            engagement_distance: ENGAGEMENT_DISTANCE,
            low_health_target: LOW_HEALTH_TARGET,
        }
    }
}

/// One turret command plus the observation window after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanStep {
    /// Absolute turret heading (degrees, normalized).
    pub heading: f64,
    pub wait: Duration,
}

/// A finite sequence of scan steps.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    mode: ScanMode,
    target: Option<ObjectId>,
    exits: ExitThresholds,
    steps: Vec<ScanStep>,
    cursor: usize,
}

#[derive(Debug, Clone, Copy)]
struct ExitThresholds {
    emergency_distance: f64,
    engagement_distance: f64,
    low_health_target: i32,
}

impl ExitThresholds {
    fn from_params(params: &ScanParams) -> Self {
        Self {
            emergency_distance: params.emergency_distance,
            engagement_distance: params.engagement_distance,
            low_health_target: params.low_health_target,
        }
    }
}

/// `k`-th alternating offset: +inc, -inc, +2inc, -2inc, ...
fn oscillation(i: usize, increment: f64) -> f64 {
    let k = (i / 2 + 1) as f64;
    if i % 2 == 0 {
        k * increment
    } else {
        -k * increment
    }
}

impl ScanPlan {
    /// 360 degree sweep in fixed increments starting just past `origin`.
    pub fn full(origin: f64, params: &ScanParams) -> Self {
        let steps = (0..params.full_steps)
            .map(|i| ScanStep {
                heading: normalize_heading(origin + (i + 1) as f64 * params.full_increment),
                wait: params.full_step,
            })
            .collect();
        Self::with_steps(ScanMode::Full, None, params, steps)
    }

    /// Widening oscillation around `center`.
    pub fn fast(center: f64, params: &ScanParams) -> Self {
        let steps = (0..params.fast_steps)
            .map(|i| ScanStep {
                heading: normalize_heading(center + oscillation(i, params.fast_increment)),
                wait: params.fast_step,
            })
            .collect();
        Self::with_steps(ScanMode::Fast, None, params, steps)
    }

    /// Hold on `heading` for a few steps, then oscillate widely around it.
    /// `target` is the tank the scan is looking for; `None` accepts any tank.
    pub fn directed(heading: f64, target: Option<ObjectId>, params: &ScanParams) -> Self {
        let hold = (0..params.directed_hold_steps).map(|_| normalize_heading(heading));
        let wide = (0..params.directed_wide_steps)
            .map(|i| normalize_heading(heading + oscillation(i, params.directed_wide_increment)));
        let steps = hold
            .chain(wide)
            .map(|heading| ScanStep {
                heading,
                wait: params.directed_step,
            })
            .collect();
        Self::with_steps(ScanMode::Directed, target, params, steps)
    }

    fn with_steps(
        mode: ScanMode,
        target: Option<ObjectId>,
        params: &ScanParams,
        steps: Vec<ScanStep>,
    ) -> Self {
        Self {
            mode,
            target,
            exits: ExitThresholds::from_params(params),
            steps,
            cursor: 0,
        }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    /// Every heading of the plan, ignoring progress.
    pub fn headings(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.heading).collect()
    }

    /// Rewind to the first step.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Whether `object` ends this scan early (emergencies aside).
    fn qualifies(&self, object: &ObservedObject, own: &Position) -> bool {
        if !object.is_tank() {
            return false;
        }
        match self.mode {
            ScanMode::Full => false,
            ScanMode::Fast => {
                own.range_to(&object.position) <= self.exits.engagement_distance
                    && object
                        .health
                        .is_some_and(|h| h > 0 && h <= self.exits.low_health_target)
            }
            ScanMode::Directed => match self.target {
                Some(target) => object.id == target,
                None => true,
            },
        }
    }
}

impl Iterator for ScanPlan {
    type Item = ScanStep;

    fn next(&mut self) -> Option<ScanStep> {
        let step = self.steps.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.steps.len() - self.cursor;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ScanPlan {}

/// Everything observed during one scan, last observation per object.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    objects: HashMap<ObjectId, ObservedObject>,
}

impl Sweep {
    pub fn insert(&mut self, object: ObservedObject) {
        self.objects.insert(object.id, object);
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObservedObject> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn tanks(&self) -> impl Iterator<Item = &ObservedObject> {
        self.objects.values().filter(|o| o.is_tank())
    }

    /// Closest object of `category` to `from`.
    pub fn nearest(&self, category: ObjectCategory, from: &Position) -> Option<&ObservedObject> {
        self.objects
            .values()
            .filter(|o| o.category == category)
            .min_by(|a, b| {
                from.range_to(&a.position)
                    .total_cmp(&from.range_to(&b.position))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObservedObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// What a sweep source produced for one observation window.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepPoll {
    Observed(Vec<ObservedObject>),
    /// The window was cut short; the scan must stop.
    Cancelled,
}

/// Supplies the objects reported during each scan step.
pub trait SweepSource {
    /// Wait out `wait` (or less, if cancelled) and return what arrived.
    fn poll(&mut self, wait: Duration) -> SweepPoll;
}

/// Live source backed by the shared context: waits while the ingestor
/// records observations, then drains everything newer than its cursor.
/// Cancels on shutdown or an incoming hit.
///
/// Each sweep starts fresh: an object recorded before `new` is only seen
/// if the server reports it again while the sweep runs.
pub struct ContextSweep<'a> {
    ctx: &'a TacticalContext,
    cursor: u64,
}

impl<'a> ContextSweep<'a> {
    /// Start from the newest observation already recorded.
    pub fn new(ctx: &'a TacticalContext) -> Self {
        let cursor = ctx.world().cursor();
        Self { ctx, cursor }
    }
}

impl SweepSource for ContextSweep<'_> {
    fn poll(&mut self, wait: Duration) -> SweepPoll {
        match self.ctx.pause_unless_hit(wait) {
            Wake::Elapsed => {
                let (objects, cursor) = self.ctx.world().objects_after(self.cursor);
                self.cursor = cursor;
                SweepPoll::Observed(objects)
            }
            Wake::Hit | Wake::Shutdown => SweepPoll::Cancelled,
        }
    }
}

/// Result of running one plan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub mode: ScanMode,
    pub exit: ScanExit,
    pub sweep: Sweep,
    /// Turret commands issued.
    pub turns: usize,
}

/// Walk `plan`, turning the turret and collecting observations, until it
/// runs out or an exit condition fires. A tank inside the emergency
/// distance ends any scan, whatever its mode.
pub fn run<S, A>(
    mut plan: ScanPlan,
    own: &OwnState,
    source: &mut S,
    actuator: &A,
) -> Result<ScanOutcome, ActuatorError>
where
    S: SweepSource + ?Sized,
    A: Actuator + ?Sized,
{
    let mode = plan.mode();
    let mut sweep = Sweep::default();
    let mut turns = 0;

    let finish = |exit: ScanExit, sweep: Sweep, turns: usize| {
        debug!(?mode, ?exit, seen = sweep.len(), turns, "scan finished");
        Ok(ScanOutcome {
            mode,
            exit,
            sweep,
            turns,
        })
    };

    while let Some(step) = plan.next() {
        actuator.turn_turret_to(step.heading)?;
        turns += 1;

        let observed = match source.poll(step.wait) {
            SweepPoll::Observed(objects) => objects,
            SweepPoll::Cancelled => return finish(ScanExit::Cancelled, sweep, turns),
        };

        let mut emergency = None;
        let mut found = None;
        for object in observed {
            if object.id == own.id {
                continue;
            }
            let distance = own.position.range_to(&object.position);
            if emergency.is_none() && object.is_tank() && distance <= plan.exits.emergency_distance {
                emergency = Some(object.id);
            }
            if found.is_none() && plan.qualifies(&object, &own.position) {
                found = Some(object.id);
            }
            sweep.insert(object);
        }

        if let Some(id) = emergency {
            warn!(id, "enemy inside emergency distance");
            return finish(ScanExit::Emergency(id), sweep, turns);
        }
        if let Some(id) = found {
            return finish(ScanExit::Found(id), sweep, turns);
        }
    }

    finish(ScanExit::Exhausted, sweep, turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_plan_covers_circle() {
        let plan = ScanPlan::full(350.0, &ScanParams::default());
        assert_eq!(plan.len(), 18);
        let headings = plan.headings();
        assert_eq!(headings[0], 10.0);
        assert_eq!(headings[17], 350.0);
        assert!(headings.iter().all(|h| (0.0..360.0).contains(h)));
    }

    #[test]
    fn test_fast_plan_oscillates() {
        let plan = ScanPlan::fast(0.0, &ScanParams::default());
        assert_eq!(
            plan.headings(),
            vec![15.0, 345.0, 30.0, 330.0, 45.0, 315.0, 60.0, 300.0]
        );
    }

    #[test]
    fn test_directed_plan_holds_then_widens() {
        let plan = ScanPlan::directed(90.0, Some(4), &ScanParams::default());
        assert_eq!(plan.target(), Some(4));
        assert_eq!(
            plan.headings(),
            vec![90.0, 90.0, 90.0, 90.0, 135.0, 45.0, 180.0, 0.0, 225.0, 315.0, 270.0]
        );
    }

    #[test]
    fn test_restart_rewinds() {
        let mut plan = ScanPlan::fast(0.0, &ScanParams::default());
        plan.next();
        plan.next();
        assert_eq!(plan.len(), 6);
        plan.restart();
        assert_eq!(plan.len(), 8);
    }

    #[test]
    fn test_sweep_nearest() {
        let mut sweep = Sweep::default();
        for (id, x) in [(1, 30.0), (2, 10.0)] {
            sweep.insert(ObservedObject {
                id,
                category: ObjectCategory::HealthPickup,
                position: Position::new(x, 0.0),
                name: None,
                health: None,
                seen_at: 0.0,
            });
        }
        let near = sweep.nearest(ObjectCategory::HealthPickup, &Position::default());
        assert_eq!(near.map(|o| o.id), Some(2));
        assert!(sweep.nearest(ObjectCategory::Tank, &Position::default()).is_none());
        assert_eq!(sweep.tanks().count(), 0);
    }
}
