//! Target tracker — per-enemy motion history and velocity estimates.

use std::collections::{HashMap, VecDeque};

use tankstrike_core::constants::*;
use tankstrike_core::types::{ObjectId, Position, Velocity};

/// One timestamped position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Position,
    /// Agent clock seconds.
    pub at: f64,
}

/// Motion history for one enemy tank.
#[derive(Debug, Clone)]
pub struct TrackedTarget {
    pub id: ObjectId,
    /// Strictly increasing in `at`, bounded by the prediction horizon.
    samples: VecDeque<Sample>,
    pub health: Option<i32>,
}

impl TrackedTarget {
    fn new(id: ObjectId) -> Self {
        Self {
            id,
            samples: VecDeque::new(),
            health: None,
        }
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Agent clock time of the newest sample.
    pub fn last_seen(&self) -> Option<f64> {
        self.latest().map(|s| s.at)
    }

    /// Velocity from the newest sample and the most recent earlier sample
    /// whose age difference lies in the valid window.
    pub fn velocity(&self) -> Option<Velocity> {
        let newest = self.samples.back()?;
        for older in self.samples.iter().rev().skip(1) {
            let dt = newest.at - older.at;
            if dt <= MIN_SAMPLE_DELTA_SECS {
                continue;
            }
            if dt >= PREDICTION_HORIZON_SECS {
                return None;
            }
            return Some(Velocity::new(
                (newest.position.x - older.position.x) / dt,
                (newest.position.y - older.position.y) / dt,
            ));
        }
        None
    }

    fn push(&mut self, sample: Sample) -> bool {
        if let Some(last) = self.samples.back() {
            if sample.at <= last.at {
                return false;
            }
        }
        self.samples.push_back(sample);
        self.prune();
        true
    }

    fn prune(&mut self) {
        let Some(newest) = self.samples.back().map(|s| s.at) else {
            return;
        };
        while let Some(front) = self.samples.front() {
            if newest - front.at >= PREDICTION_HORIZON_SECS || self.samples.len() > MAX_TRACK_SAMPLES {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

/// All tracked enemies, keyed by identifier.
#[derive(Debug, Default)]
pub struct TargetTracker {
    targets: HashMap<ObjectId, TrackedTarget>,
}

impl TargetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Returns false (and keeps nothing) if `at` is not
    /// strictly newer than the target's last sample.
    pub fn record(&mut self, id: ObjectId, position: Position, health: Option<i32>, at: f64) -> bool {
        let target = self
            .targets
            .entry(id)
            .or_insert_with(|| TrackedTarget::new(id));
        let accepted = target.push(Sample { position, at });
        if accepted && health.is_some() {
            target.health = health;
        }
        accepted
    }

    pub fn get(&self, id: ObjectId) -> Option<&TrackedTarget> {
        self.targets.get(&id)
    }

    pub fn velocity_estimate(&self, id: ObjectId) -> Option<Velocity> {
        self.targets.get(&id)?.velocity()
    }

    /// Velocity estimate that also treats a stale newest sample as no
    /// estimate at all.
    pub fn velocity_estimate_at(&self, id: ObjectId, now: f64) -> Option<Velocity> {
        let target = self.targets.get(&id)?;
        let last_seen = target.last_seen()?;
        if now - last_seen > PREDICTION_HORIZON_SECS {
            return None;
        }
        target.velocity()
    }

    /// Forget targets unseen for longer than `TRACK_EVICT_SECS`.
    pub fn evict_stale(&mut self, now: f64) -> Vec<ObjectId> {
        let mut evicted = Vec::new();
        self.targets.retain(|id, t| {
            let fresh = t
                .last_seen()
                .map_or(false, |seen| now - seen <= TRACK_EVICT_SECS);
            if !fresh {
                evicted.push(*id);
            }
            fresh
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
