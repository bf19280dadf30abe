//! State records shared between the ingestor and the control loops.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{ObjectId, Position};

/// Latest self-observation. Replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnState {
    pub id: ObjectId,
    pub position: Position,
    /// Hull heading (degrees).
    pub heading: f64,
    /// Turret heading (degrees).
    pub turret_heading: f64,
    pub health: i32,
    /// Not every server build reports ammo.
    pub ammo: Option<i32>,
}

impl OwnState {
    /// Whether a shot is possible as far as we know.
    pub fn has_ammo(&self) -> bool {
        self.ammo.map_or(true, |a| a > 0)
    }
}

/// A foreign object seen in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedObject {
    pub id: ObjectId,
    pub category: ObjectCategory,
    pub position: Position,
    pub name: Option<String>,
    /// Tanks only.
    pub health: Option<i32>,
    /// Agent clock time of the observation (seconds).
    pub seen_at: f64,
}

impl ObservedObject {
    pub fn is_tank(&self) -> bool {
        self.category == ObjectCategory::Tank
    }
}

/// Engagement status published by the engagement controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementState {
    pub phase: EngagementPhase,
    pub target: Option<ObjectId>,
    pub scan_mode: ScanMode,
    pub emergency: bool,
    /// Agent clock time of the last hit taken (seconds).
    pub last_damage_at: Option<f64>,
}
