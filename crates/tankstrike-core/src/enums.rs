//! Enumeration types used throughout the agent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of a non-self object reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectCategory {
    Tank,
    HealthPickup,
    AmmoPickup,
    Snitch,
}

impl ObjectCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectCategory::Tank => "Tank",
            ObjectCategory::HealthPickup => "HealthPickup",
            ObjectCategory::AmmoPickup => "AmmoPickup",
            ObjectCategory::Snitch => "Snitch",
        }
    }
}

impl FromStr for ObjectCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Tank" => Ok(ObjectCategory::Tank),
            "HealthPickup" => Ok(ObjectCategory::HealthPickup),
            "AmmoPickup" => Ok(ObjectCategory::AmmoPickup),
            "Snitch" => Ok(ObjectCategory::Snitch),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turret sweep profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    /// Slow 360 degree discovery sweep.
    #[default]
    Full,
    /// Short back-and-forth around the current heading.
    Fast,
    /// Hold on a remembered heading, widening if nothing reappears.
    Directed,
}

/// Engagement controller phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngagementPhase {
    /// Waiting for the first self-observation.
    #[default]
    Idle,
    /// Sweeping for candidates.
    Scanning,
    /// Target selected this cycle.
    Tracking,
    /// Target re-observed; pursuing and firing.
    Chasing,
    /// Reacting to incoming fire.
    Evading,
    /// Driving to a health pickup.
    SeekingHealth,
}

impl EngagementPhase {
    /// Whether the phase has an engaged target.
    pub fn is_engaging(&self) -> bool {
        matches!(self, EngagementPhase::Tracking | EngagementPhase::Chasing)
    }
}

/// Why a scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanExit {
    /// A qualifying tank turned up before the plan ran out.
    Found(crate::types::ObjectId),
    /// A tank came inside the emergency distance.
    Emergency(crate::types::ObjectId),
    /// Every step ran without an early exit.
    Exhausted,
    /// Shutdown or an incoming hit interrupted the sweep.
    Cancelled,
}

/// Result of one intercept solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Predicted miss fell below the acceptable threshold.
    Converged,
    /// Did not converge; aim is the raw target position.
    Fallback,
}
