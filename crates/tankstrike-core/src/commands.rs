//! Outbound commands sent from the agent to the game server.
//!
//! Heading-bearing constructors normalize into [0, 360) so no component can
//! emit an out-of-range heading.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::messages::MessageType;
use crate::types::normalize_heading;

/// All actions the agent can request from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Spawn our tank under the given name.
    CreateTank { name: String },
    /// Rotate the turret to an absolute heading (degrees).
    TurnTurretToHeading { amount: f64 },
    /// Rotate the hull to an absolute heading (degrees).
    TurnToHeading { amount: f64 },
    /// Drive forward the given distance.
    MoveForwardDistance { amount: f64 },
    /// Drive backward the given distance.
    MoveBackwardDistance { amount: f64 },
    /// Fire the main gun.
    Fire,
    /// Halt all movement and rotation.
    StopAll,
}

impl Command {
    pub fn turn_turret_to(heading: f64) -> Self {
        Command::TurnTurretToHeading {
            amount: normalize_heading(heading),
        }
    }

    pub fn turn_to(heading: f64) -> Self {
        Command::TurnToHeading {
            amount: normalize_heading(heading),
        }
    }

    pub fn move_forward(distance: f64) -> Self {
        Command::MoveForwardDistance {
            amount: distance.max(0.0),
        }
    }

    pub fn move_backward(distance: f64) -> Self {
        Command::MoveBackwardDistance {
            amount: distance.max(0.0),
        }
    }

    /// Wire message type for this command.
    pub fn message_type(&self) -> MessageType {
        match self {
            Command::CreateTank { .. } => MessageType::CreateTank,
            Command::TurnTurretToHeading { .. } => MessageType::TurnTurretToHeading,
            Command::TurnToHeading { .. } => MessageType::TurnToHeading,
            Command::MoveForwardDistance { .. } => MessageType::MoveForwardDistance,
            Command::MoveBackwardDistance { .. } => MessageType::MoveBackwardsDistance,
            Command::Fire => MessageType::Fire,
            Command::StopAll => MessageType::StopAll,
        }
    }

    /// Wire payload: `{"Amount": n}`, `{"Name": s}`, or nothing.
    pub fn payload(&self) -> Option<serde_json::Value> {
        match self {
            Command::CreateTank { name } => Some(json!({ "Name": name })),
            Command::TurnTurretToHeading { amount }
            | Command::TurnToHeading { amount }
            | Command::MoveForwardDistance { amount }
            | Command::MoveBackwardDistance { amount } => Some(json!({ "Amount": amount })),
            Command::Fire | Command::StopAll => None,
        }
    }

    /// Heading carried by a turn command, if any.
    pub fn heading(&self) -> Option<f64> {
        match self {
            Command::TurnTurretToHeading { amount } | Command::TurnToHeading { amount } => {
                Some(*amount)
            }
            _ => None,
        }
    }
}
