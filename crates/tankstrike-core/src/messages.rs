//! Protocol message types and decoded payloads.

use serde::{Deserialize, Serialize};

use crate::types::ObjectId;

/// Message type tag carried in the first byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Test,
    CreateTank,
    DespawnTank,
    Fire,
    ToggleForward,
    ToggleReverse,
    ToggleLeft,
    ToggleRight,
    ToggleTurretLeft,
    ToggleTurretRight,
    TurnTurretToHeading,
    TurnToHeading,
    MoveForwardDistance,
    MoveBackwardsDistance,
    StopAll,
    StopTurn,
    StopMove,
    StopTurret,
    ObjectUpdate,
    HealthPickup,
    AmmoPickup,
    SnitchPickup,
    Destroyed,
    EnteredGoal,
    Kill,
    SnitchAppeared,
    GameTimeUpdate,
    HitDetected,
    SuccessfulHit,
    /// A tag this agent does not know.
    Unknown(u8),
}

impl MessageType {
    pub fn from_u8(tag: u8) -> Self {
        use MessageType::*;
        match tag {
            0 => Test,
            1 => CreateTank,
            2 => DespawnTank,
            3 => Fire,
            4 => ToggleForward,
            5 => ToggleReverse,
            6 => ToggleLeft,
            7 => ToggleRight,
            8 => ToggleTurretLeft,
            9 => ToggleTurretRight,
            10 => TurnTurretToHeading,
            11 => TurnToHeading,
            12 => MoveForwardDistance,
            13 => MoveBackwardsDistance,
            14 => StopAll,
            15 => StopTurn,
            16 => StopMove,
            17 => StopTurret,
            18 => ObjectUpdate,
            19 => HealthPickup,
            20 => AmmoPickup,
            21 => SnitchPickup,
            22 => Destroyed,
            23 => EnteredGoal,
            24 => Kill,
            25 => SnitchAppeared,
            26 => GameTimeUpdate,
            27 => HitDetected,
            28 => SuccessfulHit,
            other => Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        use MessageType::*;
        match self {
            Test => 0,
            CreateTank => 1,
            DespawnTank => 2,
            Fire => 3,
            ToggleForward => 4,
            ToggleReverse => 5,
            ToggleLeft => 6,
            ToggleRight => 7,
            ToggleTurretLeft => 8,
            ToggleTurretRight => 9,
            TurnTurretToHeading => 10,
            TurnToHeading => 11,
            MoveForwardDistance => 12,
            MoveBackwardsDistance => 13,
            StopAll => 14,
            StopTurn => 15,
            StopMove => 16,
            StopTurret => 17,
            ObjectUpdate => 18,
            HealthPickup => 19,
            AmmoPickup => 20,
            SnitchPickup => 21,
            Destroyed => 22,
            EnteredGoal => 23,
            Kill => 24,
            SnitchAppeared => 25,
            GameTimeUpdate => 26,
            HitDetected => 27,
            SuccessfulHit => 28,
            Unknown(tag) => *tag,
        }
    }
}

/// A decoded inbound message: type tag plus optional JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerMessage {
    pub kind: MessageType,
    pub payload: Option<serde_json::Value>,
}

impl ServerMessage {
    pub fn new(kind: MessageType, payload: Option<serde_json::Value>) -> Self {
        Self { kind, payload }
    }

    /// Message without a payload.
    pub fn bare(kind: MessageType) -> Self {
        Self {
            kind,
            payload: None,
        }
    }
}

/// Object payload of an OBJECTUPDATE message.
///
/// Only `Id`, `X` and `Y` are required by every update; the ingestor checks
/// the category-specific fields itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectPayload {
    pub id: ObjectId,
    #[serde(default, rename = "Type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub turret_heading: Option<f64>,
    #[serde(default)]
    pub health: Option<f64>,
    #[serde(default)]
    pub ammo: Option<f64>,
}
