//! Feed ingestor — classifies inbound messages and applies them to the
//! shared context. The only writer of own state and observed objects.

use tracing::{debug, info, warn};

use tankstrike_core::enums::ObjectCategory;
use tankstrike_core::error::IngestError;
use tankstrike_core::events::ClassifiedEvent;
use tankstrike_core::messages::{MessageType, ObjectPayload, ServerMessage};
use tankstrike_core::state::{ObservedObject, OwnState};
use tankstrike_core::types::{normalize_heading, ObjectId, Position};

use crate::context::TacticalContext;

/// Turns raw server messages into state updates.
#[derive(Debug, Clone)]
pub struct FeedIngestor {
    own_name: Option<String>,
    own_id: Option<ObjectId>,
}

impl FeedIngestor {
    /// Ingestor for a tank spawned under `own_name`.
    pub fn new(own_name: impl Into<String>) -> Self {
        Self {
            own_name: Some(own_name.into()),
            own_id: None,
        }
    }

    /// Ingestor with a known own identifier.
    pub fn with_own_id(own_id: ObjectId) -> Self {
        Self {
            own_name: None,
            own_id: Some(own_id),
        }
    }

    pub fn own_id(&self) -> Option<ObjectId> {
        self.own_id
    }

    /// Classify one message and apply it. Malformed messages are logged,
    /// counted on the context and returned as errors; the caller drops them.
    pub fn ingest(
        &mut self,
        ctx: &TacticalContext,
        message: &ServerMessage,
        now: f64,
    ) -> Result<ClassifiedEvent, IngestError> {
        let result = self.classify(ctx, message, now);
        if let Err(err) = &result {
            let total = ctx.note_malformed();
            warn!(kind = ?message.kind, total, "dropping message: {}", err);
        }
        result
    }

    fn classify(
        &mut self,
        ctx: &TacticalContext,
        message: &ServerMessage,
        now: f64,
    ) -> Result<ClassifiedEvent, IngestError> {
        match message.kind {
            MessageType::ObjectUpdate => {
                let value = message
                    .payload
                    .as_ref()
                    .ok_or_else(|| IngestError::malformed("object update without payload"))?;
                let payload: ObjectPayload = serde_json::from_value(value.clone())
                    .map_err(|e| IngestError::malformed(e.to_string()))?;
                self.ingest_object(ctx, payload, now)
            }
            MessageType::HitDetected => {
                ctx.raise_hit();
                Ok(ClassifiedEvent::HitDetected)
            }
            MessageType::Kill => {
                ctx.raise_kill();
                Ok(ClassifiedEvent::Kill)
            }
            MessageType::Destroyed => {
                info!("own tank destroyed");
                ctx.clear_own();
                Ok(ClassifiedEvent::Destroyed)
            }
            MessageType::HealthPickup
            | MessageType::AmmoPickup
            | MessageType::SnitchPickup
            | MessageType::SnitchAppeared
            | MessageType::EnteredGoal
            | MessageType::GameTimeUpdate
            | MessageType::SuccessfulHit => {
                debug!(kind = ?message.kind, "notice");
                Ok(ClassifiedEvent::Notice(message.kind))
            }
            _ => Ok(ClassifiedEvent::Ignored),
        }
    }

    fn ingest_object(
        &mut self,
        ctx: &TacticalContext,
        payload: ObjectPayload,
        now: f64,
    ) -> Result<ClassifiedEvent, IngestError> {
        if self.is_self(&payload) {
            let own = own_state(&payload)?;
            ctx.set_own(own);
            return Ok(ClassifiedEvent::OwnUpdate);
        }

        let kind = payload
            .kind
            .as_deref()
            .ok_or_else(|| IngestError::malformed(format!("object {} has no Type", payload.id)))?;
        let Ok(category) = kind.parse::<ObjectCategory>() else {
            return Ok(ClassifiedEvent::Ignored);
        };

        let health = match (category, payload.health) {
            (ObjectCategory::Tank, None) => {
                return Err(IngestError::malformed(format!(
                    "tank {} has no Health",
                    payload.id
                )))
            }
            (_, health) => health.map(|h| h.round() as i32),
        };

        let position = Position::new(payload.x, payload.y);
        ctx.world().record_object(ObservedObject {
            id: payload.id,
            category,
            position,
            name: payload.name,
            health,
            seen_at: now,
        });
        if category == ObjectCategory::Tank {
            ctx.tracker().record(payload.id, position, health, now);
        }

        Ok(ClassifiedEvent::Observed {
            id: payload.id,
            category,
        })
    }

    /// Decide whether an update describes our own tank, adopting its id
    /// when the name matches or, with no names on the wire, on the first
    /// update after spawning.
    fn is_self(&mut self, payload: &ObjectPayload) -> bool {
        let name_match = match (payload.name.as_deref(), self.own_name.as_deref()) {
            (Some(theirs), Some(ours)) => Some(theirs == ours),
            _ => None,
        };

        match (self.own_id, name_match) {
            (_, Some(true)) => {
                if self.own_id != Some(payload.id) {
                    info!(id = payload.id, "own tank identified");
                    self.own_id = Some(payload.id);
                }
                true
            }
            (Some(id), _) => id == payload.id,
            (None, Some(false)) => false,
            (None, None) => {
                info!(id = payload.id, "adopting first object update as own tank");
                self.own_id = Some(payload.id);
                true
            }
        }
    }
}

fn own_state(payload: &ObjectPayload) -> Result<OwnState, IngestError> {
    let missing = |field: &str| IngestError::malformed(format!("own update missing {field}"));
    let heading = payload.heading.ok_or_else(|| missing("Heading"))?;
    let turret_heading = payload.turret_heading.ok_or_else(|| missing("TurretHeading"))?;
    let health = payload.health.ok_or_else(|| missing("Health"))?;

    Ok(OwnState {
        id: payload.id,
        position: Position::new(payload.x, payload.y),
        heading: normalize_heading(heading),
        turret_heading: normalize_heading(turret_heading),
        health: health.round() as i32,
        ammo: payload.ammo.map(|a| a.round() as i32),
    })
}
