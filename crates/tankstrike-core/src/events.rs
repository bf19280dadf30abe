//! Events produced by classifying inbound server messages.

use crate::enums::ObjectCategory;
use crate::messages::MessageType;
use crate::types::ObjectId;

/// What the feed ingestor made of one message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    /// Own tank state replaced.
    OwnUpdate,
    /// A foreign object was recorded.
    Observed {
        id: ObjectId,
        category: ObjectCategory,
    },
    /// We were shot.
    HitDetected,
    /// One of our shots destroyed a tank.
    Kill,
    /// Our own tank was destroyed.
    Destroyed,
    /// A known notification with no bearing on targeting.
    Notice(MessageType),
    /// Nothing to do this message (unknown type, unknown category, echo).
    Ignored,
}
