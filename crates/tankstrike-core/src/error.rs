//! Error types shared by the protocol layer and the tactics engine.

use std::fmt;

/// Framing and encoding failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Encoded payload does not fit the one-byte length field.
    PayloadTooLong { len: usize, max: usize },
    /// Payload bytes are not valid JSON.
    InvalidJson { tag: u8, reason: String },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLong { len, max } => {
                write!(f, "payload of {len} bytes exceeds the {max}-byte frame limit")
            }
            Self::InvalidJson { tag, reason } => {
                write!(f, "message type {tag} carries invalid JSON: {reason}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// A message that could not be turned into state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Payload missing or lacking a required field.
    Malformed { reason: String },
}

impl IngestError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed message: {reason}"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Outbound command sink is gone; the agent cannot act anymore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    Disconnected,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "command channel disconnected"),
        }
    }
}

impl std::error::Error for ActuatorError {}
