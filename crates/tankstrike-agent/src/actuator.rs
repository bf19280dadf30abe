//! Channel-backed actuator feeding the writer thread.

use std::sync::mpsc::Sender;

use tankstrike_core::commands::Command;
use tankstrike_core::error::ActuatorError;
use tankstrike_tactics::actuator::Actuator;

/// Hands commands to the writer without waiting for the socket.
#[derive(Debug, Clone)]
pub struct ChannelActuator {
    tx: Sender<Command>,
}

impl ChannelActuator {
    pub fn new(tx: Sender<Command>) -> Self {
        Self { tx }
    }
}

impl Actuator for ChannelActuator {
    fn send(&self, command: Command) -> Result<(), ActuatorError> {
        self.tx.send(command).map_err(|_| ActuatorError::Disconnected)
    }
}
