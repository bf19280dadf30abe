//! Command sink seam between decisions and the transport.

use tankstrike_core::commands::Command;
use tankstrike_core::error::ActuatorError;

/// Anything that can deliver commands to the game server.
///
/// Implementations must be cheap to call from the scan loop; the live agent
/// hands commands to a writer thread over a channel.
pub trait Actuator {
    fn send(&self, command: Command) -> Result<(), ActuatorError>;

    fn turn_turret_to(&self, heading: f64) -> Result<(), ActuatorError> {
        self.send(Command::turn_turret_to(heading))
    }

    fn turn_to(&self, heading: f64) -> Result<(), ActuatorError> {
        self.send(Command::turn_to(heading))
    }

    fn move_forward(&self, distance: f64) -> Result<(), ActuatorError> {
        self.send(Command::move_forward(distance))
    }

    fn fire(&self) -> Result<(), ActuatorError> {
        self.send(Command::Fire)
    }

    fn stop_all(&self) -> Result<(), ActuatorError> {
        self.send(Command::StopAll)
    }

    /// Send commands in order, stopping at the first failure.
    fn send_all(&self, commands: &[Command]) -> Result<(), ActuatorError> {
        commands.iter().try_for_each(|c| self.send(c.clone()))
    }
}

impl<A: Actuator + ?Sized> Actuator for &A {
    fn send(&self, command: Command) -> Result<(), ActuatorError> {
        (**self).send(command)
    }
}
