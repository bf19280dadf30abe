//! Wire framing and the outbound writer thread.
//!
//! Frame layout: one type byte, one length byte, then `length` bytes of
//! UTF-8 JSON (absent when the length is zero).

use std::fmt;
use std::io::{self, Write};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use tankstrike_core::commands::Command;
use tankstrike_core::constants::MAX_PAYLOAD_LEN;
use tankstrike_core::error::ProtocolError;
use tankstrike_core::messages::{MessageType, ServerMessage};
use tankstrike_tactics::TacticalContext;

/// Connection-level failure. Always fatal for the agent.
#[derive(Debug)]
pub enum TransportError {
    Io(io::Error),
    /// The server closed the connection.
    Closed,
    Protocol(ProtocolError),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "socket error: {e}"),
            Self::Closed => write!(f, "connection closed by server"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Closed => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ProtocolError> for TransportError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

/// One raw frame off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub tag: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Parse the payload. Unknown tags decode to `MessageType::Unknown`.
    pub fn decode(&self) -> Result<ServerMessage, ProtocolError> {
        let kind = MessageType::from_u8(self.tag);
        if self.payload.is_empty() {
            return Ok(ServerMessage::bare(kind));
        }
        let value = serde_json::from_slice(&self.payload).map_err(|e| ProtocolError::InvalidJson {
            tag: self.tag,
            reason: e.to_string(),
        })?;
        Ok(ServerMessage::new(kind, Some(value)))
    }
}

/// Reassembles frames from arbitrarily split socket reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Next complete frame, if the buffer holds one.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.buf.len() < 2 {
            return None;
        }
        let len = self.buf[1] as usize;
        if self.buf.len() < 2 + len {
            return None;
        }
        let tag = self.buf[0];
        let payload = self.buf[2..2 + len].to_vec();
        self.buf.drain(..2 + len);
        Some(Frame { tag, payload })
    }

    /// Bytes waiting for the rest of their frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Encode a command as one frame.
pub fn encode_command(command: &Command) -> Result<Vec<u8>, ProtocolError> {
    let payload = command
        .payload()
        .map(|v| v.to_string().into_bytes())
        .unwrap_or_default();
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLong {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }
    let mut frame = Vec::with_capacity(2 + payload.len());
    frame.push(command.message_type().as_u8());
    frame.push(payload.len() as u8);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Encode and write one command.
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<(), TransportError> {
    let frame = encode_command(command)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Drain the command channel onto `writer` until shutdown or until every
/// sender is gone. Commands that cannot be encoded are skipped.
pub fn run_writer<W: Write>(
    mut writer: W,
    commands: Receiver<Command>,
    ctx: &TacticalContext,
    poll: Duration,
) -> Result<(), TransportError> {
    loop {
        if ctx.is_shutdown() {
            return Ok(());
        }
        match commands.recv_timeout(poll) {
            Ok(command) => match write_command(&mut writer, &command) {
                Ok(()) => debug!(?command, "sent"),
                Err(TransportError::Protocol(e)) => warn!(?command, "command not sent: {}", e),
                Err(e) => return Err(e),
            },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!("command channel closed");
                return Ok(());
            }
        }
    }
}

/// Start the writer on its own named thread.
pub fn spawn_writer<W>(
    writer: W,
    commands: Receiver<Command>,
    ctx: Arc<TacticalContext>,
    poll: Duration,
) -> io::Result<JoinHandle<Result<(), TransportError>>>
where
    W: Write + Send + 'static,
{
    std::thread::Builder::new()
        .name("tankstrike-writer".into())
        .spawn(move || {
            let result = run_writer(writer, commands, &ctx, poll);
            ctx.request_shutdown();
            result
        })
}
