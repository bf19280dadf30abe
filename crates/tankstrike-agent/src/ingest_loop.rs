//! Reader thread — pulls frames off the socket and feeds the ingestor.

use std::io::{self, ErrorKind, Read};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{trace, warn};

use tankstrike_tactics::ingest::FeedIngestor;
use tankstrike_tactics::TacticalContext;

use crate::transport::{Frame, FrameDecoder, TransportError};

const READ_CHUNK: usize = 4096;

/// Read until the connection drops or shutdown is requested. A clean
/// server close is reported as [`TransportError::Closed`].
pub fn run_reader<R: Read>(
    mut reader: R,
    ctx: &TacticalContext,
    ingestor: &mut FeedIngestor,
) -> Result<(), TransportError> {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        if ctx.is_shutdown() {
            return Ok(());
        }
        match reader.read(&mut chunk) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => {
                decoder.extend(&chunk[..n]);
                while let Some(frame) = decoder.next_frame() {
                    handle_frame(&frame, ctx, ingestor);
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(e.into()),
        }
    }
}

fn handle_frame(frame: &Frame, ctx: &TacticalContext, ingestor: &mut FeedIngestor) {
    match frame.decode() {
        Ok(message) => {
            // Ingest errors are already logged and counted.
            if let Ok(event) = ingestor.ingest(ctx, &message, ctx.now()) {
                trace!(?event, "ingested");
            }
        }
        Err(e) => {
            let total = ctx.note_malformed();
            warn!(total, "dropping frame: {}", e);
        }
    }
}

/// Start the reader on its own named thread.
pub fn spawn_reader<R>(
    reader: R,
    ctx: Arc<TacticalContext>,
    mut ingestor: FeedIngestor,
) -> io::Result<JoinHandle<Result<(), TransportError>>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name("tankstrike-reader".into())
        .spawn(move || {
            let result = run_reader(reader, &ctx, &mut ingestor);
            ctx.request_shutdown();
            result
        })
}
