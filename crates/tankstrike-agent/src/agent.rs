//! Connection setup and thread supervision.

use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info};

use tankstrike_core::commands::Command;
use tankstrike_tactics::ingest::FeedIngestor;
use tankstrike_tactics::{EngagementController, TacticalContext};

use crate::actuator::ChannelActuator;
use crate::config::AgentConfig;
use crate::game_loop::spawn_engagement;
use crate::ingest_loop::spawn_reader;
use crate::reposition::spawn_reposition;
use crate::transport::{encode_command, spawn_writer};

/// Connect, spawn the tank, and run every loop until one of them stops.
/// Returns the first failure any thread reported.
pub fn run(config: AgentConfig) -> Result<()> {
    info!(
        host = %config.hostname,
        port = config.port,
        name = %config.name,
        seed = config.seed,
        "connecting"
    );
    let mut stream = TcpStream::connect((config.hostname.as_str(), config.port))
        .with_context(|| format!("failed to connect to {}:{}", config.hostname, config.port))?;
    stream.set_nodelay(true).context("failed to set TCP_NODELAY")?;
    stream
        .set_read_timeout(Some(config.timing.read_timeout))
        .context("failed to set socket read timeout")?;

    // The spawn request goes out before any loop can send.
    let spawn = encode_command(&Command::CreateTank {
        name: config.name.clone(),
    })
    .context("tank name does not fit in one frame")?;
    stream.write_all(&spawn).context("failed to send spawn request")?;
    info!(name = %config.name, "spawn requested");

    let reader = stream.try_clone().context("failed to clone socket for reading")?;
    let ctx = Arc::new(TacticalContext::new());
    let (tx, rx) = mpsc::channel();

    let writer = spawn_writer(
        stream.try_clone().context("failed to clone socket for writing")?,
        rx,
        ctx.clone(),
        config.timing.writer_poll,
    )
    .context("failed to spawn writer thread")?;
    let reader = spawn_reader(reader, ctx.clone(), FeedIngestor::new(config.name.clone()))
        .context("failed to spawn reader thread")?;
    let engagement = spawn_engagement(
        ctx.clone(),
        ChannelActuator::new(tx.clone()),
        EngagementController::new(config.engagement.clone(), config.seed),
        config.timing.clone(),
    )
    .context("failed to spawn engagement thread")?;
    let reposition = spawn_reposition(
        ctx.clone(),
        ChannelActuator::new(tx),
        config.waypoints.clone(),
        config.timing.clone(),
    )
    .context("failed to spawn reposition thread")?;

    let results = [
        join("reader", reader),
        join("engagement", engagement),
        join("reposition", reposition),
        join("writer", writer),
    ];
    let _ = stream.shutdown(Shutdown::Both);

    info!(malformed = ctx.malformed_count(), "agent stopped");
    results.into_iter().collect()
}

fn join<E>(name: &str, handle: JoinHandle<Result<(), E>>) -> Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match handle.join() {
        Ok(Ok(())) => {
            info!(thread = name, "stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(thread = name, "failed: {}", e);
            Err(anyhow::Error::new(e).context(format!("{name} thread failed")))
        }
        Err(_) => {
            error!(thread = name, "panicked");
            Err(anyhow!("{name} thread panicked"))
        }
    }
}
