//! Command line and runtime configuration.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;

use tankstrike_core::constants::*;
use tankstrike_core::types::Position;
use tankstrike_tactics::engagement::EngagementParams;

#[derive(Parser, Debug, Clone)]
#[command(name = "tankstrike")]
#[command(about = "Autonomous scanning and intercepting tank for the arena server")]
pub struct Cli {
    /// Enable debug output
    #[arg(short = 'd', long)]
    pub debug: bool,
    /// Hostname to connect to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub hostname: String,
    /// Port to connect to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Name of the tank
    #[arg(short = 'n', long, default_value = "ScanBot")]
    pub name: String,
    /// Seed for evasion randomness (defaults to the clock)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Reposition waypoint as "x,y"; repeat for several
    #[arg(
        long = "waypoint",
        value_name = "X,Y",
        value_parser = parse_waypoint,
        allow_hyphen_values = true
    )]
    pub waypoints: Vec<Position>,
}

impl Cli {
    pub fn into_config(self) -> AgentConfig {
        let seed = self.seed.unwrap_or_else(clock_seed);
        let waypoints = if self.waypoints.is_empty() {
            DEFAULT_WAYPOINTS
                .iter()
                .map(|&(x, y)| Position::new(x, y))
                .collect()
        } else {
            self.waypoints
        };
        AgentConfig {
            hostname: self.hostname,
            port: self.port,
            name: self.name,
            seed,
            waypoints,
            engagement: EngagementParams::default(),
            timing: LoopTiming::default(),
        }
    }
}

/// Parse a waypoint written as `x,y`.
pub fn parse_waypoint(s: &str) -> Result<Position, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| format!("invalid coordinate {v:?}"))
    };
    Ok(Position::new(parse(x)?, parse(y)?))
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Everything the agent needs to run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub hostname: String,
    pub port: u16,
    pub name: String,
    pub seed: u64,
    pub waypoints: Vec<Position>,
    pub engagement: EngagementParams,
    pub timing: LoopTiming,
}

/// Loop cadences and waits.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopTiming {
    /// Wait between engagement cycles.
    pub cycle: Duration,
    /// Pause after an evasive manoeuvre.
    pub evade_pause: Duration,
    pub reposition_interval: Duration,
    pub waypoint_arrival: f64,
    /// How long one wait for a self-observation lasts before re-checking.
    pub own_wait: Duration,
    pub read_timeout: Duration,
    /// Writer poll slice for the command channel.
    pub writer_poll: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            cycle: Duration::from_millis(ENGAGEMENT_CYCLE_MS),
            evade_pause: Duration::from_millis(EVADE_PAUSE_MS),
            reposition_interval: Duration::from_millis(REPOSITION_INTERVAL_MS),
            waypoint_arrival: WAYPOINT_ARRIVAL_DISTANCE,
            own_wait: Duration::from_millis(ENGAGEMENT_CYCLE_MS),
            read_timeout: Duration::from_millis(READ_TIMEOUT_MS),
            writer_poll: Duration::from_millis(WAIT_SLICE_MS),
        }
    }
}
