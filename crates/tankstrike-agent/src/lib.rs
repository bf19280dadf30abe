//! TANKSTRIKE agent.
//!
//! Wires the tactics engine to a live game server: socket framing, the
//! reader and writer threads, the engagement and reposition loops, and the
//! command line.

pub mod actuator;
pub mod agent;
pub mod config;
pub mod game_loop;
pub mod ingest_loop;
pub mod reposition;
pub mod transport;

pub use tankstrike_core as core;
pub use tankstrike_tactics as tactics;
