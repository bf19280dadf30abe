//! Tactical targeting engine for TANKSTRIKE.
//!
//! Turns the server's observation feed into sweeps, target choices, motion
//! histories and lead solutions, and sequences them into engagement
//! decisions. Headless: no sockets, no threads of its own, so every part is
//! testable with scripted inputs.

pub mod actuator;
pub mod context;
pub mod engagement;
pub mod ingest;
pub mod intercept;
pub mod scan;
pub mod selector;
pub mod tracker;
pub mod world;

pub use tankstrike_core as core;
pub use context::TacticalContext;
pub use engagement::EngagementController;

#[cfg(test)]
mod tests;
