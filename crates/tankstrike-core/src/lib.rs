//! Core types and definitions for the TANKSTRIKE agent.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, protocol messages, commands, classified events, state records
//! and tuning constants. It performs no I/O.

pub mod commands;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod messages;
pub mod state;
pub mod types;
