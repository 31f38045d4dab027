//! RBAC command-line tooling
//!
//! The `rbac` binary runs access checks and assignment changes against a
//! store persisted as a TOML snapshot. Commands live in [`commands`] so they
//! can be driven from tests without spawning the binary.

pub mod commands;
pub mod store_file;

pub use commands::{execute, Command, CommandOutput};
