//! Play-session telemetry CLI library.
//!
//! This crate provides the CLI interface for the session enricher.

mod archive;
mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
