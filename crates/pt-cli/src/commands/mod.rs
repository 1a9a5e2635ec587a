//! CLI subcommand implementations.

pub mod batch;
pub mod session;
mod util;
