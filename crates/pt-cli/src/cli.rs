//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Play-session telemetry enricher.
///
/// Reconciles each session's JSON record with its recipe log and writes one
/// summary per session.
#[derive(Debug, Parser)]
#[command(name = "pt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process every session archive in a data directory.
    Batch {
        /// Directory containing `<session>.zip` archives.
        data_dir: PathBuf,

        /// Keep the extracted record and log after a successful summary.
        #[arg(long)]
        keep_inputs: bool,
    },

    /// Summarize a single record/log pair.
    Session {
        /// The session's JSON record.
        record: PathBuf,

        /// The session's recipe log.
        log: PathBuf,

        /// Write the summary here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
