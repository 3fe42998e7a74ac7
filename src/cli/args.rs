//! CLI argument definitions using clap
//!
//! Commands:
//! - megamodel init --topology <path>
//! - megamodel check --topology <path>
//! - megamodel run --topology <path> [--sweep-interval-ms <ms>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// megamodel - replica consistency state transition engine
#[derive(Parser, Debug)]
#[command(name = "megamodel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log filter (RUST_LOG syntax); logs go to stderr
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the built-in e-commerce topology
    Init {
        /// Path to topology file
        #[arg(long, default_value = "./topology.json")]
        topology: PathBuf,
    },

    /// Validate a topology and print its bootstrap snapshot
    Check {
        /// Path to topology file
        #[arg(long, default_value = "./topology.json")]
        topology: PathBuf,
    },

    /// Boot the engine and serve JSON requests from stdin
    Run {
        /// Path to topology file
        #[arg(long, default_value = "./topology.json")]
        topology: PathBuf,

        /// Override the topology's background sweep period
        #[arg(long)]
        sweep_interval_ms: Option<u64>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
