//! CLI module for megamodel
//!
//! Provides command-line interface for:
//! - init: write the built-in e-commerce topology
//! - check: validate a topology and print its bootstrap snapshot
//! - run: serve JSON requests against a live engine

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    check, handle_request, init, init_logging, run, run_command, serve, start, Expectation,
    Request,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_response};
