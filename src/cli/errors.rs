//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code. Errors of a
//! single request inside `run` are written to stdout instead and do not stop
//! the loop.

use std::fmt;
use std::io;

use crate::registry::CoherenceError;
use crate::topology::TopologyError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Topology file missing, unreadable or invalid
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Topology file already exists
    AlreadyExists,
    /// Malformed request line
    InvalidRequest,
    /// Request rejected by the engine
    EngineError,
    /// Runtime or subscriber setup failed
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "MEGAMODEL_CLI_CONFIG_ERROR",
            Self::IoError => "MEGAMODEL_CLI_IO_ERROR",
            Self::AlreadyExists => "MEGAMODEL_CLI_ALREADY_EXISTS",
            Self::InvalidRequest => "MEGAMODEL_CLI_INVALID_REQUEST",
            Self::EngineError => "MEGAMODEL_CLI_ENGINE_ERROR",
            Self::BootFailed => "MEGAMODEL_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_exists(path: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::AlreadyExists,
            format!("Topology file already exists: {}", path),
        )
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<TopologyError> for CliError {
    fn from(e: TopologyError) -> Self {
        Self::config_error(format!("{} ({})", e, e.code()))
    }
}

impl From<CoherenceError> for CliError {
    fn from(e: CoherenceError) -> Self {
        Self::new(CliErrorCode::EngineError, format!("{} ({})", e, e.code()))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
