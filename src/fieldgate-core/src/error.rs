//! Error types for the session-management core.
//!
//! All component operations return [`Result<T>`] which wraps [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Error type for core operations.
///
/// Every variant is recoverable from the orchestrator's point of view: a
/// failure aborts the command that triggered it and is surfaced to the
/// operator, but never terminates the process. Judged states that are not
/// failures (no GPS fix, tunnel up but unreachable) are modeled as outcome
/// values, not errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Tunnel configuration file does not exist; the VPN tool is never invoked
    #[error("tunnel config not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    /// An external program could not be launched at all
    #[error("failed to launch {program}: {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program ran but exited with failure
    #[error("{program} exited with failure: {stderr}")]
    ProcessFailed { program: String, stderr: String },

    /// An external program finished without producing any output
    #[error("{program} produced no output")]
    NoOutput { program: String },

    /// An external program did not finish within its kill-timeout
    #[error("{program} did not finish within {seconds}s")]
    Timeout { program: String, seconds: u64 },

    /// Throughput report was not valid JSON
    #[error("malformed throughput report: {source}")]
    ReportParse {
        #[source]
        source: serde_json::Error,
    },

    /// NMEA coordinate token was empty or non-numeric
    #[error("malformed coordinate token: {0:?}")]
    CoordinateParse(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
