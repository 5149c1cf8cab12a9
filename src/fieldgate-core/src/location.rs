//! First-fix acquisition from a line-oriented location source.
//!
//! Production feeds a TCP socket exposed by the GPS unit; tests feed any
//! in-memory line source. Either way the reader scans sentences until one
//! converts, bounded by an overall deadline so a silent source cannot block
//! a command forever.

use crate::config::GpsConfig;
use crate::nmea::{self, Coordinate};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Why no fix could be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoFixReason {
    /// The source could not be reached at all
    SourceUnreachable(String),
    /// The stream ended before any recognized sentence converted
    StreamEnded,
    /// The configured read deadline expired first
    DeadlineExpired,
}

impl fmt::Display for NoFixReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnreachable(detail) => {
                write!(f, "location source unreachable: {detail}")
            }
            Self::StreamEnded => write!(f, "stream ended without a usable fix"),
            Self::DeadlineExpired => write!(f, "no fix within the read deadline"),
        }
    }
}

/// Result of one fix attempt.
///
/// `NoFix` means "unknown location" and must never be read as a geofence
/// judgment in either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    Fix(Coordinate),
    NoFix(NoFixReason),
}

/// Reads the first usable fix from the configured GPS socket.
pub struct LocationReader {
    host: String,
    port: u16,
    deadline: Duration,
}

impl LocationReader {
    pub fn new(gps: &GpsConfig) -> Self {
        Self {
            host: gps.host.clone(),
            port: gps.port,
            deadline: Duration::from_secs(gps.read_timeout_secs),
        }
    }

    /// Connects to the source and returns the first fix. The deadline covers
    /// both the connection attempt and the sentence scan.
    pub async fn read_fix(&self) -> FixOutcome {
        let address = format!("{}:{}", self.host, self.port);
        let attempt = async {
            match TcpStream::connect(&address).await {
                Ok(stream) => first_fix(BufReader::new(stream)).await,
                Err(err) => {
                    warn!(%address, error = %err, "location source unreachable");
                    FixOutcome::NoFix(NoFixReason::SourceUnreachable(err.to_string()))
                }
            }
        };
        match timeout(self.deadline, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => FixOutcome::NoFix(NoFixReason::DeadlineExpired),
        }
    }
}

/// Scans lines until one recognized sentence yields a coordinate.
pub async fn first_fix<R: AsyncBufRead + Unpin>(source: R) -> FixOutcome {
    let mut lines = source.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(position) = nmea::parse_sentence(&line) {
                    return FixOutcome::Fix(position);
                }
                if line.starts_with("$GP") {
                    debug!(sentence = line.trim(), "skipping sentence without usable fix");
                }
            }
            Ok(None) => return FixOutcome::NoFix(NoFixReason::StreamEnded),
            Err(err) => {
                warn!(error = %err, "location stream read failed");
                return FixOutcome::NoFix(NoFixReason::StreamEnded);
            }
        }
    }
}
