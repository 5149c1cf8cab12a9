//! Single-packet reachability probe.
//!
//! Runs the system ping utility once against the configured target and
//! extracts the round-trip time from its `time=` marker. Probe failure is a
//! judged state, not an error: the tunnel may be up yet unreachable, and the
//! caller reports that distinctly from a hard start failure.

use crate::config::ProbeConfig;
use crate::process;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable { latency_ms: u64 },
    Unreachable { detail: String },
}

/// Sends one probe packet and reads the round-trip time out of the output.
pub async fn probe(config: &ProbeConfig) -> ProbeOutcome {
    let wait = config.timeout_secs.to_string();
    let args = ["-c", "1", "-W", &wait, &config.target];
    // outer limit leaves headroom over the utility's own wait
    let limit = Duration::from_secs(config.timeout_secs + 2);

    match process::run_with_timeout(&config.program, args, limit).await {
        Ok(output) if output.success => match extract_latency_ms(&output.stdout) {
            Some(latency_ms) => {
                debug!(latency_ms, target = %config.target, "probe reachable");
                ProbeOutcome::Reachable { latency_ms }
            }
            None => ProbeOutcome::Unreachable {
                detail: "no round-trip marker in probe output".into(),
            },
        },
        Ok(output) => ProbeOutcome::Unreachable {
            detail: if output.stderr.trim().is_empty() {
                format!("probe exited with code {:?}", output.code)
            } else {
                output.stderr.trim().to_string()
            },
        },
        Err(err) => {
            warn!(target = %config.target, error = %err, "probe did not run");
            ProbeOutcome::Unreachable {
                detail: err.to_string(),
            }
        }
    }
}

/// Pulls the integer millisecond value out of a `time=23.4 ms` marker.
fn extract_latency_ms(stdout: &str) -> Option<u64> {
    for line in stdout.lines() {
        if let Some(rest) = line.split("time=").nth(1) {
            if let Some(token) = rest.split_whitespace().next() {
                if let Ok(value) = token.parse::<f64>() {
                    return Some(value as u64);
                }
            }
        }
    }
    None
}
