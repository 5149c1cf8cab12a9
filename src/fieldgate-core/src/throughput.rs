//! Link throughput sampling via an external iperf3-style test.
//!
//! Each round runs the test program in JSON mode under a hard kill-timeout
//! and extracts the sender-side `bits_per_second` metric from the report.
//! Rounds are spaced by a fixed interval so back-to-back tests do not
//! contend on the path being measured.

use crate::config::SpeedtestConfig;
use crate::error::{Error, Result};
use crate::process;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// How a sample value came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleOrigin {
    /// Extracted from the report's sender metric
    Measured,
    /// Report parsed but the metric was absent; recorded as zero
    MissingMetric,
}

/// One round's sender-side throughput in MB/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedSample {
    pub round: usize,
    pub megabytes_per_second: f64,
    pub origin: SampleOrigin,
}

/// Collects a fixed-size ordered series of speed samples.
pub struct ThroughputSampler {
    config: SpeedtestConfig,
}

impl ThroughputSampler {
    pub fn new(config: &SpeedtestConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Runs the configured number of rounds and returns the ordered samples.
    ///
    /// Empty output, a non-JSON report, or a round timeout aborts the whole
    /// run; a report that merely lacks the sender metric records a zero
    /// sample and continues.
    pub async fn collect(&self) -> Result<Vec<SpeedSample>> {
        let mut samples = Vec::with_capacity(self.config.rounds);
        for round in 0..self.config.rounds {
            samples.push(self.run_round(round).await?);
            if round + 1 < self.config.rounds {
                sleep(Duration::from_secs(self.config.interval_secs)).await;
            }
        }
        Ok(samples)
    }

    async fn run_round(&self, round: usize) -> Result<SpeedSample> {
        let output = process::run_with_timeout(
            &self.config.program,
            ["-c", &self.config.host, "-J", "-t", "1"],
            Duration::from_secs(self.config.round_timeout_secs),
        )
        .await?;

        if output.stdout.trim().is_empty() {
            if !output.success && !output.stderr.trim().is_empty() {
                return Err(Error::ProcessFailed {
                    program: self.config.program.clone(),
                    stderr: output.stderr.trim().to_string(),
                });
            }
            return Err(Error::NoOutput {
                program: self.config.program.clone(),
            });
        }
        let report: serde_json::Value =
            serde_json::from_str(&output.stdout).map_err(|source| Error::ReportParse { source })?;

        match sender_bits_per_second(&report) {
            Some(bits) => {
                let megabytes_per_second = (bits / 8_000_000.0).round();
                info!(round = round + 1, megabytes_per_second, "throughput sample");
                Ok(SpeedSample {
                    round,
                    megabytes_per_second,
                    origin: SampleOrigin::Measured,
                })
            }
            None => {
                warn!(
                    round = round + 1,
                    "report lacks sender metric, recording zero sample"
                );
                Ok(SpeedSample {
                    round,
                    megabytes_per_second: 0.0,
                    origin: SampleOrigin::MissingMetric,
                })
            }
        }
    }
}

/// `end.streams[0].sender.bits_per_second` from the report.
pub fn sender_bits_per_second(report: &serde_json::Value) -> Option<f64> {
    report
        .get("end")?
        .get("streams")?
        .get(0)?
        .get("sender")?
        .get("bits_per_second")?
        .as_f64()
}
