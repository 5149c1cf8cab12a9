//! Command orchestration.
//!
//! Composes location reading, geofence admission, tunnel lifecycle,
//! throughput sampling, and the transmission trigger per operator command.
//! Commands run strictly one at a time; the only durable state is the
//! tunnel's own, which lives in the external tool.

use crate::config::Config;
use crate::error::Result;
use crate::location::{FixOutcome, LocationReader, NoFixReason};
use crate::nmea::{self, Coordinate};
use crate::process;
use crate::stability::{self, StabilityVerdict};
use crate::throughput::{SpeedSample, ThroughputSampler};
use crate::vpn::{StartOutcome, StopOutcome, VpnController};
use chrono::{DateTime, Utc};
use tracing::info;

/// Operator commands, each independent and stateless across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartVpn,
    StopVpn,
    TestSpeed,
    SendData,
}

/// Geofence-gated start result.
#[derive(Debug, Clone, PartialEq)]
pub enum StartVpnOutcome {
    /// Location unknown, treated as "not admitted" and never as in-bounds;
    /// the tunnel is untouched
    NoFix(NoFixReason),
    /// Fix obtained but outside the admission area; tunnel untouched
    OutsideGeofence { position: Coordinate },
    /// Fix inside the area; tunnel start attempted
    Tunnel {
        position: Coordinate,
        outcome: StartOutcome,
    },
}

/// Data-transmission trigger result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipOutcome {
    Sent { stdout: String },
    Failed { code: Option<i32>, stderr: String },
}

/// One complete speed-test run.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedReport {
    pub taken_at: DateTime<Utc>,
    pub samples: Vec<SpeedSample>,
    pub verdict: StabilityVerdict,
    /// Present only when the verdict was stable and the shipper ran
    pub shipped: Option<ShipOutcome>,
}

/// Structured result of one dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    VpnStart(StartVpnOutcome),
    VpnStop(StopOutcome),
    SpeedTest(SpeedReport),
    DataSend(ShipOutcome),
}

/// Ties the components together. Holds only the loaded configuration.
pub struct SessionOrchestrator {
    config: Config,
}

impl SessionOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one command to completion and returns its structured outcome.
    ///
    /// Presentation is the caller's concern; nothing here prints. Failures
    /// abort this command only.
    pub async fn dispatch(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::StartVpn => Ok(CommandOutcome::VpnStart(self.start_vpn().await?)),
            Command::StopVpn => Ok(CommandOutcome::VpnStop(self.controller().stop().await?)),
            Command::TestSpeed => Ok(CommandOutcome::SpeedTest(self.test_speed().await?)),
            Command::SendData => Ok(CommandOutcome::DataSend(self.send_data().await?)),
        }
    }

    async fn start_vpn(&self) -> Result<StartVpnOutcome> {
        let reader = LocationReader::new(&self.config.gps);
        let position = match reader.read_fix().await {
            FixOutcome::Fix(position) => position,
            FixOutcome::NoFix(reason) => {
                info!(%reason, "no fix, tunnel not started");
                return Ok(StartVpnOutcome::NoFix(reason));
            }
        };

        if !self.config.geofence.contains(&position) {
            info!(
                latitude = nmea::rounded(position.latitude),
                longitude = nmea::rounded(position.longitude),
                "outside admission area, tunnel not started"
            );
            return Ok(StartVpnOutcome::OutsideGeofence { position });
        }

        let outcome = self.controller().start().await?;
        Ok(StartVpnOutcome::Tunnel { position, outcome })
    }

    async fn test_speed(&self) -> Result<SpeedReport> {
        let sampler = ThroughputSampler::new(&self.config.speedtest);
        let samples = sampler.collect().await?;
        let verdict = stability::evaluate(&samples, self.config.speedtest.min_average_mbps);

        let shipped = if verdict.stable {
            info!(average = verdict.average, "link stable, triggering transmission");
            Some(self.send_data().await?)
        } else {
            None
        };

        Ok(SpeedReport {
            taken_at: Utc::now(),
            samples,
            verdict,
            shipped,
        })
    }

    async fn send_data(&self) -> Result<ShipOutcome> {
        let shipper = &self.config.shipper;
        let output = process::run(&shipper.program, &shipper.args).await?;
        if output.success {
            Ok(ShipOutcome::Sent {
                stdout: output.stdout,
            })
        } else {
            Ok(ShipOutcome::Failed {
                code: output.code,
                stderr: output.stderr,
            })
        }
    }

    fn controller(&self) -> VpnController {
        VpnController::new(&self.config.vpn, &self.config.probe)
    }
}
