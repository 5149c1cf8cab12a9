//! Tunnel lifecycle: bring the VPN up or down, verify reachability after up.
//!
//! The external tool owns the durable session state; this controller infers a
//! status per invocation from the tool's exit code and the probe result and
//! retains nothing between calls.

use crate::config::{ProbeConfig, VpnConfig};
use crate::error::{Error, Result};
use crate::probe::{self, ProbeOutcome};
use crate::process::{self, ProcessOutput};
use std::path::PathBuf;
use tracing::{info, warn};

/// Session state as inferred from one start/stop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpnSessionStatus {
    Down,
    Starting,
    Up,
    Verifying,
    Failed,
}

/// Result of a start attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Tunnel up and the probe answered
    Up { latency_ms: u64 },
    /// Tool reported success but the probe went unanswered: not a hard
    /// failure, but the start counts as unsuccessful
    Unreachable { detail: String },
    /// Tool exited non-zero; its stderr is passed through verbatim
    Failed { stderr: String },
}

impl StartOutcome {
    pub fn status(&self) -> VpnSessionStatus {
        match self {
            Self::Up { .. } => VpnSessionStatus::Up,
            Self::Unreachable { .. } => VpnSessionStatus::Verifying,
            Self::Failed { .. } => VpnSessionStatus::Failed,
        }
    }

    pub fn connected(&self) -> bool {
        matches!(self, Self::Up { .. })
    }
}

/// Result of a stop attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Down,
    Failed { stderr: String },
}

/// Drives the external tunnel tool.
pub struct VpnController {
    tool: PathBuf,
    tunnel_config: PathBuf,
    probe: ProbeConfig,
}

impl VpnController {
    pub fn new(vpn: &VpnConfig, probe: &ProbeConfig) -> Self {
        Self {
            tool: vpn.tool.clone(),
            tunnel_config: vpn.config.clone(),
            probe: probe.clone(),
        }
    }

    /// Brings the tunnel up and verifies reachability.
    ///
    /// The tunnel config must exist before the tool is invoked at all. No
    /// timeout is imposed on the tool itself, only on the probe that follows.
    pub async fn start(&self) -> Result<StartOutcome> {
        if !self.tunnel_config.exists() {
            return Err(Error::ConfigFileNotFound(self.tunnel_config.clone()));
        }

        info!(status = ?VpnSessionStatus::Starting, tool = %self.tool.display(), "bringing tunnel up");
        let output = self.invoke("up").await?;
        if !output.success {
            warn!(status = ?VpnSessionStatus::Failed, code = ?output.code, "tunnel start failed");
            return Ok(StartOutcome::Failed {
                stderr: output.stderr,
            });
        }

        info!(status = ?VpnSessionStatus::Verifying, target = %self.probe.target, "tunnel up, probing");
        match probe::probe(&self.probe).await {
            ProbeOutcome::Reachable { latency_ms } => {
                info!(status = ?VpnSessionStatus::Up, latency_ms, "tunnel verified");
                Ok(StartOutcome::Up { latency_ms })
            }
            ProbeOutcome::Unreachable { detail } => {
                warn!(%detail, "tunnel up but probe unanswered");
                Ok(StartOutcome::Unreachable { detail })
            }
        }
    }

    /// Tears the tunnel down.
    pub async fn stop(&self) -> Result<StopOutcome> {
        info!(tool = %self.tool.display(), "bringing tunnel down");
        let output = self.invoke("down").await?;
        if output.success {
            info!(status = ?VpnSessionStatus::Down, "tunnel down");
            Ok(StopOutcome::Down)
        } else {
            warn!(status = ?VpnSessionStatus::Failed, code = ?output.code, "tunnel stop failed");
            Ok(StopOutcome::Failed {
                stderr: output.stderr,
            })
        }
    }

    async fn invoke(&self, action: &str) -> Result<ProcessOutput> {
        let tool = self.tool.to_string_lossy();
        let tunnel_config = self.tunnel_config.to_string_lossy();
        process::run(tool.as_ref(), [action, tunnel_config.as_ref()]).await
    }
}
