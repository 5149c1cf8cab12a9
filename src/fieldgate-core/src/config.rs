//! Runtime configuration.
//!
//! Loaded once at startup from a JSON file and handed by reference into each
//! component; there is no ambient global. An unreadable or invalid file is a
//! fatal startup condition; every later failure is local to the command
//! that hit it.

use crate::geofence::GeofenceBounds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tunnel tool and tunnel config
    pub vpn: VpnConfig,
    /// Location source socket
    pub gps: GpsConfig,
    /// Admission boundary
    pub geofence: GeofenceBounds,
    /// Post-activation reachability probe
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Throughput sampling and stability thresholds
    #[serde(default)]
    pub speedtest: SpeedtestConfig,
    /// Downstream data-transmission program
    #[serde(default)]
    pub shipper: ShipperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnConfig {
    /// Tunnel control executable (`wg-quick` or compatible)
    pub tool: PathBuf,
    /// Tunnel configuration file passed to `up` / `down`
    pub config: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsConfig {
    pub host: String,
    pub port: u16,
    /// Overall deadline for connect + first fix
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_program")]
    pub program: String,
    #[serde(default = "default_probe_target")]
    pub target: String,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            program: default_probe_program(),
            target: default_probe_target(),
            timeout_secs: default_probe_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedtestConfig {
    #[serde(default = "default_speedtest_program")]
    pub program: String,
    #[serde(default = "default_speedtest_host")]
    pub host: String,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    /// Spacing between rounds, not a retry backoff
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Hard kill-timeout per round
    #[serde(default = "default_round_timeout")]
    pub round_timeout_secs: u64,
    /// Minimum acceptable mean throughput in MB/s
    #[serde(default = "default_min_average")]
    pub min_average_mbps: f64,
}

impl Default for SpeedtestConfig {
    fn default() -> Self {
        Self {
            program: default_speedtest_program(),
            host: default_speedtest_host(),
            rounds: default_rounds(),
            interval_secs: default_interval(),
            round_timeout_secs: default_round_timeout(),
            min_average_mbps: default_min_average(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipperConfig {
    #[serde(default = "default_shipper_program")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            program: default_shipper_program(),
            args: Vec::new(),
        }
    }
}

impl Config {
    /// Reads and validates the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.geofence.validate()?;
        anyhow::ensure!(
            self.speedtest.rounds > 0,
            "speedtest rounds must be at least 1"
        );
        anyhow::ensure!(
            self.speedtest.min_average_mbps >= 0.0,
            "speedtest min_average_mbps must be non-negative"
        );
        Ok(())
    }
}

fn default_read_timeout() -> u64 {
    10
}

fn default_probe_program() -> String {
    "ping".into()
}

fn default_probe_target() -> String {
    "8.8.8.8".into()
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_speedtest_program() -> String {
    "iperf3".into()
}

fn default_speedtest_host() -> String {
    "192.168.20.63".into()
}

fn default_rounds() -> usize {
    5
}

fn default_interval() -> u64 {
    10
}

fn default_round_timeout() -> u64 {
    5
}

fn default_min_average() -> f64 {
    20.0
}

fn default_shipper_program() -> String {
    "fieldgate-ship".into()
}
