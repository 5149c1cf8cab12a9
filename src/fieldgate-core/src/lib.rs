//! # fieldgate-core
//!
//! Location-gated VPN session management for field devices:
//! - NMEA sentence parsing and geofence admission
//! - Tunnel lifecycle (start / verify / stop) over an external tool
//! - Link throughput sampling and stability judgment
//! - Conditional data-transmission trigger
//!
//! The crate is UI-free: every operation returns a structured outcome and
//! the front-end decides how to render it.

/// Runtime configuration, loaded once at startup
pub mod config;
/// Error taxonomy shared by all components
pub mod error;
/// Rectangular admission boundary
pub mod geofence;
/// First-fix acquisition from a line-oriented source
pub mod location;
/// NMEA sentence parsing and coordinate conversion
pub mod nmea;
/// Post-activation reachability probe
pub mod probe;
/// Captured-output subprocess execution
pub mod process;
/// Per-command orchestration
pub mod session;
/// Stability judgment over a sample run
pub mod stability;
/// Throughput sampling via an external test program
pub mod throughput;
/// Tunnel lifecycle controller
pub mod vpn;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{Command, CommandOutcome, SessionOrchestrator};
