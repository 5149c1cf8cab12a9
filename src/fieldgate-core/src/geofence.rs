//! Rectangular geofence admission check.

use crate::nmea::Coordinate;
use serde::{Deserialize, Serialize};

/// Admission boundary in decimal degrees, all edges inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeofenceBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeofenceBounds {
    /// Whether the coordinate lies inside the boundary, edges included.
    pub fn contains(&self, position: &Coordinate) -> bool {
        position.latitude >= self.min_lat
            && position.latitude <= self.max_lat
            && position.longitude >= self.min_lon
            && position.longitude <= self.max_lon
    }

    /// Checks edge ordering and legal coordinate ranges.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.min_lat <= self.max_lat,
            "geofence min_lat {} exceeds max_lat {}",
            self.min_lat,
            self.max_lat
        );
        anyhow::ensure!(
            self.min_lon <= self.max_lon,
            "geofence min_lon {} exceeds max_lon {}",
            self.min_lon,
            self.max_lon
        );
        anyhow::ensure!(
            self.min_lat >= -90.0 && self.max_lat <= 90.0,
            "geofence latitude outside [-90, 90]"
        );
        anyhow::ensure!(
            self.min_lon >= -180.0 && self.max_lon <= 180.0,
            "geofence longitude outside [-180, 180]"
        );
        Ok(())
    }
}
