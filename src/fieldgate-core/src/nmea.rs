//! NMEA sentence parsing and degrees/minutes conversion.
//!
//! GPS units emit comma-delimited ASCII sentences; the two position-bearing
//! types recognized here are `$GPGGA` (fix data) and `$GPRMC` (recommended
//! minimum). Latitude/longitude arrive as `ddmm.mmmm` / `dddmm.mmmm` tokens
//! with a separate hemisphere letter and are converted to signed decimal
//! degrees.

use crate::error::{Error, Result};
use serde::Serialize;

/// A position in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Returns `None` when either value is outside the legal range
    /// (latitude ±90, longitude ±180).
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
            Some(Self {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }
}

/// Hemisphere letter accompanying an NMEA coordinate token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "N" => Some(Self::North),
            "S" => Some(Self::South),
            "E" => Some(Self::East),
            "W" => Some(Self::West),
            _ => None,
        }
    }

    /// Latitude tokens carry two degree digits, longitude tokens three.
    fn degree_digits(self) -> usize {
        match self {
            Self::North | Self::South => 2,
            Self::East | Self::West => 3,
        }
    }

    fn sign(self) -> f64 {
        match self {
            Self::North | Self::East => 1.0,
            Self::South | Self::West => -1.0,
        }
    }
}

/// Converts a raw NMEA degrees/minutes token into signed decimal degrees.
///
/// The degree prefix length is dictated by the hemisphere; the remainder of
/// the token is decimal minutes. `5230.1234` with [`Hemisphere::North`]
/// becomes `52.502057`.
pub fn to_decimal_degrees(token: &str, hemisphere: Hemisphere) -> Result<f64> {
    let prefix = hemisphere.degree_digits();
    if !token.is_ascii() || token.len() <= prefix {
        return Err(Error::CoordinateParse(token.to_string()));
    }
    let (deg, min) = token.split_at(prefix);
    let degrees: f64 = deg
        .parse()
        .map_err(|_| Error::CoordinateParse(token.to_string()))?;
    let minutes: f64 = min
        .parse()
        .map_err(|_| Error::CoordinateParse(token.to_string()))?;
    Ok(hemisphere.sign() * (degrees + minutes / 60.0))
}

/// Extracts a coordinate from a single sentence, if it is one of the
/// recognized types and all four position fields convert.
///
/// Field layout is fixed per sentence type: `$GPGGA` carries latitude at
/// field 2 and longitude at field 4, `$GPRMC` at fields 3 and 5; the
/// hemisphere letter immediately follows each value.
pub fn parse_sentence(line: &str) -> Option<Coordinate> {
    let lat_index = if line.starts_with("$GPGGA") {
        2
    } else if line.starts_with("$GPRMC") {
        3
    } else {
        return None;
    };
    let fields: Vec<&str> = line.split(',').collect();

    let latitude = convert_field(&fields, lat_index)?;
    let longitude = convert_field(&fields, lat_index + 2)?;
    Coordinate::new(latitude, longitude)
}

fn convert_field(fields: &[&str], index: usize) -> Option<f64> {
    let hemisphere = Hemisphere::parse(fields.get(index + 1)?)?;
    to_decimal_degrees(fields.get(index)?, hemisphere).ok()
}

/// Rounds a decimal-degree value to the 6-decimal display precision.
///
/// Display-only: the geofence compares unrounded values so points near an
/// edge are not shifted across it by formatting.
pub fn rounded(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
