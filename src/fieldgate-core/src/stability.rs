//! Stability judgment over a completed sample run.

use crate::throughput::{SampleOrigin, SpeedSample};
use serde::Serialize;
use std::fmt;

/// Why a run was ruled unstable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InstabilityReason {
    /// A sample fell outside the ±20% band around the mean. `measured` is
    /// false when the offending sample was a missing-metric zero, so a
    /// measurement error is not mistaken for genuinely poor throughput.
    Deviation {
        round: usize,
        value: f64,
        mean: f64,
        measured: bool,
    },
    /// The mean itself missed the minimum acceptable throughput
    BelowFloor { mean: f64, floor: f64 },
    /// No samples to judge
    Empty,
}

impl fmt::Display for InstabilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deviation {
                round,
                value,
                mean,
                measured,
            } => {
                write!(
                    f,
                    "sample {} at {value} MB/s is outside ±20% of the {mean:.1} MB/s mean",
                    round + 1
                )?;
                if !measured {
                    write!(f, " (metric missing, recorded as zero)")?;
                }
                Ok(())
            }
            Self::BelowFloor { mean, floor } => {
                write!(f, "mean {mean:.1} MB/s is below the {floor} MB/s minimum")
            }
            Self::Empty => write!(f, "no samples were collected"),
        }
    }
}

/// Pass/fail ruling over one sample series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityVerdict {
    pub stable: bool,
    pub average: f64,
    pub reason: Option<InstabilityReason>,
}

/// All-or-nothing judgment: stable iff every sample lies within ±20% of the
/// arithmetic mean and the mean meets the floor. The first offending sample
/// is reported; a floor shortfall is only reported when no sample deviates.
pub fn evaluate(samples: &[SpeedSample], floor: f64) -> StabilityVerdict {
    if samples.is_empty() {
        return StabilityVerdict {
            stable: false,
            average: 0.0,
            reason: Some(InstabilityReason::Empty),
        };
    }

    let mean = samples
        .iter()
        .map(|s| s.megabytes_per_second)
        .sum::<f64>()
        / samples.len() as f64;
    let low = mean * 0.8;
    let high = mean * 1.2;

    for sample in samples {
        if sample.megabytes_per_second < low || sample.megabytes_per_second > high {
            return StabilityVerdict {
                stable: false,
                average: mean,
                reason: Some(InstabilityReason::Deviation {
                    round: sample.round,
                    value: sample.megabytes_per_second,
                    mean,
                    measured: sample.origin == SampleOrigin::Measured,
                }),
            };
        }
    }

    if mean < floor {
        return StabilityVerdict {
            stable: false,
            average: mean,
            reason: Some(InstabilityReason::BelowFloor { mean, floor }),
        };
    }

    StabilityVerdict {
        stable: true,
        average: mean,
        reason: None,
    }
}
