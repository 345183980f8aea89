use serde::Serialize;

use crate::audio::IntensityContour;
use crate::error::Result;

/// Quantile used as the robust peak level of a recording.
pub const PEAK_QUANTILE: f64 = 0.99;

/// Whole-recording level summary the thresholds are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalStatistics {
    pub minimum: f64,
    pub maximum: f64,
    pub p99: f64,
}

impl SignalStatistics {
    pub fn of(contour: &IntensityContour) -> Result<Self> {
        Ok(Self {
            minimum: contour.minimum()?,
            maximum: contour.maximum()?,
            p99: contour.quantile(PEAK_QUANTILE)?,
        })
    }
}
