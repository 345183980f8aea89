use serde::Serialize;

use super::statistics::SignalStatistics;
use crate::config::DetectionConfig;

/// Levels derived from one recording's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// Candidates must exceed this level (dB).
    pub peak_db: f64,
    pub min_dip_db: f64,
    /// Distance between the maximum and the 99th percentile.
    pub threshold2: f64,
    /// Silence level relative to the maximum, for the sounding segmentation.
    pub threshold3: f64,
}

impl Thresholds {
    /// Absolute level separating silent from sounding frames.
    pub fn sounding_level(&self, stats: &SignalStatistics) -> f64 {
        stats.maximum + self.threshold3
    }
}

/// Derives thresholds relative to a recording's own level distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub silence_threshold_db: f64,
    pub min_dip_db: f64,
}

impl ThresholdPolicy {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            silence_threshold_db: config.silence_threshold_db,
            min_dip_db: config.min_dip_db,
        }
    }

    pub fn derive(&self, stats: &SignalStatistics) -> Thresholds {
        // never below the observed noise floor
        let peak_db = (stats.p99 + self.silence_threshold_db).max(stats.minimum);
        let threshold2 = stats.maximum - stats.p99;
        Thresholds {
            peak_db,
            min_dip_db: self.min_dip_db,
            threshold2,
            threshold3: self.silence_threshold_db - threshold2,
        }
    }
}
