//! Syllable nucleus detection: statistics, thresholds, peak candidates and
//! dip validation over an intensity contour.

pub mod candidates;
pub mod detector;
pub mod dips;
pub mod sounding;
pub mod statistics;
pub mod thresholds;

use serde::Serialize;

pub use candidates::{find_peak_candidates, PeakCandidate};
pub use detector::{DetectionStage, NucleusDetector};
pub use dips::validate_dips;
pub use sounding::{SegmentKind, SoundingSegmentation};
pub use statistics::SignalStatistics;
pub use thresholds::{ThresholdPolicy, Thresholds};

/// Outcome of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub statistics: SignalStatistics,
    pub thresholds: Thresholds,
    pub candidates: Vec<PeakCandidate>,
    /// Validated candidates, a subset of `candidates`.
    pub nuclei: Vec<PeakCandidate>,
}

impl Detection {
    /// Nucleus times in seconds.
    pub fn times(&self) -> Vec<f64> {
        self.nuclei.iter().map(|n| n.time).collect()
    }
}
