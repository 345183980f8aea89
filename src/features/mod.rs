//! Per-nucleus acoustic features.
//!
//! Features form a closed set. A [`planner`] orders requested features so
//! their dependencies come first, and the [`extractor`] runs one stage per
//! feature, each returning an augmented copy of the [`FeatureTable`].

pub mod extractor;
pub mod planner;
pub mod table;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PromError, Result};

pub use extractor::{pitch_range_for, FeatureExtractor};
pub use planner::plan;
pub use table::FeatureTable;

/// Span the pitch excursion of a nucleus is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcursionLevel {
    Word,
    Ip,
}

impl fmt::Display for ExcursionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word => f.write_str("word"),
            Self::Ip => f.write_str("ip"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Estimated duration of the nucleus phone.
    Duration,
    /// Intensity at the nucleus time (dB).
    IntensityNucleus,
    /// Nucleus intensity relative to the mean of its intonation phrase.
    IntensityIp,
    /// F0 at the nucleus time (Hz).
    F0Nucleus,
    /// Highest F0 over the nucleus phone (Hz).
    F0Max,
    /// Semitones between `F0Max` and the lowest F0 of the enclosing span.
    Excursion(ExcursionLevel),
    /// RMS amplitude over the nucleus phone.
    Rms,
}

impl Feature {
    /// Features named by a config key; `excursion` expands to one feature
    /// per requested level.
    pub fn from_config_key(key: &str, levels: &[ExcursionLevel]) -> Result<Vec<Feature>> {
        let single = match key {
            "duration" => Self::Duration,
            "intensity_nuclei" => Self::IntensityNucleus,
            "intensity_ip" => Self::IntensityIp,
            "f0_nuclei" => Self::F0Nucleus,
            "f0_max" => Self::F0Max,
            "rms" => Self::Rms,
            "excursion" => {
                if levels.is_empty() {
                    return Err(PromError::config(
                        "feature 'excursion' needs features_input.excursion levels",
                    ));
                }
                return Ok(levels.iter().map(|&level| Self::Excursion(level)).collect());
            }
            other => return Err(PromError::config(format!("unknown feature '{other}'"))),
        };
        Ok(vec![single])
    }

    /// Output column holding this feature.
    pub fn column(self) -> String {
        match self {
            Self::Duration => "duration".to_string(),
            Self::IntensityNucleus => "intensity_nuclei".to_string(),
            Self::IntensityIp => "intensity_ip".to_string(),
            Self::F0Nucleus => "f0_nuclei".to_string(),
            Self::F0Max => "f0_max".to_string(),
            Self::Excursion(level) => format!("excursion_{level}"),
            Self::Rms => "rms".to_string(),
        }
    }

    /// Features whose columns must exist before this one is computed.
    pub fn dependencies(self) -> &'static [Feature] {
        match self {
            Self::IntensityIp => &[Self::IntensityNucleus],
            Self::Excursion(_) => &[Self::F0Max],
            _ => &[],
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column())
    }
}

/// Why a feature has no value for one nucleus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The nucleus lies outside every interval the feature needs.
    NoInterval,
    Unvoiced,
    /// The span is too short to measure.
    TooShort,
    Undefined,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoInterval => "no_interval",
            Self::Unvoiced => "unvoiced",
            Self::TooShort => "too_short",
            Self::Undefined => "undefined",
        };
        f.write_str(text)
    }
}

pub type FeatureValue = std::result::Result<f64, FailureReason>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_keys_map_to_features() {
        assert_eq!(
            Feature::from_config_key("f0_max", &[]).unwrap(),
            vec![Feature::F0Max]
        );
        assert_eq!(
            Feature::from_config_key("excursion", &[ExcursionLevel::Ip]).unwrap(),
            vec![Feature::Excursion(ExcursionLevel::Ip)]
        );
        assert!(matches!(
            Feature::from_config_key("excursion", &[]),
            Err(PromError::Config { .. })
        ));
        assert!(Feature::from_config_key("h1_h2", &[]).is_err());
    }

    #[test]
    fn columns_are_stable() {
        assert_eq!(Feature::Excursion(ExcursionLevel::Word).column(), "excursion_word");
        assert_eq!(Feature::IntensityNucleus.column(), "intensity_nuclei");
    }
}
