use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::annotations::{LabelInventory, StartPolicy};
use crate::error::{PromError, Result};
use crate::features::{ExcursionLevel, Feature};

/// Which neighbours a peak must be separated from by a dip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DipPolicy {
    /// Dip to the following peak, or failing that to the preceding one.
    #[default]
    #[serde(alias = "one_sided", alias = "either")]
    EitherSide,
    /// Dips on both sides are required.
    #[serde(alias = "two_sided", alias = "both")]
    BothSides,
}

impl FromStr for DipPolicy {
    type Err = PromError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "either" | "either_side" | "one_sided" => Ok(Self::EitherSide),
            "both" | "both_sides" | "two_sided" => Ok(Self::BothSides),
            other => Err(PromError::config(format!(
                "unknown dip policy '{other}' (expected 'either' or 'both')"
            ))),
        }
    }
}

impl fmt::Display for DipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EitherSide => write!(f, "either"),
            Self::BothSides => write!(f, "both"),
        }
    }
}

/// Spectral subtraction parameters applied before intensity extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParams {
    pub window_s: f64,
    pub band_low_hz: f64,
    pub band_high_hz: f64,
    pub smoothing_hz: f64,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            window_s: 0.025,
            band_low_hz: 50.0,
            band_high_hz: 10_000.0,
            smoothing_hz: 40.0,
        }
    }
}

/// Tuning constants of the nucleus detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Peak threshold relative to the 99th intensity percentile (dB).
    pub silence_threshold_db: f64,
    pub min_dip_db: f64,
    /// Silent stretches shorter than this count as sounding.
    pub min_pause_s: f64,
    pub min_sounding_s: f64,
    pub intensity_min_pitch_hz: f64,
    pub dip_policy: DipPolicy,
    pub denoise: DenoiseParams,
    pub voicing_check: bool,
    pub pitch_floor_hz: f64,
    pub pitch_ceiling_hz: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: -25.0,
            min_dip_db: 2.0,
            min_pause_s: 0.3,
            min_sounding_s: 0.1,
            intensity_min_pitch_hz: 50.0,
            dip_policy: DipPolicy::EitherSide,
            denoise: DenoiseParams::default(),
            voicing_check: false,
            pitch_floor_hz: 75.0,
            pitch_ceiling_hz: 500.0,
        }
    }
}

impl DetectionConfig {
    pub fn with_dip_policy(mut self, policy: DipPolicy) -> Self {
        self.dip_policy = policy;
        self
    }

    pub fn with_voicing_check(mut self, enabled: bool) -> Self {
        self.voicing_check = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("silence_threshold_db", self.silence_threshold_db)?;
        ensure_non_negative("min_dip_db", self.min_dip_db)?;
        ensure_non_negative("min_pause_s", self.min_pause_s)?;
        ensure_non_negative("min_sounding_s", self.min_sounding_s)?;
        ensure_positive("intensity_min_pitch_hz", self.intensity_min_pitch_hz)?;
        ensure_positive("denoise.window_s", self.denoise.window_s)?;
        ensure_non_negative("denoise.band_low_hz", self.denoise.band_low_hz)?;
        ensure_non_negative("denoise.smoothing_hz", self.denoise.smoothing_hz)?;
        if self.denoise.band_high_hz <= self.denoise.band_low_hz {
            return Err(PromError::config(format!(
                "denoise band must be increasing, got {}..{} Hz",
                self.denoise.band_low_hz, self.denoise.band_high_hz
            )));
        }
        ensure_positive("pitch_floor_hz", self.pitch_floor_hz)?;
        if self.pitch_ceiling_hz <= self.pitch_floor_hz {
            return Err(PromError::config(format!(
                "pitch ceiling ({}) must exceed pitch floor ({})",
                self.pitch_ceiling_hz, self.pitch_floor_hz
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Extra inputs for parameterised features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesInput {
    pub excursion: Vec<ExcursionLevel>,
}

/// Corpus-level run configuration, read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding `<recording>.wav` and its annotation files.
    pub directory: PathBuf,
    #[serde(default = "default_true")]
    pub find_nuclei: bool,
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    #[serde(default)]
    pub features_input: FeaturesInput,
    #[serde(default)]
    pub speakers_file: Option<PathBuf>,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub labels: LabelInventory,
    #[serde(default)]
    pub start_policy: StartPolicy,
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            find_nuclei: true,
            features: BTreeMap::new(),
            features_input: FeaturesInput::default(),
            speakers_file: None,
            detection: DetectionConfig::default(),
            labels: LabelInventory::default(),
            start_policy: StartPolicy::default(),
            output_format: OutputFormat::default(),
        }
    }

    /// Loads a JSON config; relative paths resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| PromError::io("reading pipeline config", path, err))?;
        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|err| PromError::config(format!("{}: {err}", path.display())))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.directory = resolve_dir(base, &config.directory)?;
        if let Some(speakers) = config.speakers_file.take() {
            config.speakers_file = Some(if speakers.is_relative() {
                base.join(speakers)
            } else {
                speakers
            });
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.start_policy.validate()?;
        self.requested_features()?;
        Ok(())
    }

    /// Features switched on in the `features` map, in alphabetical key order.
    ///
    /// Output columns follow this order, whatever order the file lists them in.
    pub fn requested_features(&self) -> Result<Vec<Feature>> {
        let mut requested = Vec::new();
        for (key, enabled) in &self.features {
            if !enabled {
                continue;
            }
            requested.extend(Feature::from_config_key(key, &self.features_input.excursion)?);
        }
        Ok(requested)
    }
}

fn resolve_dir(base: &Path, dir: &Path) -> Result<PathBuf> {
    let joined = if dir.is_relative() {
        base.join(dir)
    } else {
        dir.to_path_buf()
    };
    let canonical = joined
        .canonicalize()
        .map_err(|err| PromError::io("resolving corpus directory", &joined, err))?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(PromError::config(format!(
            "corpus path {} is not a directory",
            canonical.display()
        )))
    }
}

fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PromError::config(format!("{name} must be finite, got {value}")))
    }
}

fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value < 0.0 {
        return Err(PromError::config(format!("{name} must be >= 0, got {value}")));
    }
    Ok(())
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value <= 0.0 {
        return Err(PromError::config(format!("{name} must be > 0, got {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = DetectionConfig::default();
        assert_eq!(config.silence_threshold_db, -25.0);
        assert_eq!(config.min_dip_db, 2.0);
        assert_eq!(config.min_pause_s, 0.3);
        assert_eq!(config.dip_policy, DipPolicy::EitherSide);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_denoise_band() {
        let mut config = DetectionConfig::default();
        config.denoise.band_low_hz = 12_000.0;
        assert!(matches!(config.validate(), Err(PromError::Config { .. })));
    }

    #[test]
    fn parses_dip_policy_aliases() {
        assert_eq!("both".parse::<DipPolicy>().unwrap(), DipPolicy::BothSides);
        assert_eq!("one_sided".parse::<DipPolicy>().unwrap(), DipPolicy::EitherSide);
        assert!("sideways".parse::<DipPolicy>().is_err());
    }

    #[test]
    fn requested_features_follow_key_order() {
        let mut config = PipelineConfig::new(".");
        for key in ["rms", "duration", "intensity_ip", "f0_max"] {
            config.features.insert(key.to_string(), true);
        }
        config.features.insert("f0_nuclei".to_string(), false);
        assert_eq!(
            config.requested_features().unwrap(),
            vec![Feature::Duration, Feature::F0Max, Feature::IntensityIp, Feature::Rms]
        );
    }

    #[test]
    fn loads_json_with_relative_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("corpus")).unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "directory": "corpus",
                "find_nuclei": true,
                "features": {"intensity_nuclei": true, "excursion": true, "rms": false},
                "features_input": {"excursion": ["word", "ip"]},
                "detection": {"dip_policy": "two_sided", "min_dip_db": 3.0}
            }"#,
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert!(config.directory.ends_with("corpus"));
        assert_eq!(config.detection.dip_policy, DipPolicy::BothSides);
        assert_eq!(config.detection.min_dip_db, 3.0);
        assert_eq!(config.detection.silence_threshold_db, -25.0);
        let features = config.requested_features().unwrap();
        assert_eq!(
            features,
            vec![
                Feature::Excursion(ExcursionLevel::Word),
                Feature::Excursion(ExcursionLevel::Ip),
                Feature::IntensityNucleus,
            ]
        );
    }

    #[test]
    fn unknown_feature_key_is_a_config_error() {
        let mut config = PipelineConfig::new(".");
        config.features.insert("h1_h2".to_string(), true);
        assert!(matches!(
            config.requested_features(),
            Err(PromError::Config { .. })
        ));
    }
}
