use std::path::Path;

use tracing::debug;

use super::candidates::{find_peak_candidates, PeakCandidate};
use super::dips::validate_dips;
use super::sounding::SoundingSegmentation;
use super::statistics::SignalStatistics;
use super::thresholds::{ThresholdPolicy, Thresholds};
use super::Detection;
use crate::audio::{AcousticEngine, IntensityContour, NativeEngine, PitchRange};
use crate::config::DetectionConfig;
use crate::error::{PromError, Result};
use crate::types::Waveform;

/// Steps of one detection run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStage {
    Raw,
    Denoised,
    IntensityComputed,
    ThresholdsComputed,
    CandidatesFound,
    Validated,
}

/// Finds syllable nuclei in a recording.
#[derive(Debug, Clone)]
pub struct NucleusDetector<E = NativeEngine> {
    engine: E,
    config: DetectionConfig,
}

impl NucleusDetector<NativeEngine> {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        Self::with_engine(NativeEngine, config)
    }
}

impl<E: AcousticEngine> NucleusDetector<E> {
    pub fn with_engine(engine: E, config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn detect_file(&self, path: &Path) -> Result<Detection> {
        let audio = self.engine.load(path)?;
        self.detect(&audio)
    }

    pub fn denoise(&self, audio: &Waveform) -> Result<Waveform> {
        self.engine.denoise(audio, &self.config.denoise)
    }

    pub fn detect(&self, audio: &Waveform) -> Result<Detection> {
        log_stage(DetectionStage::Raw, audio.samples.len());
        let denoised = self.denoise(audio)?;
        self.detect_denoised(audio, &denoised)
    }

    /// Runs detection on an already denoised copy of `original`.
    ///
    /// `original` is only consulted for the voicing check.
    pub fn detect_denoised(&self, original: &Waveform, denoised: &Waveform) -> Result<Detection> {
        log_stage(DetectionStage::Denoised, denoised.samples.len());

        let contour = self
            .engine
            .intensity(denoised, self.config.intensity_min_pitch_hz)?;
        log_stage(DetectionStage::IntensityComputed, contour.len());

        let statistics = SignalStatistics::of(&contour)?;
        let thresholds = ThresholdPolicy::from_config(&self.config).derive(&statistics);
        debug!(
            stage = ?DetectionStage::ThresholdsComputed,
            minimum = statistics.minimum,
            maximum = statistics.maximum,
            p99 = statistics.p99,
            peak_db = thresholds.peak_db,
            "derived thresholds"
        );

        let candidates = find_peak_candidates(&contour, thresholds.peak_db);
        log_stage(DetectionStage::CandidatesFound, candidates.len());
        if candidates.is_empty() {
            return Err(PromError::EmptySignal {
                threshold_db: thresholds.peak_db,
            });
        }

        let mut nuclei = validate_dips(
            &contour,
            &candidates,
            thresholds.min_dip_db,
            self.config.dip_policy,
        );
        if self.config.voicing_check {
            nuclei = self.voiced_only(original, &contour, &statistics, &thresholds, nuclei)?;
        }
        log_stage(DetectionStage::Validated, nuclei.len());

        Ok(Detection {
            statistics,
            thresholds,
            candidates,
            nuclei,
        })
    }

    fn voiced_only(
        &self,
        original: &Waveform,
        contour: &IntensityContour,
        statistics: &SignalStatistics,
        thresholds: &Thresholds,
        nuclei: Vec<PeakCandidate>,
    ) -> Result<Vec<PeakCandidate>> {
        let segmentation = SoundingSegmentation::from_contour(
            contour,
            thresholds.sounding_level(statistics),
            self.config.min_pause_s,
            self.config.min_sounding_s,
        );
        let pitch = self.engine.pitch(
            original,
            PitchRange::new(self.config.pitch_floor_hz, self.config.pitch_ceiling_hz),
        )?;
        let before = nuclei.len();
        let voiced: Vec<_> = nuclei
            .into_iter()
            .filter(|peak| segmentation.is_sounding(peak.time) && pitch.value_at(peak.time).is_some())
            .collect();
        debug!(before, after = voiced.len(), "applied voicing check");
        Ok(voiced)
    }
}

fn log_stage(stage: DetectionStage, size: usize) {
    debug!(stage = ?stage, size, "detection stage");
}
