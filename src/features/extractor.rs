use once_cell::unsync::OnceCell;
use tracing::debug;

use super::planner::plan;
use super::table::FeatureTable;
use super::{ExcursionLevel, FailureReason, Feature, FeatureValue};
use crate::alignment::AlignedNucleus;
use crate::annotations::Gender;
use crate::audio::{AcousticEngine, IntensityContour, Interpolation, PitchContour, PitchRange};
use crate::error::Result;
use crate::types::Waveform;

/// F0 search range for a speaker.
pub fn pitch_range_for(gender: Gender) -> PitchRange {
    match gender {
        Gender::Female => PitchRange::new(75.0, 500.0),
        Gender::Male => PitchRange::new(50.0, 300.0),
    }
}

/// Computes feature columns from the unprocessed recording.
///
/// Intensity and pitch contours are computed on first use and shared by all
/// later stages.
pub struct FeatureExtractor<'a, E> {
    engine: &'a E,
    audio: &'a Waveform,
    pitch_range: PitchRange,
    intensity_min_pitch_hz: f64,
    intensity: OnceCell<IntensityContour>,
    pitch: OnceCell<PitchContour>,
}

impl<'a, E: AcousticEngine> FeatureExtractor<'a, E> {
    pub fn new(
        engine: &'a E,
        audio: &'a Waveform,
        pitch_range: PitchRange,
        intensity_min_pitch_hz: f64,
    ) -> Self {
        Self {
            engine,
            audio,
            pitch_range,
            intensity_min_pitch_hz,
            intensity: OnceCell::new(),
            pitch: OnceCell::new(),
        }
    }

    /// Runs the requested features, plus their dependencies, in order.
    pub fn run(&self, table: &FeatureTable, requested: &[Feature]) -> Result<FeatureTable> {
        let mut current = table.clone();
        for feature in plan(requested) {
            current = self.stage(&current, feature)?;
        }
        Ok(current)
    }

    /// Adds one feature column; its dependencies must already be present.
    pub fn stage(&self, table: &FeatureTable, feature: Feature) -> Result<FeatureTable> {
        for dependency in feature.dependencies() {
            table.require(&dependency.column())?;
        }
        let nuclei = table.nuclei();
        let values: Vec<FeatureValue> = match feature {
            Feature::Duration => nuclei
                .iter()
                .map(|n| n.duration_est.ok_or(FailureReason::NoInterval))
                .collect(),
            Feature::IntensityNucleus => {
                let contour = self.intensity()?;
                nuclei
                    .iter()
                    .map(|n| {
                        contour
                            .value_at(n.time, Interpolation::Cubic)
                            .ok_or(FailureReason::Undefined)
                    })
                    .collect()
            }
            Feature::IntensityIp => {
                let contour = self.intensity()?;
                let at_nucleus = table.require(&Feature::IntensityNucleus.column())?;
                nuclei
                    .iter()
                    .zip(at_nucleus)
                    .map(|(n, &level)| {
                        let level = level?;
                        let (start, end) = span(n.ip_start, n.ip_end)?;
                        let mean = contour.mean_in(start, end).ok_or(FailureReason::TooShort)?;
                        Ok(level - mean)
                    })
                    .collect()
            }
            Feature::F0Nucleus => {
                let pitch = self.pitch()?;
                nuclei
                    .iter()
                    .map(|n| pitch.value_at(n.time).ok_or(FailureReason::Unvoiced))
                    .collect()
            }
            Feature::F0Max => {
                let pitch = self.pitch()?;
                nuclei
                    .iter()
                    .map(|n| {
                        let (start, end) = phone_span(n)?;
                        pitch.maximum_in(start, end).ok_or(FailureReason::Unvoiced)
                    })
                    .collect()
            }
            Feature::Excursion(level) => {
                let pitch = self.pitch()?;
                let f0_max = table.require(&Feature::F0Max.column())?;
                nuclei
                    .iter()
                    .zip(f0_max)
                    .map(|(n, &peak)| excursion(pitch, n, peak?, level))
                    .collect()
            }
            Feature::Rms => nuclei
                .iter()
                .map(|n| {
                    let (start, end) = phone_span(n)?;
                    self.audio.rms(start, end).ok_or(FailureReason::TooShort)
                })
                .collect(),
        };

        let missing = values.iter().filter(|v| v.is_err()).count();
        debug!(feature = %feature, nuclei = values.len(), missing, "extracted feature");
        table.with_column(feature.column(), values)
    }

    fn intensity(&self) -> Result<&IntensityContour> {
        self.intensity
            .get_or_try_init(|| self.engine.intensity(self.audio, self.intensity_min_pitch_hz))
    }

    fn pitch(&self) -> Result<&PitchContour> {
        self.pitch
            .get_or_try_init(|| self.engine.pitch(self.audio, self.pitch_range))
    }
}

/// Semitones from the lowest F0 of the enclosing span up to `peak`.
fn excursion(
    pitch: &PitchContour,
    nucleus: &AlignedNucleus,
    peak: f64,
    level: ExcursionLevel,
) -> FeatureValue {
    let (start, end) = match level {
        ExcursionLevel::Word => span(nucleus.word_start, nucleus.word_end)?,
        ExcursionLevel::Ip => span(nucleus.ip_start, nucleus.ip_end)?,
    };
    let low = pitch.minimum_in(start, end).ok_or(FailureReason::Unvoiced)?;
    if low <= 0.0 || peak <= 0.0 {
        return Err(FailureReason::Undefined);
    }
    Ok(12.0 * (peak / low).log2())
}

fn phone_span(nucleus: &AlignedNucleus) -> Span {
    span(nucleus.start_est, nucleus.end)
}

type Span = std::result::Result<(f64, f64), FailureReason>;

fn span(start: Option<f64>, end: Option<f64>) -> Span {
    match (start, end) {
        (Some(start), Some(end)) if end > start => Ok((start, end)),
        (Some(_), Some(_)) => Err(FailureReason::TooShort),
        _ => Err(FailureReason::NoInterval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DenoiseParams;
    use crate::error::PromError;
    use approx::assert_abs_diff_eq;

    struct StubEngine;

    impl AcousticEngine for StubEngine {
        fn denoise(&self, audio: &Waveform, _params: &DenoiseParams) -> Result<Waveform> {
            Ok(audio.clone())
        }

        fn intensity(&self, _audio: &Waveform, _min_pitch_hz: f64) -> Result<IntensityContour> {
            let values = (0..200).map(|i| 50.0 + 0.1 * i as f64).collect();
            IntensityContour::from_values(0.0, 0.01, values)
        }

        fn pitch(&self, _audio: &Waveform, _range: PitchRange) -> Result<PitchContour> {
            let values = (0..200)
                .map(|i| match i {
                    0..=39 => Some(100.0),
                    150..=159 => None,
                    _ => Some(200.0),
                })
                .collect();
            PitchContour::from_values(0.0, 0.01, values)
        }
    }

    fn table() -> FeatureTable {
        FeatureTable::new(vec![
            AlignedNucleus {
                time: 0.5,
                phone: Some("a:".to_string()),
                start_est: Some(0.45),
                end: Some(0.55),
                duration_est: Some(0.55 - 0.45),
                word: Some("Haus".to_string()),
                word_start: Some(0.42),
                word_end: Some(1.2),
                ip_tone: Some("L%".to_string()),
                ip_start: Some(0.0),
                ip_end: Some(1.5),
                ..AlignedNucleus::default()
            },
            AlignedNucleus {
                time: 1.55,
                ..AlignedNucleus::default()
            },
        ])
    }

    fn audio() -> Waveform {
        Waveform::new(vec![0.5; 2000], 1000)
    }

    fn value(table: &FeatureTable, column: &str, row: usize) -> FeatureValue {
        table.column(column).unwrap()[row]
    }

    #[test]
    fn computes_requested_features_with_dependencies() {
        let audio = audio();
        let extractor = FeatureExtractor::new(&StubEngine, &audio, PitchRange::new(75.0, 500.0), 50.0);
        let out = extractor
            .run(
                &table(),
                &[
                    Feature::Duration,
                    Feature::IntensityIp,
                    Feature::F0Nucleus,
                    Feature::Excursion(ExcursionLevel::Word),
                    Feature::Excursion(ExcursionLevel::Ip),
                    Feature::Rms,
                ],
            )
            .unwrap();

        assert_abs_diff_eq!(value(&out, "duration", 0).unwrap(), 0.1, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&out, "intensity_nuclei", 0).unwrap(), 55.0, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&out, "intensity_ip", 0).unwrap(), -2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&out, "f0_nuclei", 0).unwrap(), 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&out, "f0_max", 0).unwrap(), 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&out, "excursion_word", 0).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&out, "excursion_ip", 0).unwrap(), 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&out, "rms", 0).unwrap(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn unmatched_nucleus_gets_typed_failures() {
        let audio = audio();
        let extractor = FeatureExtractor::new(&StubEngine, &audio, PitchRange::new(75.0, 500.0), 50.0);
        let out = extractor
            .run(&table(), &[Feature::Duration, Feature::F0Nucleus, Feature::Rms])
            .unwrap();
        assert_eq!(value(&out, "duration", 1), Err(FailureReason::NoInterval));
        assert_eq!(value(&out, "f0_nuclei", 1), Err(FailureReason::Unvoiced));
        assert_eq!(value(&out, "rms", 1), Err(FailureReason::NoInterval));
    }

    #[test]
    fn stage_without_dependency_column_fails() {
        let audio = audio();
        let extractor = FeatureExtractor::new(&StubEngine, &audio, PitchRange::new(75.0, 500.0), 50.0);
        assert!(matches!(
            extractor.stage(&table(), Feature::Excursion(ExcursionLevel::Word)),
            Err(PromError::Schema { .. })
        ));
    }

    #[test]
    fn pitch_range_depends_on_gender() {
        assert_eq!(pitch_range_for(Gender::Male), PitchRange::new(50.0, 300.0));
        assert_eq!(pitch_range_for(Gender::Female).ceiling_hz, 500.0);
    }
}
