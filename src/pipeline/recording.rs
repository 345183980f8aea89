use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::alignment::IntervalAligner;
use crate::annotations::{
    read_annotation_as, AnnotationKind, IntervalTable, PointTable, SpeakerInfo, SpeakerRegistry,
};
use crate::audio::{AcousticEngine, NativeEngine, PitchRange};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::{pitch_range_for, Feature, FeatureExtractor, FeatureTable};
use crate::nuclei::{Detection, NucleusDetector};

/// Everything computed for one recording.
#[derive(Debug, Clone)]
pub struct RecordingOutput {
    pub recording: String,
    pub speaker: Option<SpeakerInfo>,
    /// `None` when nuclei were taken from the phone layer.
    pub detection: Option<Detection>,
    pub table: FeatureTable,
}

/// Processes single recordings of a corpus directory.
pub struct RecordingPipeline<E = NativeEngine> {
    config: PipelineConfig,
    engine: E,
    speakers: Option<SpeakerRegistry>,
    features: Vec<Feature>,
}

impl RecordingPipeline<NativeEngine> {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_engine(NativeEngine, config)
    }
}

impl<E: AcousticEngine> RecordingPipeline<E> {
    pub fn with_engine(engine: E, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let features = config.requested_features()?;
        let speakers = config
            .speakers_file
            .as_deref()
            .map(SpeakerRegistry::load)
            .transpose()?;
        Ok(Self {
            config,
            engine,
            speakers,
            features,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn wav_path(&self, recording: &str) -> PathBuf {
        self.config.directory.join(format!("{recording}.wav"))
    }

    pub fn annotation_path(&self, recording: &str, kind: AnnotationKind) -> PathBuf {
        self.config
            .directory
            .join(format!("{recording}.{}", kind.extension()))
    }

    pub fn run(&self, recording: &str) -> Result<RecordingOutput> {
        let speaker = match &self.speakers {
            Some(registry) => Some(registry.lookup(recording)?),
            None => None,
        };

        let phones = self.intervals(recording, AnnotationKind::Phones)?;
        let words = self.intervals(recording, AnnotationKind::Words)?;
        let tones = self.optional_points(recording, AnnotationKind::Tones)?;
        let accents = self.optional_points(recording, AnnotationKind::Accents)?;

        let audio = self.engine.load(&self.wav_path(recording))?;

        let (detection, times) = if self.config.find_nuclei {
            let detector = NucleusDetector::with_engine(&self.engine, self.config.detection.clone())?;
            let detection = detector.detect(&audio)?;
            let times = detection.times();
            (Some(detection), times)
        } else {
            (None, self.phone_midpoints(&phones)?)
        };

        let mut aligner = IntervalAligner::new(self.config.labels.clone())
            .with_phones(&phones)?
            .with_words(&words)?;
        if let Some(tones) = &tones {
            aligner = aligner.with_tones(tones, &self.config.start_policy)?;
        }
        if let Some(accents) = accents {
            aligner = aligner.with_accents(accents)?;
        }
        let mut table = FeatureTable::new(aligner.align(&times));

        if !self.features.is_empty() {
            let pitch_range = speaker
                .as_ref()
                .map(|s| pitch_range_for(s.gender))
                .unwrap_or_else(|| {
                    PitchRange::new(
                        self.config.detection.pitch_floor_hz,
                        self.config.detection.pitch_ceiling_hz,
                    )
                });
            let extractor = FeatureExtractor::new(
                &self.engine,
                &audio,
                pitch_range,
                self.config.detection.intensity_min_pitch_hz,
            );
            table = extractor.run(&table, &self.features)?;
        }

        info!(
            recording,
            nuclei = table.len(),
            features = self.features.len(),
            "processed recording"
        );
        Ok(RecordingOutput {
            recording: recording.to_string(),
            speaker,
            detection,
            table,
        })
    }

    fn intervals(&self, recording: &str, kind: AnnotationKind) -> Result<IntervalTable> {
        let path = self.annotation_path(recording, kind);
        read_annotation_as(&path, kind, &self.config.start_policy)?.into_intervals()
    }

    fn optional_points(&self, recording: &str, kind: AnnotationKind) -> Result<Option<PointTable>> {
        let path = self.annotation_path(recording, kind);
        if !path.exists() {
            debug!(path = %path.display(), "no annotation file, layer left empty");
            return Ok(None);
        }
        read_annotation_as(&path, kind, &self.config.start_policy)?
            .into_points()
            .map(Some)
    }

    /// Centres of the nucleus-bearing phones, used when detection is off.
    fn phone_midpoints(&self, phones: &IntervalTable) -> Result<Vec<f64>> {
        let vowels = self.config.labels.filter(phones)?;
        Ok(vowels
            .rows()
            .iter()
            .filter_map(|row| row.start_est.map(|start| 0.5 * (start + row.end)))
            .collect())
    }
}

/// Stem of `path` when it names a `.wav` file.
pub(crate) fn recording_id(path: &Path) -> Option<String> {
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}
