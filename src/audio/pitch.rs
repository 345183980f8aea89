use aus::analysis;
use tracing::debug;

use super::resample::resample;
use crate::error::{PromError, Result};
use crate::types::{TimeGrid, Waveform};

pub(crate) const TARGET_SAMPLE_RATE: u32 = 16_000;
const FRAME_MS: usize = 40;

/// Search range for the fundamental frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchRange {
    pub floor_hz: f64,
    pub ceiling_hz: f64,
}

impl PitchRange {
    pub fn new(floor_hz: f64, ceiling_hz: f64) -> Self {
        Self {
            floor_hz,
            ceiling_hz,
        }
    }
}

/// F0 track in Hz; `None` marks unvoiced frames.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchContour {
    grid: TimeGrid,
    values: Vec<Option<f64>>,
}

impl PitchContour {
    pub fn new(grid: TimeGrid, values: Vec<Option<f64>>) -> Result<Self> {
        if grid.len != values.len() {
            return Err(PromError::engine(
                "building pitch contour",
                format!("grid has {} frames, got {} values", grid.len, values.len()),
            ));
        }
        Ok(Self { grid, values })
    }

    pub fn from_values(start: f64, step: f64, values: Vec<Option<f64>>) -> Result<Self> {
        Self::new(TimeGrid::new(start, step, values.len()), values)
    }

    pub fn grid(&self) -> TimeGrid {
        self.grid
    }

    pub fn voiced_fraction(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().filter(|v| v.is_some()).count() as f64 / self.values.len() as f64
    }

    /// F0 at `time`; undefined when the nearest frame is unvoiced.
    pub fn value_at(&self, time: f64) -> Option<f64> {
        let len = self.values.len();
        if len == 0 {
            return None;
        }
        let position = self.grid.position_of(time);
        if position < -0.5 || position > len as f64 - 0.5 {
            return None;
        }
        let nearest = position.round().clamp(0.0, (len - 1) as f64) as usize;
        let centre = self.values[nearest]?;
        let left = (position.floor().max(0.0) as usize).min(len - 1);
        let right = (left + 1).min(len - 1);
        match (self.values[left], self.values[right]) {
            (Some(a), Some(b)) if right > left => {
                let phase = (position - left as f64).clamp(0.0, 1.0);
                Some(a + (b - a) * phase)
            }
            _ => Some(centre),
        }
    }

    pub fn minimum_in(&self, from: f64, to: f64) -> Option<f64> {
        self.voiced_in(from, to).reduce(f64::min)
    }

    pub fn maximum_in(&self, from: f64, to: f64) -> Option<f64> {
        self.voiced_in(from, to).reduce(f64::max)
    }

    pub fn mean_in(&self, from: f64, to: f64) -> Option<f64> {
        let (sum, count) = self
            .voiced_in(from, to)
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    fn voiced_in(&self, from: f64, to: f64) -> impl Iterator<Item = f64> + '_ {
        let range = self.grid.frames_within(from, to);
        self.values[range].iter().filter_map(|v| *v)
    }
}

/// Tracks F0 with pYIN on a 16 kHz copy of the signal.
pub fn compute_pitch(audio: &Waveform, range: PitchRange) -> Result<PitchContour> {
    if audio.is_empty() {
        return Err(PromError::engine("computing pitch", "cannot analyse an empty signal"));
    }
    let resampled = resample(audio, TARGET_SAMPLE_RATE)?;
    let samples: Vec<f64> = resampled.samples.iter().map(|&s| s as f64).collect();
    let frame_len = (TARGET_SAMPLE_RATE as usize * FRAME_MS / 1000).max(1);
    let (timestamps, pitches, voiced_flags, _confidence) = analysis::pyin_pitch_estimator(
        &samples,
        TARGET_SAMPLE_RATE,
        range.floor_hz,
        range.ceiling_hz,
        frame_len,
    );

    let values: Vec<Option<f64>> = pitches
        .iter()
        .zip(voiced_flags.iter())
        .map(|(&pitch, &voiced)| {
            (voiced && pitch.is_finite() && pitch > 0.0).then_some(pitch)
        })
        .collect();
    let grid = frame_grid(&timestamps, values.len(), frame_len);
    debug!(
        frames = values.len(),
        floor_hz = range.floor_hz,
        ceiling_hz = range.ceiling_hz,
        "computed pitch contour"
    );
    PitchContour::new(grid, values)
}

/// Grid of the frame times reported by the estimator.
///
/// Frames are hop-spaced; a single frame falls back to the default hop of a
/// quarter frame.
fn frame_grid(timestamps: &[f64], count: usize, frame_len: usize) -> TimeGrid {
    let start = timestamps.first().copied().unwrap_or(0.0);
    let step = match timestamps {
        [first, second, ..] if second > first => second - first,
        _ => frame_len as f64 / 4.0 / TARGET_SAMPLE_RATE as f64,
    };
    TimeGrid::new(start, step, count)
}
