use ndarray::Array1;
use tracing::debug;

use super::interpolate::{sample_at, Interpolation};
use crate::error::{PromError, Result};
use crate::types::{TimeGrid, Waveform};

/// Kaiser shape parameter of the analysis window.
const KAISER_BETA: f64 = 20.0;
/// Window length as a multiple of the period of the lowest pitch.
const WINDOW_PERIODS: f64 = 6.4;
/// Frame step as a multiple of the period of the lowest pitch.
const STEP_PERIODS: f64 = 0.8;
/// Reference pressure squared (20 µPa)².
const REFERENCE_POWER: f64 = 4.0e-10;
/// Level reported for digitally silent frames.
pub const SILENT_FRAME_DB: f64 = -300.0;

/// Intensity in dB sampled on a regular grid of frame centres.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityContour {
    grid: TimeGrid,
    values: Array1<f64>,
}

impl IntensityContour {
    pub fn new(grid: TimeGrid, values: Vec<f64>) -> Result<Self> {
        if grid.len != values.len() {
            return Err(PromError::engine(
                "building intensity contour",
                format!("grid has {} frames, got {} values", grid.len, values.len()),
            ));
        }
        if !(grid.step > 0.0) {
            return Err(PromError::engine(
                "building intensity contour",
                format!("frame step must be positive, got {}", grid.step),
            ));
        }
        Ok(Self {
            grid,
            values: Array1::from(values),
        })
    }

    /// Contour with frames at `start + i * step`.
    pub fn from_values(start: f64, step: f64, values: Vec<f64>) -> Result<Self> {
        Self::new(TimeGrid::new(start, step, values.len()), values)
    }

    pub fn grid(&self) -> TimeGrid {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Discrete samples of the contour, one per frame.
    pub fn to_signal(&self) -> Vec<f64> {
        self.values.to_vec()
    }

    pub fn value_at(&self, time: f64, mode: Interpolation) -> Option<f64> {
        let values = self.values.as_slice()?;
        sample_at(values, self.grid.position_of(time), mode)
    }

    pub fn minimum(&self) -> Result<f64> {
        self.non_empty("minimum")?;
        Ok(self.values.fold(f64::INFINITY, |acc, &v| acc.min(v)))
    }

    pub fn maximum(&self) -> Result<f64> {
        self.non_empty("maximum")?;
        Ok(self.values.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v)))
    }

    pub fn mean(&self) -> Result<f64> {
        self.non_empty("mean")?;
        Ok(self.values.sum() / self.values.len() as f64)
    }

    /// Quantile over all frames, `q` in `[0, 1]`.
    pub fn quantile(&self, q: f64) -> Result<f64> {
        self.non_empty("quantile")?;
        Ok(quantile_of(self.values.iter().copied(), q))
    }

    /// Lowest level strictly between two times; the interpolated endpoint
    /// levels stand in when no frame falls inside.
    pub fn minimum_between(&self, from: f64, to: f64) -> Option<f64> {
        let range = self.grid.frames_between(from, to);
        if !range.is_empty() {
            return self
                .values
                .slice(ndarray::s![range])
                .iter()
                .copied()
                .reduce(f64::min);
        }
        let left = self.value_at(from, Interpolation::Linear)?;
        let right = self.value_at(to, Interpolation::Linear)?;
        Some(left.min(right))
    }

    pub fn minimum_in(&self, from: f64, to: f64) -> Option<f64> {
        self.frames_in(from, to).map(|v| v.into_iter().fold(f64::INFINITY, f64::min))
    }

    pub fn maximum_in(&self, from: f64, to: f64) -> Option<f64> {
        self.frames_in(from, to)
            .map(|v| v.into_iter().fold(f64::NEG_INFINITY, f64::max))
    }

    pub fn mean_in(&self, from: f64, to: f64) -> Option<f64> {
        self.frames_in(from, to)
            .map(|v| v.iter().sum::<f64>() / v.len() as f64)
    }

    pub fn standard_deviation_in(&self, from: f64, to: f64) -> Option<f64> {
        let frames = self.frames_in(from, to)?;
        if frames.len() < 2 {
            return None;
        }
        let mean = frames.iter().sum::<f64>() / frames.len() as f64;
        let variance =
            frames.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (frames.len() - 1) as f64;
        Some(variance.sqrt())
    }

    pub fn quantile_in(&self, from: f64, to: f64, q: f64) -> Option<f64> {
        self.frames_in(from, to).map(|v| quantile_of(v.into_iter(), q))
    }

    fn frames_in(&self, from: f64, to: f64) -> Option<Vec<f64>> {
        let range = self.grid.frames_within(from, to);
        if range.is_empty() {
            return None;
        }
        Some(self.values.slice(ndarray::s![range]).to_vec())
    }

    fn non_empty(&self, query: &str) -> Result<()> {
        if self.values.is_empty() {
            return Err(PromError::engine(
                "querying intensity contour",
                format!("{query} of an empty contour is undefined"),
            ));
        }
        Ok(())
    }
}

/// Quantile with the `q * n + 0.5` placement rule over ascending values,
/// never extrapolated past the extreme values.
pub(crate) fn quantile_of(values: impl Iterator<Item = f64>, q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.collect();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        1 => sorted[0],
        _ => {
            let place = q.clamp(0.0, 1.0) * n as f64 + 0.5;
            let left = (place.floor() as usize).clamp(1, n - 1);
            let fraction = (place - left as f64).clamp(0.0, 1.0);
            sorted[left - 1] + fraction * (sorted[left] - sorted[left - 1])
        }
    }
}

/// Computes the intensity contour of `audio`, resolving pitch periods down to
/// `min_pitch_hz`.
pub fn compute_intensity(audio: &Waveform, min_pitch_hz: f64) -> Result<IntensityContour> {
    if audio.is_empty() || audio.sample_rate == 0 {
        return Err(PromError::engine(
            "computing intensity",
            "cannot analyse an empty signal",
        ));
    }
    let sample_rate = audio.sample_rate as f64;
    let window_duration = WINDOW_PERIODS / min_pitch_hz;
    let time_step = STEP_PERIODS / min_pitch_hz;
    let duration = audio.duration();
    if duration < window_duration {
        return Err(PromError::engine(
            "computing intensity",
            format!(
                "signal of {duration:.3} s is shorter than the {window_duration:.3} s analysis window"
            ),
        ));
    }

    let window = kaiser_window((window_duration * sample_rate).round().max(2.0) as usize);
    let frame_count = ((duration - window_duration) / time_step).floor() as usize + 1;
    let first_centre = 0.5 * (duration - (frame_count - 1) as f64 * time_step);
    let half = window.len() / 2;

    let values = (0..frame_count)
        .map(|frame| {
            let centre = first_centre + frame as f64 * time_step;
            let centre_idx = (centre * sample_rate).round() as isize;
            frame_level(&audio.samples, centre_idx - half as isize, &window)
        })
        .collect::<Vec<_>>();

    debug!(
        frames = frame_count,
        time_step, window_duration, "computed intensity contour"
    );
    IntensityContour::from_values(first_centre, time_step, values)
}

/// Windowed mean-square level (dB) of the frame starting at `offset`.
fn frame_level(samples: &[f32], offset: isize, window: &[f64]) -> f64 {
    let mut weight_sum = 0.0;
    let mut weighted = 0.0;
    for (j, &w) in window.iter().enumerate() {
        let idx = offset + j as isize;
        if idx < 0 || idx as usize >= samples.len() {
            continue;
        }
        weight_sum += w;
        weighted += w * samples[idx as usize] as f64;
    }
    if weight_sum <= 0.0 {
        return SILENT_FRAME_DB;
    }
    let mean = weighted / weight_sum;

    let mut power = 0.0;
    for (j, &w) in window.iter().enumerate() {
        let idx = offset + j as isize;
        if idx < 0 || idx as usize >= samples.len() {
            continue;
        }
        let centred = samples[idx as usize] as f64 - mean;
        power += w * centred * centred;
    }
    let mean_square = power / weight_sum;
    if mean_square < 1e-30 {
        SILENT_FRAME_DB
    } else {
        10.0 * (mean_square / REFERENCE_POWER).log10()
    }
}

fn kaiser_window(len: usize) -> Vec<f64> {
    let norm = bessel_i0(KAISER_BETA);
    let last = (len - 1) as f64;
    (0..len)
        .map(|j| {
            let x = 2.0 * j as f64 / last - 1.0;
            bessel_i0(KAISER_BETA * (1.0 - x * x).max(0.0).sqrt()) / norm
        })
        .collect()
}

/// Modified Bessel function of the first kind, order zero (power series).
fn bessel_i0(x: f64) -> f64 {
    let half = 0.5 * x;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..200 {
        let ratio = half / k as f64;
        term *= ratio * ratio;
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}
