//! Core types shared by the detection, alignment and feature stages

use serde::Serialize;

/// Slack (in frames) absorbing float error when a time sits on a frame centre.
const GRID_TOLERANCE: f64 = 1e-9;

/// Raw audio data representation (mono, f32 samples)
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 16000)
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample index for a time in seconds, clamped to the signal.
    pub fn index_at(&self, seconds: f64) -> usize {
        let raw = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        raw.min(self.samples.len())
    }
}

/// Regular sampling grid of an analysis contour (frame centres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeGrid {
    /// Centre of the first frame, in seconds
    pub start: f64,
    /// Distance between frame centres, in seconds
    pub step: f64,
    pub len: usize,
}

impl TimeGrid {
    pub fn new(start: f64, step: f64, len: usize) -> Self {
        Self { start, step, len }
    }

    pub fn time_of(&self, index: usize) -> f64 {
        self.start + index as f64 * self.step
    }

    /// Fractional frame position of `time` (may lie outside `0..len`).
    pub fn position_of(&self, time: f64) -> f64 {
        (time - self.start) / self.step
    }

    pub fn end(&self) -> f64 {
        if self.len == 0 {
            return self.start;
        }
        self.time_of(self.len - 1)
    }

    /// Indices of frames whose centre lies strictly between `from` and `to`.
    pub fn frames_between(&self, from: f64, to: f64) -> std::ops::Range<usize> {
        if self.len == 0 || to <= from {
            return 0..0;
        }
        let first = (self.position_of(from).floor() + 1.0).max(0.0) as usize;
        let last = self.position_of(to).ceil();
        let last = if last <= 0.0 { 0 } else { (last as usize).min(self.len) };
        let mut range = first.min(self.len)..last;
        // a frame exactly on `from` or `to` is not strictly between
        while range.start < range.end && self.time_of(range.start) <= from {
            range.start += 1;
        }
        while range.end > range.start && self.time_of(range.end - 1) >= to {
            range.end -= 1;
        }
        range
    }

    /// Indices of frames whose centre lies in the closed range `[from, to]`.
    pub fn frames_within(&self, from: f64, to: f64) -> std::ops::Range<usize> {
        if self.len == 0 || to < from {
            return 0..0;
        }
        let first = (self.position_of(from) - GRID_TOLERANCE).ceil().max(0.0) as usize;
        let last = (self.position_of(to) + GRID_TOLERANCE).floor();
        if last < 0.0 {
            return 0..0;
        }
        let end = (last as usize + 1).min(self.len);
        first.min(end)..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_duration_from_sample_rate() {
        let audio = Waveform::new(vec![0.0; 22_050], 44_100);
        assert!((audio.duration() - 0.5).abs() < 1e-12);
        assert_eq!(audio.index_at(0.25), 11_025);
        assert_eq!(audio.index_at(3.0), 22_050);
    }

    #[test]
    fn frames_between_excludes_endpoints() {
        let grid = TimeGrid::new(0.0, 0.01, 100);
        assert_eq!(grid.frames_between(0.095, 0.145), 10..15);
        assert_eq!(grid.frames_between(0.105, 0.155), 11..16);
        assert_eq!(grid.frames_between(0.2, 0.2), 0..0);
    }

    #[test]
    fn frames_within_is_clamped() {
        let grid = TimeGrid::new(0.05, 0.01, 10);
        assert_eq!(grid.frames_within(0.0, 1.0), 0..10);
        assert_eq!(grid.frames_within(0.065, 0.095), 2..5);
        assert_eq!(grid.frames_within(-1.0, -0.5), 0..0);
    }
}
