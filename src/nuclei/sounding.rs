//! Silence/sounding segmentation of an intensity contour.

use serde::Serialize;

use crate::audio::IntensityContour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Silent,
    Sounding,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub kind: SegmentKind,
}

impl Segment {
    fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Contiguous silent and sounding stretches covering the whole contour.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SoundingSegmentation {
    segments: Vec<Segment>,
}

impl SoundingSegmentation {
    /// Segments the contour at `level_db`.
    ///
    /// Silent stretches shorter than `min_pause_s` are absorbed into the
    /// surrounding sound first; sounding stretches shorter than
    /// `min_sounding_s` then fall back to silence.
    pub fn from_contour(
        contour: &IntensityContour,
        level_db: f64,
        min_pause_s: f64,
        min_sounding_s: f64,
    ) -> Self {
        let grid = contour.grid();
        let signal = contour.to_signal();
        if signal.is_empty() {
            return Self::default();
        }
        let half_step = 0.5 * grid.step;
        let mut segments: Vec<Segment> = Vec::new();
        let mut run: Option<(usize, SegmentKind)> = None;

        for (idx, &value) in signal.iter().enumerate() {
            let kind = if value >= level_db {
                SegmentKind::Sounding
            } else {
                SegmentKind::Silent
            };
            match run {
                Some((_, current)) if current == kind => {}
                Some((start_idx, current)) => {
                    segments.push(Segment {
                        start: grid.time_of(start_idx) - half_step,
                        end: grid.time_of(idx) - half_step,
                        kind: current,
                    });
                    run = Some((idx, kind));
                }
                None => run = Some((idx, kind)),
            }
        }
        if let Some((start_idx, kind)) = run {
            segments.push(Segment {
                start: grid.time_of(start_idx) - half_step,
                end: grid.end() + half_step,
                kind,
            });
        }
        if let Some(first) = segments.first_mut() {
            first.start = first.start.max(0.0);
        }

        let segments = absorb_short(segments, SegmentKind::Silent, min_pause_s);
        let segments = absorb_short(segments, SegmentKind::Sounding, min_sounding_s);
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_sounding(&self, time: f64) -> bool {
        self.segments
            .iter()
            .any(|s| s.kind == SegmentKind::Sounding && s.start <= time && time <= s.end)
    }
}

/// Relabels `kind` runs shorter than `min_duration` and merges neighbours.
fn absorb_short(segments: Vec<Segment>, kind: SegmentKind, min_duration: f64) -> Vec<Segment> {
    let flipped = match kind {
        SegmentKind::Silent => SegmentKind::Sounding,
        SegmentKind::Sounding => SegmentKind::Silent,
    };
    let total = segments.len();
    let mut merged: Vec<Segment> = Vec::with_capacity(total);
    for mut segment in segments {
        // only runs with a neighbour to merge into are relabelled
        if segment.kind == kind && segment.duration() < min_duration && total > 1 {
            segment.kind = flipped;
        }
        match merged.last_mut() {
            Some(last) if last.kind == segment.kind => last.end = segment.end,
            _ => merged.push(segment),
        }
    }
    merged
}
