use serde::Serialize;

use crate::audio::interpolate::refine_maximum;
use crate::audio::{IntensityContour, Interpolation};

/// A local intensity maximum, at a time in seconds with its level in dB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakCandidate {
    pub time: f64,
    pub intensity: f64,
}

/// Fractional frame positions of left-biased local maxima.
///
/// A frame is a maximum when it rises above its left neighbour and is not
/// exceeded by its right one, so a flat top yields a single point. Edge frames
/// never qualify.
pub fn local_maxima(values: &[f64]) -> Vec<f64> {
    if values.len() < 3 {
        return Vec::new();
    }
    (1..values.len() - 1)
        .filter(|&i| values[i - 1] < values[i] && values[i] >= values[i + 1])
        .map(|i| refine_maximum(values, i).0)
        .collect()
}

/// Local maxima of `contour` whose re-sampled level exceeds `peak_threshold_db`.
pub fn find_peak_candidates(contour: &IntensityContour, peak_threshold_db: f64) -> Vec<PeakCandidate> {
    let signal = contour.to_signal();
    let grid = contour.grid();
    local_maxima(&signal)
        .into_iter()
        .filter_map(|position| {
            let time = grid.start + position * grid.step;
            let intensity = contour.value_at(time, Interpolation::Cubic)?;
            Some(PeakCandidate { time, intensity })
        })
        .filter(|candidate| candidate.intensity > peak_threshold_db)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contour(values: Vec<f64>) -> IntensityContour {
        IntensityContour::from_values(0.05, 0.01, values).unwrap()
    }

    #[test]
    fn plateau_yields_one_maximum() {
        let maxima = local_maxima(&[1.0, 5.0, 5.0, 1.0]);
        assert_eq!(maxima.len(), 1);
        assert!((maxima[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn edges_are_never_maxima() {
        assert!(local_maxima(&[9.0, 1.0, 2.0, 1.0, 9.0]).len() == 1);
        assert!(local_maxima(&[3.0, 2.0]).is_empty());
    }

    #[test]
    fn candidates_are_thresholded_and_increasing() {
        let values = vec![
            40.0, 55.0, 70.0, 56.0, 45.0, 50.0, 52.0, 49.0, 60.0, 75.0, 61.0, 40.0,
        ];
        let candidates = find_peak_candidates(&contour(values), 60.0);
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].time < candidates[1].time);
        assert!((candidates[0].time - 0.07).abs() < 0.006);
        assert!((candidates[1].time - 0.14).abs() < 0.006);
        assert!(candidates.iter().all(|c| c.intensity > 60.0));
    }

    #[test]
    fn flat_contour_has_no_candidates() {
        let candidates = find_peak_candidates(&contour(vec![-300.0; 50]), -300.0);
        assert!(candidates.is_empty());
    }
}
