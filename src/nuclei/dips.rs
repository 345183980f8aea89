use super::candidates::PeakCandidate;
use crate::audio::IntensityContour;
use crate::config::DipPolicy;

/// Depth of the intensity valley between `peak` and `neighbour`, measured
/// from `peak`'s level.
pub fn dip_between(contour: &IntensityContour, peak: &PeakCandidate, neighbour: &PeakCandidate) -> f64 {
    let (from, to) = if peak.time <= neighbour.time {
        (peak.time, neighbour.time)
    } else {
        (neighbour.time, peak.time)
    };
    match contour.minimum_between(from, to) {
        Some(valley) => (peak.intensity - valley).abs(),
        None => 0.0,
    }
}

/// Keeps candidates separated from their neighbours by more than
/// `min_dip_db`.
///
/// The first candidate is only checked against the following one and the last
/// only against the preceding one; a lone candidate is kept.
pub fn validate_dips(
    contour: &IntensityContour,
    candidates: &[PeakCandidate],
    min_dip_db: f64,
    policy: DipPolicy,
) -> Vec<PeakCandidate> {
    candidates
        .iter()
        .enumerate()
        .filter(|&(idx, peak)| {
            let following = candidates
                .get(idx + 1)
                .map(|next| dip_between(contour, peak, next));
            let preceding = idx
                .checked_sub(1)
                .map(|prev| dip_between(contour, peak, &candidates[prev]));
            let mut dips = [following, preceding].into_iter().flatten().peekable();
            if dips.peek().is_none() {
                return true;
            }
            match policy {
                DipPolicy::EitherSide => dips.any(|dip| dip > min_dip_db),
                DipPolicy::BothSides => dips.all(|dip| dip > min_dip_db),
            }
        })
        .map(|(_, peak)| *peak)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // peaks at frames 2, 6 and 10; valleys at 4 (deep) and 8 (shallow)
    fn fixture() -> (IntensityContour, Vec<PeakCandidate>) {
        let values = vec![
            50.0, 60.0, 70.0, 65.0, 58.0, 66.0, 69.0, 68.5, 68.0, 68.5, 69.5, 60.0, 50.0,
        ];
        let contour = IntensityContour::from_values(0.0, 0.01, values).unwrap();
        let candidates = vec![
            PeakCandidate { time: 0.02, intensity: 70.0 },
            PeakCandidate { time: 0.06, intensity: 69.0 },
            PeakCandidate { time: 0.10, intensity: 69.5 },
        ];
        (contour, candidates)
    }

    fn times(peaks: &[PeakCandidate]) -> Vec<f64> {
        peaks.iter().map(|p| p.time).collect()
    }

    #[test]
    fn dip_uses_minimum_strictly_between_peaks() {
        let (contour, candidates) = fixture();
        assert!((dip_between(&contour, &candidates[0], &candidates[1]) - 12.0).abs() < 1e-9);
        assert!((dip_between(&contour, &candidates[1], &candidates[0]) - 11.0).abs() < 1e-9);
        assert!((dip_between(&contour, &candidates[1], &candidates[2]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn either_side_keeps_peak_with_one_deep_dip() {
        let (contour, candidates) = fixture();
        let kept = validate_dips(&contour, &candidates, 2.0, DipPolicy::EitherSide);
        assert_eq!(times(&kept), vec![0.02, 0.06]);
    }

    #[test]
    fn both_sides_requires_two_deep_dips() {
        let (contour, candidates) = fixture();
        let kept = validate_dips(&contour, &candidates, 2.0, DipPolicy::BothSides);
        assert_eq!(times(&kept), vec![0.02]);
    }

    #[test]
    fn result_is_a_subset_for_any_min_dip() {
        let (contour, candidates) = fixture();
        for min_dip in [0.0, 0.5, 2.0, 11.5, 100.0] {
            for policy in [DipPolicy::EitherSide, DipPolicy::BothSides] {
                let kept = validate_dips(&contour, &candidates, min_dip, policy);
                assert!(kept.iter().all(|k| candidates.contains(k)));
            }
        }
    }

    #[test]
    fn empty_and_single_inputs() {
        let (contour, candidates) = fixture();
        assert!(validate_dips(&contour, &[], 2.0, DipPolicy::BothSides).is_empty());
        let single = validate_dips(&contour, &candidates[..1], 2.0, DipPolicy::EitherSide);
        assert_eq!(single.len(), 1);
    }
}
