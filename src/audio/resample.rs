use dasp::interpolate::linear::Linear;
use dasp::{signal, Signal};

use crate::error::{PromError, Result};
use crate::types::Waveform;

/// Resample a waveform to `target_rate` with linear interpolation.
pub fn resample(audio: &Waveform, target_rate: u32) -> Result<Waveform> {
    if audio.sample_rate == 0 || target_rate == 0 {
        return Err(PromError::input(format!(
            "cannot resample from {} Hz to {} Hz",
            audio.sample_rate, target_rate
        )));
    }
    if audio.is_empty() || audio.sample_rate == target_rate {
        return Ok(Waveform::new(audio.samples.clone(), target_rate));
    }

    let ratio = target_rate as f64 / audio.sample_rate as f64;
    let output_len = ((audio.samples.len() as f64) * ratio).ceil().max(1.0) as usize;

    let mut source = signal::from_iter(audio.samples.iter().copied());
    let first = source.next();
    let second = source.next();
    let interpolator = Linear::new(first, second);
    let samples = source
        .from_hz_to_hz(interpolator, audio.sample_rate as f64, target_rate as f64)
        .take(output_len)
        .collect();
    Ok(Waveform::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use super::resample;
    use crate::types::Waveform;

    #[test]
    fn preserves_constant_signal_after_resample() {
        let input = Waveform::new(vec![0.5; 480], 48_000);
        let resampled = resample(&input, 16_000).unwrap();
        assert_eq!(resampled.samples.len(), 160);
        assert_eq!(resampled.sample_rate, 16_000);
        assert!(resampled
            .samples
            .iter()
            .all(|&sample| (sample - 0.5).abs() < 1e-6));
    }

    #[test]
    fn rejects_zero_rate() {
        let input = Waveform::new(vec![0.0; 10], 0);
        assert!(resample(&input, 16_000).is_err());
    }
}
