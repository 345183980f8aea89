//! Spectral subtraction noise removal.
//!
//! The noise spectrum is estimated from the quietest analysis frames of the
//! recording itself, then subtracted frame by frame inside the configured
//! band before overlap-add resynthesis.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::debug;

use crate::config::DenoiseParams;
use crate::error::{PromError, Result};
use crate::types::Waveform;

/// Share of frames (by energy) that make up the noise estimate.
const NOISE_FRAME_FRACTION: f64 = 0.1;
const MIN_WINDOW_SUM: f64 = 1e-6;

struct Stft {
    frame_len: usize,
    hop: usize,
    fft_len: usize,
    window: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl Stft {
    fn new(frame_len: usize) -> Self {
        let frame_len = frame_len.max(4) & !1;
        let fft_len = frame_len.next_power_of_two();
        let mut planner = FftPlanner::<f64>::new();
        let window = (0..frame_len)
            .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / frame_len as f64).cos())
            .collect();
        Self {
            frame_len,
            hop: frame_len / 2,
            fft_len,
            window,
            forward: planner.plan_fft_forward(fft_len),
            inverse: planner.plan_fft_inverse(fft_len),
        }
    }

    fn frame_count(&self, samples: usize) -> usize {
        samples.div_ceil(self.hop)
    }

    fn windowed(&self, samples: &[f32], frame: usize) -> Vec<Complex<f64>> {
        let offset = frame * self.hop;
        let mut buffer = vec![Complex::new(0.0, 0.0); self.fft_len];
        for (j, slot) in buffer.iter_mut().take(self.frame_len).enumerate() {
            if let Some(&sample) = samples.get(offset + j) {
                *slot = Complex::new(sample as f64 * self.window[j], 0.0);
            }
        }
        buffer
    }

    fn spectrum(&self, samples: &[f32], frame: usize) -> Vec<Complex<f64>> {
        let mut buffer = self.windowed(samples, frame);
        self.forward.process(&mut buffer);
        buffer
    }

    fn frame_energy(&self, samples: &[f32], frame: usize) -> f64 {
        self.windowed(samples, frame).iter().map(|c| c.re * c.re).sum()
    }
}

/// Removes stationary background noise from `audio`.
pub fn remove_noise(audio: &Waveform, params: &DenoiseParams) -> Result<Waveform> {
    if audio.is_empty() || audio.sample_rate == 0 {
        return Err(PromError::engine("removing noise", "cannot denoise an empty signal"));
    }
    let sample_rate = audio.sample_rate as f64;
    let stft = Stft::new((params.window_s * sample_rate).round() as usize);
    let frames = stft.frame_count(audio.samples.len());
    let bin_hz = sample_rate / stft.fft_len as f64;
    let half_bins = stft.fft_len / 2 + 1;

    let noise = estimate_noise(&stft, &audio.samples, frames, half_bins);
    let band = band_bins(params, bin_hz, half_bins);
    let smoothing_bins = ((params.smoothing_hz / bin_hz).round() as usize).max(1);

    let mut output = vec![0.0f64; audio.samples.len()];
    let mut norm = vec![0.0f64; audio.samples.len()];
    let scale = 1.0 / stft.fft_len as f64;
    for frame in 0..frames {
        let mut spectrum = stft.spectrum(&audio.samples, frame);
        let gains = smooth(&subtraction_gains(&spectrum, &noise, &band), smoothing_bins);
        for (k, &gain) in gains.iter().enumerate() {
            spectrum[k] *= gain;
            let mirror = stft.fft_len - k;
            if k > 0 && mirror < stft.fft_len && mirror != k {
                spectrum[mirror] *= gain;
            }
        }
        stft.inverse.process(&mut spectrum);

        let offset = frame * stft.hop;
        for j in 0..stft.frame_len {
            let idx = offset + j;
            if idx >= output.len() {
                break;
            }
            output[idx] += spectrum[j].re * scale;
            norm[idx] += stft.window[j];
        }
    }

    let samples = output
        .iter()
        .zip(norm.iter())
        .zip(audio.samples.iter())
        .map(|((&value, &weight), &original)| {
            if weight > MIN_WINDOW_SUM {
                (value / weight) as f32
            } else {
                original
            }
        })
        .collect();

    debug!(
        frames,
        fft_len = stft.fft_len,
        band_low_hz = params.band_low_hz,
        band_high_hz = params.band_high_hz,
        "removed noise by spectral subtraction"
    );
    Ok(Waveform::new(samples, audio.sample_rate))
}

/// Mean magnitude spectrum of the quietest frames.
fn estimate_noise(stft: &Stft, samples: &[f32], frames: usize, half_bins: usize) -> Vec<f64> {
    let mut energies: Vec<(usize, f64)> = (0..frames)
        .map(|frame| (frame, stft.frame_energy(samples, frame)))
        .collect();
    energies.sort_by(|a, b| a.1.total_cmp(&b.1));
    let take = ((frames as f64 * NOISE_FRAME_FRACTION).ceil() as usize).clamp(1, frames.max(1));

    let mut noise = vec![0.0; half_bins];
    for &(frame, _) in energies.iter().take(take) {
        let spectrum = stft.spectrum(samples, frame);
        for (acc, bin) in noise.iter_mut().zip(spectrum.iter()) {
            *acc += bin.norm();
        }
    }
    noise.iter_mut().for_each(|v| *v /= take as f64);
    noise
}

fn band_bins(params: &DenoiseParams, bin_hz: f64, half_bins: usize) -> std::ops::Range<usize> {
    let low = (params.band_low_hz / bin_hz).ceil() as usize;
    let high = ((params.band_high_hz / bin_hz).floor() as usize + 1).min(half_bins);
    low.min(high)..high
}

fn subtraction_gains(
    spectrum: &[Complex<f64>],
    noise: &[f64],
    band: &std::ops::Range<usize>,
) -> Vec<f64> {
    noise
        .iter()
        .enumerate()
        .map(|(k, &noise_mag)| {
            if !band.contains(&k) {
                return 1.0;
            }
            let magnitude = spectrum[k].norm();
            if magnitude <= 0.0 {
                0.0
            } else {
                (magnitude - noise_mag).max(0.0) / magnitude
            }
        })
        .collect()
}

/// Moving average over `width` neighbouring bins.
fn smooth(values: &[f64], width: usize) -> Vec<f64> {
    if width < 2 || values.is_empty() {
        return values.to_vec();
    }
    let radius = width / 2;
    (0..values.len())
        .map(|idx| {
            let start = idx.saturating_sub(radius);
            let end = (idx + radius + 1).min(values.len());
            values[start..end].iter().sum::<f64>() / (end - start) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let unit = (state >> 33) as f32 / (1u64 << 31) as f32;
                (unit * 2.0 - 1.0) * amplitude
            })
            .collect()
    }

    fn energy(samples: &[f32]) -> f64 {
        samples.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn noise_only_stretches_are_attenuated() {
        let sample_rate = 16_000;
        let mut samples = noise(sample_rate, 0.01, 7);
        // a loud tone in the second half
        for (i, sample) in samples.iter_mut().enumerate().skip(sample_rate / 2) {
            *sample += 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 16_000.0).sin();
        }
        let audio = Waveform::new(samples, sample_rate as u32);
        let cleaned = remove_noise(&audio, &DenoiseParams::default()).unwrap();

        assert_eq!(cleaned.samples.len(), audio.samples.len());
        let quiet_before = energy(&audio.samples[1000..7000]);
        let quiet_after = energy(&cleaned.samples[1000..7000]);
        assert!(quiet_after < quiet_before * 0.5);
        let tone_before = energy(&audio.samples[9000..15000]);
        let tone_after = energy(&cleaned.samples[9000..15000]);
        assert!(tone_after > tone_before * 0.8);
    }

    #[test]
    fn silence_passes_through() {
        let audio = Waveform::new(vec![0.0; 4000], 16_000);
        let cleaned = remove_noise(&audio, &DenoiseParams::default()).unwrap();
        assert!(cleaned.samples.iter().all(|s| s.abs() < 1e-9));
    }

    #[test]
    fn smoothing_keeps_constant_gains() {
        let gains = smooth(&[0.5; 10], 3);
        assert!(gains.iter().all(|g| (g - 0.5).abs() < 1e-12));
    }
}
