pub mod decoder;
pub mod denoise;
pub mod encoder;
pub mod intensity;
pub mod interpolate;
pub mod pitch;
pub mod resample;
pub mod slicer;

use std::path::Path;

pub use intensity::IntensityContour;
pub use interpolate::Interpolation;
pub use pitch::{PitchContour, PitchRange};

use crate::config::DenoiseParams;
use crate::error::Result;
use crate::types::Waveform;

/// Signal analysis the detector and feature stages depend on.
pub trait AcousticEngine {
    fn load(&self, path: &Path) -> Result<Waveform> {
        decoder::decode_audio(path)
    }

    fn denoise(&self, audio: &Waveform, params: &DenoiseParams) -> Result<Waveform>;

    fn intensity(&self, audio: &Waveform, min_pitch_hz: f64) -> Result<IntensityContour>;

    fn pitch(&self, audio: &Waveform, range: PitchRange) -> Result<PitchContour>;
}

/// Engine backed by the in-crate DSP routines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl AcousticEngine for NativeEngine {
    fn denoise(&self, audio: &Waveform, params: &DenoiseParams) -> Result<Waveform> {
        denoise::remove_noise(audio, params)
    }

    fn intensity(&self, audio: &Waveform, min_pitch_hz: f64) -> Result<IntensityContour> {
        intensity::compute_intensity(audio, min_pitch_hz)
    }

    fn pitch(&self, audio: &Waveform, range: PitchRange) -> Result<PitchContour> {
        pitch::compute_pitch(audio, range)
    }
}

impl<E: AcousticEngine + ?Sized> AcousticEngine for &E {
    fn load(&self, path: &Path) -> Result<Waveform> {
        (**self).load(path)
    }

    fn denoise(&self, audio: &Waveform, params: &DenoiseParams) -> Result<Waveform> {
        (**self).denoise(audio, params)
    }

    fn intensity(&self, audio: &Waveform, min_pitch_hz: f64) -> Result<IntensityContour> {
        (**self).intensity(audio, min_pitch_hz)
    }

    fn pitch(&self, audio: &Waveform, range: PitchRange) -> Result<PitchContour> {
        (**self).pitch(audio, range)
    }
}
