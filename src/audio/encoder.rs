use std::path::Path;

use crate::error::{PromError, Result};
use crate::types::Waveform;

/// Write a waveform as 16-bit mono PCM WAV.
pub fn encode_audio<P: AsRef<Path>>(audio: &Waveform, path: P) -> Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|err| wav_error(path, err))?;
    for &sample in &audio.samples {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(scaled)
            .map_err(|err| wav_error(path, err))?;
    }
    writer.finalize().map_err(|err| wav_error(path, err))?;
    Ok(())
}

fn wav_error(path: &Path, err: hound::Error) -> PromError {
    match err {
        hound::Error::IoError(source) => PromError::io("writing WAV file", path, source),
        other => PromError::input(format!("{}: {other}", path.display())),
    }
}
