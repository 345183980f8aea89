use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{PromError, Result};
use crate::types::Waveform;

/// Decode an audio file to a mono f32 waveform.
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<Waveform> {
    let path = path.as_ref();

    let file = std::fs::File::open(path)
        .map_err(|err| PromError::io("opening audio file", path, err))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| unreadable(path, "unsupported or corrupt audio format", err))?;
    let mut format = probe_result.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PromError::input(format!("{}: no audio track", path.display())))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        PromError::input(format!("{}: sample rate not specified", path.display()))
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| unreadable(path, "no decoder for codec", err))?;

    let mut samples = Vec::new();
    let mut interleaved: Option<SampleBuffer<f32>> = None;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(unreadable(path, "failed to read packet", err)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|err| unreadable(path, "failed to decode packet", err))?;
        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let too_small = interleaved
            .as_ref()
            .map_or(true, |buffer| buffer.capacity() < decoded.capacity() * channels);
        if too_small {
            interleaved = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        let Some(buffer) = interleaved.as_mut() else {
            continue;
        };
        buffer.copy_interleaved_ref(decoded);
        downmix_into(&buffer.samples()[..frames * channels], channels, &mut samples);
    }

    debug!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        "decoded audio"
    );
    Ok(Waveform::new(samples, sample_rate))
}

/// Average interleaved channels into mono samples.
fn downmix_into(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    if channels == 1 {
        output.extend_from_slice(interleaved);
        return;
    }
    let scale = 1.0 / channels as f32;
    output.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale),
    );
}

fn unreadable(path: &Path, what: &str, err: SymphoniaError) -> PromError {
    PromError::input(format!("{}: {what}: {err}", path.display()))
}
