#![allow(dead_code)]

use std::f32::consts::PI;
use std::path::Path;

use promdetect::types::Waveform;

pub const SAMPLE_RATE: u32 = 16_000;
/// Centres of the synthetic syllables, in seconds.
pub const BURST_CENTRES: [f64; 7] = [0.5, 0.9, 1.3, 1.7, 2.1, 2.5, 2.9];
const BURST_LENGTH_S: f64 = 0.14;
const DURATION_S: f64 = 3.4;

/// Harmonic bursts with a Hann envelope over a faint noise floor.
pub fn burst_waveform() -> Waveform {
    let len = (DURATION_S * SAMPLE_RATE as f64) as usize;
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut samples: Vec<f32> = (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 33) as f32 / (1u64 << 31) as f32;
            (unit * 2.0 - 1.0) * 0.001
        })
        .collect();

    let burst_len = (BURST_LENGTH_S * SAMPLE_RATE as f64) as usize;
    for centre in BURST_CENTRES {
        let first = (centre * SAMPLE_RATE as f64) as usize - burst_len / 2;
        for j in 0..burst_len {
            let envelope = 0.5 - 0.5 * (2.0 * PI * j as f32 / burst_len as f32).cos();
            let t = (first + j) as f32 / SAMPLE_RATE as f32;
            let voice = (2.0 * PI * 180.0 * t).sin()
                + 0.5 * (2.0 * PI * 360.0 * t).sin()
                + 0.25 * (2.0 * PI * 540.0 * t).sin();
            samples[first + j] += 0.2 * envelope * voice;
        }
    }
    Waveform::new(samples, SAMPLE_RATE)
}

pub fn silent_waveform() -> Waveform {
    Waveform::new(vec![0.0; SAMPLE_RATE as usize], SAMPLE_RATE)
}

pub fn write_wav(path: &Path, audio: &Waveform) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &sample in &audio.samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Writes an xwaves-style label file with one `end label` row per entry.
pub fn write_labels(path: &Path, rows: &[(f64, &str)]) {
    let mut text = String::from("signal test\ntype 0\ncolor 121\nnfields 1\n#\n");
    for (time, label) in rows {
        text.push_str(&format!("    {time:.6}  121 {label}\n"));
    }
    std::fs::write(path, text).expect("write labels");
}

/// Phones with a vowel around every burst and consonants in between.
pub fn burst_phones() -> Vec<(f64, &'static str)> {
    let mut rows = vec![(BURST_CENTRES[0] - 0.08, "<p:>")];
    for centre in BURST_CENTRES {
        rows.push((centre + 0.08, "a:"));
        rows.push((centre + 0.32, "t"));
    }
    rows
}

pub fn burst_words() -> Vec<(f64, &'static str)> {
    vec![(0.4, "[h]"), (1.5, "Tatata"), (3.2, "tatata")]
}
