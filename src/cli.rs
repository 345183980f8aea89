use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{DetectionConfig, DipPolicy};

#[derive(Parser, Debug)]
#[command(
    name = "promdetect",
    version,
    about = "Syllable nucleus detection and annotation alignment"
)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the nucleus times found in a recording.
    Detect(DetectArgs),
    /// Detect nuclei and print them joined with annotation layers as CSV.
    Align(AlignArgs),
    /// Process every recording of a corpus described by a JSON config.
    Batch(BatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DetectionArgs {
    /// Dip rule between neighbouring peaks: `either` or `both`.
    #[arg(long = "dip-policy", default_value = "either")]
    pub dip_policy: DipPolicy,
    /// Peak threshold relative to the 99th intensity percentile (dB).
    #[arg(long = "silence-threshold", default_value_t = -25.0, allow_hyphen_values = true)]
    pub silence_threshold_db: f64,
    /// Minimum dip between peaks (dB).
    #[arg(long = "min-dip", default_value_t = 2.0)]
    pub min_dip_db: f64,
    /// Keep only peaks that are voiced and inside sounding stretches.
    #[arg(long = "voicing-check")]
    pub voicing_check: bool,
}

impl DetectionArgs {
    pub fn to_config(&self) -> Result<DetectionConfig> {
        ensure!(
            self.min_dip_db >= 0.0,
            "min-dip must be non-negative, got {}",
            self.min_dip_db
        );
        let mut config = DetectionConfig::default()
            .with_dip_policy(self.dip_policy)
            .with_voicing_check(self.voicing_check);
        config.silence_threshold_db = self.silence_threshold_db;
        config.min_dip_db = self.min_dip_db;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    /// Input recording (WAV, FLAC, MP3, ...).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    #[command(flatten)]
    pub detection: DetectionArgs,
    /// Also write the denoised signal to this WAV file.
    #[arg(long = "denoised-out", value_name = "WAV")]
    pub denoised_out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AlignArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    #[arg(long)]
    pub phones: PathBuf,
    #[arg(long)]
    pub words: PathBuf,
    #[arg(long)]
    pub tones: Option<PathBuf>,
    #[arg(long)]
    pub accents: Option<PathBuf>,
    #[command(flatten)]
    pub detection: DetectionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// JSON pipeline configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Directory receiving one output file per recording.
    #[arg(long)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, DetectionArgs};
    use crate::config::DipPolicy;
    use clap::Parser;

    #[test]
    fn parses_detect_overrides() {
        let cli = Cli::try_parse_from([
            "promdetect",
            "detect",
            "talk.wav",
            "--dip-policy",
            "both",
            "--silence-threshold",
            "-20",
            "--voicing-check",
        ])
        .unwrap();
        let Command::Detect(args) = cli.command else {
            panic!("expected detect");
        };
        let config = args.detection.to_config().unwrap();
        assert_eq!(config.dip_policy, DipPolicy::BothSides);
        assert_eq!(config.silence_threshold_db, -20.0);
        assert!(config.voicing_check);
        assert_eq!(config.min_dip_db, 2.0);
    }

    #[test]
    fn rejects_negative_min_dip() {
        let args = DetectionArgs {
            dip_policy: DipPolicy::EitherSide,
            silence_threshold_db: -25.0,
            min_dip_db: -1.0,
            voicing_check: false,
        };
        assert!(args.to_config().is_err());
    }

    #[test]
    fn align_requires_phones_and_words() {
        assert!(Cli::try_parse_from(["promdetect", "align", "a.wav", "--phones", "a.phones"]).is_err());
        assert!(Cli::try_parse_from([
            "promdetect",
            "align",
            "a.wav",
            "--phones",
            "a.phones",
            "--words",
            "a.words"
        ])
        .is_ok());
    }
}
