use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use promdetect::alignment::IntervalAligner;
use promdetect::annotations::{read_annotation_as, AnnotationKind, LabelInventory, StartPolicy};
use promdetect::audio::encoder::encode_audio;
use promdetect::audio::{AcousticEngine, NativeEngine};
use promdetect::cli::{AlignArgs, BatchArgs, Cli, Command, DetectArgs};
use promdetect::config::PipelineConfig;
use promdetect::features::FeatureTable;
use promdetect::nuclei::{Detection, NucleusDetector};
use promdetect::pipeline::{run_batch, to_csv};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Detect(args) => handle_detect(&args),
        Command::Align(args) => handle_align(&args),
        Command::Batch(args) => handle_batch(&args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "promdetect=debug"
    } else {
        "promdetect=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_detect(args: &DetectArgs) -> Result<()> {
    ensure!(
        args.input.is_file(),
        "Input file does not exist: {:?}",
        args.input
    );
    let detector = NucleusDetector::new(args.detection.to_config()?)
        .context("Invalid detection settings")?;
    let audio = NativeEngine
        .load(&args.input)
        .context("Failed to decode input audio")?;

    let detection = match &args.denoised_out {
        Some(path) => {
            let denoised = detector.denoise(&audio).context("Failed to remove noise")?;
            encode_audio(&denoised, path)
                .with_context(|| format!("Failed to write denoised audio to {:?}", path))?;
            info!(path = %path.display(), "wrote denoised audio");
            detector.detect_denoised(&audio, &denoised)
        }
        None => detector.detect(&audio),
    }
    .context("Nucleus detection failed")?;

    report(&detection);
    for time in detection.times() {
        println!("{time:.4}");
    }
    Ok(())
}

fn handle_align(args: &AlignArgs) -> Result<()> {
    let detector = NucleusDetector::new(args.detection.to_config()?)
        .context("Invalid detection settings")?;
    let detection = detector
        .detect_file(&args.input)
        .context("Nucleus detection failed")?;
    report(&detection);

    let policy = StartPolicy::default();
    let read = |path: &std::path::Path, kind| {
        read_annotation_as(path, kind, &policy)
            .with_context(|| format!("Failed to read {kind} from {:?}", path))
    };
    let phones = read(&args.phones, AnnotationKind::Phones)?.into_intervals()?;
    let words = read(&args.words, AnnotationKind::Words)?.into_intervals()?;

    let mut aligner = IntervalAligner::new(LabelInventory::default())
        .with_phones(&phones)?
        .with_words(&words)?;
    if let Some(path) = &args.tones {
        let tones = read(path, AnnotationKind::Tones)?.into_points()?;
        aligner = aligner.with_tones(&tones, &policy)?;
    }
    if let Some(path) = &args.accents {
        aligner = aligner.with_accents(read(path, AnnotationKind::Accents)?.into_points()?)?;
    }

    let table = FeatureTable::new(aligner.align(&detection.times()));
    print!("{}", to_csv(&table));
    Ok(())
}

fn handle_batch(args: &BatchArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)
        .with_context(|| format!("Failed to load pipeline config {:?}", args.config))?;
    let summary = run_batch(config, &args.output)?;
    println!(
        "processed: {}, skipped: {}, failed: {}",
        summary.processed, summary.skipped, summary.failed
    );
    Ok(())
}

fn report(detection: &Detection) {
    info!(
        candidates = detection.candidates.len(),
        nuclei = detection.nuclei.len(),
        peak_threshold_db = detection.thresholds.peak_db,
        "detection finished"
    );
}
