use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use super::recording::{recording_id, RecordingPipeline};
use super::writer::write_table;
use crate::audio::{AcousticEngine, NativeEngine};
use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Recording ids of all `.wav` files in `directory`, sorted.
pub fn list_recordings(directory: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(directory)
        .with_context(|| format!("Failed to list corpus directory {:?}", directory))?;
    let mut recordings = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {:?}", directory))?;
        let path = entry.path();
        if path.is_file() {
            if let Some(id) = recording_id(&path) {
                recordings.push(id);
            }
        }
    }
    recordings.sort();
    Ok(recordings)
}

pub fn output_path<E>(pipeline: &RecordingPipeline<E>, output_dir: &Path, recording: &str) -> PathBuf
where
    E: AcousticEngine,
{
    output_dir.join(format!(
        "{recording}.{}",
        pipeline.config().output_format.extension()
    ))
}

/// Processes every recording of the configured corpus with the native engine.
pub fn run_batch(config: PipelineConfig, output_dir: &Path) -> Result<BatchSummary> {
    let pipeline = RecordingPipeline::with_engine(NativeEngine, config)
        .context("Failed to set up recording pipeline")?;
    run_batch_with(&pipeline, output_dir)
}

/// Processes every recording whose output does not exist yet.
///
/// A recording that fails is logged and counted; only problems with the
/// corpus or output directory abort the run.
pub fn run_batch_with<E: AcousticEngine>(
    pipeline: &RecordingPipeline<E>,
    output_dir: &Path,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    let recordings = list_recordings(&pipeline.config().directory)?;
    info!(
        recordings = recordings.len(),
        directory = %pipeline.config().directory.display(),
        "starting batch"
    );

    let mut summary = BatchSummary::default();
    for recording in &recordings {
        let target = output_path(pipeline, output_dir, recording);
        if target.exists() {
            warn!(recording = %recording, "output exists, skipping");
            summary.skipped += 1;
            continue;
        }
        let outcome = pipeline
            .run(recording)
            .and_then(|output| write_table(&output.table, pipeline.config().output_format, &target));
        match outcome {
            Ok(()) => summary.processed += 1,
            Err(err) => {
                error!(recording = %recording, error = %err, "recording failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch finished"
    );
    Ok(summary)
}
