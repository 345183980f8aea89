//! Corpus processing: one recording at a time, one output file each.

pub mod batch;
pub mod recording;
pub mod writer;

pub use batch::{list_recordings, run_batch, run_batch_with, BatchSummary};
pub use recording::{RecordingOutput, RecordingPipeline};
pub use writer::{to_csv, to_json, write_table};
