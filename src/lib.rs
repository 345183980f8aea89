//! Syllable nucleus detection and annotation alignment for prosody corpora.

pub mod alignment;
pub mod annotations;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod nuclei;
pub mod pipeline;
pub mod types;

pub use error::{PromError, Result};
