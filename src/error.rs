use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for results returned by library modules.
pub type Result<T> = std::result::Result<T, PromError>;

/// Failures that abort the processing of one recording.
#[derive(Debug, Error)]
pub enum PromError {
    #[error("I/O error while {context} ({path}): {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid input: {message}")]
    Input { message: String },
    #[error("annotation type '{0}' not supported")]
    UnsupportedAnnotation(String),
    #[error("schema error: {message}")]
    Schema { message: String },
    #[error("no peak candidates above {threshold_db:.2} dB; signal is silent or corrupt")]
    EmptySignal { threshold_db: f64 },
    #[error("invalid configuration: {message}")]
    Config { message: String },
    #[error("{context}: {message}")]
    Engine {
        context: &'static str,
        message: String,
    },
}

impl PromError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn engine(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Engine {
            context,
            message: err.to_string(),
        }
    }

    /// Input problems are fixed by correcting the file, not by re-running.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Input { .. } | Self::UnsupportedAnnotation(_) | Self::Schema { .. }
        )
    }
}
