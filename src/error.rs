use std::path::PathBuf;

use thiserror::Error;

/// Application-level error: an exit code plus a message for stderr.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Configuration / usage error (exit code 2).
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Per-series failures.
///
/// `Network` and `Parse` are recoverable: the orchestrator substitutes the
/// bundled sample. `UnknownSeries` is a configuration problem and `Io` only
/// affects the file being written.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SeriesError {
    #[error("unknown series '{key}' (run `econ list` for valid keys)")]
    UnknownSeries { key: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response format: {0}")]
    Parse(String),

    #[error("I/O error on '{}': {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl SeriesError {
    pub fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        SeriesError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether the orchestrator may substitute an offline sample.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, SeriesError::Network(_) | SeriesError::Parse(_))
    }
}

impl From<SeriesError> for AppError {
    fn from(err: SeriesError) -> Self {
        match err {
            SeriesError::UnknownSeries { .. } => AppError::config(err.to_string()),
            SeriesError::Io { .. } => AppError::new(2, err.to_string()),
            SeriesError::Network(_) | SeriesError::Parse(_) => AppError::new(4, err.to_string()),
        }
    }
}
