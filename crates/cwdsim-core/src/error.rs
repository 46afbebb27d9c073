//! Engine-wide error type.
//!
//! One structured enum for the whole crate. Per-cell problems (steep slope,
//! undefined water-holding capacity) are not errors: they become no-data
//! exclusions recorded by the terrain layer. Errors here are tuple-scoped:
//! a failed (site, climate-source) run reports one of these and the
//! orchestrator moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing or malformed input data for a run.
    #[error("invalid input data: {message}")]
    Input { message: String },

    /// A required input file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A text input could not be parsed.
    #[error("parse error in {} at line {line}: {message}", file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Two co-registered inputs disagree on size.
    #[error("size mismatch for {name}: expected {expected}, got {actual}")]
    SizeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A scalar input is outside its valid domain.
    #[error("{field} = {value} outside valid range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Underlying I/O failure, with the path that produced it.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialize(#[from] bincode::Error),

    /// Invalid run configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl EngineError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}
