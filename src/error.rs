use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the roofline engine and the typed records feeding it.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum RooflineError {
    /// Mismatched lengths, an empty platform set or sweep, or a value that is
    /// not a positive finite number.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RooflineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RooflineError::InvalidInput(reason.into())
    }
}

/// Errors raised while reading hardware or workload CSV files.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("{origin} line {line}: each row must contain {expected} entries, found {found}")]
    Arity {
        origin: String,
        line: u64,
        expected: &'static str,
        found: usize,
    },

    #[error("{origin} line {line}: {field} '{value}' is not a number")]
    Number {
        origin: String,
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("{origin} line {line}: {source}")]
    Record {
        origin: String,
        line: u64,
        #[source]
        source: RooflineError,
    },

    #[error("{origin} line {line}: duplicate name '{name}'")]
    Duplicate {
        origin: String,
        line: u64,
        name: String,
    },
}

/// Errors raised by the chart renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("output directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("drawing failed: {0}")]
    Draw(String),
}
