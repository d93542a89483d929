use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SkeletonError – everything that can go wrong while loading an NDskl file
// ---------------------------------------------------------------------------

/// Errors raised while reading a skeleton file.
///
/// None of these are recoverable: a single count mismatch shifts every later
/// line offset, so the whole load is abandoned.
#[derive(Debug, Error)]
pub enum SkeletonError {
    #[error("skeleton file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("not an NDskl file: expected first line 'ANDSKEL', found '{found}'")]
    MagicMismatch { found: String },

    #[error("{what}: declared {declared} but found {actual}")]
    StructuralMismatch {
        what: String,
        declared: usize,
        actual: usize,
    },

    #[error("section marker '{marker}' not found")]
    MissingMarker { marker: &'static str },

    #[error("{what} refers to index {index}, but only {len} exist")]
    DanglingReference {
        what: String,
        index: usize,
        len: usize,
    },

    #[error("line {line}: '{token}' is not a valid number")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    #[error("attribute table: {0}")]
    Table(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding: {0}")]
    Json(#[from] serde_json::Error),
}

impl SkeletonError {
    pub(crate) fn mismatch(what: impl Into<String>, declared: usize, actual: usize) -> Self {
        SkeletonError::StructuralMismatch {
            what: what.into(),
            declared,
            actual,
        }
    }

    pub(crate) fn invalid_line(line: usize, reason: impl Into<String>) -> Self {
        SkeletonError::InvalidLine {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SkeletonError>;

// ---------------------------------------------------------------------------
// StatsError – image statistics failures
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StatsError {
    /// The field has no values at all.
    #[error("field is empty")]
    EmptyField,

    #[error("invalid radius bracket: r = {r}, dr = {dr}")]
    InvalidRadius { r: f64, dr: f64 },

    #[error("invalid statistics config: {0}")]
    Config(String),

    #[error("reading statistics config: {0}")]
    Io(#[from] std::io::Error),
}
