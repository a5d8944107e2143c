// src/utils/error.rs
use thiserror::Error;

/// Recoverable problems inside the extraction core. None of these escape
/// `process_document`: each one is logged and degraded to a default value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Malformed table (page {page}, index {index}): {reason}")]
    MalformedTable {
        page: u32,
        index: u32,
        reason: String,
    },

    #[error("Malformed row {row} in table {index}: {reason}")]
    MalformedRow {
        index: u32,
        row: usize,
        reason: String,
    },

    #[error("Could not parse numeric value: '{0}'")]
    NumericParse(String),

    #[error("No signature reached the confidence threshold (best score {best_score:.3})")]
    AmbiguousClassification { best_score: f64 },
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input document is empty: {0}")]
    Empty(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input failed: {0}")]
    Input(#[from] InputError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Output serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
