use std::path::PathBuf;

use qapps_core::AppError;
use thiserror::Error;

/// Export operation errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Output directory {path} is not usable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to move finished file into place at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No columns enabled in output.columns")]
    NoColumns,
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NoColumns => AppError::Config(err.to_string()),
            other => AppError::Export(other.to_string()),
        }
    }
}
