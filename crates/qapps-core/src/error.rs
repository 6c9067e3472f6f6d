//! Error types module
//!
//! `AppError` is the top-level error of an export run. Library crates keep
//! their own narrower error enums and convert into this one at the boundary
//! where the run decides whether to abort.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Machine-readable error code, used in the final diagnostic
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Credentials(_) => "CREDENTIALS_ERROR",
            AppError::Api(_) => "API_ERROR",
            AppError::Export(_) => "EXPORT_ERROR",
            AppError::Io(_) => "IO_ERROR",
        }
    }

    /// Suggested next step for the operator
    pub fn suggested_action(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Check the YAML configuration file and QAPPS_* variables",
            AppError::Credentials(_) => {
                "Refresh the credentials file or check the configured profile"
            }
            AppError::Api(_) => "Verify permissions for the Q Business and Q Apps APIs",
            AppError::Export(_) | AppError::Io(_) => "Check that the output directory is writable",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}
