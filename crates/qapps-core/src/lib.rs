//! Q Apps Export Core Library
//!
//! This crate provides the domain models, configuration, credential loading and
//! error types shared by the client, export and CLI crates.

pub mod config;
pub mod credentials;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{
    AwsSettings, CsvSettings, ExportConfig, ExportFormats, ExportSettings, LoggingSettings,
    OutputSettings, RetrievalSettings, RetrySettings,
};
pub use credentials::{CredentialSource, Credentials};
pub use error::AppError;
pub use models::{Application, RunMetadata, SubApplicationItem, UsageMetadata};
