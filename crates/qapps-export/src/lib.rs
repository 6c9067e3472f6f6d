//! Q Apps Export Library
//!
//! Turns collected applications and library items into flat rows and writes
//! them out:
//! - [`columns`] declares the fixed 25-column schema and resolves which
//!   columns are enabled for a run
//! - [`row`] joins application, item and usage records into [`ExportRow`]s
//! - [`Exporter`] writes CSV and JSON artifacts atomically, each format
//!   independently of the other

pub mod atomic;
pub mod columns;
pub mod csv_writer;
pub mod error;
pub mod exporter;
pub mod filename;
pub mod json_writer;
pub mod row;

// Re-export commonly used types
pub use columns::{CellValue, Column, ColumnSet, SCHEMA};
pub use error::{ExportError, ExportResult};
pub use exporter::{ExportFormat, ExportReport, Exporter, FormatFailure};
pub use filename::{expand_pattern, FilenameContext};
pub use row::{build_rows, ApplicationRows, ExportRow};
