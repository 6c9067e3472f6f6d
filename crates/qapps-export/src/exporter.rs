use std::fmt;
use std::path::{Path, PathBuf};

use qapps_core::ExportSettings;

use crate::atomic::{ensure_dir, write_atomic};
use crate::columns::ColumnSet;
use crate::csv_writer::write_csv;
use crate::error::{ExportError, ExportResult};
use crate::json_writer::write_json;
use crate::row::ExportRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Json => write!(f, "JSON"),
        }
    }
}

/// A format that could not be written
#[derive(Debug)]
pub struct FormatFailure {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub error: ExportError,
}

/// Outcome of writing every enabled format
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<(ExportFormat, PathBuf)>,
    pub failures: Vec<FormatFailure>,
}

impl ExportReport {
    /// Whether the run counts as a success.
    ///
    /// With `fail_on_partial` any failed format fails the run. Otherwise the
    /// run fails only when nothing was written.
    pub fn is_acceptable(&self, fail_on_partial: bool) -> bool {
        if self.failures.is_empty() {
            return true;
        }
        !fail_on_partial && !self.written.is_empty()
    }
}

/// Writes rows in every enabled format
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    formats: Vec<ExportFormat>,
    include_headers: bool,
}

impl Exporter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        formats: Vec<ExportFormat>,
        include_headers: bool,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            formats,
            include_headers,
        }
    }

    pub fn from_settings(settings: &ExportSettings) -> Self {
        let mut formats = Vec::new();
        if settings.formats.csv {
            formats.push(ExportFormat::Csv);
        }
        if settings.formats.json {
            formats.push(ExportFormat::Json);
        }
        Self::new(
            &settings.output_dir,
            formats,
            settings.csv.include_headers,
        )
    }

    pub fn formats(&self) -> &[ExportFormat] {
        &self.formats
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, base_name: &str, format: ExportFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", base_name, format.extension()))
    }

    /// Write every enabled format.
    ///
    /// An unusable output directory is returned as an error. Individual
    /// format failures are collected in the report so the other formats
    /// still get written.
    pub fn export(
        &self,
        base_name: &str,
        columns: &ColumnSet,
        rows: &[ExportRow],
    ) -> ExportResult<ExportReport> {
        ensure_dir(&self.output_dir)?;

        let mut report = ExportReport::default();
        for &format in &self.formats {
            let path = self.path_for(base_name, format);
            let result = match format {
                ExportFormat::Csv => write_atomic(&path, |w| {
                    write_csv(w, columns, rows, self.include_headers)
                }),
                ExportFormat::Json => write_atomic(&path, |w| write_json(w, columns, rows)),
            };

            match result {
                Ok(()) => {
                    tracing::info!(
                        format = %format,
                        path = %path.display(),
                        rows = rows.len(),
                        "Export written"
                    );
                    report.written.push((format, path));
                }
                Err(error) => {
                    tracing::error!(
                        format = %format,
                        path = %path.display(),
                        error = %error,
                        "Export failed"
                    );
                    report.failures.push(FormatFailure {
                        format,
                        path,
                        error,
                    });
                }
            }
        }

        Ok(report)
    }
}
