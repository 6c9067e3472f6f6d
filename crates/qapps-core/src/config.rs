//! Configuration module
//!
//! Settings are layered with figment, highest priority last:
//! 1. Built-in defaults
//! 2. The YAML configuration file (`./input/config.yml` by default)
//! 3. Environment variables with the `QAPPS_` prefix, `__` separating sections
//!    (`QAPPS_AWS__REGION` maps to `aws.region`)
//!
//! The resulting [`ExportConfig`] is immutable for the rest of the run.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_FILENAME_PATTERN: &str = "qapps_export_{datetime}";
const DEFAULT_OUTPUT_DIR: &str = "output";
const MAX_PAGE_SIZE: i32 = 100;
const ENV_PREFIX: &str = "QAPPS_";
const ACCOUNT_ID_DIGITS: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Account the credentials are expected to resolve to; a mismatch is only a warning
    #[serde(default, deserialize_with = "account_id::deserialize")]
    pub expected_account_id: Option<String>,
    /// Per-operation timeout applied to every API call
    pub timeout_secs: u64,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            expected_account_id: None,
            timeout_secs: 30,
        }
    }
}

/// Account ids are 12-digit strings, but unquoted YAML and the env provider
/// both hand them over as integers. Integers are zero-padded back to 12 digits.
mod account_id {
    use serde::{Deserialize, Deserializer};

    use super::ACCOUNT_ID_DIGITS;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(n)) => Some(format!("{:0width$}", n, width = ACCOUNT_ID_DIGITS)),
            Some(Raw::Text(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
            None => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub include_empty_apps: bool,
    pub formats: ExportFormats,
    pub filename_pattern: String,
    pub output_dir: String,
    /// Fail the run when any single format fails, not only when all of them do
    pub fail_on_partial_export: bool,
    pub csv: CsvSettings,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            include_empty_apps: true,
            formats: ExportFormats::default(),
            filename_pattern: DEFAULT_FILENAME_PATTERN.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            fail_on_partial_export: false,
            csv: CsvSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFormats {
    pub csv: bool,
    pub json: bool,
}

impl Default for ExportFormats {
    fn default() -> Self {
        Self {
            csv: true,
            json: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvSettings {
    pub include_headers: bool,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            include_headers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub max_applications_per_page: i32,
    pub max_qapps_per_page: i32,
    pub retry: RetrySettings,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            max_applications_per_page: 50,
            max_qapps_per_page: 100,
            retry: RetrySettings::default(),
        }
    }
}

/// Bounded retry policy for transient API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first call
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetrySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Column name to enabled flag. Columns not listed keep their default.
    pub columns: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub verbose: bool,
    /// Report permission-gated detail calls at all (they are always non-fatal)
    pub show_permission_warnings: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            verbose: true,
            show_permission_warnings: true,
        }
    }
}

impl ExportConfig {
    /// Load configuration from defaults, the YAML file at `path` and the environment.
    ///
    /// A missing file is not an error: defaults are used and a warning is logged.
    /// A file that exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using default configuration"
            );
        }

        let config: ExportConfig = Self::figment(path).extract()?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can extract from it inside a `figment::Jail`.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let path = path.as_ref();
        if path.exists() {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.export.formats.csv && !self.export.formats.json {
            return Err(AppError::Config(
                "at least one of export.formats.csv or export.formats.json must be enabled"
                    .to_string(),
            ));
        }

        let pattern = self.export.filename_pattern.trim();
        if pattern.is_empty() {
            return Err(AppError::Config(
                "export.filename_pattern must not be empty".to_string(),
            ));
        }
        if pattern.contains('/') || pattern.contains('\\') {
            return Err(AppError::Config(format!(
                "export.filename_pattern must be a file name, not a path: {}",
                pattern
            )));
        }

        for (field, value) in [
            (
                "retrieval.max_applications_per_page",
                self.retrieval.max_applications_per_page,
            ),
            (
                "retrieval.max_qapps_per_page",
                self.retrieval.max_qapps_per_page,
            ),
        ] {
            if !(1..=MAX_PAGE_SIZE).contains(&value) {
                return Err(AppError::Config(format!(
                    "{} must be between 1 and {}, got {}",
                    field, MAX_PAGE_SIZE, value
                )));
            }
        }

        if let Some(account) = &self.aws.expected_account_id {
            if account.len() != ACCOUNT_ID_DIGITS || !account.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AppError::Config(format!(
                    "aws.expected_account_id must be a 12-digit account id, got {}",
                    account
                )));
            }
        }

        if self.retrieval.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retrieval.retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Region from config, else the given fallback, else `us-east-1`.
    pub fn resolve_region(&self, fallback: Option<&str>) -> String {
        self.aws
            .region
            .as_deref()
            .or(fallback)
            .unwrap_or(DEFAULT_REGION)
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.aws.timeout_secs)
    }
}
