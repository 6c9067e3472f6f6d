//! Credential file loading
//!
//! Credentials come from a dotenv-format file (`./config/.env` by default).
//! The file is parsed without touching the process environment so that two
//! runs in the same process cannot leak keys into each other.

use std::fmt;
use std::path::Path;

use crate::config::ExportConfig;
use crate::error::AppError;

const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const REGION: &str = "AWS_REGION";
const PROFILE: &str = "AWS_PROFILE";
const ACCOUNT_ID: &str = "AWS_ACCOUNT_ID";

/// Values read from the credential file. Every field is optional.
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub account_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// How the API clients should authenticate.
#[derive(Clone, PartialEq)]
pub enum CredentialSource {
    /// Static keys, optionally with a session token
    Static {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    },
    /// Named profile from the shared AWS config files
    Profile(String),
    /// SDK default provider chain (environment, instance role, SSO cache, ...)
    DefaultChain,
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Static {
                access_key_id,
                session_token,
                ..
            } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("session", &session_token.is_some())
                .finish(),
            CredentialSource::Profile(name) => f.debug_tuple("Profile").field(name).finish(),
            CredentialSource::DefaultChain => f.write_str("DefaultChain"),
        }
    }
}

impl Credentials {
    /// Read the credential file. A missing file yields empty credentials.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Credentials file not found, falling back to the default AWS provider chain"
            );
            return Ok(Self::default());
        }

        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            AppError::Credentials(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut credentials = Self::default();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                AppError::Credentials(format!("failed to parse {}: {}", path.display(), e))
            })?;
            credentials.set(&key, value);
        }

        tracing::debug!(path = %path.display(), "Credentials file loaded");
        Ok(credentials)
    }

    fn set(&mut self, key: &str, value: String) {
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match key {
            ACCESS_KEY_ID => self.access_key_id = value,
            SECRET_ACCESS_KEY => self.secret_access_key = value,
            SESSION_TOKEN => self.session_token = value,
            REGION => self.region = value,
            PROFILE => self.profile = value,
            ACCOUNT_ID => self.account_id = value,
            _ => {}
        }
    }

    /// Decide how to authenticate.
    ///
    /// A named profile wins over static keys: the configured profile first,
    /// then one named in the file. Static keys from the file come next, then
    /// the SDK default chain.
    pub fn source(&self, config: &ExportConfig) -> Result<CredentialSource, AppError> {
        if let Some(profile) = config.aws.profile.as_ref().or(self.profile.as_ref()) {
            return Ok(CredentialSource::Profile(profile.clone()));
        }

        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(CredentialSource::Static {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: self.session_token.clone(),
            }),
            (Some(_), None) => Err(AppError::Credentials(format!(
                "{} is set but {} is missing",
                ACCESS_KEY_ID, SECRET_ACCESS_KEY
            ))),
            (None, Some(_)) => Err(AppError::Credentials(format!(
                "{} is set but {} is missing",
                SECRET_ACCESS_KEY, ACCESS_KEY_ID
            ))),
            (None, None) => Ok(CredentialSource::DefaultChain),
        }
    }

    /// Account id the export should be labelled with when the identity check
    /// cannot supply one.
    pub fn expected_account<'a>(&'a self, config: &'a ExportConfig) -> Option<&'a str> {
        config
            .aws
            .expected_account_id
            .as_deref()
            .or(self.account_id.as_deref())
    }
}
