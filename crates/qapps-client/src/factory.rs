use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::config::Credentials as SdkCredentials;
use qapps_core::{AppError, CredentialSource, Credentials, ExportConfig};

use crate::aws::AwsManagementApi;

const PROVIDER_NAME: &str = "qapps-export-env-file";

/// Build the AWS-backed management API from configuration and credentials.
///
/// SDK-level retries are disabled; transient failures go through
/// [`crate::RetryPolicy`] so the attempt budget is the one in the config.
pub async fn create_api(
    config: &ExportConfig,
    credentials: &Credentials,
) -> Result<AwsManagementApi, AppError> {
    let region = config.resolve_region(credentials.region.as_deref());
    let source = credentials.source(config)?;

    let timeouts = TimeoutConfig::builder()
        .operation_timeout(config.timeout())
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.clone()))
        .timeout_config(timeouts)
        .retry_config(RetryConfig::disabled());

    loader = match &source {
        CredentialSource::Static {
            access_key_id,
            secret_access_key,
            session_token,
        } => loader.credentials_provider(SdkCredentials::new(
            access_key_id.clone(),
            secret_access_key.clone(),
            session_token.clone(),
            None,
            PROVIDER_NAME,
        )),
        CredentialSource::Profile(name) => loader.profile_name(name.clone()),
        CredentialSource::DefaultChain => loader,
    };

    tracing::debug!(region = %region, source = ?source, "Creating AWS clients");

    let sdk_config = loader.load().await;
    Ok(AwsManagementApi::new(&sdk_config))
}
