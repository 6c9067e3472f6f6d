//! AWS SDK backend
//!
//! Implements [`ManagementApi`] on top of the Q Business, Q Apps and STS
//! clients. SDK errors are classified into [`ApiErrorKind`] here so nothing
//! above this module sees SDK types.

use async_trait::async_trait;
use aws_sdk_qapps::types::LibraryItemMember;
use aws_sdk_qapps::Client as QAppsClient;
use aws_sdk_qbusiness::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_qbusiness::primitives::DateTime as SdkDateTime;
use aws_sdk_qbusiness::Client as QBusinessClient;
use aws_sdk_sts::Client as StsClient;
use chrono::{DateTime, Utc};
use qapps_core::{Application, SubApplicationItem, UsageMetadata};

use crate::error::{ApiError, ApiErrorKind, ApiResult};
use crate::traits::{CallerIdentity, LibraryItemDetail, ManagementApi, Page};

/// Management API backed by the AWS SDK
#[derive(Clone, Debug)]
pub struct AwsManagementApi {
    qbusiness: QBusinessClient,
    qapps: QAppsClient,
    sts: StsClient,
}

impl AwsManagementApi {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            qbusiness: QBusinessClient::new(sdk_config),
            qapps: QAppsClient::new(sdk_config),
            sts: StsClient::new(sdk_config),
        }
    }

    /// Title and description live on the Q App itself, not the library entry.
    /// Best effort: a failure leaves both empty.
    async fn app_text(
        &self,
        application_id: &str,
        app_id: &str,
    ) -> (Option<String>, Option<String>) {
        match self
            .qapps
            .get_q_app()
            .instance_id(application_id)
            .app_id(app_id)
            .send()
            .await
        {
            Ok(output) => (
                non_empty(output.title()),
                output.description().and_then(non_empty),
            ),
            Err(err) => {
                let error = classify("GetQApp", err);
                tracing::debug!(
                    app_id = %app_id,
                    error = %error,
                    "Q App title and description unavailable"
                );
                (None, None)
            }
        }
    }
}

/// Classify an SDK error. Timeouts and dispatch failures never carry a
/// service code and are treated as transient.
fn classify<E, R>(operation: &'static str, err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let kind = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ApiErrorKind::Transient,
        SdkError::ResponseError(_) => ApiErrorKind::Malformed,
        SdkError::ServiceError(_) => ApiErrorKind::from_code(err.code()),
        _ => ApiErrorKind::Other,
    };
    let code = err.code().map(str::to_string);
    let error = ApiError::new(kind, operation, DisplayErrorContext(&err).to_string());
    match code {
        Some(code) => error.with_code(code),
        None => error,
    }
}

fn to_utc(value: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(value.secs(), value.subsec_nanos())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn library_item_summary(application_id: &str, member: &LibraryItemMember) -> SubApplicationItem {
    SubApplicationItem {
        app_id: non_empty(member.app_id()),
        version: Some(i64::from(member.app_version())),
        status: non_empty(member.status()),
        created_at: to_utc(member.created_at()),
        updated_by: member.updated_by().and_then(non_empty),
        updated_at: member.updated_at().and_then(to_utc),
        ..SubApplicationItem::new(application_id, member.library_item_id())
    }
}

#[async_trait]
impl ManagementApi for AwsManagementApi {
    async fn caller_identity(&self) -> ApiResult<CallerIdentity> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| classify("GetCallerIdentity", e))?;

        Ok(CallerIdentity {
            account_id: output.account().map(str::to_string),
            arn: output.arn().map(str::to_string),
        })
    }

    async fn list_applications(
        &self,
        next_token: Option<&str>,
        page_size: i32,
    ) -> ApiResult<Page<Application>> {
        let output = self
            .qbusiness
            .list_applications()
            .max_results(page_size)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| classify("ListApplications", e))?;

        let items = output
            .applications()
            .iter()
            .filter_map(|summary| {
                let Some(id) = summary.application_id() else {
                    tracing::warn!("Skipping application summary without an id");
                    return None;
                };
                Some(Application {
                    name: summary.display_name().and_then(non_empty),
                    status: summary.status().map(|s| s.as_str().to_string()),
                    created_at: summary.created_at().and_then(to_utc),
                    updated_at: summary.updated_at().and_then(to_utc),
                    ..Application::new(id)
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn get_application(&self, application_id: &str) -> ApiResult<Application> {
        let output = self
            .qbusiness
            .get_application()
            .application_id(application_id)
            .send()
            .await
            .map_err(|e| classify("GetApplication", e))?;

        Ok(Application {
            name: output.display_name().and_then(non_empty),
            status: output.status().map(|s| s.as_str().to_string()),
            identity_type: output.identity_type().map(|t| t.as_str().to_string()),
            created_at: output.created_at().and_then(to_utc),
            updated_at: output.updated_at().and_then(to_utc),
            encryption_key_ref: output
                .encryption_configuration()
                .and_then(|c| c.kms_key_id())
                .and_then(non_empty),
            ..Application::new(application_id)
        })
    }

    async fn list_library_items(
        &self,
        application_id: &str,
        next_token: Option<&str>,
        page_size: i32,
    ) -> ApiResult<Page<SubApplicationItem>> {
        let output = self
            .qapps
            .list_library_items()
            .instance_id(application_id)
            .limit(page_size)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| classify("ListLibraryItems", e))?;

        Ok(Page {
            items: output
                .library_items()
                .iter()
                .map(|member| library_item_summary(application_id, member))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn get_library_item(
        &self,
        application_id: &str,
        library_item_id: &str,
    ) -> ApiResult<LibraryItemDetail> {
        let output = self
            .qapps
            .get_library_item()
            .instance_id(application_id)
            .library_item_id(library_item_id)
            .send()
            .await
            .map_err(|e| classify("GetLibraryItem", e))?;

        let (title, description) = self.app_text(application_id, output.app_id()).await;

        let item = SubApplicationItem {
            app_id: non_empty(output.app_id()),
            version: Some(i64::from(output.app_version())),
            status: non_empty(output.status()),
            created_at: to_utc(output.created_at()),
            updated_by: output.updated_by().and_then(non_empty),
            updated_at: output.updated_at().and_then(to_utc),
            title,
            description,
            ..SubApplicationItem::new(application_id, output.library_item_id())
        };

        let usage = UsageMetadata {
            user_count: output.user_count().map(i64::from),
            owner_id: non_empty(output.created_by()),
            rating_count: Some(i64::from(output.rating_count())),
            is_verified: output.is_verified(),
            is_rated_by_current_user: output.is_rated_by_user(),
            categories: output
                .categories()
                .iter()
                .map(|category| category.title().to_string())
                .collect(),
        };

        Ok(LibraryItemDetail { item, usage })
    }
}
