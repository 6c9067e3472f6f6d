//! Application Lister
//!
//! Pages through `ListApplications` until the continuation token runs out and
//! enriches each application with a `GetApplication` call.
//!
//! Failure handling:
//! - the first page failing (after retries) is fatal, since nothing useful
//!   can be exported and it almost always means bad credentials or permissions
//! - a later page failing keeps what was already collected and records a warning
//! - a failed detail call keeps the summary record and records a warning

use std::collections::HashSet;

use qapps_core::Application;
use thiserror::Error;

use crate::error::FailedCall;
use crate::retry::RetryPolicy;
use crate::traits::ManagementApi;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("Failed to list Q Business applications: {0}")]
    FirstPage(#[source] FailedCall),
}

impl From<ListError> for qapps_core::AppError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::FirstPage(failed) => failed.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ListOutcome {
    pub applications: Vec<Application>,
    /// Successfully fetched pages
    pub pages: usize,
    /// Degradations worth surfacing in the run summary
    pub warnings: Vec<String>,
    /// A later page failed; `applications` holds the pages before it
    pub truncated: bool,
}

pub struct ApplicationLister<'a, A: ManagementApi + ?Sized> {
    api: &'a A,
    retry: &'a RetryPolicy,
    page_size: i32,
}

impl<'a, A: ManagementApi + ?Sized> ApplicationLister<'a, A> {
    pub fn new(api: &'a A, retry: &'a RetryPolicy, page_size: i32) -> Self {
        Self {
            api,
            retry,
            page_size,
        }
    }

    /// Fetch every application visible to the caller, deduplicated by id.
    pub async fn list(&self) -> Result<ListOutcome, ListError> {
        let mut outcome = self.list_summaries().await?;

        let summaries = std::mem::take(&mut outcome.applications);
        for summary in summaries {
            let enriched = self.enrich(summary, &mut outcome.warnings).await;
            outcome.applications.push(enriched);
        }

        tracing::info!(
            applications = outcome.applications.len(),
            pages = outcome.pages,
            truncated = outcome.truncated,
            "Found Q Business application(s)"
        );
        Ok(outcome)
    }

    async fn list_summaries(&self) -> Result<ListOutcome, ListError> {
        let mut outcome = ListOutcome::default();
        let mut seen = HashSet::new();
        let mut next_token: Option<String> = None;

        loop {
            let token = next_token.as_deref();
            let page = match self
                .retry
                .run(|| self.api.list_applications(token, self.page_size))
                .await
            {
                Ok(page) => page,
                Err(failed) if outcome.pages == 0 => {
                    tracing::error!(error = %failed, "Failed to list Q Business applications");
                    return Err(ListError::FirstPage(failed));
                }
                Err(failed) => {
                    let warning = format!(
                        "application listing stopped after {} page(s); keeping {} application(s): {}",
                        outcome.pages,
                        outcome.applications.len(),
                        failed
                    );
                    tracing::warn!(
                        pages = outcome.pages,
                        collected = outcome.applications.len(),
                        error = %failed,
                        "Application listing incomplete, keeping partial results"
                    );
                    outcome.warnings.push(warning);
                    outcome.truncated = true;
                    return Ok(outcome);
                }
            };

            outcome.pages += 1;
            for application in page.items {
                if seen.insert(application.id.clone()) {
                    outcome.applications.push(application);
                } else {
                    tracing::debug!(application_id = %application.id, "Skipping duplicate application");
                }
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(outcome),
            }
        }
    }

    async fn enrich(&self, summary: Application, warnings: &mut Vec<String>) -> Application {
        let id = summary.id.clone();
        match self.retry.run(|| self.api.get_application(&id)).await {
            Ok(detail) => summary.merge_detail(detail),
            Err(failed) => {
                tracing::warn!(
                    application_id = %id,
                    error = %failed,
                    "Could not get application details, using summary"
                );
                warnings.push(format!("application {}: details unavailable: {}", id, failed));
                summary
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiErrorKind};
    use crate::memory::{ApiCall, InMemoryApi};
    use std::time::Duration;

    fn instant_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO, Duration::ZERO)
    }

    fn api_with(count: usize) -> InMemoryApi {
        (0..count).fold(InMemoryApi::new(), |api, i| {
            api.with_application(Application {
                name: Some(format!("App {}", i)),
                ..Application::new(format!("app-{}", i))
            })
        })
    }

    #[tokio::test]
    async fn test_follows_continuation_tokens() {
        let api = api_with(5);
        let retry = instant_retry();
        let outcome = ApplicationLister::new(&api, &retry, 2).list().await.unwrap();

        assert_eq!(outcome.pages, 3);
        assert!(!outcome.truncated);
        assert!(outcome.warnings.is_empty());
        let ids: Vec<_> = outcome.applications.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["app-0", "app-1", "app-2", "app-3", "app-4"]);
    }

    #[tokio::test]
    async fn test_deduplicates_by_id() {
        let api = api_with(2).with_application(Application::new("app-0"));
        let retry = instant_retry();
        let outcome = ApplicationLister::new(&api, &retry, 50).list().await.unwrap();
        assert_eq!(outcome.applications.len(), 2);
        assert_eq!(outcome.applications[0].name.as_deref(), Some("App 0"));
    }

    #[tokio::test]
    async fn test_first_page_failure_is_fatal() {
        let api = api_with(2).fail_always(
            ApiCall::ListApplications { page: 0 },
            ApiError::new(ApiErrorKind::Unauthorized, "ListApplications", "expired token")
                .with_code("ExpiredTokenException"),
        );
        let retry = instant_retry();
        let err = ApplicationLister::new(&api, &retry, 50)
            .list()
            .await
            .unwrap_err();
        let ListError::FirstPage(failed) = err;
        assert!(failed.error.is_unauthorized());
        assert_eq!(api.call_count(&ApiCall::ListApplications { page: 0 }), 1);
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_partial_results() {
        let api = api_with(4).fail_always(
            ApiCall::ListApplications { page: 1 },
            ApiError::new(ApiErrorKind::Transient, "ListApplications", "connection reset"),
        );
        let retry = instant_retry();
        let outcome = ApplicationLister::new(&api, &retry, 2).list().await.unwrap();

        assert!(outcome.truncated);
        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.applications.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(api.call_count(&ApiCall::ListApplications { page: 1 }), 3);
    }

    #[tokio::test]
    async fn test_transient_first_page_recovers() {
        let api = api_with(1).fail_times(
            ApiCall::ListApplications { page: 0 },
            ApiError::new(ApiErrorKind::Throttled, "ListApplications", "slow down"),
            2,
        );
        let retry = instant_retry();
        let outcome = ApplicationLister::new(&api, &retry, 50).list().await.unwrap();
        assert_eq!(outcome.applications.len(), 1);
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_detail_enrichment_and_fallback() {
        let api = api_with(2)
            .with_application_detail(Application {
                encryption_key_ref: Some("arn:aws:kms:us-east-1:123456789012:key/k1".to_string()),
                identity_type: Some("AWS_IAM_IDC".to_string()),
                ..Application::new("app-0")
            })
            .fail_always(
                ApiCall::GetApplication {
                    application_id: "app-1".to_string(),
                },
                ApiError::new(ApiErrorKind::Unauthorized, "GetApplication", "denied"),
            );
        let retry = instant_retry();
        let outcome = ApplicationLister::new(&api, &retry, 50).list().await.unwrap();

        assert_eq!(
            outcome.applications[0].encryption_key_ref.as_deref(),
            Some("arn:aws:kms:us-east-1:123456789012:key/k1")
        );
        assert_eq!(outcome.applications[0].name.as_deref(), Some("App 0"));
        assert_eq!(outcome.applications[1].encryption_key_ref, None);
        assert_eq!(outcome.applications[1].name.as_deref(), Some("App 1"));
        assert_eq!(outcome.warnings.len(), 1);
    }
}
