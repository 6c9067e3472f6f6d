//! In-memory management API
//!
//! A scripted [`ManagementApi`] backend for tests. Records are served from
//! memory with page-index continuation tokens, and failures can be injected
//! per call for a fixed number of attempts or permanently.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use qapps_core::{Application, SubApplicationItem};

use crate::error::{ApiError, ApiErrorKind, ApiResult};
use crate::traits::{CallerIdentity, LibraryItemDetail, ManagementApi, Page};

/// A call as seen by the in-memory backend. Pages are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CallerIdentity,
    ListApplications {
        page: usize,
    },
    GetApplication {
        application_id: String,
    },
    ListLibraryItems {
        application_id: String,
        page: usize,
    },
    GetLibraryItem {
        application_id: String,
        library_item_id: String,
    },
}

#[derive(Debug)]
struct ScriptedFailure {
    call: ApiCall,
    error: ApiError,
    /// `None` fails forever
    remaining: Option<u32>,
}

#[derive(Debug)]
pub struct InMemoryApi {
    identity: CallerIdentity,
    applications: Vec<Application>,
    application_details: HashMap<String, Application>,
    library_items: HashMap<String, Vec<SubApplicationItem>>,
    details: HashMap<(String, String), LibraryItemDetail>,
    failures: Mutex<Vec<ScriptedFailure>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self {
            identity: CallerIdentity {
                account_id: Some("123456789012".to_string()),
                arn: Some("arn:aws:iam::123456789012:user/exporter".to_string()),
            },
            applications: Vec::new(),
            application_details: HashMap::new(),
            library_items: HashMap::new(),
            details: HashMap::new(),
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_identity(mut self, identity: CallerIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_application(mut self, application: Application) -> Self {
        self.applications.push(application);
        self
    }

    /// Record returned by `get_application`. Without one the summary is returned.
    pub fn with_application_detail(mut self, detail: Application) -> Self {
        self.application_details.insert(detail.id.clone(), detail);
        self
    }

    pub fn with_library_item(mut self, item: SubApplicationItem) -> Self {
        self.library_items
            .entry(item.application_id.clone())
            .or_default()
            .push(item);
        self
    }

    /// Detail returned by `get_library_item`. Without one the call fails with
    /// `ResourceNotFoundException`.
    pub fn with_detail(
        mut self,
        application_id: &str,
        library_item_id: &str,
        detail: LibraryItemDetail,
    ) -> Self {
        self.details.insert(
            (application_id.to_string(), library_item_id.to_string()),
            detail,
        );
        self
    }

    /// Fail every matching call with `error`
    pub fn fail_always(self, call: ApiCall, error: ApiError) -> Self {
        self.push_failure(call, error, None)
    }

    /// Fail the next `times` matching calls with `error`, then behave normally
    pub fn fail_times(self, call: ApiCall, error: ApiError, times: u32) -> Self {
        self.push_failure(call, error, Some(times))
    }

    fn push_failure(self, call: ApiCall, error: ApiError, remaining: Option<u32>) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ScriptedFailure {
                call,
                error,
                remaining,
            });
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self, call: &ApiCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: ApiCall) -> ApiResult<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.clone());

        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        let Some(failure) = failures
            .iter_mut()
            .find(|f| f.call == call && f.remaining != Some(0))
        else {
            return Ok(());
        };

        if let Some(remaining) = failure.remaining.as_mut() {
            *remaining -= 1;
        }
        Err(failure.error.clone())
    }
}

fn page_index(next_token: Option<&str>, operation: &'static str) -> ApiResult<usize> {
    match next_token {
        None => Ok(0),
        Some(token) => token
            .strip_prefix("page-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| {
                ApiError::new(
                    ApiErrorKind::Other,
                    operation,
                    format!("invalid continuation token: {}", token),
                )
                .with_code("ValidationException")
            }),
    }
}

fn paginate<T: Clone>(records: &[T], page: usize, page_size: i32) -> Page<T> {
    let size = page_size.max(1) as usize;
    let start = page * size;
    let items: Vec<T> = records.iter().skip(start).take(size).cloned().collect();
    let next_token = (start + size < records.len()).then(|| format!("page-{}", page + 1));
    Page { items, next_token }
}

#[async_trait]
impl ManagementApi for InMemoryApi {
    async fn caller_identity(&self) -> ApiResult<CallerIdentity> {
        self.record(ApiCall::CallerIdentity)?;
        Ok(self.identity.clone())
    }

    async fn list_applications(
        &self,
        next_token: Option<&str>,
        page_size: i32,
    ) -> ApiResult<Page<Application>> {
        let page = page_index(next_token, "ListApplications")?;
        self.record(ApiCall::ListApplications { page })?;
        Ok(paginate(&self.applications, page, page_size))
    }

    async fn get_application(&self, application_id: &str) -> ApiResult<Application> {
        self.record(ApiCall::GetApplication {
            application_id: application_id.to_string(),
        })?;
        self.application_details
            .get(application_id)
            .or_else(|| self.applications.iter().find(|a| a.id == application_id))
            .cloned()
            .ok_or_else(|| {
                ApiError::new(
                    ApiErrorKind::NotFound,
                    "GetApplication",
                    format!("application {} not found", application_id),
                )
                .with_code("ResourceNotFoundException")
            })
    }

    async fn list_library_items(
        &self,
        application_id: &str,
        next_token: Option<&str>,
        page_size: i32,
    ) -> ApiResult<Page<SubApplicationItem>> {
        let page = page_index(next_token, "ListLibraryItems")?;
        self.record(ApiCall::ListLibraryItems {
            application_id: application_id.to_string(),
            page,
        })?;
        let items = self
            .library_items
            .get(application_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(paginate(items, page, page_size))
    }

    async fn get_library_item(
        &self,
        application_id: &str,
        library_item_id: &str,
    ) -> ApiResult<LibraryItemDetail> {
        self.record(ApiCall::GetLibraryItem {
            application_id: application_id.to_string(),
            library_item_id: library_item_id.to_string(),
        })?;
        self.details
            .get(&(application_id.to_string(), library_item_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                ApiError::new(
                    ApiErrorKind::NotFound,
                    "GetLibraryItem",
                    format!("library item {} not found", library_item_id),
                )
                .with_code("ResourceNotFoundException")
            })
    }
}
