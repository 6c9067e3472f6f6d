//! Management API abstraction
//!
//! This module defines the ManagementApi trait that the AWS SDK adapter and
//! the in-memory test backend implement. The retrieval stages only ever talk
//! to this trait.

use async_trait::async_trait;
use qapps_core::{Application, SubApplicationItem, UsageMetadata};

use crate::error::ApiResult;

/// One page of a paginated list call
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Identity the credentials resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct CallerIdentity {
    pub account_id: Option<String>,
    pub arn: Option<String>,
}

impl CallerIdentity {
    /// Last path segment of the ARN (user or role session name)
    pub fn principal_name(&self) -> Option<&str> {
        self.arn.as_deref().and_then(|arn| arn.rsplit('/').next())
    }
}

/// Result of a successful detail call
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryItemDetail {
    /// Detail fields; merged over the summary record by the collector
    pub item: SubApplicationItem,
    pub usage: UsageMetadata,
}

#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Resolve the identity behind the configured credentials
    async fn caller_identity(&self) -> ApiResult<CallerIdentity>;

    /// Fetch one page of Q Business applications
    async fn list_applications(
        &self,
        next_token: Option<&str>,
        page_size: i32,
    ) -> ApiResult<Page<Application>>;

    /// Fetch full details for one application
    async fn get_application(&self, application_id: &str) -> ApiResult<Application>;

    /// Fetch one page of Q Apps library items for an application
    async fn list_library_items(
        &self,
        application_id: &str,
        next_token: Option<&str>,
        page_size: i32,
    ) -> ApiResult<Page<SubApplicationItem>>;

    /// Fetch description, rating and usage details for one library item
    async fn get_library_item(
        &self,
        application_id: &str,
        library_item_id: &str,
    ) -> ApiResult<LibraryItemDetail>;
}
