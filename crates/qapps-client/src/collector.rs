//! Sub-Application Collector
//!
//! For one application, pages through `ListLibraryItems` and then attempts a
//! `GetLibraryItem` detail call for every item. The detail call is gated by
//! user-level authorization, so a denial is the common case: the item is kept
//! with its summary fields and no usage metadata.
//!
//! Nothing in here is fatal. Listing failures produce zero (or partial) items
//! with a warning; detail failures degrade the single item.

use qapps_core::{Application, SubApplicationItem, UsageMetadata};

use crate::error::{ApiError, FailedCall};
use crate::retry::RetryPolicy;
use crate::traits::{LibraryItemDetail, ManagementApi};

/// Outcome of the detail call for a single library item
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Success(LibraryItemDetail),
    /// Only the item's acting user may read the detail
    AuthDenied,
    /// Any other failure still present once retries were spent
    TransientFailure { attempts: u32, error: ApiError },
}

impl DetailOutcome {
    fn from_call(result: Result<LibraryItemDetail, FailedCall>) -> Self {
        match result {
            Ok(detail) => DetailOutcome::Success(detail),
            Err(failed) if failed.error.is_unauthorized() => DetailOutcome::AuthDenied,
            Err(FailedCall { error, attempts }) => {
                DetailOutcome::TransientFailure { attempts, error }
            }
        }
    }
}

/// A library item with usage metadata when the detail call succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedItem {
    pub item: SubApplicationItem,
    pub usage: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub items: usize,
    pub with_detail: usize,
    pub summary_only: usize,
    /// Subset of `summary_only` caused by authorization denials
    pub auth_denied: usize,
    /// Listing stopped early; `items` may be incomplete
    pub listing_incomplete: bool,
}

impl CollectionStats {
    pub fn absorb(&mut self, other: &CollectionStats) {
        self.items += other.items;
        self.with_detail += other.with_detail;
        self.summary_only += other.summary_only;
        self.auth_denied += other.auth_denied;
        self.listing_incomplete |= other.listing_incomplete;
    }
}

#[derive(Debug, Default)]
pub struct Collection {
    pub items: Vec<CollectedItem>,
    pub stats: CollectionStats,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct CollectorOptions {
    pub page_size: i32,
    /// Log permission-gated calls; they are never counted as warnings either way
    pub show_permission_warnings: bool,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            show_permission_warnings: true,
        }
    }
}

pub struct SubApplicationCollector<'a, A: ManagementApi + ?Sized> {
    api: &'a A,
    retry: &'a RetryPolicy,
    options: CollectorOptions,
}

impl<'a, A: ManagementApi + ?Sized> SubApplicationCollector<'a, A> {
    pub fn new(api: &'a A, retry: &'a RetryPolicy, options: CollectorOptions) -> Self {
        Self {
            api,
            retry,
            options,
        }
    }

    /// Collect every library item of `application`, in list order.
    pub async fn collect(&self, application: &Application) -> Collection {
        tracing::info!(
            application_id = %application.id,
            application = application.display_name(),
            "Retrieving Q Apps"
        );

        let mut collection = Collection::default();
        let summaries = self.list_items(application, &mut collection).await;

        for summary in summaries {
            let outcome = self.fetch_detail(&application.id, &summary.library_item_id).await;
            let collected = self.apply(summary, outcome, &mut collection);
            collection.items.push(collected);
        }

        collection.stats.items = collection.items.len();
        tracing::info!(
            application_id = %application.id,
            items = collection.stats.items,
            with_detail = collection.stats.with_detail,
            summary_only = collection.stats.summary_only,
            "Found Q App(s)"
        );
        collection
    }

    async fn list_items(
        &self,
        application: &Application,
        collection: &mut Collection,
    ) -> Vec<SubApplicationItem> {
        let mut items = Vec::new();
        let mut pages = 0usize;
        let mut next_token: Option<String> = None;

        loop {
            let token = next_token.as_deref();
            let result = self
                .retry
                .run(|| {
                    self.api
                        .list_library_items(&application.id, token, self.options.page_size)
                })
                .await;

            let page = match result {
                Ok(page) => page,
                Err(failed) => {
                    self.record_listing_failure(application, pages, &items, failed, collection);
                    return items;
                }
            };

            pages += 1;
            items.extend(page.items);
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return items,
            }
        }
    }

    fn record_listing_failure(
        &self,
        application: &Application,
        pages: usize,
        items: &[SubApplicationItem],
        failed: FailedCall,
        collection: &mut Collection,
    ) {
        collection.stats.listing_incomplete = true;

        if failed.error.is_unauthorized() && pages == 0 {
            if self.options.show_permission_warnings {
                tracing::info!(
                    application_id = %application.id,
                    "Q Apps API requires user-level authentication, no Q Apps listed"
                );
            }
            return;
        }

        tracing::warn!(
            application_id = %application.id,
            pages,
            collected = items.len(),
            error = %failed,
            "Q Apps listing incomplete"
        );
        collection.warnings.push(format!(
            "application {}: Q Apps listing stopped after {} page(s) with {} item(s): {}",
            application.id,
            pages,
            items.len(),
            failed
        ));
    }

    async fn fetch_detail(&self, application_id: &str, library_item_id: &str) -> DetailOutcome {
        let result = self
            .retry
            .run(|| self.api.get_library_item(application_id, library_item_id))
            .await;
        DetailOutcome::from_call(result)
    }

    fn apply(
        &self,
        summary: SubApplicationItem,
        outcome: DetailOutcome,
        collection: &mut Collection,
    ) -> CollectedItem {
        match outcome {
            DetailOutcome::Success(detail) => {
                collection.stats.with_detail += 1;
                CollectedItem {
                    item: summary.merge_detail(detail.item),
                    usage: Some(detail.usage),
                }
            }
            DetailOutcome::AuthDenied => {
                collection.stats.summary_only += 1;
                collection.stats.auth_denied += 1;
                if self.options.show_permission_warnings {
                    tracing::info!(
                        library_item_id = %summary.library_item_id,
                        "Detail restricted to the Q App's user, keeping summary fields"
                    );
                }
                CollectedItem {
                    item: summary,
                    usage: None,
                }
            }
            DetailOutcome::TransientFailure { attempts, error } => {
                collection.stats.summary_only += 1;
                tracing::warn!(
                    library_item_id = %summary.library_item_id,
                    attempts,
                    error = %error,
                    "Could not get Q App details, keeping summary fields"
                );
                collection.warnings.push(format!(
                    "library item {}: details unavailable after {} attempt(s): {}",
                    summary.library_item_id, attempts, error
                ));
                CollectedItem {
                    item: summary,
                    usage: None,
                }
            }
        }
    }
}
