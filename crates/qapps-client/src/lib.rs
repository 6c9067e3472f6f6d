//! Q Apps Client Library
//!
//! This crate wraps the management API behind the [`ManagementApi`] trait and
//! builds the two retrieval stages on top of it:
//! - [`ApplicationLister`] pages through every Q Business application
//! - [`SubApplicationCollector`] pages through each application's Q Apps
//!   library and enriches every item with a detail call
//!
//! Retrieval is strictly sequential: one call in flight at a time.

pub mod collector;
pub mod error;
pub mod lister;
pub mod retry;
pub mod traits;

#[cfg(feature = "aws")]
pub mod aws;
#[cfg(feature = "aws")]
pub mod factory;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

// Re-export commonly used types
pub use collector::{
    CollectedItem, Collection, CollectionStats, CollectorOptions, DetailOutcome,
    SubApplicationCollector,
};
pub use error::{ApiError, ApiErrorKind, ApiResult, FailedCall};
pub use lister::{ApplicationLister, ListError, ListOutcome};
pub use retry::RetryPolicy;
pub use traits::{CallerIdentity, LibraryItemDetail, ManagementApi, Page};

#[cfg(feature = "aws")]
pub use aws::AwsManagementApi;
#[cfg(feature = "aws")]
pub use factory::create_api;
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryApi;
