//! Fetcher module: one-page-at-a-time access to paginated remote APIs
//!
//! This module contains:
//! - The `PageFetcher` and `CountEstimator` traits the session controller drives
//! - `FetchError`, with the transient/permanent classification surfaced to callers
//! - HTTP client construction shared by the adapters
//! - Adapters for the Wayback Machine CDX API and the GitHub commits API

mod error;
mod github;
mod http;
mod wayback;

pub use error::FetchError;
pub use github::{parse_link_header, GitHubFetcher};
pub use http::build_http_client;
pub use wayback::{parse_cdx_response, WaybackFetcher, CDX_RECORDS_PER_INDEX_PAGE};

use crate::state::{ContinuationToken, ResourceKey};
use async_trait::async_trait;

/// One page of results plus the cursor for the next one
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,

    /// Cursor for the following page; meaningless when `has_more` is false
    pub continuation_token: ContinuationToken,

    pub has_more: bool,
}

impl<R> Page<R> {
    /// A page followed by more pages
    pub fn more(items: Vec<R>, continuation_token: impl Into<ContinuationToken>) -> Self {
        Self {
            items,
            continuation_token: continuation_token.into(),
            has_more: true,
        }
    }

    /// The final page of a resource
    pub fn last(items: Vec<R>) -> Self {
        Self {
            items,
            continuation_token: ContinuationToken::start(),
            has_more: false,
        }
    }
}

/// Performs exactly one paginated request; holds no state between calls
///
/// Implementations are responsible for bounding their own request time;
/// a hung request must surface as a `FetchError`, never hang forever.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Record: Send + Sync;

    async fn fetch_page(
        &self,
        resource: &ResourceKey,
        token: &ContinuationToken,
    ) -> Result<Page<Self::Record>, FetchError>;
}

/// Best-effort query for how many records a resource will yield
///
/// Failures are never fatal to a session; a zero or failed estimate switches
/// progress reporting to its unknown-total mode.
#[async_trait]
pub trait CountEstimator: Send + Sync {
    async fn estimate_total(&self, resource: &ResourceKey) -> Result<u64, FetchError>;
}

/// Estimator for APIs that can't report a total
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEstimate;

#[async_trait]
impl CountEstimator for NoEstimate {
    async fn estimate_total(&self, _resource: &ResourceKey) -> Result<u64, FetchError> {
        Ok(0)
    }
}
