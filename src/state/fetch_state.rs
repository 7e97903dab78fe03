//! Persisted per-resource resume state

use crate::state::{ContinuationToken, ResourceKey};
use chrono::{DateTime, Utc};

/// Durable resume record for one resource
///
/// Created on the first successful page insert, overwritten after every page,
/// and only removed by an explicit restart.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState {
    pub resource: ResourceKey,

    /// Where the next page request begins; empty once complete
    pub continuation_token: ContinuationToken,

    /// Records durably stored for this resource so far
    pub records_fetched: u64,

    /// Set only when the remote reported no further pages
    pub is_complete: bool,

    /// Reason the most recent session for this resource failed, if it did
    pub last_error: Option<String>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl FetchState {
    pub fn new(
        resource: ResourceKey,
        continuation_token: ContinuationToken,
        records_fetched: u64,
        is_complete: bool,
    ) -> Self {
        Self {
            resource,
            continuation_token,
            records_fetched,
            is_complete,
            last_error: None,
            updated_at: None,
        }
    }

    /// State describing a resource nothing has been fetched for yet
    pub fn fresh(resource: ResourceKey) -> Self {
        Self::new(resource, ContinuationToken::start(), 0, false)
    }

    /// Whether a session can pick up from this state
    pub fn is_resumable(&self) -> bool {
        !self.is_complete
    }
}
