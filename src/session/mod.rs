//! Fetch session module - drives one resource's request/insert/delay loop
//!
//! This module contains:
//! - The session controller and its per-run `Session`
//! - Cooperative cancellation shared between the loop and its caller
//! - The cancellable inter-request delay
//! - The completion fraction estimator
//! - Progress and terminal events for presenters

mod cancel;
mod controller;
mod events;
mod progress;
mod rate_limit;

pub use cancel::CancelToken;
pub use controller::{Session, SessionController};
pub use events::{Outcome, ProgressEvent, SessionEvent, TerminalEvent};
pub use progress::fraction_complete;
pub use rate_limit::{DelayOutcome, RateLimiter};

use crate::state::ResourceKey;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised before a session's loop begins
///
/// Failures inside the loop are reported through `Outcome::Failed` instead.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0} is already complete; restart it to fetch again")]
    AlreadyComplete(ResourceKey),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
