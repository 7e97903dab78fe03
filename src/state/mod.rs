//! State module for tracking fetch progress
//!
//! # Components
//!
//! - `ResourceKey`: identifies the repository or domain a session paginates over
//! - `ContinuationToken`: opaque cursor handed back by the remote API
//! - `FetchState`: the durable resume record persisted after every page

mod fetch_state;
mod resource;

// Re-export main types
pub use fetch_state::FetchState;
pub use resource::{ContinuationToken, ResourceKey, ResourceKind};
