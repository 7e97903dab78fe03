//! Storage traits and error types
//!
//! This module defines the trait interface the fetch session needs from a
//! storage backend, and the associated error types.

use crate::state::{FetchState, ResourceKey, ResourceKind};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Resource {0} cannot be stored with this record type")]
    ResourceMismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable `(resource) -> (token, records fetched, complete)` record
///
/// Knows nothing about fetching; the session controller drives it.
pub trait ResumeStore {
    /// Loads the resume state for a resource, `None` if nothing was ever stored
    fn load_fetch_state(&self, resource: &ResourceKey) -> StorageResult<Option<FetchState>>;

    /// Creates or overwrites the resume state for `state.resource`
    ///
    /// Overwrites rather than accumulates, so repeating a call with the same
    /// state is harmless. Clears any recorded error.
    fn save_fetch_state(&mut self, state: &FetchState) -> StorageResult<()>;

    /// Removes the resume state; only an explicit restart calls this
    fn delete_fetch_state(&mut self, resource: &ResourceKey) -> StorageResult<()>;

    /// Records why the last session failed on an existing row
    ///
    /// Does nothing if no state row exists yet.
    fn record_fetch_error(&mut self, resource: &ResourceKey, reason: &str) -> StorageResult<()>;

    /// Lists stored resume states, optionally restricted to one kind
    fn list_fetch_states(&self, kind: Option<ResourceKind>) -> StorageResult<Vec<FetchState>>;
}

/// Duplicate-safe storage for one record type
pub trait RecordStore<R> {
    /// Inserts records, silently skipping any that already exist
    ///
    /// # Returns
    ///
    /// The number of records actually inserted
    fn insert_batch(&mut self, resource: &ResourceKey, items: &[R]) -> StorageResult<usize>;

    /// Counts stored records for a resource
    fn count_records(&self, resource: &ResourceKey) -> StorageResult<u64>;

    /// Deletes every stored record of a resource
    fn purge_records(&mut self, resource: &ResourceKey) -> StorageResult<usize>;
}

/// A store able to persist one page's records together with the resume state
pub trait PageStore<R>: ResumeStore + RecordStore<R> {
    /// Inserts a page's items and saves the matching resume state as one unit
    ///
    /// The default orders items first, state second: a crash in between leaves
    /// extra records and a lagging state, which a resumed session repairs by
    /// re-fetching the page (duplicates are skipped). Backends with
    /// transactions should override this to make the pair atomic.
    fn commit_page(&mut self, items: &[R], state: &FetchState) -> StorageResult<usize> {
        let inserted = self.insert_batch(&state.resource, items)?;
        self.save_fetch_state(state)?;
        Ok(inserted)
    }

    /// Forgets a resource entirely: resume state and stored records
    ///
    /// The default deletes the state before purging records, so a failure in
    /// between leaves orphaned records under no state, which the next session
    /// treats as a fresh start. Backends with transactions should override
    /// this to make the pair atomic.
    ///
    /// # Returns
    ///
    /// The number of records purged
    fn reset_resource(&mut self, resource: &ResourceKey) -> StorageResult<usize> {
        self.delete_fetch_state(resource)?;
        self.purge_records(resource)
    }
}
