//! Storage module for persisting fetched records and resume state
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Duplicate-safe record insertion (CDX captures, commits)
//! - Resume state persistence, one row per resource
//! - Atomic page commits (records + resume state in one transaction)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{SqliteRecord, SqliteStorage};
pub use traits::{PageStore, RecordStore, ResumeStore, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}
