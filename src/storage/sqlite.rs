//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::records::{CdxRecord, CommitRecord};
use crate::state::{ContinuationToken, FetchState, ResourceKey, ResourceKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    PageStore, RecordStore, ResumeStore, StorageError, StorageResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Creates the parent directory of `path` if needed.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn insert_records<R: SqliteRecord>(
        conn: &Connection,
        resource: &ResourceKey,
        items: &[R],
    ) -> StorageResult<usize> {
        let fetched_at = Utc::now().to_rfc3339();
        let mut inserted = 0;
        for item in items {
            inserted += item.insert_or_ignore(conn, resource, &fetched_at)?;
        }
        Ok(inserted)
    }

    fn delete_state_row(conn: &Connection, resource: &ResourceKey) -> StorageResult<()> {
        conn.execute(
            "DELETE FROM fetch_state WHERE resource_kind = ?1 AND resource_key = ?2",
            params![resource.kind().to_db_string(), resource.name()],
        )?;
        Ok(())
    }

    fn upsert_fetch_state(conn: &Connection, state: &FetchState) -> StorageResult<()> {
        conn.execute(
            "INSERT INTO fetch_state
                (resource_kind, resource_key, continuation_token, records_fetched, is_complete, last_error, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
             ON CONFLICT(resource_kind, resource_key) DO UPDATE SET
                continuation_token = excluded.continuation_token,
                records_fetched = excluded.records_fetched,
                is_complete = excluded.is_complete,
                last_error = NULL,
                updated_at = excluded.updated_at",
            params![
                state.resource.kind().to_db_string(),
                state.resource.name(),
                state.continuation_token.as_str(),
                state.records_fetched as i64,
                state.is_complete,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

const SELECT_FETCH_STATE: &str = "SELECT resource_kind, resource_key, continuation_token,
     records_fetched, is_complete, last_error, updated_at FROM fetch_state";

fn fetch_state_from_row(row: &Row<'_>) -> rusqlite::Result<Option<FetchState>> {
    let kind: String = row.get(0)?;
    let Some(kind) = ResourceKind::from_db_string(&kind) else {
        return Ok(None);
    };
    let records_fetched: i64 = row.get(3)?;
    let updated_at: String = row.get(6)?;

    Ok(Some(FetchState {
        resource: ResourceKey::new(kind, row.get::<_, String>(1)?),
        continuation_token: ContinuationToken::new(row.get::<_, String>(2)?),
        records_fetched: records_fetched.max(0) as u64,
        is_complete: row.get(4)?,
        last_error: row.get(5)?,
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
    }))
}

impl ResumeStore for SqliteStorage {
    fn load_fetch_state(&self, resource: &ResourceKey) -> StorageResult<Option<FetchState>> {
        let sql = format!(
            "{} WHERE resource_kind = ?1 AND resource_key = ?2",
            SELECT_FETCH_STATE
        );
        let state = self
            .conn
            .query_row(
                &sql,
                params![resource.kind().to_db_string(), resource.name()],
                fetch_state_from_row,
            )
            .optional()?;

        Ok(state.flatten())
    }

    fn save_fetch_state(&mut self, state: &FetchState) -> StorageResult<()> {
        Self::upsert_fetch_state(&self.conn, state)
    }

    fn delete_fetch_state(&mut self, resource: &ResourceKey) -> StorageResult<()> {
        Self::delete_state_row(&self.conn, resource)
    }

    fn record_fetch_error(&mut self, resource: &ResourceKey, reason: &str) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE fetch_state SET last_error = ?1, updated_at = ?2
             WHERE resource_kind = ?3 AND resource_key = ?4",
            params![
                reason,
                Utc::now().to_rfc3339(),
                resource.kind().to_db_string(),
                resource.name()
            ],
        )?;
        Ok(())
    }

    fn list_fetch_states(&self, kind: Option<ResourceKind>) -> StorageResult<Vec<FetchState>> {
        let sql = format!(
            "{} WHERE ?1 IS NULL OR resource_kind = ?1 ORDER BY resource_kind, resource_key",
            SELECT_FETCH_STATE
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![kind.map(|k| k.to_db_string())],
            fetch_state_from_row,
        )?;

        let mut states = Vec::new();
        for row in rows {
            if let Some(state) = row? {
                states.push(state);
            }
        }
        Ok(states)
    }
}

impl<R: SqliteRecord> RecordStore<R> for SqliteStorage {
    fn insert_batch(&mut self, resource: &ResourceKey, items: &[R]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let inserted = Self::insert_records(&tx, resource, items)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn count_records(&self, resource: &ResourceKey) -> StorageResult<u64> {
        R::count_for(&self.conn, resource)
    }

    fn purge_records(&mut self, resource: &ResourceKey) -> StorageResult<usize> {
        R::delete_for(&self.conn, resource)
    }
}

impl<R: SqliteRecord> PageStore<R> for SqliteStorage {
    /// Inserts the items and saves the state in a single transaction
    fn commit_page(&mut self, items: &[R], state: &FetchState) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let inserted = Self::insert_records(&tx, &state.resource, items)?;
        Self::upsert_fetch_state(&tx, state)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Deletes the state and purges the records in a single transaction
    fn reset_resource(&mut self, resource: &ResourceKey) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        Self::delete_state_row(&tx, resource)?;
        let purged = R::delete_for(&tx, resource)?;
        tx.commit()?;
        Ok(purged)
    }
}

/// A record type with a SQLite table behind it
pub trait SqliteRecord {
    /// Inserts the record unless an identical key already exists
    ///
    /// # Returns
    ///
    /// 1 if a row was inserted, 0 if it already existed
    fn insert_or_ignore(
        &self,
        conn: &Connection,
        resource: &ResourceKey,
        fetched_at: &str,
    ) -> StorageResult<usize>;

    fn count_for(conn: &Connection, resource: &ResourceKey) -> StorageResult<u64>;

    fn delete_for(conn: &Connection, resource: &ResourceKey) -> StorageResult<usize>;
}

impl SqliteRecord for CdxRecord {
    fn insert_or_ignore(
        &self,
        conn: &Connection,
        resource: &ResourceKey,
        fetched_at: &str,
    ) -> StorageResult<usize> {
        let domain = wayback_domain(resource)?;
        let mut stmt = conn.prepare_cached(
            "INSERT OR IGNORE INTO wayback_records (domain, url, timestamp, status_code, mime_type, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let changed = stmt.execute(params![
            domain,
            self.url,
            self.timestamp,
            self.status_code,
            self.mime_type,
            fetched_at
        ])?;
        Ok(changed)
    }

    fn count_for(conn: &Connection, resource: &ResourceKey) -> StorageResult<u64> {
        let domain = wayback_domain(resource)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM wayback_records WHERE domain = ?1",
            params![domain],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn delete_for(conn: &Connection, resource: &ResourceKey) -> StorageResult<usize> {
        let domain = wayback_domain(resource)?;
        Ok(conn.execute(
            "DELETE FROM wayback_records WHERE domain = ?1",
            params![domain],
        )?)
    }
}

impl SqliteRecord for CommitRecord {
    fn insert_or_ignore(
        &self,
        conn: &Connection,
        resource: &ResourceKey,
        fetched_at: &str,
    ) -> StorageResult<usize> {
        let (owner, repo) = github_repo(resource)?;
        let mut stmt = conn.prepare_cached(
            "INSERT OR IGNORE INTO commits (
                repo_owner, repo_name, sha, message, author_name, author_email, author_date,
                committer_name, committer_email, committer_date,
                github_author_login, github_committer_login, html_url, fetched_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )?;
        let changed = stmt.execute(params![
            owner,
            repo,
            self.sha,
            self.message,
            self.author_name,
            self.author_email,
            self.author_date.map(|d| d.to_rfc3339()),
            self.committer_name,
            self.committer_email,
            self.committer_date.map(|d| d.to_rfc3339()),
            self.github_author_login,
            self.github_committer_login,
            self.html_url,
            fetched_at
        ])?;
        Ok(changed)
    }

    fn count_for(conn: &Connection, resource: &ResourceKey) -> StorageResult<u64> {
        let (owner, repo) = github_repo(resource)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM commits WHERE repo_owner = ?1 AND repo_name = ?2",
            params![owner, repo],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn delete_for(conn: &Connection, resource: &ResourceKey) -> StorageResult<usize> {
        let (owner, repo) = github_repo(resource)?;
        Ok(conn.execute(
            "DELETE FROM commits WHERE repo_owner = ?1 AND repo_name = ?2",
            params![owner, repo],
        )?)
    }
}

fn wayback_domain(resource: &ResourceKey) -> StorageResult<&str> {
    match resource.kind() {
        ResourceKind::Wayback => Ok(resource.name()),
        _ => Err(StorageError::ResourceMismatch(resource.to_string())),
    }
}

fn github_repo(resource: &ResourceKey) -> StorageResult<(&str, &str)> {
    resource
        .repo_parts()
        .ok_or_else(|| StorageError::ResourceMismatch(resource.to_string()))
}
