//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Pagetrawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One resume row per resource
CREATE TABLE IF NOT EXISTS fetch_state (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    resource_kind TEXT NOT NULL,
    resource_key TEXT NOT NULL,
    continuation_token TEXT NOT NULL DEFAULT '',
    records_fetched INTEGER NOT NULL DEFAULT 0,
    is_complete INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE(resource_kind, resource_key)
);

-- Wayback Machine CDX captures, unique per domain and URL
CREATE TABLE IF NOT EXISTS wayback_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    url TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    status_code INTEGER,
    mime_type TEXT,
    fetched_at TEXT NOT NULL,
    UNIQUE(domain, url)
);

CREATE INDEX IF NOT EXISTS idx_wayback_domain ON wayback_records(domain);

-- GitHub commits, unique per repository and SHA
CREATE TABLE IF NOT EXISTS commits (
    repo_owner TEXT NOT NULL,
    repo_name TEXT NOT NULL,
    sha TEXT NOT NULL,
    message TEXT NOT NULL,
    author_name TEXT NOT NULL,
    author_email TEXT NOT NULL,
    author_date TEXT,
    committer_name TEXT NOT NULL,
    committer_email TEXT NOT NULL,
    committer_date TEXT,
    github_author_login TEXT,
    github_committer_login TEXT,
    html_url TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    PRIMARY KEY (repo_owner, repo_name, sha)
);

CREATE INDEX IF NOT EXISTS idx_commits_committer ON commits(committer_name, committer_email);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
