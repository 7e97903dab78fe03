//! Pagetrawl: resumable retrieval of server-paginated record sets
//!
//! This crate walks paginated HTTP APIs (Wayback Machine CDX index entries,
//! GitHub commit history) one page at a time, persisting every page as it
//! arrives so that an interrupted retrieval resumes exactly where it stopped,
//! across network failures and process restarts alike.

pub mod config;
pub mod fetcher;
pub mod records;
pub mod session;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Pagetrawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetcher::FetchError),

    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Pagetrawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use session::{Outcome, SessionController, SessionEvent, TerminalEvent};
pub use state::{ContinuationToken, FetchState, ResourceKey, ResourceKind};
