use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Pagetrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub wayback: WaybackConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

/// Fetch session behavior
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Delay inserted between successive page requests (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl SessionConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

/// Client identification sent with every request
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the client
    #[serde(rename = "client-name")]
    pub client_name: String,

    /// Version of the client
    #[serde(rename = "client-version")]
    pub client_version: String,

    /// URL with information about the client operator
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.client_name, self.client_version, self.contact_url
        )
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Wayback Machine CDX endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct WaybackConfig {
    #[serde(rename = "base-url", default = "default_wayback_base_url")]
    pub base_url: String,

    /// Records requested per CDX page
    #[serde(rename = "batch-size", default = "default_wayback_batch_size")]
    pub batch_size: u32,

    #[serde(rename = "timeout-secs", default = "default_wayback_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WaybackConfig {
    fn default() -> Self {
        Self {
            base_url: default_wayback_base_url(),
            batch_size: default_wayback_batch_size(),
            timeout_secs: default_wayback_timeout_secs(),
        }
    }
}

/// GitHub REST API settings
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    #[serde(rename = "base-url", default = "default_github_base_url")]
    pub base_url: String,

    /// Commits requested per page (GitHub caps this at 100)
    #[serde(rename = "per-page", default = "default_github_per_page")]
    pub per_page: u32,

    #[serde(rename = "timeout-secs", default = "default_github_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the environment variable holding an API token
    #[serde(rename = "token-env")]
    pub token_env: Option<String>,
}

impl GitHubConfig {
    /// Reads the API token from the configured environment variable, if any
    pub fn token(&self) -> Option<String> {
        self.token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.trim().is_empty())
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: default_github_base_url(),
            per_page: default_github_per_page(),
            timeout_secs: default_github_timeout_secs(),
            token_env: None,
        }
    }
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_wayback_base_url() -> String {
    "https://web.archive.org/cdx/search/cdx".to_string()
}

fn default_wayback_batch_size() -> u32 {
    1000
}

fn default_wayback_timeout_secs() -> u64 {
    180
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_per_page() -> u32 {
    100
}

fn default_github_timeout_secs() -> u64 {
    30
}
