//! HTTP client construction shared by the API adapters

use crate::config::UserAgentConfig;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper identification and timeouts
///
/// The overall request timeout bounds every page fetch, so a stalled server
/// surfaces as `FetchError::Timeout` instead of hanging a session.
///
/// # Example
///
/// ```no_run
/// use pagetrawl::config::UserAgentConfig;
/// use pagetrawl::fetcher::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     client_name: "pagetrawl".to_string(),
///     client_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .gzip(true)
        .brotli(true)
        .build()
}
