//! GitHub commits API adapter
//!
//! The continuation token is the absolute `rel="next"` URL from the `Link`
//! header; the first page is built from the repository name.

use crate::config::{GitHubConfig, UserAgentConfig};
use crate::fetcher::{build_http_client, CountEstimator, FetchError, Page, PageFetcher};
use crate::records::{Commit, CommitRecord};
use crate::state::{ContinuationToken, ResourceKey};
use crate::TrawlError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Page fetcher and count estimator for a repository's commit history
#[derive(Debug, Clone)]
pub struct GitHubFetcher {
    client: Client,
    base_url: String,
    per_page: u32,
    token: Option<String>,
}

impl GitHubFetcher {
    /// Creates a fetcher from configuration, reading the API token from the
    /// configured environment variable if any
    pub fn new(config: &GitHubConfig, user_agent: &UserAgentConfig) -> Result<Self, TrawlError> {
        let client = build_http_client(user_agent, Duration::from_secs(config.timeout_secs))?;
        let token = config.token();
        if token.is_none() {
            tracing::info!("No GitHub token configured, using unauthenticated rate limits");
        }
        Ok(Self::with_client(client, &config.base_url, config.per_page, token))
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        per_page: u32,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page,
            token,
        }
    }

    /// URL of the first commits page for `owner/repo`
    pub fn first_page_url(&self, owner: &str, repo: &str, per_page: u32) -> String {
        format!(
            "{}/repos/{}/{}/commits?per_page={}",
            self.base_url, owner, repo, per_page
        )
    }

    /// Resolves the URL to request for a token
    ///
    /// A non-start token must stay on the configured API origin and under its
    /// path so that a corrupted saved token can't send credentials elsewhere.
    fn page_url(
        &self,
        resource: &ResourceKey,
        token: &ContinuationToken,
    ) -> Result<String, FetchError> {
        if token.is_start() {
            let (owner, repo) = repo_of(resource)?;
            return Ok(self.first_page_url(owner, repo, self.per_page));
        }

        let next = token.as_str();
        if !within_base(&self.base_url, next) {
            return Err(FetchError::InvalidTarget(format!(
                "continuation URL {} is outside {}",
                next, self.base_url
            )));
        }
        Ok(next.to_string())
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        tracing::debug!("GET {}", url);
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_GITHUB_JSON)
            .header(API_VERSION_HEADER, API_VERSION);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        log_rate_limit(response.headers());

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let exhausted = rate_limit_exhausted(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, exhausted, &body))
    }
}

#[async_trait]
impl PageFetcher for GitHubFetcher {
    type Record = CommitRecord;

    async fn fetch_page(
        &self,
        resource: &ResourceKey,
        token: &ContinuationToken,
    ) -> Result<Page<CommitRecord>, FetchError> {
        let url = self.page_url(resource, token)?;
        let response = self.get(&url).await?;

        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_link_header(v, "next"));

        let commits: Vec<Commit> = response.json().await?;
        let items: Vec<CommitRecord> = commits.into_iter().map(CommitRecord::from).collect();

        Ok(match next {
            Some(next) => Page::more(items, next),
            None => Page::last(items),
        })
    }
}

#[async_trait]
impl CountEstimator for GitHubFetcher {
    /// Requests one commit per page and reads the page number of `rel="last"`
    async fn estimate_total(&self, resource: &ResourceKey) -> Result<u64, FetchError> {
        let (owner, repo) = repo_of(resource)?;
        let response = self.get(&self.first_page_url(owner, repo, 1)).await?;

        let last_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_link_header(v, "last"))
            .and_then(|last| page_number(&last));

        if let Some(pages) = last_page {
            return Ok(pages);
        }

        // Single page: the body holds every commit there is
        let commits: Vec<serde_json::Value> = response.json().await?;
        Ok(commits.len() as u64)
    }
}

/// Whether `url` has the same origin as `base` and lies under its path
fn within_base(base: &str, url: &str) -> bool {
    let (Ok(base), Ok(url)) = (Url::parse(base), Url::parse(url)) else {
        return false;
    };
    if base.origin() != url.origin() {
        return false;
    }

    let prefix = base.path().trim_end_matches('/');
    match url.path().strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn repo_of(resource: &ResourceKey) -> Result<(&str, &str), FetchError> {
    resource.repo_parts().ok_or_else(|| {
        FetchError::InvalidTarget(format!("{} is not a GitHub repository", resource))
    })
}

/// GitHub signals an exhausted quota with 403 and a zero remaining count
fn classify_status(status: StatusCode, exhausted: bool, body: &str) -> FetchError {
    if status == StatusCode::FORBIDDEN && exhausted {
        return FetchError::RateLimited {
            status: status.as_u16(),
        };
    }
    FetchError::from_status(status, body)
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    header_str(headers, "x-ratelimit-remaining") == Some("0")
}

fn log_rate_limit(headers: &HeaderMap) {
    if let Some(remaining) = header_str(headers, "x-ratelimit-remaining") {
        tracing::debug!(
            "GitHub rate limit: {} remaining (resets at {})",
            remaining,
            header_str(headers, "x-ratelimit-reset").unwrap_or("?")
        );
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn page_number(url: &str) -> Option<u64> {
    let url = Url::parse(url).ok()?;
    let page = url
        .query_pairs()
        .find(|(k, _)| k == "page")
        .map(|(_, v)| v.into_owned())?;
    page.parse().ok()
}

/// Extracts the URL for relation `rel` from an RFC 8288 `Link` header
///
/// ```
/// use pagetrawl::fetcher::parse_link_header;
///
/// let header = r#"<https://api.github.com/repositories/1/commits?page=2>; rel="next", <https://api.github.com/repositories/1/commits?page=9>; rel="last""#;
/// assert_eq!(
///     parse_link_header(header, "last").as_deref(),
///     Some("https://api.github.com/repositories/1/commits?page=9")
/// );
/// ```
pub fn parse_link_header(header: &str, rel: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;

        let matches = segments.any(|param| {
            let param = param.trim();
            match param.strip_prefix("rel=") {
                Some(value) => value
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|r| r.eq_ignore_ascii_case(rel)),
                None => false,
            }
        });

        matches.then(|| url.to_string())
    })
}
