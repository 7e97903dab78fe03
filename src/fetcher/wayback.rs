//! Wayback Machine CDX API adapter
//!
//! Pages through every capture under `*.{domain}`, collapsed on `urlkey`, using
//! the server's `resumeKey` as the continuation token.

use crate::config::{UserAgentConfig, WaybackConfig};
use crate::fetcher::{build_http_client, CountEstimator, FetchError, Page, PageFetcher};
use crate::records::CdxRecord;
use crate::state::{ContinuationToken, ResourceKey, ResourceKind};
use crate::TrawlError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::form_urlencoded;

/// Approximate number of captures in one CDX zipnum index block
pub const CDX_RECORDS_PER_INDEX_PAGE: u64 = 3000;

const CDX_FIELDS: &str = "original,timestamp,statuscode,mimetype";

/// Page fetcher and count estimator for the CDX search API
#[derive(Debug, Clone)]
pub struct WaybackFetcher {
    client: Client,
    base_url: String,
    batch_size: u32,
}

impl WaybackFetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &WaybackConfig, user_agent: &UserAgentConfig) -> Result<Self, TrawlError> {
        let client = build_http_client(user_agent, Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_client(client, &config.base_url, config.batch_size))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, base_url: &str, batch_size: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('?').to_string(),
            batch_size,
        }
    }

    /// Builds the request URL for one page
    ///
    /// The `*.` wildcard must reach the server literally; only the resume key
    /// is percent-encoded.
    pub fn page_url(&self, domain: &str, token: &ContinuationToken) -> String {
        let mut url = format!(
            "{}?url=*.{}&output=json&fl={}&collapse=urlkey&limit={}&showResumeKey=true",
            self.base_url, domain, CDX_FIELDS, self.batch_size
        );
        if !token.is_start() {
            url.push_str("&resumeKey=");
            url.extend(form_urlencoded::byte_serialize(token.as_str().as_bytes()));
        }
        url
    }

    /// Builds the request URL asking how many index pages match the domain
    pub fn count_url(&self, domain: &str) -> String {
        format!(
            "{}?url=*.{}&collapse=urlkey&showNumPages=true",
            self.base_url, domain
        )
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for WaybackFetcher {
    type Record = CdxRecord;

    async fn fetch_page(
        &self,
        resource: &ResourceKey,
        token: &ContinuationToken,
    ) -> Result<Page<CdxRecord>, FetchError> {
        let domain = domain_of(resource)?;
        let body = self.get_text(&self.page_url(domain, token)).await?;
        parse_cdx_response(&body)
    }
}

#[async_trait]
impl CountEstimator for WaybackFetcher {
    /// Estimates captures as index pages × records per index page
    async fn estimate_total(&self, resource: &ResourceKey) -> Result<u64, FetchError> {
        let domain = domain_of(resource)?;
        let body = self.get_text(&self.count_url(domain)).await?;
        let pages: u64 = body
            .trim()
            .parse()
            .map_err(|_| FetchError::Decode(format!("invalid page count: {:?}", body.trim())))?;
        Ok(pages * CDX_RECORDS_PER_INDEX_PAGE)
    }
}

/// The CDX server throttles with 503 as well as 429
fn classify_status(status: StatusCode, body: &str) -> FetchError {
    match status {
        StatusCode::SERVICE_UNAVAILABLE => FetchError::RateLimited {
            status: status.as_u16(),
        },
        _ => FetchError::from_status(status, body),
    }
}

fn domain_of(resource: &ResourceKey) -> Result<&str, FetchError> {
    match resource.kind() {
        ResourceKind::Wayback => Ok(resource.name()),
        _ => Err(FetchError::InvalidTarget(format!(
            "{} is not a Wayback domain",
            resource
        ))),
    }
}

/// Parses a CDX JSON response
///
/// Format: `[[header], [row], [row], ..., [], [resumeKey]]`. The header row is
/// skipped, as are empty and short rows. A trailing single-element row is the
/// resume key and means more pages follow.
pub fn parse_cdx_response(body: &str) -> Result<Page<CdxRecord>, FetchError> {
    if body.trim().is_empty() {
        return Ok(Page::last(Vec::new()));
    }

    let mut rows: Vec<Vec<String>> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let resume_key = match rows.last() {
        Some(last) if last.len() == 1 => rows.pop().and_then(|mut row| row.pop()),
        _ => None,
    };

    let items: Vec<CdxRecord> = rows
        .iter()
        .skip(1)
        .filter_map(|row| CdxRecord::from_row(row))
        .collect();

    Ok(match resume_key {
        Some(key) if !key.is_empty() => Page::more(items, key),
        _ => Page::last(items),
    })
}
