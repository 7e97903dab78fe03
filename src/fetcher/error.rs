//! Fetch error classification

use reqwest::StatusCode;
use thiserror::Error;

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Errors from a single page or count request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("temporarily unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("gateway timeout (HTTP 504)")]
    GatewayTimeout,

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid request target: {0}")]
    InvalidTarget(String),
}

impl FetchError {
    /// Maps an unsuccessful HTTP status to an error
    ///
    /// | Status | Classification |
    /// |--------|----------------|
    /// | 429 | RateLimited |
    /// | 502, 503 | Unavailable |
    /// | 504 | GatewayTimeout |
    /// | other | Status |
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            429 => Self::RateLimited { status: 429 },
            code @ (502 | 503) => Self::Unavailable { status: code },
            504 => Self::GatewayTimeout,
            code => Self::Status {
                status: code,
                body: truncate_body(body),
            },
        }
    }

    /// Whether retrying the same request later could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Unavailable { .. }
                | Self::GatewayTimeout
                | Self::Timeout(_)
                | Self::Connect(_)
        )
    }

    /// Human-readable reason reported in a `Failed` outcome
    ///
    /// Transient errors collapse to a short classification; everything else
    /// keeps its full message.
    pub fn reason(&self) -> String {
        match self {
            Self::RateLimited { .. } => "rate limited".to_string(),
            Self::Unavailable { .. } => "temporarily unavailable".to_string(),
            Self::GatewayTimeout => "gateway timeout".to_string(),
            Self::Timeout(_) => "request timed out".to_string(),
            Self::Connect(_) => "connection failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
