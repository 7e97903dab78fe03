//! Resource identity and pagination cursor types
use crate::TrawlError;
use std::fmt;
use url::Url;

/// The kind of remote collection a resource belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Wayback Machine CDX index entries for one domain
    Wayback,
    /// GitHub commit history for one repository
    GitHub,
}

impl ResourceKind {
    /// Converts the kind to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Wayback => "wayback",
            Self::GitHub => "github",
        }
    }

    /// Parses a kind from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "wayback" => Some(Self::Wayback),
            "github" => Some(Self::GitHub),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Identifies the single logical entity a session paginates over
///
/// Keys are immutable once built. The constructors normalize user input so the
/// same repository or domain always maps to the same persisted state row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    kind: ResourceKind,
    name: String,
}

impl ResourceKey {
    /// Builds a key from an already-normalized name (e.g. a stored row)
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Builds a Wayback key from a domain name or URL
    ///
    /// ```
    /// use pagetrawl::ResourceKey;
    ///
    /// let key = ResourceKey::wayback_domain("https://Playground.Example.com/path").unwrap();
    /// assert_eq!(key.name(), "playground.example.com");
    /// ```
    pub fn wayback_domain(input: &str) -> Result<Self, TrawlError> {
        let domain = normalize_domain(input)?;
        Ok(Self::new(ResourceKind::Wayback, domain))
    }

    /// Builds a GitHub key from an `owner/repo` string
    pub fn github_repo(input: &str) -> Result<Self, TrawlError> {
        let (owner, repo) = parse_repo(input)?;
        Ok(Self::new(ResourceKind::GitHub, format!("{}/{}", owner, repo)))
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Splits a GitHub key into `(owner, repo)`
    pub fn repo_parts(&self) -> Option<(&str, &str)> {
        if self.kind != ResourceKind::GitHub {
            return None;
        }
        self.name
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Opaque cursor returned by a remote API
///
/// The empty token means "start from the beginning"; it is also what gets
/// persisted once a resource is completely fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// The token for the first page
    pub fn start() -> Self {
        Self(String::new())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_start(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContinuationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ContinuationToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_start() {
            f.write_str("<start>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Reduces a domain or URL to a lowercase host name
fn normalize_domain(input: &str) -> Result<String, TrawlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TrawlError::InvalidResource("empty domain".to_string()));
    }

    let host = if input.contains("://") {
        let url = Url::parse(input)
            .map_err(|e| TrawlError::InvalidResource(format!("invalid URL '{}': {}", input, e)))?;
        url.host_str()
            .ok_or_else(|| TrawlError::InvalidResource(format!("URL '{}' has no host", input)))?
            .to_string()
    } else {
        input.to_string()
    };

    let host = host.to_lowercase();
    let host = host.strip_prefix("*.").unwrap_or(&host);
    let host = host.trim_end_matches('.');

    validate_domain_string(host)?;
    Ok(host.to_string())
}

/// Validates a bare domain string (no wildcard, no scheme)
fn validate_domain_string(domain: &str) -> Result<(), TrawlError> {
    if domain.is_empty() {
        return Err(TrawlError::InvalidResource(
            "domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(TrawlError::InvalidResource(format!(
            "domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.') || domain.starts_with('-') || domain.ends_with('-') {
        return Err(TrawlError::InvalidResource(format!(
            "domain '{}' cannot start with '.' or '-' or end with '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(TrawlError::InvalidResource(format!(
            "domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(TrawlError::InvalidResource(format!(
            "domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Parses `owner/repo`, dropping control characters pasted along with it
fn parse_repo(input: &str) -> Result<(String, String), TrawlError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();

    let parts: Vec<&str> = cleaned.trim().split('/').map(str::trim).collect();
    match parts.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(TrawlError::InvalidResource(format!(
            "invalid repository format: expected 'owner/repo', got '{}'",
            cleaned.trim()
        ))),
    }
}
