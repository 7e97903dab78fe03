//! Wayback CDX capture records

/// A Wayback Machine CDX index entry
///
/// Identity within a domain is the captured URL: the CDX query collapses on
/// `urlkey`, so a URL appears at most once per domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdxRecord {
    /// The original captured URL
    pub url: String,

    /// Capture time in 14-digit `YYYYMMDDhhmmss` form
    pub timestamp: String,

    pub status_code: Option<u16>,
    pub mime_type: Option<String>,
}

impl CdxRecord {
    /// Builds a record from one CDX JSON row (`original, timestamp, statuscode, mimetype`)
    ///
    /// Returns `None` for rows with fewer than four fields. Status code and MIME
    /// type are absent when the server reports `""` or `"-"`.
    pub fn from_row(row: &[String]) -> Option<Self> {
        if row.len() < 4 {
            return None;
        }

        Some(Self {
            url: row[0].clone(),
            timestamp: row[1].clone(),
            status_code: present(&row[2]).and_then(|s| s.parse().ok()),
            mime_type: present(&row[3]).map(str::to_string),
        })
    }
}

fn present(field: &str) -> Option<&str> {
    match field.trim() {
        "" | "-" => None,
        value => Some(value),
    }
}
