use crate::config::types::{
    Config, GitHubConfig, SessionConfig, StorageConfig, UserAgentConfig, WaybackConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on the delay between pages (10 minutes)
const MAX_REQUEST_DELAY_MS: u64 = 600_000;

/// CDX server refuses limits above this
const MAX_CDX_BATCH_SIZE: u32 = 10_000;

/// GitHub caps `per_page` at 100
const MAX_GITHUB_PER_PAGE: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_session_config(&config.session)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_wayback_config(&config.wayback)?;
    validate_github_config(&config.github)?;
    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.request_delay_ms > MAX_REQUEST_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be <= {}ms, got {}ms",
            MAX_REQUEST_DELAY_MS, config.request_delay_ms
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate client name: non-empty, alphanumeric + hyphens only
    if config.client_name.is_empty() {
        return Err(ConfigError::Validation(
            "client_name cannot be empty".to_string(),
        ));
    }

    if !config
        .client_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "client_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.client_name
        )));
    }

    if config.client_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "client_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_wayback_config(config: &WaybackConfig) -> Result<(), ConfigError> {
    validate_base_url("wayback.base_url", &config.base_url)?;

    if config.batch_size < 1 || config.batch_size > MAX_CDX_BATCH_SIZE {
        return Err(ConfigError::Validation(format!(
            "wayback batch_size must be between 1 and {}, got {}",
            MAX_CDX_BATCH_SIZE, config.batch_size
        )));
    }

    validate_timeout("wayback", config.timeout_secs)
}

fn validate_github_config(config: &GitHubConfig) -> Result<(), ConfigError> {
    validate_base_url("github.base_url", &config.base_url)?;

    if config.per_page < 1 || config.per_page > MAX_GITHUB_PER_PAGE {
        return Err(ConfigError::Validation(format!(
            "github per_page must be between 1 and {}, got {}",
            MAX_GITHUB_PER_PAGE, config.per_page
        )));
    }

    if let Some(name) = &config.token_env {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "github token_env cannot be empty when set".to_string(),
            ));
        }
    }

    validate_timeout("github", config.timeout_secs)
}

fn validate_timeout(section: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "{} timeout_secs must be >= 1, got {}",
            section, timeout_secs
        )));
    }
    Ok(())
}

/// Base URLs must be absolute http(s) URLs
fn validate_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}
