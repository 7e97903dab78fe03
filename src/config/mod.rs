//! Configuration module for Pagetrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pagetrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pagetrawl.toml")).unwrap();
//! println!("Delay between pages: {}ms", config.session.request_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, GitHubConfig, SessionConfig, StorageConfig, UserAgentConfig, WaybackConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
