//! Integration tests for pagetrawl
//!
//! - `session_tests`: full session loops against a scripted fetcher and a real SQLite store
//! - `fetcher_tests`: the Wayback and GitHub adapters against wiremock servers

mod fetcher_tests;
