//! Configuration module for callwatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the data service (default: "http://localhost:8000")
    pub api_url: String,
    /// Per-request timeout (default: 30s)
    pub http_timeout: Duration,
    /// Realtime polling period (default: 30s)
    pub poll_interval: Duration,
    /// Maximum rows requested from the call list (default: 500)
    pub call_list_limit: usize,
    /// Initial page size of the call list (default: 25)
    pub page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            http_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(30),
            call_list_limit: 500,
            page_size: 25,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CALLWATCH_API_URL`: data service base URL
    /// - `CALLWATCH_HTTP_TIMEOUT_SECS`: request timeout in seconds
    /// - `CALLWATCH_POLL_INTERVAL_SECS`: realtime polling period in seconds
    /// - `CALLWATCH_CALL_LIST_LIMIT`: call list row limit
    /// - `CALLWATCH_PAGE_SIZE`: call list page size
    ///
    /// Unparseable or zero values keep the default.
    pub fn load() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(url) = var("CALLWATCH_API_URL") {
            if !url.trim().is_empty() {
                cfg.api_url = url.trim().to_string();
            }
        }

        if let Some(secs) = positive(var("CALLWATCH_HTTP_TIMEOUT_SECS")) {
            cfg.http_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = positive(var("CALLWATCH_POLL_INTERVAL_SECS")) {
            cfg.poll_interval = Duration::from_secs(secs);
        }

        if let Some(limit) = positive(var("CALLWATCH_CALL_LIST_LIMIT")) {
            cfg.call_list_limit = limit as usize;
        }

        if let Some(size) = positive(var("CALLWATCH_PAGE_SIZE")) {
            cfg.page_size = size as usize;
        }

        cfg
    }
}

fn positive(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
}
