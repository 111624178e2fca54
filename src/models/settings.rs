// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{anyhow, Result};
use std::time::Duration;

/// Base URL used when `CATALOG_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Tunables for a browsing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseSettings {
    /// Base URL of the catalog API
    pub api_url: String,
    /// How long facet lists stay usable in the session cache
    pub facet_cache_ttl: Duration,
    /// Upper bound on a single result or facet fetch
    pub fetch_timeout: Duration,
    /// Number of page buttons shown around the current page
    pub page_window: u32,
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            facet_cache_ttl: Duration::from_secs(600),
            fetch_timeout: Duration::from_secs(15),
            page_window: 5,
        }
    }
}

impl BrowseSettings {
    /// Load settings from environment variables, falling back to defaults for
    /// anything unset
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_url = lookup("CATALOG_API_URL").unwrap_or(defaults.api_url);
        url::Url::parse(&api_url)
            .map_err(|e| anyhow!("CATALOG_API_URL is not a valid URL ({}): {}", api_url, e))?;

        let facet_cache_ttl = match lookup("FACET_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_number(&raw, "FACET_CACHE_TTL_SECS")?),
            None => defaults.facet_cache_ttl,
        };
        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number(&raw, "FETCH_TIMEOUT_SECS")?),
            None => defaults.fetch_timeout,
        };
        let page_window = match lookup("PAGE_WINDOW") {
            Some(raw) => parse_number(&raw, "PAGE_WINDOW")?,
            None => defaults.page_window,
        };

        if fetch_timeout.is_zero() {
            return Err(anyhow!("FETCH_TIMEOUT_SECS must be greater than zero"));
        }
        if page_window == 0 {
            return Err(anyhow!("PAGE_WINDOW must be greater than zero"));
        }

        Ok(Self {
            api_url,
            facet_cache_ttl,
            fetch_timeout,
            page_window,
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("{} must be a valid number, got: {}", name, raw))
}
