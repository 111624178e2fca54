// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::facet::{FacetOption, FacetScope};
use crate::models::page::PageResult;
use crate::models::query::CanonicalQuery;
use crate::services::codec::encode_explicit;
use crate::services::fetcher::{FacetFetcher, FetchError, ResultFetcher};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Catalog API client implementing both fetcher ports over HTTP
pub struct HttpCatalogClient {
    client: reqwest::Client,
    items_endpoint: Url,
    tags_endpoint: Url,
    authors_endpoint: Url,
}

impl HttpCatalogClient {
    /// Create a client for the API rooted at `base_url`.
    /// A bare `host:port` is treated as plain HTTP.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.to_string()
        } else {
            format!("http://{}", base_url)
        };
        // Url::join replaces the last segment unless the base ends with '/'
        if !url.ends_with('/') {
            url.push('/');
        }

        let base = Url::parse(&url).map_err(|e| anyhow!("Invalid catalog URL {}: {}", url, e))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            items_endpoint: base.join("items")?,
            tags_endpoint: base.join("facets/tags")?,
            authors_endpoint: base.join("facets/authors")?,
        })
    }

    /// Request URL for one page of results. Paging parameters are always sent.
    pub fn items_url(&self, query: &CanonicalQuery) -> Url {
        let mut url = self.items_endpoint.clone();
        url.set_query(Some(&encode_explicit(query).to_query_string()));
        url
    }

    pub fn facets_url(&self, scope: FacetScope) -> Url {
        match scope {
            FacetScope::Tags => self.tags_endpoint.clone(),
            FacetScope::Authors => self.authors_endpoint.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl ResultFetcher for HttpCatalogClient {
    async fn fetch(&self, query: &CanonicalQuery) -> Result<PageResult, FetchError> {
        self.get_json(self.items_url(query)).await
    }
}

#[async_trait]
impl FacetFetcher for HttpCatalogClient {
    async fn fetch(&self, scope: FacetScope) -> Result<Vec<FacetOption>, FetchError> {
        self.get_json(self.facets_url(scope)).await
    }
}
