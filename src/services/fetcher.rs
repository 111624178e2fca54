// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Ports to the remote catalog. Implementations must be safe to call
//! speculatively: a superseded fetch still runs to completion and its result is
//! dropped by the controller.

use crate::models::facet::{FacetOption, FacetScope};
use crate::models::page::PageResult;
use crate::models::query::CanonicalQuery;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("server responded with {status}: {body}")]
    Server { status: u16, body: String },
    #[error("no response after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ResultFetcher: Send + Sync {
    async fn fetch(&self, query: &CanonicalQuery) -> Result<PageResult, FetchError>;
}

#[async_trait]
pub trait FacetFetcher: Send + Sync {
    async fn fetch(&self, scope: FacetScope) -> Result<Vec<FacetOption>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages() {
        let err = FetchError::Server {
            status: 503,
            body: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "server responded with 503: maintenance");
        assert_eq!(
            FetchError::Timeout(Duration::from_secs(2)).to_string(),
            "no response after 2s"
        );
    }
}
