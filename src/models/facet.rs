// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which facet list a fetch or cache entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetScope {
    Tags,
    Authors,
}

impl FacetScope {
    pub const ALL: [FacetScope; 2] = [FacetScope::Tags, FacetScope::Authors];

    /// Path segment used by the catalog API
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetScope::Tags => "tags",
            FacetScope::Authors => "authors",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "tags" => Some(FacetScope::Tags),
            "authors" => Some(FacetScope::Authors),
            _ => None,
        }
    }

    /// Storage key of the cached option list for this scope
    pub fn cache_key(&self) -> &'static str {
        match self {
            FacetScope::Tags => "catalog.facets.tags.v1",
            FacetScope::Authors => "catalog.facets.authors.v1",
        }
    }
}

impl std::fmt::Display for FacetScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A filter option and how many catalog items carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOption {
    /// Tag or author identifier
    pub value: String,
    pub count: u64,
    /// Display name (authors only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FacetOption {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Display order: highest count first, then value
    pub fn display_order(a: &FacetOption, b: &FacetOption) -> Ordering {
        b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value))
    }
}

/// Facet options persisted in the session cache with an absolute expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedFacets {
    pub options: Vec<FacetOption>,
    pub expires_at: DateTime<Utc>,
}

impl CachedFacets {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
