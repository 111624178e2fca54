// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Result ordering offered by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recently added first
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Newest,
        SortKey::Oldest,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::TitleAsc,
        SortKey::TitleDesc,
    ];

    /// Wire name used in persisted forms and API requests
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::PriceAsc => "price_asc",
            SortKey::PriceDesc => "price_desc",
            SortKey::TitleAsc => "title_asc",
            SortKey::TitleDesc => "title_desc",
        }
    }

    /// Strict lookup by wire name. Lenient parsing lives in the canonicalizer.
    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == raw)
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of items per page, restricted to a fixed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

impl PageSize {
    pub const ALLOWED: [u32; 4] = [12, 24, 48, 96];
    pub const DEFAULT: PageSize = PageSize(24);

    pub fn new(size: u32) -> Option<Self> {
        Self::ALLOWED.contains(&size).then_some(PageSize(size))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::new(value).ok_or_else(|| {
            format!(
                "page size must be one of {:?}, got: {}",
                PageSize::ALLOWED,
                value
            )
        })
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.0
    }
}

/// Normalized description of the result set to fetch.
///
/// Tag and author sets are kept in a `BTreeSet`, so equality is set equality and
/// iteration order is lexical. Build values through the canonicalizer or
/// [`DraftQuery::canonicalize`]; the price invariant (`min <= max`) is checked
/// there, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalQuery {
    pub search: String,
    pub tags: BTreeSet<String>,
    pub authors: BTreeSet<String>,
    pub min_price_cents: Option<u64>,
    pub max_price_cents: Option<u64>,
    pub sort: SortKey,
    /// 1-based
    pub page: u32,
    pub page_size: PageSize,
}

impl Default for CanonicalQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            tags: BTreeSet::new(),
            authors: BTreeSet::new(),
            min_price_cents: None,
            max_price_cents: None,
            sort: SortKey::default(),
            page: 1,
            page_size: PageSize::default(),
        }
    }
}

impl CanonicalQuery {
    /// Equality on everything except the page index.
    ///
    /// A filter change resets the page; page navigation keeps the filters. Dirty
    /// tracking and commit both compare through this.
    pub fn same_filters(&self, other: &CanonicalQuery) -> bool {
        self.search == other.search
            && self.tags == other.tags
            && self.authors == other.authors
            && self.min_price_cents == other.min_price_cents
            && self.max_price_cents == other.max_price_cents
            && self.sort == other.sort
            && self.page_size == other.page_size
    }

    pub fn with_page(&self, page: u32) -> CanonicalQuery {
        CanonicalQuery {
            page,
            ..self.clone()
        }
    }

    pub fn has_valid_price_range(&self) -> bool {
        match (self.min_price_cents, self.max_price_cents) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Which end of the price range a validation message refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBound {
    Min,
    Max,
}

impl std::fmt::Display for PriceBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceBound::Min => write!(f, "minimum price"),
            PriceBound::Max => write!(f, "maximum price"),
        }
    }
}

/// Problems that block committing a draft. Never sent to the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{bound} is not a number: {input:?}")]
    MalformedPrice { bound: PriceBound, input: String },
    #[error("minimum price ({min_cents} cents) exceeds maximum price ({max_cents} cents)")]
    InvertedPriceRange { min_cents: u64, max_cents: u64 },
}

/// Filter state as the user is editing it.
///
/// Price fields hold raw text in major currency units ("12.50"), so a half-typed
/// or empty value is representable until the draft is committed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftQuery {
    pub search: String,
    pub tags: Vec<String>,
    pub authors: Vec<String>,
    pub min_price: String,
    pub max_price: String,
    pub sort: SortKey,
    pub page: u32,
    pub page_size: PageSize,
}

impl From<&CanonicalQuery> for DraftQuery {
    fn from(query: &CanonicalQuery) -> Self {
        Self {
            search: query.search.clone(),
            tags: query.tags.iter().cloned().collect(),
            authors: query.authors.iter().cloned().collect(),
            min_price: format_cents(query.min_price_cents),
            max_price: format_cents(query.max_price_cents),
            sort: query.sort,
            page: query.page,
            page_size: query.page_size,
        }
    }
}

/// Render cents as major units for a draft text field ("1250" -> "12.50")
pub fn format_cents(cents: Option<u64>) -> String {
    match cents {
        Some(cents) => format!("{}.{:02}", cents / 100, cents % 100),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_wire_names() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::from_wire(key.as_str()), Some(key));
        }
        assert_eq!(SortKey::from_wire("NEWEST"), None);
        assert_eq!(SortKey::default(), SortKey::Newest);
    }

    #[test]
    fn test_sort_key_display() {
        assert_eq!(SortKey::PriceDesc.to_string(), "price_desc");
    }

    #[test]
    fn test_page_size_rejects_values_outside_allowed_set() {
        assert_eq!(PageSize::new(48).map(|s| s.get()), Some(48));
        assert!(PageSize::new(25).is_none());
        assert!(PageSize::new(0).is_none());
        assert_eq!(PageSize::default().get(), 24);
    }

    #[test]
    fn test_page_size_serde_validates() {
        let size: PageSize = serde_json::from_str("96").unwrap();
        assert_eq!(size.get(), 96);
        assert!(serde_json::from_str::<PageSize>("13").is_err());
    }

    #[test]
    fn test_same_filters_ignores_page() {
        let query = CanonicalQuery::default();
        assert!(query.same_filters(&query.with_page(7)));

        let other = CanonicalQuery {
            search: "lamp".to_string(),
            ..CanonicalQuery::default()
        };
        assert!(!query.same_filters(&other));
    }

    #[test]
    fn test_price_range_validity() {
        let mut query = CanonicalQuery {
            min_price_cents: Some(500),
            max_price_cents: Some(500),
            ..CanonicalQuery::default()
        };
        assert!(query.has_valid_price_range());

        query.min_price_cents = Some(501);
        assert!(!query.has_valid_price_range());

        query.max_price_cents = None;
        assert!(query.has_valid_price_range());
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(Some(1250)), "12.50");
        assert_eq!(format_cents(Some(7)), "0.07");
        assert_eq!(format_cents(None), "");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::InvertedPriceRange {
            min_cents: 900,
            max_cents: 100,
        };
        assert_eq!(
            err.to_string(),
            "minimum price (900 cents) exceeds maximum price (100 cents)"
        );

        let err = ValidationError::MalformedPrice {
            bound: PriceBound::Max,
            input: "ten".to_string(),
        };
        assert_eq!(err.to_string(), "maximum price is not a number: \"ten\"");
    }
}
