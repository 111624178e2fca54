// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Reference catalog service: an in-memory item list served over the same API
//! the browsing client consumes.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::facet::{FacetOption, FacetScope};
use crate::models::form::PersistedForm;
use crate::models::page::PageResult;
use crate::models::query::{CanonicalQuery, SortKey};
use crate::services::codec;
use anyhow::{anyhow, Result};
use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `CATALOG_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("CATALOG_VERSION");

// ---------------------------------------------------------------------------
// Catalog data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: u64,
    pub title: String,
    pub tags: Vec<String>,
    pub author_id: String,
    pub author_name: String,
    pub price_cents: u64,
    pub created_at: DateTime<Utc>,
}

impl CatalogItem {
    fn matches(&self, query: &CanonicalQuery) -> bool {
        if !query.search.is_empty()
            && !self
                .title
                .to_lowercase()
                .contains(&query.search.to_lowercase())
        {
            return false;
        }
        if !query
            .tags
            .iter()
            .all(|wanted| self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(wanted)))
        {
            return false;
        }
        if !query.authors.is_empty() && !query.authors.contains(&self.author_id) {
            return false;
        }
        let above_min = query.min_price_cents.is_none_or(|min| self.price_cents >= min);
        let below_max = query.max_price_cents.is_none_or(|max| self.price_cents <= max);
        above_min && below_max
    }
}

fn compare(a: &CatalogItem, b: &CatalogItem, sort: SortKey) -> Ordering {
    let primary = match sort {
        SortKey::Newest => b.created_at.cmp(&a.created_at),
        SortKey::Oldest => a.created_at.cmp(&b.created_at),
        SortKey::PriceAsc => a.price_cents.cmp(&b.price_cents),
        SortKey::PriceDesc => b.price_cents.cmp(&a.price_cents),
        SortKey::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Filter, sort, and slice the catalog for one query
pub fn run_query(items: &[CatalogItem], query: &CanonicalQuery) -> PageResult {
    let mut matched: Vec<&CatalogItem> = items.iter().filter(|item| item.matches(query)).collect();
    matched.sort_by(|a, b| compare(a, b, query.sort));

    let page_size = query.page_size.get();
    let offset = (query.page as usize - 1).saturating_mul(page_size as usize);
    let page_items = matched
        .iter()
        .skip(offset)
        .take(page_size as usize)
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect();

    PageResult::from_slice(query.page, page_size, matched.len() as u64, page_items)
}

/// Occurrence counts for one facet scope, in display order
pub fn facet_counts(items: &[CatalogItem], scope: FacetScope) -> Vec<FacetOption> {
    let mut counts: HashMap<String, (u64, Option<String>)> = HashMap::new();
    for item in items {
        match scope {
            FacetScope::Tags => {
                let distinct: BTreeSet<String> = item.tags.iter().map(|t| t.to_lowercase()).collect();
                for tag in distinct {
                    counts.entry(tag).or_insert((0, None)).0 += 1;
                }
            }
            FacetScope::Authors => {
                let entry = counts
                    .entry(item.author_id.clone())
                    .or_insert((0, Some(item.author_name.clone())));
                entry.0 += 1;
            }
        }
    }

    let mut options: Vec<FacetOption> = counts
        .into_iter()
        .map(|(value, (count, label))| FacetOption {
            value,
            count,
            label,
        })
        .collect();
    options.sort_by(FacetOption::display_order);
    options
}

/// Deterministic sample catalog for demos and tests
pub fn demo_catalog() -> Vec<CatalogItem> {
    const TITLES: [&str; 8] = [
        "Canvas Sneaker",
        "Leather Boot",
        "Trail Runner",
        "Wool Scarf",
        "Rain Jacket",
        "Desk Lamp",
        "Ceramic Mug",
        "Linen Shirt",
    ];
    const TAGS: [&str; 5] = ["red", "blue", "green", "sale", "new"];
    const AUTHORS: [(&str, &str); 3] = [
        ("a-101", "Ada Lovelace"),
        ("a-102", "Grace Hopper"),
        ("a-103", "Edsger Dijkstra"),
    ];

    let epoch = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap_or_default();

    (0..40u64)
        .map(|i| {
            let n = i as usize;
            let (author_id, author_name) = AUTHORS[n % AUTHORS.len()];
            let first = n % TAGS.len();
            let mut second = (n / 2 + 3) % TAGS.len();
            if second == first {
                second = (second + 1) % TAGS.len();
            }
            CatalogItem {
                id: i + 1,
                title: format!("{} {}", TITLES[n % TITLES.len()], i + 1),
                tags: vec![TAGS[first].to_string(), TAGS[second].to_string()],
                author_id: author_id.to_string(),
                author_name: author_name.to_string(),
                price_cents: 500 + (i * 737) % 12_000,
                created_at: epoch + Duration::days(i as i64),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<Vec<CatalogItem>>,
}

impl AppState {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    /// Load items from a JSON array on disk
    pub async fn from_fixture(path: &std::path::Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read fixture {}: {}", path.display(), e))?;
        let items: Vec<CatalogItem> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("Invalid fixture {}: {}", path.display(), e))?;
        Ok(Self::new(items))
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub service: String,
    pub version: String,
    /// Number of items in the served catalog
    pub items: usize,
}

pub async fn version_handler(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "catalog-browse".to_string(),
        version: VERSION.to_string(),
        items: state.items.len(),
    })
}

pub async fn items_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Json<PageResult> {
    let form = PersistedForm::from_query_string(raw.as_deref().unwrap_or_default());
    let query = codec::decode(&form);
    Json(run_query(&state.items, &query))
}

pub async fn facets_handler(
    State(state): State<AppState>,
    Path(scope): Path<String>,
) -> Result<Json<Vec<FacetOption>>, (StatusCode, String)> {
    let scope = FacetScope::parse(&scope)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown facet scope: {scope}")))?;
    Ok(Json(facet_counts(&state.items, scope)))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/items", get(items_handler))
        .route("/facets/{scope}", get(facets_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::query::PageSize;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn query() -> CanonicalQuery {
        CanonicalQuery::default()
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = create_router(AppState::new(demo_catalog()));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[test]
    fn test_run_query_paginates() {
        let items = demo_catalog();
        let page = run_query(&items, &query().with_page(2));
        assert_eq!(page.total_items, 40);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 16);
        assert!(page.has_previous);
        assert!(!page.has_next);
    }

    #[test]
    fn test_run_query_page_past_end_is_empty() {
        let items = demo_catalog();
        let page = run_query(&items, &query().with_page(9));
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_run_query_filters_by_tags_and_price() {
        let items = demo_catalog();
        let q = CanonicalQuery {
            tags: ["sale".to_string()].into_iter().collect(),
            max_price_cents: Some(5_000),
            page_size: PageSize::new(96).unwrap(),
            ..query()
        };
        let page = run_query(&items, &q);
        assert!(page.total_items > 0);
        for item in &page.items {
            let tags = item["tags"].as_array().unwrap();
            assert!(tags.iter().any(|t| t == "sale"));
            assert!(item["priceCents"].as_u64().unwrap() <= 5_000);
        }
    }

    #[test]
    fn test_run_query_sorts_by_price() {
        let items = demo_catalog();
        let q = CanonicalQuery {
            sort: SortKey::PriceAsc,
            ..query()
        };
        let page = run_query(&items, &q);
        let prices: Vec<u64> = page
            .items
            .iter()
            .map(|item| item["priceCents"].as_u64().unwrap())
            .collect();
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_facet_counts_authors_have_labels() {
        let options = facet_counts(&demo_catalog(), FacetScope::Authors);
        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|o| o.label.is_some()));
        assert_eq!(options.iter().map(|o| o.count).sum::<u64>(), 40);
    }

    #[tokio::test]
    async fn test_items_endpoint_decodes_query_string() {
        let (status, body) = get_json("/items?q=lamp&pageSize=12").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pageSize"], 12);
        assert_eq!(body["totalItems"], 5);
    }

    #[tokio::test]
    async fn test_unknown_facet_scope_returns_404() {
        let (status, _) = get_json("/facets/colors").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_version_endpoint() {
        let (status, body) = get_json("/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "catalog-browse");
        assert_eq!(body["version"], VERSION);
        assert_eq!(body["items"], 40);
    }

    #[tokio::test]
    async fn test_invalid_route_returns_404() {
        let (status, _) = get_json("/invalid").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
