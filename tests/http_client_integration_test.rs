// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use catalog_browse::app::{create_router, demo_catalog, AppState};
use catalog_browse::models::facet::FacetScope;
use catalog_browse::models::form::PersistedForm;
use catalog_browse::models::query::{CanonicalQuery, SortKey};
use catalog_browse::models::settings::BrowseSettings;
use catalog_browse::services::controller::{FacetStatus, ResultsStatus};
use catalog_browse::services::facet_cache::{MemoryStorage, SystemClock};
use catalog_browse::services::fetcher::{FacetFetcher, FetchError, ResultFetcher};
use catalog_browse::services::history::{MemoryHistory, PersistedFormStore};
use catalog_browse::services::http_client::HttpCatalogClient;
use catalog_browse::services::session::{BrowseSession, SessionPorts};
use std::sync::Arc;
use std::time::Duration;

/// Serve the demo catalog on an ephemeral port and return its base URL
async fn spawn_catalog() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(AppState::new(demo_catalog()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base: &str) -> HttpCatalogClient {
    HttpCatalogClient::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_items_page() {
    let client = client(&spawn_catalog().await);
    let query = CanonicalQuery {
        search: "Desk Lamp".to_string(),
        sort: SortKey::PriceDesc,
        ..CanonicalQuery::default()
    };

    let page = ResultFetcher::fetch(&client, &query).await.unwrap();
    assert_eq!(page.total_items, 5);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.page, 1);
    assert!(!page.has_next);

    let prices: Vec<u64> = page
        .items
        .iter()
        .map(|item| item["priceCents"].as_u64().unwrap())
        .collect();
    assert!(prices.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_fetch_facets() {
    let client = client(&spawn_catalog().await);

    let tags = FacetFetcher::fetch(&client, FacetScope::Tags).await.unwrap();
    assert_eq!(tags.len(), 5);
    assert_eq!(tags.iter().map(|o| o.count).sum::<u64>(), 80);

    let authors = FacetFetcher::fetch(&client, FacetScope::Authors).await.unwrap();
    assert_eq!(authors.len(), 3);
    assert!(authors.iter().all(|o| o.label.is_some()));
}

#[tokio::test]
async fn test_missing_endpoint_is_server_error() {
    let base = spawn_catalog().await;
    let client = client(&format!("{}/v9", base));

    let err = ResultFetcher::fetch(&client, &CanonicalQuery::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::Server { status: 404, .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_session_against_reference_service() {
    let base = spawn_catalog().await;
    let client = Arc::new(client(&base));
    let history = Arc::new(MemoryHistory::new(PersistedForm::from_query_string(
        "tags=SALE&sort=price_asc&pageSize=12",
    )));
    let ports = SessionPorts {
        results: client.clone(),
        facets: client,
        store: history.clone(),
        storage: Arc::new(MemoryStorage::new()),
        clock: Arc::new(SystemClock),
    };
    let settings = BrowseSettings {
        api_url: base,
        ..BrowseSettings::default()
    };

    let (session, pending) = BrowseSession::start(ports, &settings);
    for fetch in futures::future::join_all(pending).await {
        assert!(fetch.unwrap());
    }

    let view = session.view();
    assert_eq!(view.status, ResultsStatus::Idle);
    assert_eq!(view.tags_status, FacetStatus::Idle);
    assert_eq!(view.authors.len(), 3);
    assert_eq!(history.current().get("tags"), Some("sale"));

    let page = view.page.unwrap();
    assert!(page.total_items > 0);
    for item in &page.items {
        let tags = item["tags"].as_array().unwrap();
        assert!(tags.iter().any(|t| t == "sale"));
    }

    // Narrowing the filters starts over on page 1
    session.edit_draft(|draft| draft.max_price = "20".to_string());
    let fetch = session.commit().unwrap();
    assert!(fetch.await.unwrap());
    let view = session.view();
    assert_eq!(view.applied.max_price_cents, Some(2_000));
    assert_eq!(view.applied.page, 1);
    assert_eq!(history.current().get("maxPrice"), Some("2000"));
    assert!(view
        .page
        .unwrap()
        .items
        .iter()
        .all(|item| item["priceCents"].as_u64().unwrap() <= 2_000));
}
