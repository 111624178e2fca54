// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{anyhow, Result};
use catalog_browse::app::{create_router, demo_catalog, AppState, VERSION};
use catalog_browse::models::form::PersistedForm;
use catalog_browse::models::settings::BrowseSettings;
use catalog_browse::services::facet_cache::{MemoryStorage, SystemClock};
use catalog_browse::services::history::MemoryHistory;
use catalog_browse::services::http_client::HttpCatalogClient;
use catalog_browse::services::logging::init_tracing;
use catalog_browse::services::session::{BrowseSession, SessionPorts};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "catalog-browse", version = VERSION, about = "Browse a paginated product catalog")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch one page for a shareable link and print the resulting view as JSON
    Browse {
        /// Query string of the link, e.g. "tags=red,blue&page=2"
        #[arg(long, default_value = "")]
        link: String,
        /// Catalog API base URL (overrides CATALOG_API_URL)
        #[arg(long)]
        api_url: Option<String>,
        /// Navigate to this page after the first page has loaded
        #[arg(long)]
        page: Option<u32>,
    },
    /// Serve the reference catalog API
    Serve {
        /// JSON array of catalog items; built-in demo data when omitted
        #[arg(long)]
        fixture: Option<PathBuf>,
        #[arg(long, env = "CATALOG_PORT", default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Browse {
            link,
            api_url,
            page,
        } => browse(&link, api_url, page).await,
        Command::Serve { fixture, port } => serve(fixture, port).await,
    }
}

async fn browse(link: &str, api_url: Option<String>, page: Option<u32>) -> Result<()> {
    let mut settings = BrowseSettings::from_env()?;
    if let Some(api_url) = api_url {
        settings.api_url = api_url;
    }

    let client = Arc::new(HttpCatalogClient::new(
        &settings.api_url,
        settings.fetch_timeout,
    )?);
    let ports = SessionPorts {
        results: client.clone(),
        facets: client,
        store: Arc::new(MemoryHistory::new(PersistedForm::from_query_string(link))),
        storage: Arc::new(MemoryStorage::new()),
        clock: Arc::new(SystemClock),
    };

    let (session, pending) = BrowseSession::start(ports, &settings);
    for result in futures::future::join_all(pending).await {
        result.map_err(|e| anyhow!("Fetch task failed: {}", e))?;
    }

    if let Some(page) = page {
        match session.go_to_page(page) {
            Some(pending) => {
                pending
                    .await
                    .map_err(|e| anyhow!("Fetch task failed: {}", e))?;
            }
            None => tracing::warn!(page, "page is out of range, staying on the current page"),
        }
    }

    let view = session.view();
    session.dispose();
    println!("{}", serde_json::to_string_pretty(&view)?);

    match view.error {
        Some(error) => Err(anyhow!("Result fetch failed: {}", error)),
        None => Ok(()),
    }
}

async fn serve(fixture: Option<PathBuf>, port: u16) -> Result<()> {
    let state = match fixture {
        Some(path) => AppState::from_fixture(&path).await?,
        None => AppState::new(demo_catalog()),
    };
    let item_count = state.items.len();
    let app = create_router(state);

    // Bind to 0.0.0.0 to accept connections from any network interface (required for Docker)
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;

    tracing::info!(%addr, items = item_count, "catalog-browse v{} listening", VERSION);

    axum::serve(listener, app).await?;
    Ok(())
}
