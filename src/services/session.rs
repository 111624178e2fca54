// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Async driver for [`QueryStateController`].
//!
//! Commands lock the controller, run the transition, release the lock, and spawn
//! whatever fetch the transition asked for. The lock is never held across an
//! await. Each spawned fetch reports back through the controller, which drops it
//! if a newer fetch has been issued in the meantime.

use crate::models::facet::FacetScope;
use crate::models::query::DraftQuery;
use crate::models::settings::BrowseSettings;
use crate::services::controller::{
    ControllerView, FacetTicket, QueryStateController, ResultTicket,
};
use crate::services::facet_cache::{CacheStorage, Clock};
use crate::services::fetcher::{FacetFetcher, FetchError, ResultFetcher};
use crate::services::history::PersistedFormStore;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Spawned fetch; resolves to whether its response reached visible state
pub type PendingFetch = JoinHandle<bool>;

/// Collaborators a session is wired to
#[derive(Clone)]
pub struct SessionPorts {
    pub results: Arc<dyn ResultFetcher>,
    pub facets: Arc<dyn FacetFetcher>,
    pub store: Arc<dyn PersistedFormStore>,
    pub storage: Arc<dyn CacheStorage>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct BrowseSession {
    controller: Arc<Mutex<QueryStateController>>,
    results: Arc<dyn ResultFetcher>,
    facets: Arc<dyn FacetFetcher>,
    store: Arc<dyn PersistedFormStore>,
    fetch_timeout: Duration,
}

impl BrowseSession {
    /// Start the controller and spawn the initial result and facet fetches.
    /// Must be called from within a tokio runtime.
    pub fn start(ports: SessionPorts, settings: &BrowseSettings) -> (Self, Vec<PendingFetch>) {
        let (controller, startup) = QueryStateController::start(
            ports.store.clone(),
            ports.storage,
            ports.clock,
            settings,
        );

        let session = Self {
            controller: Arc::new(Mutex::new(controller)),
            results: ports.results,
            facets: ports.facets,
            store: ports.store,
            fetch_timeout: settings.fetch_timeout,
        };

        let mut pending = vec![session.spawn_results(startup.results)];
        pending.extend(startup.facets.into_iter().map(|t| session.spawn_facets(t)));
        (session, pending)
    }

    pub fn edit_draft(&self, edit: impl FnOnce(&mut DraftQuery)) {
        self.lock().edit_draft(edit);
    }

    pub fn set_draft(&self, draft: DraftQuery) {
        self.lock().set_draft(draft);
    }

    pub fn commit(&self) -> Option<PendingFetch> {
        let ticket = self.lock().commit()?;
        Some(self.spawn_results(ticket))
    }

    pub fn reset(&self) -> Option<PendingFetch> {
        let ticket = self.lock().reset()?;
        Some(self.spawn_results(ticket))
    }

    pub fn go_to_page(&self, page: u32) -> Option<PendingFetch> {
        let ticket = self.lock().go_to_page(page)?;
        Some(self.spawn_results(ticket))
    }

    pub fn refresh(&self) -> Option<PendingFetch> {
        let ticket = self.lock().refresh()?;
        Some(self.spawn_results(ticket))
    }

    pub fn refresh_facets(&self) -> Vec<PendingFetch> {
        let tickets = self.lock().refresh_facets();
        tickets.into_iter().map(|t| self.spawn_facets(t)).collect()
    }

    /// Pick up the current persisted form, as if it had just changed externally
    pub fn sync_from_store(&self) -> Option<PendingFetch> {
        let form = self.store.current();
        let ticket = self.lock().on_external_change(&form)?;
        Some(self.spawn_results(ticket))
    }

    /// Forward external persisted-form changes to the controller until the
    /// session is disposed or the store goes away
    pub fn watch_history(&self) -> JoinHandle<()> {
        let session = self.clone();
        let mut changes = self.store.subscribe();

        tokio::spawn(async move {
            loop {
                let form = match changes.recv().await {
                    Ok(form) => form,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "history listener lagged, resyncing");
                        session.store.current()
                    }
                    Err(RecvError::Closed) => break,
                };
                if session.is_disposed() {
                    break;
                }
                let ticket = session.lock().on_external_change(&form);
                if let Some(ticket) = ticket {
                    session.spawn_results(ticket);
                }
            }
            tracing::debug!("history listener stopped");
        })
    }

    pub fn dispose(&self) {
        self.lock().dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().is_disposed()
    }

    pub fn view(&self) -> ControllerView {
        self.lock().view()
    }

    /// Run `read` against the controller under the lock
    pub fn with_controller<T>(&self, read: impl FnOnce(&QueryStateController) -> T) -> T {
        read(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, QueryStateController> {
        self.controller.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn spawn_results(&self, ticket: ResultTicket) -> PendingFetch {
        let controller = self.controller.clone();
        let fetcher = self.results.clone();
        let limit = self.fetch_timeout;
        let span = tracing::debug_span!("result_fetch", generation = ticket.generation);

        tokio::spawn(
            async move {
                let outcome = match tokio::time::timeout(limit, fetcher.fetch(&ticket.query)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(FetchError::Timeout(limit)),
                };
                let applied = controller
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .complete_results(ticket.generation, outcome);
                applied
            }
            .instrument(span),
        )
    }

    fn spawn_facets(&self, ticket: FacetTicket) -> PendingFetch {
        let controller = self.controller.clone();
        let fetcher = self.facets.clone();
        let limit = self.fetch_timeout;
        let scope: FacetScope = ticket.scope;
        let span = tracing::debug_span!("facet_fetch", %scope, generation = ticket.generation);

        tokio::spawn(
            async move {
                let outcome = match tokio::time::timeout(limit, fetcher.fetch(scope)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(FetchError::Timeout(limit)),
                };
                let applied = controller
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .complete_facets(ticket, outcome);
                applied
            }
            .instrument(span),
        )
    }
}
