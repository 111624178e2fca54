// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Reconciliation of draft, applied, and persisted query state.
//!
//! The controller is a synchronous state machine. Transitions that need I/O hand
//! back a ticket; whoever runs the fetch reports the outcome with the ticket's
//! generation. Only the outcome of the most recently issued generation ever
//! reaches visible state, so completions may arrive in any order.

use crate::models::facet::{FacetOption, FacetScope};
use crate::models::form::PersistedForm;
use crate::models::page::PageResult;
use crate::models::query::{CanonicalQuery, DraftQuery};
use crate::models::settings::BrowseSettings;
use crate::services::codec;
use crate::services::facet_cache::{CacheStorage, Clock, FacetCache};
use crate::services::fetcher::FetchError;
use crate::services::history::{PersistedFormStore, WriteMode};
use crate::services::logging::redact_search_text;
use crate::services::view::page_window;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsStatus {
    Idle,
    FetchingResults,
    FetchFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetStatus {
    Idle,
    FetchingFacets,
    FetchFailed,
}

/// A result fetch the caller must run and report back
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTicket {
    pub generation: u64,
    pub query: CanonicalQuery,
}

/// A facet fetch the caller must run and report back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetTicket {
    pub scope: FacetScope,
    pub generation: u64,
}

/// Fetches to issue right after construction
#[derive(Debug, Clone)]
pub struct Startup {
    pub results: ResultTicket,
    pub facets: Vec<FacetTicket>,
}

struct FacetSlot {
    cache: FacetCache,
    options: Vec<FacetOption>,
    generation: u64,
    status: FacetStatus,
}

impl FacetSlot {
    fn seeded(cache: FacetCache) -> Self {
        let options = cache.read();
        tracing::debug!(scope = %cache.scope(), seeded = options.len(), "seeded facets from cache");
        Self {
            cache,
            options,
            generation: 0,
            status: FacetStatus::Idle,
        }
    }
}

/// Everything a view needs to render, captured at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct ControllerView {
    pub applied: CanonicalQuery,
    pub draft: DraftQuery,
    pub link: String,
    pub page: Option<PageResult>,
    pub error: Option<String>,
    pub status: ResultsStatus,
    pub is_loading: bool,
    pub tags: Vec<FacetOption>,
    pub authors: Vec<FacetOption>,
    pub tags_status: FacetStatus,
    pub authors_status: FacetStatus,
    pub is_dirty: bool,
    pub is_draft_invalid: bool,
    pub validation_messages: Vec<String>,
    pub page_buttons: Vec<u32>,
}

pub struct QueryStateController {
    draft: DraftQuery,
    applied: CanonicalQuery,
    page: Option<PageResult>,
    /// Applied query the held page was fetched for
    page_query: Option<CanonicalQuery>,
    error: Option<String>,
    status: ResultsStatus,
    results_generation: u64,
    tags: FacetSlot,
    authors: FacetSlot,
    store: Arc<dyn PersistedFormStore>,
    facet_ttl: Duration,
    page_window: u32,
    disposed: bool,
}

impl QueryStateController {
    /// Build the controller from the current persisted form and seed facets from
    /// the cache. The returned fetches must be run to populate the view.
    pub fn start(
        store: Arc<dyn PersistedFormStore>,
        storage: Arc<dyn CacheStorage>,
        clock: Arc<dyn Clock>,
        settings: &BrowseSettings,
    ) -> (Self, Startup) {
        let applied = codec::decode(&store.current());
        let tags = FacetSlot::seeded(FacetCache::new(
            storage.clone(),
            clock.clone(),
            FacetScope::Tags,
        ));
        let authors = FacetSlot::seeded(FacetCache::new(storage, clock, FacetScope::Authors));

        let mut controller = Self {
            draft: DraftQuery::from(&applied),
            applied,
            page: None,
            page_query: None,
            error: None,
            status: ResultsStatus::Idle,
            results_generation: 0,
            tags,
            authors,
            store,
            facet_ttl: settings.facet_cache_ttl,
            page_window: settings.page_window,
            disposed: false,
        };

        controller.write_back(WriteMode::Replace);
        let results = controller.issue_results();
        let facets = controller.refresh_facets();
        (controller, Startup { results, facets })
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// The persisted form changed outside the controller (link, back/forward).
    ///
    /// A different query replaces both applied and draft; unsaved draft edits are
    /// discarded. An equal query is ignored, which is what stops the controller's
    /// own writes from looping back.
    pub fn on_external_change(&mut self, form: &PersistedForm) -> Option<ResultTicket> {
        if self.disposed {
            return None;
        }
        let incoming = codec::decode(form);
        if incoming == self.applied {
            tracing::debug!("external form change matches applied query, ignoring");
            return None;
        }

        tracing::info!(page = incoming.page, "applying externally changed query");
        self.draft = DraftQuery::from(&incoming);
        self.applied = incoming;
        self.write_back(WriteMode::Replace);
        Some(self.issue_results())
    }

    pub fn edit_draft(&mut self, edit: impl FnOnce(&mut DraftQuery)) {
        if self.disposed {
            return;
        }
        edit(&mut self.draft);
    }

    pub fn set_draft(&mut self, draft: DraftQuery) {
        self.edit_draft(|current| *current = draft);
    }

    /// Apply the draft on page 1. Invalid drafts are ignored, and so is a commit
    /// that would leave the applied query unchanged. Committing unchanged
    /// filters from a later page returns to page 1.
    pub fn commit(&mut self) -> Option<ResultTicket> {
        if self.disposed {
            return None;
        }
        let candidate = match self.draft.canonicalize() {
            Ok(query) => query.with_page(1),
            Err(errors) => {
                tracing::debug!(errors = errors.len(), "commit blocked by invalid draft");
                return None;
            }
        };
        if candidate == self.applied {
            tracing::debug!("commit without change, ignoring");
            return None;
        }

        self.draft = DraftQuery::from(&candidate);
        self.apply(candidate, WriteMode::Push)
    }

    /// Clear every filter and go back to page 1
    pub fn reset(&mut self) -> Option<ResultTicket> {
        if self.disposed {
            return None;
        }
        let defaults = CanonicalQuery::default();
        self.draft = DraftQuery::from(&defaults);
        if self.applied == defaults {
            return None;
        }
        self.apply(defaults, WriteMode::Push)
    }

    /// Move to another page of the applied query, leaving the draft untouched.
    ///
    /// Pages outside `1..=total_pages` are rejected once the total is known for
    /// the applied filters. Before that any positive page is accepted, the
    /// current one included.
    pub fn go_to_page(&mut self, page: u32) -> Option<ResultTicket> {
        if self.disposed || page < 1 {
            return None;
        }
        let total_pages = self.known_total_pages();
        if total_pages > 0 && page > total_pages {
            tracing::debug!(page, total_pages, "page out of range, ignoring");
            return None;
        }
        if total_pages > 0 && page == self.applied.page {
            return None;
        }

        let next = self.applied.with_page(page);
        self.apply(next, WriteMode::Push)
    }

    /// Re-issue the applied query, e.g. after a failed fetch
    pub fn refresh(&mut self) -> Option<ResultTicket> {
        if self.disposed {
            return None;
        }
        Some(self.issue_results())
    }

    /// Re-issue the facet fetches for every scope
    pub fn refresh_facets(&mut self) -> Vec<FacetTicket> {
        if self.disposed {
            return Vec::new();
        }
        FacetScope::ALL
            .into_iter()
            .map(|scope| {
                let slot = self.slot_mut(scope);
                slot.generation += 1;
                slot.status = FacetStatus::FetchingFacets;
                FacetTicket {
                    scope,
                    generation: slot.generation,
                }
            })
            .collect()
    }

    /// Stop reacting to anything. Completions that arrive later are dropped.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    /// Report a finished result fetch. Returns whether it reached visible state.
    pub fn complete_results(
        &mut self,
        generation: u64,
        outcome: Result<PageResult, FetchError>,
    ) -> bool {
        if self.disposed {
            return false;
        }
        if generation != self.results_generation {
            tracing::debug!(
                generation,
                current = self.results_generation,
                "discarding stale result response"
            );
            return false;
        }

        match outcome {
            Ok(page) => {
                tracing::debug!(generation, items = page.items.len(), total = page.total_items, "results updated");
                self.page = Some(page);
                self.page_query = Some(self.applied.clone());
                self.error = None;
                self.status = ResultsStatus::Idle;
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "result fetch failed");
                self.error = Some(e.to_string());
                self.status = ResultsStatus::FetchFailed;
            }
        }
        true
    }

    /// Report a finished facet fetch. Returns whether it reached visible state.
    pub fn complete_facets(
        &mut self,
        ticket: FacetTicket,
        outcome: Result<Vec<FacetOption>, FetchError>,
    ) -> bool {
        if self.disposed {
            return false;
        }
        let ttl = self.facet_ttl;
        let slot = self.slot_mut(ticket.scope);
        if ticket.generation != slot.generation {
            tracing::debug!(scope = %ticket.scope, generation = ticket.generation, "discarding stale facet response");
            return false;
        }

        match outcome {
            Ok(mut options) => {
                options.sort_by(FacetOption::display_order);
                slot.cache.write(&options, ttl);
                slot.options = options;
                slot.status = FacetStatus::Idle;
            }
            Err(e) => {
                tracing::warn!(scope = %ticket.scope, error = %e, kept = slot.options.len(), "facet fetch failed, keeping current options");
                slot.status = FacetStatus::FetchFailed;
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    pub fn applied(&self) -> &CanonicalQuery {
        &self.applied
    }

    pub fn draft(&self) -> &DraftQuery {
        &self.draft
    }

    pub fn page_result(&self) -> Option<&PageResult> {
        self.page.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> ResultsStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == ResultsStatus::FetchingResults
    }

    pub fn facets(&self, scope: FacetScope) -> &[FacetOption] {
        &self.slot(scope).options
    }

    pub fn facet_status(&self, scope: FacetScope) -> FacetStatus {
        self.slot(scope).status
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_draft_invalid(&self) -> bool {
        self.draft.canonicalize().is_err()
    }

    /// Whether committing the draft would change the applied filters. An invalid
    /// draft always counts as dirty.
    pub fn is_dirty(&self) -> bool {
        match self.draft.canonicalize() {
            Ok(query) => !query.same_filters(&self.applied),
            Err(_) => true,
        }
    }

    pub fn page_buttons(&self) -> Vec<u32> {
        page_window(self.applied.page, self.known_total_pages(), self.page_window)
    }

    pub fn view(&self) -> ControllerView {
        ControllerView {
            applied: self.applied.clone(),
            draft: self.draft.clone(),
            link: codec::encode(&self.applied).to_query_string(),
            page: self.page.clone(),
            error: self.error.clone(),
            status: self.status,
            is_loading: self.is_loading(),
            tags: self.tags.options.clone(),
            authors: self.authors.options.clone(),
            tags_status: self.tags.status,
            authors_status: self.authors.status,
            is_dirty: self.is_dirty(),
            is_draft_invalid: self.is_draft_invalid(),
            validation_messages: self
                .draft
                .validation_errors()
                .iter()
                .map(ToString::to_string)
                .collect(),
            page_buttons: self.page_buttons(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn apply(&mut self, query: CanonicalQuery, mode: WriteMode) -> Option<ResultTicket> {
        tracing::info!(
            search = %redact_search_text(&query.search),
            tags = query.tags.len(),
            authors = query.authors.len(),
            sort = %query.sort,
            page = query.page,
            "applying query"
        );
        self.applied = query;
        self.write_back(mode);
        Some(self.issue_results())
    }

    /// Persist the applied query unless the store already holds the same form
    fn write_back(&self, mode: WriteMode) {
        let form = codec::encode(&self.applied);
        if self.store.current() == form {
            return;
        }
        tracing::debug!(link = %form, ?mode, "writing persisted form");
        self.store.write(form, mode);
    }

    fn issue_results(&mut self) -> ResultTicket {
        self.results_generation += 1;
        self.status = ResultsStatus::FetchingResults;
        ResultTicket {
            generation: self.results_generation,
            query: self.applied.clone(),
        }
    }

    /// Zero while no page has arrived for the applied filters
    fn known_total_pages(&self) -> u32 {
        match (&self.page, &self.page_query) {
            (Some(page), Some(query)) if query.same_filters(&self.applied) => page.total_pages,
            _ => 0,
        }
    }

    fn slot(&self, scope: FacetScope) -> &FacetSlot {
        match scope {
            FacetScope::Tags => &self.tags,
            FacetScope::Authors => &self.authors,
        }
    }

    fn slot_mut(&mut self, scope: FacetScope) -> &mut FacetSlot {
        match scope {
            FacetScope::Tags => &mut self.tags,
            FacetScope::Authors => &mut self.authors,
        }
    }
}
