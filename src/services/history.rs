// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Persisted-form transport: where the shareable query lives between
//! navigations.
//!
//! Writes made by the controller are never echoed to subscribers; only
//! external navigation (links, back/forward) is.

use crate::models::form::PersistedForm;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// How a controller write lands in the navigation history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// New history entry (user changed what they are looking at)
    Push,
    /// Rewrite the current entry in place (normalisation)
    Replace,
}

pub trait PersistedFormStore: Send + Sync {
    fn current(&self) -> PersistedForm;
    fn write(&self, form: PersistedForm, mode: WriteMode);
    /// Externally triggered changes only
    fn subscribe(&self) -> broadcast::Receiver<PersistedForm>;
}

const CHANNEL_CAPACITY: usize = 32;

struct HistoryState {
    entries: Vec<PersistedForm>,
    cursor: usize,
    writes: usize,
}

/// In-memory navigation history with back/forward, for tests and the CLI
pub struct MemoryHistory {
    state: Mutex<HistoryState>,
    changes: broadcast::Sender<PersistedForm>,
}

impl MemoryHistory {
    pub fn new(initial: PersistedForm) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(HistoryState {
                entries: vec![initial],
                cursor: 0,
                writes: 0,
            }),
            changes,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Follow a link: push a new entry and notify subscribers
    pub fn navigate(&self, form: PersistedForm) {
        {
            let mut state = self.lock();
            let next = state.cursor + 1;
            state.entries.truncate(next);
            state.entries.push(form.clone());
            state.cursor = next;
        }
        self.notify(form);
    }

    /// Step back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        let form = {
            let mut state = self.lock();
            if state.cursor == 0 {
                return false;
            }
            state.cursor -= 1;
            state.entries[state.cursor].clone()
        };
        self.notify(form);
        true
    }

    /// Step forward one entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        let form = {
            let mut state = self.lock();
            if state.cursor + 1 >= state.entries.len() {
                return false;
            }
            state.cursor += 1;
            state.entries[state.cursor].clone()
        };
        self.notify(form);
        true
    }

    /// Number of writes issued through [`PersistedFormStore::write`]
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn notify(&self, form: PersistedForm) {
        // No receivers is fine: nothing is listening yet
        let _ = self.changes.send(form);
    }
}

impl PersistedFormStore for MemoryHistory {
    fn current(&self) -> PersistedForm {
        let state = self.lock();
        state.entries[state.cursor].clone()
    }

    fn write(&self, form: PersistedForm, mode: WriteMode) {
        let mut state = self.lock();
        state.writes += 1;
        match mode {
            WriteMode::Push => {
                let next = state.cursor + 1;
                state.entries.truncate(next);
                state.entries.push(form);
                state.cursor = next;
            }
            WriteMode::Replace => {
                let cursor = state.cursor;
                state.entries[cursor] = form;
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<PersistedForm> {
        self.changes.subscribe()
    }
}
