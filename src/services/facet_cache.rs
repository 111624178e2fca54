// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Session-scoped cache of facet option lists.
//!
//! The cache is advisory: a read that fails for any reason is a miss and a
//! failed write is dropped. Nothing here returns an error to the caller.

use crate::models::facet::{CachedFacets, FacetOption, FacetScope};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Failure of the underlying key-value store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded ({needed} bytes needed, {available} available)")]
    QuotaExceeded { needed: usize, available: usize },
}

/// String key-value store scoped to one browsing session
pub trait CacheStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}

/// Source of the current time for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        let next = chrono::Duration::from_std(by)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta));
        if let Some(next) = next {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// In-process storage that lives as long as the session holding it.
///
/// An optional quota (in bytes of stored values) mimics browser storage limits.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(quota),
        }
    }
}

impl CacheStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;

        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(used);
            if value.len() > available {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    available,
                });
            }
        }

        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Cached option list for one facet scope
#[derive(Clone)]
pub struct FacetCache {
    storage: Arc<dyn CacheStorage>,
    clock: Arc<dyn Clock>,
    scope: FacetScope,
}

impl FacetCache {
    pub fn new(storage: Arc<dyn CacheStorage>, clock: Arc<dyn Clock>, scope: FacetScope) -> Self {
        Self {
            storage,
            clock,
            scope,
        }
    }

    pub fn scope(&self) -> FacetScope {
        self.scope
    }

    /// Fresh cached options in display order, or an empty list
    pub fn read(&self) -> Vec<FacetOption> {
        let key = self.scope.cache_key();
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(scope = %self.scope, "facet cache miss");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(scope = %self.scope, error = %e, "facet cache read failed");
                return Vec::new();
            }
        };

        let cached: CachedFacets = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(scope = %self.scope, error = %e, "discarding corrupt facet cache entry");
                return Vec::new();
            }
        };

        if !cached.is_fresh(self.clock.now()) {
            tracing::debug!(scope = %self.scope, expired_at = %cached.expires_at, "facet cache entry expired");
            return Vec::new();
        }

        let mut options = cached.options;
        options.sort_by(FacetOption::display_order);
        options
    }

    /// Replace the cached options, expiring `ttl` from now
    pub fn write(&self, options: &[FacetOption], ttl: Duration) {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            tracing::warn!(scope = %self.scope, "facet cache ttl out of range, skipping write");
            return;
        };
        let Some(expires_at) = self.clock.now().checked_add_signed(ttl) else {
            tracing::warn!(scope = %self.scope, "facet cache expiry overflows, skipping write");
            return;
        };

        let entry = CachedFacets {
            options: options.to_vec(),
            expires_at,
        };
        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(scope = %self.scope, error = %e, "failed to serialize facet cache entry");
                return;
            }
        };

        if let Err(e) = self.storage.set(self.scope.cache_key(), payload) {
            tracing::warn!(scope = %self.scope, error = %e, "facet cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct BrokenStorage;

    impl CacheStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn options() -> Vec<FacetOption> {
        vec![
            FacetOption::new("red", 2),
            FacetOption::new("blue", 9),
            FacetOption::new("amber", 2),
        ]
    }

    #[test]
    fn test_read_returns_fresh_entry_in_display_order() {
        let clock = clock();
        let cache = FacetCache::new(Arc::new(MemoryStorage::new()), clock.clone(), FacetScope::Tags);

        cache.write(&options(), Duration::from_secs(60));
        clock.advance(Duration::from_secs(59));

        let values: Vec<_> = cache.read().into_iter().map(|o| o.value).collect();
        assert_eq!(values, vec!["blue", "amber", "red"]);
    }

    #[test]
    fn test_read_ignores_expired_entry() {
        let clock = clock();
        let cache = FacetCache::new(Arc::new(MemoryStorage::new()), clock.clone(), FacetScope::Tags);

        cache.write(&options(), Duration::from_secs(60));
        clock.advance(Duration::from_secs(60));

        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_read_empty_storage_is_miss() {
        let cache = FacetCache::new(Arc::new(MemoryStorage::new()), clock(), FacetScope::Authors);
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_corrupt_payload_is_miss() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(FacetScope::Tags.cache_key(), "{not json".to_string())
            .unwrap();
        let cache = FacetCache::new(storage, clock(), FacetScope::Tags);
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_broken_storage_never_raises() {
        let cache = FacetCache::new(Arc::new(BrokenStorage), clock(), FacetScope::Tags);
        cache.write(&options(), Duration::from_secs(60));
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_write_fully_replaces_previous_entry() {
        let cache = FacetCache::new(Arc::new(MemoryStorage::new()), clock(), FacetScope::Tags);
        cache.write(&options(), Duration::from_secs(60));
        cache.write(&[FacetOption::new("green", 1)], Duration::from_secs(60));

        assert_eq!(cache.read(), vec![FacetOption::new("green", 1)]);
    }

    #[test]
    fn test_scopes_do_not_share_entries() {
        let storage: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new());
        let clock = clock();
        let tags = FacetCache::new(storage.clone(), clock.clone(), FacetScope::Tags);
        let authors = FacetCache::new(storage, clock, FacetScope::Authors);

        tags.write(&options(), Duration::from_secs(60));
        assert!(authors.read().is_empty());
        assert_eq!(tags.read().len(), 3);
    }

    #[test]
    fn test_quota_exceeded_is_swallowed() {
        let cache = FacetCache::new(Arc::new(MemoryStorage::with_quota(16)), clock(), FacetScope::Tags);
        cache.write(&options(), Duration::from_secs(60));
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_memory_storage_quota_counts_other_keys() {
        let storage = MemoryStorage::with_quota(10);
        storage.set("a", "123456".to_string()).unwrap();
        storage.set("a", "1234567890".to_string()).unwrap();
        let err = storage.set("b", "1".to_string()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                needed: 1,
                available: 0
            }
        ));
    }
}
