use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub valid_entries: usize,
}

#[derive(Debug)]
struct CacheEntry<V> {
    payload: V,
    created_at: Instant,
    ttl: Duration,
    seq: u64,
}

impl<V> CacheEntry<V> {
    /// A TTL too large to represent as an `Instant` never expires.
    fn is_valid(&self, now: Instant) -> bool {
        self.created_at
            .checked_add(self.ttl)
            .is_none_or(|expires_at| now < expires_at)
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

/// Bounded TTL cache keyed by normalized query text.
///
/// When full, inserting a new key evicts the entry with the oldest
/// `created_at` (insertion order breaks ties). Reads never refresh age.
#[derive(Debug)]
pub struct ResponseCache<V> {
    state: Mutex<CacheState<V>>,
    capacity: usize,
    default_ttl: Duration,
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

#[must_use]
pub fn normalize_key(query: &str) -> String {
    query.trim().to_lowercase()
}

impl<V: Clone> ResponseCache<V> {
    #[must_use]
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            capacity,
            default_ttl,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached payload, purging the entry if it has expired.
    #[must_use]
    pub fn get(&self, query: &str) -> Option<V> {
        let key = normalize_key(query);
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();
        match state.entries.get(&key) {
            Some(entry) if entry.is_valid(now) => {
                tracing::debug!(key = %key, "cache hit");
                Some(entry.payload.clone())
            }
            Some(_) => {
                state.entries.remove(&key);
                tracing::debug!(key = %key, "cache entry expired");
                None
            }
            None => {
                tracing::debug!(key = %key, "cache miss");
                None
            }
        }
    }

    /// Store `payload` under `query` with the default TTL.
    pub fn set(&self, query: &str, payload: V) {
        self.set_with_ttl(query, payload, self.default_ttl);
    }

    pub fn set_with_ttl(&self, query: &str, payload: V, ttl: Duration) {
        if self.capacity == 0 {
            return;
        }
        let key = normalize_key(query);
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.created_at, e.seq))
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                tracing::debug!(key = %oldest, "evicted oldest cache entry");
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                payload,
                created_at: Instant::now(),
                ttl,
                seq,
            },
        );
    }

    pub fn clear(&self) {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entries
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entries
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();
        CacheStats {
            entries: state.entries.len(),
            capacity: self.capacity,
            valid_entries: state.entries.values().filter(|e| e.is_valid(now)).count(),
        }
    }
}
