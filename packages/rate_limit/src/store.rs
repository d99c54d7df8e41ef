//! Backing storage for per-client submission windows.
//!
//! The limiter only ever needs to read a key's timestamps, write them back,
//! and occasionally drop windows that have fully aged out. Anything that can
//! do those three things (an in-process map, a shared cache) can back it.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::RateLimitError;

/// Storage for the ordered submission timestamps of each client key.
#[async_trait]
pub trait RateWindowStore: Send + Sync {
    /// Returns the recorded timestamps for `key`, oldest first. Unknown keys
    /// yield an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Vec<DateTime<Utc>>, RateLimitError>;

    /// Replaces the timestamps for `key`. An empty sequence forgets the key.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] if the backend cannot be written.
    async fn put(&self, key: &str, timestamps: Vec<DateTime<Utc>>) -> Result<(), RateLimitError>;

    /// Forgets every key whose newest timestamp is at or before `cutoff`,
    /// returning how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] if the backend cannot be written.
    async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<usize, RateLimitError>;

    /// Number of keys currently tracked.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] if the backend cannot be read.
    async fn tracked_keys(&self) -> Result<usize, RateLimitError>;
}

/// Default maximum number of client keys held by [`InMemoryWindowStore`].
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

struct Window {
    timestamps: Vec<DateTime<Utc>>,
    touched: u64,
}

#[derive(Default)]
struct Inner {
    windows: BTreeMap<String, Window>,
    /// touch tick -> key, oldest first
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &str) {
        let tick = self.next_tick();
        if let Some(window) = self.windows.get_mut(key) {
            self.recency.remove(&window.touched);
            window.touched = tick;
            self.recency.insert(tick, key.to_string());
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(window) = self.windows.remove(key) {
            self.recency.remove(&window.touched);
        }
    }

    fn evict_least_recent(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        self.windows.remove(&key);
        Some(key)
    }
}

/// Process-local window store with least-recently-used eviction once
/// `capacity` distinct keys are tracked.
pub struct InMemoryWindowStore {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl InMemoryWindowStore {
    /// Creates an empty store holding at most `capacity` keys (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }
}

impl Default for InMemoryWindowStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACKED_KEYS)
    }
}

impl std::fmt::Debug for InMemoryWindowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWindowStore")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RateWindowStore for InMemoryWindowStore {
    async fn get(&self, key: &str) -> Result<Vec<DateTime<Utc>>, RateLimitError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.touch(key);
        Ok(inner
            .windows
            .get(key)
            .map(|w| w.timestamps.clone())
            .unwrap_or_default())
    }

    async fn put(&self, key: &str, timestamps: Vec<DateTime<Utc>>) -> Result<(), RateLimitError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if timestamps.is_empty() {
            inner.remove(key);
            return Ok(());
        }

        if let Some(window) = inner.windows.get_mut(key) {
            window.timestamps = timestamps;
            inner.touch(key);
            return Ok(());
        }

        while inner.windows.len() >= self.capacity {
            let Some(evicted) = inner.evict_least_recent() else {
                break;
            };
            log::debug!("Evicted rate window for {evicted}");
        }

        let tick = inner.next_tick();
        inner.recency.insert(tick, key.to_string());
        inner.windows.insert(
            key.to_string(),
            Window {
                timestamps,
                touched: tick,
            },
        );

        Ok(())
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<usize, RateLimitError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let expired: Vec<String> = inner
            .windows
            .iter()
            .filter(|(_, w)| w.timestamps.last().is_none_or(|t| *t <= cutoff))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }

        Ok(expired.len())
    }

    async fn tracked_keys(&self) -> Result<usize, RateLimitError> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::minutes(minutes)
    }

    #[tokio::test]
    async fn unknown_key_is_empty() {
        let store = InMemoryWindowStore::default();
        assert!(store.get("10.0.0.1").await.unwrap().is_empty());
        assert_eq!(store.tracked_keys().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = InMemoryWindowStore::default();
        store.put("a", vec![at(1), at(2)]).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), vec![at(1), at(2)]);
    }

    #[tokio::test]
    async fn empty_put_forgets_key() {
        let store = InMemoryWindowStore::default();
        store.put("a", vec![at(1)]).await.unwrap();
        store.put("a", Vec::new()).await.unwrap();
        assert_eq!(store.tracked_keys().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn evicts_least_recently_used_at_capacity() {
        let store = InMemoryWindowStore::new(2);
        store.put("a", vec![at(1)]).await.unwrap();
        store.put("b", vec![at(2)]).await.unwrap();

        // Reading "a" makes "b" the eviction candidate.
        store.get("a").await.unwrap();
        store.put("c", vec![at(3)]).await.unwrap();

        assert_eq!(store.tracked_keys().await.unwrap(), 2);
        assert_eq!(store.get("a").await.unwrap(), vec![at(1)]);
        assert!(store.get("b").await.unwrap().is_empty());
        assert_eq!(store.get("c").await.unwrap(), vec![at(3)]);
    }

    #[tokio::test]
    async fn updating_existing_key_never_evicts() {
        let store = InMemoryWindowStore::new(2);
        store.put("a", vec![at(1)]).await.unwrap();
        store.put("b", vec![at(2)]).await.unwrap();
        store.put("a", vec![at(1), at(4)]).await.unwrap();

        assert_eq!(store.tracked_keys().await.unwrap(), 2);
        assert_eq!(store.get("b").await.unwrap(), vec![at(2)]);
    }

    #[tokio::test]
    async fn sweep_drops_fully_expired_windows() {
        let store = InMemoryWindowStore::default();
        store.put("old", vec![at(1), at(5)]).await.unwrap();
        store.put("mixed", vec![at(1), at(30)]).await.unwrap();

        let dropped = store.sweep(at(10)).await.unwrap();

        assert_eq!(dropped, 1);
        assert!(store.get("old").await.unwrap().is_empty());
        assert_eq!(store.get("mixed").await.unwrap().len(), 2);
    }
}
