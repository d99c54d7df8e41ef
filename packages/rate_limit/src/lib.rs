#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Sliding-window submission rate limiter keyed by client address.
//!
//! Each accepted submission appends a timestamp to the client's window.
//! On every check, timestamps at or before `now - window` are dropped and
//! the submission is refused if the remaining count has reached the limit.
//! Refused attempts are not recorded.
//!
//! Window state lives behind [`RateWindowStore`] so it can be moved out of
//! process; [`InMemoryWindowStore`] is the default. Check-and-record is
//! serialized per key through a fixed set of lock stripes, so two
//! concurrent submissions from one address cannot both slip under the
//! limit.

pub mod store;

use std::hash::{DefaultHasher, Hash as _, Hasher as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::TimeDelta;
use tokio::sync::Mutex;
use worm_watch_time::Clock;

pub use store::{DEFAULT_MAX_TRACKED_KEYS, InMemoryWindowStore, RateWindowStore};

/// Number of lock stripes used to serialize per-key updates.
const LOCK_STRIPES: usize = 32;

/// Errors raised by a [`RateWindowStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// The backend could not be reached or returned garbage.
    #[error("Rate limit backend error: {0}")]
    Backend(String),
}

/// Limits applied by a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Accepted submissions allowed per key within `window`.
    pub max_submissions: usize,
    /// Length of the trailing window.
    pub window: TimeDelta,
    /// Run a store sweep once every this many checks. `0` disables sweeping.
    pub sweep_every: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_submissions: 5,
            window: TimeDelta::hours(1),
            sweep_every: 256,
        }
    }
}

/// Per-key sliding-window limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateWindowStore>,
    clock: Arc<dyn Clock>,
    stripes: Vec<Mutex<()>>,
    checks: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter over an arbitrary window store.
    #[must_use]
    pub fn new(
        config: RateLimitConfig,
        store: Arc<dyn RateWindowStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            checks: AtomicU64::new(0),
        }
    }

    /// Creates a limiter backed by an [`InMemoryWindowStore`] tracking at
    /// most `max_tracked_keys` clients.
    #[must_use]
    pub fn in_memory(
        config: RateLimitConfig,
        max_tracked_keys: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryWindowStore::new(max_tracked_keys)),
            clock,
        )
    }

    /// Returns the limits this limiter enforces.
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks whether `key` may submit now and, if so, records the
    /// submission.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] if the window store fails.
    pub async fn check_and_record(&self, key: &str) -> Result<bool, RateLimitError> {
        let allowed = {
            let _guard = self.stripe_for(key).lock().await;

            let now = self.clock.now();
            let cutoff = now - self.config.window;

            let mut timestamps = self.store.get(key).await?;
            timestamps.retain(|t| *t > cutoff);

            if timestamps.len() >= self.config.max_submissions {
                false
            } else {
                timestamps.push(now);
                self.store.put(key, timestamps).await?;
                true
            }
        };

        self.maybe_sweep().await;

        Ok(allowed)
    }

    /// Drops every window that has fully aged out.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] if the window store fails.
    pub async fn sweep(&self) -> Result<usize, RateLimitError> {
        let cutoff = self.clock.now() - self.config.window;
        let dropped = self.store.sweep(cutoff).await?;
        if dropped > 0 {
            log::debug!("Swept {dropped} expired rate windows");
        }
        Ok(dropped)
    }

    async fn maybe_sweep(&self) {
        let every = self.config.sweep_every;
        if every == 0 {
            return;
        }
        let count = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if count % every != 0 {
            return;
        }
        if let Err(e) = self.sweep().await {
            log::warn!("Rate window sweep failed: {e}");
        }
    }

    fn stripe_for(&self, key: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)]
        let idx = (hasher.finish() as usize) % self.stripes.len();
        &self.stripes[idx]
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
