//! Time-bounded cache in front of a [`KeySetSource`].
//!
//! The cache is the only shared mutable state of the verification path.
//! Refreshes are single-flight: concurrent callers that need a new set wait
//! for the one fetch in progress and share its result. A caller holding an
//! expired set is served that set while another caller's refresh is running,
//! so staleness is bounded by `ttl + fetch_timeout`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::AuthFailure;
use crate::key_set::SigningKeySet;
use crate::key_source::{KeySetError, KeySetSource};

/// Default lifetime of a fetched key set.
pub const DEFAULT_KEY_SET_TTL: Duration = Duration::from_secs(300);

/// Default upper bound on a single key set fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// A key set together with the refresh that produced it.
#[derive(Debug)]
pub struct KeySetSnapshot {
    pub keys: SigningKeySet,
    /// Increases by one with every successful fetch.
    pub generation: u64,
    fetched_at: Instant,
}

impl KeySetSnapshot {
    #[must_use]
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    ttl: Duration,
    fetch_timeout: Duration,
    current: ArcSwapOption<KeySetSnapshot>,
    refresh_lock: Mutex<()>,
    generation: AtomicU64,
    fetches: AtomicU64,
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("ttl", &self.ttl)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl KeySetCache {
    /// A `ttl` of zero fetches on every call.
    #[must_use]
    pub fn new(source: Arc<dyn KeySetSource>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            source,
            ttl,
            fetch_timeout,
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_defaults(source: Arc<dyn KeySetSource>) -> Self {
        Self::new(source, DEFAULT_KEY_SET_TTL, DEFAULT_FETCH_TIMEOUT)
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of fetches issued against the source, successful or not.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Current key set, fetching when absent or expired.
    ///
    /// # Errors
    /// Returns [`AuthFailure::KeySetUnavailable`] when a required fetch fails.
    pub async fn get(&self) -> Result<Arc<KeySetSnapshot>, AuthFailure> {
        let observed = self.current.load_full();
        if let Some(snapshot) = &observed
            && self.is_fresh(snapshot)
        {
            tracing::trace!(generation = snapshot.generation, "key set cache hit");
            return Ok(Arc::clone(snapshot));
        }

        match (observed, self.refresh_lock.try_lock()) {
            (observed, Ok(guard)) => {
                self.refresh_locked(guard, observed.map(|s| s.generation))
                    .await
            }
            (Some(stale), Err(_)) => {
                tracing::warn!(
                    generation = stale.generation,
                    age_ms = u64::try_from(stale.age().as_millis()).unwrap_or(u64::MAX),
                    "serving expired key set while a refresh is in flight"
                );
                Ok(stale)
            }
            (None, Err(_)) => self.refresh_after(None).await,
        }
    }

    /// Force a refresh unless one completed after `seen_generation` was read.
    ///
    /// Pass the generation of the snapshot that turned out to be insufficient;
    /// callers racing on the same miss then share a single fetch.
    ///
    /// # Errors
    /// Returns [`AuthFailure::KeySetUnavailable`] when the fetch fails.
    pub async fn refresh_after(
        &self,
        seen_generation: Option<u64>,
    ) -> Result<Arc<KeySetSnapshot>, AuthFailure> {
        let guard = self.refresh_lock.lock().await;
        self.refresh_locked(guard, seen_generation).await
    }

    /// Drop the cached set; the next `get` fetches.
    pub fn invalidate(&self) {
        self.current.store(None);
    }

    fn is_fresh(&self, snapshot: &KeySetSnapshot) -> bool {
        snapshot.age() < self.ttl
    }

    async fn refresh_locked(
        &self,
        guard: MutexGuard<'_, ()>,
        seen_generation: Option<u64>,
    ) -> Result<Arc<KeySetSnapshot>, AuthFailure> {
        if let Some(snapshot) = self.current.load_full()
            && seen_generation.is_none_or(|seen| snapshot.generation > seen)
        {
            tracing::debug!(
                generation = snapshot.generation,
                "joined a key set refresh completed by another caller"
            );
            return Ok(snapshot);
        }
        self.fetch_and_store(guard).await
    }

    async fn fetch_and_store(
        &self,
        _refresh: MutexGuard<'_, ()>,
    ) -> Result<Arc<KeySetSnapshot>, AuthFailure> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let keys = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(Ok(keys)) => keys,
            Ok(Err(err)) => {
                tracing::error!(error = %err, "failed to fetch signing key set");
                return Err(err.into());
            }
            Err(_) => {
                let err = KeySetError::Timeout(self.fetch_timeout);
                tracing::error!(error = %err, "failed to fetch signing key set");
                return Err(err.into());
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = Arc::new(KeySetSnapshot {
            keys,
            generation,
            fetched_at: Instant::now(),
        });
        self.current.store(Some(Arc::clone(&snapshot)));

        tracing::info!(
            generation,
            key_count = snapshot.keys.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "signing key set refreshed"
        );
        Ok(snapshot)
    }
}
