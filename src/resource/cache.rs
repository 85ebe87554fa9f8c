use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default number of keys kept before eviction
pub const DEFAULT_CAPACITY: usize = 16;

/// Upper bound for the exponential retry delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Freshness and retry rules applied to every key in a [`ResourceCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long a stored value is served without refetching
    pub stale_time: Duration,
    /// Automatic retries after a failed fetch (0 = fail on first error)
    pub retry: u32,
    /// Delay before the first retry; doubles for each further retry
    pub retry_delay: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(15 * 60),
            retry: 1,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl CachePolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(MAX_RETRY_DELAY)
    }
}

struct SlotState<T, E> {
    value: Option<Arc<T>>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    last_error: Option<Arc<E>>,
}

/// One cache key. `completed` counts finished fetches so a caller that queued
/// behind an in-flight fetch can tell it should reuse that fetch's outcome.
struct Slot<T, E> {
    completed: AtomicU64,
    state: Mutex<SlotState<T, E>>,
}

impl<T, E> Slot<T, E> {
    fn new() -> Self {
        Self {
            completed: AtomicU64::new(0),
            state: Mutex::new(SlotState {
                value: None,
                fetched_at: None,
                invalidated: false,
                last_error: None,
            }),
        }
    }
}

impl<T, E> SlotState<T, E> {
    fn fresh(&self, stale_time: Duration) -> Option<Arc<T>> {
        if self.invalidated {
            return None;
        }
        match (&self.value, self.fetched_at) {
            (Some(value), Some(at)) if at.elapsed() < stale_time => Some(Arc::clone(value)),
            _ => None,
        }
    }
}

/// Keyed cache of asynchronously fetched values.
///
/// Built once at startup and shared by `Arc`; there is no process-wide
/// instance. Each key holds at most one value together with the instant it
/// was fetched:
///
/// - A value younger than [`CachePolicy::stale_time`] is returned without
///   calling the fetcher.
/// - A missing or stale value triggers the fetcher, retried up to
///   [`CachePolicy::retry`] times with exponential backoff.
/// - Concurrent callers for the same key share one fetch. Callers that queued
///   behind it receive its value or its error.
/// - Errors are never stored as values; the next call after a failure fetches
///   again.
/// - At most `capacity` keys are kept; the least recently used key is evicted
///   together with its value.
pub struct ResourceCache<T, E> {
    policy: CachePolicy,
    slots: Mutex<LruCache<String, Arc<Slot<T, E>>>>,
}

impl<T, E> ResourceCache<T, E> {
    pub fn new(policy: CachePolicy, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            policy,
            slots: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }

    async fn slot(&self, key: &str) -> Arc<Slot<T, E>> {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }
        let slot = Arc::new(Slot::new());
        if let Some((evicted, _)) = slots.push(key.to_string(), Arc::clone(&slot)) {
            tracing::debug!(key = %evicted, "Evicted resource cache entry");
        }
        slot
    }

    /// Returns the cached value for `key` if it is still fresh.
    ///
    /// Never waits on a fetch: while one is in flight for `key` this returns
    /// `None`, and the caller should queue on [`get_or_fetch`](Self::get_or_fetch)
    /// to share its outcome.
    pub async fn peek_fresh(&self, key: &str) -> Option<Arc<T>> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.get(key).map(Arc::clone)?
        };
        let state = slot.state.try_lock().ok()?;
        state.fresh(self.policy.stale_time)
    }

    /// Marks the value for `key` as stale so the next access refetches it.
    pub async fn invalidate(&self, key: &str) {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.get(key).map(Arc::clone)
        };
        if let Some(slot) = slot {
            slot.state.lock().await.invalidated = true;
            tracing::debug!(key = %key, "Invalidated resource cache entry");
        }
    }

    /// Returns the fresh value for `key`, or fetches, stores and returns a new one.
    ///
    /// `fetcher` is called once per attempt: once, plus up to
    /// [`CachePolicy::retry`] more times while it keeps failing. The last
    /// error is returned once retries are exhausted.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, mut fetcher: F) -> Result<Arc<T>, Arc<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let slot = self.slot(key).await;
        let observed = slot.completed.load(Ordering::Acquire);
        let mut state = slot.state.lock().await;

        if let Some(value) = state.fresh(self.policy.stale_time) {
            tracing::debug!(key = %key, "Resource cache hit");
            return Ok(value);
        }

        // A fetch finished while we were queued on the lock and it failed
        if slot.completed.load(Ordering::Acquire) != observed {
            if let Some(err) = &state.last_error {
                return Err(Arc::clone(err));
            }
        }

        let mut attempt = 0;
        let outcome = loop {
            match fetcher().await {
                Ok(value) => break Ok(value),
                Err(e) if attempt < self.policy.retry => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        retry = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Resource fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => break Err(e),
            }
        };

        let result = match outcome {
            Ok(value) => {
                let value = Arc::new(value);
                state.value = Some(Arc::clone(&value));
                state.fetched_at = Some(Instant::now());
                state.invalidated = false;
                state.last_error = None;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, attempts = attempt + 1, "Resource fetch failed");
                let err = Arc::new(e);
                state.last_error = Some(Arc::clone(&err));
                Err(err)
            }
        };

        slot.completed.fetch_add(1, Ordering::AcqRel);
        result
    }
}
