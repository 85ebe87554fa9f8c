use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::cache::ResourceCache;

/// Lifecycle of a resource as seen by its consumers.
///
/// `Idle → Loading → Success | Error`. A load that finds a fresh cached value
/// goes straight to `Success`.
pub enum ResourceState<T, E> {
    Idle,
    Loading,
    Success(Arc<T>),
    Error(Arc<E>),
}

impl<T, E> ResourceState<T, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Error(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

// Manual impls: Arc payloads clone without T: Clone / E: Clone
impl<T, E> Clone for ResourceState<T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading => Self::Loading,
            Self::Success(data) => Self::Success(Arc::clone(data)),
            Self::Error(err) => Self::Error(Arc::clone(err)),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for ResourceState<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Loading => f.write_str("Loading"),
            Self::Success(data) => f.debug_tuple("Success").field(data).finish(),
            Self::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}

type Fetcher<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Consumer handle over one key of a [`ResourceCache`].
///
/// Clones share the same state channel. Dropping every handle and receiver
/// while a load is still running is harmless: the result lands in the cache
/// and the state update goes nowhere.
pub struct Resource<T, E> {
    key: Arc<str>,
    cache: Arc<ResourceCache<T, E>>,
    fetcher: Fetcher<T, E>,
    state: Arc<watch::Sender<ResourceState<T, E>>>,
}

impl<T, E> Clone for Resource<T, E> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            cache: Arc::clone(&self.cache),
            fetcher: Arc::clone(&self.fetcher),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> Resource<T, E>
where
    T: Send + Sync + 'static,
    E: fmt::Display + Send + Sync + 'static,
{
    pub fn new<F, Fut>(cache: Arc<ResourceCache<T, E>>, key: impl Into<Arc<str>>, fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (state, _) = watch::channel(ResourceState::Idle);
        Self {
            key: key.into(),
            cache,
            fetcher: Arc::new(move || fetcher().boxed()),
            state: Arc::new(state),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current state snapshot.
    pub fn state(&self) -> ResourceState<T, E> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T, E>> {
        self.state.subscribe()
    }

    /// Loads the resource and returns the terminal state.
    ///
    /// A fresh cached value resolves immediately to `Success`; otherwise the
    /// state passes through `Loading` while the cache fetches (with its retry
    /// policy) and then settles on `Success` or `Error`. A load that starts
    /// while another handle's fetch for the same key is in flight also shows
    /// `Loading`, then settles on that fetch's outcome without a new request.
    pub async fn load(&self) -> ResourceState<T, E> {
        if let Some(data) = self.cache.peek_fresh(&self.key).await {
            return self.publish(ResourceState::Success(data));
        }

        self.publish(ResourceState::Loading);
        let fetcher = Arc::clone(&self.fetcher);
        let next = match self.cache.get_or_fetch(&self.key, move || fetcher()).await {
            Ok(data) => ResourceState::Success(data),
            Err(err) => ResourceState::Error(err),
        };
        self.publish(next)
    }

    /// Starts [`load`](Self::load) on the runtime and returns a receiver for
    /// its transitions.
    pub fn spawn_load(&self) -> (watch::Receiver<ResourceState<T, E>>, JoinHandle<()>) {
        let rx = self.subscribe();
        let this = self.clone();
        let handle = tokio::spawn(async move {
            this.load().await;
        });
        (rx, handle)
    }

    /// Marks the cached value stale; the next load refetches.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&self.key).await;
    }

    fn publish(&self, next: ResourceState<T, E>) -> ResourceState<T, E> {
        // send_replace stores the value even when nobody is listening
        self.state.send_replace(next.clone());
        next
    }
}
