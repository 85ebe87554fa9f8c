//! Cached asynchronous resources.
//!
//! - [`ResourceCache`] - keyed values with a stale time, retry policy,
//!   per-key de-duplication of concurrent fetches and LRU eviction
//! - [`Resource`] - a consumer handle over one key that publishes
//!   [`ResourceState`] transitions through a `tokio::sync::watch` channel
//!
//! The cache is an ordinary value: build it once at startup, wrap it in an
//! `Arc`, and hand it to whatever needs it.

mod cache;
mod state;

pub use cache::{CachePolicy, ResourceCache, DEFAULT_CAPACITY};
pub use state::{Resource, ResourceState};
