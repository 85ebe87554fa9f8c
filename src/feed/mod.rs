//! The blog feed, fetched through an RSS-to-JSON proxy.
//!
//! - [`envelope`] - the proxy's JSON shapes, decoded leniently
//! - [`normalize`] - pure per-item transform into [`NormalizedPost`]
//! - [`aggregator`] - the proxied fetch, its errors, and the cached resource
//!
//! # Example
//!
//! ```ignore
//! use postfeed::feed::{FeedAggregator, FeedSettings, PostCache};
//! use postfeed::resource::CachePolicy;
//!
//! let cache = Arc::new(PostCache::new(CachePolicy::default(), 16));
//! let aggregator = FeedAggregator::new(client, &FeedSettings::default(), cache)?;
//! let posts = aggregator.posts().await?;
//! ```

mod aggregator;
mod envelope;
mod normalize;

pub use aggregator::{
    ErrorKind, FeedAggregator, FeedError, FeedSettings, PostCache, PostResource,
    DEFAULT_FEED_URL, DEFAULT_PROXY_URL,
};
pub use envelope::{Envelope, FeedInfo, RawFeedItem};
pub use normalize::{normalize_item, normalize_items, NormalizedPost, EXCERPT_WORDS};
