use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use super::envelope::Envelope;
use super::normalize::{normalize_items, NormalizedPost, EXCERPT_WORDS};
use crate::resource::{Resource, ResourceCache};
use crate::util::{validate_feed_url, validate_proxy_url, UrlValidationError};

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Public rss2json endpoint
pub const DEFAULT_PROXY_URL: &str = "https://api.rss2json.com/v1/api.json";
/// The blog this reader follows unless configured otherwise
pub const DEFAULT_FEED_URL: &str = "https://medium.com/feed/@heyadarshhere";

/// Cache of normalized posts, keyed per feed
pub type PostCache = ResourceCache<Vec<NormalizedPost>, FeedError>;
/// Consumer handle over the cached posts of one feed
pub type PostResource = Resource<Vec<NormalizedPost>, FeedError>;

/// Broad classes of [`FeedError`], matching what a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The proxy could not be reached or answered with a non-2xx status
    Fetch,
    /// The proxy answered but reported that it could not convert the feed
    Upstream,
    /// Anything else (undecodable or oversized body)
    Unknown,
}

/// Errors from fetching and normalizing the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Non-2xx response from the proxy
    #[error("Failed to fetch feed: {status} {status_text}")]
    HttpStatus { status: u16, status_text: String },
    /// Connection, TLS, timeout or body transfer failure
    #[error("Failed to fetch feed: {0}")]
    Network(#[from] reqwest::Error),
    /// Envelope status was not `ok`
    #[error("Feed API returned an error status: {reason}")]
    Upstream { reason: String },
    /// Body was not the expected JSON
    #[error("Invalid feed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::HttpStatus { .. } | FeedError::Network(_) => ErrorKind::Fetch,
            FeedError::Upstream { .. } => ErrorKind::Upstream,
            FeedError::Decode(_) | FeedError::ResponseTooLarge(_) => ErrorKind::Unknown,
        }
    }
}

/// Where to find the feed and how to shape its posts.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub feed_url: String,
    pub proxy_url: String,
    pub excerpt_words: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            excerpt_words: EXCERPT_WORDS,
        }
    }
}

/// Fetches one syndication feed through the RSS-to-JSON proxy and exposes
/// its posts as a cached resource.
///
/// Cloning is cheap: the HTTP client and the cache are shared.
#[derive(Clone)]
pub struct FeedAggregator {
    client: reqwest::Client,
    request_url: Url,
    cache_key: Arc<str>,
    excerpt_words: usize,
    cache: Arc<PostCache>,
}

impl FeedAggregator {
    /// Builds an aggregator for `settings.feed_url` served via `settings.proxy_url`.
    ///
    /// # Errors
    ///
    /// Returns [`UrlValidationError`] if the feed URL is not a public http(s)
    /// URL or the proxy is not HTTPS (plain HTTP is allowed on localhost).
    pub fn new(
        client: reqwest::Client,
        settings: &FeedSettings,
        cache: Arc<PostCache>,
    ) -> Result<Self, UrlValidationError> {
        let feed_url = validate_feed_url(&settings.feed_url)?;
        let mut request_url = validate_proxy_url(&settings.proxy_url)?;
        request_url
            .query_pairs_mut()
            .append_pair("rss_url", feed_url.as_str());

        Ok(Self {
            client,
            request_url,
            cache_key: format!("blog-posts:{feed_url}").into(),
            excerpt_words: settings.excerpt_words,
            cache,
        })
    }

    /// The full proxy request, with the feed URL encoded as `rss_url`.
    pub fn request_url(&self) -> &Url {
        &self.request_url
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Performs one proxy request and normalizes the result.
    ///
    /// No caching and no retries; see [`posts`](Self::posts) for those.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Network`] / [`FeedError::HttpStatus`] when the proxy is
    ///   unreachable or answers with a non-2xx status
    /// - [`FeedError::Upstream`] when the envelope status is not `ok`
    /// - [`FeedError::Decode`] / [`FeedError::ResponseTooLarge`] for bodies
    ///   that cannot be read as an envelope
    pub async fn fetch_posts(&self) -> Result<Vec<NormalizedPost>, FeedError> {
        let response = self.client.get(self.request_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        let envelope: Envelope = serde_json::from_slice(&body)?;

        if !envelope.is_ok() {
            let reason = envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("status {:?}", envelope.status));
            return Err(FeedError::Upstream { reason });
        }

        if let Some(feed) = &envelope.feed {
            tracing::debug!(title = %feed.title, link = %feed.link, "Feed channel");
        }

        let posts = normalize_items(envelope.items, self.excerpt_words);
        tracing::debug!(count = posts.len(), key = %self.cache_key, "Fetched feed posts");
        Ok(posts)
    }

    /// Cached posts: served from the cache while fresh, otherwise fetched
    /// with the cache's retry policy.
    pub async fn posts(&self) -> Result<Arc<Vec<NormalizedPost>>, Arc<FeedError>> {
        let this = self.clone();
        self.cache
            .get_or_fetch(&self.cache_key, move || {
                let this = this.clone();
                async move { this.fetch_posts().await }
            })
            .await
    }

    /// A consumer handle over this feed's cache entry.
    pub fn resource(&self) -> PostResource {
        let this = self.clone();
        Resource::new(Arc::clone(&self.cache), Arc::clone(&self.cache_key), move || {
            let this = this.clone();
            async move { this.fetch_posts().await }
        })
    }

    /// Marks the cached posts stale so the next access refetches.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&self.cache_key).await;
    }
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FeedError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FeedError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FeedError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
