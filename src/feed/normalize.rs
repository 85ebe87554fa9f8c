use serde::Serialize;

use super::envelope::RawFeedItem;
use crate::util::clean_excerpt;

/// Word budget for post excerpts
pub const EXCERPT_WORDS: usize = 40;

/// A feed entry projected into the shape the view layer renders.
///
/// `link` doubles as the identity of the post; there is no separate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedPost {
    pub title: String,
    /// Publish timestamp exactly as the proxy sent it
    pub date: String,
    pub link: String,
    pub author: String,
    /// Plain-text excerpt, at most `EXCERPT_WORDS` words plus `"..."`
    pub description: String,
    pub tags: Vec<String>,
}

/// Converts one raw item into a [`NormalizedPost`].
///
/// Only the description is transformed; categories are passed through with
/// their order, casing and duplicates intact.
pub fn normalize_item(item: RawFeedItem, excerpt_words: usize) -> NormalizedPost {
    NormalizedPost {
        description: clean_excerpt(&item.description, excerpt_words),
        title: item.title,
        date: item.pub_date,
        link: item.link,
        author: item.author,
        tags: item.categories,
    }
}

/// Normalizes every item, keeping upstream order.
pub fn normalize_items(items: Vec<RawFeedItem>, excerpt_words: usize) -> Vec<NormalizedPost> {
    items
        .into_iter()
        .map(|item| normalize_item(item, excerpt_words))
        .collect()
}
