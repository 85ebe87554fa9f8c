use serde::{Deserialize, Deserializer};

/// Status marker the proxy uses for a successful conversion
pub const STATUS_OK: &str = "ok";

/// Outer JSON object returned by the RSS-to-JSON proxy.
///
/// Everything in here is untrusted upstream data. Missing fields decode to
/// their empty defaults rather than failing the whole response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Envelope {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    /// Human-readable reason sent alongside a non-`ok` status
    pub message: Option<String>,
    pub feed: Option<FeedInfo>,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<RawFeedItem>,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Channel metadata. Only used for logging.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
}

/// One syndicated entry as delivered by the proxy.
///
/// `guid`, `thumbnail`, `content` and `enclosure` are also sent upstream but
/// are ignored here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFeedItem {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "pubDate", deserialize_with = "null_as_default")]
    pub pub_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    /// HTML fragment
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_envelope() {
        let json = r#"{
            "status": "ok",
            "feed": {
                "url": "https://medium.com/feed/@someone",
                "title": "Stories by Someone on Medium",
                "link": "https://medium.com/@someone",
                "author": "",
                "description": "Stories",
                "image": "https://cdn.example.com/a.png"
            },
            "items": [{
                "title": "First",
                "pubDate": "2024-05-01 10:00:00",
                "link": "https://medium.com/@someone/first",
                "guid": "https://medium.com/p/1",
                "author": "Someone",
                "thumbnail": "",
                "description": "<p>Hi</p>",
                "content": "<p>Hi</p>",
                "enclosure": {},
                "categories": ["rust", "web"]
            }]
        }"#;

        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(envelope.is_ok());
        assert_eq!(
            envelope.feed.as_ref().map(|f| f.title.as_str()),
            Some("Stories by Someone on Medium")
        );
        assert_eq!(envelope.items.len(), 1);
        let item = &envelope.items[0];
        assert_eq!(item.pub_date, "2024-05-01 10:00:00");
        assert_eq!(item.categories, vec!["rust", "web"]);
    }

    #[test]
    fn test_decode_error_envelope() {
        let json = r#"{"status":"error","message":"rss_url parameter is required."}"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(!envelope.is_ok());
        assert_eq!(
            envelope.message.as_deref(),
            Some("rss_url parameter is required.")
        );
        assert!(envelope.items.is_empty());
    }

    #[test]
    fn test_missing_item_fields_default() {
        let json = r#"{"status":"ok","items":[{"title":"Only a title"}]}"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        let item = &envelope.items[0];
        assert_eq!(item.title, "Only a title");
        assert!(item.link.is_empty());
        assert!(item.categories.is_empty());
    }

    #[test]
    fn test_missing_status_is_not_ok() {
        let envelope: Envelope = serde_json::from_str("{}").unwrap();
        assert!(!envelope.is_ok());
    }

    #[test]
    fn test_null_fields_default() {
        let json = r#"{"status":"ok","items":[{"title":null,"author":"X","categories":null}]}"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.items[0].title, "");
        assert_eq!(env.items[0].author, "X");
        assert!(env.items[0].categories.is_empty());
    }
}
