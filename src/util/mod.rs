//! Utility functions shared by the feed pipeline.
//!
//! - **Text processing**: HTML stripping, whitespace collapsing and word-budget
//!   truncation used to build post excerpts
//! - **URL validation**: checks for the feed URL and the proxy endpoint
//!
//! # Examples
//!
//! ```
//! use postfeed::util::{clean_excerpt, validate_feed_url};
//!
//! let excerpt = clean_excerpt("<p>Hello <b>world</b></p>", 40);
//! assert_eq!(excerpt, "Hello world");
//!
//! let url = validate_feed_url("https://medium.com/feed/@someone").unwrap();
//! assert_eq!(url.host_str(), Some("medium.com"));
//! ```

mod text;
mod url_validator;

pub use text::{clean_excerpt, collapse_whitespace, strip_html, truncate_words};
pub use url_validator::{validate_feed_url, validate_proxy_url, UrlValidationError};
