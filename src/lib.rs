//! postfeed: read one author's blog from the terminal.
//!
//! The feed is fetched through an RSS-to-JSON proxy, normalized into
//! [`feed::NormalizedPost`] records and served from an explicitly constructed
//! [`resource::ResourceCache`] with a stale time and a retry policy.

pub mod config;
pub mod feed;
pub mod resource;
pub mod storage;
pub mod theme;
pub mod util;
pub mod view;
