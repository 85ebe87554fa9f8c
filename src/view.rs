//! Plain-text rendering of the post resource for the terminal.

use std::fmt::Write;

use crate::feed::{FeedError, NormalizedPost};
use crate::resource::ResourceState;
use crate::util::truncate_words;

/// Tags shown per card
const MAX_TAGS: usize = 5;
/// Excerpt budget in compact mode
const COMPACT_WORDS: usize = 15;

pub const LOADING_MESSAGE: &str = "Loading posts...";
pub const ERROR_MESSAGE: &str = "Failed to load posts. Please try again later.";
pub const EMPTY_MESSAGE: &str = "No posts found.";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Shorten excerpts for narrow terminals
    pub compact: bool,
}

/// Render any resource state as the text the CLI prints.
pub fn render_state(
    state: &ResourceState<Vec<NormalizedPost>, FeedError>,
    opts: RenderOptions,
) -> String {
    match state {
        ResourceState::Idle => String::new(),
        ResourceState::Loading => LOADING_MESSAGE.to_string(),
        ResourceState::Error(err) => format!("{ERROR_MESSAGE}\n({err})"),
        ResourceState::Success(posts) => render_posts(posts, opts),
    }
}

pub fn render_posts(posts: &[NormalizedPost], opts: RenderOptions) -> String {
    if posts.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }

    posts
        .iter()
        .enumerate()
        .map(|(i, post)| render_card(i + 1, post, opts))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_card(index: usize, post: &NormalizedPost, opts: RenderOptions) -> String {
    let mut card = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(card, "[{index}] {} · {}", post.date, post.author);
    let _ = writeln!(card, "    {}", post.title);

    let excerpt = if opts.compact {
        truncate_words(&post.description, COMPACT_WORDS)
    } else {
        post.description.as_str().into()
    };
    if !excerpt.is_empty() {
        let _ = writeln!(card, "    {excerpt}");
    }

    if !post.tags.is_empty() {
        let tags: Vec<String> = post
            .tags
            .iter()
            .take(MAX_TAGS)
            .map(|t| format!("#{t}"))
            .collect();
        let _ = writeln!(card, "    {}", tags.join(" "));
    }

    let _ = writeln!(card, "    {}", post.link);
    card
}
