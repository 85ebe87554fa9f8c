use std::borrow::Cow;

/// Ellipsis appended when an excerpt is cut short
const ELLIPSIS: &str = "...";

/// Removes markup from an HTML fragment and normalizes its whitespace.
///
/// Every `<...>` span is replaced by a single space, as is any stray `<` or
/// `>` that does not close a tag. Runs of whitespace are then collapsed to a
/// single space and the result is trimmed.
///
/// The output never contains `<` or `>`, and applying `strip_html` to its own
/// output returns it unchanged.
///
/// # Examples
///
/// ```
/// use postfeed::util::strip_html;
///
/// assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
/// assert_eq!(strip_html("1 < 2"), "1 2");
/// ```
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(idx) = rest.find(['<', '>']) {
        out.push_str(&rest[..idx]);
        out.push(' ');

        // Both delimiters are ASCII, so idx + 1 is a char boundary
        let after = &rest[idx + 1..];
        rest = if rest.as_bytes()[idx] == b'<' {
            match after.find('>') {
                Some(end) => &after[end + 1..],
                None => after,
            }
        } else {
            after
        };
    }
    out.push_str(rest);

    match collapse_whitespace(&out) {
        Cow::Borrowed(_) => out,
        Cow::Owned(collapsed) => collapsed,
    }
}

/// Unicode whitespace plus U+FEFF, which shows up as a stray BOM or
/// zero-width no-break space in syndicated HTML.
fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Collapses every run of whitespace to one ASCII space and trims both ends.
///
/// U+FEFF counts as whitespace. Returns `Cow::Borrowed` when the input is
/// already normalized.
pub fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    // Leading whitespace counts as a run that follows a space
    let mut prev_space = true;
    let needs_collapse = s.chars().any(|c| {
        let ws = is_space(c);
        let bad = ws && (prev_space || c != ' ');
        prev_space = ws;
        bad
    }) || s.ends_with(is_space);

    if !needs_collapse {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.split(is_space)
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Truncates space-separated text to at most `max_words` words.
///
/// The text is split on single spaces, so it should already be collapsed
/// (see [`collapse_whitespace`]). Text with more than `max_words` words keeps
/// its first `max_words` words and gets `"..."` appended; anything shorter is
/// returned borrowed and untouched.
///
/// # Examples
///
/// ```
/// use postfeed::util::truncate_words;
///
/// assert_eq!(truncate_words("one two three", 3), "one two three");
/// assert_eq!(truncate_words("one two three", 2), "one two...");
/// ```
pub fn truncate_words(text: &str, max_words: usize) -> Cow<'_, str> {
    // "".split(' ') still yields one (empty) token, which exceeds a zero budget
    if max_words == 0 {
        return Cow::Borrowed(ELLIPSIS);
    }

    // The n-th separator ends the n-th word; reaching the max_words-th one
    // means at least one more word follows.
    for (seen, (idx, _)) in text.match_indices(' ').enumerate() {
        if seen + 1 == max_words {
            return Cow::Owned(format!("{}{}", &text[..idx], ELLIPSIS));
        }
    }

    Cow::Borrowed(text)
}

/// Builds a plain-text excerpt from an HTML description.
///
/// Strips markup and collapses whitespace with [`strip_html`], then keeps at
/// most `max_words` words with [`truncate_words`].
pub fn clean_excerpt(html: &str, max_words: usize) -> String {
    let text = strip_html(html);
    match truncate_words(&text, max_words) {
        Cow::Borrowed(_) => text,
        Cow::Owned(truncated) => truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn numbered_words(n: usize) -> String {
        (1..=n)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_strip_simple_markup() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_strip_attributes_and_newlines() {
        let html = "<figure>\n<img src=\"a.png\" alt=\"x > y\">\n</figure><p>Body\ttext</p>";
        // The `>` inside the attribute closes the tag early; the leftover is kept as text
        assert_eq!(strip_html(html), "y\" Body text");
    }

    #[test]
    fn test_strip_stray_brackets() {
        assert_eq!(strip_html("1 < 2 and 3 > 2"), "1 2 and 3 2");
        assert_eq!(strip_html("unterminated <tag"), "unterminated tag");
        assert_eq!(strip_html("<>"), "");
    }

    #[test]
    fn test_strip_tag_spanning_nested_open() {
        // `<a<b>` is one span: it runs to the first `>`
        assert_eq!(strip_html("x<a<b>y"), "x y");
    }

    #[test]
    fn test_strip_empty_and_whitespace() {
        assert_eq!(strip_html(""), "");
        assert_eq!(strip_html("  \n\t "), "");
        assert_eq!(strip_html("<br/><br/>"), "");
    }

    #[test]
    fn test_strip_keeps_unicode() {
        assert_eq!(strip_html("<p>日本語 <em>テキスト</em></p>"), "日本語 テキスト");
    }

    #[test]
    fn test_collapse_borrowed_when_clean() {
        let result = collapse_whitespace("already clean text");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_collapse_runs_and_trims() {
        assert_eq!(collapse_whitespace("  a \n\n b\t c  "), "a b c");
        assert_eq!(collapse_whitespace("a\u{a0}b"), "a b");
    }

    #[test]
    fn test_collapse_treats_bom_as_space() {
        assert_eq!(collapse_whitespace("\u{feff}Hello\u{feff} world"), "Hello world");
        assert_eq!(strip_html("<p>\u{feff}</p><p>Intro</p>"), "Intro");
    }

    #[test]
    fn test_truncate_under_budget_is_borrowed() {
        let text = numbered_words(40);
        let result = truncate_words(&text, 40);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert!(!result.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_truncate_forty_five_words() {
        let text = numbered_words(45);
        let expected = format!("{}...", numbered_words(40));
        assert_eq!(truncate_words(&text, 40), expected);
    }

    #[test]
    fn test_truncate_one_over_budget() {
        assert_eq!(truncate_words("a b c d", 3), "a b c...");
    }

    #[test]
    fn test_truncate_zero_budget() {
        assert_eq!(truncate_words("", 0), "...");
        assert_eq!(truncate_words("word", 0), "...");
    }

    #[test]
    fn test_truncate_empty_text() {
        assert_eq!(truncate_words("", 40), "");
    }

    #[test]
    fn test_clean_excerpt_markup_and_budget() {
        let html = format!("<p>{}</p>", numbered_words(45));
        let excerpt = clean_excerpt(&html, 40);
        assert_eq!(excerpt, format!("{}...", numbered_words(40)));
    }

    #[test]
    fn test_clean_excerpt_short_has_no_ellipsis() {
        assert_eq!(clean_excerpt("<p>Hello <b>world</b></p>", 40), "Hello world");
    }

    proptest! {
        #[test]
        fn prop_strip_never_leaves_angle_brackets(input in ".*") {
            let out = strip_html(&input);
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('>'));
        }

        #[test]
        fn prop_strip_is_idempotent(input in ".*") {
            let once = strip_html(&input);
            prop_assert_eq!(strip_html(&once), once);
        }

        #[test]
        fn prop_collapse_is_idempotent(input in "[ a-z\\t\\n<>/]*") {
            let once = collapse_whitespace(&input).into_owned();
            prop_assert_eq!(collapse_whitespace(&once).into_owned(), once);
        }

        #[test]
        fn prop_short_text_unchanged(words in prop::collection::vec("[a-z]{1,8}", 0..=40)) {
            let text = words.join(" ");
            prop_assert_eq!(clean_excerpt(&text, 40), text);
        }

        #[test]
        fn prop_long_text_keeps_first_forty(words in prop::collection::vec("[a-z]{1,8}", 41..80)) {
            let text = words.join(" ");
            let expected = format!("{}...", words[..40].join(" "));
            prop_assert_eq!(clean_excerpt(&text, 40), expected);
        }
    }
}
