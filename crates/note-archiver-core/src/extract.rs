//! Link extraction from free-form note text.
//!
//! Candidates are matched with an RFC 3986 character class, widened to any
//! non-ASCII, non-whitespace code point so IRIs survive intact, anchored on a
//! case-sensitive `http://` or `https://` prefix that does not continue a
//! longer word (`xhttps://` is not a link). Prose and markdown often
//! glue punctuation onto a link (`[text](url)`, `see <url>.`), so each match
//! loses its trailing run of such characters before it is accepted.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::models::ExtractedUrl;

/// Characters stripped from the end of a match, as a run.
const TRAILING_PUNCTUATION: &[char] = &[')', ']', '>', ',', ';', ':', '!', '?', '.'];

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[A-Za-z0-9\-._~:/?#\[\]@!$&'()*+,;=%[^\x00-\x7F\s]]+")
        .expect("link pattern is a valid regex")
});

/// Extract every distinct `http`/`https` link from `text`, in first-seen order.
///
/// Never fails: malformed fragments are skipped and an input without links
/// yields an empty `Vec`.
pub fn extract_urls(text: &str) -> Vec<ExtractedUrl> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for candidate in LINK_PATTERN.find_iter(text) {
        let preceding = text[..candidate.start()].chars().next_back();
        if preceding.is_some_and(|c| c.is_ascii_alphanumeric()) {
            continue;
        }

        let trimmed = candidate
            .as_str()
            .trim_end_matches(|c| TRAILING_PUNCTUATION.contains(&c));

        if !has_host(trimmed) {
            continue;
        }

        if seen.insert(trimmed) {
            urls.push(ExtractedUrl::new(trimmed.to_string()));
        }
    }

    urls
}

fn has_host(candidate: &str) -> bool {
    Url::parse(candidate)
        .ok()
        .and_then(|url| url.host_str().map(|host| !host.is_empty()))
        .unwrap_or(false)
}
