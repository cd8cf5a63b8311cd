// src/utils/url.rs

//! URL canonicalization and resolution.
//!
//! Post links are compared by their canonical form: the query string and
//! fragment are tracking noise, except for `story_fbid` links whose path
//! carries no identity of its own.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static PATH_IDENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:posts|permalink)/\d+").expect("static regex"));

/// Cut a link at the first `?` or `#`.
pub fn strip_query(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    &href[..end]
}

/// Canonical form of a post link.
///
/// # Examples
/// ```
/// use groupwatch::utils::url::canonical_link;
///
/// assert_eq!(
///     canonical_link("https://site/groups/1/posts/555?x=1"),
///     "https://site/groups/1/posts/555"
/// );
/// assert_eq!(
///     canonical_link("https://site/permalink.php?story_fbid=42&id=7&__cft__=x"),
///     "https://site/permalink.php?story_fbid=42&id=7"
/// );
/// ```
pub fn canonical_link(href: &str) -> String {
    let href = href.trim();
    let base = strip_query(href);

    if PATH_IDENTITY.is_match(base) {
        return base.to_string();
    }

    let Some(query) = href
        .split_once('?')
        .map(|(_, q)| q.split('#').next().unwrap_or(""))
    else {
        return base.to_string();
    };

    let pair = |key: &str| {
        url::form_urlencoded::parse(query.as_bytes()).find_map(|(k, v)| {
            (k == key && !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))
                .then(|| format!("{k}={v}"))
        })
    };

    match pair("story_fbid") {
        Some(story) => match pair("id") {
            Some(id) => format!("{base}?{story}&{id}"),
            None => format!("{base}?{story}"),
        },
        None => base.to_string(),
    }
}

/// Identity used by the sent-set: canonical link without a trailing slash.
pub fn canonical_url(url: &str) -> String {
    let link = canonical_link(url);
    let trimmed = link.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.ends_with(':') {
        link
    } else {
        trimmed.to_string()
    }
}

/// Resolve a potentially relative href against the page it was found on.
pub fn resolve(base: &str, href: &str) -> String {
    if href.is_empty() || href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}
