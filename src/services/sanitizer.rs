// src/services/sanitizer.rs

//! Saved-markup sanitizer.
//!
//! Turns a saved page into normalized text, caption texts and link sets, and
//! derives the (caption, url) pair that gets forwarded for it.

use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;
use crate::utils::strip_query;

static POST_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/groups/.*/posts/\S+|/share/p/\S+").expect("static regex")
});

/// Elements whose text is never page content.
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Text, captions and links of one saved page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedPage {
    /// Cleaned readable text, one line per block
    pub text: String,
    /// Text of each caption element, in document order
    pub captions: Vec<String>,
    /// Distinct href values, sorted
    pub hrefs: Vec<String>,
    /// Distinct URL paths of the hrefs, sorted
    pub url_paths: Vec<String>,
}

impl SanitizedPage {
    /// Caption and canonical post URL to forward, if the page links a post.
    pub fn notification_candidate(&self, site_base: &str) -> Option<(String, String)> {
        let path = self
            .url_paths
            .iter()
            .find_map(|p| POST_PATH.find(p).map(|m| m.as_str()))?;
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", site_base.trim_end_matches('/'), path)
        };

        let caption = collapse_duplicated_halves(self.captions.join("\n").trim());
        Some((caption, url))
    }

    /// Plain-text report written next to the saved page.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "==== Extracted Text ====");
        let _ = writeln!(out, "{}\n", self.text);

        if !self.captions.is_empty() {
            let _ = writeln!(out, "==== Captions ====");
            for caption in &self.captions {
                let _ = writeln!(out, "{caption}");
            }
            out.push('\n');
        }

        let _ = writeln!(out, "==== URLs ====");
        for href in &self.hrefs {
            let _ = writeln!(out, "{href}");
        }

        let _ = writeln!(out, "\n==== URL Paths ====");
        for path in &self.url_paths {
            let _ = writeln!(out, "{path}");
        }
        out
    }
}

/// Converts saved markup into [`SanitizedPage`]s.
pub struct HtmlSanitizer {
    caption_selector: Selector,
}

impl HtmlSanitizer {
    pub fn new(caption_selector: &str) -> Result<Self> {
        let caption_selector = Selector::parse(caption_selector)
            .map_err(|e| AppError::selector(caption_selector, format!("{e:?}")))?;
        Ok(Self { caption_selector })
    }

    pub fn from_config(config: &NotifyConfig) -> Result<Self> {
        Self::new(&config.caption_selector)
    }

    pub fn sanitize(&self, markup: &str) -> SanitizedPage {
        let document = Html::parse_document(markup);

        let text = cleanup(&visible_lines(&document).join("\n"));

        let captions = document
            .select(&self.caption_selector)
            .map(|el| el.text().map(str::trim).collect::<String>())
            .filter(|c| !c.is_empty())
            .collect();

        let hrefs: BTreeSet<String> = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter_map(|el| el.value().attr("href"))
            .map(str::to_string)
            .collect();

        let url_paths: BTreeSet<String> = hrefs
            .iter()
            .map(|h| url_path(h))
            .filter(|p| !p.is_empty())
            .collect();

        SanitizedPage {
            text,
            captions,
            hrefs: hrefs.into_iter().collect(),
            url_paths: url_paths.into_iter().collect(),
        }
    }
}

/// Normalize extracted text.
///
/// Lines are trimmed and blank ones dropped. A one-character line is glued
/// onto the previous line (line breaks inside a multi-byte sequence leave
/// such fragments). Lines repeated case-insensitively keep their first
/// occurrence only.
pub fn cleanup(text: &str) -> String {
    let mut merged: Vec<String> = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match merged.last_mut() {
            Some(previous) if line.chars().count() == 1 => previous.push_str(line),
            _ => merged.push(line.to_string()),
        }
    }

    let mut seen = HashSet::new();
    merged
        .into_iter()
        .filter(|line| seen.insert(line.to_lowercase()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep one half of a caption that was accidentally concatenated with itself.
pub fn collapse_duplicated_halves(caption: &str) -> String {
    let chars: Vec<char> = caption.chars().collect();
    let half = chars.len() / 2;
    if half > 0 && chars.len() % 2 == 0 && chars[..half] == chars[half..] {
        return chars[..half].iter().collect::<String>().trim().to_string();
    }
    caption.to_string()
}

fn visible_lines(document: &Html) -> Vec<&str> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let hidden = node
                .parent()
                .and_then(ElementRef::wrap)
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.value().name()));
            (!hidden).then_some(&**text)
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn url_path(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => strip_query(href).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> HtmlSanitizer {
        HtmlSanitizer::from_config(&NotifyConfig::default()).unwrap()
    }

    const SAVED: &str = r##"
        <html><head><script>var x = 1;</script></head><body>
          <h1>Group feed</h1>
          <div data-ad-rendering-role="story_message"><span>Phòng trọ</span> <b>giá rẻ</b></div>
          <p>GROUP FEED</p>
          <a href="https://www.facebook.com/groups/12/posts/34/?__cft__=abc">open</a>
          <a href="/share/p/xyz/">share</a>
          <a href="#">top</a>
        </body></html>"##;

    #[test]
    fn test_sanitize_collects_text_captions_and_links() {
        let page = sanitizer().sanitize(SAVED);

        assert!(page.text.starts_with("Group feed"));
        assert!(!page.text.contains("var x"));
        assert!(!page.text.contains("GROUP FEED"));
        assert_eq!(page.captions, vec!["Phòng trọgiá rẻ"]);
        assert_eq!(page.hrefs.len(), 3);
        assert_eq!(page.url_paths, vec!["/groups/12/posts/34/", "/share/p/xyz/"]);
    }

    #[test]
    fn test_notification_candidate() {
        let page = sanitizer().sanitize(SAVED);
        let (caption, url) = page
            .notification_candidate("https://www.facebook.com/")
            .unwrap();

        assert_eq!(caption, "Phòng trọgiá rẻ");
        assert_eq!(url, "https://www.facebook.com/groups/12/posts/34/");
    }

    #[test]
    fn test_no_post_link_no_candidate() {
        let page = sanitizer().sanitize(r#"<a href="https://x/about">a</a>"#);
        assert!(page.notification_candidate("https://x").is_none());
    }

    #[test]
    fn test_cleanup_merges_and_dedups() {
        let text = "  Hello \n\n!\nhello\nWorld\n  world  \nx";
        assert_eq!(cleanup(text), "Hello!\nhello\nWorld\nworldx");
        assert_eq!(cleanup("Same\nsame\nSAME"), "Same");
    }

    #[test]
    fn test_cleanup_leading_single_char_line_is_kept() {
        assert_eq!(cleanup("a\nbc"), "a\nbc");
    }

    #[test]
    fn test_collapse_duplicated_halves() {
        assert_eq!(collapse_duplicated_halves("HelloHello"), "Hello");
        assert_eq!(collapse_duplicated_halves("Hello World"), "Hello World");
        assert_eq!(collapse_duplicated_halves("ănăn"), "ăn");
        assert_eq!(collapse_duplicated_halves(""), "");
    }

    #[test]
    fn test_report_sections() {
        let page = sanitizer().sanitize(SAVED);
        let report = page.report();

        assert!(report.starts_with("==== Extracted Text ====\n"));
        assert!(report.contains("==== Captions ====\nPhòng trọgiá rẻ\n"));
        assert!(report.contains("==== URLs ====\n#\n"));
        assert!(report.contains("\n==== URL Paths ====\n/groups/12/posts/34/\n"));
    }
}
