// src/services/extractor.rs

//! Field extraction from one post container.
//!
//! Each field has a ranked list of strategies and the first non-empty result
//! wins. Extractors never fail: a strategy that errors is skipped and a field
//! nobody can find comes back empty (or `Unknown` for the time label).

use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

use regex::Regex;
use scraper::Html;

use crate::dom::ElementHandle;
use crate::error::{AppError, Result};
use crate::models::{SelectorConfig, UNKNOWN_TIME};
use crate::utils::canonical_link;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Capability to obtain a post link through the page's own "copy link" UI.
///
/// This is the only extraction path with side effects; the default
/// implementation does nothing.
pub trait CopyLink {
    fn trigger_copy_link<H: ElementHandle>(&self, container: &H) -> Result<String>;
}

/// No copy-link fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCopyLink;

impl CopyLink for NoCopyLink {
    fn trigger_copy_link<H: ElementHandle>(&self, _container: &H) -> Result<String> {
        Ok(String::new())
    }
}

/// Shared clipboard the copy-link action writes into.
pub trait Clipboard {
    fn read(&self) -> Result<String>;
}

/// Opens the share menu of a post, picks "copy link" and reads the clipboard.
pub struct ShareMenuCopier<C> {
    share_selector: String,
    phrases: Vec<String>,
    menu_wait: Duration,
    clipboard_wait: Duration,
    clipboard: C,
}

impl<C: Clipboard> ShareMenuCopier<C> {
    pub fn new(config: &SelectorConfig, clipboard: C) -> Self {
        Self {
            share_selector: config.share_selector.clone(),
            phrases: config.copy_link_phrases.clone(),
            menu_wait: Duration::from_millis(1500),
            clipboard_wait: Duration::from_millis(500),
            clipboard,
        }
    }

    /// Override the waits after opening the menu and after copying.
    pub fn with_waits(mut self, menu_wait: Duration, clipboard_wait: Duration) -> Self {
        self.menu_wait = menu_wait;
        self.clipboard_wait = clipboard_wait;
        self
    }

    fn find_copy_action<H: ElementHandle>(&self, document: &H) -> Result<H> {
        for phrase in &self.phrases {
            if let Some(action) = document.find_by_text("span", phrase)? {
                return Ok(action);
            }
        }
        Err(AppError::interaction("copy link action not found in menu"))
    }
}

impl<C: Clipboard> CopyLink for ShareMenuCopier<C> {
    fn trigger_copy_link<H: ElementHandle>(&self, container: &H) -> Result<String> {
        let share = container
            .find_first(&self.share_selector)?
            .ok_or_else(|| AppError::interaction("post has no share affordance"))?;
        share.click()?;
        thread::sleep(self.menu_wait);

        // The menu opens outside the post, so search the whole page.
        let action = self.find_copy_action(&container.document()?)?;
        action.click()?;
        thread::sleep(self.clipboard_wait);

        Ok(self.clipboard.read()?.trim().to_string())
    }
}

/// Extracts link, id, caption and time label from a post container.
pub struct FieldExtractor<L = NoCopyLink> {
    link_selectors: Vec<String>,
    id_patterns: Vec<Regex>,
    caption_selectors: Vec<String>,
    timestamp_selectors: Vec<String>,
    copier: L,
}

impl FieldExtractor<NoCopyLink> {
    /// Build an extractor; fails when an id pattern does not compile.
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        let id_patterns = config
            .id_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            link_selectors: config.link_selectors.clone(),
            id_patterns,
            caption_selectors: config.caption_selectors.clone(),
            timestamp_selectors: config.timestamp_selectors.clone(),
            copier: NoCopyLink,
        })
    }
}

impl<L: CopyLink> FieldExtractor<L> {
    /// Use `copier` when no permalink selector matches.
    pub fn with_copier<M: CopyLink>(self, copier: M) -> FieldExtractor<M> {
        FieldExtractor {
            link_selectors: self.link_selectors,
            id_patterns: self.id_patterns,
            caption_selectors: self.caption_selectors,
            timestamp_selectors: self.timestamp_selectors,
            copier,
        }
    }

    /// Canonical permalink of the post, or "".
    pub fn extract_link<H: ElementHandle>(&self, container: &H) -> String {
        for selector in &self.link_selectors {
            let href = container
                .find_first(selector)
                .and_then(|el| el.map(|el| el.attr("href")).transpose())
                .map(Option::flatten);
            match href {
                Ok(Some(href)) if !href.trim().is_empty() => return canonical_link(&href),
                Ok(_) => {}
                Err(e) => log::debug!("Link strategy '{}' failed: {}", selector, e),
            }
        }

        match self.copier.trigger_copy_link(container) {
            Ok(link) if !link.is_empty() => canonical_link(&link),
            Ok(_) => String::new(),
            Err(e) => {
                log::debug!("Copy-link fallback failed: {}", e);
                String::new()
            }
        }
    }

    /// Numeric post id from the first matching pattern, or "".
    pub fn extract_id(&self, link: &str) -> String {
        if link.is_empty() {
            return String::new();
        }
        self.id_patterns
            .iter()
            .find_map(|pattern| pattern.captures(link)?.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Readable caption text, or "".
    pub fn extract_caption<H: ElementHandle>(&self, container: &H) -> String {
        for selector in &self.caption_selectors {
            let caption = container.find_first(selector).and_then(|el| match el {
                Some(el) => {
                    let markup = el.inner_html()?;
                    let markup = if markup.is_empty() { el.text()? } else { markup };
                    Ok(strip_tags(&markup))
                }
                None => Ok(String::new()),
            });
            match caption {
                Ok(caption) if !caption.is_empty() => return caption,
                Ok(_) => {}
                Err(e) => log::debug!("Caption strategy '{}' failed: {}", selector, e),
            }
        }
        String::new()
    }

    /// Post time label, preferring the accessible label over display text.
    pub fn extract_timestamp<H: ElementHandle>(&self, container: &H) -> String {
        for selector in &self.timestamp_selectors {
            let label = container.find_first(selector).and_then(|el| match el {
                Some(el) => match el.attr("aria-label")?.filter(|l| !l.trim().is_empty()) {
                    Some(label) => Ok(label.trim().to_string()),
                    None => Ok(el.text()?),
                },
                None => Ok(String::new()),
            });
            match label {
                Ok(label) if !label.is_empty() => return label,
                Ok(_) => {}
                Err(e) => log::debug!("Time strategy '{}' failed: {}", selector, e),
            }
        }
        UNKNOWN_TIME.to_string()
    }
}

/// Markup to single-line readable text.
///
/// Uses the HTML parser; when that yields nothing, falls back to a plain
/// regex tag stripper.
pub fn strip_tags(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let words: Vec<&str> = fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect();
    if !words.is_empty() {
        return words.join(" ");
    }
    regex_strip_tags(markup)
}

fn regex_strip_tags(markup: &str) -> String {
    let without_tags = TAG.replace_all(markup, " ");
    SPACES.replace_all(without_tags.trim(), " ").into_owned()
}
