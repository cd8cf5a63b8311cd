// src/services/locator.rs

//! Post container locator.
//!
//! Runs the ranked container selectors over a page and keeps the first
//! occurrence of every dedup key, so matches of a more specific selector win
//! over the same element found again by a broader one.

use std::collections::HashSet;

use crate::dom::ElementHandle;
use crate::error::{AppError, Result};
use crate::models::SelectorConfig;

/// Characters of serialized markup used as the last-resort dedup key.
const MARKUP_KEY_CHARS: usize = 300;

/// Attributes that identify an element across selector strategies.
const STABLE_KEY_ATTRS: [&str; 2] = ["id", "data-ft"];

/// One candidate post container found on a page.
#[derive(Debug, Clone)]
pub struct ContainerCandidate<H> {
    /// Key used to recognize the same container across strategies
    pub key: String,
    pub handle: H,
}

/// Locates post containers on a page.
pub struct PostContainerLocator {
    strategies: Vec<String>,
    fallback: String,
}

impl PostContainerLocator {
    pub fn new(strategies: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            strategies,
            fallback: fallback.into(),
        }
    }

    pub fn from_config(config: &SelectorConfig) -> Self {
        Self::new(
            config.container_selectors.clone(),
            config.fallback_selector.clone(),
        )
    }

    /// Collect at most `max_results` unique containers.
    ///
    /// A failing strategy counts as zero matches. The call only fails when
    /// every strategy came up empty and the fallback selector failed too.
    pub fn locate<H: ElementHandle>(
        &self,
        page: &H,
        max_results: usize,
    ) -> Result<Vec<ContainerCandidate<H>>> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();

        for selector in &self.strategies {
            if found.len() >= max_results {
                break;
            }
            let matches = match page.find_all(selector) {
                Ok(matches) => matches,
                Err(e) => {
                    log::debug!("Container strategy '{}' failed: {}", selector, e);
                    continue;
                }
            };
            log::debug!("Container strategy '{}': {} matches", selector, matches.len());
            Self::collect_unique(matches, &mut seen, &mut found, max_results);
        }

        if found.is_empty() {
            let matches = page
                .find_all(&self.fallback)
                .map_err(|e| AppError::locate(format!("fallback '{}': {}", self.fallback, e)))?;
            log::debug!("Fallback '{}': {} matches", self.fallback, matches.len());
            Self::collect_unique(matches, &mut seen, &mut found, max_results);
        }

        Ok(found)
    }

    fn collect_unique<H: ElementHandle>(
        matches: Vec<H>,
        seen: &mut HashSet<String>,
        found: &mut Vec<ContainerCandidate<H>>,
        max_results: usize,
    ) {
        for handle in matches {
            if found.len() >= max_results {
                return;
            }
            let key = match dedup_key(&handle) {
                Ok(key) => key,
                Err(e) => {
                    log::debug!("Skipping unreadable container: {}", e);
                    continue;
                }
            };
            if seen.insert(key.clone()) {
                found.push(ContainerCandidate { key, handle });
            }
        }
    }
}

impl Default for PostContainerLocator {
    fn default() -> Self {
        Self::from_config(&SelectorConfig::default())
    }
}

/// First non-empty of: stable DOM id, stable data attribute, markup prefix.
pub fn dedup_key<H: ElementHandle>(handle: &H) -> Result<String> {
    for attr in STABLE_KEY_ATTRS {
        if let Some(value) = handle.attr(attr)?.filter(|v| !v.is_empty()) {
            return Ok(value);
        }
    }
    Ok(handle.outer_html()?.chars().take(MARKUP_KEY_CHARS).collect())
}
