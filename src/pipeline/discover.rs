// src/pipeline/discover.rs

//! Group discovery from a saved "your groups" page.

use crate::error::Result;
use crate::models::Config;
use crate::services::{discover_group_urls, save_group_urls};

/// Extract group URLs from `markup` and save them to `paths.group_urls_file`.
pub fn run_discover_groups(config: &Config, markup: &str) -> Result<Vec<String>> {
    let urls = discover_group_urls(markup, &config.extraction.group_link_pattern)?;
    if urls.is_empty() {
        log::warn!("No group links found");
    }
    save_group_urls(&config.paths.group_urls_file, &urls)?;
    Ok(urls)
}
