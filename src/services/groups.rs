// src/services/groups.rs

//! Joined-group discovery from a saved "your groups" page.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{AppError, Result};

/// Sorted, unique group URLs matched by `pattern` in `markup`.
///
/// The first capture group is taken when the pattern has one, otherwise the
/// whole match.
pub fn discover_group_urls(markup: &str, pattern: &str) -> Result<Vec<String>> {
    let regex = Regex::new(pattern)?;
    let urls: BTreeSet<String> = regex
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str().to_string())
        .collect();
    Ok(urls.into_iter().collect())
}

/// Write one URL per line, creating parent directories.
pub fn save_group_urls(path: &Path, urls: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppError::persistence(path, e))?;
    }
    let mut content = urls.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| AppError::persistence(path, e))?;
    log::info!("Saved {} group URLs to {}", urls.len(), path.display());
    Ok(())
}
