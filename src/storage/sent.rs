// src/storage/sent.rs

//! Sent-links log.
//!
//! One canonical URL per line, append-only. The in-memory set mirrors the
//! file, so a link checked with [`NotificationTracker::should_send`] after
//! [`NotificationTracker::mark_sent`] is refused, also after a reload.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::utils::canonical_url;

/// Persistent set of already forwarded links.
///
/// Single writer: check with `should_send`, send, then `mark_sent`.
#[derive(Debug)]
pub struct NotificationTracker {
    path: PathBuf,
    sent: HashSet<String>,
}

impl NotificationTracker {
    /// Read the sent-links file; a missing file is an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sent = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(canonical_url)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(AppError::persistence(&path, e)),
        };
        log::debug!("Loaded {} sent links from {}", sent.len(), path.display());
        Ok(Self { path, sent })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_send(&self, url: &str) -> bool {
        !self.sent.contains(&canonical_url(url))
    }

    /// Record `url` as sent; a link already present is left alone.
    pub fn mark_sent(&mut self, url: &str) -> Result<()> {
        let url = canonical_url(url);
        if self.sent.contains(&url) {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::persistence(&self.path, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::persistence(&self.path, e))?;
        writeln!(file, "{url}").map_err(|e| AppError::persistence(&self.path, e))?;

        self.sent.insert(url);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}
