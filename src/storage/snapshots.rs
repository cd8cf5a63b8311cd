// src/storage/snapshots.rs

//! Saved page markup awaiting processing.
//!
//! ## Layout
//!
//! ```text
//! {snapshot_dir}/
//! └── {12 hex chars of sha256(source url)}/
//!     ├── 20251014_093000_123.html   # "<!-- source: URL -->" + page markup
//!     └── 20251014_093000_123.txt    # sanitized report
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

const SOURCE_PREFIX: &str = "<!-- source: ";
const SOURCE_SUFFIX: &str = " -->";

/// Hex characters of the URL digest used as directory name.
const DIR_HASH_LEN: usize = 12;

/// One saved page.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub path: PathBuf,
    /// Page URL, empty when the file carries no source line
    pub source_url: String,
    pub markup: String,
}

/// Filesystem store of saved pages.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the snapshots of one source URL.
    pub fn source_dir(&self, source_url: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(source_url.as_bytes()));
        self.root.join(&digest[..DIR_HASH_LEN])
    }

    /// Save `markup` captured from `source_url`.
    pub fn write(&self, source_url: &str, markup: &str) -> Result<PathBuf> {
        let dir = self.source_dir(source_url);
        fs::create_dir_all(&dir).map_err(|e| AppError::persistence(&dir, e))?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let mut path = dir.join(format!("{stamp}.html"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{stamp}-{n}.html"));
            n += 1;
        }

        let content = format!("{SOURCE_PREFIX}{source_url}{SOURCE_SUFFIX}\n{markup}");
        fs::write(&path, content).map_err(|e| AppError::persistence(&path, e))?;
        log::debug!("Saved snapshot {}", path.display());
        Ok(path)
    }

    /// All saved pages, oldest name first; a missing root is empty.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut pages = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(pages),
            Err(e) => return Err(AppError::persistence(&self.root, e)),
        };

        for entry in entries {
            let dir = entry.map_err(|e| AppError::persistence(&self.root, e))?.path();
            if !dir.is_dir() {
                continue;
            }
            for file in fs::read_dir(&dir).map_err(|e| AppError::persistence(&dir, e))? {
                let path = file.map_err(|e| AppError::persistence(&dir, e))?.path();
                if path.extension().is_some_and(|ext| ext == "html") {
                    pages.push(path);
                }
            }
        }

        pages.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
        Ok(pages)
    }

    pub fn load(&self, path: &Path) -> Result<Snapshot> {
        let content = fs::read_to_string(path).map_err(|e| AppError::persistence(path, e))?;
        let (source_url, markup) = split_source_line(&content);
        Ok(Snapshot {
            path: path.to_path_buf(),
            source_url,
            markup,
        })
    }

    /// Write the sanitized report next to the page.
    pub fn write_report(&self, snapshot: &Snapshot, report: &str) -> Result<PathBuf> {
        let path = snapshot.path.with_extension("txt");
        fs::write(&path, report).map_err(|e| AppError::persistence(&path, e))?;
        Ok(path)
    }

    /// Delete the page and its report, then its directory if left empty.
    pub fn remove(&self, snapshot: &Snapshot) -> Result<()> {
        for path in [snapshot.path.clone(), snapshot.path.with_extension("txt")] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(AppError::persistence(&path, e)),
            }
        }

        if let Some(dir) = snapshot.path.parent() {
            if dir != self.root && is_empty_dir(dir) {
                fs::remove_dir(dir).map_err(|e| AppError::persistence(dir, e))?;
            }
        }
        Ok(())
    }
}

fn split_source_line(content: &str) -> (String, String) {
    let (first, rest) = content.split_once('\n').unwrap_or((content, ""));
    match first
        .trim_end_matches('\r')
        .strip_prefix(SOURCE_PREFIX)
        .and_then(|s| s.strip_suffix(SOURCE_SUFFIX))
    {
        Some(url) => (url.trim().to_string(), rest.to_string()),
        None => (String::new(), content.to_string()),
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none())
}
