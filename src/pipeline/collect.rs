// src/pipeline/collect.rs

//! Record collection: saved pages → containers → records → store.

use std::path::PathBuf;

use serde::Serialize;

use crate::dom::HtmlPage;
use crate::error::Result;
use crate::models::Config;
use crate::services::{BuildReport, CopyLink, PostContainerLocator, PostRecordBuilder};
use crate::storage::{RecordStore, SnapshotStore};
use crate::utils::log::summary;

/// Counters of one collect run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectStats {
    pub pages: usize,
    pub skipped_pages: usize,
    pub containers: usize,
    pub records: usize,
    pub missing_identity: usize,
    pub failed: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Save a page supplied by the browser shim for later processing.
pub fn ingest_page(config: &Config, source_url: &str, markup: &str) -> Result<PathBuf> {
    let path = SnapshotStore::new(&config.paths.snapshot_dir).write(source_url, markup)?;
    log::info!("Ingested {} as {}", source_url, path.display());
    Ok(path)
}

/// Locate containers in one page and build their records.
pub fn extract_page<L: CopyLink>(
    markup: &str,
    source_url: &str,
    locator: &PostContainerLocator,
    builder: &PostRecordBuilder<L>,
    max_posts: usize,
) -> Result<(usize, BuildReport)> {
    let page = HtmlPage::parse(markup);
    let candidates = locator.locate(&page.root(), max_posts)?;
    Ok((candidates.len(), builder.build_all(&candidates, source_url)))
}

/// Extract records from every saved page and merge them into the store.
///
/// A page that cannot be read or located is skipped; a store failure aborts
/// the run before anything is written.
pub fn run_collect(config: &Config) -> Result<CollectStats> {
    let snapshots = SnapshotStore::new(&config.paths.snapshot_dir);
    let store = RecordStore::open(&config.paths.store_file);
    let locator = PostContainerLocator::from_config(&config.extraction);
    let builder = PostRecordBuilder::new(&config.extraction)?;

    let mut stats = CollectStats::default();
    let mut records = Vec::new();

    for path in snapshots.list()? {
        stats.pages += 1;
        let snapshot = match snapshots.load(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                stats.skipped_pages += 1;
                continue;
            }
        };

        let extracted = extract_page(
            &snapshot.markup,
            &snapshot.source_url,
            &locator,
            &builder,
            config.extraction.max_posts,
        );
        let (containers, report) = match extracted {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                stats.skipped_pages += 1;
                continue;
            }
        };

        log::info!(
            "{}: {} containers, {} records",
            display_source(&snapshot.source_url),
            containers,
            report.records.len()
        );
        stats.containers += containers;
        stats.records += report.records.len();
        stats.missing_identity += report.missing_identity;
        stats.failed += report.failed;
        records.extend(report.records);
    }

    let outcome = store.merge(&records)?;
    stats.inserted = outcome.inserted;
    stats.updated = outcome.updated;

    summary(
        "Collect",
        &[
            ("Pages", stats.pages.to_string()),
            ("Records", stats.records.to_string()),
            ("Without id", stats.missing_identity.to_string()),
            ("Inserted", stats.inserted.to_string()),
            ("Updated", stats.updated.to_string()),
        ],
    );
    Ok(stats)
}

fn display_source(source_url: &str) -> &str {
    if source_url.is_empty() { "(unknown source)" } else { source_url }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::pipeline::test_support::config_in;
    use tempfile::TempDir;

    const FEED: &str = r#"<html><body>
        <div role="article" id="a">
          <a href="https://www.facebook.com/groups/1/posts/555/?__cft__=x">2h</a>
          <div data-ad-rendering-role="story_message">Rent available</div>
        </div>
        <div role="article" id="b"><a href="/groups/1/posts/556/">1h</a></div>
        <div role="article" id="c"><a href="/groups/1/about">About</a></div>
      </body></html>"#;

    #[test]
    fn test_run_collect_merges_records() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        ingest_page(&config, "https://www.facebook.com/groups/1/", FEED).unwrap();

        let stats = run_collect(&config).unwrap();
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.records, 2);
        assert_eq!(stats.inserted, 2);

        let rows = RecordStore::open(&config.paths.store_file).load().unwrap();
        assert_eq!(rows[0].id, "555");
        assert_eq!(rows[0].caption, "Rent available");
        assert_eq!(rows[1].link, "https://www.facebook.com/groups/1/posts/556/");

        let again = run_collect(&config).unwrap();
        assert_eq!(again.inserted + again.updated, 0);
    }

    #[test]
    fn test_run_collect_without_snapshots() {
        let dir = TempDir::new().unwrap();
        let stats = run_collect(&config_in(&dir)).unwrap();
        assert_eq!(stats.pages, 0);
        assert!(!dir.path().join("output/posts.csv").exists());
    }

    #[test]
    fn test_locate_failure_skips_page() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.extraction.container_selectors = vec!["[[broken".into()];
        config.extraction.fallback_selector = "[[broken".into();
        ingest_page(&config, "https://site/groups/1/", FEED).unwrap();

        let stats = run_collect(&config).unwrap();
        assert_eq!(stats.skipped_pages, 1);
        assert_eq!(stats.records, 0);
    }

    #[test]
    fn test_corrupt_store_aborts() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::create_dir_all(dir.path().join("output")).unwrap();
        std::fs::write(&config.paths.store_file, "post_id\n1,2\n").unwrap();
        ingest_page(&config, "https://site/groups/1/", FEED).unwrap();

        assert!(matches!(
            run_collect(&config),
            Err(AppError::Persistence { .. })
        ));
    }
}
