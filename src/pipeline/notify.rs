// src/pipeline/notify.rs

//! Forwarding: saved pages → sanitized candidates → sent-set → notifier.

use serde::Serialize;

use crate::error::Result;
use crate::models::Config;
use crate::services::{HtmlSanitizer, KeywordFilter, Notifier};
use crate::storage::{NotificationTracker, RecordStore, SnapshotStore};
use crate::utils::log::summary;

/// Counters of one notify run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotifyStats {
    pub pages: usize,
    pub candidates: usize,
    pub sent: usize,
    pub already_sent: usize,
    pub filtered: usize,
    pub failed: usize,
    pub swept: usize,
}

/// What happened to one (caption, url) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    AlreadySent,
    Filtered,
    Failed,
}

struct Forwarder<'a> {
    notifier: &'a dyn Notifier,
    tracker: NotificationTracker,
    filter: KeywordFilter,
}

impl Forwarder<'_> {
    /// Check, send, then mark. Only a failing sent-log write is an error; a
    /// failed send leaves the link eligible for the next run.
    async fn forward(
        &mut self,
        caption: &str,
        url: &str,
        stats: &mut NotifyStats,
    ) -> Result<Delivery> {
        stats.candidates += 1;

        if !self.tracker.should_send(url) {
            log::debug!("Already sent: {}", url);
            stats.already_sent += 1;
            return Ok(Delivery::AlreadySent);
        }
        if !self.filter.accepts(caption) {
            log::debug!("Filtered by keywords: {}", url);
            stats.filtered += 1;
            return Ok(Delivery::Filtered);
        }

        match self.notifier.send(caption, url).await {
            Ok(()) => {
                self.tracker.mark_sent(url)?;
                stats.sent += 1;
                Ok(Delivery::Sent)
            }
            Err(e) => {
                log::warn!("{}", e);
                stats.failed += 1;
                Ok(Delivery::Failed)
            }
        }
    }
}

/// Forward unseen posts from saved pages (and optionally the record store).
///
/// Pages whose post could not be sent are kept for the next run; the others
/// are removed when `notify.sweep_snapshots` is set.
pub async fn run_notify(config: &Config, notifier: &dyn Notifier) -> Result<NotifyStats> {
    let snapshots = SnapshotStore::new(&config.paths.snapshot_dir);
    let sanitizer = HtmlSanitizer::from_config(&config.notify)?;
    let mut forwarder = Forwarder {
        notifier,
        tracker: NotificationTracker::load(&config.paths.sent_file)?,
        filter: KeywordFilter::from_config(&config.notify),
    };
    let mut stats = NotifyStats::default();

    for path in snapshots.list()? {
        stats.pages += 1;
        let snapshot = match snapshots.load(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let page = sanitizer.sanitize(&snapshot.markup);
        snapshots.write_report(&snapshot, &page.report())?;

        let delivery = match page.notification_candidate(&config.notify.site_base) {
            Some((caption, url)) => Some(forwarder.forward(&caption, &url, &mut stats).await?),
            None => {
                log::debug!("No post link in {}", path.display());
                None
            }
        };

        if config.notify.sweep_snapshots && delivery != Some(Delivery::Failed) {
            snapshots.remove(&snapshot)?;
            stats.swept += 1;
        }
    }

    if config.notify.from_store {
        for record in RecordStore::open(&config.paths.store_file).load()? {
            if record.link.is_empty() {
                continue;
            }
            forwarder.forward(&record.caption, &record.link, &mut stats).await?;
        }
    }

    summary(
        "Notify",
        &[
            ("Pages", stats.pages.to_string()),
            ("Sent", stats.sent.to_string()),
            ("Already sent", stats.already_sent.to_string()),
            ("Filtered", stats.filtered.to_string()),
            ("Failed", stats.failed.to_string()),
            ("Sent log", forwarder.tracker.len().to_string()),
        ],
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostRecord;
    use crate::pipeline::test_support::{RecordingNotifier, config_in};
    use crate::pipeline::ingest_page;
    use tempfile::TempDir;

    fn post_page(id: u32, caption: &str) -> String {
        format!(
            r#"<div data-ad-rendering-role="story_message">{caption}</div>
               <a href="https://www.facebook.com/groups/9/posts/{id}/?__cft__=z">open</a>"#
        )
    }

    #[tokio::test]
    async fn test_sends_once_across_runs() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.notify.sweep_snapshots = false;
        let page = post_page(1, "RentRent");
        ingest_page(&config, "https://www.facebook.com/groups/9/", &page).unwrap();

        let notifier = RecordingNotifier::default();
        let first = run_notify(&config, &notifier).await.unwrap();
        assert_eq!(first.sent, 1);
        assert_eq!(
            notifier.sent(),
            vec![(
                "Rent".to_string(),
                "https://www.facebook.com/groups/9/posts/1/".to_string()
            )]
        );

        let second = run_notify(&config, &notifier).await.unwrap();
        assert_eq!(second.sent, 0);
        assert_eq!(second.already_sent, 1);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_send_is_retried_and_kept() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let page = post_page(2, "x");
        let path = ingest_page(&config, "https://www.facebook.com/groups/9/", &page).unwrap();

        let failing = RecordingNotifier::failing();
        let stats = run_notify(&config, &failing).await.unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.swept, 0);
        assert!(path.exists());
        assert!(path.with_extension("txt").exists());

        let notifier = RecordingNotifier::default();
        let retry = run_notify(&config, &notifier).await.unwrap();
        assert_eq!(retry.sent, 1);
        assert_eq!(retry.swept, 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_filtered_is_not_marked_sent() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.notify.sweep_snapshots = false;
        config.notify.deny_keywords = vec!["sold".into()];
        let page = post_page(3, "Sold out");
        ingest_page(&config, "https://www.facebook.com/groups/9/", &page).unwrap();

        let notifier = RecordingNotifier::default();
        let stats = run_notify(&config, &notifier).await.unwrap();
        assert_eq!(stats.filtered, 1);
        assert!(notifier.sent().is_empty());

        let tracker = NotificationTracker::load(&config.paths.sent_file).unwrap();
        assert!(tracker.should_send("https://www.facebook.com/groups/9/posts/3/"));
    }

    #[tokio::test]
    async fn test_page_without_post_link_is_swept() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let path = ingest_page(&config, "https://site/groups/9/", "<p>nothing</p>").unwrap();

        let stats = run_notify(&config, &RecordingNotifier::default()).await.unwrap();
        assert_eq!(stats.candidates, 0);
        assert_eq!(stats.swept, 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_from_store() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.notify.from_store = true;
        RecordStore::open(&config.paths.store_file)
            .merge(&[PostRecord {
                id: "7".into(),
                source_url: "https://site/groups/1".into(),
                timestamp_label: "1h".into(),
                link: "https://site/groups/1/posts/7".into(),
                caption: "Room for rent".into(),
                notified: false,
            }])
            .unwrap();

        let notifier = RecordingNotifier::default();
        let stats = run_notify(&config, &notifier).await.unwrap();
        assert_eq!(stats.sent, 1);
        assert_eq!(notifier.sent()[0].1, "https://site/groups/1/posts/7");
    }
}
