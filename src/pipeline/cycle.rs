// src/pipeline/cycle.rs

//! Collect-then-notify cycle and the continuous loop around it.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::Notifier;
use crate::utils::log::{header, step};

use super::collect::{CollectStats, run_collect};
use super::notify::{NotifyStats, run_notify};

const TOTAL_STEPS: usize = 2;

/// Outcome of one cycle, written to `paths.stats_file`.
#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub collect: Option<CollectStats>,
    pub notify: Option<NotifyStats>,
    /// Error that ended the cycle early
    pub error: Option<String>,
}

impl CycleStats {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Run collect then notify.
///
/// A failing step is logged and ends this cycle; it never propagates, so a
/// later cycle can still run.
pub async fn run_cycle(config: &Config, notifier: &dyn Notifier) -> CycleStats {
    let mut stats = CycleStats {
        started_at: Utc::now(),
        finished_at: Utc::now(),
        collect: None,
        notify: None,
        error: None,
    };
    header("Cycle starting");

    step(1, TOTAL_STEPS, "Collect - Extracting post records");
    match run_collect(config) {
        Ok(collect) => stats.collect = Some(collect),
        Err(e) => {
            log::error!("Collect step failed, skipping rest of cycle: {}", e);
            stats.error = Some(e.to_string());
        }
    }

    if stats.error.is_none() {
        step(2, TOTAL_STEPS, "Notify - Forwarding unseen posts");
        match run_notify(config, notifier).await {
            Ok(notify) => stats.notify = Some(notify),
            Err(e) => {
                log::error!("Notify step failed: {}", e);
                stats.error = Some(e.to_string());
            }
        }
    }

    stats.finished_at = Utc::now();
    if let Err(e) = write_stats(&config.paths.stats_file, &stats) {
        log::warn!("Could not write cycle stats: {}", e);
    }
    stats
}

/// Run cycles back to back, sleeping `schedule.interval_secs` in between.
///
/// Stops after `max_cycles` when given, otherwise runs until the process ends.
pub async fn run_forever(
    config: &Config,
    notifier: &dyn Notifier,
    max_cycles: Option<usize>,
) -> Result<()> {
    let interval = Duration::from_secs(config.schedule.interval_secs);
    let mut cycles = 0;

    loop {
        let stats = run_cycle(config, notifier).await;
        cycles += 1;
        if !stats.succeeded() {
            log::warn!("Cycle {} ended early", cycles);
        }
        if max_cycles.is_some_and(|max| cycles >= max) {
            return Ok(());
        }

        log::info!("Sleeping {}s until next cycle", interval.as_secs());
        tokio::time::sleep(interval).await;
    }
}

fn write_stats(path: &Path, stats: &CycleStats) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppError::persistence(path, e))?;
    }
    let json = serde_json::to_vec_pretty(stats)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| AppError::persistence(path, e))?;
    fs::rename(&tmp, path).map_err(|e| AppError::persistence(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingest_page;
    use crate::pipeline::test_support::{RecordingNotifier, config_in};
    use crate::storage::RecordStore;
    use tempfile::TempDir;

    const FEED: &str = r#"
        <div role="article" id="p">
          <a href="https://www.facebook.com/groups/4/posts/88/">3h</a>
          <div data-ad-rendering-role="story_message">Studio near campus</div>
        </div>"#;

    #[tokio::test]
    async fn test_cycle_collects_then_notifies() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        ingest_page(&config, "https://www.facebook.com/groups/4/", FEED).unwrap();

        let notifier = RecordingNotifier::default();
        let stats = run_cycle(&config, &notifier).await;

        assert!(stats.succeeded());
        assert_eq!(stats.collect.as_ref().unwrap().inserted, 1);
        assert_eq!(stats.notify.as_ref().unwrap().sent, 1);
        assert_eq!(
            notifier.sent()[0],
            (
                "Studio near campus".to_string(),
                "https://www.facebook.com/groups/4/posts/88/".to_string()
            )
        );
        assert_eq!(RecordStore::open(&config.paths.store_file).load().unwrap().len(), 1);

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&config.paths.stats_file).unwrap()).unwrap();
        assert_eq!(written["notify"]["sent"], 1);
        assert!(written["error"].is_null());
    }

    #[tokio::test]
    async fn test_failed_collect_skips_notify() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::create_dir_all(dir.path().join("output")).unwrap();
        fs::write(&config.paths.store_file, "post_id\n1,2\n").unwrap();
        ingest_page(&config, "https://www.facebook.com/groups/4/", FEED).unwrap();

        let notifier = RecordingNotifier::default();
        let stats = run_cycle(&config, &notifier).await;

        assert!(!stats.succeeded());
        assert!(stats.notify.is_none());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_run_forever_bounded() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        run_forever(&config, &RecordingNotifier::default(), Some(1))
            .await
            .unwrap();
        assert!(config.paths.stats_file.exists());
    }
}
