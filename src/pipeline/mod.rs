//! Pipeline entry points for the post watcher.
//!
//! - `run_collect`: Extract records from saved pages into the store
//! - `run_notify`: Forward unseen posts to the notifier
//! - `run_cycle` / `run_forever`: Collect then notify, once or on an interval
//! - `run_discover_groups`: Save the groups linked from a page

pub mod collect;
pub mod cycle;
pub mod discover;
pub mod notify;

pub use collect::{CollectStats, extract_page, ingest_page, run_collect};
pub use cycle::{CycleStats, run_cycle, run_forever};
pub use discover::run_discover_groups;
pub use notify::{NotifyStats, run_notify};
