//! Persistent state of the post watcher.
//!
//! ```text
//! output/
//! ├── posts.csv             # Post records, one row per post id
//! ├── sent_posts.txt        # Forwarded links, one per line (append-only)
//! ├── group_urls.txt        # Discovered groups
//! └── last_cycle.json       # Statistics of the last cycle
//! logs/
//! └── {hash}/{stamp}.html   # Saved pages awaiting processing
//! ```
//!
//! All stores assume a single writer; the cycle runs its steps sequentially.

mod records;
mod sent;
mod snapshots;

pub use records::{MergeOutcome, RecordStore};
pub use sent::NotificationTracker;
pub use snapshots::{Snapshot, SnapshotStore};
