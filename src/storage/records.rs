// src/storage/records.rs

//! CSV post record store.
//!
//! One row per post id. Merges follow "longest caption wins": an existing
//! row only ever gets a strictly longer caption, every other column is
//! fixed once written.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::PostRecord;

/// Counts of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub updated: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.inserted + self.updated > 0
    }
}

/// Post records persisted as a headed CSV file.
///
/// Callers must serialize merges against one file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows in file order; a missing file is an empty store.
    pub fn load(&self) -> Result<Vec<PostRecord>> {
        let mut reader = match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader,
            Err(e) if is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => return Err(AppError::persistence(&self.path, e)),
        };

        reader
            .deserialize()
            .collect::<std::result::Result<Vec<PostRecord>, _>>()
            .map_err(|e| AppError::persistence(&self.path, e))
    }

    /// Merge `records` into the store and rewrite it when anything changed.
    ///
    /// Existing rows keep their order, new ids are appended in input order.
    /// Records without an id are ignored.
    pub fn merge(&self, records: &[PostRecord]) -> Result<MergeOutcome> {
        let (mut rows, folded) = fold_duplicates(self.load()?);
        let mut index: HashMap<String, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        let existing = rows.len();
        let mut widened = HashSet::new();
        let mut outcome = MergeOutcome::default();

        for record in records.iter().filter(|r| !r.id.is_empty()) {
            match index.get(&record.id) {
                Some(&i) => {
                    let row = &mut rows[i];
                    if record.caption_len() > row.caption_len() {
                        row.caption = record.caption.clone();
                        if i < existing {
                            widened.insert(i);
                        }
                    }
                }
                None => {
                    index.insert(record.id.clone(), rows.len());
                    rows.push(record.clone());
                    outcome.inserted += 1;
                }
            }
        }
        outcome.updated = widened.len();

        if folded > 0 {
            log::warn!(
                "Store {}: folded {} repeated ids",
                self.path.display(),
                folded
            );
        }

        if outcome.changed() || folded > 0 {
            self.write_all(&rows)?;
            log::info!(
                "Store {}: {} inserted, {} updated ({} rows)",
                self.path.display(),
                outcome.inserted,
                outcome.updated,
                rows.len()
            );
        } else {
            log::debug!("Store {}: nothing to merge", self.path.display());
        }
        Ok(outcome)
    }

    /// Rewrite the whole file atomically (write to temp, then rename).
    fn write_all(&self, rows: &[PostRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::persistence(&self.path, e))?;
        }

        let tmp = self.path.with_extension("csv.tmp");
        let write = || -> Result<()> {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(AppError::persistence(&self.path, e));
        }

        fs::rename(&tmp, &self.path).map_err(|e| AppError::persistence(&self.path, e))
    }
}

/// Collapse rows sharing an id into the first one, keeping the longest
/// caption. Returns the remaining rows and how many were dropped.
fn fold_duplicates(rows: Vec<PostRecord>) -> (Vec<PostRecord>, usize) {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<PostRecord> = Vec::with_capacity(rows.len());
    let mut folded = 0;

    for row in rows {
        match index.get(&row.id) {
            Some(&i) => {
                if row.caption_len() > kept[i].caption_len() {
                    kept[i].caption = row.caption;
                }
                folded += 1;
            }
            None => {
                index.insert(row.id.clone(), kept.len());
                kept.push(row);
            }
        }
    }
    (kept, folded)
}

fn is_not_found(error: &csv::Error) -> bool {
    matches!(error.kind(), csv::ErrorKind::Io(e) if e.kind() == io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, caption: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            source_url: "https://site/groups/1".to_string(),
            timestamp_label: "2h".to_string(),
            link: format!("https://site/groups/1/posts/{id}"),
            caption: caption.to_string(),
            notified: false,
        }
    }

    fn store(dir: &TempDir) -> RecordStore {
        RecordStore::open(dir.path().join("output/posts.csv"))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let batch = vec![record("1", "first"), record("2", "second")];

        let first = store.merge(&batch).unwrap();
        assert_eq!(first, MergeOutcome { inserted: 2, updated: 0 });
        let content = fs::read_to_string(store.path()).unwrap();

        let second = store.merge(&batch).unwrap();
        assert_eq!(second, MergeOutcome::default());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), content);
    }

    #[test]
    fn test_caption_only_grows() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.merge(&[record("1", "a longer caption")]).unwrap();

        let shorter = store.merge(&[record("1", "short")]).unwrap();
        assert_eq!(shorter.updated, 0);

        let tie = store.merge(&[record("1", "same length text")]).unwrap();
        assert_eq!(tie.updated, 0);
        assert_eq!(store.load().unwrap()[0].caption, "a longer caption");

        let longer = store.merge(&[record("1", "an even longer caption")]).unwrap();
        assert_eq!(longer.updated, 1);
        assert_eq!(store.load().unwrap()[0].caption, "an even longer caption");
    }

    #[test]
    fn test_other_fields_are_immutable() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.merge(&[record("1", "x")]).unwrap();

        let mut changed = record("1", "xyz");
        changed.timestamp_label = "Yesterday".into();
        changed.source_url = "https://elsewhere".into();
        store.merge(&[changed]).unwrap();

        let row = &store.load().unwrap()[0];
        assert_eq!(row.caption, "xyz");
        assert_eq!(row.timestamp_label, "2h");
        assert_eq!(row.source_url, "https://site/groups/1");
    }

    #[test]
    fn test_order_preserved_and_inserts_appended() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.merge(&[record("3", "c"), record("1", "a")]).unwrap();
        store
            .merge(&[record("2", "b"), record("1", "aaa"), record("4", "d")])
            .unwrap();

        let ids: Vec<_> = store.load().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn test_ids_unique_within_one_batch() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let outcome = store
            .merge(&[record("1", "a"), record("1", "abc"), record("", "no id")])
            .unwrap();

        assert_eq!(outcome, MergeOutcome { inserted: 1, updated: 0 });
        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].caption, "abc");
    }

    #[test]
    fn test_repeated_ids_in_file_are_folded() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "post_id,group_url,post_time,post_link,caption,isSentToTelegram\n\
             1,g,2h,l1,short,False\n\
             1,g,3h,l1b,longer one,False\n",
        )
        .unwrap();

        let outcome = store.merge(&[record("2", "b")]).unwrap();
        assert_eq!(outcome, MergeOutcome { inserted: 1, updated: 0 });

        let rows = store.load().unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(rows[0].caption, "longer one");
        assert_eq!(rows[0].timestamp_label, "2h");
    }

    #[test]
    fn test_repeated_ids_folded_without_new_records() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "post_id,group_url,post_time,post_link,caption,isSentToTelegram\n\
             7,g,2h,l,abc,False\n\
             7,g,2h,l,a,False\n",
        )
        .unwrap();

        assert_eq!(store.merge(&[]).unwrap(), MergeOutcome::default());
        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].caption, "abc");
    }

    #[test]
    fn test_updated_counts_rows_not_records() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.merge(&[record("1", "a")]).unwrap();

        let outcome = store
            .merge(&[record("1", "ab"), record("1", "abc")])
            .unwrap();
        assert_eq!(outcome, MergeOutcome { inserted: 0, updated: 1 });
        assert_eq!(store.load().unwrap()[0].caption, "abc");
    }

    #[test]
    fn test_header_and_columns() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.merge(&[record("9", "Rent, cheap")]).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "post_id,group_url,post_time,post_link,caption,isSentToTelegram"
        );
        assert_eq!(
            lines.next().unwrap(),
            r#"9,https://site/groups/1,2h,https://site/groups/1/posts/9,"Rent, cheap",False"#
        );
    }

    #[test]
    fn test_corrupt_file_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "post_id,group_url\n1,2,3\n").unwrap();

        assert!(matches!(
            store.merge(&[record("1", "a")]),
            Err(AppError::Persistence { .. })
        ));
    }
}
