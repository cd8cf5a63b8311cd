// src/services/builder.rs

//! Post record builder.
//!
//! Combines container resolution with the field extractors. A record without
//! an id cannot be deduplicated, so it is dropped.

use std::collections::HashMap;

use crate::dom::{ElementHandle, nearest_ancestor_satisfying};
use crate::error::Result;
use crate::models::{ContainerPredicate, PostRecord, SelectorConfig};
use crate::services::extractor::{CopyLink, FieldExtractor, NoCopyLink};
use crate::services::locator::ContainerCandidate;
use crate::utils::resolve;

/// Result of building one container.
#[derive(Debug)]
pub enum BuildOutcome {
    Built(PostRecord),
    /// No id could be derived from the link
    MissingIdentity,
    /// Reading the container failed
    Failed(String),
}

/// Records built from one page.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub records: Vec<PostRecord>,
    pub missing_identity: usize,
    pub failed: usize,
    /// Containers whose id was already built from this page
    pub duplicates: usize,
}

/// Builds [`PostRecord`]s from post containers.
pub struct PostRecordBuilder<L = NoCopyLink> {
    extractor: FieldExtractor<L>,
    markers: Vec<ContainerPredicate>,
    ancestry: Vec<ContainerPredicate>,
}

impl PostRecordBuilder<NoCopyLink> {
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            extractor: FieldExtractor::new(config)?,
            markers: config.container_markers.clone(),
            ancestry: config.ancestor_predicates.clone(),
        })
    }
}

impl<L: CopyLink> PostRecordBuilder<L> {
    /// Enable the copy-link fallback for posts without a permalink anchor.
    pub fn with_copier<M: CopyLink>(self, copier: M) -> PostRecordBuilder<M> {
        PostRecordBuilder {
            extractor: self.extractor.with_copier(copier),
            markers: self.markers,
            ancestry: self.ancestry,
        }
    }

    pub fn extractor(&self) -> &FieldExtractor<L> {
        &self.extractor
    }

    /// Build a record, or `None` when the post has no usable identity or
    /// could not be read.
    pub fn build<H: ElementHandle>(&self, element: &H, source_url: &str) -> Option<PostRecord> {
        match self.build_outcome(element, source_url) {
            BuildOutcome::Built(record) => Some(record),
            BuildOutcome::MissingIdentity | BuildOutcome::Failed(_) => None,
        }
    }

    pub fn build_outcome<H: ElementHandle>(&self, element: &H, source_url: &str) -> BuildOutcome {
        match self.try_build(element, source_url) {
            Ok(Some(record)) => BuildOutcome::Built(record),
            Ok(None) => BuildOutcome::MissingIdentity,
            Err(e) => BuildOutcome::Failed(e.to_string()),
        }
    }

    /// Build every candidate of a page; one bad post never stops the batch.
    pub fn build_all<H: ElementHandle>(
        &self,
        candidates: &[ContainerCandidate<H>],
        source_url: &str,
    ) -> BuildReport {
        let mut report = BuildReport::default();
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for candidate in candidates {
            match self.build_outcome(&candidate.handle, source_url) {
                BuildOutcome::Built(record) => match by_id.get(&record.id) {
                    Some(&idx) => {
                        report.duplicates += 1;
                        let kept = &mut report.records[idx];
                        if record.caption_len() > kept.caption_len() {
                            kept.caption = record.caption;
                        }
                    }
                    None => {
                        by_id.insert(record.id.clone(), report.records.len());
                        report.records.push(record);
                    }
                },
                BuildOutcome::MissingIdentity => {
                    report.missing_identity += 1;
                    log::debug!("Dropped container {}: no post id", short_key(&candidate.key));
                }
                BuildOutcome::Failed(message) => {
                    report.failed += 1;
                    log::warn!(
                        "Failed to parse container {}: {}",
                        short_key(&candidate.key),
                        message
                    );
                }
            }
        }

        report
    }

    /// The element itself when it carries a container marker, otherwise its
    /// nearest ancestor satisfying the ranked predicates.
    pub fn resolve_container<H: ElementHandle>(&self, element: &H) -> Result<H> {
        for marker in &self.markers {
            if marker.matches(element)? {
                return Ok(element.clone());
            }
        }
        nearest_ancestor_satisfying(element, &self.ancestry)
    }

    fn try_build<H: ElementHandle>(
        &self,
        element: &H,
        source_url: &str,
    ) -> Result<Option<PostRecord>> {
        let container = self.resolve_container(element)?;

        let link = self.extractor.extract_link(&container);
        let link = resolve(source_url, &link);
        let id = self.extractor.extract_id(&link);
        if id.is_empty() {
            return Ok(None);
        }

        Ok(Some(PostRecord {
            id,
            source_url: source_url.to_string(),
            timestamp_label: self.extractor.extract_timestamp(&container),
            link,
            caption: self.extractor.extract_caption(&container),
            notified: false,
        }))
    }
}

fn short_key(key: &str) -> String {
    key.chars().take(40).collect()
}
