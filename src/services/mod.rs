//! Service layer for the post watcher.
//!
//! This module contains the business logic for:
//! - Post container discovery (`PostContainerLocator`)
//! - Field extraction (`FieldExtractor`) and record assembly (`PostRecordBuilder`)
//! - Saved-markup sanitizing (`HtmlSanitizer`)
//! - Forwarding (`Notifier`, `KeywordFilter`)
//! - Group discovery and scroll pagination helpers

mod builder;
mod extractor;
mod groups;
mod keywords;
mod locator;
mod notifier;
mod paginate;
mod sanitizer;

pub use builder::{BuildOutcome, BuildReport, PostRecordBuilder};
pub use extractor::{Clipboard, CopyLink, FieldExtractor, NoCopyLink, ShareMenuCopier, strip_tags};
pub use groups::{discover_group_urls, save_group_urls};
pub use keywords::KeywordFilter;
pub use locator::{ContainerCandidate, PostContainerLocator, dedup_key};
pub use notifier::{LogNotifier, NO_CAPTION, Notifier, TelegramNotifier, format_message};
pub use paginate::{ScrollSurface, scroll_until_stable};
pub use sanitizer::{HtmlSanitizer, SanitizedPage, cleanup, collapse_duplicated_halves};
