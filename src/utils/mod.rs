//! Utility functions and helpers.

pub mod log;
pub mod url;

pub use url::{canonical_link, canonical_url, resolve, strip_query};
