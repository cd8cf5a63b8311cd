// src/models/mod.rs

//! Domain models for the post watcher.

mod config;
mod post;
mod selectors;

// Re-export all public types
pub use config::{Config, LoggingConfig, NotifyConfig, PathsConfig, ScheduleConfig};
pub use post::{PostRecord, UNKNOWN_TIME};
pub use selectors::{ContainerPredicate, SelectorConfig};
