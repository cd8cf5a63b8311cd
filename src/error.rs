// src/error.rs

//! Unified error handling for the post watcher.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for groupwatch operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Every container strategy failed, including the fallback
    #[error("Locate error: {message}")]
    Locate { message: String },

    /// Store or sent-log read/write failed
    #[error("Persistence error for {path}: {message}")]
    Persistence { path: String, message: String },

    /// The outbound message could not be delivered
    #[error("Notification failed for {url}: {message}")]
    Notification { url: String, message: String },

    /// An element handle cannot perform the requested UI action
    #[error("Interaction error: {0}")]
    Interaction(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a locate error.
    pub fn locate(message: impl fmt::Display) -> Self {
        Self::Locate {
            message: message.to_string(),
        }
    }

    /// Create a persistence error for a file path.
    pub fn persistence(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a notification error for a URL.
    pub fn notification(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Notification {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an interaction error.
    pub fn interaction(message: impl Into<String>) -> Self {
        Self::Interaction(message.into())
    }
}
