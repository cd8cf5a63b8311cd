// src/models/post.rs

//! Post record data structure.

use serde::{Deserialize, Serialize};

/// Placeholder timestamp label when a post shows none.
pub const UNKNOWN_TIME: &str = "Unknown";

/// One post discovered in a group feed.
///
/// Field order is the column order of the store file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRecord {
    /// Canonical numeric post id
    #[serde(rename = "post_id")]
    pub id: String,

    /// Page the post was discovered on
    #[serde(rename = "group_url")]
    pub source_url: String,

    /// Display or accessible label of the post time
    #[serde(rename = "post_time")]
    pub timestamp_label: String,

    /// Canonical permalink
    #[serde(rename = "post_link")]
    pub link: String,

    /// Readable caption text
    pub caption: String,

    /// Whether the post has been forwarded
    #[serde(rename = "isSentToTelegram", with = "flag")]
    pub notified: bool,
}

impl PostRecord {
    /// Caption length in characters.
    pub fn caption_len(&self) -> usize {
        self.caption.chars().count()
    }
}

/// Store files spell booleans `True`/`False`.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid flag value '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_len_counts_chars() {
        let record = PostRecord {
            id: "1".into(),
            source_url: String::new(),
            timestamp_label: UNKNOWN_TIME.into(),
            link: String::new(),
            caption: "Phòng trọ".into(),
            notified: false,
        };
        assert_eq!(record.caption_len(), 9);
    }
}
