// src/services/keywords.rs

//! Caption keyword filter applied before forwarding.

use crate::models::NotifyConfig;

/// Case-insensitive allow/deny keyword filter.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    allow: Vec<String>,
    deny: Vec<String>,
}

impl KeywordFilter {
    pub fn new(allow: &[String], deny: &[String]) -> Self {
        Self {
            allow: normalize(allow),
            deny: normalize(deny),
        }
    }

    pub fn from_config(config: &NotifyConfig) -> Self {
        Self::new(&config.allow_keywords, &config.deny_keywords)
    }

    /// Deny wins over allow; an empty allow list accepts everything.
    pub fn accepts(&self, caption: &str) -> bool {
        let caption = caption.to_lowercase();
        if self.deny.iter().any(|k| caption.contains(k.as_str())) {
            return false;
        }
        self.allow.is_empty() || self.allow.iter().any(|k| caption.contains(k.as_str()))
    }
}

fn normalize(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(allow: &[&str], deny: &[&str]) -> KeywordFilter {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        KeywordFilter::new(&owned(allow), &owned(deny))
    }

    #[test]
    fn test_empty_lists_accept_all() {
        assert!(KeywordFilter::default().accepts("anything"));
    }

    #[test]
    fn test_allow_list_is_case_insensitive() {
        let f = filter(&["Phòng Trọ", "rent"], &[]);
        assert!(f.accepts("PHÒNG TRỌ giá rẻ"));
        assert!(f.accepts("For RENT now"));
        assert!(!f.accepts("selling a bike"));
    }

    #[test]
    fn test_deny_wins() {
        let f = filter(&["rent"], &["sold"]);
        assert!(!f.accepts("rent: sold out"));
    }

    #[test]
    fn test_blank_keywords_ignored() {
        let f = filter(&["  "], &[""]);
        assert!(f.accepts("whatever"));
    }
}
