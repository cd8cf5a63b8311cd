// src/models/selectors.rs

//! Ranked extraction strategies.
//!
//! Every list here is evaluated in order with first-success semantics, most
//! specific first. Feed markup changes often, so the lists live in
//! configuration rather than in control flow.

use serde::{Deserialize, Serialize};

use crate::dom::ElementHandle;
use crate::error::Result;

/// Strategy lists for locating containers and extracting fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Upper bound on containers taken from one page
    #[serde(default = "defaults::max_posts")]
    pub max_posts: usize,

    /// Container selectors, most specific first
    #[serde(default = "defaults::container_selectors")]
    pub container_selectors: Vec<String>,

    /// Generic selector used when every container selector finds nothing
    #[serde(default = "defaults::fallback_selector")]
    pub fallback_selector: String,

    /// An element matching any of these is already a post container
    #[serde(default = "defaults::container_markers")]
    pub container_markers: Vec<ContainerPredicate>,

    /// Ancestor predicates used to widen a child element to its container
    #[serde(default = "defaults::ancestor_predicates")]
    pub ancestor_predicates: Vec<ContainerPredicate>,

    /// Permalink selectors
    #[serde(default = "defaults::link_selectors")]
    pub link_selectors: Vec<String>,

    /// Regexes with one numeric capture group, applied to the link
    #[serde(default = "defaults::id_patterns")]
    pub id_patterns: Vec<String>,

    /// Caption-bearing element selectors
    #[serde(default = "defaults::caption_selectors")]
    pub caption_selectors: Vec<String>,

    /// Time label selectors
    #[serde(default = "defaults::timestamp_selectors")]
    pub timestamp_selectors: Vec<String>,

    /// Share affordance inside a post
    #[serde(default = "defaults::share_selector")]
    pub share_selector: String,

    /// Menu texts of the "copy link" action, one per UI locale
    #[serde(default = "defaults::copy_link_phrases")]
    pub copy_link_phrases: Vec<String>,

    /// Regex with one capture group matching joined-group links in page markup
    #[serde(default = "defaults::group_link_pattern")]
    pub group_link_pattern: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_posts: defaults::max_posts(),
            container_selectors: defaults::container_selectors(),
            fallback_selector: defaults::fallback_selector(),
            container_markers: defaults::container_markers(),
            ancestor_predicates: defaults::ancestor_predicates(),
            link_selectors: defaults::link_selectors(),
            id_patterns: defaults::id_patterns(),
            caption_selectors: defaults::caption_selectors(),
            timestamp_selectors: defaults::timestamp_selectors(),
            share_selector: defaults::share_selector(),
            copy_link_phrases: defaults::copy_link_phrases(),
            group_link_pattern: defaults::group_link_pattern(),
        }
    }
}

/// Structural test on an element: every constraint that is set must hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerPredicate {
    /// Required tag name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Required attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,

    /// Required value of `attr`; any value when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Substring the `class` attribute must contain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_contains: Option<String>,
}

impl ContainerPredicate {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Self::default()
        }
    }

    pub fn attr(tag: &str, attr: &str, value: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            attr: Some(attr.to_string()),
            value: Some(value.to_string()),
            ..Self::default()
        }
    }

    /// Attribute present with any value, on any tag.
    pub fn marker(attr: &str) -> Self {
        Self {
            attr: Some(attr.to_string()),
            ..Self::default()
        }
    }

    pub fn class_contains(fragment: &str) -> Self {
        Self {
            tag: Some("div".to_string()),
            class_contains: Some(fragment.to_string()),
            ..Self::default()
        }
    }

    /// Whether the element satisfies every constraint.
    pub fn matches<H: ElementHandle>(&self, element: &H) -> Result<bool> {
        if let Some(tag) = &self.tag {
            if !element.tag_name()?.eq_ignore_ascii_case(tag) {
                return Ok(false);
            }
        }

        if let Some(attr) = &self.attr {
            match (element.attr(attr)?, &self.value) {
                (None, _) => return Ok(false),
                (Some(actual), Some(expected)) if &actual != expected => return Ok(false),
                _ => {}
            }
        }

        if let Some(fragment) = &self.class_contains {
            let class = element.attr("class")?.unwrap_or_default();
            if !class.contains(fragment.as_str()) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

mod defaults {
    use super::ContainerPredicate;

    pub fn max_posts() -> usize {
        50
    }

    pub fn container_selectors() -> Vec<String> {
        vec![
            "div[role='article']".into(),
            "div[data-ad-rendering-role='story_message']".into(),
            "div[data-ad-preview='message']".into(),
            "div.x1yztbdb.x1n2onr6.xh8yej3.x1ja2u2z".into(),
        ]
    }

    pub fn fallback_selector() -> String {
        "article".into()
    }

    pub fn container_markers() -> Vec<ContainerPredicate> {
        vec![
            ContainerPredicate::marker("data-ad-rendering-role"),
            ContainerPredicate::marker("data-ad-preview"),
            ContainerPredicate::attr("div", "role", "article"),
        ]
    }

    pub fn ancestor_predicates() -> Vec<ContainerPredicate> {
        vec![
            ContainerPredicate::attr("div", "role", "article"),
            ContainerPredicate::attr("div", "data-ad-rendering-role", "story_message"),
            ContainerPredicate::attr("div", "data-ad-preview", "message"),
            ContainerPredicate::class_contains("x1yztbdb"),
            ContainerPredicate::tag("article"),
            ContainerPredicate::tag("div"),
        ]
    }

    pub fn link_selectors() -> Vec<String> {
        vec![
            "a[href*='/posts/']".into(),
            "a[href*='/permalink/']".into(),
            "a[href*='story_fbid=']".into(),
            "a[href*='/groups/'][href*='/?__cft__']".into(),
            "a[aria-label][role='link']".into(),
        ]
    }

    pub fn id_patterns() -> Vec<String> {
        vec![
            r"/posts/(\d+)".into(),
            r"/permalink/(\d+)".into(),
            r"story_fbid=(\d+)".into(),
        ]
    }

    pub fn caption_selectors() -> Vec<String> {
        vec![
            "[data-ad-rendering-role='story_message']".into(),
            "[data-ad-preview='message']".into(),
        ]
    }

    pub fn timestamp_selectors() -> Vec<String> {
        vec!["a[aria-label] abbr, abbr".into(), "abbr".into()]
    }

    pub fn share_selector() -> String {
        "span[data-ad-rendering-role='share_button']".into()
    }

    pub fn copy_link_phrases() -> Vec<String> {
        vec!["Copy link".into(), "Sao chép liên kết".into()]
    }

    pub fn group_link_pattern() -> String {
        r#"href="(https://www\.facebook\.com/groups/\d+/)""#.into()
    }
}
