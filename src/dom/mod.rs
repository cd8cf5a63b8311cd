//! Element handles.
//!
//! Extraction never talks to a browser or a parser directly. It works over
//! [`ElementHandle`], which a live browser binding and the static markup
//! implementation in [`html`] both satisfy. Reads are fallible because a live
//! element can go stale between two calls.

pub mod html;

use crate::error::Result;
use crate::models::ContainerPredicate;

pub use html::{HtmlHandle, HtmlPage};

/// A node in a rendered page.
pub trait ElementHandle: Clone {
    /// Lower-case tag name.
    fn tag_name(&self) -> Result<String>;

    /// Attribute value, `None` when absent.
    fn attr(&self, name: &str) -> Result<Option<String>>;

    /// Readable text of the element and its descendants.
    fn text(&self) -> Result<String>;

    fn inner_html(&self) -> Result<String>;

    fn outer_html(&self) -> Result<String>;

    /// First descendant matching a CSS selector.
    fn find_first(&self, selector: &str) -> Result<Option<Self>>;

    /// All descendants matching a CSS selector, in document order.
    fn find_all(&self, selector: &str) -> Result<Vec<Self>>;

    /// Ancestors, nearest first. The element itself is not included.
    fn ancestors(&self) -> Result<Vec<Self>>;

    /// Root element of the page this element belongs to.
    fn document(&self) -> Result<Self>;

    /// Trigger the element as a user would.
    fn click(&self) -> Result<()>;

    /// First descendant with the given tag whose text contains `phrase`.
    fn find_by_text(&self, tag: &str, phrase: &str) -> Result<Option<Self>> {
        for candidate in self.find_all(tag)? {
            if candidate.text()?.contains(phrase) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

/// Walk up to the nearest ancestor satisfying one of `predicates`.
///
/// Predicates are tried in order; for each one the closest matching ancestor
/// wins, so an earlier predicate beats a nearer match of a later one. When no
/// predicate matches, the element itself is returned.
pub fn nearest_ancestor_satisfying<H: ElementHandle>(
    handle: &H,
    predicates: &[ContainerPredicate],
) -> Result<H> {
    let ancestors = handle.ancestors()?;
    for predicate in predicates {
        for ancestor in &ancestors {
            if predicate.matches(ancestor)? {
                return Ok(ancestor.clone());
            }
        }
    }
    Ok(handle.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"
        <html><body>
          <div id="feed">
            <div role="article" id="post">
              <div class="x1yztbdb inner" id="brittle">
                <span id="leaf">text</span>
              </div>
            </div>
          </div>
        </body></html>"#;

    #[test]
    fn test_earlier_predicate_beats_nearer_match() {
        let page = HtmlPage::parse(NESTED);
        let leaf = page.root().find_first("#leaf").unwrap().unwrap();
        let predicates = vec![
            ContainerPredicate::attr("div", "role", "article"),
            ContainerPredicate::class_contains("x1yztbdb"),
        ];

        let found = nearest_ancestor_satisfying(&leaf, &predicates).unwrap();
        assert_eq!(found.attr("id").unwrap().as_deref(), Some("post"));
    }

    #[test]
    fn test_falls_back_to_self() {
        let page = HtmlPage::parse(NESTED);
        let leaf = page.root().find_first("#leaf").unwrap().unwrap();
        let predicates = vec![ContainerPredicate::tag("article")];

        let found = nearest_ancestor_satisfying(&leaf, &predicates).unwrap();
        assert_eq!(found.attr("id").unwrap().as_deref(), Some("leaf"));
    }

    #[test]
    fn test_find_by_text() {
        let page = HtmlPage::parse(
            "<div><span>Share</span><span>Copy link</span><span>Other</span></div>",
        );
        let found = page.root().find_by_text("span", "Copy link").unwrap();
        assert_eq!(found.unwrap().text().unwrap(), "Copy link");
    }

    #[test]
    fn test_find_by_text_ignores_spacing() {
        let page = HtmlPage::parse("<div><span>Share</span><span> Copy \n  link </span></div>");
        let found = page.root().find_by_text("span", "Copy link").unwrap();
        assert!(found.is_some());
    }
}
