// src/dom/html.rs

//! Element handles over static markup, backed by `scraper`.

use scraper::{ElementRef, Html, Selector};

use crate::dom::ElementHandle;
use crate::error::{AppError, Result};

/// A parsed page that owns its document.
pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    /// Parse a full page (or any fragment) of markup.
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Html::parse_document(markup),
        }
    }

    /// Handle to the root element.
    pub fn root(&self) -> HtmlHandle<'_> {
        HtmlHandle(self.document.root_element())
    }
}

/// Handle to one element of an [`HtmlPage`].
#[derive(Debug, Clone, Copy)]
pub struct HtmlHandle<'a>(ElementRef<'a>);

impl<'a> HtmlHandle<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self(element)
    }

    fn parse_selector(selector: &str) -> Result<Selector> {
        Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))
    }
}

impl<'a> ElementHandle for HtmlHandle<'a> {
    fn tag_name(&self) -> Result<String> {
        Ok(self.0.value().name().to_ascii_lowercase())
    }

    fn attr(&self, name: &str) -> Result<Option<String>> {
        Ok(self.0.value().attr(name).map(str::to_string))
    }

    fn text(&self) -> Result<String> {
        let words: Vec<&str> = self.0.text().flat_map(str::split_whitespace).collect();
        Ok(words.join(" "))
    }

    fn inner_html(&self) -> Result<String> {
        Ok(self.0.inner_html())
    }

    fn outer_html(&self) -> Result<String> {
        Ok(self.0.html())
    }

    fn find_first(&self, selector: &str) -> Result<Option<Self>> {
        let sel = Self::parse_selector(selector)?;
        Ok(self.0.select(&sel).next().map(HtmlHandle))
    }

    fn find_all(&self, selector: &str) -> Result<Vec<Self>> {
        let sel = Self::parse_selector(selector)?;
        Ok(self.0.select(&sel).map(HtmlHandle).collect())
    }

    fn ancestors(&self) -> Result<Vec<Self>> {
        Ok(self
            .0
            .ancestors()
            .filter_map(ElementRef::wrap)
            .map(HtmlHandle)
            .collect())
    }

    fn document(&self) -> Result<Self> {
        let root = self
            .0
            .ancestors()
            .filter_map(ElementRef::wrap)
            .last()
            .unwrap_or(self.0);
        Ok(HtmlHandle(root))
    }

    fn click(&self) -> Result<()> {
        Err(AppError::interaction(
            "static markup cannot be clicked; a live browser handle is required",
        ))
    }
}
