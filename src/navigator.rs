//! Walks a paginated listing one rendered page at a time.
//!
//! The navigator is a pull-based sequence: each call to
//! [`PageNavigator::next_page`] renders at most one page. The crawl ends when a
//! page has no items, when a page has no next-page control, when the next page
//! was already visited, or when the page limit is reached.

use crate::config::{SelectorConfig, compile_selector};
use crate::error::{ConfigError, CrawlError};
use crate::renderer::Renderer;
use crate::results::CrawlEnd;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// One rendered listing page.
///
/// Owns the DOM snapshot; item handles borrow from it and cannot outlive it.
pub struct ListingPage {
    url: Url,
    document: Html,
    item_selector: Selector,
    next_href: Option<String>,
}

/// Reference to one product card on a [`ListingPage`]
#[derive(Debug, Clone, Copy)]
pub struct ItemHandle<'page> {
    element: ElementRef<'page>,
}

impl<'page> ItemHandle<'page> {
    pub fn new(element: ElementRef<'page>) -> Self {
        Self { element }
    }

    /// First descendant matching `selector`
    pub fn query(&self, selector: &Selector) -> Option<ElementRef<'page>> {
        self.element.select(selector).next()
    }
}

impl ListingPage {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Item cards in document order
    pub fn items(&self) -> Vec<ItemHandle<'_>> {
        self.document
            .select(&self.item_selector)
            .map(ItemHandle::new)
            .collect()
    }

    /// Raw `href` of the next-page control, if the page has one
    pub fn next_href(&self) -> Option<&str> {
        self.next_href.as_deref()
    }
}

/// Drives the renderer across the listing, one page per step
pub struct PageNavigator<R: Renderer> {
    renderer: R,
    item_css: String,
    item_selector: Selector,
    next_selector: Selector,
    cursor: Option<Url>,
    visited: HashSet<String>,
    pages_emitted: usize,
    max_pages: Option<usize>,
    end: Option<CrawlEnd>,
}

impl<R: Renderer> PageNavigator<R> {
    pub fn new(
        renderer: R,
        start_url: Url,
        selectors: &SelectorConfig,
        max_pages: Option<usize>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            renderer,
            item_css: selectors.item.clone(),
            item_selector: compile_selector("item", &selectors.item)?,
            next_selector: compile_selector("next_page", &selectors.next_page)?,
            cursor: Some(start_url),
            visited: HashSet::new(),
            pages_emitted: 0,
            max_pages,
            end: None,
        })
    }

    /// Render the next listing page.
    ///
    /// Returns `Ok(None)` once the listing is exhausted; [`end`](Self::end) then
    /// says why. Navigation failures are returned as errors and also end the
    /// sequence.
    pub async fn next_page(&mut self) -> Result<Option<ListingPage>, CrawlError> {
        let Some(url) = self.cursor.take() else {
            return Ok(None);
        };

        if let Some(limit) = self.max_pages {
            if self.pages_emitted >= limit {
                return Ok(self.finish(CrawlEnd::PageLimit(limit)));
            }
        }

        if !self.visited.insert(visit_key(&url)) {
            return Ok(self.finish(CrawlEnd::CycleDetected(url)));
        }

        ::log::info!("Navigating to: {}", url);
        let html = self.renderer.render(&url, &self.item_css).await?;
        let document = Html::parse_document(&html);

        let item_count = document.select(&self.item_selector).count();
        if item_count == 0 {
            return Ok(self.finish(CrawlEnd::EmptyPage(url)));
        }
        ::log::info!("Found {} products on {}", item_count, url);

        let next_href = document
            .select(&self.next_selector)
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty());

        match &next_href {
            Some(href) => match url.join(href) {
                Ok(next) => {
                    ::log::debug!("Next page: {}", next);
                    self.cursor = Some(next);
                }
                Err(e) => {
                    ::log::warn!("Cannot resolve next page link '{}' on {}: {}", href, url, e);
                    self.end = Some(CrawlEnd::UnresolvableNextLink(href.clone()));
                }
            },
            None => self.end = Some(CrawlEnd::NoNextLink),
        }

        self.pages_emitted += 1;
        Ok(Some(ListingPage {
            url,
            document,
            item_selector: self.item_selector.clone(),
            next_href,
        }))
    }

    /// Why the sequence ended, once it has
    pub fn end(&self) -> Option<&CrawlEnd> {
        self.end.as_ref()
    }

    pub fn pages_emitted(&self) -> usize {
        self.pages_emitted
    }

    /// Release the renderer. Safe to call on every exit path.
    pub async fn close(&mut self) {
        self.cursor = None;
        if let Err(e) = self.renderer.close().await {
            ::log::warn!("Failed to close renderer: {}", e);
        }
    }

    fn finish(&mut self, end: CrawlEnd) -> Option<ListingPage> {
        self.cursor = None;
        self.end = Some(end);
        None
    }
}

/// Key used for cycle detection; fragments never change the rendered page
fn visit_key(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.to_string()
}
