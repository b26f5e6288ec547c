use crate::catalog::Catalog;
use crate::error::{CatalogError, CrawlError, LoadPhase};
use crate::renderer::Renderer;
use crate::results::{CatalogReply, ProductRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const START_URL: &str = "https://kasha.rw/product-category/?id=B33";
pub const PAGE_2_URL: &str = "https://kasha.rw/product-category/?id=B33&page=2";
pub const PAGE_3_URL: &str = "https://kasha.rw/product-category/?id=B33&page=3";

/// What the in-memory renderer does for a URL
pub enum FixturePage {
    Html(String),
    LoadTimeout,
    MissingLandmark,
    Hang,
}

/// Observes a [`StaticRenderer`] after it has been moved into a navigator
#[derive(Clone, Default)]
pub struct RendererProbe {
    rendered: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl RendererProbe {
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Renderer that serves pre-rendered markup from memory
#[derive(Default)]
pub struct StaticRenderer {
    pages: HashMap<String, FixturePage>,
    probe: RendererProbe,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), FixturePage::Html(html));
        self
    }

    pub fn with_fixture(mut self, url: &str, page: FixturePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn probe(&self) -> RendererProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn render(&mut self, url: &Url, _landmark: &str) -> Result<String, CrawlError> {
        self.probe.rendered.lock().unwrap().push(url.to_string());
        let timeout = |phase| CrawlError::NavigationTimeout {
            url: url.to_string(),
            phase,
            waited: Duration::from_millis(10),
        };
        match self.pages.get(url.as_str()) {
            Some(FixturePage::Html(html)) => Ok(html.clone()),
            Some(FixturePage::MissingLandmark) => Err(timeout(LoadPhase::Landmark)),
            Some(FixturePage::Hang) => std::future::pending().await,
            Some(FixturePage::LoadTimeout) | None => Err(timeout(LoadPhase::PageLoad)),
        }
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        self.probe.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Scripted Catalog API answer for one product title
pub enum Scripted {
    Status(u16, &'static str),
    Transport(&'static str),
    CreatedAfter(Duration),
}

/// Catalog that records every request and answers 201 unless scripted otherwise
#[derive(Default)]
pub struct RecordingCatalog {
    received: Mutex<Vec<ProductRecord>>,
    scripted: HashMap<String, Scripted>,
}

impl RecordingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, title: &str, answer: Scripted) -> Self {
        self.scripted.insert(title.to_string(), answer);
        self
    }

    pub fn received(&self) -> Vec<ProductRecord> {
        self.received.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.received().into_iter().map(|r| r.title).collect()
    }
}

#[async_trait]
impl Catalog for RecordingCatalog {
    async fn create_product(&self, record: &ProductRecord) -> Result<CatalogReply, CatalogError> {
        let id = {
            let mut received = self.received.lock().unwrap();
            received.push(record.clone());
            format!("id-{}", received.len())
        };
        let created = CatalogReply {
            status: 201,
            body: format!(r#"{{"_id":"{}"}}"#, id),
        };
        match self.scripted.get(&record.title) {
            None => Ok(created),
            Some(Scripted::Status(status, body)) => Ok(CatalogReply {
                status: *status,
                body: body.to_string(),
            }),
            Some(Scripted::Transport(message)) => Err(CatalogError::Transport(message.to_string())),
            Some(Scripted::CreatedAfter(delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(created)
            }
        }
    }
}

/// One product card in the listing markup
pub fn card(title: &str, price: Option<&str>, href: Option<&str>) -> String {
    let price = price
        .map(|p| format!(r#"<span class="product-item__price">{}</span>"#, p))
        .unwrap_or_default();
    let link = href
        .map(|h| format!(r#"<a href="{}">view</a>"#, h))
        .unwrap_or_default();
    format!(
        r#"<div class="product-item__inner">
            {link}
            <img src="https://cdn.kasha.rw/{title}.png">
            <span class="product-item__cat-name">Care</span>
            <h5 class="product-item__name"> {title} </h5>
            {price}
        </div>"#
    )
}

/// A listing page holding `cards`, with an optional next-page control
pub fn listing(cards: &[String], next_href: Option<&str>) -> String {
    let next = next_href
        .map(|h| format!(r#"<nav><a class="page-numbers next" href="{}">Next</a></nav>"#, h))
        .unwrap_or_default();
    format!(
        "<html><body><main>{}</main>{}</body></html>",
        cards.join("\n"),
        next
    )
}
