use crate::error::ConfigError;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Configuration for one harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// First listing page of the category to crawl
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Site root that relative product links are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Catalog API endpoint that accepts product creation requests
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Upper bound on a single page navigation
    #[serde(default = "default_page_load_timeout_ms")]
    pub page_load_timeout_ms: u64,

    /// Upper bound on waiting for the item container to appear
    #[serde(default = "default_landmark_timeout_ms")]
    pub landmark_timeout_ms: u64,

    /// Upper bound on one submission round-trip
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Stop after this many listing pages
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Number of submissions allowed in flight within a page
    #[serde(default = "default_submit_concurrency")]
    pub submit_concurrency: usize,

    /// Maximum runtime of the whole crawl
    #[serde(default)]
    pub total_timeout_secs: Option<u64>,

    /// Currency token stripped from price labels
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// CSS selectors describing the listing markup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_item_selector")]
    pub item: String,

    #[serde(default = "default_title_selector")]
    pub title: String,

    #[serde(default = "default_price_selector")]
    pub price: String,

    /// Element whose `src` attribute is the product image
    #[serde(default = "default_image_selector")]
    pub image: String,

    #[serde(default = "default_category_selector")]
    pub category: String,

    /// Element whose `href` attribute links to the product page
    #[serde(default = "default_link_selector")]
    pub link: String,

    #[serde(default = "default_next_page_selector")]
    pub next_page: String,
}

fn default_start_url() -> String {
    "https://kasha.rw/product-category/?id=B33".to_string()
}

fn default_base_url() -> String {
    "https://kasha.rw".to_string()
}

fn default_api_url() -> String {
    "http://127.0.0.1:5000/api/products".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_page_load_timeout_ms() -> u64 {
    60_000
}

fn default_landmark_timeout_ms() -> u64 {
    15_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_submit_concurrency() -> usize {
    1
}

fn default_currency() -> String {
    "RWF".to_string()
}

fn default_item_selector() -> String {
    ".product-item__inner".to_string()
}

fn default_title_selector() -> String {
    ".product-item__name".to_string()
}

fn default_price_selector() -> String {
    ".product-item__price".to_string()
}

fn default_image_selector() -> String {
    "img".to_string()
}

fn default_category_selector() -> String {
    ".product-item__cat-name".to_string()
}

fn default_link_selector() -> String {
    "a".to_string()
}

fn default_next_page_selector() -> String {
    "a.next".to_string()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item: default_item_selector(),
            title: default_title_selector(),
            price: default_price_selector(),
            image: default_image_selector(),
            category: default_category_selector(),
            link: default_link_selector(),
            next_page: default_next_page_selector(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self::new(&default_start_url())
    }
}

impl HarvestConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            base_url: default_base_url(),
            api_url: default_api_url(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            page_load_timeout_ms: default_page_load_timeout_ms(),
            landmark_timeout_ms: default_landmark_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_pages: None,
            submit_concurrency: default_submit_concurrency(),
            total_timeout_secs: None,
            currency: default_currency(),
            selectors: SelectorConfig::default(),
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Check every URL, selector and bound before any browser is launched
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.start_url()?;
        self.api_endpoint()?;
        parse_url("base", &self.base_url)?;
        parse_url("webdriver", &self.webdriver_url)?;

        let s = &self.selectors;
        for (field, selector) in [
            ("item", &s.item),
            ("title", &s.title),
            ("price", &s.price),
            ("image", &s.image),
            ("category", &s.category),
            ("link", &s.link),
            ("next_page", &s.next_page),
        ] {
            compile_selector(field, selector)?;
        }

        if self.submit_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "submit_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_pages == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_pages",
                reason: "must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }

    pub fn start_url(&self) -> Result<Url, ConfigError> {
        parse_url("start", &self.start_url)
    }

    pub fn api_endpoint(&self) -> Result<Url, ConfigError> {
        parse_url("api", &self.api_url)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn landmark_timeout(&self) -> Duration {
        Duration::from_millis(self.landmark_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn total_timeout(&self) -> Option<Duration> {
        self.total_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })
}

/// Compile a CSS selector, keeping the offending field in the error
pub(crate) fn compile_selector(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        field,
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
