use crate::catalog::Catalog;
use crate::config::{SelectorConfig, compile_selector};
use crate::error::ConfigError;
use crate::navigator::ItemHandle;
use crate::results::{ProductRecord, SubmissionOutcome};
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;
use url::Url;

/// Plain decimal, optionally with well-formed thousands separators
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").expect("price pattern is valid")
});

const NO_TITLE: &str = "No Title";

/// A value read from a product card, and whether it came from the default
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Extracted<T> {
    fn found(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

/// Card fields that can fall back to a default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Price,
    Image,
    Category,
    Link,
}

/// A record together with the fields that had to be defaulted
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedProduct {
    pub record: ProductRecord,
    pub defaulted: Vec<Field>,
}

/// Turns product cards into catalog records and submits them
pub struct RecordExtractor {
    title: Selector,
    price: Selector,
    image: Selector,
    category: Selector,
    link: Selector,
    base_url: String,
    currency: String,
}

impl RecordExtractor {
    pub fn new(
        selectors: &SelectorConfig,
        base_url: &str,
        currency: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile_selector("title", &selectors.title)?,
            price: compile_selector("price", &selectors.price)?,
            image: compile_selector("image", &selectors.image)?,
            category: compile_selector("category", &selectors.category)?,
            link: compile_selector("link", &selectors.link)?,
            base_url: base_url.to_string(),
            currency: currency.to_string(),
        })
    }

    /// Read every field of one card. Never fails; missing parts take their default.
    pub fn extract(&self, item: &ItemHandle<'_>) -> ExtractedProduct {
        let title = match read_text(item, &self.title) {
            Some(title) => Extracted::found(title),
            None => Extracted::fallback(NO_TITLE.to_string()),
        };

        let price = match item.query(&self.price) {
            Some(el) => {
                let raw = el.text().collect::<String>();
                match parse_price(&raw, &self.currency) {
                    Some(price) => Extracted::found(price),
                    None => {
                        ::log::debug!("Unparsable price '{}' for {}", raw.trim(), title.value);
                        Extracted::fallback(0.0)
                    }
                }
            }
            None => Extracted::fallback(0.0),
        };

        let image = text_or_empty(read_attr(item, &self.image, "src"));
        let category = text_or_empty(read_text(item, &self.category));
        let link = read_attr(item, &self.link, "href");
        let link_defaulted = link.is_none();
        let url = product_url(&self.base_url, link.as_deref());

        let mut defaulted = Vec::new();
        for (field, was_defaulted) in [
            (Field::Title, title.defaulted),
            (Field::Price, price.defaulted),
            (Field::Image, image.defaulted),
            (Field::Category, category.defaulted),
            (Field::Link, link_defaulted),
        ] {
            if was_defaulted {
                defaulted.push(field);
            }
        }

        ExtractedProduct {
            record: ProductRecord {
                title: title.value,
                price: price.value,
                image_url: image.value,
                rating: 0,
                notes: format!("{} | {}", category.value, url),
            },
            defaulted,
        }
    }

    /// Extract one card and submit it. Exactly one submission attempt; failures
    /// are logged and returned, never propagated.
    pub async fn process(&self, item: &ItemHandle<'_>, catalog: &dyn Catalog) -> SubmissionOutcome {
        let extracted = self.extract(item);
        submit_logged(catalog, &extracted).await
    }
}

/// Send one record to the catalog and classify the result
pub async fn submit(catalog: &dyn Catalog, record: &ProductRecord) -> SubmissionOutcome {
    match catalog.create_product(record).await {
        Ok(reply) => SubmissionOutcome::from_reply(reply),
        Err(e) => SubmissionOutcome::TransportFailure(e.to_string()),
    }
}

/// [`submit`] with the per-item diagnostics written to the log
pub async fn submit_logged(catalog: &dyn Catalog, extracted: &ExtractedProduct) -> SubmissionOutcome {
    log_defaulted(extracted);
    let outcome = submit(catalog, &extracted.record).await;
    log_outcome(&extracted.record, &outcome);
    outcome
}

pub(crate) fn log_outcome(record: &ProductRecord, outcome: &SubmissionOutcome) {
    match outcome {
        SubmissionOutcome::Submitted { id: Some(id) } => {
            ::log::info!("Added: {} ({})", record.title, id)
        }
        SubmissionOutcome::Submitted { id: None } => ::log::info!("Added: {}", record.title),
        SubmissionOutcome::Rejected { status, body } => {
            ::log::warn!("Failed to add {}: {} - {}", record.title, status, body)
        }
        SubmissionOutcome::TransportFailure(e) => {
            ::log::error!("Error sending {}: {}", record.title, e)
        }
    }
}

pub(crate) fn log_defaulted(extracted: &ExtractedProduct) {
    if !extracted.defaulted.is_empty() {
        ::log::debug!(
            "Defaulted {:?} for {}",
            extracted.defaulted,
            extracted.record.title
        );
    }
}

/// Normalize a price label such as `"2500 RWF"`; anything unparsable is 0
pub fn normalize_price(raw: &str, currency: &str) -> f64 {
    parse_price(raw, currency).unwrap_or(0.0)
}

fn parse_price(raw: &str, currency: &str) -> Option<f64> {
    let stripped = if currency.is_empty() {
        raw.to_string()
    } else {
        raw.replace(currency, "")
    };
    let remainder = stripped.trim();
    if !PRICE_PATTERN.is_match(remainder) {
        return None;
    }
    remainder
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// Absolute product URL for a card link; the bare base URL when there is none
pub fn product_url(base_url: &str, link: Option<&str>) -> String {
    let Some(link) = link.filter(|l| !l.is_empty()) else {
        return base_url.to_string();
    };
    if Url::parse(link).is_ok() {
        return link.to_string();
    }
    match (base_url.ends_with('/'), link.starts_with('/')) {
        (true, true) => format!("{}{}", base_url, &link[1..]),
        (false, false) => format!("{}/{}", base_url, link),
        _ => format!("{}{}", base_url, link),
    }
}

fn read_text(item: &ItemHandle<'_>, selector: &Selector) -> Option<String> {
    item.query(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn read_attr(item: &ItemHandle<'_>, selector: &Selector, name: &str) -> Option<String> {
    item.query(selector)
        .and_then(|el| el.value().attr(name))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn text_or_empty(value: Option<String>) -> Extracted<String> {
    match value {
        Some(v) => Extracted::found(v),
        None => Extracted::fallback(String::new()),
    }
}
