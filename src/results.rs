use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Normalized product as sent to the Catalog API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Trimmed product name, "No Title" when the card has none
    pub title: String,

    /// Non-negative price, 0 when missing or unparsable
    pub price: f64,

    /// Image source URL, empty when the card has no image
    #[serde(rename = "image")]
    pub image_url: String,

    /// Always 0, ratings are not scraped
    pub rating: u32,

    /// "{category} | {absolute product url}"
    pub notes: String,
}

/// Reply from the Catalog API for one creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReply {
    pub status: u16,
    pub body: String,
}

/// What happened to one submitted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Stored; carries the id the API issued when its body had one
    Submitted { id: Option<String> },
    /// The API answered with something other than 201
    Rejected { status: u16, body: String },
    /// The request never completed
    TransportFailure(String),
}

impl SubmissionOutcome {
    /// Classify a Catalog API reply
    pub fn from_reply(reply: CatalogReply) -> Self {
        if reply.status == reqwest::StatusCode::CREATED.as_u16() {
            SubmissionOutcome::Submitted {
                id: created_id(&reply.body),
            }
        } else {
            SubmissionOutcome::Rejected {
                status: reply.status,
                body: reply.body,
            }
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmissionOutcome::Submitted { .. })
    }
}

/// Pull the created id out of a 201 body (`_id` from the store, or `id`)
fn created_id(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["_id", "id"].iter().find_map(|key| match value.get(*key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Why a crawl stopped without a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEnd {
    /// A listing page rendered with no item containers
    EmptyPage(Url),
    /// The last page had no next-page control
    NoNextLink,
    /// The next-page control pointed at a page already crawled
    CycleDetected(Url),
    /// The next-page control could not be resolved to a URL
    UnresolvableNextLink(String),
    /// The configured page limit was reached
    PageLimit(usize),
}

impl CrawlEnd {
    /// Whether this is the ordinary end of a category listing
    pub fn is_natural(&self) -> bool {
        matches!(self, CrawlEnd::EmptyPage(_) | CrawlEnd::NoNextLink)
    }
}

impl fmt::Display for CrawlEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlEnd::EmptyPage(url) => write!(f, "no products found on {}", url),
            CrawlEnd::NoNextLink => write!(f, "reached the last page"),
            CrawlEnd::CycleDetected(url) => write!(f, "next page {} was already crawled", url),
            CrawlEnd::UnresolvableNextLink(href) => {
                write!(f, "next page link '{}' could not be resolved", href)
            }
            CrawlEnd::PageLimit(limit) => write!(f, "page limit of {} reached", limit),
        }
    }
}

/// Outcome of one product card
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    /// 1-based index of the listing page the card was on
    pub page: usize,
    pub title: String,
    pub outcome: SubmissionOutcome,
}

/// Totals for a finished crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub pages: usize,
    /// One entry per card, in submission-report order
    pub items: Vec<ItemReport>,
    /// Number of fields that fell back to their default value
    pub defaulted_fields: usize,
    pub end: CrawlEnd,
}

impl CrawlSummary {
    pub fn submitted(&self) -> usize {
        self.count(|o| matches!(o, SubmissionOutcome::Submitted { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, SubmissionOutcome::Rejected { .. }))
    }

    pub fn transport_failures(&self) -> usize {
        self.count(|o| matches!(o, SubmissionOutcome::TransportFailure(_)))
    }

    fn count(&self, pred: impl Fn(&SubmissionOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }
}
