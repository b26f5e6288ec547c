use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating a harvest configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {field} URL '{value}': {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        source: url::ParseError,
    },

    #[error("invalid {field} selector '{selector}': {reason}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        reason: String,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Which part of loading a listing page ran out of time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// The browser never finished navigating to the page
    PageLoad,
    /// The page loaded but the item container never appeared
    Landmark,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPhase::PageLoad => write!(f, "page load"),
            LoadPhase::Landmark => write!(f, "item container"),
        }
    }
}

/// Errors that abort a crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("timed out waiting for {phase} of {url} after {waited:?}")]
    NavigationTimeout {
        url: String,
        phase: LoadPhase,
        waited: Duration,
    },

    #[error("could not connect to any WebDriver server (tried {tried})")]
    WebDriverUnavailable { tried: String },

    #[error("renderer failed while {context} {url}: {message}")]
    Renderer {
        context: &'static str,
        url: String,
        message: String,
    },

    #[error("crawl aborted")]
    Aborted,

    #[error("crawl exceeded its total deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Transport-level failures talking to the Catalog API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog request timed out: {0}")]
    Timeout(String),

    #[error("catalog request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout(err.to_string())
        } else {
            CatalogError::Transport(err.to_string())
        }
    }
}
