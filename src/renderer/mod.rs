pub mod webdriver;

pub use webdriver::WebDriverRenderer;

use crate::error::CrawlError;
use async_trait::async_trait;
use url::Url;

/// A browser that can load a page, run its scripts and hand back the resulting DOM.
///
/// Implementations own exactly one rendering context; the navigator drives it one
/// page at a time and never issues overlapping calls.
#[async_trait]
pub trait Renderer: Send {
    /// Navigate to `url`, wait until an element matching `landmark` exists, and
    /// return a snapshot of the rendered markup.
    ///
    /// Fails with [`CrawlError::NavigationTimeout`] when either the navigation or
    /// the landmark wait exceeds its bound.
    async fn render(&mut self, url: &Url, landmark: &str) -> Result<String, CrawlError>;

    /// Release the rendering context. Calling it twice is a no-op.
    async fn close(&mut self) -> Result<(), CrawlError>;
}
