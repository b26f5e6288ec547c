pub mod catalog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod navigator;
pub mod pipeline;
pub mod renderer;
pub mod results;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use catalog::{Catalog, CatalogClient};
pub use config::HarvestConfig;
pub use error::{CatalogError, ConfigError, CrawlError};
pub use pipeline::Harvester;
pub use results::{CrawlEnd, CrawlSummary, ProductRecord, SubmissionOutcome};

use renderer::WebDriverRenderer;
use std::path::Path;
use std::sync::Arc;

/// Builder for a harvest run against a live browser and Catalog API
pub struct Harvest {
    config: HarvestConfig,
}

impl Harvest {
    /// Create a new Harvest builder for the given first listing page
    pub fn new(start_url: &str) -> Self {
        Self {
            config: HarvestConfig::new(start_url),
        }
    }

    /// Apply a configuration
    pub fn with_config(mut self, config: HarvestConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = HarvestConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Apply configuration from a JSON string
    pub fn with_config_str(self, json: &str) -> Result<Self, ConfigError> {
        let config = HarvestConfig::from_json(json)?;
        Ok(self.with_config(config))
    }

    pub fn with_start_url(mut self, start_url: &str) -> Self {
        self.config.start_url = start_url.to_string();
        self
    }

    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = webdriver_url.to_string();
        self
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.config.api_url = api_url.to_string();
        self
    }

    /// Stop after this many listing pages
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = Some(max_pages);
        self
    }

    /// Allow this many submissions in flight within one page
    pub fn with_submit_concurrency(mut self, concurrency: usize) -> Self {
        self.config.submit_concurrency = concurrency;
        self
    }

    /// Set the total timeout (maximum runtime)
    pub fn with_total_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.total_timeout_secs = Some(timeout_seconds);
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Launch the browser and crawl the listing; Ctrl-C aborts the crawl
    pub async fn run(self) -> Result<CrawlSummary, CrawlError> {
        let config = self.config;
        config.validate()?;

        let catalog = CatalogClient::new(config.api_endpoint()?, config.request_timeout())
            .map_err(|e| ConfigError::InvalidValue {
                field: "api_url",
                reason: e.to_string(),
            })?;

        ::log::info!("Starting harvest of {}", config.start_url);
        ::log::info!("Submitting products to {}", catalog.endpoint());

        let renderer = WebDriverRenderer::connect(
            &config.webdriver_url,
            config.headless,
            config.page_load_timeout(),
            config.landmark_timeout(),
        )
        .await?;

        let harvester = Harvester::new(renderer, Arc::new(catalog), &config)?;
        harvester
            .run_until(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ::log::warn!("Interrupt received, stopping crawl");
                } else {
                    std::future::pending::<()>().await;
                }
            })
            .await
    }
}
