use crate::error::{CrawlError, LoadPhase};
use crate::renderer::Renderer;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Ports commonly used by WebDriver servers, tried when the configured one is down
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Renderer backed by a WebDriver session (ChromeDriver, geckodriver, ...)
pub struct WebDriverRenderer {
    client: Option<Client>,
    page_load_timeout: Duration,
    landmark_timeout: Duration,
}

impl WebDriverRenderer {
    /// Opens a browser session, falling back to well-known WebDriver ports
    pub async fn connect(
        webdriver_url: &str,
        headless: bool,
        page_load_timeout: Duration,
        landmark_timeout: Duration,
    ) -> Result<Self, CrawlError> {
        let client = connect_to_webdriver(webdriver_url, headless).await?;
        Ok(Self {
            client: Some(client),
            page_load_timeout,
            landmark_timeout,
        })
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn render(&mut self, url: &Url, landmark: &str) -> Result<String, CrawlError> {
        let client = self.client.as_ref().ok_or_else(|| CrawlError::Renderer {
            context: "rendering",
            url: url.to_string(),
            message: "browser session already closed".to_string(),
        })?;

        ::log::debug!("RENDER: {}", url);
        let started = std::time::Instant::now();

        match timeout(self.page_load_timeout, client.goto(url.as_str())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(navigation_error(e, "navigating to", url)),
            Err(_) => {
                return Err(CrawlError::NavigationTimeout {
                    url: url.to_string(),
                    phase: LoadPhase::PageLoad,
                    waited: self.page_load_timeout,
                });
            }
        }

        client
            .wait()
            .at_most(self.landmark_timeout)
            .for_element(Locator::Css(landmark))
            .await
            .map_err(|e| match e {
                CmdError::WaitTimeout => CrawlError::NavigationTimeout {
                    url: url.to_string(),
                    phase: LoadPhase::Landmark,
                    waited: self.landmark_timeout,
                },
                other => navigation_error(other, "waiting for items on", url),
            })?;

        let html = client
            .source()
            .await
            .map_err(|e| navigation_error(e, "getting source for", url))?;

        ::log::debug!(
            "Rendered {} in {:.2} seconds",
            url,
            started.elapsed().as_secs_f64()
        );
        Ok(html)
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        ::log::debug!("Closing browser session");
        client.close().await.map_err(|e| CrawlError::Renderer {
            context: "closing",
            url: "browser session".to_string(),
            message: e.to_string(),
        })
    }
}

/// Connects to the WebDriver instance
async fn connect_to_webdriver(webdriver_url: &str, headless: bool) -> Result<Client, CrawlError> {
    let mut builder = ClientBuilder::native();
    if headless {
        if let serde_json::Value::Object(caps) = headless_capabilities() {
            builder.capabilities(caps);
        }
    }

    match builder.connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    let mut tried = vec![webdriver_url.to_string()];
    for url in FALLBACK_WEBDRIVER_URLS.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        tried.push(url.to_string());
        if let Ok(client) = builder.connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(CrawlError::WebDriverUnavailable {
        tried: tried.join(", "),
    })
}

fn headless_capabilities() -> serde_json::Value {
    json!({
        "goog:chromeOptions": { "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] },
        "moz:firefoxOptions": { "args": ["-headless"] }
    })
}

/// Maps a WebDriver command failure onto a crawl error
fn navigation_error(error: CmdError, context: &'static str, url: &Url) -> CrawlError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost browser session while {} {}", context, url);
    }
    CrawlError::Renderer {
        context,
        url: url.to_string(),
        message: error.to_string(),
    }
}
