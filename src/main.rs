use catalog_harvest::{Harvest, HarvestConfig};
use clap::Parser;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut harvest = Harvest::new(&HarvestConfig::default().start_url);
    if let Some(path) = &args.config {
        harvest = match harvest.with_config_file(path) {
            Ok(harvest) => harvest,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(2);
            }
        };
    }

    if let Some(start_url) = &args.start_url {
        harvest = harvest.with_start_url(start_url);
    }

    // Override the WebDriver URL with an environment variable if provided
    if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
        if !webdriver_url.is_empty() {
            harvest = harvest.with_webdriver_url(&webdriver_url);
        }
    }
    if let Some(webdriver_url) = &args.webdriver_url {
        harvest = harvest.with_webdriver_url(webdriver_url);
    }
    if let Some(api_url) = &args.api_url {
        harvest = harvest.with_api_url(api_url);
    }
    if let Some(max_pages) = args.max_pages {
        harvest = harvest.with_max_pages(max_pages);
    }
    if let Some(concurrency) = args.concurrency {
        harvest = harvest.with_submit_concurrency(concurrency);
    }
    if let Some(total_timeout) = args.total_timeout {
        harvest = harvest.with_total_timeout(total_timeout);
    }

    let start_time = std::time::Instant::now();
    match harvest.run().await {
        Ok(summary) => {
            ::log::info!(
                "Harvest complete - {} of {} products added in {:.2} seconds",
                summary.submitted(),
                summary.items.len(),
                start_time.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            ::log::error!("Harvest failed: {}", e);
            std::process::exit(1);
        }
    }
}
