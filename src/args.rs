use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(about = "Crawls a paginated product listing and submits every product to a catalog API")]
#[command(version)]
pub struct Args {
    /// First listing page to crawl (overrides the config file)
    pub start_url: Option<String>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// WebDriver server URL
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Catalog API endpoint that accepts new products
    #[arg(long)]
    pub api_url: Option<String>,

    /// Stop after this many listing pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Number of submissions in flight within a page
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Total timeout in seconds (maximum runtime)
    #[arg(long)]
    pub total_timeout: Option<u64>,
}
