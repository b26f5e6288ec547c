use crate::catalog::Catalog;
use crate::config::HarvestConfig;
use crate::error::{ConfigError, CrawlError};
use crate::extractor::{self, ExtractedProduct, RecordExtractor};
use crate::navigator::PageNavigator;
use crate::renderer::Renderer;
use crate::results::{CrawlEnd, CrawlSummary, ItemReport, ProductRecord, SubmissionOutcome};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Crawls a listing and submits every product card it finds
pub struct Harvester<R: Renderer> {
    navigator: PageNavigator<R>,
    extractor: RecordExtractor,
    catalog: Arc<dyn Catalog>,
    submit_concurrency: usize,
    total_timeout: Option<Duration>,
}

#[derive(Default)]
struct Tally {
    pages: usize,
    items: Vec<ItemReport>,
    defaulted_fields: usize,
}

impl Tally {
    fn record(&mut self, extracted: &ExtractedProduct, outcome: SubmissionOutcome) {
        self.defaulted_fields += extracted.defaulted.len();
        self.items.push(ItemReport {
            page: self.pages,
            title: extracted.record.title.clone(),
            outcome,
        });
    }

    fn into_summary(self, end: CrawlEnd) -> CrawlSummary {
        CrawlSummary {
            pages: self.pages,
            items: self.items,
            defaulted_fields: self.defaulted_fields,
            end,
        }
    }
}

impl<R: Renderer> Harvester<R> {
    pub fn new(
        renderer: R,
        catalog: Arc<dyn Catalog>,
        config: &HarvestConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let navigator = PageNavigator::new(
            renderer,
            config.start_url()?,
            &config.selectors,
            config.max_pages,
        )?;
        let extractor = RecordExtractor::new(&config.selectors, &config.base_url, &config.currency)?;

        Ok(Self {
            navigator,
            extractor,
            catalog,
            submit_concurrency: config.submit_concurrency,
            total_timeout: config.total_timeout(),
        })
    }

    /// Run the crawl to completion
    pub async fn run(self) -> Result<CrawlSummary, CrawlError> {
        self.run_until(std::future::pending()).await
    }

    /// Run the crawl until it finishes or `shutdown` resolves.
    ///
    /// The renderer is closed on every path out of this function.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<CrawlSummary, CrawlError>
    where
        F: Future<Output = ()>,
    {
        let mut tally = Tally::default();
        let total_timeout = self.total_timeout;

        let result = {
            let crawl = async {
                match total_timeout {
                    Some(limit) => tokio::time::timeout(limit, self.crawl(&mut tally))
                        .await
                        .unwrap_or(Err(CrawlError::DeadlineExceeded(limit))),
                    None => self.crawl(&mut tally).await,
                }
            };
            tokio::select! {
                result = crawl => result,
                _ = shutdown => Err(CrawlError::Aborted),
            }
        };

        self.navigator.close().await;

        match result {
            Ok(end) => {
                let summary = tally.into_summary(end);
                if summary.end.is_natural() {
                    ::log::info!("Crawl finished: {}", summary.end);
                } else {
                    ::log::warn!("Crawl stopped early: {}", summary.end);
                }
                ::log::info!(
                    "Processed {} products from {} pages: {} added, {} rejected, {} failed",
                    summary.items.len(),
                    summary.pages,
                    summary.submitted(),
                    summary.rejected(),
                    summary.transport_failures()
                );
                Ok(summary)
            }
            Err(e) => {
                ::log::error!(
                    "Crawl failed after {} pages and {} products: {}",
                    tally.pages,
                    tally.items.len(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn crawl(&mut self, tally: &mut Tally) -> Result<CrawlEnd, CrawlError> {
        while let Some(page) = self.navigator.next_page().await? {
            tally.pages += 1;
            let items = page.items();
            ::log::debug!(
                "Processing {} products from page {} ({})",
                items.len(),
                tally.pages,
                page.url()
            );

            if self.submit_concurrency > 1 {
                let extracted: Vec<ExtractedProduct> =
                    items.iter().map(|item| self.extractor.extract(item)).collect();
                let records = extracted.iter().map(|e| e.record.clone()).collect();
                let outcomes = submit_pooled(&self.catalog, records, self.submit_concurrency).await;
                for (product, outcome) in extracted.iter().zip(outcomes) {
                    extractor::log_defaulted(product);
                    extractor::log_outcome(&product.record, &outcome);
                    tally.record(product, outcome);
                }
            } else {
                for item in &items {
                    let product = self.extractor.extract(item);
                    let outcome = extractor::submit_logged(self.catalog.as_ref(), &product).await;
                    tally.record(&product, outcome);
                }
            }
        }

        Ok(self
            .navigator
            .end()
            .cloned()
            .unwrap_or(CrawlEnd::NoNextLink))
    }
}

/// Submit a page's records with at most `concurrency` requests in flight.
///
/// Outcomes come back in the order of `records`, whatever order the requests finish in.
async fn submit_pooled(
    catalog: &Arc<dyn Catalog>,
    records: Vec<ProductRecord>,
    concurrency: usize,
) -> Vec<SubmissionOutcome> {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut outcomes: Vec<Option<SubmissionOutcome>> = vec![None; records.len()];
    let mut tasks = JoinSet::new();

    for (index, record) in records.into_iter().enumerate() {
        let catalog = Arc::clone(catalog);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, extractor::submit(catalog.as_ref(), &record).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => ::log::error!("Submission task failed: {}", e),
        }
    }

    outcomes
        .into_iter()
        .map(|outcome| {
            outcome.unwrap_or_else(|| {
                SubmissionOutcome::TransportFailure("submission task did not complete".to_string())
            })
        })
        .collect()
}
