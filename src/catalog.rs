//! Client for the Catalog API that stores scraped products.

use crate::error::CatalogError;
use crate::results::{CatalogReply, ProductRecord};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Storage service that accepts one product per creation request
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Send a creation request. Any HTTP answer is a reply, whatever its status;
    /// only failures to get an answer are errors.
    async fn create_product(&self, record: &ProductRecord) -> Result<CatalogReply, CatalogError>;
}

/// HTTP client for `POST /api/products`
pub struct CatalogClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl CatalogClient {
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn create_product(&self, record: &ProductRecord) -> Result<CatalogReply, CatalogError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(CatalogReply { status, body })
    }
}
