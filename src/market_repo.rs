// Market history client: recent price observations for a resource class

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::models::PriceObservation;
use crate::stores::{StoreError, ensure_success};

/// Time-bounded price history query.
#[derive(Debug, Clone)]
pub struct PriceQuery {
    pub resource_class: String,
    pub product: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[async_trait]
pub trait MarketHistory: Send + Sync {
    async fn price_history(&self, query: &PriceQuery)
    -> Result<Vec<PriceObservation>, StoreError>;
}

pub struct HttpMarketHistory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMarketHistory {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl MarketHistory for HttpMarketHistory {
    #[instrument(skip(self, query), fields(repo = "market", operation = "price_history", resource_class = %query.resource_class))]
    async fn price_history(
        &self,
        query: &PriceQuery,
    ) -> Result<Vec<PriceObservation>, StoreError> {
        let url = format!("{}/spot-price-history", self.base_url.trim_end_matches('/'));
        let start = query.start.to_rfc3339();
        let end = query.end.to_rfc3339();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("resource_class", query.resource_class.as_str()),
                ("product", query.product.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
            ])
            .send()
            .await?;
        let resp = ensure_success("price_history", resp).await?;
        resp.json::<Vec<PriceObservation>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
