// Price sampler: fetch the lookback window from market history and normalize it

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;

use crate::market_repo::{MarketHistory, PriceQuery};
use crate::models::PriceObservation;
use crate::retry::{self, RetryPolicy};
use crate::stores::StoreError;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("market history unavailable: {0}")]
    UpstreamUnavailable(#[source] StoreError),
    #[error("no price observations in the lookback window")]
    EmptyWindow,
}

/// Pulls recent price observations for one resource class.
pub struct Sampler {
    market: Arc<dyn MarketHistory>,
    lookback: Duration,
    retry: RetryPolicy,
}

impl Sampler {
    pub fn new(market: Arc<dyn MarketHistory>, lookback_hours: u64, retry: RetryPolicy) -> Self {
        Self {
            market,
            lookback: Duration::hours(lookback_hours as i64),
            retry,
        }
    }

    /// Fetch the window ending at `now`, sorted chronologically with exact
    /// duplicates removed. Transient upstream failures are retried before
    /// giving up on the cycle.
    pub async fn sample(
        &self,
        resource_class: &str,
        product: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<PriceObservation>, SampleError> {
        let query = PriceQuery {
            resource_class: resource_class.to_string(),
            product: product.to_string(),
            start: now - self.lookback,
            end: now,
        };
        let fetched = retry::retry(
            &self.retry,
            "price_history",
            || self.market.price_history(&query),
            StoreError::is_transient,
        )
        .await
        .map_err(SampleError::UpstreamUnavailable)?;

        let fetched_count = fetched.len();
        let observations = normalize_window(fetched, query.start, query.end);
        if observations.is_empty() {
            return Err(SampleError::EmptyWindow);
        }
        debug!(
            fetched = fetched_count,
            kept = observations.len(),
            window_start = %query.start,
            window_end = %query.end,
            "sampled market window"
        );
        Ok(observations)
    }
}

/// Drop observations outside [start, end], order the rest chronologically,
/// and collapse exact duplicates. Upstream pagination can both overlap and
/// arrive out of order.
pub fn normalize_window(
    mut observations: Vec<PriceObservation>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<PriceObservation> {
    observations.retain(|o| o.timestamp >= start && o.timestamp <= end);
    observations.sort_by(|a, b| {
        (a.timestamp, &a.resource_class, &a.product).cmp(&(b.timestamp, &b.resource_class, &b.product))
    });
    observations.dedup_by(|a, b| {
        a.timestamp == b.timestamp && a.resource_class == b.resource_class && a.product == b.product
    });
    observations
}
