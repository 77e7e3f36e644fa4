// Bid publisher: describe the source version, create a new one, promote it

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::launch_repo::{CreateVersionRequest, LaunchConfigStore};
use crate::models::{BidEstimate, LaunchConfigVersion};
use crate::retry::{self, RetryPolicy};
use crate::stores::StoreError;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("source version {version} of {config_id} not found")]
    SourceMissing { config_id: String, version: String },
    #[error("default promotion conflicted: {0}")]
    Conflict(#[source] StoreError),
    #[error("launch config store: {0}")]
    Store(#[from] StoreError),
}

/// Pushes an estimated bid out as a new default launch config version.
pub struct Publisher {
    launch: Arc<dyn LaunchConfigStore>,
    retry: RetryPolicy,
    config_id: String,
    source_version: String,
}

impl Publisher {
    pub fn new(
        launch: Arc<dyn LaunchConfigStore>,
        retry: RetryPolicy,
        config_id: String,
        source_version: String,
    ) -> Self {
        Self {
            launch,
            retry,
            config_id,
            source_version,
        }
    }

    /// Describe the source version, create a new version carrying the bid,
    /// then promote it to default. Only describe and promote are retried;
    /// creation runs at most once per cycle.
    pub async fn publish(&self, estimate: &BidEstimate) -> Result<LaunchConfigVersion, PublishError> {
        let source = retry::retry(
            &self.retry,
            "describe_version",
            || self.launch.describe_version(&self.config_id, &self.source_version),
            StoreError::is_transient,
        )
        .await
        .map_err(|e| {
            if e.status_code() == Some(404) {
                PublishError::SourceMissing {
                    config_id: self.config_id.clone(),
                    version: self.source_version.clone(),
                }
            } else {
                PublishError::Store(e)
            }
        })?;

        let mut market_options = source.market_options.clone();
        market_options.bid = estimate.final_bid;
        let request = CreateVersionRequest {
            source_version: self.source_version.clone(),
            market_options,
        };
        // Single attempt: a retried create would mint duplicate versions.
        let created = self.launch.create_version(&self.config_id, &request).await?;
        info!(
            config_id = %self.config_id,
            version_number = created.version_number,
            bid = created.market_options.bid,
            "created launch config version"
        );

        retry::retry(
            &self.retry,
            "promote_default",
            || self.launch.promote_default(&self.config_id, created.version_number),
            promotion_retryable,
        )
        .await
        .map_err(|e| {
            if e.status_code() == Some(409) {
                PublishError::Conflict(e)
            } else {
                PublishError::Store(e)
            }
        })?;
        info!(
            config_id = %self.config_id,
            version_number = created.version_number,
            "promoted version to default"
        );

        Ok(LaunchConfigVersion {
            is_default: true,
            ..created
        })
    }
}

/// Promotion also retries on conflict: it is idempotent, and a concurrent
/// default move usually clears by the next attempt.
fn promotion_retryable(e: &StoreError) -> bool {
    e.is_transient() || e.status_code() == Some(409)
}
