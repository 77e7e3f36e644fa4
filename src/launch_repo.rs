// Launch configuration store client: immutable versions + a movable default

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use crate::models::{LaunchConfigVersion, MarketOptions};
use crate::stores::{StoreError, ensure_success};

/// Body for deriving a new version from a source version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    pub source_version: String,
    pub market_options: MarketOptions,
}

#[async_trait]
pub trait LaunchConfigStore: Send + Sync {
    /// Reads one version of a launch config.
    async fn describe_version(
        &self,
        config_id: &str,
        version: &str,
    ) -> Result<LaunchConfigVersion, StoreError>;

    /// Creates a new immutable version. Not idempotent: every call that
    /// reaches the store mints one more version.
    async fn create_version(
        &self,
        config_id: &str,
        request: &CreateVersionRequest,
    ) -> Result<LaunchConfigVersion, StoreError>;

    /// Points the default at an existing version. Idempotent.
    async fn promote_default(
        &self,
        config_id: &str,
        version_number: u64,
    ) -> Result<(), StoreError>;
}

pub struct HttpLaunchConfigStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLaunchConfigStore {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromoteBody {
    version_number: u64,
}

#[async_trait]
impl LaunchConfigStore for HttpLaunchConfigStore {
    #[instrument(skip(self), fields(repo = "launch_config", operation = "describe_version"))]
    async fn describe_version(
        &self,
        config_id: &str,
        version: &str,
    ) -> Result<LaunchConfigVersion, StoreError> {
        let url = self.url(&format!("launch-configs/{}/versions/{}", config_id, version));
        let resp = self.client.get(&url).send().await?;
        let resp = ensure_success("describe_version", resp).await?;
        resp.json::<LaunchConfigVersion>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    #[instrument(skip(self, request), fields(repo = "launch_config", operation = "create_version", bid = request.market_options.bid))]
    async fn create_version(
        &self,
        config_id: &str,
        request: &CreateVersionRequest,
    ) -> Result<LaunchConfigVersion, StoreError> {
        let url = self.url(&format!("launch-configs/{}/versions", config_id));
        let resp = self.client.post(&url).json(request).send().await?;
        let resp = ensure_success("create_version", resp).await?;
        resp.json::<LaunchConfigVersion>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    #[instrument(skip(self), fields(repo = "launch_config", operation = "promote_default"))]
    async fn promote_default(
        &self,
        config_id: &str,
        version_number: u64,
    ) -> Result<(), StoreError> {
        let url = self.url(&format!("launch-configs/{}/default", config_id));
        let resp = self
            .client
            .put(&url)
            .json(&PromoteBody { version_number })
            .send()
            .await?;
        ensure_success("promote_default", resp).await?;
        Ok(())
    }
}
