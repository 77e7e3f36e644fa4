// Fleet scaler client: lifecycle action completion and heartbeats

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use crate::models::HookResult;
use crate::stores::{StoreError, ensure_success};

/// Addresses one in-flight lifecycle action at the scaler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionHandle {
    pub hook_name: String,
    pub group_name: String,
    pub action_token: String,
    pub instance_id: String,
}

#[async_trait]
pub trait FleetScaler: Send + Sync {
    /// Reports the terminal result for a lifecycle action. The scaler accepts
    /// this at most once per action token.
    async fn complete_action(
        &self,
        handle: &ActionHandle,
        result: HookResult,
    ) -> Result<(), StoreError>;

    /// Asks the scaler to extend the action deadline by one grace period.
    async fn record_heartbeat(&self, handle: &ActionHandle) -> Result<(), StoreError>;
}

pub struct HttpFleetScaler {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFleetScaler {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Serialize)]
struct CompleteActionBody<'a> {
    #[serde(flatten)]
    handle: &'a ActionHandle,
    result: HookResult,
}

#[async_trait]
impl FleetScaler for HttpFleetScaler {
    #[instrument(skip(self, handle), fields(repo = "scaler", operation = "complete_action", instance_id = %handle.instance_id))]
    async fn complete_action(
        &self,
        handle: &ActionHandle,
        result: HookResult,
    ) -> Result<(), StoreError> {
        let url = self.url("lifecycle-actions/complete");
        let resp = self
            .client
            .post(&url)
            .json(&CompleteActionBody { handle, result })
            .send()
            .await?;
        ensure_success("complete_action", resp).await?;
        Ok(())
    }

    #[instrument(skip(self, handle), fields(repo = "scaler", operation = "record_heartbeat", instance_id = %handle.instance_id))]
    async fn record_heartbeat(&self, handle: &ActionHandle) -> Result<(), StoreError> {
        let url = self.url("lifecycle-actions/heartbeat");
        let resp = self.client.post(&url).json(handle).send().await?;
        ensure_success("record_heartbeat", resp).await?;
        Ok(())
    }
}
