// Key-value parameter store client (advisory records such as the applied bid)

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use crate::stores::{StoreError, ensure_success};

#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), StoreError>;
}

pub struct HttpParameterStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpParameterStore {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PutParameterBody<'a> {
    value: &'a str,
    overwrite: bool,
}

#[async_trait]
impl ParameterStore for HttpParameterStore {
    #[instrument(skip(self, value), fields(repo = "params", operation = "put_parameter"))]
    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let url = format!("{}/parameters/{}", self.base_url.trim_end_matches('/'), name);
        let resp = self
            .client
            .put(&url)
            .json(&PutParameterBody { value, overwrite })
            .send()
            .await?;
        ensure_success("put_parameter", resp).await?;
        Ok(())
    }
}
