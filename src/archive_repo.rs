// Blob archive client (departing-instance log bundles)

use async_trait::async_trait;
use bytes::Bytes;
use tracing::instrument;

use crate::stores::{StoreError, ensure_success};

#[async_trait]
pub trait LogArchive: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), StoreError>;
}

pub struct HttpLogArchive {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLogArchive {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl LogArchive for HttpLogArchive {
    #[instrument(skip(self, body), fields(repo = "archive", operation = "put_object", bytes = body.len()))]
    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key);
        let resp = self.client.put(&url).body(body).send().await?;
        ensure_success("put_object", resp).await?;
        Ok(())
    }
}
