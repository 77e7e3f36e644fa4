// Shared plumbing for the HTTP store clients: error taxonomy + client factory

use std::time::Duration;

use thiserror::Error;

use crate::config::StoresConfig;

/// Statuses worth retrying: throttling and server-side failures.
const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors shared by all HTTP store clients.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{operation} returned status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("decode: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether a retry of the same call can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(e) => !e.is_decode(),
            StoreError::Status { status, .. } => RETRYABLE_STATUS.contains(status),
            StoreError::Decode(_) => false,
        }
    }

    /// The HTTP status behind this error, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One shared client for all stores; budgets come from config.
pub fn build_http_client(config: &StoresConfig) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()?;
    Ok(client)
}

/// Maps non-2xx replies to StoreError::Status, keeping the body for context.
pub(crate) async fn ensure_success(
    operation: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}
