//! HTTP clients for the review's downstream collaborators: the notification
//! webhook and the replacement-copy generator. Both own the bounded retry
//! policy; the engine never retries.

pub mod error;
pub mod generator;
pub mod notifier;
pub mod render;
pub(crate) mod retry;

pub use error::RelayError;
pub use generator::{GenerationOutcome, HttpCopyGenerator};
pub use notifier::{Notification, WebhookNotifier};

use pmax_core::AppConfig;

/// Timeout and retry settings shared by both clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.relay_timeout_secs,
            max_retries: config.relay_max_retries,
            backoff_base_ms: config.relay_backoff_base_ms,
        }
    }
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client, RelayError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .connect_timeout(std::time::Duration::from_secs(10))
        .user_agent("pmax/0.1 (weekly-review)")
        .build()?;
    Ok(client)
}

pub(crate) fn parse_url(raw: &str) -> Result<reqwest::Url, RelayError> {
    reqwest::Url::parse(raw).map_err(|e| RelayError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Turn a non-2xx response into [`RelayError::Status`], keeping a bounded
/// slice of the body for the log.
pub(crate) async fn check_status(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, RelayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RelayError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}
